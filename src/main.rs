mod app;
mod color;
mod config;
mod dashboard;
mod data;
mod error;
mod session;
mod state;
mod ui;

use anyhow::Context;
use app::DashboardApp;
use config::Config;
use data::resolver::Locations;
use eframe::egui;
use session::Session;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let locations = Locations::capture().context("reading the working directory")?;
    let config = Config::load(&locations.working_dir);
    log::info!(
        "Starting in {} (script dir {:?})",
        locations.working_dir.display(),
        locations.script_dir
    );
    let session = Session::start(config, &locations);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bike Sharing Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(session)))),
    )
    .map_err(|e| anyhow::anyhow!("running the dashboard window: {e}"))
}
