use eframe::egui;

use crate::session::Session;
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(session: Session) -> Self {
        Self {
            state: AppState::new(session),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and dataset status ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Resolver debug window ----
        let mut show_debug = self.state.show_debug;
        egui::Window::new("Resolver debug")
            .open(&mut show_debug)
            .vscroll(true)
            .show(ctx, |ui| {
                panels::debug_window(ui, &self.state.session);
            });
        self.state.show_debug = show_debug;

        // A missing required dataset stops everything past this point.
        if self.state.halted.is_some() {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::halted(ui, &self.state);
            });
            return;
        }

        // ---- Left side panel: filters ----
        if self.state.view.is_some() {
            egui::SidePanel::left("filter_panel")
                .default_width(220.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: dashboard or upload prompts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(view) = &self.state.view {
                charts::dashboard(
                    ui,
                    view,
                    &self.state.palette,
                    &self.state.session.config().columns.rentals,
                );
            } else {
                panels::upload_prompts(ui, &mut self.state);
            }
        });
    }
}
