use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::config::DatasetKind;
use crate::data::filter::DateRange;
use crate::session::{DatasetSlot, Session};
use crate::state::AppState;
use crate::ui::notice::user_message;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: date range and segment selection.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter data");
    ui.separator();

    let Some(selection) = state.selection.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    if let Some(range) = selection.date_range {
        ui.strong("Select date range");
        let mut start = range.start;
        let mut end = range.end;
        ui.horizontal(|ui: &mut Ui| {
            ui.label("From");
            ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
        });
        ui.horizontal(|ui: &mut Ui| {
            ui.label("To");
            ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
        });
        if end < start {
            ui.label(RichText::new("End date is before start date.").color(Color32::RED));
        } else {
            state.set_date_range(DateRange::new(start, end));
        }
        ui.separator();
    }

    let segments = state
        .view
        .as_ref()
        .map(|v| v.all_segments.clone())
        .unwrap_or_default();

    ui.strong(format!(
        "Segments  ({}/{})",
        selection.segments.len(),
        segments.len()
    ));
    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.select_all_segments();
        }
        if ui.small_button("None").clicked() {
            state.select_no_segments();
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for segment in &segments {
                let label = segment.to_string();
                let mut checked = state
                    .selection
                    .as_ref()
                    .is_some_and(|s| s.segments.contains(segment));
                let text = RichText::new(&label).color(state.palette.color_for(&label));
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_segment(segment);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        let awaiting = state.session.awaiting_upload();
        ui.menu_button("File", |ui: &mut Ui| {
            for kind in &awaiting {
                if ui.button(format!("Upload {}…", kind.label())).clicked() {
                    upload_file_dialog(state, *kind);
                    ui.close_menu();
                }
            }
            if ui.button("Resolver debug").clicked() {
                state.show_debug = true;
                ui.close_menu();
            }
        });

        ui.separator();

        for kind in DatasetKind::ALL {
            let (text, color) = match state.session.slot(kind) {
                Some(DatasetSlot::Loaded { data, .. }) => {
                    (format!("{kind}: {} rows", data.len()), Color32::LIGHT_GREEN)
                }
                Some(DatasetSlot::AwaitingUpload { .. }) => {
                    (format!("{kind}: upload needed"), Color32::YELLOW)
                }
                Some(DatasetSlot::Absent(_)) | None => (format!("{kind}: missing"), Color32::RED),
            };
            ui.label(RichText::new(text).color(color));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Upload prompts (central panel while datasets are missing)
// ---------------------------------------------------------------------------

/// One prompt per dataset still waiting for an upload.
pub fn upload_prompts(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Bike Sharing Dashboard");
    ui.add_space(8.0);

    for kind in state.session.awaiting_upload() {
        let message = match state.session.slot(kind) {
            Some(DatasetSlot::AwaitingUpload {
                last_error: Some(e),
            }) => user_message(e),
            _ => format!("Upload the {} to continue.", kind.label()),
        };

        ui.group(|ui: &mut Ui| {
            ui.strong(kind.label());
            if !kind.is_required() {
                ui.label(RichText::new("optional").weak());
            }
            ui.label(message);
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Choose CSV…").clicked() {
                    upload_file_dialog(state, kind);
                }
                if ui.button("Skip").clicked() {
                    state.skip_upload(kind);
                }
            });
        });
        ui.add_space(6.0);
    }
}

/// Shown instead of the dashboard once a required dataset is gone for good.
pub fn halted(ui: &mut Ui, state: &AppState) {
    let Some(err) = &state.halted else {
        return;
    };
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(
            RichText::new(user_message(err))
                .color(Color32::RED)
                .size(18.0),
        );
    });
}

// ---------------------------------------------------------------------------
// Resolver debug window
// ---------------------------------------------------------------------------

pub fn debug_window(ui: &mut Ui, session: &Session) {
    for kind in DatasetKind::ALL {
        ui.strong(kind.label());
        match session.slot(kind) {
            Some(DatasetSlot::Loaded { origin, .. }) => {
                ui.label(format!("loaded from {origin}"));
            }
            Some(DatasetSlot::AwaitingUpload { .. }) => {
                ui.label("awaiting upload");
            }
            Some(DatasetSlot::Absent(e)) => {
                ui.label(format!("absent: {}", e.detail));
            }
            None => {}
        }
        let source = session.config().source(kind);
        if let Some(url) = &source.url {
            ui.label(format!("remote: {url}"));
        }
        for probe in session.probes(kind) {
            let (mark, color) = if probe.exists {
                ("✔", Color32::LIGHT_GREEN)
            } else {
                ("✘", Color32::GRAY)
            };
            ui.label(RichText::new(format!("{mark} {}", probe.path.display())).color(color));
        }
        ui.separator();
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn upload_file_dialog(state: &mut AppState, kind: DatasetKind) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Upload {}", kind.label()))
        .add_filter("CSV", &["csv"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(&path) {
        Ok(bytes) => state.upload(kind, &name, bytes),
        Err(e) => {
            log::error!("Failed to read {}: {e}", path.display());
            state.status_message = Some(format!("Could not read {name}: {e}"));
        }
    }
}
