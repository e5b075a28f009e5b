use chrono::{Days, NaiveDate};
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::{blues, SegmentPalette};
use crate::dashboard::DashboardView;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel: metric, charts and the segment table
// ---------------------------------------------------------------------------

/// Render the whole dashboard for a ready view.
pub fn dashboard(ui: &mut Ui, view: &DashboardView, palette: &SegmentPalette, rentals_column: &str) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Bike Sharing Dashboard");
            for notice in &view.notices {
                ui.label(RichText::new(notice).color(Color32::YELLOW));
            }
            ui.add_space(8.0);

            total_rentals(ui, view.total_rentals);
            ui.separator();

            ui.strong("Daily Rentals Trend");
            daily_chart(ui, &view.daily, rentals_column);
            ui.separator();

            if let Some(hourly) = &view.hourly_average {
                ui.strong("Hourly Rentals");
                hourly_chart(ui, hourly);
                ui.separator();
            }

            ui.strong("Customer Segments");
            segment_chart(ui, &view.segment_counts, palette);
            segment_summary(ui, &view.segment_counts, palette);
            ui.add_space(8.0);
            segment_table(ui, view);

            ui.add_space(12.0);
            ui.label(RichText::new("© 2025 Bike Sharing Analysis").small().weak());
        });
}

fn total_rentals(ui: &mut Ui, total: f64) {
    ui.label(RichText::new("Total Rentals").weak());
    ui.label(RichText::new(format!("{total:.0}")).size(28.0).strong());
}

// -- Dates are plotted as days since the Unix epoch --

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

fn day_number(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64
}

fn date_label(x: f64) -> String {
    if x < 0.0 || !x.is_finite() {
        return String::new();
    }
    epoch()
        .checked_add_days(Days::new(x.round() as u64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn daily_chart(ui: &mut Ui, daily: &[(NaiveDate, f64)], rentals_column: &str) {
    let coords: Vec<[f64; 2]> = daily.iter().map(|&(d, v)| [day_number(d), v]).collect();

    Plot::new("daily_rentals")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Total Rentals")
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let line = Line::new(PlotPoints::from(coords.clone()))
                .name(rentals_column)
                .color(Color32::LIGHT_BLUE)
                .width(1.5);
            plot_ui.line(line);
            plot_ui.points(
                Points::new(PlotPoints::from(coords))
                    .radius(2.5)
                    .color(Color32::LIGHT_BLUE),
            );
        });
}

fn hourly_chart(ui: &mut Ui, hourly: &[(f64, f64)]) {
    let shades = blues(hourly.len());
    let bars: Vec<Bar> = hourly
        .iter()
        .zip(shades)
        .map(|(&(hour, mean), color)| {
            Bar::new(hour, mean)
                .width(0.8)
                .fill(color)
                .name(format!("{hour:.0}h"))
        })
        .collect();

    Plot::new("hourly_rentals")
        .height(CHART_HEIGHT)
        .x_axis_label("Hour of the Day")
        .y_axis_label("Average Rentals")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn segment_chart(ui: &mut Ui, counts: &[(String, usize)], palette: &SegmentPalette) {
    let labels: Vec<String> = counts.iter().map(|(s, _)| s.clone()).collect();
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, (segment, n))| {
            Bar::new(i as f64, *n as f64)
                .width(0.7)
                .fill(palette.color_for(segment))
                .name(segment)
        })
        .collect();

    Plot::new("segment_counts")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Segment")
        .y_axis_label("Customers")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// Per-segment count and share of the current selection.
fn segment_summary(ui: &mut Ui, counts: &[(String, usize)], palette: &SegmentPalette) {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        ui.label("No customers in the selected segments.");
        return;
    }
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (segment, n) in counts {
            let share = *n as f64 * 100.0 / total as f64;
            ui.label(
                RichText::new(format!("{segment}: {n} ({share:.1}%)"))
                    .color(palette.color_for(segment)),
            );
            ui.add_space(12.0);
        }
    });
}

fn segment_table(ui: &mut Ui, view: &DashboardView) {
    let data = &view.segmentation;
    let rows = &view.segment_rows;
    let columns = data.columns();

    egui::CollapsingHeader::new(format!("Segment table ({} rows)", rows.len()))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .columns(Column::auto().at_least(60.0), columns.len())
                .max_scroll_height(300.0)
                .header(20.0, |mut header| {
                    for name in columns {
                        header.col(|ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(18.0, rows.len(), |mut row| {
                        let record = data.row(rows[row.index()]);
                        for cell in record {
                            row.col(|ui| {
                                ui.label(cell.to_string());
                            });
                        }
                    });
                });
        });
}
