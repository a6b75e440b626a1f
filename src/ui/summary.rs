use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::view::ViewModel;

const ROW_HEIGHT: f32 = 20.0;

/// Table height for `rows` entries: 35 px per row plus header room, capped at
/// 400 px (beyond that the table scrolls).
pub fn summary_height(rows: usize) -> f32 {
    (50.0 + rows as f32 * 35.0).min(400.0)
}

/// Render the numeric summary below the chart.
pub fn summary_table(ui: &mut Ui, view: &ViewModel, category_label: &str) {
    ui.push_id("summary_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(summary_height(view.summary.len()))
            .column(Column::remainder().at_least(120.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto().at_least(80.0))
            .header(ROW_HEIGHT, |mut header| {
                header.col(|ui: &mut Ui| {
                    ui.strong(category_label);
                });
                header.col(|ui: &mut Ui| {
                    ui.strong("Count");
                });
                header.col(|ui: &mut Ui| {
                    ui.strong("Percentage");
                });
            })
            .body(|mut body| {
                for row in &view.summary {
                    body.row(ROW_HEIGHT, |mut table_row| {
                        table_row.col(|ui: &mut Ui| {
                            ui.label(&row.label);
                        });
                        table_row.col(|ui: &mut Ui| {
                            ui.label(&row.count);
                        });
                        table_row.col(|ui: &mut Ui| {
                            ui.label(&row.percentage);
                        });
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_grows_then_caps() {
        assert_eq!(summary_height(0), 50.0);
        assert_eq!(summary_height(3), 155.0);
        assert_eq!(summary_height(10), 400.0);
        assert_eq!(summary_height(200), 400.0);
    }
}
