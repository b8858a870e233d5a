use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Dataset;

// ---------------------------------------------------------------------------
// Dataset table
// ---------------------------------------------------------------------------

const ROW_HEIGHT: f32 = 18.0;

/// Render `dataset` as a striped, resizable table.
pub fn dataset_table(ui: &mut Ui, id: &str, dataset: &Dataset, max_height: f32) {
    ui.label(format!("{} filas × {} columnas", dataset.len(), dataset.columns().len()));

    if dataset.columns().is_empty() {
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), dataset.columns().len())
            .max_scroll_height(max_height)
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for name in dataset.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, dataset.len(), |mut row| {
                    let cells = &dataset.rows()[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}
