use std::collections::BTreeSet;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::EXPORT_FILE_NAME;
use crate::data::filter::{ColumnKind, RANGE_QUERY_MAX, RANGE_QUERY_MIN};
use crate::data::model::CellValue;
use crate::data::pipeline::SecondaryOutcome;
use crate::state::AppState;
use crate::ui::table::dataset_table;

const WARNING: Color32 = Color32::from_rgb(230, 160, 0);
const NO_MATCHES: &str =
    "No se encontraron ejercicios que coincidan con los criterios seleccionados.";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets and scenario selection
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filtros");
    ui.separator();

    // Clone what we need so we can mutate state inside the loop.
    let Some(outcome) = state.outcome.clone() else {
        ui.label("No hay datos cargados.");
        return;
    };
    let options = state.primary_options.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &outcome.filter_columns {
                let label = format!("Filtrar por {}", col.name);
                match col.kind {
                    ColumnKind::Range => {
                        let mut query = state.range_query(&col.name);
                        ui.label(&label);
                        let domain = RANGE_QUERY_MIN..=RANGE_QUERY_MAX;
                        let slider = egui::Slider::new(&mut query, domain).step_by(1.0);
                        if ui.add(slider).changed() {
                            state.set_range_query(&col.name, query);
                        }
                    }
                    ColumnKind::Categorical => {
                        let Some(values) = options.get(&col.name) else {
                            continue;
                        };
                        let toggled = multiselect(ui, &col.name, &label, values, |v| {
                            state.is_primary_selected(&col.name, v)
                        });
                        match toggled {
                            Some(Toggle::Value(v)) => state.toggle_primary_value(&col.name, &v),
                            Some(Toggle::Clear) => state.clear_primary(&col.name),
                            None => {}
                        }
                    }
                }
            }

            ui.add_space(8.0);
            ui.heading("Selección de Escenarios");
            ui.separator();
            ui.label("Selecciona los Escenarios:");
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("Todos").clicked() {
                    state.select_all_scenarios();
                }
                if ui.small_button("Ninguno").clicked() {
                    state.select_no_scenarios();
                }
            });
            for label in &outcome.scenario_labels {
                let mut checked = state.selected_scenarios().contains(label);
                if ui.checkbox(&mut checked, label.to_string()).changed() {
                    state.toggle_scenario(label);
                }
            }
        });
}

enum Toggle {
    Value(CellValue),
    Clear,
}

/// Collapsible checkbox list standing in for a multi-select. Returns the
/// value the user toggled this frame, if any.
fn multiselect(
    ui: &mut Ui,
    id: &str,
    label: &str,
    options: &BTreeSet<CellValue>,
    is_selected: impl Fn(&CellValue) -> bool,
) -> Option<Toggle> {
    let n_selected = options.iter().filter(|v| is_selected(v)).count();
    let header_text = format!("{label}  ({n_selected}/{})", options.len());

    let mut toggled = None;
    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(id)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Limpiar").clicked() {
                toggled = Some(Toggle::Clear);
            }
            for val in options {
                let mut checked = is_selected(val);
                if ui.checkbox(&mut checked, val.to_string()).changed() {
                    toggled = Some(Toggle::Value(val.clone()));
                }
            }
        });
    toggled
}

// ---------------------------------------------------------------------------
// Central panel – filtered tests and exercises
// ---------------------------------------------------------------------------

/// Render the results in the central panel.
pub fn results(ui: &mut Ui, state: &mut AppState) {
    ui.heading("SphinxAI");

    let Some(outcome) = state.outcome.clone() else {
        ui.colored_label(
            Color32::RED,
            "No se pudieron cargar los datos. Por favor, verifica la conexión.",
        );
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.add_space(4.0);
            ui.heading("Resultado del Test");
            ui.label(RichText::new("Datos Filtrados").strong());
            if !outcome.any_filter_applied {
                ui.label("No se aplicaron filtros: se muestran todos los datos.");
            }
            dataset_table(ui, "primary_table", &outcome.primary, 260.0);

            ui.add_space(12.0);
            match &outcome.secondary {
                SecondaryOutcome::NoScenariosSelected => {
                    ui.colored_label(
                        WARNING,
                        "Por favor, selecciona al menos un Escenario para filtrar los ejercicios.",
                    );
                }
                SecondaryOutcome::NoMatches => {
                    ui.colored_label(WARNING, NO_MATCHES);
                }
                SecondaryOutcome::Filtered {
                    cross_referenced,
                    filter_columns,
                    result,
                } => {
                    ui.heading("Ejercicios");
                    let mut action = None;
                    let half = filter_columns.len().div_ceil(2);
                    ui.columns(2, |cols: &mut [Ui]| {
                        for (i, col) in filter_columns.iter().enumerate() {
                            let ui = &mut cols[if i < half { 0 } else { 1 }];
                            let values = cross_referenced.unique_values(&col.name);
                            let label = format!("Filtrar por {}", col.name);
                            let id = format!("exercise_{}", col.name);
                            let toggled = multiselect(ui, &id, &label, &values, |v| {
                                state.is_exercise_selected(&col.name, v)
                            });
                            if let Some(toggle) = toggled {
                                action = Some((col.name.clone(), toggle));
                            }
                        }
                    });
                    match action {
                        Some((col, Toggle::Value(v))) => state.toggle_exercise_value(&col, &v),
                        Some((col, Toggle::Clear)) => state.clear_exercise(&col),
                        None => {}
                    }

                    dataset_table(ui, "exercise_table", result, 320.0);

                    if ui.button("Descargar datos filtrados como CSV").clicked() {
                        save_exercises_dialog(state);
                    }
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
        ui.menu_button("Archivo", |ui: &mut Ui| {
            if ui.button("Abrir asimetrías…").clicked() {
                if let Some(path) = pick_dataset("Abrir asimetrías") {
                    state.open_asymmetries(path);
                }
                ui.close_menu();
            }
            if ui.button("Abrir ejercicios…").clicked() {
                if let Some(path) = pick_dataset("Abrir ejercicios") {
                    state.open_exercises(path);
                }
                ui.close_menu();
            }
            if ui.button("Recargar").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} tests, {} ejercicios cargados",
            state.asymmetries.len(),
            state.exercises.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn pick_dataset(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file()
}

fn save_exercises_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Descargar ejercicios")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_exercises(&path) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
