//! Scenario labels: discovering the scenario column of the primary dataset,
//! choosing labels, and cross-referencing them against the secondary
//! dataset's prefixed scenario columns.

use super::model::{CellValue, Dataset};

/// Column names containing `marker`, in original order.
pub fn columns_containing<'a>(columns: &'a [String], marker: &str) -> Vec<&'a str> {
    columns
        .iter()
        .filter(|c| c.contains(marker))
        .map(String::as_str)
        .collect()
}

/// Column names starting with `prefix`, in original order.
pub fn columns_with_prefix<'a>(columns: &'a [String], prefix: &str) -> Vec<&'a str> {
    columns
        .iter()
        .filter(|c| c.starts_with(prefix))
        .map(String::as_str)
        .collect()
}

/// The primary dataset's scenario column: the first whose name contains
/// `marker`, else the last column. `None` only for a column-less dataset.
pub fn scenario_column<'a>(columns: &'a [String], marker: &str) -> Option<&'a str> {
    columns_containing(columns, marker)
        .first()
        .copied()
        .or_else(|| columns.last().map(String::as_str))
}

/// Pick the labels selected when the user has not chosen any: the first
/// `limit` if there are more than `limit`, else all of them.
pub fn default_selection(labels: &[CellValue], limit: usize) -> Vec<CellValue> {
    labels.iter().take(limit).cloned().collect()
}

/// Result of cross-referencing the secondary dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossReference {
    /// No label was selected; downstream filtering must be skipped.
    NoScenariosSelected,
    /// One entry per secondary row.
    Mask(Vec<bool>),
}

/// Substring cross-reference of selected labels against scenario columns.
pub struct ScenarioCrossReference<'a> {
    scenario_columns: Vec<&'a str>,
}

impl<'a> ScenarioCrossReference<'a> {
    pub fn new(scenario_columns: Vec<&'a str>) -> Self {
        Self { scenario_columns }
    }

    /// Discover the scenario columns of `dataset` by name prefix.
    pub fn discover(dataset: &'a Dataset, prefix: &str) -> Self {
        Self::new(columns_with_prefix(dataset.columns(), prefix))
    }

    pub fn scenario_columns(&self) -> &[&'a str] {
        &self.scenario_columns
    }

    /// A row passes iff some scenario column's text contains some selected
    /// label (case-sensitive substring).
    pub fn match_rows(&self, dataset: &Dataset, selected: &[CellValue]) -> CrossReference {
        if selected.is_empty() {
            return CrossReference::NoScenariosSelected;
        }
        let labels: Vec<String> = selected.iter().map(CellValue::to_string).collect();

        let mut mask = vec![false; dataset.len()];
        for column in &self.scenario_columns {
            for (hit, cell) in mask.iter_mut().zip(dataset.column_cells(column)) {
                if *hit {
                    continue;
                }
                let text = cell.to_string();
                *hit = labels.iter().any(|label| text.contains(label.as_str()));
            }
        }
        CrossReference::Mask(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn exercises() -> Dataset {
        Dataset::new(
            names(&["Ejercicio", "Escenario: A", "Escenario: B"]),
            vec![
                vec![t("e1"), t("Lectura rapida"), CellValue::Missing],
                vec![t("e2"), CellValue::Missing, t("Memoria, Atencion")],
                vec![t("e3"), t("Calculo"), t("Dibujo")],
                vec![t("e4"), t("lectura"), CellValue::Integer(12)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn scenario_column_prefers_marker_then_last() {
        let cols = names(&["Ojo", "Escenarios", "Otro Escenario", "Descripcion"]);
        assert_eq!(scenario_column(&cols, "Escenario"), Some("Escenarios"));

        let cols = names(&["Ojo", "Descripcion"]);
        assert_eq!(scenario_column(&cols, "Escenario"), Some("Descripcion"));

        assert_eq!(scenario_column(&[], "Escenario"), None);
    }

    #[test]
    fn prefix_discovery_keeps_order() {
        let cols = names(&["Escenario: Z", "X", "Escenario: A", "escenario: b"]);
        assert_eq!(
            columns_with_prefix(&cols, "Escenario:"),
            vec!["Escenario: Z", "Escenario: A"]
        );
    }

    #[test]
    fn default_selection_takes_first_five() {
        let labels: Vec<CellValue> = (1..=7).map(CellValue::Integer).collect();
        assert_eq!(default_selection(&labels, 5), labels[..5].to_vec());
        assert_eq!(default_selection(&labels[..3], 5), labels[..3].to_vec());
    }

    #[test]
    fn empty_selection_signals_pending() {
        let ds = exercises();
        let xref = ScenarioCrossReference::discover(&ds, "Escenario:");
        assert_eq!(xref.match_rows(&ds, &[]), CrossReference::NoScenariosSelected);
    }

    #[test]
    fn any_label_in_any_column_matches() {
        let ds = exercises();
        let xref = ScenarioCrossReference::discover(&ds, "Escenario:");
        assert_eq!(xref.scenario_columns(), ["Escenario: A", "Escenario: B"]);
        assert_eq!(
            xref.match_rows(&ds, &[t("Lectura"), t("Memoria")]),
            CrossReference::Mask(vec![true, true, false, false])
        );
    }

    #[test]
    fn integer_labels_match_their_text_form() {
        let ds = exercises();
        let xref = ScenarioCrossReference::discover(&ds, "Escenario:");
        assert_eq!(
            xref.match_rows(&ds, &[CellValue::Integer(1)]),
            CrossReference::Mask(vec![false, false, false, true])
        );
    }

    #[test]
    fn no_scenario_columns_yields_all_false() {
        let ds = exercises();
        let xref = ScenarioCrossReference::discover(&ds, "Scenario:");
        assert_eq!(
            xref.match_rows(&ds, &[t("Lectura")]),
            CrossReference::Mask(vec![false; 4])
        );
    }
}
