use super::filter::{
    classify_columns, retain_present, ColumnKind, FilterColumn, FilterInputs, PredicateSet,
};
use super::model::{CellValue, Dataset};
use super::scenario::{
    default_selection, scenario_column, CrossReference, ScenarioCrossReference,
};

// ---------------------------------------------------------------------------
// Pipeline parameters
// ---------------------------------------------------------------------------

/// Fixed column roles shared by every request.
#[derive(Debug, Clone)]
pub struct PipelineSchema {
    /// Token identifying the primary dataset's scenario column.
    pub scenario_marker: String,
    /// Primary column never offered as a filter.
    pub description_column: String,
    /// Primary columns filtered by range instead of by value.
    pub range_columns: Vec<String>,
    /// Prefix of the secondary dataset's scenario columns.
    pub secondary_scenario_prefix: String,
    /// Secondary columns offered as categorical filters.
    pub secondary_filter_columns: Vec<String>,
    /// How many labels the default scenario selection holds.
    pub default_scenario_count: usize,
}

/// Everything the user has chosen for one filtering run.
#[derive(Debug, Clone, Default)]
pub struct FilterRequest {
    pub primary: FilterInputs,
    /// `None` selects the default labels.
    pub scenarios: Option<Vec<CellValue>>,
    pub secondary: FilterInputs,
}

// ---------------------------------------------------------------------------
// Pipeline results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryOutcome {
    /// Nothing selected; no secondary results are computed.
    NoScenariosSelected,
    /// Labels selected, but no secondary row references them.
    NoMatches,
    Filtered {
        /// Rows surviving the cross-reference, before secondary filters.
        cross_referenced: Dataset,
        /// Secondary filter columns present in `cross_referenced`.
        filter_columns: Vec<FilterColumn>,
        /// Rows surviving the secondary filters as well.
        result: Dataset,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub filter_columns: Vec<FilterColumn>,
    pub primary: Dataset,
    pub any_filter_applied: bool,
    pub scenario_column: Option<String>,
    /// Distinct scenario labels among the primary survivors.
    pub scenario_labels: Vec<CellValue>,
    pub selected_scenarios: Vec<CellValue>,
    pub secondary: SecondaryOutcome,
}

// ---------------------------------------------------------------------------
// FilterPipeline
// ---------------------------------------------------------------------------

/// Stateless orchestration: every run recomputes from both source datasets.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    schema: PipelineSchema,
}

impl FilterPipeline {
    pub fn new(schema: PipelineSchema) -> Self {
        Self { schema }
    }

    /// Primary columns the user may filter on.
    pub fn primary_filter_columns(&self, primary: &Dataset) -> Vec<FilterColumn> {
        let scenario = scenario_column(primary.columns(), &self.schema.scenario_marker);
        let mut excluded = vec![self.schema.description_column.as_str()];
        excluded.extend(scenario);
        classify_columns(primary.columns(), &excluded, &self.schema.range_columns)
    }

    /// Secondary filter columns present in `dataset`, all categorical.
    pub fn secondary_filter_columns(&self, dataset: &Dataset) -> Vec<FilterColumn> {
        self.schema
            .secondary_filter_columns
            .iter()
            .filter(|c| dataset.column_index(c).is_some())
            .map(|c| FilterColumn {
                name: c.clone(),
                kind: ColumnKind::Categorical,
            })
            .collect()
    }

    pub fn run(
        &self,
        primary: &Dataset,
        secondary: &Dataset,
        request: &FilterRequest,
    ) -> PipelineOutcome {
        // Loaded → PrimaryFiltered
        let filter_columns = self.primary_filter_columns(primary);
        let predicates = PredicateSet::from_inputs(&filter_columns, &request.primary);
        let (filtered, any_filter_applied) = predicates.apply(primary);
        let scenario_column =
            scenario_column(primary.columns(), &self.schema.scenario_marker).map(str::to_string);

        // PrimaryFiltered → ScenariosPending | ScenariosSelected
        let scenario_labels = scenario_column
            .as_deref()
            .map(|c| filtered.distinct_in_order(c))
            .unwrap_or_default();
        let selected_scenarios = match &request.scenarios {
            Some(chosen) => chosen
                .iter()
                .filter(|l| scenario_labels.contains(l))
                .cloned()
                .collect(),
            None => default_selection(&scenario_labels, self.schema.default_scenario_count),
        };
        log::debug!(
            "primary: {} of {} rows, {} scenario labels, {} selected",
            filtered.len(),
            primary.len(),
            scenario_labels.len(),
            selected_scenarios.len()
        );

        let secondary = self.filter_secondary(secondary, &selected_scenarios, &request.secondary);

        PipelineOutcome {
            filter_columns,
            primary: filtered,
            any_filter_applied,
            scenario_column,
            scenario_labels,
            selected_scenarios,
            secondary,
        }
    }

    // ScenariosSelected → SecondaryFiltered
    fn filter_secondary(
        &self,
        secondary: &Dataset,
        selected: &[CellValue],
        inputs: &FilterInputs,
    ) -> SecondaryOutcome {
        let xref =
            ScenarioCrossReference::discover(secondary, &self.schema.secondary_scenario_prefix);
        let mask = match xref.match_rows(secondary, selected) {
            CrossReference::NoScenariosSelected => return SecondaryOutcome::NoScenariosSelected,
            CrossReference::Mask(mask) => mask,
        };

        let cross_referenced = secondary.select(&mask);
        if cross_referenced.is_empty() {
            log::debug!("cross-reference over {:?} matched nothing", xref.scenario_columns());
            return SecondaryOutcome::NoMatches;
        }

        // Choices made against an earlier cross-reference may no longer occur.
        let filter_columns = self.secondary_filter_columns(&cross_referenced);
        let inputs = retain_present(inputs, &cross_referenced);
        let (result, _) =
            PredicateSet::from_inputs(&filter_columns, &inputs).apply(&cross_referenced);
        log::debug!(
            "secondary: {} cross-referenced, {} after filters",
            cross_referenced.len(),
            result.len()
        );

        SecondaryOutcome::Filtered {
            cross_referenced,
            filter_columns,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::FilterInput;

    const NATURAL: &str = "% Hemisferio Correspondiente al ojo (Natural)";

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn schema() -> PipelineSchema {
        PipelineSchema {
            scenario_marker: "Escenario".into(),
            description_column: "Descripcion".into(),
            range_columns: vec![NATURAL.into()],
            secondary_scenario_prefix: "Escenario:".into(),
            secondary_filter_columns: vec!["Dificultad".into(), "Filmina".into()],
            default_scenario_count: 5,
        }
    }

    /// Ten rows: id, eye, natural range, scenario, description.
    fn primary() -> Dataset {
        let rows = [
            ("1", "Derecho", "40-60", "Lectura"),
            ("2", "Izquierdo", "50-70", "Memoria"),
            ("3", "Ambos", "55", "Calculo"),
            ("4", "Derecho", "60-80", "Lectura"),
            ("5", "Ninguno", "40-60", "Dibujo"),
            ("6", "Ninguno", "0-50", "Atencion"),
            ("7", "Ninguno", "55-65", "Memoria"),
            ("8", "Ninguno", "30", "Musica"),
            ("9", "Ninguno", "50-60", "Deporte"),
            ("10", "Ninguno", "10-20", "Idiomas"),
        ];
        Dataset::new(
            ["Id", "Ojo", NATURAL, "Escenarios", "Descripcion"]
                .map(String::from)
                .to_vec(),
            rows.iter()
                .map(|(id, eye, pct, sc)| {
                    vec![t(id), t(eye), t(pct), t(sc), t("texto")]
                })
                .collect(),
        )
        .unwrap()
    }

    fn secondary() -> Dataset {
        Dataset::new(
            ["Ejercicio", "Filmina", "Dificultad", "Escenario: Principal", "Escenario: Extra"]
                .map(String::from)
                .to_vec(),
            vec![
                vec![
                    t("a"),
                    CellValue::Integer(1),
                    t("Alta"),
                    t("Lectura y Memoria"),
                    CellValue::Missing,
                ],
                vec![t("b"), CellValue::Integer(2), t("Baja"), t("Calculo"), t("Memoria")],
                vec![t("c"), CellValue::Integer(1), t("Baja"), t("Dibujo"), t("Musica")],
                vec![t("d"), CellValue::Integer(3), t("Alta"), CellValue::Missing, t("Lectura")],
            ],
        )
        .unwrap()
    }

    fn ids(ds: &Dataset) -> Vec<String> {
        ds.column_cells("Id").map(CellValue::to_string).collect()
    }

    fn names(ds: &Dataset) -> Vec<String> {
        ds.column_cells("Ejercicio").map(CellValue::to_string).collect()
    }

    #[test]
    fn inert_request_keeps_everything_and_reports_no_filter() {
        let out = FilterPipeline::new(schema()).run(
            &primary(),
            &secondary(),
            &FilterRequest::default(),
        );
        assert!(!out.any_filter_applied);
        assert_eq!(out.primary, primary());
        assert_eq!(out.scenario_column.as_deref(), Some("Escenarios"));
        assert_eq!(out.scenario_labels.len(), 8);
        assert_eq!(
            out.selected_scenarios,
            vec![t("Lectura"), t("Memoria"), t("Calculo"), t("Dibujo"), t("Atencion")]
        );
    }

    #[test]
    fn scenario_and_description_columns_are_not_filterable() {
        let cols = FilterPipeline::new(schema()).primary_filter_columns(&primary());
        let names: Vec<_> = cols.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Ojo", NATURAL]);
        assert_eq!(cols[2].kind, ColumnKind::Range);
    }

    #[test]
    fn categorical_and_range_filters_intersect() {
        // "Derecho", "Izquierdo", "Ambos" cover rows 1, 2, 3, 4.
        let mut request = FilterRequest::default();
        request.primary.insert(
            "Ojo".into(),
            FilterInput::Categorical([t("Derecho"), t("Izquierdo"), t("Ambos")].into()),
        );
        request.primary.insert(NATURAL.into(), FilterInput::Range(55));

        let pipeline = FilterPipeline::new(schema());
        let mut eyes_only = request.clone();
        eyes_only.primary.remove(NATURAL);
        let out = pipeline.run(&primary(), &secondary(), &eyes_only);
        assert_eq!(ids(&out.primary), vec!["1", "2", "3", "4"]);

        let out = pipeline.run(&primary(), &secondary(), &request);
        assert!(out.any_filter_applied);
        assert_eq!(ids(&out.primary), vec!["1", "2", "3"]);
        assert_eq!(out.scenario_labels, vec![t("Lectura"), t("Memoria"), t("Calculo")]);
    }

    #[test]
    fn either_label_in_either_scenario_column_is_included() {
        let request = FilterRequest {
            scenarios: Some(vec![t("Lectura"), t("Memoria")]),
            ..Default::default()
        };
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        let SecondaryOutcome::Filtered { cross_referenced, result, .. } = out.secondary else {
            panic!("expected filtered exercises");
        };
        assert_eq!(names(&result), vec!["a", "b", "d"]);
        assert_eq!(cross_referenced, result);
    }

    #[test]
    fn empty_selection_skips_secondary_filtering() {
        let request = FilterRequest {
            scenarios: Some(Vec::new()),
            ..Default::default()
        };
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        assert_eq!(out.secondary, SecondaryOutcome::NoScenariosSelected);
    }

    #[test]
    fn unmatched_labels_report_no_matches() {
        let request = FilterRequest {
            scenarios: Some(vec![t("Idiomas")]),
            ..Default::default()
        };
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        assert_eq!(out.secondary, SecondaryOutcome::NoMatches);
    }

    #[test]
    fn stale_labels_are_dropped_from_selection() {
        let mut request = FilterRequest {
            scenarios: Some(vec![t("Lectura"), t("Idiomas")]),
            ..Default::default()
        };
        request.primary.insert("Ojo".into(), FilterInput::Categorical([t("Derecho")].into()));
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        assert_eq!(out.selected_scenarios, vec![t("Lectura")]);
    }

    #[test]
    fn secondary_filters_apply_to_cross_referenced_rows() {
        let mut request = FilterRequest {
            scenarios: Some(vec![t("Lectura"), t("Memoria"), t("Dibujo")]),
            ..Default::default()
        };
        request.secondary.insert(
            "Dificultad".into(),
            FilterInput::Categorical(BTreeSet::from([t("Baja")])),
        );
        request.secondary.insert(
            "Filmina".into(),
            FilterInput::Categorical(BTreeSet::from([CellValue::Integer(1)])),
        );
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        let SecondaryOutcome::Filtered { cross_referenced, filter_columns, result } = out.secondary
        else {
            panic!("expected filtered exercises");
        };
        assert_eq!(cross_referenced.len(), 4);
        assert_eq!(filter_columns.len(), 2);
        assert_eq!(names(&result), vec!["c"]);
    }

    #[test]
    fn empty_sources_are_valid_input() {
        let out = FilterPipeline::new(schema()).run(
            &Dataset::empty(),
            &Dataset::empty(),
            &FilterRequest::default(),
        );
        assert!(out.primary.is_empty());
        assert_eq!(out.scenario_column, None);
        assert_eq!(out.secondary, SecondaryOutcome::NoScenariosSelected);
    }

    #[test]
    fn selecting_every_label_matches_the_cross_reference_directly() {
        let pipeline = FilterPipeline::new(schema());
        let first = pipeline.run(&primary(), &secondary(), &FilterRequest::default());
        let request = FilterRequest {
            scenarios: Some(first.scenario_labels.clone()),
            ..Default::default()
        };
        let out = pipeline.run(&primary(), &secondary(), &request);
        assert_eq!(out.selected_scenarios, first.scenario_labels);

        let secondary_frame = secondary();
        let xref = ScenarioCrossReference::discover(&secondary_frame, "Escenario:");
        let CrossReference::Mask(mask) = xref.match_rows(&secondary(), &first.scenario_labels)
        else {
            panic!("expected a row mask");
        };
        let SecondaryOutcome::Filtered { result, .. } = out.secondary else {
            panic!("expected filtered exercises");
        };
        assert_eq!(result, secondary().select(&mask));
        assert_eq!(names(&result), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn secondary_choices_absent_after_cross_reference_are_ignored() {
        // "Alta" only appears on rows that Calculo and Dibujo do not reach.
        let mut request = FilterRequest {
            scenarios: Some(vec![t("Calculo"), t("Dibujo")]),
            ..Default::default()
        };
        request.secondary.insert(
            "Dificultad".into(),
            FilterInput::Categorical(BTreeSet::from([t("Alta")])),
        );
        let out = FilterPipeline::new(schema()).run(&primary(), &secondary(), &request);
        let SecondaryOutcome::Filtered { cross_referenced, result, .. } = out.secondary else {
            panic!("expected filtered exercises");
        };
        assert_eq!(names(&cross_referenced), vec!["b", "c"]);
        assert_eq!(result, cross_referenced);
    }
}
