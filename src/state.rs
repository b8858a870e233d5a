use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::data::export::export_csv;
use crate::data::filter::{
    retain_present, ColumnKind, FilterInput, FilterInputs, NEUTRAL_RANGE_QUERY,
};
use crate::data::model::{CellValue, Dataset};
use crate::data::pipeline::{FilterPipeline, FilterRequest, PipelineOutcome, SecondaryOutcome};
use crate::data::source::{with_path, DataSource};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,
    source: DataSource,
    pipeline: FilterPipeline,

    /// Primary dataset (brain asymmetry test results).
    pub asymmetries: Arc<Dataset>,
    /// Secondary dataset (exercises).
    pub exercises: Arc<Dataset>,

    /// Sorted options for each primary categorical filter.
    pub primary_options: BTreeMap<String, BTreeSet<CellValue>>,

    /// Everything the user has chosen so far.
    pub request: FilterRequest,

    /// Result of the last pipeline run (None until both datasets hold rows).
    pub outcome: Option<PipelineOutcome>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let source = DataSource::new(config.cache_ttl());
        let pipeline = FilterPipeline::new(config.pipeline_schema());
        let mut state = Self {
            config,
            source,
            pipeline,
            asymmetries: Arc::new(Dataset::empty()),
            exercises: Arc::new(Dataset::empty()),
            primary_options: BTreeMap::new(),
            request: FilterRequest::default(),
            outcome: None,
            status_message: None,
        };
        state.load_all();
        state
    }

    /// Fetch both datasets (through the cache) and re-run the pipeline.
    pub fn load_all(&mut self) {
        let asymmetries = self.source.fetch(&self.config.asymmetries);
        let exercises = self.source.fetch(&self.config.exercises);
        let error = asymmetries.error.or(exercises.error);
        self.set_datasets(asymmetries.dataset, exercises.dataset);
        if error.is_some() {
            self.status_message = error;
        }
    }

    /// Drop cached copies and fetch both datasets again.
    pub fn reload(&mut self) {
        self.source.clear();
        self.load_all();
    }

    pub fn open_asymmetries(&mut self, path: PathBuf) {
        self.source.invalidate(&self.config.asymmetries);
        self.config.asymmetries = with_path(&self.config.asymmetries, path);
        self.source.invalidate(&self.config.asymmetries);
        self.load_all();
    }

    pub fn open_exercises(&mut self, path: PathBuf) {
        self.source.invalidate(&self.config.exercises);
        self.config.exercises = with_path(&self.config.exercises, path);
        self.source.invalidate(&self.config.exercises);
        self.load_all();
    }

    /// Ingest newly loaded datasets, reset the user's choices, and refilter.
    pub fn set_datasets(&mut self, asymmetries: Arc<Dataset>, exercises: Arc<Dataset>) {
        self.primary_options = self
            .pipeline
            .primary_filter_columns(&asymmetries)
            .into_iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .map(|c| {
                let values = asymmetries.unique_values(&c.name);
                (c.name, values)
            })
            .collect();
        self.asymmetries = asymmetries;
        self.exercises = exercises;
        self.request = FilterRequest::default();
        self.status_message = None;
        self.refilter();
    }

    /// Whether both datasets have rows to filter.
    pub fn data_ready(&self) -> bool {
        !self.asymmetries.is_empty() && !self.exercises.is_empty()
    }

    /// Recompute `outcome` after an input change.
    pub fn refilter(&mut self) {
        self.outcome = self
            .data_ready()
            .then(|| self.pipeline.run(&self.asymmetries, &self.exercises, &self.request));
        // Exercise choices follow the options currently on screen.
        if let Some(PipelineOutcome {
            secondary: SecondaryOutcome::Filtered { cross_referenced, .. },
            ..
        }) = &self.outcome
        {
            self.request.secondary = retain_present(&self.request.secondary, cross_referenced);
        }
    }

    /// Current range query for a primary column.
    pub fn range_query(&self, column: &str) -> i64 {
        match self.request.primary.get(column) {
            Some(FilterInput::Range(q)) => *q,
            _ => NEUTRAL_RANGE_QUERY,
        }
    }

    pub fn set_range_query(&mut self, column: &str, query: i64) {
        self.request
            .primary
            .insert(column.to_string(), FilterInput::Range(query));
        self.refilter();
    }

    pub fn is_primary_selected(&self, column: &str, value: &CellValue) -> bool {
        is_selected(&self.request.primary, column, value)
    }

    pub fn toggle_primary_value(&mut self, column: &str, value: &CellValue) {
        toggle(&mut self.request.primary, column, value);
        self.refilter();
    }

    pub fn clear_primary(&mut self, column: &str) {
        self.request.primary.remove(column);
        self.refilter();
    }

    pub fn is_exercise_selected(&self, column: &str, value: &CellValue) -> bool {
        is_selected(&self.request.secondary, column, value)
    }

    pub fn toggle_exercise_value(&mut self, column: &str, value: &CellValue) {
        toggle(&mut self.request.secondary, column, value);
        self.refilter();
    }

    pub fn clear_exercise(&mut self, column: &str) {
        self.request.secondary.remove(column);
        self.refilter();
    }

    /// Labels currently selected (the default selection until the user
    /// changes it).
    pub fn selected_scenarios(&self) -> &[CellValue] {
        self.outcome
            .as_ref()
            .map(|o| o.selected_scenarios.as_slice())
            .unwrap_or_default()
    }

    pub fn toggle_scenario(&mut self, label: &CellValue) {
        let mut selected = self.selected_scenarios().to_vec();
        match selected.iter().position(|l| l == label) {
            Some(i) => {
                selected.remove(i);
            }
            None => selected.push(label.clone()),
        }
        self.request.scenarios = Some(selected);
        self.refilter();
    }

    pub fn select_all_scenarios(&mut self) {
        self.request.scenarios = self.outcome.as_ref().map(|o| o.scenario_labels.clone());
        self.refilter();
    }

    pub fn select_no_scenarios(&mut self) {
        self.request.scenarios = Some(Vec::new());
        self.refilter();
    }

    /// Final exercise rows, if the pipeline got that far.
    pub fn final_exercises(&self) -> Option<&Dataset> {
        match &self.outcome.as_ref()?.secondary {
            SecondaryOutcome::Filtered { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn export_exercises(&self, path: &Path) -> Result<()> {
        let Some(dataset) = self.final_exercises() else {
            anyhow::bail!("no hay ejercicios para exportar");
        };
        export_csv(dataset, path)
    }
}

fn is_selected(inputs: &FilterInputs, column: &str, value: &CellValue) -> bool {
    matches!(inputs.get(column), Some(FilterInput::Categorical(set)) if set.contains(value))
}

/// Toggle a single value in a column's categorical selection.
fn toggle(inputs: &mut FilterInputs, column: &str, value: &CellValue) {
    let entry = inputs
        .entry(column.to_string())
        .or_insert_with(|| FilterInput::Categorical(BTreeSet::new()));
    match entry {
        FilterInput::Categorical(selected) => {
            if !selected.remove(value) {
                selected.insert(value.clone());
            }
        }
        FilterInput::Range(_) => *entry = FilterInput::Categorical(BTreeSet::from([value.clone()])),
    }
}
