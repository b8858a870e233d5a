use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use super::model::{CellValue, Dataset};

// ---------------------------------------------------------------------------
// Range matching: "40-60" / "50" cells against an integer query
// ---------------------------------------------------------------------------

/// Query value that leaves a range predicate inert (midpoint of 0–100).
pub const NEUTRAL_RANGE_QUERY: i64 = 50;

/// Domain offered to the user for range queries.
pub const RANGE_QUERY_MIN: i64 = 0;
pub const RANGE_QUERY_MAX: i64 = 100;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit-run pattern is valid"));

/// Decide whether `query` falls in the range written in `cell`.
///
/// Only maximal digit runs count; everything else (`%`, `-`, letters) is
/// ignored. One run `n` matches iff `query == n`. Two runs `lo, hi` match
/// iff `lo <= query <= hi`, in the order written (no swapping). Any other
/// count, a missing cell, or a run too large for `i64` is a non-match.
pub fn range_contains(cell: &CellValue, query: i64) -> bool {
    if cell.is_missing() {
        return false;
    }
    let text = cell.to_string();

    let mut bounds = Vec::with_capacity(2);
    for run in DIGIT_RUN.find_iter(&text) {
        if bounds.len() == 2 {
            return false;
        }
        match run.as_str().parse::<i64>() {
            Ok(n) => bounds.push(n),
            Err(_) => return false,
        }
    }

    match bounds.as_slice() {
        [n] => query == *n,
        [lo, hi] => *lo <= query && query <= *hi,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Column predicates
// ---------------------------------------------------------------------------

/// A per-column rule deciding row inclusion.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnPredicate {
    /// Cell must be one of `accepted`. Empty set = no constraint.
    Categorical {
        column: String,
        accepted: BTreeSet<CellValue>,
    },
    /// Cell's written range must contain `query`. Neutral query = no constraint.
    Range { column: String, query: i64 },
}

impl ColumnPredicate {
    pub fn column(&self) -> &str {
        match self {
            ColumnPredicate::Categorical { column, .. } | ColumnPredicate::Range { column, .. } => {
                column
            }
        }
    }

    /// Whether this predicate constrains anything at all.
    pub fn is_active(&self) -> bool {
        match self {
            ColumnPredicate::Categorical { accepted, .. } => !accepted.is_empty(),
            ColumnPredicate::Range { query, .. } => *query != NEUTRAL_RANGE_QUERY,
        }
    }

    pub fn matches(&self, cell: &CellValue) -> bool {
        if !self.is_active() {
            return true;
        }
        match self {
            ColumnPredicate::Categorical { accepted, .. } => {
                !cell.is_missing() && accepted.contains(cell)
            }
            ColumnPredicate::Range { query, .. } => range_contains(cell, *query),
        }
    }
}

// ---------------------------------------------------------------------------
// PredicateSet – AND composition of column predicates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<ColumnPredicate>,
}

impl PredicateSet {
    #[cfg(test)]
    pub fn new(predicates: Vec<ColumnPredicate>) -> Self {
        Self { predicates }
    }

    #[cfg(test)]
    pub fn predicates(&self) -> &[ColumnPredicate] {
        &self.predicates
    }

    /// True iff at least one predicate is non-inert, regardless of whether
    /// it removes any row.
    pub fn any_active(&self) -> bool {
        self.predicates.iter().any(ColumnPredicate::is_active)
    }

    /// One boolean per row: the AND of every predicate's verdict.
    ///
    /// Inert predicates are skipped. Rows already excluded are not
    /// re-tested by later predicates.
    pub fn mask(&self, dataset: &Dataset) -> Vec<bool> {
        let mut mask = vec![true; dataset.len()];
        for predicate in self.predicates.iter().filter(|p| p.is_active()) {
            for (keep, cell) in mask.iter_mut().zip(dataset.column_cells(predicate.column())) {
                if *keep {
                    *keep = predicate.matches(cell);
                }
            }
        }
        mask
    }

    /// Filter `dataset` into a new dataset, also reporting `any_active`.
    pub fn apply(&self, dataset: &Dataset) -> (Dataset, bool) {
        let any_active = self.any_active();
        if !any_active {
            return (dataset.clone(), false);
        }
        let filtered = dataset.select(&self.mask(dataset));
        log::debug!(
            "predicate set kept {} of {} rows",
            filtered.len(),
            dataset.len()
        );
        (filtered, true)
    }

    /// Build a predicate per filterable column from the user's inputs.
    ///
    /// Columns without an input, or whose input kind disagrees with the
    /// column's classification, get an inert predicate.
    pub fn from_inputs(columns: &[FilterColumn], inputs: &FilterInputs) -> Self {
        let predicates = columns
            .iter()
            .map(|col| {
                let input = match (col.kind, inputs.get(&col.name)) {
                    (ColumnKind::Categorical, Some(input @ FilterInput::Categorical(_)))
                    | (ColumnKind::Range, Some(input @ FilterInput::Range(_))) => input.clone(),
                    (kind, Some(_)) => {
                        log::warn!("ignoring mismatched filter input for column '{}'", col.name);
                        FilterInput::neutral(kind)
                    }
                    (kind, None) => FilterInput::neutral(kind),
                };
                input.into_predicate(&col.name)
            })
            .collect();
        Self { predicates }
    }
}

// ---------------------------------------------------------------------------
// Column classification and user inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Categorical,
    Range,
}

/// A column the user may filter on, with its predicate kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Classify `columns` for filtering, in their original order.
///
/// Names in `excluded` are dropped (read-only display fields). Names in
/// `range_columns` are range-typed; everything else is categorical.
pub fn classify_columns(
    columns: &[String],
    excluded: &[&str],
    range_columns: &[String],
) -> Vec<FilterColumn> {
    columns
        .iter()
        .filter(|c| !excluded.contains(&c.as_str()))
        .map(|c| FilterColumn {
            name: c.clone(),
            kind: if range_columns.contains(c) {
                ColumnKind::Range
            } else {
                ColumnKind::Categorical
            },
        })
        .collect()
}

/// What the user has chosen for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInput {
    Categorical(BTreeSet<CellValue>),
    Range(i64),
}

impl FilterInput {
    pub fn neutral(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Categorical => FilterInput::Categorical(BTreeSet::new()),
            ColumnKind::Range => FilterInput::Range(NEUTRAL_RANGE_QUERY),
        }
    }

    pub fn into_predicate(self, column: &str) -> ColumnPredicate {
        let column = column.to_string();
        match self {
            FilterInput::Categorical(accepted) => ColumnPredicate::Categorical { column, accepted },
            FilterInput::Range(query) => ColumnPredicate::Range { column, query },
        }
    }
}

/// Per-column selection state: column name → input.
pub type FilterInputs = BTreeMap<String, FilterInput>;

/// Drop categorical choices that no longer occur in `dataset`.
///
/// A set left empty is removed, so its column goes back to inert instead
/// of matching nothing. Range inputs are kept as they are.
pub fn retain_present(inputs: &FilterInputs, dataset: &Dataset) -> FilterInputs {
    inputs
        .iter()
        .filter_map(|(column, input)| match input {
            FilterInput::Categorical(accepted) => {
                let present = dataset.unique_values(column);
                let kept: BTreeSet<CellValue> =
                    accepted.intersection(&present).cloned().collect();
                if kept.len() < accepted.len() {
                    log::debug!(
                        "dropped {} stale choice(s) for column '{column}'",
                        accepted.len() - kept.len()
                    );
                }
                (!kept.is_empty()).then(|| (column.clone(), FilterInput::Categorical(kept)))
            }
            FilterInput::Range(_) => Some((column.clone(), input.clone())),
        })
        .collect()
}
