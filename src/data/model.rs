use std::collections::{BTreeSet, HashSet};
use std::fmt;

use super::error::DataError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
///
/// Ordering is derived: `Missing < Integer < Text`, integers numerically,
/// text lexicographically. Sorted option lists rely on this.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellValue {
    Missing,
    Integer(i64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// Textual form used for display, substring matching, and export.
/// Missing renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – ordered rows over a fixed, ordered column set
// ---------------------------------------------------------------------------

/// An immutable table. Every row has exactly `columns.len()` cells.
///
/// Filtering never mutates a dataset; [`Dataset::select`] returns a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset, checking that every row matches the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self, DataError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(DataError::RaggedRow {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// A dataset with no columns and no rows: what a failed load produces.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Iterate one column's cells in row order. An unknown column yields
    /// `Missing` for every row.
    pub fn column_cells<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let idx = self.column_index(column);
        self.rows.iter().map(move |row| match idx {
            Some(i) => &row[i],
            None => &CellValue::Missing,
        })
    }

    /// Keep the rows whose mask entry is `true`.
    pub fn select(&self, mask: &[bool]) -> Dataset {
        debug_assert_eq!(mask.len(), self.rows.len(), "mask length must match row count");
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Sorted set of non-missing values in a column (filter widget options).
    pub fn unique_values(&self, column: &str) -> BTreeSet<CellValue> {
        self.column_cells(column)
            .filter(|v| !v.is_missing())
            .cloned()
            .collect()
    }

    /// Non-missing values in first-appearance order, without duplicates.
    pub fn distinct_in_order(&self, column: &str) -> Vec<CellValue> {
        let mut seen = HashSet::new();
        self.column_cells(column)
            .filter(|v| !v.is_missing())
            .filter(|v| seen.insert(*v))
            .cloned()
            .collect()
    }

    /// Drop rows where every cell is missing, then columns where every
    /// remaining cell is missing.
    pub fn drop_all_missing(self) -> Dataset {
        let rows: Vec<Vec<CellValue>> = self
            .rows
            .into_iter()
            .filter(|row| row.iter().any(|c| !c.is_missing()))
            .collect();

        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| rows.iter().any(|row| !row[i].is_missing()))
            .collect();

        let columns = self
            .columns
            .into_iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(c, _)| c)
            .collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter(|(_, k)| **k)
                    .map(|(c, _)| c)
                    .collect()
            })
            .collect();

        Dataset { columns, rows }
    }
}
