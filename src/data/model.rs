use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a tabular dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. Column types are inferred at load time,
/// so every non-null cell in a column shares the same variant.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    String(String),
}

// -- Manual Eq/Ord so CellValue can live in a BTreeSet (segment selection) --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;

        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Date(_) => 4,
                DateTime(_) => 5,
                String(_) => 6,
            }
        }

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell, used by sums and averages.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Calendar date of the cell, if it holds a date or a timestamp.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::DateTime(dt) => Some(dt.date()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ColumnType – inferred per column at load time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Bool,
    Date,
    DateTime,
    String,
}

// ---------------------------------------------------------------------------
// TabularDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// An immutable, column-named, row-ordered table parsed from CSV.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<CellValue>>,
}

impl TabularDataset {
    /// Every row must have exactly `columns.len()` cells.
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>, rows: Vec<Vec<CellValue>>) -> Self {
        debug_assert_eq!(columns.len(), types.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        TabularDataset {
            columns,
            types,
            rows,
        }
    }

    /// Column names in source order (after renaming).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|i| self.types[i])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn row(&self, idx: usize) -> &[CellValue] {
        &self.rows[idx]
    }

    /// Cell at `(row, column)`; `None` if the column does not exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Sorted unique values of a column, nulls excluded.
    pub fn unique_values(&self, column: &str) -> BTreeSet<CellValue> {
        let Some(col) = self.column_index(column) else {
            return BTreeSet::new();
        };
        self.rows
            .iter()
            .map(|r| &r[col])
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The view that contains every row, in source order.
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }
}
