use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{CellValue, TabularDataset};

/// Sum of the numeric values of `column` over `view`. Nulls and non-numeric
/// cells contribute nothing.
pub fn sum(dataset: &TabularDataset, column: &str, view: &[usize]) -> f64 {
    let Some(col) = dataset.column_index(column) else {
        return 0.0;
    };
    view.iter()
        .filter_map(|&i| dataset.row(i)[col].as_f64())
        .sum()
}

/// `(date, value)` pairs over `view`, in view order.
pub fn series(
    dataset: &TabularDataset,
    date_column: &str,
    value_column: &str,
    view: &[usize],
) -> Vec<(NaiveDate, f64)> {
    let (Some(dc), Some(vc)) = (
        dataset.column_index(date_column),
        dataset.column_index(value_column),
    ) else {
        return Vec::new();
    };
    view.iter()
        .filter_map(|&i| {
            let row = dataset.row(i);
            Some((row[dc].as_date()?, row[vc].as_f64()?))
        })
        .collect()
}

/// Mean of `value_column` per distinct `group_column` value, sorted by group.
pub fn mean_by(
    dataset: &TabularDataset,
    group_column: &str,
    value_column: &str,
    view: &[usize],
) -> Vec<(CellValue, f64)> {
    let (Some(gc), Some(vc)) = (
        dataset.column_index(group_column),
        dataset.column_index(value_column),
    ) else {
        return Vec::new();
    };

    // (sum, count)
    let mut groups: BTreeMap<&CellValue, (f64, usize)> = BTreeMap::new();
    for &i in view {
        let row = dataset.row(i);
        if row[gc].is_null() {
            continue;
        }
        let Some(v) = row[vc].as_f64() else {
            continue;
        };
        let entry = groups.entry(&row[gc]).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|(key, (total, n))| (key.clone(), total / n as f64))
        .collect()
}

/// Number of rows per distinct `column` value, sorted by value. Nulls are
/// not counted.
pub fn count_by(dataset: &TabularDataset, column: &str, view: &[usize]) -> Vec<(CellValue, usize)> {
    let Some(col) = dataset.column_index(column) else {
        return Vec::new();
    };
    let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
    for &i in view {
        let value = &dataset.row(i)[col];
        if !value.is_null() {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts.into_iter().map(|(k, n)| (k.clone(), n)).collect()
}
