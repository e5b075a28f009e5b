use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{CellValue, TabularDataset};

// ---------------------------------------------------------------------------
// Views: filtered row indices, source order preserved
// ---------------------------------------------------------------------------

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Smallest range covering every date in `column`, if it has any.
    pub fn spanning(dataset: &TabularDataset, column: &str) -> Option<DateRange> {
        let col = dataset.column_index(column)?;
        let mut dates = (0..dataset.len()).filter_map(|i| dataset.row(i)[col].as_date());
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(DateRange { start, end })
    }
}

/// Rows whose `column` date falls within `range`. Rows without a date are
/// dropped; a missing column yields an empty view.
pub fn filter_date_range(dataset: &TabularDataset, column: &str, range: DateRange) -> Vec<usize> {
    let Some(col) = dataset.column_index(column) else {
        return Vec::new();
    };
    (0..dataset.len())
        .filter(|&i| {
            dataset.row(i)[col]
                .as_date()
                .is_some_and(|d| range.contains(d))
        })
        .collect()
}

/// Rows whose `column` value is one of `selected`. An empty selection
/// selects nothing.
pub fn filter_in(
    dataset: &TabularDataset,
    column: &str,
    selected: &BTreeSet<CellValue>,
) -> Vec<usize> {
    let Some(col) = dataset.column_index(column) else {
        return Vec::new();
    };
    (0..dataset.len())
        .filter(|&i| selected.contains(&dataset.row(i)[col]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetKind;
    use crate::data::loader::{default_renames, parse_csv};

    fn dataset(text: &str) -> TabularDataset {
        parse_csv(DatasetKind::Segmentation, text.as_bytes(), &default_renames()).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    #[test]
    fn segment_filter_keeps_selected_rows_in_order() {
        let ds = dataset("customer,segment\nc1,A\nc2,B\nc3,C\nc4,A\nc5,C\nc6,B\n");
        let selected: BTreeSet<CellValue> = [text("A"), text("C")].into_iter().collect();

        let view = filter_in(&ds, "segment", &selected);
        assert_eq!(view, vec![0, 2, 3, 4]);
        let customers: Vec<String> = view
            .iter()
            .map(|&i| ds.value(i, "customer").unwrap().to_string())
            .collect();
        assert_eq!(customers, ["c1", "c3", "c4", "c5"]);
    }

    #[test]
    fn empty_selection_selects_nothing() {
        let ds = dataset("customer,segment\nc1,A\nc2,B\n");
        assert!(filter_in(&ds, "segment", &BTreeSet::new()).is_empty());
        assert!(filter_in(&ds, "no_such_column", &[text("A")].into()).is_empty());
    }

    #[test]
    fn date_range_is_inclusive() {
        let ds = dataset("date,n\n2024-01-01,1\n2024-01-02,2\n2024-01-03,3\n2024-01-04,4\n,5\n");
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        );
        assert_eq!(filter_date_range(&ds, "date", range), vec![1, 2]);
    }

    #[test]
    fn spanning_covers_unsorted_dates() {
        let ds = dataset("date\n2024-03-05\n2024-01-09\n2024-02-01\n");
        let span = DateRange::spanning(&ds, "date").unwrap();
        assert_eq!(span.start, NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(span.end, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());

        let empty = dataset("date\n");
        assert_eq!(DateRange::spanning(&empty, "date"), None);
    }
}
