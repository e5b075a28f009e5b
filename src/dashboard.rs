use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{ColumnNames, DatasetKind};
use crate::data::aggregate;
use crate::data::filter::{filter_date_range, filter_in, DateRange};
use crate::data::model::{CellValue, TabularDataset};
use crate::error::{LoadError, LoadErrorKind};
use crate::session::{Datasets, Readiness, Session};

// ---------------------------------------------------------------------------
// User selection
// ---------------------------------------------------------------------------

/// What the user picked in the filter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// `None` when the activity data has no usable dates.
    pub date_range: Option<DateRange>,
    pub segments: BTreeSet<CellValue>,
}

impl Selection {
    /// Full date span and every segment.
    pub fn initial(datasets: &Datasets, columns: &ColumnNames) -> Self {
        Selection {
            date_range: DateRange::spanning(&datasets.activity, &columns.date),
            segments: datasets.segmentation.unique_values(&columns.segment),
        }
    }
}

// ---------------------------------------------------------------------------
// View-model: everything the charts and tables draw
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Sum of rentals over the selected date range.
    pub total_rentals: f64,
    pub daily: Vec<(NaiveDate, f64)>,
    /// `(hour, mean rentals)`; `None` when no hourly data is usable.
    pub hourly_average: Option<Vec<(f64, f64)>>,
    /// Customers per selected segment, sorted by segment label.
    pub segment_counts: Vec<(String, usize)>,
    /// Every segment present in the data, for the filter widget.
    pub all_segments: Vec<CellValue>,
    pub segmentation: Arc<TabularDataset>,
    /// Rows of `segmentation` within the selected segments.
    pub segment_rows: Vec<usize>,
    pub notices: Vec<String>,
}

impl DashboardView {
    /// Compute the view for `session`. Fails unless both required datasets
    /// are loaded, in which case no chart data exists at all.
    pub fn build(session: &Session, selection: &Selection) -> Result<Self, LoadError> {
        match session.readiness() {
            Readiness::Ready(datasets) => Ok(Self::from_datasets(
                &datasets,
                selection,
                &session.config().columns,
            )),
            Readiness::Halted(e) => Err(e),
            Readiness::Pending(kinds) => {
                let kind = kinds.first().copied().unwrap_or(DatasetKind::Activity);
                Err(LoadError::new(
                    LoadErrorKind::PathNotFound,
                    kind,
                    "waiting for an uploaded file",
                ))
            }
        }
    }

    pub fn from_datasets(datasets: &Datasets, selection: &Selection, columns: &ColumnNames) -> Self {
        let mut notices = Vec::new();
        let activity = &datasets.activity;

        for col in [&columns.date, &columns.rentals] {
            if !activity.has_column(col) {
                notices.push(format!("{} has no '{col}' column", DatasetKind::Activity));
            }
        }

        let days = match selection.date_range {
            Some(range) => filter_date_range(activity, &columns.date, range),
            None => activity.all_rows(),
        };
        let total_rentals = aggregate::sum(activity, &columns.rentals, &days);
        let daily = aggregate::series(activity, &columns.date, &columns.rentals, &days);

        let hourly_average = match &datasets.hourly {
            Some(hourly) if hourly.has_column(&columns.hour) && hourly.has_column(&columns.rentals) => {
                let avg = aggregate::mean_by(hourly, &columns.hour, &columns.rentals, &hourly.all_rows());
                Some(
                    avg.into_iter()
                        .filter_map(|(hour, mean)| Some((hour.as_f64()?, mean)))
                        .collect(),
                )
            }
            Some(_) => {
                notices.push(format!(
                    "{} needs '{}' and '{}' columns",
                    DatasetKind::Hourly,
                    columns.hour,
                    columns.rentals
                ));
                None
            }
            None => {
                notices.push(format!("{} not loaded; hourly chart hidden", DatasetKind::Hourly));
                None
            }
        };

        let segmentation = Arc::clone(&datasets.segmentation);
        if !segmentation.has_column(&columns.segment) {
            notices.push(format!(
                "{} has no '{}' column",
                DatasetKind::Segmentation,
                columns.segment
            ));
        }
        let segment_rows = filter_in(&segmentation, &columns.segment, &selection.segments);
        let segment_counts = aggregate::count_by(&segmentation, &columns.segment, &segment_rows)
            .into_iter()
            .map(|(segment, n)| (segment.to_string(), n))
            .collect();
        let all_segments = segmentation
            .unique_values(&columns.segment)
            .into_iter()
            .collect();

        DashboardView {
            total_rentals,
            daily,
            hourly_average,
            segment_counts,
            all_segments,
            segmentation,
            segment_rows,
            notices,
        }
    }
}
