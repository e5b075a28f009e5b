use thiserror::Error;

use crate::config::DatasetKind;

/// What went wrong while obtaining a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// No candidate location exists. Non-fatal: the user may upload instead.
    PathNotFound,
    /// The file or upload exists but is not a well-formed CSV table.
    ParseFailure,
    /// A remote dataset could not be downloaded.
    FetchFailure,
    /// A required dataset cannot be obtained by any means. Fatal for the session.
    MissingRequiredDataset,
}

/// Error produced at the loading boundary. Never escapes as a panic.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{dataset}: {detail}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub dataset: DatasetKind,
    pub detail: String,
}

impl LoadError {
    pub fn new(kind: LoadErrorKind, dataset: DatasetKind, detail: impl Into<String>) -> Self {
        LoadError {
            kind,
            dataset,
            detail: detail.into(),
        }
    }

    pub fn parse(dataset: DatasetKind, detail: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::ParseFailure, dataset, detail)
    }

    pub fn not_found(dataset: DatasetKind, detail: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::PathNotFound, dataset, detail)
    }

    pub fn missing(dataset: DatasetKind) -> Self {
        Self::new(
            LoadErrorKind::MissingRequiredDataset,
            dataset,
            "required dataset could not be obtained",
        )
    }
}
