use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use super::model::{CellValue, ColumnType, TabularDataset};
use crate::config::DatasetKind;
use crate::error::{LoadError, LoadErrorKind};

/// Source column name → canonical column name.
pub type RenameTable = BTreeMap<String, String>;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Canonical names for the bike-sharing export columns.
pub fn default_renames() -> RenameTable {
    [
        ("dteday", "date"),
        ("yr", "year"),
        ("mnth", "month"),
        ("hr", "hour"),
        ("hum", "humidity"),
        ("cnt", "total_rentals"),
    ]
    .into_iter()
    .map(|(from, to)| (from.to_string(), to.to_string()))
    .collect()
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Where the bytes of a dataset come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// A resolved location on disk.
    Path(PathBuf),
    /// A file the user picked interactively; `name` is for messages only.
    Upload { name: String, bytes: Vec<u8> },
    /// A remote CSV fetched over HTTP(S).
    Remote(String),
}

impl LoadSource {
    pub fn describe(&self) -> String {
        match self {
            LoadSource::Path(p) => p.display().to_string(),
            LoadSource::Upload { name, .. } => format!("upload '{name}'"),
            LoadSource::Remote(url) => url.clone(),
        }
    }
}

/// Load `kind` from `source`. The rename table applies identically to every
/// kind of source.
pub fn load(
    kind: DatasetKind,
    source: &LoadSource,
    renames: &RenameTable,
) -> Result<TabularDataset, LoadError> {
    let result = match source {
        LoadSource::Path(path) => std::fs::File::open(path)
            .map_err(|e| LoadError::parse(kind, format!("cannot read {}: {e}", path.display())))
            .and_then(|file| parse_csv(kind, file, renames)),
        LoadSource::Upload { bytes, .. } => parse_csv(kind, bytes.as_slice(), renames),
        LoadSource::Remote(url) => {
            fetch_remote(kind, url).and_then(|bytes| parse_csv(kind, bytes.as_slice(), renames))
        }
    };

    match &result {
        Ok(ds) => log::info!(
            "Loaded {kind} from {}: {} rows, columns {:?}",
            source.describe(),
            ds.len(),
            ds.columns()
        ),
        Err(e) => log::error!("Failed to load {kind} from {}: {}", source.describe(), e.detail),
    }
    result
}

fn fetch_remote(kind: DatasetKind, url: &str) -> Result<Vec<u8>, LoadError> {
    let fetch_err =
        |e: reqwest::Error| LoadError::new(LoadErrorKind::FetchFailure, kind, format!("{url}: {e}"));

    let client = reqwest::blocking::Client::builder()
        .timeout(REMOTE_TIMEOUT)
        .build()
        .map_err(fetch_err)?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    let bytes = response.bytes().map_err(fetch_err)?;
    Ok(bytes.to_vec())
}

// ---------------------------------------------------------------------------
// CSV parsing
// ---------------------------------------------------------------------------

/// Parse comma-separated text with a header row into a typed table.
///
/// Fails with `ParseFailure` on empty input, rows whose field count differs
/// from the header, and invalid UTF-8. A header-only input yields an empty
/// table.
pub fn parse_csv<R: Read>(
    kind: DatasetKind,
    reader: R,
    renames: &RenameTable,
) -> Result<TabularDataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::parse(kind, format!("reading header row: {e}")))?
        .clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(LoadError::parse(kind, "file is empty (no header row)"));
    }

    let columns: Vec<String> = headers
        .iter()
        .map(|h| {
            let h = h.trim();
            renames.get(h).cloned().unwrap_or_else(|| h.to_string())
        })
        .collect();

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::parse(kind, describe_csv_error(&e)))?;
        raw_rows.push(record.iter().map(|f| f.trim().to_string()).collect());
    }

    let types: Vec<ColumnType> = (0..columns.len())
        .map(|col| infer_column_type(raw_rows.iter().map(|r| r[col].as_str())))
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|raw| {
            raw.iter()
                .zip(&types)
                .map(|(field, &ty)| convert(field, ty))
                .collect()
        })
        .collect();

    Ok(TabularDataset::new(columns, types, rows))
}

fn describe_csv_error(e: &csv::Error) -> String {
    match e.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            format!("line {line}: expected {expected_len} fields, found {len}")
        }
        csv::ErrorKind::Utf8 { pos, .. } => {
            let line = pos.as_ref().map(|p| p.line()).unwrap_or_default();
            format!("line {line}: not valid UTF-8")
        }
        _ => e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Narrowest type every non-empty value of a column parses as.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut present = values.filter(|v| !v.is_empty());
    if present.clone().next().is_none() {
        return ColumnType::String;
    }

    if present.clone().all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if present.clone().all(|v| v.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if present.clone().all(|v| parse_bool(v).is_some()) {
        ColumnType::Bool
    } else if present.clone().all(|v| parse_date(v).is_some()) {
        ColumnType::Date
    } else if present.all(|v| parse_datetime(v).is_some()) {
        ColumnType::DateTime
    } else {
        ColumnType::String
    }
}

fn convert(field: &str, ty: ColumnType) -> CellValue {
    if field.is_empty() {
        return CellValue::Null;
    }
    let parsed = match ty {
        ColumnType::Integer => field.parse().ok().map(CellValue::Integer),
        ColumnType::Float => field.parse().ok().map(CellValue::Float),
        ColumnType::Bool => parse_bool(field).map(CellValue::Bool),
        ColumnType::Date => parse_date(field).map(CellValue::Date),
        ColumnType::DateTime => parse_datetime(field).map(CellValue::DateTime),
        ColumnType::String => Some(CellValue::String(field.to_string())),
    };
    parsed.unwrap_or(CellValue::Null)
}
