use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::{default_renames, RenameTable};
use crate::data::resolver::BaseDir;

/// Environment variable naming an explicit JSON config file.
pub const CONFIG_ENV: &str = "BIKE_DASHBOARD_CONFIG";
/// Environment variable replacing the fixed deployment roots (path-list syntax).
pub const ROOTS_ENV: &str = "BIKE_DASHBOARD_ROOTS";
/// Config file picked up from the working directory when no env var is set.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

pub const DEPLOYMENT_ROOT_A: &str = "/mount/src/bike-sharing/dashboard";
pub const DEPLOYMENT_ROOT_B: &str = "/app/dashboard";

// ---------------------------------------------------------------------------
// Logical dataset names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Daily rental activity (`day.csv`).
    Activity,
    /// Hourly rental activity (`hour.csv`), used for the hourly chart only.
    Hourly,
    /// Customer segmentation produced upstream.
    Segmentation,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 3] = [
        DatasetKind::Activity,
        DatasetKind::Hourly,
        DatasetKind::Segmentation,
    ];

    /// Whether the dashboard refuses to render without this dataset.
    pub fn is_required(self) -> bool {
        !matches!(self, DatasetKind::Hourly)
    }

    pub fn label(self) -> &'static str {
        match self {
            DatasetKind::Activity => "activity dataset",
            DatasetKind::Hourly => "hourly activity dataset",
            DatasetKind::Segmentation => "segmentation dataset",
        }
    }

    fn default_filename(self) -> &'static str {
        match self {
            DatasetKind::Activity => "day.csv",
            DatasetKind::Hourly => "hour.csv",
            DatasetKind::Segmentation => "customer_segmentation.csv",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where one dataset comes from: a local filename probed across the base
/// directories, or a remote URL that replaces probing altogether.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSource {
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Column names the dashboard reads, after renaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub date: String,
    pub rentals: String,
    pub hour: String,
    pub segment: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            date: "date".into(),
            rentals: "total_rentals".into(),
            hour: "hour".into(),
            segment: "segment".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub datasets: BTreeMap<DatasetKind, DatasetSource>,
    /// Probe order; earlier entries win.
    pub base_dirs: Vec<BaseDir>,
    pub renames: RenameTable,
    /// Offer a file picker when a dataset cannot be resolved.
    pub allow_upload: bool,
    pub columns: ColumnNames,
}

impl Default for Config {
    fn default() -> Self {
        let datasets = DatasetKind::ALL
            .iter()
            .map(|&kind| {
                (
                    kind,
                    DatasetSource {
                        filename: kind.default_filename().to_string(),
                        url: None,
                    },
                )
            })
            .collect();

        Self {
            datasets,
            base_dirs: vec![
                BaseDir::ScriptDir,
                BaseDir::WorkingDir,
                BaseDir::WorkingSubdir("dashboard".into()),
                BaseDir::ParentOfWorkingDir,
                BaseDir::Fixed(PathBuf::from(DEPLOYMENT_ROOT_A)),
                BaseDir::Fixed(PathBuf::from(DEPLOYMENT_ROOT_B)),
            ],
            renames: default_renames(),
            allow_upload: true,
            columns: ColumnNames::default(),
        }
    }
}

impl Config {
    /// Load the config for this process: explicit file from `BIKE_DASHBOARD_CONFIG`,
    /// else `dashboard.json` in `working_dir`, else defaults. A broken file is
    /// logged and ignored. `BIKE_DASHBOARD_ROOTS` is applied last.
    pub fn load(working_dir: &Path) -> Config {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = explicit.unwrap_or_else(|| working_dir.join(DEFAULT_CONFIG_FILE));

        let mut config = if path.is_file() {
            match Config::from_file(&path) {
                Ok(c) => {
                    log::info!("Loaded config from {}", path.display());
                    c
                }
                Err(e) => {
                    log::error!("Ignoring config {}: {e:#}", path.display());
                    Config::default()
                }
            }
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        if let Some(roots) = std::env::var_os(ROOTS_ENV) {
            let roots: Vec<PathBuf> = std::env::split_paths(&roots)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
            log::info!("Deployment roots overridden: {roots:?}");
            config.set_deployment_roots(roots);
        }
        config
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).context("reading config file")?;
        Config::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Config> {
        serde_json::from_str(text).context("parsing config JSON")
    }

    /// Replace every `Fixed` base directory with `roots`, keeping them last.
    /// An empty list leaves the configured roots unchanged.
    pub fn set_deployment_roots(&mut self, roots: Vec<PathBuf>) {
        if roots.is_empty() {
            log::warn!("{ROOTS_ENV} names no directories; keeping configured deployment roots");
            return;
        }
        self.base_dirs.retain(|b| !matches!(b, BaseDir::Fixed(_)));
        self.base_dirs.extend(roots.into_iter().map(BaseDir::Fixed));
    }

    /// Source for `kind`; falls back to the built-in filename when the config
    /// file only lists some datasets.
    pub fn source(&self, kind: DatasetKind) -> DatasetSource {
        self.datasets.get(&kind).cloned().unwrap_or_else(|| DatasetSource {
            filename: kind.default_filename().to_string(),
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_probe_local_paths_before_deployment_roots() {
        let config = Config::default();
        assert_eq!(config.base_dirs.first(), Some(&BaseDir::ScriptDir));
        assert_eq!(
            config.base_dirs.last(),
            Some(&BaseDir::Fixed(PathBuf::from(DEPLOYMENT_ROOT_B)))
        );
        assert_eq!(config.source(DatasetKind::Activity).filename, "day.csv");
        assert!(config.allow_upload);
    }

    #[test]
    fn json_overrides_only_what_it_names() {
        let config = Config::from_json_str(
            r#"{
                "datasets": {
                    "activity": { "filename": "daily.csv", "url": "https://example.org/day.csv" }
                },
                "allow_upload": false,
                "columns": { "segment": "Segment" }
            }"#,
        )
        .unwrap();

        let activity = config.source(DatasetKind::Activity);
        assert_eq!(activity.filename, "daily.csv");
        assert_eq!(activity.url.as_deref(), Some("https://example.org/day.csv"));
        assert_eq!(
            config.source(DatasetKind::Segmentation).filename,
            "customer_segmentation.csv"
        );
        assert!(!config.allow_upload);
        assert_eq!(config.columns.segment, "Segment");
        assert_eq!(config.columns.rentals, "total_rentals");
        assert_eq!(config.base_dirs, Config::default().base_dirs);
    }

    #[test]
    fn base_dirs_round_trip_through_json() {
        let config = Config::from_json_str(
            r#"{ "base_dirs": [
                { "kind": "working_subdir", "path": "data" },
                { "kind": "fixed", "path": "/srv/data" },
                { "kind": "script_dir" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            config.base_dirs,
            vec![
                BaseDir::WorkingSubdir("data".into()),
                BaseDir::Fixed(PathBuf::from("/srv/data")),
                BaseDir::ScriptDir,
            ]
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json_str("{ not json").is_err());
    }

    #[test]
    fn deployment_roots_replace_fixed_entries() {
        let mut config = Config::default();
        config.set_deployment_roots(vec![PathBuf::from("/opt/bikes")]);
        let fixed: Vec<_> = config
            .base_dirs
            .iter()
            .filter(|b| matches!(b, BaseDir::Fixed(_)))
            .collect();
        assert_eq!(fixed, vec![&BaseDir::Fixed(PathBuf::from("/opt/bikes"))]);
        assert_eq!(config.base_dirs.len(), 5);
    }

    #[test]
    fn empty_deployment_roots_keep_the_configured_ones() {
        let mut config = Config::default();
        config.set_deployment_roots(Vec::new());
        assert_eq!(config.base_dirs, Config::default().base_dirs);
    }
}
