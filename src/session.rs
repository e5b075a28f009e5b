use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{Config, DatasetKind};
use crate::data::loader::{self, LoadSource};
use crate::data::model::TabularDataset;
use crate::data::resolver::{self, Locations, Probe};
use crate::error::{LoadError, LoadErrorKind};

// ---------------------------------------------------------------------------
// Per-dataset load state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum DatasetSlot {
    /// Parsed and frozen for the rest of the session.
    Loaded {
        data: Arc<TabularDataset>,
        origin: String,
    },
    /// No usable file yet; the user may still upload one.
    AwaitingUpload { last_error: Option<LoadError> },
    /// Will never be obtained in this session.
    Absent(LoadError),
}

/// Both required datasets, plus the optional hourly one.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub activity: Arc<TabularDataset>,
    pub segmentation: Arc<TabularDataset>,
    pub hourly: Option<Arc<TabularDataset>>,
}

#[derive(Debug, Clone)]
pub enum Readiness {
    Ready(Datasets),
    /// Required datasets still waiting for an upload.
    Pending(Vec<DatasetKind>),
    /// A required dataset is permanently missing; nothing more is rendered.
    Halted(LoadError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Everything one dashboard session knows about its inputs.
pub struct Session {
    config: Config,
    slots: BTreeMap<DatasetKind, DatasetSlot>,
    probes: BTreeMap<DatasetKind, Vec<Probe>>,
}

impl Session {
    /// Resolve and load every dataset once.
    pub fn start(config: Config, locations: &Locations) -> Self {
        let mut slots = BTreeMap::new();
        let mut probes = BTreeMap::new();

        for kind in DatasetKind::ALL {
            let (slot, kind_probes) = obtain(&config, locations, kind);
            slots.insert(kind, slot);
            probes.insert(kind, kind_probes);
        }

        Session {
            config,
            slots,
            probes,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn slot(&self, kind: DatasetKind) -> Option<&DatasetSlot> {
        self.slots.get(&kind)
    }

    /// Candidate paths and their existence flags, for the debug view.
    pub fn probes(&self, kind: DatasetKind) -> &[Probe] {
        self.probes.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn dataset(&self, kind: DatasetKind) -> Option<Arc<TabularDataset>> {
        match self.slots.get(&kind)? {
            DatasetSlot::Loaded { data, .. } => Some(Arc::clone(data)),
            _ => None,
        }
    }

    /// Datasets the user can still upload, in display order.
    pub fn awaiting_upload(&self) -> Vec<DatasetKind> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, DatasetSlot::AwaitingUpload { .. }))
            .map(|(&kind, _)| kind)
            .collect()
    }

    /// Parse an uploaded file for `kind`. Only slots awaiting an upload accept
    /// one; on failure the slot keeps waiting and remembers the error.
    pub fn supply_upload(
        &mut self,
        kind: DatasetKind,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), LoadError> {
        let Some(slot) = self.slots.get_mut(&kind) else {
            return Ok(());
        };
        if !matches!(slot, DatasetSlot::AwaitingUpload { .. }) {
            log::warn!("Ignoring upload '{name}' for {kind}: not awaiting an upload");
            return Ok(());
        }

        let source = LoadSource::Upload {
            name: name.to_string(),
            bytes,
        };
        match loader::load(kind, &source, &self.config.renames) {
            Ok(data) => {
                *slot = DatasetSlot::Loaded {
                    data: Arc::new(data),
                    origin: source.describe(),
                };
                Ok(())
            }
            Err(e) => {
                *slot = DatasetSlot::AwaitingUpload {
                    last_error: Some(e.clone()),
                };
                Err(e)
            }
        }
    }

    /// The user will not upload `kind`; it becomes permanently absent.
    pub fn decline_upload(&mut self, kind: DatasetKind) {
        if let Some(slot) = self.slots.get_mut(&kind) {
            if let DatasetSlot::AwaitingUpload { last_error } = slot {
                let cause = last_error.take().unwrap_or_else(|| {
                    LoadError::not_found(kind, "no file found and no upload given")
                });
                log::info!("{kind} declined: {}", cause.detail);
                *slot = DatasetSlot::Absent(cause);
            }
        }
    }

    /// No more uploads will arrive for any dataset.
    pub fn close_uploads(&mut self) {
        for kind in self.awaiting_upload() {
            self.decline_upload(kind);
        }
    }

    pub fn readiness(&self) -> Readiness {
        let required = || DatasetKind::ALL.into_iter().filter(|k| k.is_required());

        let absent = |k: &DatasetKind| matches!(self.slot(*k), Some(DatasetSlot::Absent(_)) | None);
        if let Some(kind) = required().find(absent) {
            let cause = match self.slot(kind) {
                Some(DatasetSlot::Absent(e)) => e.detail.clone(),
                _ => "not configured".to_string(),
            };
            return Readiness::Halted(LoadError::new(
                LoadErrorKind::MissingRequiredDataset,
                kind,
                format!("required dataset could not be obtained ({cause})"),
            ));
        }

        let pending: Vec<DatasetKind> = required()
            .filter(|k| self.dataset(*k).is_none())
            .collect();
        if !pending.is_empty() {
            return Readiness::Pending(pending);
        }

        match (
            self.dataset(DatasetKind::Activity),
            self.dataset(DatasetKind::Segmentation),
        ) {
            (Some(activity), Some(segmentation)) => Readiness::Ready(Datasets {
                activity,
                segmentation,
                hourly: self.dataset(DatasetKind::Hourly),
            }),
            _ => Readiness::Halted(LoadError::missing(DatasetKind::Activity)),
        }
    }
}

/// Obtain one dataset: remote fetch when a URL is configured (no fallback),
/// otherwise resolve across the base directories and parse.
fn obtain(config: &Config, locations: &Locations, kind: DatasetKind) -> (DatasetSlot, Vec<Probe>) {
    let source = config.source(kind);

    if let Some(url) = source.url {
        let slot = match loader::load(kind, &LoadSource::Remote(url.clone()), &config.renames) {
            Ok(data) => DatasetSlot::Loaded {
                data: Arc::new(data),
                origin: url,
            },
            Err(e) => DatasetSlot::Absent(e),
        };
        return (slot, Vec::new());
    }

    let candidates = resolver::candidates(&source.filename, &config.base_dirs, locations);
    let probes = resolver::probe(&candidates);

    let outcome = match resolver::first_usable(&probes) {
        Some(path) => {
            let origin = path.display().to_string();
            loader::load(kind, &LoadSource::Path(path), &config.renames).map(|data| (data, origin))
        }
        None => Err(LoadError::not_found(
            kind,
            format!("'{}' not found in {} locations", source.filename, candidates.len()),
        )),
    };

    let slot = match outcome {
        Ok((data, origin)) => DatasetSlot::Loaded {
            data: Arc::new(data),
            origin,
        },
        Err(e) if config.allow_upload => DatasetSlot::AwaitingUpload {
            last_error: Some(e),
        },
        Err(e) => DatasetSlot::Absent(e),
    };
    (slot, probes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::resolver::BaseDir;
    use std::path::Path;

    const DAY: &str = "dteday,hr,cnt\n2011-01-01,0,5\n2011-01-02,1,7\n";
    const SEGMENTS: &str = "customer_id,segment\n1,Loyal\n2,New\n3,Loyal\n";

    fn config_for(allow_upload: bool) -> Config {
        Config {
            base_dirs: vec![BaseDir::WorkingDir, BaseDir::WorkingSubdir("dashboard".into())],
            allow_upload,
            ..Config::default()
        }
    }

    fn locations(dir: &Path) -> Locations {
        Locations {
            script_dir: None,
            working_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn nothing_found_waits_for_uploads_then_halts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = Session::start(config_for(true), &locations(tmp.path()));

        assert_eq!(session.awaiting_upload(), DatasetKind::ALL.to_vec());
        match session.readiness() {
            Readiness::Pending(kinds) => {
                assert_eq!(kinds, vec![DatasetKind::Activity, DatasetKind::Segmentation])
            }
            other => panic!("expected pending, got {other:?}"),
        }

        session.close_uploads();
        match session.readiness() {
            Readiness::Halted(e) => assert_eq!(e.kind, LoadErrorKind::MissingRequiredDataset),
            other => panic!("expected halted, got {other:?}"),
        }
    }

    #[test]
    fn without_uploads_missing_files_halt_immediately() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::start(config_for(false), &locations(tmp.path()));
        assert!(session.awaiting_upload().is_empty());
        assert!(matches!(session.readiness(), Readiness::Halted(_)));
        assert!(matches!(
            session.slot(DatasetKind::Activity),
            Some(DatasetSlot::Absent(LoadError { kind: LoadErrorKind::PathNotFound, .. }))
        ));
    }

    #[test]
    fn resolved_files_make_the_session_ready_without_hourly() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("dashboard")).unwrap();
        std::fs::write(tmp.path().join("dashboard/day.csv"), DAY).unwrap();
        std::fs::write(tmp.path().join("customer_segmentation.csv"), SEGMENTS).unwrap();

        let session = Session::start(config_for(true), &locations(tmp.path()));
        let Readiness::Ready(datasets) = session.readiness() else {
            panic!("expected ready");
        };
        assert_eq!(datasets.activity.len(), 2);
        assert_eq!(datasets.segmentation.len(), 3);
        assert!(datasets.hourly.is_none());
        assert_eq!(session.awaiting_upload(), vec![DatasetKind::Hourly]);

        let flags: Vec<bool> = session
            .probes(DatasetKind::Activity)
            .iter()
            .map(|p| p.exists)
            .collect();
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn uploads_recover_a_pending_session() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), DAY).unwrap();
        let mut session = Session::start(config_for(true), &locations(tmp.path()));

        let err = session
            .supply_upload(DatasetKind::Segmentation, "bad.csv", b"a,b\n1\n".to_vec())
            .unwrap_err();
        assert_eq!(err.kind, LoadErrorKind::ParseFailure);
        assert!(matches!(
            session.slot(DatasetKind::Segmentation),
            Some(DatasetSlot::AwaitingUpload { last_error: Some(_) })
        ));

        session
            .supply_upload(DatasetKind::Segmentation, "segments.csv", SEGMENTS.as_bytes().to_vec())
            .unwrap();
        assert!(matches!(session.readiness(), Readiness::Ready(_)));
    }

    #[test]
    fn malformed_resolved_file_falls_back_to_upload() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), "dteday,cnt\n2011-01-01\n").unwrap();
        let session = Session::start(config_for(true), &locations(tmp.path()));

        match session.slot(DatasetKind::Activity) {
            Some(DatasetSlot::AwaitingUpload {
                last_error: Some(e),
            }) => assert_eq!(e.kind, LoadErrorKind::ParseFailure),
            other => panic!("unexpected slot {other:?}"),
        }
    }

    #[test]
    fn declining_a_required_upload_halts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), DAY).unwrap();
        let mut session = Session::start(config_for(true), &locations(tmp.path()));

        session.decline_upload(DatasetKind::Hourly);
        assert!(matches!(session.readiness(), Readiness::Pending(_)));

        session.decline_upload(DatasetKind::Segmentation);
        match session.readiness() {
            Readiness::Halted(e) => assert_eq!(e.dataset, DatasetKind::Segmentation),
            other => panic!("expected halted, got {other:?}"),
        }
    }

    #[test]
    fn failed_remote_dataset_never_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), DAY).unwrap();
        std::fs::write(tmp.path().join("customer_segmentation.csv"), SEGMENTS).unwrap();

        let mut config = config_for(true);
        config.datasets.insert(
            DatasetKind::Activity,
            crate::config::DatasetSource {
                filename: "day.csv".into(),
                url: Some("http://127.0.0.1:1/day.csv".into()),
            },
        );
        let session = Session::start(config, &locations(tmp.path()));

        assert!(matches!(
            session.slot(DatasetKind::Activity),
            Some(DatasetSlot::Absent(LoadError { kind: LoadErrorKind::FetchFailure, .. }))
        ));
        assert!(session.probes(DatasetKind::Activity).is_empty());
        assert!(!session.awaiting_upload().contains(&DatasetKind::Activity));
        match session.readiness() {
            Readiness::Halted(e) => {
                assert_eq!(e.kind, LoadErrorKind::MissingRequiredDataset);
                assert_eq!(e.dataset, DatasetKind::Activity);
            }
            other => panic!("expected halted, got {other:?}"),
        }
    }

    #[test]
    fn loaded_datasets_ignore_uploads() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), DAY).unwrap();
        let mut session = Session::start(config_for(true), &locations(tmp.path()));

        session
            .supply_upload(DatasetKind::Activity, "other.csv", b"x\n1\n".to_vec())
            .unwrap();
        let activity = session.dataset(DatasetKind::Activity).unwrap();
        assert!(activity.has_column("date"));
    }
}
