use crate::color::SegmentPalette;
use crate::config::DatasetKind;
use crate::dashboard::{DashboardView, Selection};
use crate::data::filter::DateRange;
use crate::data::model::CellValue;
use crate::error::LoadError;
use crate::session::{Readiness, Session};
use crate::ui::notice::user_message;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub session: Session,

    /// Current filter selection; set once both required datasets are loaded.
    pub selection: Option<Selection>,

    /// Cached view for `selection`; rebuilt only when something changes.
    pub view: Option<DashboardView>,

    /// Set when a required dataset is permanently missing.
    pub halted: Option<LoadError>,

    pub palette: SegmentPalette,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether the resolver debug window is open.
    pub show_debug: bool,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        let mut state = Self {
            session,
            selection: None,
            view: None,
            halted: None,
            palette: SegmentPalette::default(),
            status_message: None,
            show_debug: false,
        };
        state.refresh();
        state
    }

    /// Recompute readiness and the view after any session or selection change.
    pub fn refresh(&mut self) {
        match self.session.readiness() {
            Readiness::Ready(datasets) => {
                let columns = &self.session.config().columns;
                let selection = self
                    .selection
                    .get_or_insert_with(|| Selection::initial(&datasets, columns));
                let view = DashboardView::from_datasets(&datasets, selection, columns);

                let labels: Vec<String> = view.all_segments.iter().map(|s| s.to_string()).collect();
                self.palette = SegmentPalette::new(labels.iter().map(String::as_str));
                self.view = Some(view);
                self.halted = None;
            }
            Readiness::Pending(kinds) => {
                log::debug!("Waiting for uploads: {kinds:?}");
                self.view = None;
            }
            Readiness::Halted(e) => {
                log::error!("Session halted: {e}");
                self.view = None;
                self.halted = Some(e);
            }
        }
    }

    pub fn set_date_range(&mut self, range: DateRange) {
        if let Some(selection) = &mut self.selection {
            if selection.date_range != Some(range) {
                selection.date_range = Some(range);
                self.refresh();
            }
        }
    }

    /// Toggle a single segment in the selection.
    pub fn toggle_segment(&mut self, segment: &CellValue) {
        if let Some(selection) = &mut self.selection {
            if !selection.segments.remove(segment) {
                selection.segments.insert(segment.clone());
            }
            self.refresh();
        }
    }

    /// Select every segment present in the data.
    pub fn select_all_segments(&mut self) {
        let all = match &self.view {
            Some(view) => view.all_segments.clone(),
            None => return,
        };
        if let Some(selection) = &mut self.selection {
            selection.segments = all.into_iter().collect();
            self.refresh();
        }
    }

    pub fn select_no_segments(&mut self) {
        if let Some(selection) = &mut self.selection {
            selection.segments.clear();
            self.refresh();
        }
    }

    /// Hand an uploaded file to the session.
    pub fn upload(&mut self, kind: DatasetKind, name: &str, bytes: Vec<u8>) {
        match self.session.supply_upload(kind, name, bytes) {
            Ok(()) => self.status_message = None,
            Err(e) => self.status_message = Some(user_message(&e)),
        }
        self.refresh();
    }

    /// The user gives up on `kind`.
    pub fn skip_upload(&mut self, kind: DatasetKind) {
        self.session.decline_upload(kind);
        self.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::resolver::{BaseDir, Locations};

    const DAY: &str = "dteday,cnt\n2024-01-01,5\n2024-01-02,7\n";
    const SEGMENTS: &str = "customer_id,segment\n1,A\n2,B\n3,C\n";

    fn empty_state(tmp: &std::path::Path) -> AppState {
        let config = Config {
            base_dirs: vec![BaseDir::WorkingDir],
            ..Config::default()
        };
        let locations = Locations {
            script_dir: None,
            working_dir: tmp.to_path_buf(),
        };
        AppState::new(Session::start(config, &locations))
    }

    #[test]
    fn uploads_bring_the_dashboard_up() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = empty_state(tmp.path());
        assert!(state.view.is_none());
        assert!(state.halted.is_none());

        state.upload(DatasetKind::Activity, "day.csv", DAY.as_bytes().to_vec());
        assert!(state.view.is_none());

        state.upload(DatasetKind::Segmentation, "broken.csv", b"a,b\n1\n".to_vec());
        assert!(state.status_message.is_some());

        state.upload(DatasetKind::Segmentation, "segments.csv", SEGMENTS.as_bytes().to_vec());
        assert!(state.status_message.is_none());
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.total_rentals, 12.0);
        assert_eq!(view.segment_rows, vec![0, 1, 2]);
    }

    #[test]
    fn segment_toggles_refresh_the_view() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("day.csv"), DAY).unwrap();
        std::fs::write(tmp.path().join("customer_segmentation.csv"), SEGMENTS).unwrap();
        let mut state = empty_state(tmp.path());

        state.toggle_segment(&CellValue::String("B".into()));
        assert_eq!(state.view.as_ref().unwrap().segment_rows, vec![0, 2]);

        state.select_no_segments();
        assert!(state.view.as_ref().unwrap().segment_rows.is_empty());

        state.select_all_segments();
        assert_eq!(state.view.as_ref().unwrap().segment_rows.len(), 3);
    }

    #[test]
    fn skipping_a_required_upload_halts() {
        let tmp = tempfile::tempdir().unwrap();
        let mut state = empty_state(tmp.path());
        state.skip_upload(DatasetKind::Activity);
        assert!(state.view.is_none());
        assert!(state.halted.is_some());
    }
}
