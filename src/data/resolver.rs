use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Base directory strategies
// ---------------------------------------------------------------------------

/// One way of deriving a directory that may hold a dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum BaseDir {
    /// Directory of the running executable.
    ScriptDir,
    WorkingDir,
    /// A named subdirectory of the working directory.
    WorkingSubdir(String),
    ParentOfWorkingDir,
    /// An absolute deployment root.
    Fixed(PathBuf),
}

/// Directories captured once at startup; candidate lists derive from these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub script_dir: Option<PathBuf>,
    pub working_dir: PathBuf,
}

impl Locations {
    /// Capture the executable directory and the current working directory.
    pub fn capture() -> std::io::Result<Self> {
        let script_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Ok(Locations {
            script_dir,
            working_dir: std::env::current_dir()?,
        })
    }

    fn base(&self, strategy: &BaseDir) -> Option<PathBuf> {
        match strategy {
            BaseDir::ScriptDir => self.script_dir.clone(),
            BaseDir::WorkingDir => Some(self.working_dir.clone()),
            BaseDir::WorkingSubdir(name) => Some(self.working_dir.join(name)),
            BaseDir::ParentOfWorkingDir => self.working_dir.parent().map(Path::to_path_buf),
            BaseDir::Fixed(root) => Some(root.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate list, probing and resolution
// ---------------------------------------------------------------------------

/// Build the ordered candidate list for `filename`: one path per strategy
/// that can be evaluated, in strategy order.
pub fn candidates(filename: &str, strategies: &[BaseDir], locations: &Locations) -> Vec<PathBuf> {
    strategies
        .iter()
        .filter_map(|s| locations.base(s))
        .map(|dir| dir.join(filename))
        .collect()
}

/// A candidate together with whether it is usable, for the debug view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub path: PathBuf,
    pub exists: bool,
}

/// Whether `path` is an existing regular file this process can open for
/// reading. Never fails: permission and other I/O errors count as "not usable".
fn is_usable(path: &Path) -> bool {
    let readable = std::fs::metadata(path).and_then(|meta| {
        if meta.is_file() {
            std::fs::File::open(path).map(|_| true)
        } else {
            Ok(false)
        }
    });
    match readable {
        Ok(usable) => usable,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Cannot use {}: {e}", path.display());
            }
            false
        }
    }
}

/// Existence flag for every candidate, in order.
pub fn probe(candidates: &[PathBuf]) -> Vec<Probe> {
    candidates
        .iter()
        .map(|path| {
            let exists = is_usable(path);
            log::debug!("probe {} -> {exists}", path.display());
            Probe {
                path: path.clone(),
                exists,
            }
        })
        .collect()
}

/// First usable entry of an already checked candidate list, so the chosen
/// path always agrees with what the debug view reports.
pub fn first_usable(probes: &[Probe]) -> Option<PathBuf> {
    probes.iter().find(|p| p.exists).map(|p| p.path.clone())
}

/// First usable candidate, or `None` when none exist.
pub fn resolve(candidates: &[PathBuf]) -> Option<PathBuf> {
    let found = candidates.iter().find(|p| is_usable(p)).cloned();
    match &found {
        Some(path) => log::info!("Resolved {}", path.display()),
        None => log::info!("None of {} candidates exist", candidates.len()),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "a,b\n1,2\n").unwrap();
    }

    #[test]
    fn resolve_picks_the_earliest_existing_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        let list: Vec<PathBuf> = (0..5).map(|i| tmp.path().join(format!("c{i}/day.csv"))).collect();

        for i in 0..list.len() {
            // only candidates[i..] exist
            for (j, p) in list.iter().enumerate() {
                if j >= i {
                    touch(p);
                } else if p.exists() {
                    fs::remove_file(p).unwrap();
                }
            }
            assert_eq!(resolve(&list), Some(list[i].clone()), "i = {i}");
        }
    }

    #[test]
    fn resolve_returns_none_when_nothing_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let list = vec![tmp.path().join("a.csv"), tmp.path().join("nested/missing/b.csv")];
        assert_eq!(resolve(&list), None);
        assert_eq!(resolve(&[]), None);
    }

    #[test]
    fn directories_are_not_datasets() {
        let tmp = tempfile::tempdir().unwrap();
        let dir_named_like_file = tmp.path().join("day.csv");
        fs::create_dir(&dir_named_like_file).unwrap();
        let real = tmp.path().join("sub/day.csv");
        touch(&real);

        let list = vec![dir_named_like_file, real.clone()];
        assert_eq!(resolve(&list), Some(real));
    }

    #[test]
    fn probe_reports_every_candidate_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let present = tmp.path().join("b/day.csv");
        touch(&present);
        let list = vec![tmp.path().join("a/day.csv"), present.clone(), tmp.path().join("c/day.csv")];

        let probes = probe(&list);
        let flags: Vec<bool> = probes.iter().map(|p| p.exists).collect();
        assert_eq!(flags, vec![false, true, false]);
        assert_eq!(probes[1].path, present);
    }

    #[test]
    fn first_usable_matches_the_debug_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let second = tmp.path().join("b/day.csv");
        let third = tmp.path().join("c/day.csv");
        touch(&second);
        touch(&third);
        let list = vec![tmp.path().join("a/day.csv"), second.clone(), third];

        assert_eq!(first_usable(&probe(&list)), Some(second));
        assert_eq!(first_usable(&probe(&list[..1])), None);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_does_not_stop_resolution() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let locked = tmp.path().join("day.csv");
        let readable = tmp.path().join("dashboard/day.csv");
        touch(&locked);
        touch(&readable);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores file modes; nothing to check there
        if fs::File::open(&locked).is_ok() {
            return;
        }

        let list = vec![locked.clone(), readable.clone()];
        assert_eq!(resolve(&list), Some(readable.clone()));
        let flags: Vec<bool> = probe(&list).iter().map(|p| p.exists).collect();
        assert_eq!(flags, vec![false, true]);
        assert_eq!(first_usable(&probe(&list)), Some(readable));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn candidates_follow_strategy_order() {
        let locations = Locations {
            script_dir: Some(PathBuf::from("/opt/app/bin")),
            working_dir: PathBuf::from("/home/u/project"),
        };
        let strategies = vec![
            BaseDir::ScriptDir,
            BaseDir::WorkingDir,
            BaseDir::WorkingSubdir("dashboard".into()),
            BaseDir::ParentOfWorkingDir,
            BaseDir::Fixed(PathBuf::from("/srv/a")),
            BaseDir::Fixed(PathBuf::from("/srv/b")),
        ];

        assert_eq!(
            candidates("day.csv", &strategies, &locations),
            vec![
                PathBuf::from("/opt/app/bin/day.csv"),
                PathBuf::from("/home/u/project/day.csv"),
                PathBuf::from("/home/u/project/dashboard/day.csv"),
                PathBuf::from("/home/u/day.csv"),
                PathBuf::from("/srv/a/day.csv"),
                PathBuf::from("/srv/b/day.csv"),
            ]
        );
    }

    #[test]
    fn unavailable_strategies_are_skipped() {
        let locations = Locations {
            script_dir: None,
            working_dir: PathBuf::from("/"),
        };
        let strategies = vec![BaseDir::ScriptDir, BaseDir::ParentOfWorkingDir, BaseDir::WorkingDir];
        assert_eq!(
            candidates("hour.csv", &strategies, &locations),
            vec![PathBuf::from("/hour.csv")]
        );
    }
}
