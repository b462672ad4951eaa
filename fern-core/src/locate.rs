//! Locating the Fern framework source tree.
//!
//! Web builds compile the user's entry file against the framework sources,
//! so the CLI has to find a checkout or install of those sources first. The
//! search walks a fixed, ordered list of candidate roots and returns the
//! first directory with the expected `include/fern` + `src` layout. Order
//! matters: earlier entries are the more authoritative installs.

use crate::config;
use crate::error::{BuildError, Probe};
use std::path::{Path, PathBuf};

/// A directory verified to contain the framework's headers and
/// implementation files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    root: PathBuf,
}

impl SourceTree {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn include_dir(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }
}

/// The directory the user actually invoked the CLI from.
///
/// Wrapper scripts change directory before exec'ing the real binary and
/// record the caller's location in `ORIGINAL_CWD`.
pub fn original_cwd() -> PathBuf {
    std::env::var_os("ORIGINAL_CWD")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Ordered candidate roots for the framework sources, most authoritative
/// first: the home install, the CLI's own install location, the caller's
/// working directory and its parent, then fixed system paths.
pub fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(home) = config::home_dir() {
        candidates.push(home.join(".fern").join("src").join("cpp"));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(install_root) = exe.parent().and_then(Path::parent) {
            candidates.push(install_root.join("src").join("cpp"));
        }
    }

    let cwd = original_cwd();
    candidates.push(cwd.join("src").join("cpp"));
    if let Some(parent) = cwd.parent() {
        candidates.push(parent.join("src").join("cpp"));
    }

    candidates.push(PathBuf::from("/usr/local/src/fern/src/cpp"));
    candidates.push(PathBuf::from("/opt/fern/src/cpp"));

    candidates
}

fn has_source_layout(path: &Path) -> bool {
    path.join("include").join("fern").is_dir() && path.join("src").is_dir()
}

/// Probe every candidate without short-circuiting; used by `fern doctor`
/// to report the full search transcript.
pub fn probe_candidates(candidates: &[PathBuf]) -> Vec<Probe> {
    candidates
        .iter()
        .map(|path| Probe {
            path: path.clone(),
            found: has_source_layout(path),
        })
        .collect()
}

/// Search `candidates` in order and return the first valid source tree.
///
/// The error lists every path tried so the user can see exactly where the
/// CLI looked.
pub fn locate_source_in(candidates: &[PathBuf]) -> Result<SourceTree, BuildError> {
    let mut probes = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if has_source_layout(candidate) {
            tracing::debug!("Found Fern source at {}", candidate.display());
            return Ok(SourceTree {
                root: candidate.clone(),
            });
        }
        probes.push(Probe {
            path: candidate.clone(),
            found: false,
        });
    }
    Err(BuildError::SourceNotFound { probes })
}

/// Search the default candidate list.
pub fn locate_source() -> Result<SourceTree, BuildError> {
    locate_source_in(&default_candidates())
}
