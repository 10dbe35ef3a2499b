//! Include path resolution across the taskrc search locations.
//!
//! Relative include paths are looked up in, highest priority first:
//! 1. the current working directory
//! 2. `$TASK_RCDIR`
//! 3. the directory holding the file that contains the `include`
//! 4. `/usr/local/share/doc/task/rc` and `/usr/share/doc/task/rc`
//!
//! The first directory that contains the file wins. Absolute paths are used
//! as written.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an extra include directory.
pub const TASK_RCDIR_ENV: &str = "TASK_RCDIR";

/// System-wide directories shipped with the engine's sample rc files.
pub const SYSTEM_RC_DIRS: [&str; 2] = ["/usr/local/share/doc/task/rc", "/usr/share/doc/task/rc"];

/// Candidate directories for include resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSearchPaths {
    /// Current working directory, if it could be determined
    pub current_dir: Option<PathBuf>,
    /// Directory from `$TASK_RCDIR`
    pub rc_dir: Option<PathBuf>,
    /// Fixed installation directories, searched last
    pub system_dirs: Vec<PathBuf>,
}

impl Default for IncludeSearchPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl IncludeSearchPaths {
    /// Discover search locations from the process environment.
    pub fn discover() -> Self {
        let current_dir = std::env::current_dir()
            .ok()
            .map(|d| d.canonicalize().unwrap_or(d));

        let rc_dir = std::env::var_os(TASK_RCDIR_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Self {
            current_dir,
            rc_dir,
            system_dirs: SYSTEM_RC_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Create search paths with explicit directories and no system fallbacks.
    pub fn with_dirs(current_dir: Option<PathBuf>, rc_dir: Option<PathBuf>) -> Self {
        Self {
            current_dir,
            rc_dir,
            system_dirs: Vec::new(),
        }
    }

    /// Replace the system directories.
    pub fn with_system_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.system_dirs = dirs.into_iter().collect();
        self
    }

    /// Candidate directories in priority order for a file living in `including_dir`.
    pub fn candidates(&self, including_dir: Option<&Path>) -> Vec<PathBuf> {
        self.current_dir
            .iter()
            .chain(self.rc_dir.iter())
            .cloned()
            .chain(including_dir.map(Path::to_path_buf))
            .chain(self.system_dirs.iter().cloned())
            .collect()
    }

    /// Resolve an include target to a concrete file path.
    pub fn resolve(&self, include: &str, including_file: Option<&Path>) -> Result<PathBuf> {
        let target = expand_home(include);
        if target.is_absolute() {
            return Ok(target);
        }

        let including_dir = including_file
            .map(|f| f.canonicalize().unwrap_or_else(|_| f.to_path_buf()))
            .and_then(|f| f.parent().map(Path::to_path_buf));

        let searched = self.candidates(including_dir.as_deref());
        for dir in &searched {
            let candidate = dir.join(&target);
            if candidate.is_file() {
                debug!("Found file to include at {}", candidate.display());
                return Ok(candidate);
            }
        }

        Err(Error::IncludeResolution {
            include: include.to_string(),
            searched,
        })
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
