//! Taskrc configuration.
//!
//! Parses the engine's line-oriented rc format into an immutable nested tree:
//! - `dotted.key = value` settings become nested subtrees
//! - `#` starts a comment (`\#` is a literal hash)
//! - `include <path>` splices another rc file in place, resolved through
//!   [`IncludeSearchPaths`]
//!
//! ## Merge Strategy
//! Included trees and caller overrides are deep-merged node by node. When a
//! scalar and a subtree meet at the same key, the later definition replaces
//! the earlier one entirely.
//!
//! ## Environment Variables
//! - `TASKRC` - taskrc location (default: `~/.taskrc`)
//! - `TASK_RCDIR` - extra directory searched for relative includes

mod include;
mod loader;
mod merge;
mod tree;

pub use include::{IncludeSearchPaths, SYSTEM_RC_DIRS, TASK_RCDIR_ENV, expand_home};
pub use loader::{TASKRC_ENV, TaskRc, default_taskrc_path, sanitize};
pub use merge::{deep_merge, deep_merge_all};
pub use tree::{ConfigTree, ConfigValue};
