use std::path::PathBuf;

use super::config::Config;
use crate::ops::store::TaskStore;

/// A fully loaded checklist workspace
pub struct Workspace {
    /// Root directory of the workspace (parent of `.checklist/`)
    pub root: PathBuf,
    /// Path to the `.checklist/` directory
    pub dir: PathBuf,
    /// Parsed config.toml
    pub config: Config,
    /// Display name carried over from the last imported document
    pub list_name: Option<String>,
    /// The current task list
    pub store: TaskStore,
}
