use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::config::Config;
use crate::model::workspace::Workspace;
use crate::ops::store::{StoreError, TaskStore};
use crate::parse::{CodecError, parse_snapshot, serialize_snapshot};

/// Name of the workspace directory
pub const WORKSPACE_DIR: &str = ".checklist";
pub const CONFIG_FILE: &str = "config.toml";
pub const TASKS_FILE: &str = "tasks.json";

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a checklist workspace: no .checklist/ directory found (run `ck init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("invalid task file {path}: {source}")]
    DocumentError { path: PathBuf, source: CodecError },
    #[error("invalid task file: {0}")]
    StoreError(#[from] StoreError),
}

/// Discover the workspace by walking up from the given directory, looking
/// for a `.checklist/` subdirectory with a config file.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        let dir = current.join(WORKSPACE_DIR);
        if dir.is_dir() && dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Read and parse `config.toml`
pub fn load_config(dir: &Path) -> Result<Config, WorkspaceError> {
    let path = dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| WorkspaceError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Load a workspace from its root directory. A missing task file loads as an
/// empty list; an invalid one is an error.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let dir = root.join(WORKSPACE_DIR);
    if !dir.is_dir() {
        return Err(WorkspaceError::NotAWorkspace);
    }
    let config = load_config(&dir)?;

    let tasks_path = dir.join(TASKS_FILE);
    let (list_name, store) = if tasks_path.exists() {
        let text = fs::read_to_string(&tasks_path).map_err(|e| WorkspaceError::ReadError {
            path: tasks_path.clone(),
            source: e,
        })?;
        let doc = parse_snapshot(&text).map_err(|e| WorkspaceError::DocumentError {
            path: tasks_path.clone(),
            source: e,
        })?;
        tracing::debug!(tasks = doc.tasks.len(), path = %tasks_path.display(), "loaded task file");
        (doc.name, TaskStore::from_tasks(doc.tasks)?)
    } else {
        (None, TaskStore::new())
    };

    Ok(Workspace {
        root: root.to_path_buf(),
        dir,
        config,
        list_name,
        store,
    })
}

/// Write the current task list back to `tasks.json`
pub fn save_tasks(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let path = workspace.dir.join(TASKS_FILE);
    let content = serialize_snapshot(workspace.store.tasks(), workspace.list_name.as_deref())
        .map_err(|e| WorkspaceError::DocumentError {
            path: path.clone(),
            source: e,
        })?;
    atomic_write(&path, content.as_bytes())
        .map_err(|e| WorkspaceError::WriteError { path, source: e })?;
    tracing::debug!(tasks = workspace.store.tasks().len(), "saved task file");
    Ok(())
}

/// Create the `.checklist/` layout under `root`. An existing task file is
/// kept unless `reset_tasks` is set.
pub fn create_layout(root: &Path, config_text: &str, reset_tasks: bool) -> Result<PathBuf, WorkspaceError> {
    let dir = root.join(WORKSPACE_DIR);
    fs::create_dir_all(&dir).map_err(|e| WorkspaceError::WriteError {
        path: dir.clone(),
        source: e,
    })?;

    let config_path = dir.join(CONFIG_FILE);
    atomic_write(&config_path, config_text.as_bytes()).map_err(|e| WorkspaceError::WriteError {
        path: config_path,
        source: e,
    })?;

    let tasks_path = dir.join(TASKS_FILE);
    if reset_tasks || !tasks_path.exists() {
        let empty = serialize_snapshot(&[], None).map_err(|e| WorkspaceError::DocumentError {
            path: tasks_path.clone(),
            source: e,
        })?;
        atomic_write(&tasks_path, empty.as_bytes()).map_err(|e| WorkspaceError::WriteError {
            path: tasks_path,
            source: e,
        })?;
    }
    Ok(dir)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
