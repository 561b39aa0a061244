use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ck", about = concat!("[x] checklist v", env!("CARGO_PKG_VERSION"), " - ordered tasks under headlines"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "workspace-dir", global = true)]
    pub workspace_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a checklist workspace in the current directory
    Init(InitArgs),
    /// List tasks grouped under their headlines (default)
    List,
    /// Show one task in detail
    Show(IdArg),
    /// Append a task or headline to the end of the list
    Add(AddArgs),
    /// Flip a single task between done and not done
    Toggle(IdArg),
    /// Check (or uncheck) a headline and every task under it
    CheckAll(IdArg),
    /// Replace a task's text and attachments
    Edit(EditArgs),
    /// Delete a task
    Rm(IdArg),
    /// Move a task within the list
    Mv(MvArgs),
    /// Replace the whole order with the given ids
    Reorder(ReorderArgs),
    /// Write the list as a JSON document
    Export(ExportArgs),
    /// Replace the list with a JSON document
    Import(ImportArgs),
    /// Probe or manage predefined list sources
    Sources(SourcesCmd),
    /// Replace the list with a predefined list
    Load(LoadArgs),
    /// View or change suggestion settings
    Settings(SettingsArgs),
    /// Remove every task
    Clear(ClearArgs),
}

// ---------------------------------------------------------------------------
// Shared args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task ID (any unique prefix)
    pub id: String,
}

/// Optional content attached to a task. `edit` replaces all of it, so flags
/// left out clear the corresponding field.
#[derive(Args, Default)]
pub struct ContentArgs {
    /// Mark the task as optional
    #[arg(long)]
    pub optional: bool,
    /// Language of the attached code block
    #[arg(long)]
    pub lang: Option<String>,
    /// Code block contents
    #[arg(long, requires = "lang", conflicts_with = "code_file")]
    pub code: Option<String>,
    /// Read the code block from a file
    #[arg(long, requires = "lang")]
    pub code_file: Option<PathBuf>,
    /// Formatted notes, stored verbatim
    #[arg(long)]
    pub rich_text: Option<String>,
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Reinitialize even if .checklist/ already exists (empties the list)
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Add a headline instead of a task
    #[arg(long)]
    pub headline: bool,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    /// New task text
    pub text: String,
    #[command(flatten)]
    pub content: ContentArgs,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID (any unique prefix)
    pub id: String,
    #[command(flatten)]
    pub target: MvTarget,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct MvTarget {
    /// Move to the top of the list
    #[arg(long)]
    pub top: bool,
    /// Move to the bottom of the list
    #[arg(long)]
    pub bottom: bool,
    /// Move directly after this task
    #[arg(long, value_name = "ID")]
    pub after: Option<String>,
    /// Move directly before this task
    #[arg(long, value_name = "ID")]
    pub before: Option<String>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Every task ID, in the new order
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Confirm removing every task
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Exchange args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// JSON document to import
    pub file: PathBuf,
}

#[derive(Args)]
pub struct SourcesCmd {
    #[command(subcommand)]
    pub action: Option<SourcesAction>,
}

#[derive(Subcommand)]
pub enum SourcesAction {
    /// Fetch every source and report its status (default)
    List,
    /// Register a source
    Add(SourcesAddArgs),
    /// Remove a source by name
    Rm(SourcesRmArgs),
}

#[derive(Args)]
pub struct SourcesAddArgs {
    /// Display name
    pub name: String,
    /// URL of the JSON document
    pub url: String,
}

#[derive(Args)]
pub struct SourcesRmArgs {
    /// Source name
    pub name: String,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Source name (case-insensitive)
    pub name: String,
}

// ---------------------------------------------------------------------------
// Settings args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SettingsArgs {
    /// Store an API key
    #[arg(long, conflicts_with = "clear_api_key")]
    pub api_key: Option<String>,
    /// Remove the stored API key
    #[arg(long)]
    pub clear_api_key: bool,
    /// Suggestion service
    #[arg(long)]
    pub service: Option<String>,
    /// Suggestion model
    #[arg(long)]
    pub model: Option<String>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.api_key.is_none()
            && !self.clear_api_key
            && self.service.is_none()
            && self.model.is_none()
    }
}
