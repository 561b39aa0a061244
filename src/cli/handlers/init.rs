use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::workspace_io::{self, CONFIG_FILE, WORKSPACE_DIR};

const CONFIG_TEMPLATE: &str = r##"# checklist workspace settings

[settings]
# Task suggestion service. Only stored here; `ck settings` edits these.
service = "google"
model = "gemini-1.5-flash"
# api_key = ""

[ui]
has_seen_intro = false

[remote]
# Seconds before a source fetch is abandoned
timeout_secs = 10

# --- Predefined lists ---
# Fetched with `ck sources`, loaded with `ck load <name>`.
# Add entries here or use: ck sources add <name> <url>
#
# [[sources]]
# name = "Simple example"
# url = "https://example.com/tasklists/simple-example-list.json"
"##;

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let ws_dir = root.join(WORKSPACE_DIR);

    if ws_dir.join(CONFIG_FILE).exists() && !args.force {
        return Err(format!(
            "checklist already exists in {}/ (use --force to start over)",
            ws_dir.display()
        )
        .into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = workspace_io::discover_workspace(parent)
    {
        eprintln!(
            "Note: enclosing checklist found at {}/",
            parent_root.join(WORKSPACE_DIR).display()
        );
    }

    let created = workspace_io::create_layout(&root, CONFIG_TEMPLATE, args.force)?;
    println!("Initialized checklist in {}", created.display());
    Ok(())
}
