mod init;
pub use init::cmd_init;

use std::fs;
use std::path::PathBuf;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::{LockError, WorkspaceLock};
use crate::io::remote;
use crate::io::workspace_io::{self, WORKSPACE_DIR, WorkspaceError};
use crate::model::config::{Config, ListSource};
use crate::model::task::{CodeBlock, TaskContent, TaskId};
use crate::model::workspace::Workspace;
use crate::ops::store::{InsertPosition, Snapshot, StoreError};
use crate::parse::{parse_snapshot, serialize_snapshot};

const INTRO: &[&str] = &[
    "Welcome to checklist.",
    "  Tasks added after a `ck add --headline` belong to it; `ck check-all <id>` checks the whole group.",
    "  Share lists with `ck export` and `ck import`, or load a predefined one with `ck load <name>`.",
    "  Store an API key with `ck settings --api-key <key>` to enable task suggestions.",
];

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = cli.command.unwrap_or(Commands::List);

    match command {
        // Init runs before workspace discovery
        Commands::Init(args) => cmd_init(args, cli.workspace_dir.as_deref()),
        command => {
            let ctx = Context::locate(cli.workspace_dir.as_deref(), cli.json)?;
            if let Err(e) = show_intro_once(&ctx) {
                tracing::warn!(error = %e, "could not record intro hint");
            }
            run(&ctx, command)
        }
    }
}

fn run(ctx: &Context, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init(args) => cmd_init(args, ctx.root.to_str()),

        // Read commands
        Commands::List => cmd_list(ctx),
        Commands::Show(args) => cmd_show(ctx, args),
        Commands::Export(args) => cmd_export(ctx, args),
        Commands::Sources(args) => cmd_sources(ctx, args),

        // Write commands
        Commands::Add(args) => cmd_add(ctx, args),
        Commands::Toggle(args) => cmd_toggle(ctx, args),
        Commands::CheckAll(args) => cmd_check_all(ctx, args),
        Commands::Edit(args) => cmd_edit(ctx, args),
        Commands::Rm(args) => cmd_rm(ctx, args),
        Commands::Mv(args) => cmd_mv(ctx, args),
        Commands::Reorder(args) => cmd_reorder(ctx, args),
        Commands::Import(args) => cmd_import(ctx, args),
        Commands::Load(args) => cmd_load(ctx, args),
        Commands::Clear(args) => cmd_clear(ctx, args),

        Commands::Settings(args) => cmd_settings(ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Where the current command runs
struct Context {
    root: PathBuf,
    dir: PathBuf,
    json: bool,
}

impl Context {
    fn locate(workspace_dir: Option<&str>, json: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let start = match workspace_dir {
            Some(dir) => fs::canonicalize(dir)
                .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?,
            None => std::env::current_dir()?,
        };
        let root = workspace_io::discover_workspace(&start)?;
        tracing::debug!(root = %root.display(), "found workspace");
        Ok(Context {
            dir: root.join(WORKSPACE_DIR),
            root,
            json,
        })
    }

    fn load(&self) -> Result<Workspace, WorkspaceError> {
        workspace_io::load_workspace(&self.root)
    }

    fn load_config(&self) -> Result<Config, WorkspaceError> {
        workspace_io::load_config(&self.dir)
    }

    /// Writers hold this across load, mutate and save
    fn lock(&self) -> Result<WorkspaceLock, LockError> {
        WorkspaceLock::acquire_default(&self.dir)
    }
}

/// Print the intro hint the first time a workspace without an API key is
/// used, then record that it was shown.
fn show_intro_once(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.load_config()?;
    if config.ui.has_seen_intro || config.settings.has_api_key() {
        return Ok(());
    }
    for line in INTRO {
        eprintln!("{}", line);
    }

    let _lock = ctx.lock()?;
    let (_, mut doc) = config_io::read_config(&ctx.dir)?;
    config_io::mark_intro_seen(&mut doc);
    config_io::write_config(&ctx.dir, &doc)?;
    Ok(())
}

/// Match a task id or unique id prefix. `Ok(None)` when nothing matches.
fn match_id(snapshot: &Snapshot, input: &str) -> Result<Option<TaskId>, String> {
    if let Some(task) = snapshot.get(input) {
        return Ok(Some(task.id.clone()));
    }
    if input.is_empty() {
        return Ok(None);
    }
    let matches: Vec<&TaskId> = snapshot
        .ids()
        .filter(|id| id.as_str().starts_with(input))
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some((*one).clone())),
        many => Err(format!(
            "ambiguous task id '{}' matches {} tasks",
            input,
            many.len()
        )),
    }
}

fn resolve_id(snapshot: &Snapshot, input: &str) -> Result<TaskId, Box<dyn std::error::Error>> {
    match match_id(snapshot, input)? {
        Some(id) => Ok(id),
        None => Err(StoreError::NotFound(input.to_string()).into()),
    }
}

/// Build task content from the command line. Code files are read here, before
/// the workspace is locked.
fn build_content(
    text: String,
    args: ContentArgs,
) -> Result<TaskContent, Box<dyn std::error::Error>> {
    let code_block = match args.lang {
        Some(language) => {
            let code = match (args.code, args.code_file) {
                (Some(code), _) => code,
                (None, Some(path)) => fs::read_to_string(&path)
                    .map_err(|e| format!("could not read {}: {}", path.display(), e))?,
                (None, None) => return Err("--lang needs --code or --code-file".into()),
            };
            Some(CodeBlock { language, code })
        }
        None => None,
    };

    Ok(TaskContent {
        text,
        code_block,
        rich_text: args.rich_text,
        optional: args.optional.then_some(true),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let ws = ctx.load()?;
    let snapshot = ws.store.snapshot();

    if ctx.json {
        print_json(&list_to_json(&snapshot, ws.list_name.as_deref()))
    } else {
        for line in format_list(&snapshot, ws.list_name.as_deref()) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_show(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let ws = ctx.load()?;
    let snapshot = ws.store.snapshot();
    let id = resolve_id(&snapshot, &args.id)?;
    let task = snapshot
        .get(id.as_str())
        .ok_or_else(|| StoreError::NotFound(args.id.clone()))?;

    if ctx.json {
        print_json(&task_to_json(&snapshot, task))
    } else {
        for line in format_task_detail(&snapshot, task) {
            println!("{}", line);
        }
        Ok(())
    }
}

fn cmd_export(ctx: &Context, args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let ws = ctx.load()?;
    let document = serialize_snapshot(ws.store.tasks(), ws.list_name.as_deref())?;

    match args.output {
        Some(path) => {
            workspace_io::atomic_write(&path, document.as_bytes())
                .map_err(|e| format!("could not write {}: {}", path.display(), e))?;
            println!(
                "Exported {} tasks to {}",
                ws.store.tasks().len(),
                path.display()
            );
        }
        None => print!("{}", document),
    }
    Ok(())
}

fn cmd_sources(ctx: &Context, args: SourcesCmd) -> Result<(), Box<dyn std::error::Error>> {
    match args.action.unwrap_or(SourcesAction::List) {
        SourcesAction::List => cmd_sources_probe(ctx),
        SourcesAction::Add(args) => cmd_sources_add(ctx, args),
        SourcesAction::Rm(args) => cmd_sources_rm(ctx, args),
    }
}

/// Fetch every configured source concurrently and report each one. A
/// failing source is reported, never fatal.
fn cmd_sources_probe(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.load_config()?;
    if config.sources.is_empty() {
        if ctx.json {
            return print_json(&Vec::<SourceStatusJson>::new());
        }
        println!("No sources configured. Add one with `ck sources add <name> <url>`.");
        return Ok(());
    }

    let outcomes = remote::fetch_all_blocking(&config.remote, &config.sources)?;
    if ctx.json {
        let statuses: Vec<SourceStatusJson> = outcomes.iter().map(outcome_to_json).collect();
        print_json(&statuses)
    } else {
        for outcome in &outcomes {
            println!("{}", format_source_status(outcome));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = build_content(args.text, args.content)?;
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;

    let id = ws.store.add(content, args.headline);
    workspace_io::save_tasks(&ws)?;
    println!("{}", id);
    Ok(())
}

fn cmd_toggle(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let id = resolve_id(&ws.store.snapshot(), &args.id)?;

    ws.store.toggle(id.as_str())?;
    workspace_io::save_tasks(&ws)?;

    if let Some(task) = ws.store.snapshot().get(id.as_str()) {
        println!("{}", format_task_line(task, None));
    }
    Ok(())
}

fn cmd_check_all(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let id = resolve_id(&ws.store.snapshot(), &args.id)?;

    let completed = ws.store.check_all_subtasks(id.as_str())?;
    workspace_io::save_tasks(&ws)?;

    let snapshot = ws.store.snapshot();
    let members = snapshot
        .hierarchy()
        .members_of(id.as_str())
        .map_or(0, |m| m.len());
    let text = snapshot.get(id.as_str()).map_or("", |t| t.text.as_str());
    println!(
        "{} '{}' and {} task{}",
        if completed { "Checked" } else { "Unchecked" },
        text,
        members,
        if members == 1 { "" } else { "s" }
    );
    Ok(())
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let content = build_content(args.text, args.content)?;
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let id = resolve_id(&ws.store.snapshot(), &args.id)?;

    ws.store.edit(id.as_str(), content)?;
    workspace_io::save_tasks(&ws)?;
    println!("Updated {}", id.short());
    Ok(())
}

fn cmd_rm(ctx: &Context, args: IdArg) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let id = resolve_id(&ws.store.snapshot(), &args.id)?;

    let removed = ws.store.delete(id.as_str())?;
    workspace_io::save_tasks(&ws)?;
    println!("Deleted {} {}", removed.id.short(), removed.text);
    Ok(())
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let snapshot = ws.store.snapshot();
    let id = resolve_id(&snapshot, &args.id)?;

    let target = args.target;
    let position = if target.top {
        InsertPosition::Top
    } else if target.bottom {
        InsertPosition::Bottom
    } else if let Some(after) = target.after {
        InsertPosition::After(resolve_id(&snapshot, &after)?)
    } else if let Some(before) = target.before {
        InsertPosition::Before(resolve_id(&snapshot, &before)?)
    } else {
        return Err("choose one of --top, --bottom, --after or --before".into());
    };

    ws.store.move_task(id.as_str(), &position)?;
    workspace_io::save_tasks(&ws)?;
    println!("Moved {}", id.short());
    Ok(())
}

/// Unknown ids are passed through so the store reports the whole
/// permutation problem at once.
fn cmd_reorder(ctx: &Context, args: ReorderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let snapshot = ws.store.snapshot();

    let mut order = Vec::with_capacity(args.ids.len());
    for raw in &args.ids {
        order.push(match_id(&snapshot, raw)?.unwrap_or_else(|| TaskId::from(raw.as_str())));
    }

    ws.store.reorder(&order)?;
    workspace_io::save_tasks(&ws)?;
    println!("Reordered {} tasks", order.len());
    Ok(())
}

fn cmd_import(ctx: &Context, args: ImportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    let doc = parse_snapshot(&text)
        .map_err(|e| format!("invalid task list {}: {}", args.file.display(), e))?;

    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let count = doc.tasks.len();
    ws.store.replace(doc.tasks)?;
    ws.list_name = doc.name;
    workspace_io::save_tasks(&ws)?;

    tracing::info!(tasks = count, file = %args.file.display(), "imported task list");
    println!("Imported {} tasks", count);
    Ok(())
}

/// Fetch happens before the lock is taken; only the replace is serialized.
fn cmd_load(ctx: &Context, args: LoadArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = ctx.load_config()?;
    let source = config
        .sources
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(&args.name))
        .ok_or_else(|| format!("no source named '{}' (see `ck sources`)", args.name))?;

    let list = remote::fetch_list_blocking(&config.remote, source)?;

    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let count = list.tasks.len();
    ws.store.replace(list.tasks)?;
    ws.list_name = Some(list.name.clone());
    workspace_io::save_tasks(&ws)?;

    tracing::info!(tasks = count, source = %source.name, "loaded predefined list");
    println!("Loaded '{}' ({} tasks)", list.name, count);
    Ok(())
}

fn cmd_clear(ctx: &Context, args: ClearArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let mut ws = ctx.load()?;
    let count = ws.store.tasks().len();
    if !args.yes {
        return Err(format!("refusing to remove {} tasks without --yes", count).into());
    }

    ws.store.clear();
    ws.list_name = None;
    workspace_io::save_tasks(&ws)?;
    println!("Removed {} tasks", count);
    Ok(())
}

// ---------------------------------------------------------------------------
// Configuration commands
// ---------------------------------------------------------------------------

fn cmd_sources_add(ctx: &Context, args: SourcesAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let (config, mut doc) = config_io::read_config(&ctx.dir)?;
    if config
        .sources
        .iter()
        .any(|s| s.name.eq_ignore_ascii_case(&args.name))
    {
        return Err(format!("source '{}' already exists", args.name).into());
    }

    config_io::add_source(
        &mut doc,
        &ListSource {
            name: args.name.clone(),
            url: args.url,
        },
    );
    config_io::write_config(&ctx.dir, &doc)?;
    println!("Added source '{}'", args.name);
    Ok(())
}

fn cmd_sources_rm(ctx: &Context, args: SourcesRmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let _lock = ctx.lock()?;
    let (_, mut doc) = config_io::read_config(&ctx.dir)?;
    if !config_io::remove_source(&mut doc, &args.name) {
        return Err(format!("no source named '{}'", args.name).into());
    }
    config_io::write_config(&ctx.dir, &doc)?;
    println!("Removed source '{}'", args.name);
    Ok(())
}

fn cmd_settings(ctx: &Context, args: SettingsArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.is_empty() {
        let config = ctx.load_config()?;
        if ctx.json {
            return print_json(&settings_to_json(&config.settings));
        }
        for line in format_settings(&config.settings) {
            println!("{}", line);
        }
        return Ok(());
    }

    let _lock = ctx.lock()?;
    let (_, mut doc) = config_io::read_config(&ctx.dir)?;
    if let Some(key) = &args.api_key {
        config_io::set_api_key(&mut doc, Some(key));
    }
    if args.clear_api_key {
        config_io::set_api_key(&mut doc, None);
    }
    if let Some(service) = &args.service {
        config_io::set_setting(&mut doc, "service", service);
    }
    if let Some(model) = &args.model {
        config_io::set_setting(&mut doc, "model", model);
    }
    config_io::write_config(&ctx.dir, &doc)?;
    println!("Settings updated");
    Ok(())
}
