use serde::Serialize;

use crate::io::remote::FetchOutcome;
use crate::model::config::Settings;
use crate::model::task::{Task, TaskId, format_timestamp};
use crate::ops::hierarchy::Owner;
use crate::ops::stats::{self, GroupProgress, Progress};
use crate::ops::store::Snapshot;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    /// Owning headline; absent for headlines and ungrouped tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<&'a TaskId>,
}

#[derive(Serialize)]
pub struct ListJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub tasks: Vec<TaskJson<'a>>,
    pub progress: Progress,
    pub groups: Vec<GroupProgress>,
}

#[derive(Serialize)]
pub struct SourceStatusJson {
    pub name: String,
    pub url: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct SettingsJson<'a> {
    pub service: &'a str,
    pub model: &'a str,
    pub api_key_set: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json<'a>(snapshot: &'a Snapshot, task: &'a Task) -> TaskJson<'a> {
    TaskJson {
        task,
        headline: snapshot
            .hierarchy()
            .owner_of(task.id.as_str())
            .and_then(Owner::headline),
    }
}

pub fn list_to_json<'a>(snapshot: &'a Snapshot, name: Option<&'a str>) -> ListJson<'a> {
    ListJson {
        name,
        tasks: snapshot
            .tasks()
            .iter()
            .map(|t| task_to_json(snapshot, t))
            .collect(),
        progress: stats::progress(snapshot),
        groups: stats::group_progress(snapshot),
    }
}

pub fn outcome_to_json(outcome: &FetchOutcome) -> SourceStatusJson {
    let (list_name, tasks, error) = match &outcome.result {
        Ok(list) => (Some(list.name.clone()), Some(list.tasks.len()), None),
        Err(e) => (None, None, Some(e.to_string())),
    };
    SourceStatusJson {
        name: outcome.source.name.clone(),
        url: outcome.source.url.clone(),
        ok: outcome.result.is_ok(),
        list_name,
        tasks,
        error,
    }
}

pub fn settings_to_json(settings: &Settings) -> SettingsJson<'_> {
    SettingsJson {
        service: &settings.service,
        model: &settings.model,
        api_key_set: settings.has_api_key(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn checkbox(task: &Task) -> &'static str {
    if task.completed { "[x]" } else { "[ ]" }
}

/// Format a single task as a one-line summary. Headlines carry their group's
/// progress when it is known.
pub fn format_task_line(task: &Task, group: Option<&Progress>) -> String {
    let mut line = if task.is_headline {
        format!("{} {}  ## {}", checkbox(task), task.id.short(), task.text)
    } else {
        format!("{} {}  {}", checkbox(task), task.id.short(), task.text)
    };
    if let Some(p) = group {
        line.push_str(&format!(" ({}/{})", p.completed, p.total));
    }
    if task.is_optional() {
        line.push_str(" (optional)");
    }
    if let Some(block) = &task.code_block {
        line.push_str(&format!(" <{}>", block.language));
    }
    if task.rich_text.is_some() {
        line.push_str(" +notes");
    }
    line
}

/// Format the whole list. Tasks under a headline are indented once any
/// headline exists; ungrouped tasks stay flush left.
pub fn format_list(snapshot: &Snapshot, name: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(name) = name {
        lines.push(format!("== {} ==", name));
    }
    if snapshot.is_empty() {
        lines.push("No tasks. Add one with `ck add <text>`.".to_string());
        return lines;
    }

    let hierarchy = snapshot.hierarchy();
    let groups = stats::group_progress(snapshot);
    for task in snapshot.tasks() {
        if task.is_headline {
            let progress = groups
                .iter()
                .find(|g| g.headline == task.id)
                .map(|g| &g.progress);
            lines.push(format_task_line(task, progress));
            continue;
        }
        let grouped = hierarchy
            .owner_of(task.id.as_str())
            .is_some_and(|o| o.headline().is_some());
        let indent = if grouped { "    " } else { "" };
        lines.push(format!("{}{}", indent, format_task_line(task, None)));
    }

    lines.push(String::new());
    lines.push(format_progress(&stats::progress(snapshot)));
    lines
}

/// "N of M tasks completed"; headlines are not counted
pub fn format_progress(progress: &Progress) -> String {
    format!(
        "{} of {} tasks completed",
        progress.completed, progress.total
    )
}

/// Format detailed task view
pub fn format_task_detail(snapshot: &Snapshot, task: &Task) -> Vec<String> {
    let mut lines = vec![format!("{} {}", checkbox(task), task.text)];
    lines.push(format!("id: {}", task.id));
    lines.push(format!("created: {}", format_timestamp(&task.created_at)));

    if task.is_headline {
        let members = snapshot
            .hierarchy()
            .members_of(task.id.as_str())
            .unwrap_or(&[]);
        let done = members
            .iter()
            .filter(|id| snapshot.get(id.as_str()).is_some_and(|t| t.completed))
            .count();
        lines.push(format!("headline: {} of {} tasks completed", done, members.len()));
    } else {
        match snapshot
            .hierarchy()
            .owner_of(task.id.as_str())
            .and_then(Owner::headline)
            .and_then(|h| snapshot.get(h.as_str()))
        {
            Some(headline) => {
                lines.push(format!("under: {} {}", headline.id.short(), headline.text))
            }
            None => lines.push("under: (ungrouped)".to_string()),
        }
    }

    if task.is_optional() {
        lines.push("optional: yes".to_string());
    }
    if let Some(block) = &task.code_block {
        lines.push(format!("code ({}):", block.language));
        for line in block.code.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if let Some(rich) = &task.rich_text {
        lines.push("notes:".to_string());
        for line in rich.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// One status line per fetched source
pub fn format_source_status(outcome: &FetchOutcome) -> String {
    match &outcome.result {
        Ok(list) if list.name == outcome.source.name => {
            format!("ok     {}  ({} tasks)", outcome.source.name, list.tasks.len())
        }
        Ok(list) => format!(
            "ok     {}  \"{}\" ({} tasks)",
            outcome.source.name,
            list.name,
            list.tasks.len()
        ),
        Err(e) => format!("error  {}  {}", outcome.source.name, e),
    }
}

pub fn format_settings(settings: &Settings) -> Vec<String> {
    vec![
        format!("service: {}", settings.service),
        format!("model: {}", settings.model),
        format!(
            "api key: {}",
            if settings.has_api_key() { "set" } else { "not set" }
        ),
    ]
}
