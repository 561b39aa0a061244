use std::fs;
use std::path::Path;

use crate::io::workspace_io::{CONFIG_FILE, WorkspaceError, atomic_write};
use crate::model::config::{Config, ListSource};

/// Read the config, returning both the parsed config and the raw toml_edit
/// document for format-preserving edits.
pub fn read_config(dir: &Path) -> Result<(Config, toml_edit::DocumentMut), WorkspaceError> {
    let config_path = dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: Config = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = dir.join(CONFIG_FILE);
    atomic_write(&config_path, doc.to_string().as_bytes()).map_err(|e| {
        WorkspaceError::WriteError {
            path: config_path,
            source: e,
        }
    })
}

fn ensure_table(doc: &mut toml_edit::DocumentMut, name: &str) {
    if !doc.contains_key(name) {
        doc[name] = toml_edit::Item::Table(toml_edit::Table::new());
    }
}

/// Set or clear the API key in `[settings]`
pub fn set_api_key(doc: &mut toml_edit::DocumentMut, key: Option<&str>) {
    ensure_table(doc, "settings");
    match key {
        Some(key) => doc["settings"]["api_key"] = toml_edit::value(key),
        None => {
            if let Some(settings) = doc["settings"].as_table_mut() {
                settings.remove("api_key");
            }
        }
    }
}

/// Set a plain string value in `[settings]` (service, model)
pub fn set_setting(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) {
    ensure_table(doc, "settings");
    doc["settings"][key] = toml_edit::value(value);
}

/// Record that the intro hint has been shown
pub fn mark_intro_seen(doc: &mut toml_edit::DocumentMut) {
    ensure_table(doc, "ui");
    doc["ui"]["has_seen_intro"] = toml_edit::value(true);
}

/// Append a `[[sources]]` entry
pub fn add_source(doc: &mut toml_edit::DocumentMut, source: &ListSource) {
    if !doc.contains_key("sources") {
        doc["sources"] = toml_edit::Item::ArrayOfTables(toml_edit::ArrayOfTables::new());
    }

    if let Some(sources) = doc["sources"].as_array_of_tables_mut() {
        let mut table = toml_edit::Table::new();
        table["name"] = toml_edit::value(source.name.as_str());
        table["url"] = toml_edit::value(source.url.as_str());
        sources.push(table);
    }
}

/// Remove every `[[sources]]` entry with the given name. Returns whether
/// anything was removed.
pub fn remove_source(doc: &mut toml_edit::DocumentMut, name: &str) -> bool {
    let Some(sources) = doc
        .get_mut("sources")
        .and_then(|item| item.as_array_of_tables_mut())
    else {
        return false;
    };
    let before = sources.len();
    sources.retain(|table| table.get("name").and_then(|v| v.as_str()) != Some(name));
    sources.len() != before
}
