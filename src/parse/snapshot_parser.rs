use std::collections::HashSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::{Map, Value};

use crate::model::task::{CodeBlock, Task, TaskId};

/// Error type for snapshot documents. Parsing is all-or-nothing: any error
/// means no task from the document is returned.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("invalid document: {0}")]
    Shape(String),
    #[error("invalid task at index {index}: `{field}` {reason}")]
    Validation {
        index: usize,
        field: &'static str,
        reason: String,
    },
    #[error("duplicate task id at index {index}: {id}")]
    DuplicateId { index: usize, id: String },
}

/// A parsed snapshot document: `{ "name"?: string, "data": Task[] }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDocument {
    /// Display name carried by predefined lists
    pub name: Option<String>,
    pub tasks: Vec<Task>,
}

/// Parse and validate a snapshot document from JSON text.
pub fn parse_snapshot(text: &str) -> Result<SnapshotDocument, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    parse_document(value)
}

/// Validate an already-decoded JSON value as a snapshot document.
pub fn parse_document(value: Value) -> Result<SnapshotDocument, CodecError> {
    let Value::Object(mut root) = value else {
        return Err(CodecError::Shape("expected a top-level object".into()));
    };

    let name = match root.remove("name") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => return Err(CodecError::Shape("`name` must be a string".into())),
    };

    let items = match root.remove("data") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CodecError::Shape("`data` must be an array".into())),
        None => return Err(CodecError::Shape("missing `data` field".into())),
    };

    let mut tasks = Vec::with_capacity(items.len());
    let mut seen = HashSet::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let task = parse_task(index, item)?;
        if !seen.insert(task.id.clone()) {
            return Err(CodecError::DuplicateId {
                index,
                id: task.id.to_string(),
            });
        }
        tasks.push(task);
    }

    Ok(SnapshotDocument { name, tasks })
}

fn parse_task(index: usize, value: Value) -> Result<Task, CodecError> {
    let Value::Object(obj) = value else {
        return Err(invalid(index, "data[]", "must be an object"));
    };

    let id = required_str(&obj, index, "id")?;
    if id.is_empty() {
        return Err(invalid(index, "id", "must not be empty"));
    }
    let text = required_str(&obj, index, "text")?;
    let completed = required_bool(&obj, index, "completed")?;
    let is_headline = required_bool(&obj, index, "isHeadline")?;
    let created_at = parse_timestamp(&required_str(&obj, index, "createdAt")?)
        .map_err(|reason| invalid(index, "createdAt", &reason))?;

    let code_block = match obj.get("codeBlock") {
        None | Some(Value::Null) => None,
        Some(Value::Object(block)) => Some(CodeBlock {
            language: required_str(block, index, "codeBlock.language")?,
            code: required_str(block, index, "codeBlock.code")?,
        }),
        Some(_) => return Err(invalid(index, "codeBlock", "must be an object")),
    };

    let rich_text = match obj.get("richText") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(invalid(index, "richText", "must be a string")),
    };

    let optional = match obj.get("optional") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => return Err(invalid(index, "optional", "must be a boolean")),
    };

    Ok(Task {
        id: TaskId::new(id),
        text,
        completed,
        is_headline,
        created_at,
        code_block,
        rich_text,
        optional,
    })
}

/// Parse the textual timestamp form, keeping the precision the format carries
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|e| format!("is not an RFC 3339 timestamp ({}): {:?}", e, text))
}

fn required_str(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, CodecError> {
    let key = field.rsplit('.').next().unwrap_or(field);
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(invalid(index, field, "must be a string")),
        None => Err(invalid(index, field, "is missing")),
    }
}

fn required_bool(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<bool, CodecError> {
    match obj.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(invalid(index, field, "must be a boolean")),
        None => Err(invalid(index, field, "is missing")),
    }
}

fn invalid(index: usize, field: &'static str, reason: &str) -> CodecError {
    CodecError::Validation {
        index,
        field,
        reason: reason.to_string(),
    }
}
