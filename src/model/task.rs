use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Serialize, Serializer};

/// Opaque task identifier. Generated ids are UUID v4 strings; imported
/// documents may use any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, used for compact listings
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// A code snippet attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
}

/// The user-editable content of a task. `edit` replaces all of it at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskContent {
    pub text: String,
    pub code_block: Option<CodeBlock>,
    /// Formatted-text payload, stored verbatim
    pub rich_text: Option<String>,
    pub optional: Option<bool>,
}

impl TaskContent {
    pub fn text(text: impl Into<String>) -> Self {
        TaskContent {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A single checklist entry. Headlines and ordinary tasks share this shape;
/// grouping is positional and never stored on the task itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub is_headline: bool,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_block: Option<CodeBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl Task {
    /// Create a fresh, incomplete task stamped with the current time
    pub fn new(id: TaskId, content: TaskContent, is_headline: bool) -> Self {
        Task {
            id,
            text: content.text,
            completed: false,
            is_headline,
            created_at: now_millis(),
            code_block: content.code_block,
            rich_text: content.rich_text,
            optional: content.optional,
        }
    }

    /// Replace the editable content, leaving identity, state and timestamp alone
    pub fn set_content(&mut self, content: TaskContent) {
        self.text = content.text;
        self.code_block = content.code_block;
        self.rich_text = content.rich_text;
        self.optional = content.optional;
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }
}

/// Current time truncated to the millisecond precision of the wire format
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Canonical textual form of a timestamp: `2024-05-01T09:30:00.000Z`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}
