use serde::Serialize;

use crate::model::task::Task;
use crate::parse::snapshot_parser::CodecError;

#[derive(Serialize)]
struct DocumentOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    data: &'a [Task],
}

/// Serialize a task list to the snapshot document format: two-space
/// indented JSON with a trailing newline.
pub fn serialize_snapshot(tasks: &[Task], name: Option<&str>) -> Result<String, CodecError> {
    let mut out = serde_json::to_string_pretty(&DocumentOut { name, data: tasks })?;
    out.push('\n');
    Ok(out)
}
