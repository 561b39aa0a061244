//! Group-wide completion flip for a headline and the tasks it owns.

use std::collections::HashSet;

use crate::model::task::{Task, TaskId};
use crate::ops::store::{Snapshot, StoreError};

/// The result of planning a cascade toggle against one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadePlan {
    pub headline: TaskId,
    /// Value written to the headline and every member
    pub completed: bool,
    /// The headline plus its members
    pub targets: HashSet<TaskId>,
}

/// Plan a cascade toggle.
///
/// If every owned task is complete (vacuously so for an empty group) the
/// group is marked incomplete, otherwise the whole group is marked complete.
pub fn plan(snapshot: &Snapshot, headline: &str) -> Result<CascadePlan, StoreError> {
    let members = match snapshot.hierarchy().members_of(headline) {
        Some(members) => members,
        None if snapshot.contains(headline) => {
            return Err(StoreError::NotAHeadline(headline.to_string()));
        }
        None => return Err(StoreError::NotFound(headline.to_string())),
    };

    let all_done = members
        .iter()
        .all(|id| snapshot.get(id.as_str()).is_some_and(|t| t.completed));

    let headline = TaskId::from(headline);
    let mut targets: HashSet<TaskId> = members.iter().cloned().collect();
    targets.insert(headline.clone());

    Ok(CascadePlan {
        headline,
        completed: !all_done,
        targets,
    })
}

impl CascadePlan {
    /// Produce the updated list; tasks outside the group are copied as-is.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                if self.targets.contains(&task.id) {
                    task.completed = self.completed;
                }
                task
            })
            .collect()
    }
}
