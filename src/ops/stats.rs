use serde::Serialize;

use crate::model::task::TaskId;
use crate::ops::store::Snapshot;

/// Completion counts over non-headline tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        self.completed == self.total
    }
}

/// Progress of one headline group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupProgress {
    pub headline: TaskId,
    #[serde(flatten)]
    pub progress: Progress,
}

/// Overall progress. Headlines are not counted.
pub fn progress(snapshot: &Snapshot) -> Progress {
    snapshot
        .tasks()
        .iter()
        .filter(|t| !t.is_headline)
        .fold(Progress::default(), |mut p, t| {
            p.total += 1;
            if t.completed {
                p.completed += 1;
            }
            p
        })
}

/// Progress per headline, in list order
pub fn group_progress(snapshot: &Snapshot) -> Vec<GroupProgress> {
    snapshot
        .hierarchy()
        .groups()
        .map(|(headline, members)| {
            let completed = members
                .iter()
                .filter(|id| snapshot.get(id.as_str()).is_some_and(|t| t.completed))
                .count();
            GroupProgress {
                headline: headline.clone(),
                progress: Progress {
                    completed,
                    total: members.len(),
                },
            }
        })
        .collect()
}
