use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::model::task::{Task, TaskContent, TaskId};
use crate::ops::cascade;
use crate::ops::hierarchy::{self, Hierarchy};

/// Error type for store operations. A failed operation never changes the
/// committed snapshot.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("not a headline: {0}")]
    NotAHeadline(String),
    #[error("duplicate task id: {0}")]
    DuplicateId(String),
    #[error(
        "new order is not a permutation of the current list ({})",
        describe_permutation(.missing, .unexpected, .duplicated)
    )]
    Permutation {
        missing: Vec<TaskId>,
        unexpected: Vec<TaskId>,
        duplicated: Vec<TaskId>,
    },
}

fn describe_permutation(missing: &[TaskId], unexpected: &[TaskId], duplicated: &[TaskId]) -> String {
    let mut parts = Vec::new();
    for (label, ids) in [
        ("missing", missing),
        ("unknown", unexpected),
        ("duplicated", duplicated),
    ] {
        if !ids.is_empty() {
            let joined: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
            parts.push(format!("{}: {}", label, joined.join(", ")));
        }
    }
    parts.join("; ")
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One committed task list with its derived indexes. Cloning is cheap and a
/// clone never observes later commits.
#[derive(Debug, Clone)]
pub struct Snapshot {
    tasks: Arc<[Task]>,
    positions: Arc<HashMap<TaskId, usize>>,
    hierarchy: Arc<Hierarchy>,
}

impl Snapshot {
    /// Build a snapshot. Callers guarantee ids are unique.
    fn build(tasks: Vec<Task>) -> Self {
        let hierarchy = hierarchy::resolve(&tasks);
        let positions = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Snapshot {
            tasks: tasks.into(),
            positions: Arc::new(positions),
            hierarchy: Arc::new(hierarchy),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.position(id).map(|i| &self.tasks[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &TaskId> {
        self.tasks.iter().map(|t| &t.id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot::build(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

/// Source of candidate ids for new tasks
pub trait IdSource {
    fn next_id(&mut self) -> TaskId;
}

/// Random UUID v4 ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_id(&mut self) -> TaskId {
        TaskId::new(Uuid::new_v4().to_string())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Where to place a task when moving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPosition {
    Top,
    Bottom,
    After(TaskId),
    Before(TaskId),
}

/// Owner of the canonical task list.
///
/// Every mutation builds a complete replacement list and commits it in one
/// swap, so a failing operation leaves the previous snapshot in place.
pub struct TaskStore {
    snapshot: Snapshot,
    /// Every id held during this session, including deleted ones
    issued: HashSet<TaskId>,
    ids: Box<dyn IdSource>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_id_source(UuidSource)
    }

    pub fn with_id_source(ids: impl IdSource + 'static) -> Self {
        TaskStore {
            snapshot: Snapshot::default(),
            issued: HashSet::new(),
            ids: Box::new(ids),
        }
    }

    /// Start a store from an already-validated list
    pub fn from_tasks(tasks: Vec<Task>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        store.replace(tasks)?;
        Ok(store)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    pub fn tasks(&self) -> &[Task] {
        self.snapshot.tasks()
    }

    /// Append a new task at the tail. Returns its id.
    pub fn add(&mut self, content: TaskContent, is_headline: bool) -> TaskId {
        let id = self.fresh_id();
        let mut tasks = self.snapshot.tasks().to_vec();
        tasks.push(Task::new(id.clone(), content, is_headline));
        self.commit(tasks);
        id
    }

    /// Flip `completed` on one task. Returns the new value.
    pub fn toggle(&mut self, id: &str) -> Result<bool, StoreError> {
        let idx = self.require(id)?;
        let mut tasks = self.snapshot.tasks().to_vec();
        tasks[idx].completed = !tasks[idx].completed;
        let completed = tasks[idx].completed;
        self.commit(tasks);
        Ok(completed)
    }

    /// Remove one task. Tasks that followed a deleted headline stay where
    /// they are and fall under whatever headline now precedes them.
    pub fn delete(&mut self, id: &str) -> Result<Task, StoreError> {
        let idx = self.require(id)?;
        let mut tasks = self.snapshot.tasks().to_vec();
        let removed = tasks.remove(idx);
        self.commit(tasks);
        Ok(removed)
    }

    /// Replace a task's content; id, state, kind and timestamp are kept.
    pub fn edit(&mut self, id: &str, content: TaskContent) -> Result<(), StoreError> {
        let idx = self.require(id)?;
        let mut tasks = self.snapshot.tasks().to_vec();
        tasks[idx].set_content(content);
        self.commit(tasks);
        Ok(())
    }

    /// Replace the order. `order` must hold exactly the current ids.
    pub fn reorder(&mut self, order: &[TaskId]) -> Result<(), StoreError> {
        check_permutation(self.snapshot.tasks(), order)?;
        let tasks = order
            .iter()
            .filter_map(|id| self.snapshot.get(id.as_str()).cloned())
            .collect();
        self.commit(tasks);
        Ok(())
    }

    /// Move a single task, expressed as a full reorder
    pub fn move_task(&mut self, id: &str, position: &InsertPosition) -> Result<(), StoreError> {
        self.require(id)?;
        let mut order: Vec<TaskId> = self
            .snapshot
            .ids()
            .filter(|t| t.as_str() != id)
            .cloned()
            .collect();
        let moving = TaskId::from(id);

        let idx = match position {
            InsertPosition::Top => 0,
            InsertPosition::Bottom => order.len(),
            InsertPosition::After(target) | InsertPosition::Before(target) => {
                if target.as_str() == id {
                    return Ok(());
                }
                let at = order
                    .iter()
                    .position(|t| t == target)
                    .ok_or_else(|| StoreError::NotFound(target.to_string()))?;
                if matches!(position, InsertPosition::After(_)) {
                    at + 1
                } else {
                    at
                }
            }
        };
        order.insert(idx, moving);
        self.reorder(&order)
    }

    /// Cascade toggle on a headline group. Returns the completion value
    /// written to the group.
    pub fn check_all_subtasks(&mut self, headline: &str) -> Result<bool, StoreError> {
        let plan = cascade::plan(&self.snapshot, headline)?;
        let tasks = plan.apply(self.snapshot.tasks());
        self.commit(tasks);
        Ok(plan.completed)
    }

    /// Replace the whole list, as on import
    pub fn replace(&mut self, tasks: Vec<Task>) -> Result<(), StoreError> {
        let mut seen = HashSet::with_capacity(tasks.len());
        for task in &tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(StoreError::DuplicateId(task.id.to_string()));
            }
        }
        self.issued.extend(tasks.iter().map(|t| t.id.clone()));
        self.commit(tasks);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.commit(Vec::new());
    }

    fn require(&self, id: &str) -> Result<usize, StoreError> {
        self.snapshot
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn fresh_id(&mut self) -> TaskId {
        loop {
            let id = self.ids.next_id();
            if !id.as_str().is_empty() && self.issued.insert(id.clone()) {
                return id;
            }
            tracing::debug!(%id, "discarding reused task id");
        }
    }

    fn commit(&mut self, tasks: Vec<Task>) {
        tracing::debug!(tasks = tasks.len(), "committing snapshot");
        self.snapshot = Snapshot::build(tasks);
    }
}

/// Check that `order` is a permutation of the ids in `current`.
fn check_permutation(current: &[Task], order: &[TaskId]) -> Result<(), StoreError> {
    let existing: HashSet<&str> = current.iter().map(|t| t.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::with_capacity(order.len());
    let mut unexpected = Vec::new();
    let mut duplicated = Vec::new();

    for id in order {
        if !existing.contains(id.as_str()) {
            if !unexpected.contains(id) {
                unexpected.push(id.clone());
            }
        } else if !seen.insert(id.as_str()) && !duplicated.contains(id) {
            duplicated.push(id.clone());
        }
    }

    let missing: Vec<TaskId> = current
        .iter()
        .filter(|t| !seen.contains(t.id.as_str()))
        .map(|t| t.id.clone())
        .collect();

    if missing.is_empty() && unexpected.is_empty() && duplicated.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Permutation {
            missing,
            unexpected,
            duplicated,
        })
    }
}
