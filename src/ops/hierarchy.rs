//! Positional grouping: every non-headline task belongs to the nearest
//! headline above it, or to no group at all when none precedes it.

use indexmap::IndexMap;

use crate::model::task::{Task, TaskId};

/// The group a non-headline task falls under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Headline(TaskId),
    Ungrouped,
}

impl Owner {
    pub fn headline(&self) -> Option<&TaskId> {
        match self {
            Owner::Headline(id) => Some(id),
            Owner::Ungrouped => None,
        }
    }
}

/// Derived grouping index for one task sequence.
///
/// Both maps preserve sequence order. `groups` has an entry for every
/// headline, including headlines that own nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    owners: IndexMap<TaskId, Owner>,
    groups: IndexMap<TaskId, Vec<TaskId>>,
}

/// Resolve the owner of every non-headline task in a single forward pass.
pub fn resolve(tasks: &[Task]) -> Hierarchy {
    let mut owners = IndexMap::with_capacity(tasks.len());
    let mut groups: IndexMap<TaskId, Vec<TaskId>> = IndexMap::new();
    let mut current = Owner::Ungrouped;

    for task in tasks {
        if task.is_headline {
            groups.insert(task.id.clone(), Vec::new());
            current = Owner::Headline(task.id.clone());
            continue;
        }
        if let Owner::Headline(headline) = &current
            && let Some(members) = groups.get_mut(headline)
        {
            members.push(task.id.clone());
        }
        owners.insert(task.id.clone(), current.clone());
    }

    Hierarchy { owners, groups }
}

impl Hierarchy {
    /// Owner of a non-headline task. `None` for headlines and unknown ids.
    pub fn owner_of(&self, id: &str) -> Option<&Owner> {
        self.owners.get(id)
    }

    /// Tasks owned by a headline, in sequence order. `None` if `headline`
    /// does not name a headline.
    pub fn members_of(&self, headline: &str) -> Option<&[TaskId]> {
        self.groups.get(headline).map(|m| m.as_slice())
    }

    pub fn is_headline(&self, id: &str) -> bool {
        self.groups.contains_key(id)
    }

    /// Non-headline tasks with no preceding headline
    pub fn ungrouped(&self) -> impl Iterator<Item = &TaskId> {
        self.owners
            .iter()
            .filter(|(_, owner)| **owner == Owner::Ungrouped)
            .map(|(id, _)| id)
    }

    /// Every non-headline task with its owner, in sequence order
    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &Owner)> {
        self.owners.iter()
    }

    /// Headlines with their members, in sequence order
    pub fn groups(&self) -> impl Iterator<Item = (&TaskId, &[TaskId])> {
        self.groups.iter().map(|(h, m)| (h, m.as_slice()))
    }

    pub fn has_headlines(&self) -> bool {
        !self.groups.is_empty()
    }
}
