//! Pure planning of a task's group list when one group is toggled
//!
//! A task keeps the groups the user clicked plus, unclicked, every ancestor
//! and descendant of a clicked group. Planning never talks to the
//! directories; the workflow fetches the target's lineage and applies the
//! resulting plan.

use crate::model::{Group, GroupId, TaskGroup};
use std::collections::{HashMap, HashSet};

/// The target group with its lineage, ancestors ordered root to parent
#[derive(Debug, Clone)]
pub struct Lineage<'a> {
    pub target: &'a Group,
    pub ancestors: &'a [Group],
    pub descendants: &'a [Group],
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddPlan {
    pub groups: Vec<TaskGroup>,
    /// Ids newly linked to the task, in the order they were appended
    pub added: Vec<GroupId>,
    /// True when `groups` differs from the task's current list
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovePlan {
    pub groups: Vec<TaskGroup>,
    /// Ids unlinked from the task, in their original list order
    pub removed: Vec<GroupId>,
}

impl RemovePlan {
    /// Explicit selections that survive the removal
    pub fn clicked(&self) -> Vec<TaskGroup> {
        self.groups.iter().filter(|g| g.is_clicked).cloned().collect()
    }
}

/// Link the target as clicked, then its ancestors nearest first, then its
/// descendants; ids already on the task are left as they are.
///
/// If the target is already linked only its clicked flag is set.
pub fn plan_add(current: &[TaskGroup], lineage: &Lineage<'_>) -> AddPlan {
    let target = lineage.target;

    if current.iter().any(|g| g.id == target.id) {
        let mut changed = false;
        let groups = current
            .iter()
            .map(|g| {
                let mut g = g.clone();
                if g.id == target.id && !g.is_clicked {
                    g.is_clicked = true;
                    changed = true;
                }
                g
            })
            .collect();
        return AddPlan {
            groups,
            added: Vec::new(),
            changed,
        };
    }

    let mut present: HashSet<GroupId> = current.iter().map(|g| g.id.clone()).collect();
    let mut groups = current.to_vec();
    let mut added = Vec::new();

    let mut push = |entry: TaskGroup| {
        if present.insert(entry.id.clone()) {
            added.push(entry.id.clone());
            groups.push(entry);
        }
    };

    push(TaskGroup::clicked(target.id.clone(), target.name.clone()));
    for ancestor in lineage.ancestors.iter().rev() {
        push(TaskGroup::implied(ancestor.id.clone(), ancestor.name.clone()));
    }
    for descendant in lineage.descendants {
        push(TaskGroup::implied(descendant.id.clone(), descendant.name.clone()));
    }

    AddPlan {
        groups,
        added,
        changed: true,
    }
}

/// Decide which ancestors stay linked after the target's subtree is removed.
///
/// `ancestors` runs root to parent. A forward pass carries a retain flag
/// that the first clicked ancestor raises for everything below it. A second
/// pass, nearest ancestor first, also keeps an ancestor whose direct child is
/// still linked and not itself being dropped. Ancestors that are not linked
/// to the task are never retained.
pub fn retained_ancestors(
    ancestors: &[Group],
    kept: &HashMap<&GroupId, bool>,
) -> HashSet<GroupId> {
    let is_clicked = |id: &GroupId| kept.get(id).copied().unwrap_or(false);

    let mut retain_from_here = false;
    let forced: Vec<bool> = ancestors
        .iter()
        .map(|a| {
            if is_clicked(&a.id) {
                retain_from_here = true;
            }
            retain_from_here
        })
        .collect();

    let mut dropped: HashSet<&GroupId> = HashSet::new();
    let mut retained = HashSet::new();

    for (ancestor, forced) in ancestors.iter().zip(forced).rev() {
        if !kept.contains_key(&ancestor.id) {
            continue;
        }
        let has_kept_child = ancestor
            .children
            .iter()
            .any(|child| kept.contains_key(child) && !dropped.contains(child));

        if forced || has_kept_child {
            retained.insert(ancestor.id.clone());
        } else {
            dropped.insert(&ancestor.id);
        }
    }
    retained
}

/// Unlink the target and its descendants, then any ancestor left without a
/// reason to stay.
pub fn plan_remove(current: &[TaskGroup], lineage: &Lineage<'_>) -> RemovePlan {
    let subtree: HashSet<&GroupId> = std::iter::once(&lineage.target.id)
        .chain(lineage.descendants.iter().map(|g| &g.id))
        .collect();

    let kept: HashMap<&GroupId, bool> = current
        .iter()
        .filter(|g| !subtree.contains(&g.id))
        .map(|g| (&g.id, g.is_clicked))
        .collect();

    let ancestor_ids: HashSet<&GroupId> = lineage.ancestors.iter().map(|a| &a.id).collect();
    let retained = retained_ancestors(lineage.ancestors, &kept);

    let mut groups = Vec::new();
    let mut removed = Vec::new();
    for entry in current {
        let drop = subtree.contains(&entry.id)
            || (ancestor_ids.contains(&entry.id) && !retained.contains(&entry.id));
        if drop {
            removed.push(entry.id.clone());
        } else {
            groups.push(entry.clone());
        }
    }

    RemovePlan { groups, removed }
}
