//! Shared fixtures: a small group hierarchy and task tree over the
//! in-memory directories

#![allow(dead_code)]

use brain_service::clients::{InMemoryGroupDirectory, InMemoryTaskDirectory};
use brain_service::model::{Breakdown, Group, GroupId, Task, TaskGroup};
use std::sync::Arc;

pub const ROOT_TASK: &str = "R";
pub const TASK: &str = "T";

/// A group with its lineage, children and population filled in
pub fn group(id: &str, ancestors: &[&str], children: &[&str], people: f64) -> Group {
    let mut group = Group::new(id, id.to_uppercase());
    group.ancestors = ancestors.iter().map(|a| GroupId::from(*a)).collect();
    group.children = children.iter().map(|c| GroupId::from(*c)).collect();
    group.people_sum = people;
    group
}

/// u1 -> u2 -> g, nobody assigned yet
pub fn chain() -> Vec<Group> {
    vec![
        group("u1", &[], &["u2"], 300.0),
        group("u2", &["u1"], &["g"], 200.0),
        group("g", &["u1", "u2"], &[], 100.0),
    ]
}

/// a with two children s1 and s2
pub fn siblings() -> Vec<Group> {
    vec![
        group("a", &[], &["s1", "s2"], 40.0),
        group("s1", &["a"], &[], 20.0),
        group("s2", &["a"], &[], 20.0),
    ]
}

pub fn task(id: &str, parent: Option<&str>, groups: Vec<TaskGroup>) -> Task {
    let mut task = Task::new(id, format!("Task {}", id));
    if let Some(parent) = parent {
        task.parent = Some(parent.into());
        task.ancestors = vec![parent.into()];
    }
    task.groups = groups;
    task
}

/// Root task R with one child T that has no groups
pub fn task_tree() -> Vec<Task> {
    let mut root = task(ROOT_TASK, None, Vec::new());
    root.sub_tasks_count = 1;
    vec![root, task(TASK, Some(ROOT_TASK), Vec::new())]
}

pub fn directories(
    groups: Vec<Group>,
    tasks: Vec<Task>,
) -> (Arc<InMemoryGroupDirectory>, Arc<InMemoryTaskDirectory>) {
    (
        Arc::new(InMemoryGroupDirectory::new().with_groups(groups)),
        Arc::new(InMemoryTaskDirectory::new().with_tasks(tasks)),
    )
}

pub fn ids(groups: &[TaskGroup]) -> Vec<&str> {
    groups.iter().map(|g| g.id.as_str()).collect()
}

pub fn breakdown(pairs: &[(&str, f64)]) -> Breakdown {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}
