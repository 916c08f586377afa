//! Collects every group referenced in a task subtree with its instance count

use crate::clients::{GroupDirectory, TaskDirectory};
use crate::error::Result;
use crate::model::{order_by_requested, DateFilter, Group, GroupId, Task, TaskId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One entry of the associated-groups map
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedGroup {
    pub id: GroupId,
    pub instance_count: u32,
    /// `None` when the directory no longer knows the id
    pub details: Option<Group>,
}

/// Groups referenced by a task subtree, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct AssociatedGroups {
    entries: Vec<AssociatedGroup>,
    index: HashMap<GroupId, usize>,
}

impl AssociatedGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more reference to `id`
    pub fn record(&mut self, id: &GroupId) {
        match self.index.get(id) {
            Some(&i) => self.entries[i].instance_count += 1,
            None => {
                self.index.insert(id.clone(), self.entries.len());
                self.entries.push(AssociatedGroup {
                    id: id.clone(),
                    instance_count: 1,
                    details: None,
                });
            }
        }
    }

    /// Count every group linked to each task
    pub fn record_tasks<'a>(&mut self, tasks: impl IntoIterator<Item = &'a Task>) {
        for task in tasks {
            for group in &task.groups {
                self.record(&group.id);
            }
        }
    }

    pub fn ids(&self) -> Vec<GroupId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn get(&self, id: &GroupId) -> Option<&AssociatedGroup> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Attach fetched details; groups that were not requested are ignored
    pub fn attach(&mut self, groups: Vec<Group>) {
        for group in groups {
            if let Some(&i) = self.index.get(&group.id) {
                self.entries[i].details = Some(group);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssociatedGroup> {
        self.entries.iter()
    }

    /// Entries with details, skipping ids the directory did not return
    pub fn resolved(&self) -> impl Iterator<Item = (&Group, u32)> {
        self.entries
            .iter()
            .filter_map(|e| e.details.as_ref().map(|g| (g, e.instance_count)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Bulk-fetch details for `ids`, in the order the ids were given.
///
/// Ids the directory reports as missing are logged and left out.
pub async fn fetch_group_details(
    groups: &dyn GroupDirectory,
    ids: &[GroupId],
    date: Option<DateFilter>,
    context: &str,
) -> Result<Vec<Group>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let many = groups.get_many_by_ids(ids, date).await?;
    if !many.not_found.is_empty() {
        warn!(
            "{} referenced {} group(s) unknown to the group directory: {:?}",
            context,
            many.not_found.len(),
            many.not_found
        );
    }
    Ok(order_by_requested(ids, many.groups))
}

/// Build the associated-groups map of a task: its own groups plus every
/// group linked to any of its direct or indirect sub-tasks.
pub async fn resolve_associated_groups(
    tasks: &dyn TaskDirectory,
    groups: &dyn GroupDirectory,
    task_id: &TaskId,
    date: Option<DateFilter>,
) -> Result<AssociatedGroups> {
    let (task, descendants) = tokio::try_join!(
        tasks.get_by_id(task_id, date),
        tasks.get_descendants_by_depth(task_id, None, date),
    )?;

    let mut associated = AssociatedGroups::new();
    associated.record_tasks(std::iter::once(&task).chain(descendants.iter()));
    debug!(
        "Task {} subtree ({} sub-tasks) references {} distinct groups",
        task_id,
        descendants.len(),
        associated.len()
    );

    let details = fetch_group_details(
        groups,
        &associated.ids(),
        date,
        &format!("Task {}", task_id),
    )
    .await?;
    associated.attach(details);
    Ok(associated)
}
