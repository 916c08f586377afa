//! The assign-group saga across the task and group directories
//!
//! The counter update and the task persist are separate upstream calls with
//! no shared transaction. The counter goes first; if it fails nothing was
//! written. If the persist fails after the counter succeeded, the two
//! services disagree until someone reconciles them, which is logged with an
//! operation id and reported as a partial write.

use super::plan::{plan_add, plan_remove, Lineage};
use crate::clients::{GroupDirectory, TaskDirectory};
use crate::error::{common, BrainError, ErrorCode, Result};
use crate::model::{Group, GroupId, Task, TaskGroup, TaskId};
use crate::statistics::resolver::fetch_group_details;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What an assign-group call changed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentOutcome {
    pub task_id: TaskId,
    /// The task's group list after the call
    pub groups: Vec<TaskGroup>,
    /// Groups still explicitly selected
    pub clicked: Vec<TaskGroup>,
    pub added: Vec<GroupId>,
    pub removed: Vec<GroupId>,
}

pub struct AssignmentService {
    groups: Arc<dyn GroupDirectory>,
    tasks: Arc<dyn TaskDirectory>,
}

impl AssignmentService {
    pub fn new(groups: Arc<dyn GroupDirectory>, tasks: Arc<dyn TaskDirectory>) -> Self {
        Self { groups, tasks }
    }

    /// Link (`is_count_grow`) or unlink a group and keep its lineage consistent
    pub async fn assign_group(
        &self,
        task_id: &TaskId,
        group_id: &GroupId,
        is_count_grow: bool,
    ) -> Result<AssignmentOutcome> {
        let task = self.tasks.get_by_id(task_id, None).await?;
        if task.is_root() {
            return Err(common::parentless_task(task_id.as_str()));
        }
        if !is_count_grow && !task.has_group(group_id) {
            return Err(BrainError::bad_request_with_code(
                ErrorCode::BAD_REQUEST_GROUP_NOT_ASSIGNED,
                format!("Group '{}' is not assigned to task '{}'", group_id, task_id),
            ));
        }

        let (target, ancestors, descendants) = self.lineage(group_id).await?;
        let lineage = Lineage {
            target: &target,
            ancestors: &ancestors,
            descendants: &descendants,
        };

        if is_count_grow {
            self.add(task, &lineage).await
        } else {
            self.remove(task, &lineage).await
        }
    }

    /// Fetch the target, its ancestors in root-to-parent order, and its subtree
    async fn lineage(&self, group_id: &GroupId) -> Result<(Group, Vec<Group>, Vec<Group>)> {
        let (target, descendants) = tokio::try_join!(
            self.groups.get_by_id(group_id, None),
            self.groups.get_all_descendants(group_id, None),
        )?;
        let ancestors = fetch_group_details(
            self.groups.as_ref(),
            target.proper_ancestors(),
            None,
            &format!("Group {}", group_id),
        )
        .await?;
        debug!(
            "Group {} has {} ancestors and {} descendants",
            group_id,
            ancestors.len(),
            descendants.len()
        );
        Ok((target, ancestors, descendants))
    }

    async fn add(&self, mut task: Task, lineage: &Lineage<'_>) -> Result<AssignmentOutcome> {
        let plan = plan_add(&task.groups, lineage);
        if !plan.changed {
            debug!(
                "Group {} is already selected on task {}",
                lineage.target.id, task.id
            );
        } else {
            task.groups = plan.groups;
            self.commit(&mut task, &plan.added, 1).await?;
        }

        info!(
            "Assigned group {} to task {} ({} linked)",
            lineage.target.id,
            task.id,
            plan.added.len()
        );
        Ok(AssignmentOutcome {
            task_id: task.id.clone(),
            clicked: task.clicked_groups(),
            groups: task.groups,
            added: plan.added,
            removed: Vec::new(),
        })
    }

    async fn remove(&self, mut task: Task, lineage: &Lineage<'_>) -> Result<AssignmentOutcome> {
        let plan = plan_remove(&task.groups, lineage);
        let clicked = plan.clicked();
        task.groups = plan.groups;
        self.commit(&mut task, &plan.removed, -1).await?;

        info!(
            "Unassigned group {} from task {} ({} unlinked)",
            lineage.target.id,
            task.id,
            plan.removed.len()
        );
        Ok(AssignmentOutcome {
            task_id: task.id.clone(),
            groups: task.groups,
            clicked,
            added: Vec::new(),
            removed: plan.removed,
        })
    }

    /// Apply the counter delta to `changed`, then persist the task
    async fn commit(&self, task: &mut Task, changed: &[GroupId], delta: i64) -> Result<()> {
        if !changed.is_empty() {
            self.groups
                .increment_assigned_count(changed, delta)
                .await
                .map_err(|e| {
                    BrainError::internal_with_code(
                        ErrorCode::INTERNAL_COUNTER_UPDATE_FAILED,
                        format!("Failed to update assignedCount of {} group(s)", changed.len()),
                    )
                    .with_source(e)
                })?;
        }

        match self.tasks.update(task).await {
            Ok(saved) => {
                *task = saved;
                Ok(())
            }
            Err(e) if changed.is_empty() => Err(e),
            Err(e) => {
                let operation_id = Uuid::new_v4();
                error!(
                    operation_id = %operation_id,
                    task_id = %task.id,
                    delta,
                    groups = ?changed,
                    "compensation required: assignedCount was updated but the task was not saved: {}",
                    e
                );
                Err(BrainError::internal_with_code(
                    ErrorCode::INTERNAL_PERSIST_AFTER_COUNTER,
                    format!(
                        "Task '{}' could not be saved after updating group counters",
                        task.id
                    ),
                )
                .with_source(e)
                .after_partial_write())
            }
        }
    }
}
