//! In-process directories for tests and local runs
//!
//! Both fakes keep a live data set plus optional monthly snapshots, record
//! every mutation, and can be switched into failing mode to exercise the
//! error paths of the assignment saga.

use super::{GroupDirectory, TaskDirectory};
use crate::error::{common, BrainError, ErrorCode, Result};
use crate::model::{
    DateFilter, Group, GroupId, ManyGroups, NewTask, Task, TaskId, UnitOption, UnitSums,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tokio::sync::Mutex;

/// A recorded `increment_assigned_count` call
#[derive(Debug, Clone, PartialEq)]
pub struct CounterCall {
    pub ids: Vec<GroupId>,
    pub delta: i64,
}

#[derive(Debug, Default)]
struct GroupState {
    live: Vec<Group>,
    snapshots: BTreeMap<DateFilter, Vec<Group>>,
    unit_sums: Vec<UnitSums>,
    units: Vec<UnitOption>,
    main_sum: Option<f64>,
    counter_calls: Vec<CounterCall>,
    fail_counter: bool,
}

impl GroupState {
    fn view(&self, date: Option<DateFilter>) -> &[Group] {
        match date {
            None => &self.live,
            Some(d) => self.snapshots.get(&d).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGroupDirectory {
    state: Mutex<GroupState>,
}

impl InMemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.state.get_mut().live.push(group);
        self
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.state.get_mut().live.extend(groups);
        self
    }

    /// Register the groups as they looked in month `date`
    pub fn with_snapshot(mut self, date: DateFilter, groups: Vec<Group>) -> Self {
        self.state.get_mut().snapshots.insert(date, groups);
        self
    }

    pub fn with_unit_sums(mut self, sums: Vec<UnitSums>) -> Self {
        self.state.get_mut().unit_sums = sums;
        self
    }

    pub fn with_units(mut self, units: Vec<UnitOption>) -> Self {
        self.state.get_mut().units = units;
        self
    }

    /// Fix the value returned by `get_main_groups_sum`
    pub fn with_main_sum(mut self, sum: f64) -> Self {
        self.state.get_mut().main_sum = Some(sum);
        self
    }

    pub async fn fail_counter_updates(&self, fail: bool) {
        self.state.lock().await.fail_counter = fail;
    }

    pub async fn counter_calls(&self) -> Vec<CounterCall> {
        self.state.lock().await.counter_calls.clone()
    }

    pub async fn group(&self, id: &GroupId) -> Option<Group> {
        let state = self.state.lock().await;
        state.live.iter().find(|g| g.id == *id).cloned()
    }
}

#[async_trait]
impl GroupDirectory for InMemoryGroupDirectory {
    async fn get_by_id(&self, id: &GroupId, date: Option<DateFilter>) -> Result<Group> {
        let state = self.state.lock().await;
        state
            .view(date)
            .iter()
            .find(|g| g.id == *id)
            .cloned()
            .ok_or_else(|| common::group_not_found(id.as_str()))
    }

    async fn get_many_by_ids(
        &self,
        ids: &[GroupId],
        date: Option<DateFilter>,
    ) -> Result<ManyGroups> {
        let state = self.state.lock().await;
        let view = state.view(date);
        let requested: HashSet<&GroupId> = ids.iter().collect();
        // Returned in storage order, like the real directory
        let groups: Vec<Group> = view
            .iter()
            .filter(|g| requested.contains(&g.id))
            .cloned()
            .collect();
        let found: HashSet<&GroupId> = groups.iter().map(|g| &g.id).collect();
        let not_found = ids.iter().filter(|id| !found.contains(id)).cloned().collect();
        Ok(ManyGroups { groups, not_found })
    }

    async fn get_children(&self, parent: &GroupId, date: Option<DateFilter>) -> Result<Vec<Group>> {
        let state = self.state.lock().await;
        Ok(state
            .view(date)
            .iter()
            .filter(|g| g.parent() == Some(parent))
            .cloned()
            .collect())
    }

    async fn get_all_descendants(
        &self,
        parent: &GroupId,
        date: Option<DateFilter>,
    ) -> Result<Vec<Group>> {
        let state = self.state.lock().await;
        Ok(state
            .view(date)
            .iter()
            .filter(|g| g.id != *parent && g.proper_ancestors().contains(parent))
            .cloned()
            .collect())
    }

    async fn get_unit_sums(
        &self,
        unit_names: &[String],
        _date: Option<DateFilter>,
    ) -> Result<Vec<UnitSums>> {
        let state = self.state.lock().await;
        Ok(state
            .unit_sums
            .iter()
            .filter(|u| unit_names.contains(&u.unit_name))
            .cloned()
            .collect())
    }

    async fn get_main_groups_sum(
        &self,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<f64> {
        let state = self.state.lock().await;
        if let Some(sum) = state.main_sum {
            return Ok(sum);
        }
        let view = state.view(date);
        Ok(match unit_filter {
            Some(unit) => view
                .iter()
                .find(|g| g.id == *unit)
                .map_or(0.0, |g| g.people_sum),
            None => view
                .iter()
                .filter(|g| g.parent().is_none())
                .map(|g| g.people_sum)
                .sum(),
        })
    }

    async fn get_units(&self, _date: Option<DateFilter>) -> Result<Vec<UnitOption>> {
        Ok(self.state.lock().await.units.clone())
    }

    async fn increment_assigned_count(&self, ids: &[GroupId], delta: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.counter_calls.push(CounterCall {
            ids: ids.to_vec(),
            delta,
        });
        if state.fail_counter {
            return Err(BrainError::upstream(
                ErrorCode::UPSTREAM_STATUS,
                "group",
                Some(503),
                "group service rejected the counter update",
            ));
        }
        for group in state.live.iter_mut().filter(|g| ids.contains(&g.id)) {
            group.assigned_count = group.assigned_count.saturating_add_signed(delta);
        }
        Ok(())
    }

    async fn available_dates(&self) -> Result<Vec<DateFilter>> {
        Ok(self.state.lock().await.snapshots.keys().copied().collect())
    }
}

#[derive(Debug, Default)]
struct TaskState {
    live: Vec<Task>,
    snapshots: BTreeMap<DateFilter, Vec<Task>>,
    update_calls: Vec<Task>,
    fail_update: bool,
    next_id: u64,
}

impl TaskState {
    fn view(&self, date: Option<DateFilter>) -> &[Task] {
        match date {
            None => &self.live,
            Some(d) => self.snapshots.get(&d).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskDirectory {
    state: Mutex<TaskState>,
}

impl InMemoryTaskDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.state.get_mut().live.push(task);
        self
    }

    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.state.get_mut().live.extend(tasks);
        self
    }

    pub fn with_snapshot(mut self, date: DateFilter, tasks: Vec<Task>) -> Self {
        self.state.get_mut().snapshots.insert(date, tasks);
        self
    }

    pub async fn fail_updates(&self, fail: bool) {
        self.state.lock().await.fail_update = fail;
    }

    /// Every task passed to `update`, successful or not
    pub async fn update_calls(&self) -> Vec<Task> {
        self.state.lock().await.update_calls.clone()
    }

    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        let state = self.state.lock().await;
        state.live.iter().find(|t| t.id == *id).cloned()
    }
}

#[async_trait]
impl TaskDirectory for InMemoryTaskDirectory {
    async fn get_by_id(&self, id: &TaskId, date: Option<DateFilter>) -> Result<Task> {
        let state = self.state.lock().await;
        state
            .view(date)
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .ok_or_else(|| common::task_not_found(id.as_str()))
    }

    async fn get_children(&self, parent: &TaskId, date: Option<DateFilter>) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .view(date)
            .iter()
            .filter(|t| t.parent.as_ref() == Some(parent))
            .cloned()
            .collect())
    }

    async fn get_by_type(&self, task_type: &str, date: Option<DateFilter>) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state
            .view(date)
            .iter()
            .filter(|t| t.task_type.as_deref() == Some(task_type))
            .cloned()
            .collect())
    }

    async fn get_descendants_by_depth(
        &self,
        id: &TaskId,
        depth: Option<u32>,
        date: Option<DateFilter>,
    ) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        let view = state.view(date);
        let mut out = Vec::new();
        let mut seen: HashSet<&TaskId> = HashSet::from([id]);
        let mut queue: VecDeque<(&TaskId, u32)> = VecDeque::from([(id, 0)]);

        while let Some((current, level)) = queue.pop_front() {
            if depth.is_some_and(|max| level >= max) {
                continue;
            }
            for child in view.iter().filter(|t| t.parent.as_ref() == Some(current)) {
                if seen.insert(&child.id) {
                    out.push(child.clone());
                    queue.push_back((&child.id, level + 1));
                }
            }
        }
        Ok(out)
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let mut created = Task::new(format!("task-{}", state.next_id), task.name.clone());
        created.parent = task.parent.clone();
        created.description = task.description.clone();
        created.task_type = task.task_type.clone();
        created.groups = task.groups.clone();
        if let Some(parent_id) = &task.parent {
            let parent_ancestors = state
                .live
                .iter()
                .find(|t| t.id == *parent_id)
                .map(|p| p.ancestors.clone())
                .unwrap_or_default();
            created.ancestors = parent_ancestors;
            created.ancestors.push(parent_id.clone());
            if let Some(parent) = state.live.iter_mut().find(|t| t.id == *parent_id) {
                parent.sub_tasks_count += 1;
            }
        }
        state.live.push(created.clone());
        Ok(created)
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        let mut state = self.state.lock().await;
        state.update_calls.push(task.clone());
        if state.fail_update {
            return Err(BrainError::upstream(
                ErrorCode::UPSTREAM_STATUS,
                "task",
                Some(500),
                "task service failed to persist the task",
            ));
        }
        let stored = state
            .live
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| common::task_not_found(task.id.as_str()))?;
        *stored = task.clone();
        Ok(task.clone())
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<Task> {
        let mut state = self.state.lock().await;
        let index = state
            .live
            .iter()
            .position(|t| t.id == *id)
            .ok_or_else(|| common::task_not_found(id.as_str()))?;
        let removed = state.live.remove(index);
        if let Some(parent_id) = &removed.parent {
            if let Some(parent) = state.live.iter_mut().find(|t| t.id == *parent_id) {
                parent.sub_tasks_count = parent.sub_tasks_count.saturating_sub(1);
            }
        }
        Ok(removed)
    }

    async fn available_dates(&self) -> Result<Vec<DateFilter>> {
        Ok(self.state.lock().await.snapshots.keys().copied().collect())
    }
}
