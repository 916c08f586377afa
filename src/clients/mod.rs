//! Ports to the upstream directories
//!
//! The statistics engine and the assignment workflow only see these traits.
//! `http` holds the reqwest adapters used in production and `memory` holds
//! in-process fakes that record every mutation for tests.

use crate::error::Result;
use crate::model::{
    DateFilter, Group, GroupId, ManyGroups, NewTask, Task, TaskId, UnitOption, UnitSums,
};
use async_trait::async_trait;

pub mod http;
pub mod memory;

pub use http::{HttpGroupDirectory, HttpTaskDirectory, UpstreamClient};
pub use memory::{InMemoryGroupDirectory, InMemoryTaskDirectory};

/// Read and counter-update access to the group directory
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Fetch a single group; absent ids are a not-found error
    async fn get_by_id(&self, id: &GroupId, date: Option<DateFilter>) -> Result<Group>;

    /// Bulk lookup; the order of `groups` is not guaranteed
    async fn get_many_by_ids(&self, ids: &[GroupId], date: Option<DateFilter>)
        -> Result<ManyGroups>;

    /// Immediate children of a group
    async fn get_children(&self, parent: &GroupId, date: Option<DateFilter>) -> Result<Vec<Group>>;

    /// Every group beneath `parent`, excluding `parent` itself
    async fn get_all_descendants(
        &self,
        parent: &GroupId,
        date: Option<DateFilter>,
    ) -> Result<Vec<Group>>;

    /// Unit-wide totals for each requested unit name
    async fn get_unit_sums(
        &self,
        unit_names: &[String],
        date: Option<DateFilter>,
    ) -> Result<Vec<UnitSums>>;

    /// Total people across the hierarchy, optionally restricted to one unit
    async fn get_main_groups_sum(
        &self,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<f64>;

    /// Units selectable as a statistics filter
    async fn get_units(&self, date: Option<DateFilter>) -> Result<Vec<UnitOption>>;

    /// Add `delta` to `assignedCount` of every listed group
    async fn increment_assigned_count(&self, ids: &[GroupId], delta: i64) -> Result<()>;

    /// Months for which snapshots exist
    async fn available_dates(&self) -> Result<Vec<DateFilter>>;
}

/// Read and write access to the task directory
#[async_trait]
pub trait TaskDirectory: Send + Sync {
    async fn get_by_id(&self, id: &TaskId, date: Option<DateFilter>) -> Result<Task>;

    /// Direct children of a task
    async fn get_children(&self, parent: &TaskId, date: Option<DateFilter>) -> Result<Vec<Task>>;

    /// Every task of the given `type`
    async fn get_by_type(&self, task_type: &str, date: Option<DateFilter>) -> Result<Vec<Task>>;

    /// Descendants down to `depth` levels; `None` means the whole subtree
    async fn get_descendants_by_depth(
        &self,
        id: &TaskId,
        depth: Option<u32>,
        date: Option<DateFilter>,
    ) -> Result<Vec<Task>>;

    async fn create(&self, task: &NewTask) -> Result<Task>;

    async fn update(&self, task: &Task) -> Result<Task>;

    async fn delete_by_id(&self, id: &TaskId) -> Result<Task>;

    /// Months for which snapshots exist
    async fn available_dates(&self) -> Result<Vec<DateFilter>>;
}
