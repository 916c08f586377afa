//! Domain records exchanged with the task and group directories
//!
//! Both directories own their data; this service only reads snapshots and
//! writes back task group lists and assignment counters.

pub mod date;
pub mod group;
pub mod task;

pub use date::DateFilter;
pub use group::{order_by_requested, Breakdown, Group, GroupId, ManyGroups, UnitOption, UnitSums};
pub use task::{NewTask, Task, TaskGroup, TaskId};
