//! Toggling a group on a task while keeping the task's group list consistent

pub mod plan;
pub mod workflow;

pub use plan::{plan_add, plan_remove, AddPlan, Lineage, RemovePlan};
pub use workflow::{AssignmentOutcome, AssignmentService};
