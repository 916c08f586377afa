//! Proportional allocation of a group's totals across the tasks linked to it

use super::fields::{FieldDescriptor, FieldSet};
use crate::error::{common, Result};
use crate::model::Group;

/// Share of `raw` claimed by a subtree that references a group
/// `instance_count` times, out of `assigned_count` references overall.
pub fn relative_value(
    group: &Group,
    raw: f64,
    instance_count: u32,
    assigned_count: u64,
) -> Result<f64> {
    if assigned_count == 0 {
        return Err(common::zero_assigned_count(group.id.as_str()));
    }
    Ok(raw * f64::from(instance_count) / assigned_count as f64)
}

/// Relative contribution of one field of `group`
pub fn relative_contribution(
    group: &Group,
    instance_count: u32,
    field: &FieldDescriptor,
) -> Result<f64> {
    relative_value(
        group,
        field.value_of(group),
        instance_count,
        group.assigned_count,
    )
}

/// Relative contributions for every field of a set, in set order
pub fn relative_contributions(
    group: &Group,
    instance_count: u32,
    fields: &FieldSet,
) -> Result<Vec<f64>> {
    fields
        .iter()
        .map(|field| relative_contribution(group, instance_count, field))
        .collect()
}
