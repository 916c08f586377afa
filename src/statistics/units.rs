//! Clusters associated groups by unit and attaches unit-wide totals

use super::resolver::AssociatedGroups;
use crate::clients::GroupDirectory;
use crate::error::Result;
use crate::model::{DateFilter, Group, GroupId, UnitSums};
use std::collections::HashMap;
use tracing::warn;

/// A resolved group together with its reference count
#[derive(Debug, Clone, PartialEq)]
pub struct UnitMember {
    pub group: Group,
    pub instance_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitRollup {
    pub unit_name: String,
    /// Totals of the whole unit; `None` if the directory returned none
    pub details: Option<UnitSums>,
    pub members: Vec<UnitMember>,
}

/// Group resolved entries by `unitName`, in first-seen order
pub fn cluster_by_unit<'a>(
    entries: impl IntoIterator<Item = (&'a Group, u32)>,
) -> Vec<UnitRollup> {
    let mut rollups: Vec<UnitRollup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (group, instance_count) in entries {
        let member = UnitMember {
            group: group.clone(),
            instance_count,
        };
        match index.get(&group.unit_name) {
            Some(&i) => rollups[i].members.push(member),
            None => {
                index.insert(group.unit_name.clone(), rollups.len());
                rollups.push(UnitRollup {
                    unit_name: group.unit_name.clone(),
                    details: None,
                    members: vec![member],
                });
            }
        }
    }
    rollups
}

/// Build unit roll-ups for the resolved entries of `associated` that pass
/// the unit filter, with one bulk call for the unit totals.
pub async fn build_unit_rollups(
    groups: &dyn GroupDirectory,
    associated: &AssociatedGroups,
    unit_filter: Option<&GroupId>,
    date: Option<DateFilter>,
) -> Result<Vec<UnitRollup>> {
    let mut rollups = cluster_by_unit(
        associated
            .resolved()
            .filter(|(g, _)| g.matches_unit_filter(unit_filter)),
    );
    if rollups.is_empty() {
        return Ok(rollups);
    }

    let names: Vec<String> = rollups.iter().map(|r| r.unit_name.clone()).collect();
    let sums = groups.get_unit_sums(&names, date).await?;
    let mut by_name: HashMap<String, UnitSums> =
        sums.into_iter().map(|s| (s.unit_name.clone(), s)).collect();

    for rollup in &mut rollups {
        rollup.details = by_name.remove(&rollup.unit_name);
        if rollup.details.is_none() {
            warn!("No unit totals returned for unit '{}'", rollup.unit_name);
        }
    }
    Ok(rollups)
}
