//! System-wide view statistics: a bottom-up fold over each major task tree

use super::calculator::relative_contribution;
use super::fields::FieldDescriptor;
use super::resolver::fetch_group_details;
use crate::clients::{GroupDirectory, TaskDirectory};
use crate::error::Result;
use crate::model::{DateFilter, Group, GroupId, Task, TaskId};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// A top-level task category shown on the overview page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorTask {
    /// Key of the category in the view statistics response
    pub name: String,
    pub id: TaskId,
    /// Display name of the category node
    pub label: String,
    /// How many levels below the category to include; unlimited if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl MajorTask {
    pub fn new(name: &str, id: &str, label: &str, depth: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            id: TaskId::from(id),
            label: label.to_string(),
            depth,
        }
    }

    /// The categories of the production deployment, each folded over its
    /// whole subtree
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("BuildForce", "5f4cc9e2999432a15dbeab31", "יכולות", None),
            Self::new("OperativeForce", "5f4cc74c999432075ebeab2f", "הפעלת כוח", None),
            Self::new("Wide", "5fc61317fd6cf43fdd293552", "רוחב", None),
            Self::new("Wrap", "5f689b32fc60a9ebdcaa7cbb", "מעטפת", None),
        ]
    }
}

/// A folded task: `value` is its own contribution plus all of its children's
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    #[serde(rename = "_id")]
    pub id: TaskId,
    pub name: String,
    pub value: f64,
    pub children: Vec<ViewNode>,
    pub ancestors: Vec<TaskId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatistics {
    pub full_size: f64,
    pub main_full_size: f64,
    #[serde(flatten)]
    pub categories: BTreeMap<String, ViewNode>,
}

/// Sum of a task's own relative contributions.
///
/// Groups missing from `pool` or outside the unit filter count as nothing.
pub fn direct_contribution(
    task: &Task,
    pool: &HashMap<GroupId, Group>,
    unit_filter: Option<&GroupId>,
    field: &FieldDescriptor,
) -> Result<f64> {
    let mut total = 0.0;
    for link in &task.groups {
        match pool.get(&link.id) {
            Some(group) if group.matches_unit_filter(unit_filter) => {
                total += relative_contribution(group, 1, field)?;
            }
            Some(_) => {}
            None => debug!("Task {} links unresolved group {}", task.id, link.id),
        }
    }
    Ok(total)
}

/// Fold `root` and its flat list of descendants into a value tree
pub fn fold_tree(
    root: &Task,
    descendants: &[Task],
    pool: &HashMap<GroupId, Group>,
    unit_filter: Option<&GroupId>,
    field: &FieldDescriptor,
) -> Result<ViewNode> {
    let mut children_of: HashMap<&TaskId, Vec<&Task>> = HashMap::new();
    for task in descendants {
        if let Some(parent) = &task.parent {
            children_of.entry(parent).or_default().push(task);
        }
    }
    let mut visited = HashSet::new();
    fold_node(root, &children_of, pool, unit_filter, field, &mut visited)
}

fn fold_node<'a>(
    task: &'a Task,
    children_of: &HashMap<&TaskId, Vec<&'a Task>>,
    pool: &HashMap<GroupId, Group>,
    unit_filter: Option<&GroupId>,
    field: &FieldDescriptor,
    visited: &mut HashSet<&'a TaskId>,
) -> Result<ViewNode> {
    visited.insert(&task.id);
    let mut value = direct_contribution(task, pool, unit_filter, field)?;
    let mut children = Vec::new();

    for child in children_of.get(&task.id).into_iter().flatten() {
        if visited.contains(&child.id) {
            warn!("Task {} appears twice under {}; skipping", child.id, task.id);
            continue;
        }
        let node = fold_node(child, children_of, pool, unit_filter, field, visited)?;
        value += node.value;
        children.push(node);
    }

    Ok(ViewNode {
        id: task.id.clone(),
        name: task.name.clone(),
        value,
        children,
        ancestors: task.ancestors.clone(),
    })
}

async fn fetch_tree(
    tasks: &dyn TaskDirectory,
    major: &MajorTask,
    date: Option<DateFilter>,
) -> Result<(Task, Vec<Task>)> {
    tokio::try_join!(
        tasks.get_by_id(&major.id, date),
        tasks.get_descendants_by_depth(&major.id, major.depth, date),
    )
}

/// Fold every major category and report the totals
pub async fn calculate_view_statistics(
    tasks: &dyn TaskDirectory,
    groups: &dyn GroupDirectory,
    majors: &[MajorTask],
    unit_filter: Option<&GroupId>,
    date: Option<DateFilter>,
    field: &FieldDescriptor,
) -> Result<ViewStatistics> {
    let trees = try_join_all(majors.iter().map(|m| fetch_tree(tasks, m, date))).await?;

    // One pool shared by every category
    let mut seen = HashSet::new();
    let ids: Vec<GroupId> = trees
        .iter()
        .flat_map(|(root, rest)| std::iter::once(root).chain(rest.iter()))
        .flat_map(|t| t.groups.iter().map(|g| &g.id))
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect();

    let (resolved, main_full_size) = tokio::try_join!(
        fetch_group_details(groups, &ids, date, "View statistics"),
        groups.get_main_groups_sum(unit_filter, date),
    )?;
    let pool: HashMap<GroupId, Group> = resolved.into_iter().map(|g| (g.id.clone(), g)).collect();

    let mut stats = ViewStatistics {
        main_full_size,
        ..ViewStatistics::default()
    };
    for (major, (root, descendants)) in majors.iter().zip(trees.iter()) {
        let mut node = fold_tree(root, descendants, &pool, unit_filter, field)?;
        node.name = major.label.clone();
        stats.full_size += node.value;
        stats.categories.insert(major.name.clone(), node);
    }
    Ok(stats)
}
