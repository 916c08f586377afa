use super::group::GroupId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque identifier assigned by the task directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A group linked to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
    pub id: GroupId,
    #[serde(default)]
    pub name: String,
    /// Set for groups the user selected directly, clear for groups pulled
    /// in as an ancestor or descendant of a selection.
    #[serde(default)]
    pub is_clicked: bool,
}

impl TaskGroup {
    pub fn clicked(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_clicked: true,
        }
    }

    pub fn implied(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_clicked: false,
        }
    }
}

/// A node of the task hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: TaskId,
    #[serde(default)]
    pub parent: Option<TaskId>,
    #[serde(default)]
    pub ancestors: Vec<TaskId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub groups: Vec<TaskGroup>,
    #[serde(default)]
    pub sub_tasks_count: u32,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            ancestors: Vec::new(),
            name: name.into(),
            description: String::new(),
            task_type: None,
            groups: Vec::new(),
            sub_tasks_count: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_group(&self, id: &GroupId) -> bool {
        self.groups.iter().any(|g| g.id == *id)
    }

    /// First group id that appears more than once, if any
    pub fn duplicate_group(&self) -> Option<&GroupId> {
        let mut seen = HashSet::new();
        self.groups.iter().map(|g| &g.id).find(|id| !seen.insert(*id))
    }

    pub fn clicked_groups(&self) -> Vec<TaskGroup> {
        self.groups.iter().filter(|g| g.is_clicked).cloned().collect()
    }
}

/// Body for creating a task; the directory assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub parent: Option<TaskId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub groups: Vec<TaskGroup>,
}

impl NewTask {
    pub fn duplicate_group(&self) -> Option<&GroupId> {
        let mut seen = HashSet::new();
        self.groups.iter().map(|g| &g.id).find(|id| !seen.insert(*id))
    }
}
