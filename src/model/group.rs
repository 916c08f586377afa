use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque identifier assigned by the group directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Named numeric totals such as `serviceType` or `rankType`.
///
/// Keys differ between schema revisions, so lookups of an absent key read
/// as zero instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakdown(BTreeMap<String, f64>);

impl Breakdown {
    pub fn get(&self, key: &str) -> f64 {
        self.0.get(key).copied().unwrap_or(0.0)
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Breakdown {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A node of the organizational hierarchy as served by the group directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "kartoffelID", alias = "id")]
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub unit_name: String,
    /// Root first, immediate parent last. Some revisions of the directory
    /// also append the group's own id.
    #[serde(default)]
    pub ancestors: Vec<GroupId>,
    #[serde(default)]
    pub children: Vec<GroupId>,
    #[serde(default)]
    pub people_sum: f64,
    #[serde(default)]
    pub service_type: Breakdown,
    #[serde(default)]
    pub rank_type: Breakdown,
    #[serde(default)]
    pub assigned_count: u64,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_name: String::new(),
            ancestors: Vec::new(),
            children: Vec::new(),
            people_sum: 0.0,
            service_type: Breakdown::default(),
            rank_type: Breakdown::default(),
            assigned_count: 0,
        }
    }

    /// Ancestors without the trailing self reference, root first
    pub fn proper_ancestors(&self) -> &[GroupId] {
        match self.ancestors.split_last() {
            Some((last, rest)) if *last == self.id => rest,
            _ => &self.ancestors,
        }
    }

    /// Immediate parent, if this is not a root group
    pub fn parent(&self) -> Option<&GroupId> {
        self.proper_ancestors().last()
    }

    /// True when the group is the unit itself or lies beneath it
    pub fn is_within(&self, unit: &GroupId) -> bool {
        self.id == *unit || self.proper_ancestors().contains(unit)
    }

    /// Apply an optional unit filter; `None` admits every group
    pub fn matches_unit_filter(&self, unit_filter: Option<&GroupId>) -> bool {
        unit_filter.map_or(true, |unit| self.is_within(unit))
    }
}

/// Result of a bulk lookup; ids the directory no longer knows land in `not_found`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManyGroups {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub not_found: Vec<GroupId>,
}

/// Aggregate totals for one unit, keyed by unit name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSums {
    #[serde(rename = "_id", alias = "unitName")]
    pub unit_name: String,
    #[serde(default)]
    pub people_sum: f64,
    #[serde(default)]
    pub service_type: Breakdown,
    #[serde(default)]
    pub rank_type: Breakdown,
}

/// A selectable entry of the unit filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOption {
    #[serde(rename = "kartoffelID", alias = "id")]
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub unit_name: String,
}

/// Reorder bulk lookup results to follow the requested id order.
///
/// Ids missing from `fetched` are skipped; groups that were not requested
/// are dropped.
pub fn order_by_requested(requested: &[GroupId], fetched: Vec<Group>) -> Vec<Group> {
    let mut by_id: HashMap<GroupId, Group> =
        fetched.into_iter().map(|g| (g.id.clone(), g)).collect();
    requested.iter().filter_map(|id| by_id.remove(id)).collect()
}
