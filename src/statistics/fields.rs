//! Versioned descriptors of the numeric fields a statistic reports on
//!
//! The group directory has shipped several revisions of its breakdown keys,
//! so the keys and labels are data rather than code.

use crate::error::{BrainError, ErrorCode, Result};
use crate::model::Group;
use serde::{Deserialize, Serialize};

/// Which part of a group record a field is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldSource {
    People,
    ServiceType,
    RankType,
}

/// One reported field: where to read it and how to label its series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub source: FieldSource,
    #[serde(default)]
    pub key: String,
    pub label: String,
}

impl FieldDescriptor {
    pub fn people(label: impl Into<String>) -> Self {
        Self {
            source: FieldSource::People,
            key: "peopleSum".to_string(),
            label: label.into(),
        }
    }

    pub fn service(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: FieldSource::ServiceType,
            key: key.into(),
            label: label.into(),
        }
    }

    pub fn rank(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source: FieldSource::RankType,
            key: key.into(),
            label: label.into(),
        }
    }

    /// Raw value of this field on a group; absent breakdown keys read as 0
    pub fn value_of(&self, group: &Group) -> f64 {
        match self.source {
            FieldSource::People => group.people_sum,
            FieldSource::ServiceType => group.service_type.get(&self.key),
            FieldSource::RankType => group.rank_type.get(&self.key),
        }
    }
}

/// Ordered list of fields; series are emitted in this order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(Vec<FieldDescriptor>);

impl FieldSet {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self(fields)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.iter().map(|f| f.label.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Which family of fields a statistic reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumKind {
    People,
    Service,
    Rank,
}

/// The full set of field families for one revision of the group schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub version: String,
    pub unit_task_count_label: String,
    pub sum: FieldSet,
    pub service: FieldSet,
    pub rank: FieldSet,
}

impl FieldSchema {
    /// Older directories: three rank buckets, no breakdown of non-ranked staff
    pub fn v1() -> Self {
        Self {
            version: "v1".to_string(),
            sum: FieldSet::new(vec![FieldDescriptor::people("כמות אנשים")]),
            service: FieldSet::new(vec![
                FieldDescriptor::service("hovaSum", "חובה"),
                FieldDescriptor::service("kevaSum", "קבע"),
                FieldDescriptor::service("civilianSum", "אזרח"),
            ]),
            rank: FieldSet::new(vec![
                FieldDescriptor::rank("aSum", "א"),
                FieldDescriptor::rank("bSum", "ב"),
                FieldDescriptor::rank("cSum", "ג"),
            ]),
            unit_task_count_label: "כמות משימות".to_string(),
        }
    }

    pub fn v2() -> Self {
        Self {
            version: "v2".to_string(),
            sum: FieldSet::new(vec![FieldDescriptor::people("כמות אנשים")]),
            service: FieldSet::new(vec![
                FieldDescriptor::service("kevaSum", "קבע"),
                FieldDescriptor::service("hovaSum", "חובה"),
                FieldDescriptor::service("civilianSum", "אזרח"),
            ]),
            rank: FieldSet::new(vec![
                FieldDescriptor::rank("aSum", "א"),
                FieldDescriptor::rank("bSum", "ב"),
                FieldDescriptor::rank("cSum", "ג"),
                FieldDescriptor::rank("dSum", "ד"),
                FieldDescriptor::rank("hovaSum", "חובה"),
                FieldDescriptor::rank("civilianSum", "אזרח"),
            ]),
            unit_task_count_label: "כמות משימות".to_string(),
        }
    }

    /// Look up a built-in revision by name
    pub fn builtin(version: &str) -> Option<Self> {
        match version.trim().to_ascii_lowercase().as_str() {
            "v1" => Some(Self::v1()),
            "v2" => Some(Self::v2()),
            _ => None,
        }
    }

    pub fn fields_for(&self, kind: SumKind) -> &FieldSet {
        match kind {
            SumKind::People => &self.sum,
            SumKind::Service => &self.service,
            SumKind::Rank => &self.rank,
        }
    }

    /// The people-count field used for unit and view totals
    pub fn sum_field(&self) -> FieldDescriptor {
        self.sum
            .iter()
            .find(|f| f.source == FieldSource::People)
            .cloned()
            .unwrap_or_else(|| FieldDescriptor::people("peopleSum"))
    }

    /// Every family must report at least one field
    pub fn validate(&self) -> Result<()> {
        for (name, set) in [
            ("sum", &self.sum),
            ("service", &self.service),
            ("rank", &self.rank),
        ] {
            if set.is_empty() {
                return Err(BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_VALUE,
                    format!("Field set '{}' of schema '{}' is empty", name, self.version),
                ));
            }
        }
        Ok(())
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::v2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Breakdown;

    #[test]
    fn test_value_of_reads_each_source() {
        let mut group = Group::new("g", "G");
        group.people_sum = 12.0;
        group.service_type = Breakdown::default().with("kevaSum", 5.0);
        group.rank_type = Breakdown::default().with("aSum", 3.0);

        assert_eq!(FieldDescriptor::people("p").value_of(&group), 12.0);
        assert_eq!(FieldDescriptor::service("kevaSum", "k").value_of(&group), 5.0);
        assert_eq!(FieldDescriptor::rank("aSum", "a").value_of(&group), 3.0);
        assert_eq!(FieldDescriptor::rank("dSum", "d").value_of(&group), 0.0);
    }

    #[test]
    fn test_builtin_revisions_differ_in_rank_fields() {
        let v1 = FieldSchema::builtin("v1").unwrap();
        let v2 = FieldSchema::builtin("V2").unwrap();
        assert_eq!(v1.rank.len(), 3);
        assert_eq!(v2.rank.len(), 6);
        assert!(FieldSchema::builtin("v9").is_none());
        assert_eq!(FieldSchema::default(), v2);
    }

    #[test]
    fn test_schema_deserializes_from_toml() {
        let schema: FieldSchema = toml::from_str(
            r#"
            version = "custom"
            unit_task_count_label = "tasks"
            sum = [{ source = "people", label = "people" }]
            service = [{ source = "serviceType", key = "kevaSum", label = "keva" }]
            rank = [{ source = "rankType", key = "aSum", label = "a" }]
            "#,
        )
        .unwrap();

        assert_eq!(schema.version, "custom");
        assert_eq!(schema.service.labels(), vec!["keva".to_string()]);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_empty_field_set_is_rejected() {
        let mut schema = FieldSchema::v1();
        schema.rank = FieldSet::new(Vec::new());
        let err = schema.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_VALUE);
    }
}
