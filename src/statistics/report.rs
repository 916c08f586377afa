//! Result shapes for each statistics variant
//!
//! Serialized field names follow what the dashboard charts consume.

use crate::model::TaskId;
use serde::{Deserialize, Serialize};

/// One named row of values, aligned with the report's categories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<f64>,
}

impl Series {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Vec::new(),
        }
    }
}

/// Per-group breakdown of one task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegularSumReport {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// A child task used as a category; `drilldown` tells the UI it has children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTaskCategory {
    pub name: String,
    pub id: TaskId,
    pub drilldown: bool,
}

/// One aggregate value per direct child task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubTaskSumReport {
    pub categories: Vec<SubTaskCategory>,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPoint {
    pub name: String,
    pub y: f64,
    /// Unit-wide people total; absent when the directory had no totals
    pub full_size: Option<f64>,
    pub drilldown: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrilldownPoint {
    pub name: String,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrilldownSeries {
    pub name: String,
    pub id: String,
    pub data: Vec<DrilldownPoint>,
}

/// One point per unit with a drill-down breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitSumReport {
    pub main_series: Vec<UnitPoint>,
    pub drilldown_series: Vec<DrilldownSeries>,
}

/// Chronological values of one task across snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineReport {
    pub categories: Vec<String>,
    pub series: Vec<f64>,
}

/// Any statistics result; serialized as the bare inner shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatisticsReport {
    Regular(RegularSumReport),
    SubTasks(SubTaskSumReport),
    Unit(UnitSumReport),
    UnitTaskCount(RegularSumReport),
    Timeline(TimelineReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_report_uses_chart_field_names() {
        let report = StatisticsReport::Unit(UnitSumReport {
            main_series: vec![UnitPoint {
                name: "north".to_string(),
                y: 12.5,
                full_size: Some(100.0),
                drilldown: "north".to_string(),
            }],
            drilldown_series: vec![DrilldownSeries {
                name: "north".to_string(),
                id: "north".to_string(),
                data: vec![DrilldownPoint {
                    name: "Alpha".to_string(),
                    y: 12.5,
                }],
            }],
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mainSeries"][0]["fullSize"], 100.0);
        assert_eq!(json["drilldownSeries"][0]["data"][0]["name"], "Alpha");
    }

    #[test]
    fn test_untagged_variants_serialize_bare() {
        let report = StatisticsReport::Timeline(TimelineReport {
            categories: vec!["2020-01".to_string(), "current".to_string()],
            series: vec![1.0, 2.0],
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["categories"][1], "current");
        assert!(json.get("Timeline").is_none());
    }
}
