//! Statistics aggregation over task subtrees
//!
//! Every statistic starts from the same associated-groups map: the distinct
//! groups referenced anywhere under a task, each with the number of times it
//! is referenced. A group linked to several tasks contributes to each of them
//! in proportion to `instance_count / assigned_count`, so the shares of all
//! tasks add up to the group's own totals.

pub mod calculator;
pub mod engine;
pub mod fields;
pub mod report;
pub mod resolver;
pub mod tree;
pub mod units;

pub use calculator::{relative_contribution, relative_contributions};
pub use engine::{DateFilterKind, StatisticsRequest, StatisticsService, StatisticsType};
pub use fields::{FieldDescriptor, FieldSchema, FieldSet, FieldSource, SumKind};
pub use report::StatisticsReport;
pub use resolver::{resolve_associated_groups, AssociatedGroup, AssociatedGroups};
pub use tree::{MajorTask, ViewNode, ViewStatistics};
pub use units::{build_unit_rollups, UnitRollup};
