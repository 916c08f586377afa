//! Statistics dispatch over the resolver, calculator and report builders

use super::calculator::{relative_contribution, relative_contributions};
use super::fields::{FieldSchema, SumKind};
use super::report::{
    DrilldownPoint, DrilldownSeries, RegularSumReport, Series, StatisticsReport,
    SubTaskCategory, SubTaskSumReport, TimelineReport, UnitPoint, UnitSumReport,
};
use super::resolver::{resolve_associated_groups, AssociatedGroups};
use super::tree::{calculate_view_statistics, MajorTask, ViewStatistics};
use super::units::build_unit_rollups;
use crate::clients::{GroupDirectory, TaskDirectory};
use crate::error::{common, BrainError, ErrorCode, Result};
use crate::model::{DateFilter, GroupId, TaskId, UnitOption};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatisticsType {
    Sum,
    ServiceSum,
    RankSum,
    UnitSum,
    UnitServiceSum,
    UnitRankSum,
    UnitTaskCount,
    Timeline,
}

impl StatisticsType {
    pub const ALL: [StatisticsType; 8] = [
        StatisticsType::Sum,
        StatisticsType::ServiceSum,
        StatisticsType::RankSum,
        StatisticsType::UnitSum,
        StatisticsType::UnitServiceSum,
        StatisticsType::UnitRankSum,
        StatisticsType::UnitTaskCount,
        StatisticsType::Timeline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsType::Sum => "Sum",
            StatisticsType::ServiceSum => "ServiceSum",
            StatisticsType::RankSum => "RankSum",
            StatisticsType::UnitSum => "UnitSum",
            StatisticsType::UnitServiceSum => "UnitServiceSum",
            StatisticsType::UnitRankSum => "UnitRankSum",
            StatisticsType::UnitTaskCount => "UnitTaskCount",
            StatisticsType::Timeline => "Timeline",
        }
    }
}

impl fmt::Display for StatisticsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticsType {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| {
                BrainError::invalid_parameter_with_code(
                    ErrorCode::PARAM_UNKNOWN_STATISTICS_TYPE,
                    format!("Unknown statistics type '{}'", s),
                    Some("type".to_string()),
                )
            })
    }
}

/// Which upstream's snapshot calendar to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilterKind {
    Tasks,
    Groups,
}

impl FromStr for DateFilterKind {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Tasks" => Ok(DateFilterKind::Tasks),
            "Groups" => Ok(DateFilterKind::Groups),
            other => Err(common::malformed_parameter(
                "type",
                format!("expected Tasks or Groups, got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsRequest {
    pub task_id: TaskId,
    pub statistics_type: StatisticsType,
    pub show_sub_tasks: bool,
    pub parent_group_id: Option<GroupId>,
    pub unit_filter: Option<GroupId>,
    pub date: Option<DateFilter>,
}

impl StatisticsRequest {
    pub fn new(task_id: impl Into<TaskId>, statistics_type: StatisticsType) -> Self {
        Self {
            task_id: task_id.into(),
            statistics_type,
            show_sub_tasks: false,
            parent_group_id: None,
            unit_filter: None,
            date: None,
        }
    }
}

pub struct StatisticsService {
    groups: Arc<dyn GroupDirectory>,
    tasks: Arc<dyn TaskDirectory>,
    fields: FieldSchema,
    major_tasks: Vec<MajorTask>,
    timeline_label: String,
    root_group: Option<GroupId>,
}

impl StatisticsService {
    pub fn new(
        groups: Arc<dyn GroupDirectory>,
        tasks: Arc<dyn TaskDirectory>,
        fields: FieldSchema,
        major_tasks: Vec<MajorTask>,
        timeline_label: impl Into<String>,
    ) -> Self {
        Self {
            groups,
            tasks,
            fields,
            major_tasks,
            timeline_label: timeline_label.into(),
            root_group: None,
        }
    }

    /// Filtering by the hierarchy root admits every group, so it is dropped
    pub fn with_root_group(mut self, root: GroupId) -> Self {
        self.root_group = Some(root);
        self
    }

    fn unit_filter<'a>(&self, requested: Option<&'a GroupId>) -> Option<&'a GroupId> {
        requested.filter(|unit| self.root_group.as_ref() != Some(*unit))
    }

    pub fn fields(&self) -> &FieldSchema {
        &self.fields
    }

    pub async fn statistics(&self, request: &StatisticsRequest) -> Result<StatisticsReport> {
        debug!(
            "Calculating {} statistics for task {}",
            request.statistics_type, request.task_id
        );
        let unit_filter = self.unit_filter(request.unit_filter.as_ref());
        match request.statistics_type {
            StatisticsType::Sum | StatisticsType::ServiceSum | StatisticsType::RankSum => {
                let kind = sum_kind(request.statistics_type);
                if request.show_sub_tasks {
                    self.sub_tasks_sum(&request.task_id, kind, unit_filter, request.date)
                        .await
                        .map(StatisticsReport::SubTasks)
                } else {
                    self.regular_sum(&request.task_id, kind, unit_filter, request.date)
                        .await
                        .map(StatisticsReport::Regular)
                }
            }
            StatisticsType::UnitSum
            | StatisticsType::UnitServiceSum
            | StatisticsType::UnitRankSum => self
                .unit_sum(
                    &request.task_id,
                    sum_kind(request.statistics_type),
                    unit_filter,
                    request.date,
                )
                .await
                .map(StatisticsReport::Unit),
            StatisticsType::UnitTaskCount => {
                let parent = request
                    .parent_group_id
                    .as_ref()
                    .ok_or_else(|| common::missing_parameter("parentGroupId"))?;
                self.unit_task_count(&request.task_id, parent, request.date)
                    .await
                    .map(StatisticsReport::UnitTaskCount)
            }
            StatisticsType::Timeline => self
                .timeline(&request.task_id, unit_filter)
                .await
                .map(StatisticsReport::Timeline),
        }
    }

    async fn associated(
        &self,
        task_id: &TaskId,
        date: Option<DateFilter>,
    ) -> Result<AssociatedGroups> {
        resolve_associated_groups(self.tasks.as_ref(), self.groups.as_ref(), task_id, date).await
    }

    /// One category per resolved group, one series per field
    pub async fn regular_sum(
        &self,
        task_id: &TaskId,
        kind: SumKind,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<RegularSumReport> {
        let fields = self.fields.fields_for(kind);
        let associated = self.associated(task_id, date).await?;

        let mut report = RegularSumReport {
            categories: Vec::new(),
            series: fields.iter().map(|f| Series::empty(&f.label)).collect(),
        };
        for (group, count) in associated
            .resolved()
            .filter(|(g, _)| g.matches_unit_filter(unit_filter))
        {
            let values = relative_contributions(group, count, fields)?;
            report.categories.push(group.name.clone());
            for (series, value) in report.series.iter_mut().zip(values) {
                series.data.push(value);
            }
        }
        Ok(report)
    }

    /// Field totals of a task subtree, in field order
    pub async fn task_totals(
        &self,
        task_id: &TaskId,
        kind: SumKind,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<Vec<f64>> {
        let fields = self.fields.fields_for(kind);
        let associated = self.associated(task_id, date).await?;

        let mut totals = vec![0.0; fields.len()];
        for (group, count) in associated
            .resolved()
            .filter(|(g, _)| g.matches_unit_filter(unit_filter))
        {
            for (total, value) in totals
                .iter_mut()
                .zip(relative_contributions(group, count, fields)?)
            {
                *total += value;
            }
        }
        Ok(totals)
    }

    /// One category per direct child task, each valued by its own subtree
    pub async fn sub_tasks_sum(
        &self,
        task_id: &TaskId,
        kind: SumKind,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<SubTaskSumReport> {
        let fields = self.fields.fields_for(kind);
        let children = self.tasks.get_children(task_id, date).await?;
        let totals = try_join_all(
            children
                .iter()
                .map(|child| self.task_totals(&child.id, kind, unit_filter, date)),
        )
        .await?;

        let mut report = SubTaskSumReport {
            categories: Vec::with_capacity(children.len()),
            series: fields.iter().map(|f| Series::empty(&f.label)).collect(),
        };
        for (child, values) in children.iter().zip(totals) {
            report.categories.push(SubTaskCategory {
                name: child.name.clone(),
                id: child.id.clone(),
                drilldown: child.sub_tasks_count != 0,
            });
            for (series, value) in report.series.iter_mut().zip(values) {
                series.data.push(value);
            }
        }
        Ok(report)
    }

    /// One point per unit; people drill down by group, other kinds by field
    pub async fn unit_sum(
        &self,
        task_id: &TaskId,
        kind: SumKind,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<UnitSumReport> {
        let fields = self.fields.fields_for(kind);
        let associated = self.associated(task_id, date).await?;
        let rollups =
            build_unit_rollups(self.groups.as_ref(), &associated, unit_filter, date).await?;

        let people = self.fields.sum_field();
        let mut report = UnitSumReport::default();
        for rollup in rollups {
            let data = match kind {
                SumKind::People => rollup
                    .members
                    .iter()
                    .map(|m| {
                        Ok(DrilldownPoint {
                            name: m.group.name.clone(),
                            y: relative_contribution(&m.group, m.instance_count, &people)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                SumKind::Service | SumKind::Rank => {
                    let mut points: Vec<DrilldownPoint> = fields
                        .iter()
                        .map(|f| DrilldownPoint {
                            name: f.label.clone(),
                            y: 0.0,
                        })
                        .collect();
                    for member in &rollup.members {
                        let values =
                            relative_contributions(&member.group, member.instance_count, fields)?;
                        for (point, value) in points.iter_mut().zip(values) {
                            point.y += value;
                        }
                    }
                    points
                }
            };

            report.main_series.push(UnitPoint {
                name: rollup.unit_name.clone(),
                y: data.iter().map(|p| p.y).sum(),
                full_size: rollup.details.as_ref().map(|d| d.people_sum),
                drilldown: rollup.unit_name.clone(),
            });
            report.drilldown_series.push(DrilldownSeries {
                name: rollup.unit_name.clone(),
                id: rollup.unit_name,
                data,
            });
        }
        Ok(report)
    }

    /// Reference counts of the direct child groups of `parent`
    pub async fn unit_task_count(
        &self,
        task_id: &TaskId,
        parent: &GroupId,
        date: Option<DateFilter>,
    ) -> Result<RegularSumReport> {
        let associated = self.associated(task_id, date).await?;
        let mut series = Series::empty(&self.fields.unit_task_count_label);
        let mut categories = Vec::new();

        for (group, count) in associated.resolved().filter(|(g, _)| g.parent() == Some(parent)) {
            categories.push(group.name.clone());
            series.data.push(f64::from(count));
        }
        Ok(RegularSumReport {
            categories,
            series: vec![series],
        })
    }

    /// People total of a task for every snapshot it exists in, then live
    pub async fn timeline(
        &self,
        task_id: &TaskId,
        unit_filter: Option<&GroupId>,
    ) -> Result<TimelineReport> {
        let mut dates = self.tasks.available_dates().await?;
        dates.sort();
        dates.dedup();

        let snapshots = try_join_all(dates.iter().map(|date| async move {
            match self
                .task_totals(task_id, SumKind::People, unit_filter, Some(*date))
                .await
            {
                Ok(totals) => Ok(Some((*date, totals.iter().sum::<f64>()))),
                Err(BrainError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            }
        }))
        .await?;

        let mut report = TimelineReport::default();
        for (date, value) in snapshots.into_iter().flatten() {
            report.categories.push(date.to_string());
            report.series.push(value);
        }

        let live = self
            .task_totals(task_id, SumKind::People, unit_filter, None)
            .await?;
        report.categories.push(self.timeline_label.clone());
        report.series.push(live.iter().sum());
        Ok(report)
    }

    pub async fn view_statistics(
        &self,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<ViewStatistics> {
        let stats = calculate_view_statistics(
            self.tasks.as_ref(),
            self.groups.as_ref(),
            &self.major_tasks,
            self.unit_filter(unit_filter),
            date,
            &self.fields.sum_field(),
        )
        .await?;
        info!(
            "View statistics: {} categories, fullSize {:.1} of {:.1}",
            stats.categories.len(),
            stats.full_size,
            stats.main_full_size
        );
        Ok(stats)
    }

    /// Snapshot months offered by one of the upstream services, oldest first
    pub async fn date_filters(&self, kind: DateFilterKind) -> Result<Vec<DateFilter>> {
        let mut dates = match kind {
            DateFilterKind::Tasks => self.tasks.available_dates().await?,
            DateFilterKind::Groups => self.groups.available_dates().await?,
        };
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    pub async fn unit_filters(&self, date: Option<DateFilter>) -> Result<Vec<UnitOption>> {
        self.groups.get_units(date).await
    }
}

fn sum_kind(statistics_type: StatisticsType) -> SumKind {
    match statistics_type {
        StatisticsType::ServiceSum | StatisticsType::UnitServiceSum => SumKind::Service,
        StatisticsType::RankSum | StatisticsType::UnitRankSum => SumKind::Rank,
        _ => SumKind::People,
    }
}
