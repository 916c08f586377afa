//! Route handlers and their query/body shapes

use super::ApiState;
use crate::assignment::AssignmentOutcome;
use crate::error::{common, BrainError, ErrorCode, Result};
use crate::model::{DateFilter, Group, GroupId, NewTask, Task, TaskId, UnitOption};
use crate::statistics::{
    DateFilterKind, StatisticsReport, StatisticsRequest, StatisticsType, ViewStatistics,
};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Query strings are taken as raw text so malformed values surface as our
/// own invalid-parameter errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatisticsQuery {
    #[serde(rename = "type")]
    statistics_type: Option<String>,
    show_sub_tasks: Option<String>,
    parent_group_id: Option<String>,
    unit_filter: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FilterQuery {
    unit_filter: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DateKindQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignGroupBody {
    task_id: Option<String>,
    group_id: Option<String>,
    is_count_grow: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope<T> {
    task: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct DatesResponse {
    dates: Vec<DateFilter>,
}

#[derive(Debug, Serialize)]
pub(crate) struct UnitsResponse {
    units: Vec<UnitOption>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TasksResponse {
    tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupsResponse {
    groups: Vec<Group>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_date(value: Option<String>) -> Result<Option<DateFilter>> {
    non_empty(value)
        .map(|v| {
            v.parse::<DateFilter>()
                .map_err(|e| common::malformed_parameter("date", e))
        })
        .transpose()
}

fn parse_flag(field: &str, value: Option<String>) -> Result<bool> {
    match non_empty(value).as_deref() {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(common::malformed_parameter(
            field,
            format!("expected true or false, got '{}'", other),
        )),
    }
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| common::malformed_parameter("body", e))
}

fn reject_duplicate_groups(duplicate: Option<&GroupId>) -> Result<()> {
    match duplicate {
        Some(id) => Err(BrainError::invalid_parameter_with_code(
            ErrorCode::PARAM_DUPLICATE_GROUP,
            format!("Group '{}' appears more than once", id),
            Some("groups".to_string()),
        )),
        None => Ok(()),
    }
}

pub(crate) async fn health_check() -> &'static str {
    "alive"
}

pub(crate) async fn get_statistics(
    State(state): State<Arc<ApiState>>,
    Path(task_id): Path<String>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsReport>> {
    let statistics_type: StatisticsType = non_empty(query.statistics_type)
        .ok_or_else(|| common::missing_parameter("type"))?
        .parse()?;

    let request = StatisticsRequest {
        task_id: TaskId::from(task_id),
        statistics_type,
        show_sub_tasks: parse_flag("showSubTasks", query.show_sub_tasks)?,
        parent_group_id: non_empty(query.parent_group_id).map(GroupId::from),
        unit_filter: non_empty(query.unit_filter).map(GroupId::from),
        date: parse_date(query.date)?,
    };
    state.statistics.statistics(&request).await.map(Json)
}

pub(crate) async fn get_view_statistics(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<ViewStatistics>> {
    let unit_filter = non_empty(query.unit_filter).map(GroupId::from);
    let date = parse_date(query.date)?;
    state
        .statistics
        .view_statistics(unit_filter.as_ref(), date)
        .await
        .map(Json)
}

pub(crate) async fn get_date_filters(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<DateKindQuery>,
) -> Result<Json<DatesResponse>> {
    let kind: DateFilterKind = non_empty(query.kind)
        .ok_or_else(|| common::missing_parameter("type"))?
        .parse()?;
    let dates = state.statistics.date_filters(kind).await?;
    Ok(Json(DatesResponse { dates }))
}

pub(crate) async fn get_unit_filters(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<UnitsResponse>> {
    let date = parse_date(query.date)?;
    let units = state.statistics.unit_filters(date).await?;
    Ok(Json(UnitsResponse { units }))
}

pub(crate) async fn assign_group(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<AssignmentOutcome>> {
    let body: AssignGroupBody = parse_body(&body)?;
    let task_id = non_empty(body.task_id).ok_or_else(|| common::missing_parameter("taskId"))?;
    let group_id =
        non_empty(body.group_id).ok_or_else(|| common::missing_parameter("groupId"))?;
    let is_count_grow = match body.is_count_grow {
        Some(serde_json::Value::Bool(flag)) => flag,
        Some(_) => {
            return Err(common::malformed_parameter(
                "isCountGrow",
                "expected a boolean",
            ))
        }
        None => return Err(common::missing_parameter("isCountGrow")),
    };

    state
        .assignment
        .assign_group(
            &TaskId::from(task_id),
            &GroupId::from(group_id),
            is_count_grow,
        )
        .await
        .map(Json)
}

pub(crate) async fn get_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Task>> {
    let date = parse_date(query.date)?;
    state.tasks.get_by_id(&TaskId::from(id), date).await.map(Json)
}

pub(crate) async fn get_tasks_by_parent(
    State(state): State<Arc<ApiState>>,
    Path(parent_id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<TasksResponse>> {
    let date = parse_date(query.date)?;
    let tasks = state
        .tasks
        .get_children(&TaskId::from(parent_id), date)
        .await?;
    Ok(Json(TasksResponse { tasks }))
}

pub(crate) async fn get_tasks_by_type(
    State(state): State<Arc<ApiState>>,
    Path(task_type): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<TasksResponse>> {
    let date = parse_date(query.date)?;
    let tasks = state.tasks.get_by_type(&task_type, date).await?;
    Ok(Json(TasksResponse { tasks }))
}

pub(crate) async fn create_task(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<Task>> {
    let envelope: TaskEnvelope<NewTask> = parse_body(&body)?;
    reject_duplicate_groups(envelope.task.duplicate_group())?;
    if envelope.task.parent.is_none() && !envelope.task.groups.is_empty() {
        return Err(common::parentless_task(&envelope.task.name));
    }
    let created = state.tasks.create(&envelope.task).await?;
    info!("Created task {} ({})", created.id, created.name);
    Ok(Json(created))
}

pub(crate) async fn update_task(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<Task>> {
    let envelope: TaskEnvelope<Task> = parse_body(&body)?;
    reject_duplicate_groups(envelope.task.duplicate_group())?;
    if envelope.task.is_root() && !envelope.task.groups.is_empty() {
        return Err(common::parentless_task(envelope.task.id.as_str()));
    }
    state.tasks.update(&envelope.task).await.map(Json)
}

pub(crate) async fn delete_task(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>> {
    let id = TaskId::from(id);
    let task = state.tasks.get_by_id(&id, None).await?;
    if task.sub_tasks_count > 0 {
        return Err(BrainError::bad_request_with_code(
            ErrorCode::BAD_REQUEST_TASK_HAS_CHILDREN,
            format!(
                "Task '{}' still has {} sub-task(s) and cannot be deleted",
                id, task.sub_tasks_count
            ),
        ));
    }
    let deleted = state.tasks.delete_by_id(&id).await?;
    info!("Deleted task {}", deleted.id);
    Ok(Json(deleted))
}

pub(crate) async fn get_group(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Group>> {
    let date = parse_date(query.date)?;
    state.groups.get_by_id(&GroupId::from(id), date).await.map(Json)
}

pub(crate) async fn get_group_children(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<GroupsResponse>> {
    let date = parse_date(query.date)?;
    let groups = state
        .groups
        .get_children(&GroupId::from(id), date)
        .await?;
    Ok(Json(GroupsResponse { groups }))
}
