mod common;

use async_trait::async_trait;
use brain_service::assignment::AssignmentService;
use brain_service::clients::memory::CounterCall;
use brain_service::clients::{GroupDirectory, InMemoryGroupDirectory};
use brain_service::error::{ErrorCode, Result};
use brain_service::model::{
    DateFilter, Group, GroupId, ManyGroups, TaskGroup, TaskId, UnitOption, UnitSums,
};
use common::*;
use std::sync::Arc;

fn service(
    groups: &Arc<brain_service::clients::InMemoryGroupDirectory>,
    tasks: &Arc<brain_service::clients::InMemoryTaskDirectory>,
) -> AssignmentService {
    AssignmentService::new(groups.clone(), tasks.clone())
}

fn group_ids(ids: &[&str]) -> Vec<GroupId> {
    ids.iter().map(|id| GroupId::from(*id)).collect()
}

#[tokio::test]
async fn test_add_then_remove_round_trip() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);
    let task_id = TaskId::from(TASK);

    let added = assignment
        .assign_group(&task_id, &"g".into(), true)
        .await
        .unwrap();
    assert_eq!(ids(&added.groups), vec!["g", "u2", "u1"]);
    assert_eq!(
        added.groups,
        vec![
            TaskGroup::clicked("g", "G"),
            TaskGroup::implied("u2", "U2"),
            TaskGroup::implied("u1", "U1"),
        ]
    );
    for id in ["u1", "u2", "g"] {
        assert_eq!(groups.group(&id.into()).await.unwrap().assigned_count, 1);
    }

    let removed = assignment
        .assign_group(&task_id, &"g".into(), false)
        .await
        .unwrap();
    assert!(removed.groups.is_empty());
    assert!(tasks.task(&task_id).await.unwrap().groups.is_empty());
    for id in ["u1", "u2", "g"] {
        assert_eq!(groups.group(&id.into()).await.unwrap().assigned_count, 0);
    }

    assert_eq!(
        groups.counter_calls().await,
        vec![
            CounterCall {
                ids: group_ids(&["g", "u2", "u1"]),
                delta: 1,
            },
            CounterCall {
                ids: group_ids(&["g", "u2", "u1"]),
                delta: -1,
            },
        ]
    );
}

#[tokio::test]
async fn test_repeated_add_issues_no_counter_update() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);
    let task_id = TaskId::from(TASK);

    let first = assignment
        .assign_group(&task_id, &"g".into(), true)
        .await
        .unwrap();
    let second = assignment
        .assign_group(&task_id, &"g".into(), true)
        .await
        .unwrap();

    assert_eq!(first.groups, second.groups);
    assert!(second.added.is_empty());
    assert_eq!(groups.counter_calls().await.len(), 1);
    assert_eq!(tasks.update_calls().await.len(), 1);
}

#[tokio::test]
async fn test_removing_one_sibling_keeps_parent_and_other_sibling() {
    let tree = vec![
        task(ROOT_TASK, None, Vec::new()),
        task(
            TASK,
            Some(ROOT_TASK),
            vec![
                TaskGroup::clicked("s1", "S1"),
                TaskGroup::implied("a", "A"),
                TaskGroup::implied("s2", "S2"),
            ],
        ),
    ];
    let (groups, tasks) = directories(siblings(), tree);
    let assignment = service(&groups, &tasks);

    let outcome = assignment
        .assign_group(&TASK.into(), &"s2".into(), false)
        .await
        .unwrap();

    assert_eq!(ids(&outcome.groups), vec!["s1", "a"]);
    assert_eq!(outcome.removed, group_ids(&["s2"]));
    assert_eq!(ids(&outcome.clicked), vec!["s1"]);
    assert_eq!(
        groups.counter_calls().await,
        vec![CounterCall {
            ids: group_ids(&["s2"]),
            delta: -1,
        }]
    );
}

#[tokio::test]
async fn test_root_task_is_rejected_either_way() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);

    for grow in [true, false] {
        let err = assignment
            .assign_group(&ROOT_TASK.into(), &"g".into(), grow)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::BAD_REQUEST_PARENTLESS_TASK);
    }
    assert!(groups.counter_calls().await.is_empty());
    assert!(tasks.update_calls().await.is_empty());
}

#[tokio::test]
async fn test_removing_unassigned_group_is_bad_request() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);

    let err = assignment
        .assign_group(&TASK.into(), &"g".into(), false)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BAD_REQUEST_GROUP_NOT_ASSIGNED);
}

#[tokio::test]
async fn test_unknown_task_and_group_are_not_found() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);

    let err = assignment
        .assign_group(&"nope".into(), &"g".into(), true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NOT_FOUND_TASK);

    let err = assignment
        .assign_group(&TASK.into(), &"nope".into(), true)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NOT_FOUND_GROUP);
}

#[tokio::test]
async fn test_counter_failure_leaves_task_untouched() {
    let (groups, tasks) = directories(chain(), task_tree());
    groups.fail_counter_updates(true).await;
    let assignment = service(&groups, &tasks);

    let err = assignment
        .assign_group(&TASK.into(), &"g".into(), true)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::INTERNAL_COUNTER_UPDATE_FAILED);
    assert!(!err.is_partial_write());
    assert!(tasks.update_calls().await.is_empty());
    assert!(tasks.task(&TASK.into()).await.unwrap().groups.is_empty());
}

#[tokio::test]
async fn test_persist_failure_after_counter_is_partial_write() {
    let (groups, tasks) = directories(chain(), task_tree());
    tasks.fail_updates(true).await;
    let assignment = service(&groups, &tasks);

    let err = assignment
        .assign_group(&TASK.into(), &"g".into(), true)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::INTERNAL_PERSIST_AFTER_COUNTER);
    assert!(err.is_partial_write());
    assert_eq!(err.status_code().as_u16(), 500);
    // the counters moved even though the task did not
    assert_eq!(groups.counter_calls().await.len(), 1);
    assert_eq!(groups.group(&"g".into()).await.unwrap().assigned_count, 1);
    assert_eq!(tasks.update_calls().await.len(), 1);
}

#[tokio::test]
async fn test_groups_never_hold_duplicates() {
    let (groups, tasks) = directories(chain(), task_tree());
    let assignment = service(&groups, &tasks);
    let task_id = TaskId::from(TASK);

    for (id, grow) in [("u2", true), ("g", true), ("u1", true), ("g", false), ("g", true)] {
        assignment
            .assign_group(&task_id, &id.into(), grow)
            .await
            .unwrap();
        let task = tasks.task(&task_id).await.unwrap();
        assert_eq!(task.duplicate_group(), None, "after toggling {}", id);
    }
}

/// A group directory that answers bulk lookups in reverse request order
struct ReversingGroups(InMemoryGroupDirectory);

#[async_trait]
impl GroupDirectory for ReversingGroups {
    async fn get_by_id(&self, id: &GroupId, date: Option<DateFilter>) -> Result<Group> {
        self.0.get_by_id(id, date).await
    }

    async fn get_many_by_ids(
        &self,
        ids: &[GroupId],
        date: Option<DateFilter>,
    ) -> Result<ManyGroups> {
        let mut many = self.0.get_many_by_ids(ids, date).await?;
        let requested: Vec<&GroupId> = ids.iter().collect();
        many.groups.sort_by_key(|g| {
            std::cmp::Reverse(requested.iter().position(|id| **id == g.id))
        });
        Ok(many)
    }

    async fn get_children(&self, parent: &GroupId, date: Option<DateFilter>) -> Result<Vec<Group>> {
        self.0.get_children(parent, date).await
    }

    async fn get_all_descendants(
        &self,
        parent: &GroupId,
        date: Option<DateFilter>,
    ) -> Result<Vec<Group>> {
        self.0.get_all_descendants(parent, date).await
    }

    async fn get_unit_sums(
        &self,
        unit_names: &[String],
        date: Option<DateFilter>,
    ) -> Result<Vec<UnitSums>> {
        self.0.get_unit_sums(unit_names, date).await
    }

    async fn get_main_groups_sum(
        &self,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<f64> {
        self.0.get_main_groups_sum(unit_filter, date).await
    }

    async fn get_units(&self, date: Option<DateFilter>) -> Result<Vec<UnitOption>> {
        self.0.get_units(date).await
    }

    async fn increment_assigned_count(&self, ids: &[GroupId], delta: i64) -> Result<()> {
        self.0.increment_assigned_count(ids, delta).await
    }

    async fn available_dates(&self) -> Result<Vec<DateFilter>> {
        self.0.available_dates().await
    }
}

#[tokio::test]
async fn test_ancestor_order_does_not_depend_on_bulk_lookup_order() {
    // root -> mid -> low -> t, with mid selected and t selected below it
    let lineage = vec![
        group("root", &[], &["mid"], 40.0),
        group("mid", &["root"], &["low"], 30.0),
        group("low", &["root", "mid"], &["t"], 20.0),
        group("t", &["root", "mid", "low"], &[], 10.0),
    ];
    let linked = vec![
        TaskGroup::clicked("mid", "MID"),
        TaskGroup::implied("root", "ROOT"),
        TaskGroup::clicked("t", "T"),
        TaskGroup::implied("low", "LOW"),
    ];
    let mut tree = task_tree();
    tree[1].groups = linked;

    let groups = Arc::new(ReversingGroups(
        InMemoryGroupDirectory::new().with_groups(lineage),
    ));
    let tasks = Arc::new(brain_service::clients::InMemoryTaskDirectory::new().with_tasks(tree));
    let assignment = AssignmentService::new(groups, tasks.clone());

    let outcome = assignment
        .assign_group(&TASK.into(), &"t".into(), false)
        .await
        .unwrap();

    assert_eq!(ids(&outcome.groups), vec!["mid", "root", "low"]);
    assert_eq!(outcome.removed, group_ids(&["t"]));
}
