mod common;

use brain_service::app::build_server;
use brain_service::clients::{InMemoryGroupDirectory, InMemoryTaskDirectory};
use brain_service::config::ServiceConfig;
use brain_service::error::ErrorCode;
use brain_service::server::ErrorBody;
use brain_service::statistics::MajorTask;
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

struct TestServer {
    base: String,
    client: reqwest::Client,
    groups: Arc<InMemoryGroupDirectory>,
    tasks: Arc<InMemoryTaskDirectory>,
}

impl TestServer {
    async fn start() -> Self {
        let (groups, tasks) = directories(chain(), task_tree());
        let config = ServiceConfig {
            major_tasks: vec![MajorTask::new("Main", ROOT_TASK, "Main", None)],
            ..ServiceConfig::default()
        };
        let server = build_server(&config, groups.clone(), tasks.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));

        Self {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            groups,
            tasks,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn assign(&self, body: Value) -> reqwest::Response {
        self.client
            .put(self.url("/api/task/assign-group"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await;
    let response = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "alive");
}

#[tokio::test]
async fn test_assign_group_over_http() {
    let server = TestServer::start().await;

    let response = server
        .assign(json!({"taskId": TASK, "groupId": "g", "isCountGrow": true}))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let linked: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap())
        .collect();
    assert_eq!(linked, vec!["g", "u2", "u1"]);
    assert_eq!(body["groups"][0]["isClicked"], json!(true));
    assert_eq!(server.groups.counter_calls().await.len(), 1);
}

#[tokio::test]
async fn test_assign_group_validates_body() {
    let server = TestServer::start().await;

    let response = server.assign(json!({"taskId": TASK, "groupId": "g"})).await;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::PARAM_MISSING);

    let response = server
        .assign(json!({"taskId": TASK, "groupId": "g", "isCountGrow": "yes"}))
        .await;
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::PARAM_MALFORMED);

    let response = server
        .assign(json!({"taskId": ROOT_TASK, "groupId": "g", "isCountGrow": true}))
        .await;
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::BAD_REQUEST_PARENTLESS_TASK);
}

#[tokio::test]
async fn test_partial_write_is_a_server_error() {
    let server = TestServer::start().await;
    server.tasks.fail_updates(true).await;

    let response = server
        .assign(json!({"taskId": TASK, "groupId": "g", "isCountGrow": true}))
        .await;
    assert_eq!(response.status(), 500);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::INTERNAL_PERSIST_AFTER_COUNTER);
}

#[tokio::test]
async fn test_statistics_endpoint() {
    let server = TestServer::start().await;
    server
        .assign(json!({"taskId": TASK, "groupId": "g", "isCountGrow": true}))
        .await;

    let body: Value = reqwest::get(server.url("/api/statistics/R?type=Sum"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["categories"], json!(["G", "U2", "U1"]));
    assert_eq!(body["series"][0]["data"], json!([100.0, 200.0, 300.0]));

    let response = reqwest::get(server.url("/api/statistics/R")).await.unwrap();
    assert_eq!(response.status(), 400);

    let response = reqwest::get(server.url("/api/statistics/R?type=Pie"))
        .await
        .unwrap();
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::PARAM_UNKNOWN_STATISTICS_TYPE);

    let response = reqwest::get(server.url("/api/statistics/R?type=Sum&date=sept"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = reqwest::get(server.url("/api/statistics/missing?type=Sum"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_view_statistics_endpoint() {
    let server = TestServer::start().await;
    server
        .assign(json!({"taskId": TASK, "groupId": "g", "isCountGrow": true}))
        .await;

    let body: Value = reqwest::get(server.url("/api/statistics/view"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["fullSize"], json!(600.0));
    assert_eq!(body["mainFullSize"], json!(300.0));
    assert_eq!(body["Main"]["_id"], json!(ROOT_TASK));
    assert_eq!(body["Main"]["children"][0]["value"], json!(600.0));
}

#[tokio::test]
async fn test_task_proxy_routes() {
    let server = TestServer::start().await;

    let created: Value = server
        .client
        .post(server.url("/api/task"))
        .json(&json!({"task": {"parent": TASK, "name": "New", "groups": []}}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let new_id = created["_id"].as_str().unwrap().to_string();

    let children: Value = reqwest::get(server.url(&format!("/api/task/parent/{}", TASK)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(children["tasks"].as_array().unwrap().len(), 1);

    // T now has a child and cannot be deleted
    let response = server
        .client
        .delete(server.url(&format!("/api/task/{}", TASK)))
        .send()
        .await
        .unwrap();
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::BAD_REQUEST_TASK_HAS_CHILDREN);

    let response = server
        .client
        .delete(server.url(&format!("/api/task/{}", new_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let duplicate = json!({"task": {"name": "Dup", "groups": [
        {"id": "g", "name": "G", "isClicked": true},
        {"id": "g", "name": "G", "isClicked": false}
    ]}});
    let response = server
        .client
        .post(server.url("/api/task"))
        .json(&duplicate)
        .send()
        .await
        .unwrap();
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::PARAM_DUPLICATE_GROUP);
}

#[tokio::test]
async fn test_group_proxy_routes() {
    let server = TestServer::start().await;

    let group: Value = reqwest::get(server.url("/api/group/u2"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(group["name"], json!("U2"));

    let children: Value = reqwest::get(server.url("/api/group/parent/u1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(children["groups"][0]["kartoffelID"], json!("u2"));

    let response = reqwest::get(server.url("/api/group/none")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_tasks_by_type_route() {
    let server = TestServer::start().await;

    let response = server
        .client
        .post(server.url("/api/task"))
        .json(&json!({"task": {"parent": TASK, "name": "Typed", "type": "Wide", "groups": []}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let typed: Value = reqwest::get(server.url("/api/task/type/Wide"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let tasks = typed["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["name"], "Typed");
    assert_eq!(tasks[0]["type"], "Wide");

    let none: Value = reqwest::get(server.url("/api/task/type/Wrap"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(none["tasks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_parentless_task_cannot_carry_groups() {
    let server = TestServer::start().await;
    let linked = json!([{"id": "g", "name": "G", "isClicked": true}]);

    let response = server
        .client
        .post(server.url("/api/task"))
        .json(&json!({"task": {"parent": null, "name": "x", "groups": linked}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::BAD_REQUEST_PARENTLESS_TASK);

    let response = server
        .client
        .put(server.url("/api/task"))
        .json(&json!({"task": {"_id": ROOT_TASK, "parent": null, "name": "Root", "groups": linked}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, ErrorCode::BAD_REQUEST_PARENTLESS_TASK);
    assert!(server.tasks.update_calls().await.is_empty());
    assert!(server.tasks.task(&ROOT_TASK.into()).await.unwrap().groups.is_empty());

    // a root task without groups is still accepted
    let response = server
        .client
        .post(server.url("/api/task"))
        .json(&json!({"task": {"parent": null, "name": "Top", "groups": []}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
