//! reqwest adapters for the task and group directories

use super::{GroupDirectory, TaskDirectory};
use crate::error::{common, BrainError, ErrorCode, ErrorExt, Result};
use crate::model::{
    order_by_requested, DateFilter, Group, GroupId, ManyGroups, NewTask, Task, TaskId,
    UnitOption, UnitSums,
};
use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Shared HTTP plumbing for one upstream service
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base: Url,
    service: &'static str,
}

impl UpstreamClient {
    /// `base` is the service root plus the collection prefix, e.g.
    /// `http://groups:3002/api/group`
    pub fn new(service: &'static str, base: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base).map_err(|e| {
            BrainError::config_with_code(
                ErrorCode::CONFIG_INVALID_URL,
                format!("Invalid {} service URL '{}'", service, base),
            )
            .with_source(e)
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .to_config_error("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base,
            service,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Build `{base}/{segments...}` with an optional `date` query parameter
    pub fn url(&self, segments: &[&str], date: Option<DateFilter>) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BrainError::config_with_code(
                    ErrorCode::CONFIG_INVALID_URL,
                    format!("{} service URL cannot carry a path", self.service),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        if let Some(date) = date {
            url.query_pairs_mut().append_pair("date", &date.to_string());
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.send::<(), T>(Method::GET, url, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, url: Url, body: &B) -> Result<T> {
        self.send(Method::PUT, url, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.send::<(), T>(Method::DELETE, url, None).await
    }

    /// Like `put`, for endpoints whose body the caller does not need
    pub async fn put_discarding<B: Serialize>(&self, url: Url, body: &B) -> Result<()> {
        let response = self.dispatch(Method::PUT, url, Some(body)).await?;
        self.check_status(response).await.map(|_| ())
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.dispatch(method, url, body).await?;
        let response = self.check_status(response).await?;
        response.json::<T>().await.map_err(|e| {
            BrainError::upstream(
                ErrorCode::UPSTREAM_DECODE,
                self.service,
                None,
                format!("Unexpected response body from {} service", self.service),
            )
            .with_source(e)
        })
    }

    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        debug!("{} {} ({} service)", method, url, self.service);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| {
            BrainError::upstream(
                ErrorCode::UPSTREAM_UNREACHABLE,
                self.service,
                None,
                format!("{} service is unreachable", self.service),
            )
            .with_source(e)
        })
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        trace!("{} service answered {}", self.service, status);
        match status {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => {
                let path = response.url().path().to_string();
                Err(BrainError::not_found_with_code(
                    ErrorCode::NOT_FOUND_GENERIC,
                    format!("{} service has no resource at {}", self.service, path),
                    Some(path),
                ))
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(BrainError::upstream(
                    ErrorCode::UPSTREAM_STATUS,
                    self.service,
                    Some(status.as_u16()),
                    format!("{} service error {}: {}", self.service, status, error_text),
                ))
            }
        }
    }
}

/// List payloads arrive either bare or wrapped under a collection key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped(Wrapped<T>),
}

#[derive(Debug, Deserialize)]
struct Wrapped<T> {
    #[serde(alias = "tasks", alias = "groups", alias = "units", alias = "dates")]
    items: Vec<T>,
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped(w) => w.items,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeopleSum {
    #[serde(default)]
    people_sum: f64,
}

#[derive(Debug, Serialize)]
struct IdsBody<'a> {
    ids: &'a [GroupId],
}

#[derive(Debug, Serialize)]
struct CounterBody<'a> {
    ids: &'a [GroupId],
    delta: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnitsBody<'a> {
    units_names: &'a [String],
}

#[derive(Debug, Serialize)]
struct TaskBody<'a, T: Serialize> {
    task: &'a T,
}

/// Narrow a generic 404 to the resource the caller asked for
fn rename_not_found<T>(result: Result<T>, not_found: impl FnOnce() -> BrainError) -> Result<T> {
    match result {
        Err(BrainError::NotFound { .. }) => Err(not_found()),
        other => other,
    }
}

/// Group directory over HTTP, rooted at `{group_service_url}/api/group`
#[derive(Debug, Clone)]
pub struct HttpGroupDirectory {
    upstream: UpstreamClient,
}

impl HttpGroupDirectory {
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self> {
        let base = format!("{}/api/group", service_url.trim_end_matches('/'));
        Ok(Self {
            upstream: UpstreamClient::new("group", &base, timeout)?,
        })
    }
}

#[async_trait]
impl GroupDirectory for HttpGroupDirectory {
    async fn get_by_id(&self, id: &GroupId, date: Option<DateFilter>) -> Result<Group> {
        let url = self.upstream.url(&[id.as_str()], date)?;
        rename_not_found(self.upstream.get(url).await, || {
            common::group_not_found(id.as_str())
        })
    }

    async fn get_many_by_ids(
        &self,
        ids: &[GroupId],
        date: Option<DateFilter>,
    ) -> Result<ManyGroups> {
        let url = self.upstream.url(&[""], date)?;
        let mut many: ManyGroups = self.upstream.post(url, &IdsBody { ids }).await?;
        many.groups = order_by_requested(ids, many.groups);
        Ok(many)
    }

    async fn get_children(&self, parent: &GroupId, date: Option<DateFilter>) -> Result<Vec<Group>> {
        let url = self.upstream.url(&["children", parent.as_str()], date)?;
        let listing: Listing<Group> = rename_not_found(self.upstream.get(url).await, || {
            common::group_not_found(parent.as_str())
        })?;
        Ok(listing.into_vec())
    }

    async fn get_all_descendants(
        &self,
        parent: &GroupId,
        date: Option<DateFilter>,
    ) -> Result<Vec<Group>> {
        let url = self.upstream.url(&["allChildren", parent.as_str()], date)?;
        let listing: Listing<Group> = rename_not_found(self.upstream.get(url).await, || {
            common::group_not_found(parent.as_str())
        })?;
        Ok(listing.into_vec())
    }

    async fn get_unit_sums(
        &self,
        unit_names: &[String],
        date: Option<DateFilter>,
    ) -> Result<Vec<UnitSums>> {
        let url = self.upstream.url(&["unit"], date)?;
        let listing: Listing<UnitSums> = self
            .upstream
            .post(url, &UnitsBody { units_names: unit_names })
            .await?;
        Ok(listing.into_vec())
    }

    async fn get_main_groups_sum(
        &self,
        unit_filter: Option<&GroupId>,
        date: Option<DateFilter>,
    ) -> Result<f64> {
        let mut url = self.upstream.url(&["sum"], date)?;
        if let Some(unit) = unit_filter {
            url.query_pairs_mut().append_pair("unit", unit.as_str());
        }
        let sum: PeopleSum = self.upstream.get(url).await?;
        Ok(sum.people_sum)
    }

    async fn get_units(&self, date: Option<DateFilter>) -> Result<Vec<UnitOption>> {
        let url = self.upstream.url(&["units"], date)?;
        let listing: Listing<UnitOption> = self.upstream.get(url).await?;
        Ok(listing.into_vec())
    }

    async fn increment_assigned_count(&self, ids: &[GroupId], delta: i64) -> Result<()> {
        let url = self.upstream.url(&[""], None)?;
        self.upstream
            .put_discarding(url, &CounterBody { ids, delta })
            .await
    }

    async fn available_dates(&self) -> Result<Vec<DateFilter>> {
        let url = self.upstream.url(&["dates"], None)?;
        let listing: Listing<DateFilter> = self.upstream.get(url).await?;
        Ok(listing.into_vec())
    }
}

/// Task directory over HTTP, rooted at `{task_service_url}/task`
#[derive(Debug, Clone)]
pub struct HttpTaskDirectory {
    upstream: UpstreamClient,
}

impl HttpTaskDirectory {
    pub fn new(service_url: &str, timeout: Duration) -> Result<Self> {
        let base = format!("{}/task", service_url.trim_end_matches('/'));
        Ok(Self {
            upstream: UpstreamClient::new("task", &base, timeout)?,
        })
    }
}

#[async_trait]
impl TaskDirectory for HttpTaskDirectory {
    async fn get_by_id(&self, id: &TaskId, date: Option<DateFilter>) -> Result<Task> {
        let url = self.upstream.url(&[id.as_str()], date)?;
        rename_not_found(self.upstream.get(url).await, || {
            common::task_not_found(id.as_str())
        })
    }

    async fn get_children(&self, parent: &TaskId, date: Option<DateFilter>) -> Result<Vec<Task>> {
        let url = self.upstream.url(&["parent", parent.as_str()], date)?;
        let listing: Listing<Task> = self.upstream.get(url).await?;
        Ok(listing.into_vec())
    }

    async fn get_by_type(&self, task_type: &str, date: Option<DateFilter>) -> Result<Vec<Task>> {
        let url = self.upstream.url(&["type", task_type], date)?;
        let listing: Listing<Task> = self.upstream.get(url).await?;
        Ok(listing.into_vec())
    }

    async fn get_descendants_by_depth(
        &self,
        id: &TaskId,
        depth: Option<u32>,
        date: Option<DateFilter>,
    ) -> Result<Vec<Task>> {
        let depth_text = depth.map(|d| d.to_string());
        let url = match depth_text.as_deref() {
            Some(d) => self
                .upstream
                .url(&[id.as_str(), "children", "depth", d], date)?,
            None => self.upstream.url(&[id.as_str(), "children"], date)?,
        };
        let listing: Listing<Task> = rename_not_found(self.upstream.get(url).await, || {
            common::task_not_found(id.as_str())
        })?;
        Ok(listing.into_vec())
    }

    async fn create(&self, task: &NewTask) -> Result<Task> {
        let url = self.upstream.url(&[""], None)?;
        self.upstream.post(url, &TaskBody { task }).await
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        let url = self.upstream.url(&[""], None)?;
        rename_not_found(self.upstream.put(url, &TaskBody { task }).await, || {
            common::task_not_found(task.id.as_str())
        })
    }

    async fn delete_by_id(&self, id: &TaskId) -> Result<Task> {
        let url = self.upstream.url(&[id.as_str()], None)?;
        rename_not_found(self.upstream.delete(url).await, || {
            common::task_not_found(id.as_str())
        })
    }

    async fn available_dates(&self) -> Result<Vec<DateFilter>> {
        let url = self.upstream.url(&["dates"], None)?;
        let listing: Listing<DateFilter> = self.upstream.get(url).await?;
        Ok(listing.into_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        UpstreamClient::new("group", base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_building_appends_segments_and_date() {
        let upstream = client("http://groups:3002/api/group");
        let url = upstream
            .url(&["children", "g1"], DateFilter::new(2020, 9))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://groups:3002/api/group/children/g1?date=2020-09"
        );
    }

    #[test]
    fn test_url_building_escapes_ids() {
        let upstream = client("http://groups:3002/api/group/");
        let url = upstream.url(&["a b"], None).unwrap();
        assert_eq!(url.as_str(), "http://groups:3002/api/group/a%20b");
    }

    #[test]
    fn test_collection_root_url() {
        let upstream = client("http://tasks:3001/task");
        let url = upstream.url(&[""], None).unwrap();
        assert_eq!(url.as_str(), "http://tasks:3001/task/");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = UpstreamClient::new("task", "not a url", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CONFIG_INVALID_URL);
    }

    #[test]
    fn test_listing_accepts_bare_and_wrapped_payloads() {
        let bare: Listing<String> = serde_json::from_str(r#"["2020-01"]"#).unwrap();
        assert_eq!(bare.into_vec(), vec!["2020-01".to_string()]);

        let wrapped: Listing<String> = serde_json::from_str(r#"{"dates":["2020-02"]}"#).unwrap();
        assert_eq!(wrapped.into_vec(), vec!["2020-02".to_string()]);

        let tasks: Listing<String> = serde_json::from_str(r#"{"tasks":[]}"#).unwrap();
        assert!(tasks.into_vec().is_empty());
    }
}
