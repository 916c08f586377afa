//! Wiring of directories, services and the HTTP server

use crate::assignment::AssignmentService;
use crate::clients::{GroupDirectory, HttpGroupDirectory, HttpTaskDirectory, TaskDirectory};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::server::ApiServer;
use crate::statistics::StatisticsService;
use std::sync::Arc;
use tracing::{debug, info};

/// Build the server over the given directories
pub fn build_server(
    config: &ServiceConfig,
    groups: Arc<dyn GroupDirectory>,
    tasks: Arc<dyn TaskDirectory>,
) -> ApiServer {
    let statistics = StatisticsService::new(
        groups.clone(),
        tasks.clone(),
        config.fields.clone(),
        config.major_tasks.clone(),
        config.timeline_current_label.clone(),
    )
    .with_root_group(config.root_group_id.clone());
    let assignment = AssignmentService::new(groups.clone(), tasks.clone());

    debug!(
        "Field schema {} with {} major task(s)",
        config.fields.version,
        config.major_tasks.len()
    );
    ApiServer::new(Arc::new(statistics), Arc::new(assignment), tasks, groups)
}

/// Build the server over the HTTP directories named in `config`
pub fn build_http_server(config: &ServiceConfig) -> Result<ApiServer> {
    let groups = HttpGroupDirectory::new(&config.group_service_url, config.request_timeout)?;
    let tasks = HttpTaskDirectory::new(&config.task_service_url, config.request_timeout)?;
    info!(
        "Upstreams: tasks at {}, groups at {}",
        config.task_service_url, config.group_service_url
    );
    Ok(build_server(config, Arc::new(groups), Arc::new(tasks)))
}

/// Run the service until shutdown
pub async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let server = build_http_server(&config)?;
    server.start(addr).await
}
