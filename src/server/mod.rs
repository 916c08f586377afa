//! HTTP surface consumed by the UI

mod handlers;
pub mod response;

pub use response::ErrorBody;

use crate::assignment::AssignmentService;
use crate::clients::{GroupDirectory, TaskDirectory};
use crate::statistics::StatisticsService;
use anyhow::{Context, Result};
use axum::{
    routing::{get, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state of every handler
pub(crate) struct ApiState {
    pub(crate) statistics: Arc<StatisticsService>,
    pub(crate) assignment: Arc<AssignmentService>,
    pub(crate) tasks: Arc<dyn TaskDirectory>,
    pub(crate) groups: Arc<dyn GroupDirectory>,
}

pub struct ApiServer {
    state: Arc<ApiState>,
}

impl ApiServer {
    pub fn new(
        statistics: Arc<StatisticsService>,
        assignment: Arc<AssignmentService>,
        tasks: Arc<dyn TaskDirectory>,
        groups: Arc<dyn GroupDirectory>,
    ) -> Self {
        Self {
            state: Arc::new(ApiState {
                statistics,
                assignment,
                tasks,
                groups,
            }),
        }
    }

    /// Bind `addr` and serve until ctrl-c
    pub async fn start(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Starting brain-service API on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("API server terminated unexpectedly")?;

        info!("brain-service API stopped");
        Ok(())
    }

    /// Serve on an already bound listener until the task is dropped
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router())
            .await
            .context("API server terminated unexpectedly")
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/health", get(handlers::health_check))
            .route("/api/statistics/view", get(handlers::get_view_statistics))
            .route(
                "/api/statistics/{task_id}",
                get(handlers::get_statistics),
            )
            .route("/api/filters/dates", get(handlers::get_date_filters))
            .route("/api/filters/units", get(handlers::get_unit_filters))
            .route("/api/task/assign-group", put(handlers::assign_group))
            .route(
                "/api/task",
                put(handlers::update_task).post(handlers::create_task),
            )
            .route(
                "/api/task/parent/{parent_id}",
                get(handlers::get_tasks_by_parent),
            )
            .route(
                "/api/task/type/{task_type}",
                get(handlers::get_tasks_by_type),
            )
            .route(
                "/api/task/{id}",
                get(handlers::get_task).delete(handlers::delete_task),
            )
            .route("/api/group/{id}", get(handlers::get_group))
            .route(
                "/api/group/parent/{id}",
                get(handlers::get_group_children),
            )
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
