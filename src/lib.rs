//! # brain-service
//!
//! Backend-for-frontend that joins the task directory and the group
//! directory into view-ready statistics, and keeps a task's group list and
//! the groups' assignment counters in step when a group is toggled.
//!
//! ## Modules
//!
//! - `app` - Process wiring: logging, service construction, fatal errors
//! - `assignment` - Group assignment planning and the counter/persist saga
//! - `clients` - Directory ports with HTTP and in-memory adapters
//! - `config` - Layered service configuration
//! - `error` - Error type with stable numeric codes
//! - `model` - Tasks, groups and date filters as the directories report them
//! - `server` - Axum routes and error responses
//! - `statistics` - Relative contributions, reports and view trees
pub mod app;
pub mod assignment;
pub mod clients;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod statistics;
