//! Progression daemon library
//!
//! REST binding for the academy progression orchestrator:
//! - configuration layering (defaults, file, `PROGRESSION_*` environment)
//! - REST handlers under `/api/v1`
//! - server lifecycle with graceful shutdown

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, DaemonResult};
pub use server::Server;
