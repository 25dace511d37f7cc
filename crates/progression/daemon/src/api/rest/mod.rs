//! REST API

pub mod actor;
pub mod handlers;
pub mod router;
pub mod state;
