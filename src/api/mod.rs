//! HTTP API for receptor.
//!
//! ## Endpoints
//!
//! - `POST /tasks` - Register a new task (202, empty body)
//! - `GET /tasks?domain=<d>&state=<s>` - List tasks, optionally filtered
//! - `GET /tasks/{task_guid}` - Get one task
//!
//! All routes sit behind HTTP Basic auth unless both configured credentials
//! are empty. Errors are returned as `{"type": ..., "message": ...}`.

pub mod auth;
mod routes;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
