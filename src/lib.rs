//! # Receptor
//!
//! Task-submission API gateway in front of a distributed scheduling store.
//!
//! This library provides:
//! - An HTTP API to register tasks exactly once under a caller-chosen guid
//! - Read endpoints exposing each task's lifecycle state for polling
//! - A typed client for that API
//!
//! ## Architecture
//!
//! ```text
//!   request ──▶ auth gate ──▶ validation ──▶ TaskRegistry ─────┐
//!                                        └─▶ LifecycleQuery ───┤
//!                                                              ▼
//!                                                    StoreClient (trait)
//!                                                     ├─ InMemoryStore
//!                                                     └─ SqliteStore
//! ```
//!
//! The gateway keeps no task state of its own. Uniqueness of a task guid
//! rests on the store's atomic create-if-absent, so it only holds when the
//! store offers that operation linearizably per key.
//!
//! ## Modules
//! - `api`: routes, auth gate, request/response types
//! - `registry`: task creation and point reads
//! - `query`: task listings
//! - `store`: store client contract and backends
//! - `task`: task record, actions, validation
//! - `error`: error taxonomy and wire mapping
//! - `client`: HTTP client

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod registry;
pub mod store;
pub mod task;

pub use client::{ClientError, ReceptorClient};
pub use config::Config;
pub use error::{ApiError, ErrorKind};
pub use query::{LifecycleQuery, TaskFilter};
pub use registry::TaskRegistry;
pub use store::{InMemoryStore, SqliteStore, StoreClient};
