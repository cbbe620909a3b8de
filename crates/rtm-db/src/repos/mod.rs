//! Repository modules implementing store operations for all RTM entities.
//!
//! Each module adds methods to `RtmService` via `impl RtmService` blocks.
//! Row-level helpers take a `&libsql::Connection` so they run unchanged inside
//! a transaction (`libsql::Transaction` derefs to `Connection`).

pub mod api_endpoint;
pub mod attachment;
pub mod audit;
pub mod component;
pub mod nodes;
pub mod project;
pub mod requirement;
