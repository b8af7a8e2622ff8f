//! HTTP API: credential middleware, per-route operation guards, navigation and
//! permission administration endpoints.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
