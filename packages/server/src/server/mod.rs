//! HTTP server: router, routes, entry point wiring.

pub mod app;
pub mod routes;

pub use app::{build_app, AppState};
