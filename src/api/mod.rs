//! HTTP API handlers.

pub mod admin;
pub mod artifacts;
pub mod health;
pub mod openapi;
pub mod test_runs;

pub use admin::configure_routes as configure_admin_routes;
pub use artifacts::configure_routes as configure_artifact_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use test_runs::configure_routes as configure_run_routes;
