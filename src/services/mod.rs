//! Business logic services.

pub mod account;
pub mod upload;

pub use account::configure_routes as configure_account_routes;
pub use upload::configure_routes as configure_upload_routes;
