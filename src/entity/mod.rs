//! SeaORM entity definitions for PostgreSQL database.

pub mod session;
pub mod test_artifact;
pub mod test_measurement;
pub mod test_result;
pub mod test_run;
pub mod user;
