//! Integration and unit tests for the OCItrack backend.
//!
//! ## Test Modules
//!
//! - **api_tests**: Health, registration, login, and account endpoints
//! - **applications_tests**: Application CRUD, ownership, and derived columns
//! - **stats_tests**: Cohort aggregation math (medians, funnel, windows)
//! - **auth_tests**: Password hashing and token issuance
//! - **db_tests**: Schema initialization, migrations, and cascades
//! - **config_tests**: Configuration defaults and validation
//!
//! Run with `cargo test`, or a single module with e.g.
//! `cargo test applications_tests`.

pub mod support;

pub mod applications_tests;
pub mod stats_tests;
