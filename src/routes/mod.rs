//! HTTP route handlers.
//!
//! - [`health`]: liveness/readiness probes, metrics, build info
//! - [`auth`]: login and token issuance
//! - [`users`]: registration and account management
//! - [`profiles`]: the per-user profile record
//! - [`applications`]: application CRUD plus cohort statistics

pub mod applications;
pub mod auth;
pub mod health;
pub mod profiles;
pub mod users;
