use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::EndpointRateLimiter;

/// The shared application state.
///
/// Cloneable handle passed to every handler via Axum's state extraction:
/// the SQLite pool, the parsed configuration, usage counters, and the
/// per-endpoint rate limiter.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Arc<AppConfig>,
    pub metrics: Metrics,
    pub rate_limiter: EndpointRateLimiter,
}

impl AppState {
    /// Builds the state with the default per-endpoint rate limits:
    /// login and registration are throttled hard (credential stuffing),
    /// everything else rides the global limiter only.
    pub fn new(db: sqlx::SqlitePool, config: AppConfig) -> Self {
        let rate_limiter = EndpointRateLimiter::new().with_limits(vec![
            ("/login", 20, 60),  // 20 login attempts per minute
            ("/users", 10, 60),  // 10 registrations per minute
        ]);

        Self { db, config: Arc::new(config), metrics: Metrics::new(), rate_limiter }
    }
}
