use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

// Health check endpoint - lightweight, no auth, no rate limiting
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Readiness probe: checks DB connectivity with timeout protection
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let query = sqlx::query("SELECT 1").fetch_one(&state.db);
    match tokio::time::timeout(std::time::Duration::from_secs(5), query).await {
        Ok(Ok(_)) => (StatusCode::OK, "ready").into_response(),
        Ok(Err(e)) => (StatusCode::SERVICE_UNAVAILABLE, format!("not ready: {}", e)).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready: timeout").into_response(),
    }
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.get_snapshot();
    Json(snapshot)
}

// Prometheus-compatible text exposition format
pub async fn metrics_prometheus(State(state): State<AppState>) -> impl IntoResponse {
    let m = state.metrics.get_snapshot();
    let body = format!(
        "# HELP ocitrack_users_registered Total users registered\n# TYPE ocitrack_users_registered counter\nocitrack_users_registered {}\n\
# HELP ocitrack_logins_succeeded Successful logins\n# TYPE ocitrack_logins_succeeded counter\nocitrack_logins_succeeded {}\n\
# HELP ocitrack_logins_failed Failed logins\n# TYPE ocitrack_logins_failed counter\nocitrack_logins_failed {}\n\
# HELP ocitrack_applications_created Applications created\n# TYPE ocitrack_applications_created counter\nocitrack_applications_created {}\n\
# HELP ocitrack_applications_updated Applications updated\n# TYPE ocitrack_applications_updated counter\nocitrack_applications_updated {}\n\
# HELP ocitrack_applications_deleted Applications deleted\n# TYPE ocitrack_applications_deleted counter\nocitrack_applications_deleted {}\n\
# HELP ocitrack_stats_computed Cohort summaries computed\n# TYPE ocitrack_stats_computed counter\nocitrack_stats_computed {}\n\
# HELP ocitrack_uptime_seconds Uptime seconds\n# TYPE ocitrack_uptime_seconds gauge\nocitrack_uptime_seconds {}\n",
        m.users_registered,
        m.logins_succeeded,
        m.logins_failed,
        m.applications_created,
        m.applications_updated,
        m.applications_deleted,
        m.stats_computed,
        m.uptime_seconds,
    );
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
