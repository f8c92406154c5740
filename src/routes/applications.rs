use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::db;
use crate::error::{AppError, AppResult, OptionExt};
use crate::state::AppState;
use crate::stats::{self, FirmCohortRow};
use crate::types::{
    refresh_day_counts, tags_to_json, validate_stage_dates, validate_text_lengths, ApplicationCreate,
    ApplicationRow, ApplicationUpdate, ApplicationWithStats, MessageResponse,
};

const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

async fn get_owned_application(
    db: &sqlx::SqlitePool,
    user_id: Uuid,
    application_id: i64,
) -> AppResult<ApplicationRow> {
    let row: Option<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE application_id = ?1 AND user_id = ?2")
            .bind(application_id)
            .bind(user_id.to_string())
            .fetch_optional(db)
            .await?;
    row.ok_or_not_found("Application")
}

/// Attaches the firm-wide cohort summary to an application row.
/// `cohorts` caches fetched firms across a multi-row response.
async fn with_stats(
    state: &AppState,
    row: ApplicationRow,
    cohorts: &mut HashMap<String, Vec<FirmCohortRow>>,
) -> AppResult<ApplicationWithStats> {
    let summary = match row.firm.clone() {
        Some(firm) => {
            if !cohorts.contains_key(&firm) {
                let cohort = stats::fetch_firm_cohort(&state.db, &firm).await?;
                cohorts.insert(firm.clone(), cohort);
            }
            stats::firm_summary(
                &row,
                &cohorts[&firm],
                Utc::now().date_naive(),
                state.config.stats.recent_window_days,
            )
        }
        None => stats::empty_summary(),
    };
    state.metrics.inc_stats_computed();
    Ok(ApplicationWithStats { application: row.into_dto()?, summary_stats: summary })
}

fn duplicate_to_conflict(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => {
            AppError::Conflict("An application for this firm and city already exists".to_string())
        }
        other => other,
    }
}

/// POST /applications
pub async fn create_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ApplicationCreate>,
) -> AppResult<(StatusCode, Json<ApplicationWithStats>)> {
    validate_text_lengths(body.firm.as_deref(), body.city.as_deref(), body.notes.as_deref())?;

    let mut row = ApplicationRow {
        application_id: 0,
        user_id: user.user_id.to_string(),
        firm: body.firm,
        city: body.city,
        networked: body.networked.as_deref().map(tags_to_json),
        applied_date: body.applied_date,
        applied_response_date: body.applied_response_date,
        applied_to_response: None,
        screener_date: body.screener_date,
        screener_response_date: body.screener_response_date,
        screener_to_response: None,
        callback_date: body.callback_date,
        callback_response_date: body.callback_response_date,
        callback_to_response: None,
        stage: body.stage.unwrap_or_default(),
        notes: body.notes,
        last_updated: Some(db::now_stamp()),
    };
    refresh_day_counts(&mut row);
    validate_stage_dates(&row)?;

    let result = sqlx::query(
        r#"INSERT INTO applications
           (user_id, firm, city, networked,
            applied_date, applied_response_date, applied_to_response,
            screener_date, screener_response_date, screener_to_response,
            callback_date, callback_response_date, callback_to_response,
            stage, notes, last_updated)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"#,
    )
    .bind(&row.user_id)
    .bind(&row.firm)
    .bind(&row.city)
    .bind(&row.networked)
    .bind(row.applied_date)
    .bind(row.applied_response_date)
    .bind(row.applied_to_response)
    .bind(row.screener_date)
    .bind(row.screener_response_date)
    .bind(row.screener_to_response)
    .bind(row.callback_date)
    .bind(row.callback_response_date)
    .bind(row.callback_to_response)
    .bind(row.stage)
    .bind(&row.notes)
    .bind(&row.last_updated)
    .execute(&state.db)
    .await
    .map_err(AppError::from)
    .map_err(duplicate_to_conflict)?;

    row.application_id = result.last_insert_rowid();
    state.metrics.inc_applications_created();
    tracing::debug!("User {} created application {}", user.user_id, row.application_id);

    let mut cohorts = HashMap::new();
    let wrapped = with_stats(&state, row, &mut cohorts).await?;
    Ok((StatusCode::CREATED, Json(wrapped)))
}

/// GET /applications/me
///
/// The caller's applications with a firm filled in, most recently
/// touched first, each wrapped with its firm summary. 404 when the
/// caller has none yet; the grid treats that as "show the empty state".
/// Without an explicit `limit` every row comes back; `limit` is capped
/// at 500 when given.
pub async fn list_my_applications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(q): Query<ListQuery>,
) -> AppResult<Json<Vec<ApplicationWithStats>>> {
    // LIMIT -1 means unlimited in SQLite
    let limit = q.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT)).unwrap_or(-1);

    let rows: Vec<ApplicationRow> = sqlx::query_as(
        "SELECT * FROM applications WHERE user_id = ?1 AND firm IS NOT NULL \
         ORDER BY last_updated DESC, application_id DESC LIMIT ?2",
    )
    .bind(user.user_id.to_string())
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    if rows.is_empty() {
        return Err(AppError::NotFound("No applications found".to_string()));
    }

    let mut cohorts = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(with_stats(&state, row, &mut cohorts).await?);
    }
    Ok(Json(out))
}

/// GET /applications/me/:id
pub async fn get_my_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(application_id): Path<i64>,
) -> AppResult<Json<ApplicationWithStats>> {
    let row = get_owned_application(&state.db, user.user_id, application_id).await?;
    let mut cohorts = HashMap::new();
    Ok(Json(with_stats(&state, row, &mut cohorts).await?))
}

/// PUT /applications/:id
///
/// A non-owner touching an existing record gets 403, not 404; the id
/// space is sequential so hiding existence buys nothing.
pub async fn update_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(application_id): Path<i64>,
    Json(body): Json<ApplicationUpdate>,
) -> AppResult<Json<ApplicationWithStats>> {
    let row: Option<ApplicationRow> =
        sqlx::query_as("SELECT * FROM applications WHERE application_id = ?1")
            .bind(application_id)
            .fetch_optional(&state.db)
            .await?;
    let mut row = row.ok_or_not_found("Application")?;

    if row.user_id != user.user_id.to_string() {
        return Err(AppError::Forbidden("Not authorized to perform requested action".to_string()));
    }

    validate_text_lengths(body.firm.as_deref(), body.city.as_deref(), body.notes.as_deref())?;

    if let Some(firm) = body.firm {
        row.firm = Some(firm);
    }
    if let Some(city) = body.city {
        row.city = Some(city);
    }
    if let Some(networked) = &body.networked {
        row.networked = Some(tags_to_json(networked));
    }
    if let Some(d) = body.applied_date {
        row.applied_date = Some(d);
    }
    if let Some(d) = body.applied_response_date {
        row.applied_response_date = Some(d);
    }
    if let Some(d) = body.screener_date {
        row.screener_date = Some(d);
    }
    if let Some(d) = body.screener_response_date {
        row.screener_response_date = Some(d);
    }
    if let Some(d) = body.callback_date {
        row.callback_date = Some(d);
    }
    if let Some(d) = body.callback_response_date {
        row.callback_response_date = Some(d);
    }
    if let Some(stage) = body.stage {
        row.stage = stage;
    }
    if let Some(notes) = body.notes {
        row.notes = Some(notes);
    }

    refresh_day_counts(&mut row);
    validate_stage_dates(&row)?;
    row.last_updated = Some(db::now_stamp());

    sqlx::query(
        r#"UPDATE applications SET
            firm = ?1, city = ?2, networked = ?3,
            applied_date = ?4, applied_response_date = ?5, applied_to_response = ?6,
            screener_date = ?7, screener_response_date = ?8, screener_to_response = ?9,
            callback_date = ?10, callback_response_date = ?11, callback_to_response = ?12,
            stage = ?13, notes = ?14, last_updated = ?15
           WHERE application_id = ?16"#,
    )
    .bind(&row.firm)
    .bind(&row.city)
    .bind(&row.networked)
    .bind(row.applied_date)
    .bind(row.applied_response_date)
    .bind(row.applied_to_response)
    .bind(row.screener_date)
    .bind(row.screener_response_date)
    .bind(row.screener_to_response)
    .bind(row.callback_date)
    .bind(row.callback_response_date)
    .bind(row.callback_to_response)
    .bind(row.stage)
    .bind(&row.notes)
    .bind(&row.last_updated)
    .bind(application_id)
    .execute(&state.db)
    .await
    .map_err(AppError::from)
    .map_err(duplicate_to_conflict)?;

    state.metrics.inc_applications_updated();

    let mut cohorts = HashMap::new();
    Ok(Json(with_stats(&state, row, &mut cohorts).await?))
}

/// DELETE /applications/:id
///
/// Owner-scoped: a record belonging to someone else is indistinguishable
/// from a missing one here, both come back 404.
pub async fn delete_application(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(application_id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM applications WHERE application_id = ?1 AND user_id = ?2")
        .bind(application_id)
        .bind(user.user_id.to_string())
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Application not found".to_string()));
    }

    state.metrics.inc_applications_deleted();
    Ok(Json(MessageResponse { message: "Application deleted successfully".to_string() }))
}

/// GET /applications/total
///
/// Public counters shown on the landing page. Blank drafts without a
/// firm are not counted as applications.
pub async fn total_applications(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE firm IS NOT NULL")
        .fetch_one(&state.db)
        .await?;
    let users: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM applications")
        .fetch_one(&state.db)
        .await?;
    Ok(Json(serde_json::json!({ "total_applications": total, "total_users": users })))
}
