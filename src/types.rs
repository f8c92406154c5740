use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Recruiting stage of an application. Wire labels match what the
/// datagrid UI has always sent, spaces included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Stage {
    #[serde(rename = "Not Submitted")]
    #[sqlx(rename = "Not Submitted")]
    NotSubmitted,
    #[serde(rename = "Submitted Application")]
    #[sqlx(rename = "Submitted Application")]
    SubmittedApplication,
    #[serde(rename = "Screener Invite")]
    #[sqlx(rename = "Screener Invite")]
    ScreenerInvite,
    #[serde(rename = "Callback Invite")]
    #[sqlx(rename = "Callback Invite")]
    CallbackInvite,
    #[serde(rename = "Offer")]
    #[sqlx(rename = "Offer")]
    Offer,
    #[serde(rename = "Rejection")]
    #[sqlx(rename = "Rejection")]
    Rejection,
}

impl Default for Stage {
    fn default() -> Self {
        Stage::NotSubmitted
    }
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::NotSubmitted => "Not Submitted",
            Stage::SubmittedApplication => "Submitted Application",
            Stage::ScreenerInvite => "Screener Invite",
            Stage::CallbackInvite => "Callback Invite",
            Stage::Offer => "Offer",
            Stage::Rejection => "Rejection",
        }
    }
}

// ---------------- users ----------------

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// ---------------- auth ----------------

/// OAuth2 password-flow form body: `username` carries the email.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

// ---------------- profiles ----------------

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: String,
    pub school: Option<String>,
    pub rank: Option<i64>,
    pub circumstances: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub school: Option<String>,
    pub rank: Option<i64>,
    pub circumstances: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub school: Option<String>,
    pub rank: Option<i64>,
    pub circumstances: Option<Vec<String>>,
    pub last_updated: Option<String>,
}

// ---------------- applications ----------------

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub application_id: i64,
    pub user_id: String,
    pub firm: Option<String>,
    pub city: Option<String>,
    pub networked: Option<String>,
    pub applied_date: Option<NaiveDate>,
    pub applied_response_date: Option<NaiveDate>,
    pub applied_to_response: Option<i64>,
    pub screener_date: Option<NaiveDate>,
    pub screener_response_date: Option<NaiveDate>,
    pub screener_to_response: Option<i64>,
    pub callback_date: Option<NaiveDate>,
    pub callback_response_date: Option<NaiveDate>,
    pub callback_to_response: Option<i64>,
    pub stage: Stage,
    pub notes: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationCreate {
    pub firm: Option<String>,
    pub city: Option<String>,
    pub networked: Option<Vec<String>>,
    pub applied_date: Option<NaiveDate>,
    pub applied_response_date: Option<NaiveDate>,
    pub screener_date: Option<NaiveDate>,
    pub screener_response_date: Option<NaiveDate>,
    pub callback_date: Option<NaiveDate>,
    pub callback_response_date: Option<NaiveDate>,
    pub stage: Option<Stage>,
    pub notes: Option<String>,
}

/// Field delta from the UI grid; `None` leaves the column untouched.
pub type ApplicationUpdate = ApplicationCreate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub application_id: i64,
    pub user_id: Uuid,
    pub firm: Option<String>,
    pub city: Option<String>,
    pub networked: Option<Vec<String>>,
    pub applied_date: Option<NaiveDate>,
    pub applied_response_date: Option<NaiveDate>,
    pub applied_to_response: Option<i64>,
    pub screener_date: Option<NaiveDate>,
    pub screener_response_date: Option<NaiveDate>,
    pub screener_to_response: Option<i64>,
    pub callback_date: Option<NaiveDate>,
    pub callback_response_date: Option<NaiveDate>,
    pub callback_to_response: Option<i64>,
    pub stage: Stage,
    pub notes: Option<String>,
    pub last_updated: Option<String>,
}

impl ApplicationRow {
    pub fn into_dto(self) -> AppResult<ApplicationResponse> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| AppError::Database(format!("invalid user_id in applications row: {}", e)))?;
        Ok(ApplicationResponse {
            application_id: self.application_id,
            user_id,
            firm: self.firm,
            city: self.city,
            networked: tags_from_json(self.networked.as_deref())?,
            applied_date: self.applied_date,
            applied_response_date: self.applied_response_date,
            applied_to_response: self.applied_to_response,
            screener_date: self.screener_date,
            screener_response_date: self.screener_response_date,
            screener_to_response: self.screener_to_response,
            callback_date: self.callback_date,
            callback_response_date: self.callback_response_date,
            callback_to_response: self.callback_to_response,
            stage: self.stage,
            notes: self.notes,
            last_updated: self.last_updated,
        })
    }
}

/// Application wrapped with the firm-wide cohort summary, the shape the
/// grid binds to on fetch and after every cell edit.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationWithStats {
    pub application: ApplicationResponse,
    pub summary_stats: crate::stats::SummaryStats,
}

// ---------------- tag arrays (stored as JSON text) ----------------

pub fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub fn tags_from_json(raw: Option<&str>) -> AppResult<Option<Vec<String>>> {
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| AppError::Database(format!("invalid tag array in row: {}", e))),
    }
}

// ---------------- derived columns & invariants ----------------

/// Day counts are always derived from their date pair, never taken from
/// the client. Missing either date clears the count.
pub fn day_count(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<i64> {
    match (from, to) {
        (Some(f), Some(t)) => Some((t - f).num_days()),
        _ => None,
    }
}

fn check_order(
    earlier: Option<NaiveDate>,
    later: Option<NaiveDate>,
    field: &str,
    message: &str,
) -> AppResult<()> {
    if let (Some(e), Some(l)) = (earlier, later) {
        if l < e {
            return Err(AppError::ValidationError {
                field: field.to_string(),
                message: message.to_string(),
            });
        }
    }
    Ok(())
}

/// Stage dates fill monotonically as the application progresses:
/// responses never precede the stage they answer, and later stages never
/// precede earlier ones.
pub fn validate_stage_dates(app: &ApplicationRow) -> AppResult<()> {
    check_order(
        app.applied_date,
        app.applied_response_date,
        "applied_response_date",
        "response date precedes applied date",
    )?;
    check_order(
        app.screener_date,
        app.screener_response_date,
        "screener_response_date",
        "response date precedes screener date",
    )?;
    check_order(
        app.callback_date,
        app.callback_response_date,
        "callback_response_date",
        "response date precedes callback date",
    )?;
    check_order(
        app.applied_date,
        app.screener_date,
        "screener_date",
        "screener date precedes applied date",
    )?;
    check_order(
        app.screener_date,
        app.callback_date,
        "callback_date",
        "callback date precedes screener date",
    )?;
    Ok(())
}

/// Recompute all three derived day-count columns on `app` in place.
pub fn refresh_day_counts(app: &mut ApplicationRow) {
    app.applied_to_response = day_count(app.applied_date, app.applied_response_date);
    app.screener_to_response = day_count(app.screener_date, app.screener_response_date);
    app.callback_to_response = day_count(app.callback_date, app.callback_response_date);
}

// Free-text fields get a length cap instead of the CSV allowlists the
// old deployment shipped with.
pub const MAX_TEXT_FIELD: usize = 200;
pub const MAX_NOTES: usize = 10_000;

pub fn validate_text_lengths(
    firm: Option<&str>,
    city: Option<&str>,
    notes: Option<&str>,
) -> AppResult<()> {
    for (field, value, max) in [
        ("firm", firm, MAX_TEXT_FIELD),
        ("city", city, MAX_TEXT_FIELD),
        ("notes", notes, MAX_NOTES),
    ] {
        if let Some(v) = value {
            if v.len() > max {
                return Err(AppError::ValidationError {
                    field: field.to_string(),
                    message: format!("exceeds maximum length of {} bytes", max),
                });
            }
        }
    }
    Ok(())
}
