use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::auth::{get_user_by_email, hash_password, validate_email, CurrentUser};
use crate::error::{AppError, AppResult};
use crate::middleware::client_ip;
use crate::state::AppState;
use crate::types::{MessageResponse, UserCreate, UserResponse, UserRow, UserUpdate};

const MIN_PASSWORD_LEN: usize = 8;

/// POST /users
///
/// Registers a user and its (initially blank) profile in one
/// transaction, so a user row never exists without a profile row.
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), Response> {
    let ip = client_ip(&headers, None);
    state
        .rate_limiter
        .check_endpoint_limit("/users", ip)
        .await
        .map_err(|e| e.into_response())?;

    match create_user_inner(&state, body).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(user))),
        Err(e) => Err(e.into_response()),
    }
}

async fn create_user_inner(state: &AppState, body: UserCreate) -> AppResult<UserResponse> {
    validate_email(&body.email)?;
    if body.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError {
            field: "password".to_string(),
            message: format!("must be at least {} characters", MIN_PASSWORD_LEN),
        });
    }

    if get_user_by_email(&state.db, &body.email).await?.is_some() {
        return Err(AppError::BadRequest("User already exists.".to_string()));
    }

    let user_id = Uuid::new_v4();
    let password_hash = hash_password(&body.password)?;

    let mut tx = state.db.begin().await?;
    sqlx::query("INSERT INTO users (user_id, email, password_hash) VALUES (?1, ?2, ?3)")
        .bind(user_id.to_string())
        .bind(&body.email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO profiles (user_id) VALUES (?1)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    state.metrics.inc_users_registered();
    tracing::info!("Registered user {}", user_id);

    // created_at is filled by the schema default, so read it back
    let row: UserRow = sqlx::query_as(
        "SELECT user_id, email, password_hash, created_at, is_active FROM users WHERE user_id = ?1",
    )
    .bind(user_id.to_string())
    .fetch_one(&state.db)
    .await?;

    Ok(UserResponse { user_id, email: row.email, created_at: row.created_at })
}

/// GET /users/me
pub async fn get_me(user: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse { user_id: user.user_id, email: user.email, created_at: user.created_at })
}

/// PUT /users/me
///
/// Partial update: absent fields stay untouched. A new email must not
/// belong to another account. Both fields are validated before any
/// write, and the writes share one transaction, so a rejected body
/// changes nothing.
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<UserUpdate>,
) -> AppResult<Json<UserResponse>> {
    if let Some(email) = &body.email {
        validate_email(email)?;
        if let Some(existing) = get_user_by_email(&state.db, email).await? {
            if existing.user_id != user.user_id.to_string() {
                return Err(AppError::BadRequest("User already exists.".to_string()));
            }
        }
    }

    let password_hash = match &body.password {
        Some(password) => {
            if password.len() < MIN_PASSWORD_LEN {
                return Err(AppError::ValidationError {
                    field: "password".to_string(),
                    message: format!("must be at least {} characters", MIN_PASSWORD_LEN),
                });
            }
            Some(hash_password(password)?)
        }
        None => None,
    };

    let mut tx = state.db.begin().await?;
    if let Some(email) = &body.email {
        sqlx::query("UPDATE users SET email = ?1 WHERE user_id = ?2")
            .bind(email)
            .bind(user.user_id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    if let Some(hash) = &password_hash {
        sqlx::query("UPDATE users SET password_hash = ?1 WHERE user_id = ?2")
            .bind(hash)
            .bind(user.user_id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    let row: UserRow = sqlx::query_as(
        "SELECT user_id, email, password_hash, created_at, is_active FROM users WHERE user_id = ?1",
    )
    .bind(user.user_id.to_string())
    .fetch_one(&state.db)
    .await?;

    Ok(Json(UserResponse { user_id: user.user_id, email: row.email, created_at: row.created_at }))
}

/// DELETE /users/me
///
/// Deletes the account; the profile and all applications go with it via
/// the foreign-key cascades.
pub async fn delete_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    sqlx::query("DELETE FROM users WHERE user_id = ?1")
        .bind(user.user_id.to_string())
        .execute(&state.db)
        .await?;
    tracing::info!("Deleted user {}", user.user_id);
    Ok(Json(MessageResponse { message: "User deleted successfully".to_string() }))
}
