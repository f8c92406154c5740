use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::db;
use crate::error::{AppError, AppResult, OptionExt};
use crate::state::AppState;
use crate::types::{tags_from_json, tags_to_json, ProfileResponse, ProfileRow, ProfileUpdate, UserResponse};

async fn fetch_profile(db: &sqlx::SqlitePool, user_id: &str) -> AppResult<ProfileRow> {
    let row: Option<ProfileRow> = sqlx::query_as(
        "SELECT user_id, school, rank, circumstances, last_updated FROM profiles WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    row.ok_or_not_found("Profile")
}

fn to_response(user: CurrentUser, row: ProfileRow) -> AppResult<ProfileResponse> {
    Ok(ProfileResponse {
        user: UserResponse { user_id: user.user_id, email: user.email, created_at: user.created_at },
        school: row.school,
        rank: row.rank,
        circumstances: tags_from_json(row.circumstances.as_deref())?,
        last_updated: row.last_updated,
    })
}

/// GET /profiles/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    let row = fetch_profile(&state.db, &user.user_id.to_string()).await?;
    Ok(Json(to_response(user, row)?))
}

/// PUT /profiles/me
///
/// Partial update, like the application grid: absent fields keep their
/// stored value.
pub async fn update_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    let uid = user.user_id.to_string();
    let mut row = fetch_profile(&state.db, &uid).await?;

    if let Some(school) = body.school {
        if school.len() > crate::types::MAX_TEXT_FIELD {
            return Err(AppError::ValidationError {
                field: "school".to_string(),
                message: format!("exceeds maximum length of {} bytes", crate::types::MAX_TEXT_FIELD),
            });
        }
        row.school = Some(school);
    }
    if let Some(rank) = body.rank {
        if rank < 1 {
            return Err(AppError::ValidationError {
                field: "rank".to_string(),
                message: "must be a positive class rank".to_string(),
            });
        }
        row.rank = Some(rank);
    }
    if let Some(circumstances) = &body.circumstances {
        row.circumstances = Some(tags_to_json(circumstances));
    }
    row.last_updated = Some(db::now_stamp());

    sqlx::query(
        "UPDATE profiles SET school = ?1, rank = ?2, circumstances = ?3, last_updated = ?4 WHERE user_id = ?5",
    )
    .bind(&row.school)
    .bind(row.rank)
    .bind(&row.circumstances)
    .bind(&row.last_updated)
    .bind(&uid)
    .execute(&state.db)
    .await?;

    Ok(Json(to_response(user, row)?))
}
