use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};

use crate::auth::{create_access_token, get_user_by_email, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::client_ip;
use crate::state::AppState;
use crate::types::{LoginForm, Token};

/// POST /login
///
/// OAuth2 password flow: form-encoded `username` (the email) and
/// `password`, returning a bearer token. Wrong email and wrong password
/// produce the same 403 so the endpoint does not leak which one it was.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Json<Token>, Response> {
    let ip = client_ip(&headers, None);
    state
        .rate_limiter
        .check_endpoint_limit("/login", ip)
        .await
        .map_err(|e| e.into_response())?;

    authenticate(&state, form).await.map(Json).map_err(|e| e.into_response())
}

async fn authenticate(state: &AppState, form: LoginForm) -> AppResult<Token> {
    let user = match get_user_by_email(&state.db, &form.username).await? {
        Some(u) => u,
        None => {
            state.metrics.inc_logins_failed();
            return Err(AppError::Forbidden("Incorrect email or password".to_string()));
        }
    };

    if !verify_password(&form.password, &user.password_hash)? {
        state.metrics.inc_logins_failed();
        return Err(AppError::Forbidden("Incorrect email or password".to_string()));
    }

    let access_token = create_access_token(&user.user_id, &state.config.auth)?;
    state.metrics.inc_logins_succeeded();
    tracing::debug!("Issued access token for user {}", user.user_id);

    Ok(Token { access_token, token_type: "bearer".to_string() })
}
