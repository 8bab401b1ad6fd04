use reqwest::Method;
use tracing::{info, warn};

use crate::models::{AuthResponse, CurrentUser, LoginRequest, User};

use super::{ApiResult, AppState};

/// Exchanges credentials for a backend bearer token.
pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<AuthResponse> {
    let body = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    let result = state
        .api
        .send::<_, AuthResponse>(Method::POST, None, "/auth/login", Some(&body))
        .await;

    match &result {
        Ok(auth) => info!(user_id = auth.user.id, "backend login accepted"),
        Err(e) => warn!(error = %e, "backend login failed"),
    }
    result
}

/// Re-reads the logged-in user; fails with `Unauthorized` once the token is
/// no longer valid.
pub async fn current_user(state: &AppState, api_token: &str) -> ApiResult<User> {
    let me: CurrentUser = state.api.get(Some(api_token), "/auth/me", &[]).await?;
    Ok(me.user)
}
