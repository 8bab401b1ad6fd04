// session.rs
// Session middleware to protect routes, extractor to access session data and
// the role gates used by admin-only and student-only pages.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header::COOKIE, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use futures::future::BoxFuture;

use crate::models::{User, UserRole};
use crate::state::{AppState, find_session};

pub const SESSION_COOKIE_NAME: &str = "session";

#[derive(Clone)]
pub struct SessionData {
    pub user: User,
    /// Portal cookie token.
    pub token: String,
    /// Bearer token for the backend.
    pub api_token: String,
}

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let tokens = extract_cookies(request.headers(), SESSION_COOKIE_NAME);
    if tokens.is_empty() {
        return Err(login_redirect());
    }

    // Try all cookies with the session name until one is valid
    let mut found = None;
    for token in tokens {
        if let Some(record) = find_session(&state, &token).await {
            found = Some((record, token));
            break;
        }
    }

    match found {
        Some((record, token)) => {
            request.extensions_mut().insert(SessionData {
                user: record.user,
                token,
                api_token: record.api_token,
            });
            Ok(next.run(request).await)
        }
        None => Err(login_redirect()),
    }
}

pub struct SessionUser(pub SessionData);

impl SessionUser {
    pub fn user(&self) -> &User {
        &self.0.user
    }

    pub fn token(&self) -> &str {
        &self.0.token
    }

    pub fn api_token(&self) -> &str {
        &self.0.api_token
    }

    pub fn user_id(&self) -> i64 {
        self.0.user.id
    }

    pub fn role(&self) -> UserRole {
        self.0.user.role
    }

    pub fn is_admin(&self) -> bool {
        self.0.user.role.is_admin()
    }

    pub fn is_student(&self) -> bool {
        self.0.user.role.is_student()
    }

    /// Admin-only pages send everybody else to their own landing page.
    pub fn require_admin(&self) -> Result<(), Response> {
        self.require_role(UserRole::Admin)
    }

    pub fn require_student(&self) -> Result<(), Response> {
        self.require_role(UserRole::Student)
    }

    fn require_role(&self, role: UserRole) -> Result<(), Response> {
        if self.role() == role {
            Ok(())
        } else {
            Err(Redirect::to(self.role().home_path()).into_response())
        }
    }
}

#[allow(refining_impl_trait)]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> BoxFuture<'static, Result<Self, Self::Rejection>> {
        let data = parts
            .extensions
            .get::<SessionData>()
            .cloned()
            .ok_or_else(login_redirect);

        Box::pin(async move {
            match data {
                Ok(session) => Ok(SessionUser(session)),
                Err(resp) => Err(resp),
            }
        })
    }
}

pub fn login_redirect() -> Response {
    Redirect::to("/login").into_response()
}

pub fn session_cookie(token: &str, max_age_secs: u64) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE_NAME, token, max_age_secs
    ))
    .ok()
}

/// Appends an expired cookie so the browser forgets the session.
pub fn clear_session_cookie(response: &mut Response) {
    if let Some(value) = session_cookie("", 0) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}

pub fn extract_cookies(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let mut split = pair.trim().splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == name && !value.is_empty() {
                Some(value.to_owned())
            } else {
                None
            }
        })
        .collect()
}
