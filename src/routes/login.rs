// routes/login.rs
// GET /login -> sign-in form; POST /login (form) -> backend login, session
// cookie and redirect to the landing page of the user's role.

use askama::Template;
use axum::{
    extract::{Form, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::session::{SESSION_COOKIE_NAME, extract_cookies, session_cookie};
use crate::state::{self, AppState, create_session, find_session};

use super::helpers::render;

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid email or password. Please try again.";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    email: String,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(State(st): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    for token in extract_cookies(&headers, SESSION_COOKIE_NAME) {
        if let Some(record) = find_session(&st, &token).await {
            return Redirect::to(record.user.role.home_path()).into_response();
        }
    }

    login_form(String::new(), None, StatusCode::OK)
}

pub async fn login(State(st): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return login_form(
            email.to_string(),
            Some("Email and password are required".into()),
            StatusCode::UNPROCESSABLE_ENTITY,
        );
    }

    let auth = match state::login(&st, email, &form.password).await {
        Ok(auth) => auth,
        Err(_) => {
            return login_form(
                email.to_string(),
                Some(LOGIN_FAILED_MESSAGE.into()),
                StatusCode::UNAUTHORIZED,
            );
        }
    };

    let home = auth.user.role.home_path();
    let token = create_session(&st, auth.user, auth.token).await;
    let mut response = Redirect::to(home).into_response();
    if let Some(cookie) = session_cookie(&token, st.sessions.ttl().as_secs()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

fn login_form(email: String, error: Option<String>, status: StatusCode) -> Response {
    match render(LoginTemplate { email, error }) {
        Ok(html) => (status, html).into_response(),
        Err(status) => status.into_response(),
    }
}
