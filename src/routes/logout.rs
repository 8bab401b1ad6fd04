// routes/logout.rs
// POST /logout -> removes the session entry, clears the cookie, back to /login.

use axum::{extract::State, response::Response};
use std::sync::Arc;

use crate::session::{SessionUser, clear_session_cookie, login_redirect};
use crate::state::{AppState, delete_session};

pub async fn logout(State(st): State<Arc<AppState>>, session: SessionUser) -> Response {
    delete_session(&st, session.token()).await;

    let mut response = login_redirect();
    clear_session_cookie(&mut response);
    response
}
