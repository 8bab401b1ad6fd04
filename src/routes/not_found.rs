use askama::Template;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::helpers::render;

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate;

pub async fn not_found() -> Response {
    match render(NotFoundTemplate) {
        Ok(html) => (StatusCode::NOT_FOUND, html).into_response(),
        Err(status) => status.into_response(),
    }
}
