use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::{
    models::{InvoiceStatus, PlanStatus},
    schedule::PlanType,
    session::{SessionUser, clear_session_cookie, login_redirect},
    state::{ApiError, AppState, Flash, PAGE_SIZES, delete_session, push_flash, take_flash},
};

pub(super) fn render<T: Template>(tpl: T) -> Result<Html<String>, StatusCode> {
    tpl.render().map(Html).map_err(|e| {
        warn!(error = %e, "template render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub(super) fn render_response<T: Template>(tpl: T) -> Response {
    render(tpl)
        .map(IntoResponse::into_response)
        .unwrap_or_else(|status| status.into_response())
}

#[derive(Clone)]
pub(super) struct SimpleOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub(super) struct FlashView {
    pub kind: &'static str,
    pub message: String,
}

/// Navigation data shared by every page that extends `base.html`.
pub(super) struct LayoutView {
    pub user_name: String,
    pub role: &'static str,
    pub is_admin: bool,
    pub is_student: bool,
    pub flash: Option<FlashView>,
}

/// Builds the layout and consumes the pending flash message.
pub(super) async fn layout(state: &AppState, session: &SessionUser) -> LayoutView {
    let flash = take_flash(state, session.token()).await.map(|f| FlashView {
        kind: f.kind.as_str(),
        message: f.message,
    });
    LayoutView {
        user_name: session.user().full_name(),
        role: session.role().as_str(),
        is_admin: session.is_admin(),
        is_student: session.is_student(),
        flash,
    }
}

/// Backend refused the token: forget the portal session and go to login.
pub(super) async fn session_expired(state: &AppState, session: &SessionUser) -> Response {
    info!(user_id = session.user_id(), "backend token rejected, closing session");
    delete_session(state, session.token()).await;
    let mut response = login_redirect();
    clear_session_cookie(&mut response);
    response
}

/// Outcome of a status-changing action: flash a message and go back to the
/// list, or drop the session when the backend no longer accepts the token.
pub(super) async fn finish_action<T>(
    state: &AppState,
    session: &SessionUser,
    result: Result<T, ApiError>,
    success: impl Into<String>,
    fallback: &str,
    back_to: &str,
) -> Response {
    match result {
        Ok(_) => {
            push_flash(state, session.token(), Flash::success(success)).await;
            Redirect::to(back_to).into_response()
        }
        Err(err) if err.is_unauthorized() => session_expired(state, session).await,
        Err(err) => {
            warn!(error = %err, "backend action failed");
            let message = err.user_message().unwrap_or(fallback).to_string();
            push_flash(state, session.token(), Flash::error(message)).await;
            Redirect::to(back_to).into_response()
        }
    }
}

pub(super) fn clean_opt(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(super) fn plan_status_options(selected: Option<PlanStatus>) -> Vec<SimpleOption> {
    let mut opts = vec![SimpleOption {
        value: String::new(),
        label: "All statuses".into(),
        selected: selected.is_none(),
    }];
    opts.extend(PlanStatus::ALL.into_iter().map(|s| SimpleOption {
        value: s.as_str().into(),
        label: s.label().into(),
        selected: selected == Some(s),
    }));
    opts
}

pub(super) fn plan_type_filter_options(selected: Option<PlanType>) -> Vec<SimpleOption> {
    let mut opts = vec![SimpleOption {
        value: String::new(),
        label: "All types".into(),
        selected: selected.is_none(),
    }];
    opts.extend(plan_type_options(selected));
    opts
}

pub(super) fn plan_type_options(selected: Option<PlanType>) -> Vec<SimpleOption> {
    [PlanType::OneTime, PlanType::Installment]
        .into_iter()
        .map(|t| SimpleOption {
            value: t.as_str().into(),
            label: t.label().into(),
            selected: selected == Some(t),
        })
        .collect()
}

pub(super) fn invoice_status_options(selected: Option<InvoiceStatus>) -> Vec<SimpleOption> {
    let mut opts = vec![SimpleOption {
        value: String::new(),
        label: "All statuses".into(),
        selected: selected.is_none(),
    }];
    opts.extend(InvoiceStatus::ALL.into_iter().map(|s| SimpleOption {
        value: s.as_str().into(),
        label: s.label().into(),
        selected: selected == Some(s),
    }));
    opts
}

pub(super) fn page_size_options(selected: u32) -> Vec<SimpleOption> {
    PAGE_SIZES
        .into_iter()
        .map(|size| SimpleOption {
            value: size.to_string(),
            label: size.to_string(),
            selected: size == selected,
        })
        .collect()
}

/// Query-string fragment (`a=b&c=d`) for links that keep the current filters.
pub(super) fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, encode_query_value(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
