// routes/invoices.rs
// Invoice list (admins see everything, students only their own), detail page
// and the admin actions: mark paid, change status, delete.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::warn;

use crate::{
    format::{display_backend_date, format_usd, parse_backend_date},
    models::{Invoice, InvoiceStatus},
    session::SessionUser,
    state::{
        ApiError, AppState, Flash, InvoiceQuery, delete_invoice, get_invoice, list_invoices,
        mark_invoice_paid, push_flash, update_invoice_status,
    },
};

use super::helpers::*;
use super::not_found::not_found;
use super::pagination::PageWindow;

const INVOICES_PATH: &str = "/invoices";

#[derive(Template)]
#[template(path = "invoices/index.html")]
struct InvoicesIndexTemplate {
    layout: LayoutView,
    rows: Vec<InvoiceRow>,
    status_options: Vec<SimpleOption>,
    limit_options: Vec<SimpleOption>,
    search: String,
    user_id: String,
    has_filters: bool,
    can_manage: bool,
    window: PageWindow,
    page_href: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "invoices/show.html")]
struct InvoiceShowTemplate {
    layout: LayoutView,
    invoice: InvoiceRow,
    can_manage: bool,
    status_options: Vec<SimpleOption>,
}

pub(super) struct InvoiceRow {
    pub id: i64,
    pub invoice_number: String,
    pub student_name: String,
    pub student_email: Option<String>,
    pub plan_id: Option<i64>,
    pub amount: String,
    pub paid: String,
    pub due_date: String,
    pub created: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub overdue: bool,
    pub can_mark_paid: bool,
}

impl InvoiceRow {
    pub(super) fn new(invoice: Invoice, today: NaiveDate) -> Self {
        let (student_name, student_email) = match &invoice.user {
            Some(user) => (user.full_name(), Some(user.email.clone())),
            None => ("Unknown Student".to_string(), None),
        };
        InvoiceRow {
            id: invoice.id,
            overdue: is_overdue(&invoice, today),
            invoice_number: invoice.invoice_number,
            student_name,
            student_email,
            plan_id: invoice.payment_plan_id,
            amount: format_usd(invoice.amount),
            paid: format_usd(invoice.paid_amount),
            due_date: display_backend_date(&invoice.due_date),
            created: invoice
                .created_at
                .as_deref()
                .map(display_backend_date)
                .unwrap_or_else(|| "-".into()),
            status: invoice.status.as_str(),
            status_label: invoice.status.label(),
            can_mark_paid: invoice.status.can_mark_paid(),
        }
    }
}

/// Due or outstanding with the due date already behind us.
pub(super) fn is_overdue(invoice: &Invoice, today: NaiveDate) -> bool {
    matches!(invoice.status, InvoiceStatus::Due | InvoiceStatus::Outstanding)
        && parse_backend_date(&invoice.due_date).is_some_and(|due| due < today)
}

#[derive(Deserialize, Default)]
pub struct InvoiceListParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

impl InvoiceListParams {
    /// Students are always pinned to their own invoices.
    pub(super) fn query(self, session: &SessionUser) -> InvoiceQuery {
        let user_id = if session.is_admin() {
            clean_opt(self.user_id).and_then(|v| v.parse::<i64>().ok())
        } else {
            Some(session.user_id())
        };
        InvoiceQuery::new(
            clean_opt(self.page).and_then(|v| v.parse().ok()),
            clean_opt(self.limit).and_then(|v| v.parse().ok()),
            self.status,
            self.search,
        )
        .for_user(user_id)
    }
}

#[derive(Deserialize)]
pub struct InvoiceStatusForm {
    #[serde(default)]
    pub status: String,
}

pub async fn invoices_index(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Query(params): Query<InvoiceListParams>,
) -> Response {
    let query = params.query(&session);
    let today = Local::now().date_naive();

    let (rows, total, error) = match list_invoices(&st, session.api_token(), &query).await {
        Ok(page) => (
            page.invoices
                .into_iter()
                .map(|inv| InvoiceRow::new(inv, today))
                .collect(),
            page.pagination.total,
            None,
        ),
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "listing invoices failed");
            let message = e.user_message().unwrap_or("Failed to load invoices").to_string();
            (Vec::new(), 0, Some(message))
        }
    };

    let filter_params: Vec<(&str, String)> = query
        .to_params()
        .into_iter()
        .filter(|(k, _)| *k != "page")
        .collect();

    render_response(InvoicesIndexTemplate {
        layout: layout(&st, &session).await,
        rows,
        status_options: invoice_status_options(query.status),
        limit_options: page_size_options(query.limit),
        search: query.search.clone().unwrap_or_default(),
        user_id: if session.is_admin() {
            query.user_id.map(|id| id.to_string()).unwrap_or_default()
        } else {
            String::new()
        },
        // A student's own-invoices pin is not a user-chosen filter.
        has_filters: if session.is_admin() {
            query.has_filters()
        } else {
            query.status.is_some() || query.search.is_some()
        },
        can_manage: session.is_admin(),
        window: PageWindow::new(query.page, query.limit, total),
        page_href: format!("{}?{}", INVOICES_PATH, query_string(&filter_params)),
        error,
    })
}

pub async fn invoices_show(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let invoice = match get_invoice(&st, session.api_token(), id).await {
        Ok(invoice) => invoice,
        Err(ApiError::NotFound(_)) => return not_found().await,
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(invoice_id = id, error = %e, "loading invoice failed");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    // Students only ever see their own invoices.
    if !session.is_admin() && invoice.user_id != session.user_id() {
        return not_found().await;
    }

    let current = invoice.status;
    render_response(InvoiceShowTemplate {
        layout: layout(&st, &session).await,
        invoice: InvoiceRow::new(invoice, Local::now().date_naive()),
        can_manage: session.is_admin(),
        status_options: InvoiceStatus::ALL
            .into_iter()
            .map(|s| SimpleOption {
                value: s.as_str().into(),
                label: s.label().into(),
                selected: s == current,
            })
            .collect(),
    })
}

pub async fn invoices_mark_paid(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let result = mark_invoice_paid(&st, session.api_token(), id).await;
    finish_action(
        &st,
        &session,
        result,
        "Invoice marked as paid successfully",
        "Failed to mark invoice as paid",
        INVOICES_PATH,
    )
    .await
}

pub async fn invoices_update_status(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<InvoiceStatusForm>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let back_to = format!("{INVOICES_PATH}/{id}");
    let Some(status) = InvoiceStatus::parse(form.status.trim()) else {
        push_flash(&st, session.token(), Flash::error("Failed to update invoice status")).await;
        return Redirect::to(&back_to).into_response();
    };

    let result = update_invoice_status(&st, session.api_token(), id, status).await;
    finish_action(
        &st,
        &session,
        result,
        format!("Invoice status updated to {}", status.as_str()),
        "Failed to update invoice status",
        &back_to,
    )
    .await
}

pub async fn invoices_delete(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let result = delete_invoice(&st, session.api_token(), id).await;
    finish_action(
        &st,
        &session,
        result,
        "Invoice deleted successfully",
        "Failed to delete invoice",
        INVOICES_PATH,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn invoice(status: InvoiceStatus, due: &str) -> Invoice {
        Invoice {
            id: 1,
            user_id: 2,
            payment_plan_id: Some(3),
            invoice_number: "INV-0001".into(),
            amount: Decimal::new(20000, 2),
            paid_amount: Decimal::ZERO,
            status,
            due_date: due.into(),
            created_at: None,
            updated_at: None,
            user: None,
        }
    }

    #[test]
    fn overdue_needs_open_status_and_past_due_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(is_overdue(&invoice(InvoiceStatus::Due, "2025-03-09"), today));
        assert!(is_overdue(&invoice(InvoiceStatus::Outstanding, "2025-01-01T00:00:00Z"), today));
        assert!(!is_overdue(&invoice(InvoiceStatus::Due, "2025-03-10"), today));
        assert!(!is_overdue(&invoice(InvoiceStatus::Paid, "2025-01-01"), today));
        assert!(!is_overdue(&invoice(InvoiceStatus::Upcoming, "2025-01-01"), today));
    }
}
