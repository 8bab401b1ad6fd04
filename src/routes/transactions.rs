// routes/transactions.rs
// GET /transactions -> paid invoices, newest backend order, with search and
// paging. Students only see their own payments.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::Local;
use tracing::warn;

use crate::{
    models::InvoiceStatus,
    session::SessionUser,
    state::{AppState, list_invoices},
};

use super::helpers::*;
use super::invoices::{InvoiceListParams, InvoiceRow};
use super::pagination::PageWindow;

#[derive(Template)]
#[template(path = "transactions.html")]
struct TransactionsTemplate {
    layout: LayoutView,
    rows: Vec<InvoiceRow>,
    limit_options: Vec<SimpleOption>,
    search: String,
    window: PageWindow,
    page_href: String,
    error: Option<String>,
}

pub async fn transactions_index(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Query(params): Query<InvoiceListParams>,
) -> Response {
    let mut query = params.query(&session);
    query.status = Some(InvoiceStatus::Paid);
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
            warn!(error = %e, "listing transactions failed");
            let message = e.user_message().unwrap_or("Failed to load transactions").to_string();
            (Vec::new(), 0, Some(message))
        }
    };

    let filter_params: Vec<(&str, String)> = query
        .to_params()
        .into_iter()
        .filter(|(k, _)| !matches!(*k, "page" | "status" | "userId"))
        .collect();

    render_response(TransactionsTemplate {
        layout: layout(&st, &session).await,
        rows,
        limit_options: page_size_options(query.limit),
        search: query.search.clone().unwrap_or_default(),
        window: PageWindow::new(query.page, query.limit, total),
        page_href: format!("/transactions?{}", query_string(&filter_params)),
        error,
    })
}
