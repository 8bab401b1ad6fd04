// routes/portal.rs
// GET /payment-portal -> the signed-in student's plans, invoices and balance.

use std::sync::Arc;

use askama::Template;
use axum::{extract::State, response::Response};
use chrono::Local;
use rust_decimal::Decimal;
use tracing::warn;

use crate::{
    format::{display_backend_date, format_date, format_usd, parse_backend_date},
    models::{Invoice, InvoiceStatus, PaymentPlan},
    session::SessionUser,
    state::{AppState, list_user_invoices, list_user_payment_plans},
};

use super::helpers::*;
use super::invoices::InvoiceRow;

#[derive(Template)]
#[template(path = "portal.html")]
struct PortalTemplate {
    layout: LayoutView,
    plans: Vec<PortalPlanRow>,
    invoices: Vec<InvoiceRow>,
    outstanding: String,
    next_due: Option<String>,
    overdue_count: usize,
    error: Option<String>,
}

struct PortalPlanRow {
    type_label: &'static str,
    status: &'static str,
    status_label: &'static str,
    total: String,
    paid: String,
    remaining: String,
    start_date: String,
    installments: String,
}

impl From<PaymentPlan> for PortalPlanRow {
    fn from(plan: PaymentPlan) -> Self {
        PortalPlanRow {
            type_label: plan.plan_type.label(),
            status: plan.status.as_str(),
            status_label: plan.status.label(),
            total: format_usd(plan.total_amount),
            paid: format_usd(plan.paid_amount),
            remaining: format_usd(plan.remaining_amount),
            start_date: display_backend_date(&plan.start_date),
            installments: plan
                .number_of_installments
                .map(|n| n.to_string())
                .unwrap_or_else(|| "1".into()),
        }
    }
}

pub async fn payment_portal(session: SessionUser, State(st): State<Arc<AppState>>) -> Response {
    if let Err(resp) = session.require_student() {
        return resp;
    }

    let mut error = None;
    let plans = match list_user_payment_plans(&st, session.api_token(), session.user_id()).await {
        Ok(plans) => plans,
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "loading student plans failed");
            error = Some("Failed to load your payment plans".to_string());
            Vec::new()
        }
    };
    let invoices = match list_user_invoices(&st, session.api_token(), session.user_id()).await {
        Ok(invoices) => invoices,
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "loading student invoices failed");
            error.get_or_insert_with(|| "Failed to load your invoices".to_string());
            Vec::new()
        }
    };

    let today = Local::now().date_naive();
    let outstanding = outstanding_balance(&invoices);
    let next_due = invoices
        .iter()
        .filter(|inv| inv.status != InvoiceStatus::Paid)
        .filter_map(|inv| parse_backend_date(&inv.due_date))
        .min()
        .map(format_date);
    let rows: Vec<InvoiceRow> = invoices
        .into_iter()
        .map(|inv| InvoiceRow::new(inv, today))
        .collect();

    render_response(PortalTemplate {
        layout: layout(&st, &session).await,
        plans: plans.into_iter().map(PortalPlanRow::from).collect(),
        overdue_count: rows.iter().filter(|r| r.overdue).count(),
        invoices: rows,
        outstanding: format_usd(outstanding),
        next_due,
        error,
    })
}

/// Unpaid part of every invoice that is not settled yet.
fn outstanding_balance(invoices: &[Invoice]) -> Decimal {
    invoices
        .iter()
        .filter(|inv| inv.status != InvoiceStatus::Paid)
        .map(|inv| (inv.amount - inv.paid_amount).max(Decimal::ZERO))
        .sum()
}
