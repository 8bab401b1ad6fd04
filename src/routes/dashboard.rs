// routes/dashboard.rs
// GET / -> /dashboard; GET /dashboard -> overview cards for the user's role.

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::{
    session::SessionUser,
    state::{AppState, current_user, refresh_session_user},
};

use super::helpers::*;

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    layout: LayoutView,
    greeting_name: String,
    cards: Vec<DashboardCard>,
}

struct DashboardCard {
    title: &'static str,
    description: &'static str,
    href: &'static str,
    action: &'static str,
}

const PLANS_CARD: DashboardCard = DashboardCard {
    title: "Payment Plans",
    description: "Manage payment plans",
    href: "/payment-plans",
    action: "View Plans",
};

const INVOICES_CARD: DashboardCard = DashboardCard {
    title: "Invoices",
    description: "View and manage invoices",
    href: "/invoices",
    action: "View Invoices",
};

const TRANSACTIONS_CARD: DashboardCard = DashboardCard {
    title: "Transactions",
    description: "Payment transaction history",
    href: "/transactions",
    action: "View Transactions",
};

const PORTAL_CARD: DashboardCard = DashboardCard {
    title: "Payment Portal",
    description: "Your payment plans and invoices",
    href: "/payment-portal",
    action: "Make Payment",
};

pub async fn root() -> Redirect {
    Redirect::to("/dashboard")
}

pub async fn dashboard(session: SessionUser, State(st): State<Arc<AppState>>) -> Response {
    // Pick up role or name changes made on the backend since login.
    let user = match current_user(&st, session.api_token()).await {
        Ok(user) => {
            refresh_session_user(&st, session.token(), user.clone()).await;
            user
        }
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "could not refresh current user");
            session.user().clone()
        }
    };

    let mut layout = layout(&st, &session).await;
    layout.user_name = user.full_name();
    layout.is_admin = user.role.is_admin();
    layout.is_student = user.role.is_student();
    layout.role = user.role.as_str();

    let cards = if user.role.is_admin() {
        vec![PLANS_CARD, INVOICES_CARD, TRANSACTIONS_CARD]
    } else {
        vec![INVOICES_CARD, TRANSACTIONS_CARD, PORTAL_CARD]
    };

    render(DashboardTemplate {
        layout,
        greeting_name: user.first_name,
        cards,
    })
    .into_response()
}
