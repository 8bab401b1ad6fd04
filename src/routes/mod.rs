// routes/mod.rs
// Route handlers and the router that wires them behind the session gate.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{session, state::AppState};

pub mod dashboard;
pub mod helpers;
pub mod invoices;
pub mod login;
pub mod logout;
pub mod not_found;
pub mod pagination;
pub mod payment_plans;
pub mod portal;
pub mod transactions;

pub use dashboard::{dashboard, root};
pub use invoices::{
    invoices_delete, invoices_index, invoices_mark_paid, invoices_show, invoices_update_status,
};
pub use login::{login, login_page};
pub use logout::logout;
pub use not_found::not_found;
pub use pagination::PageWindow;
pub use payment_plans::{
    plans_cancel, plans_create, plans_delete, plans_index, plans_new, plans_preview, plans_show,
    plans_update_status,
};
pub use portal::payment_portal;
pub use transactions::transactions_index;

pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/", get(root))
        .route("/dashboard", get(dashboard))
        .route("/logout", post(logout))
        .route("/payment-plans", get(plans_index).post(plans_create))
        .route("/payment-plans/new", get(plans_new))
        .route("/payment-plans/preview", post(plans_preview))
        .route("/payment-plans/{id}", get(plans_show))
        .route("/payment-plans/{id}/status", post(plans_update_status))
        .route("/payment-plans/{id}/cancel", post(plans_cancel))
        .route("/payment-plans/{id}/delete", post(plans_delete))
        .route("/invoices", get(invoices_index))
        .route("/invoices/{id}", get(invoices_show))
        .route("/invoices/{id}/mark-paid", post(invoices_mark_paid))
        .route("/invoices/{id}/status", post(invoices_update_status))
        .route("/invoices/{id}/delete", post(invoices_delete))
        .route("/transactions", get(transactions_index))
        .route("/payment-portal", get(payment_portal))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .route("/login", get(login_page).post(login))
        .merge(protected)
        .fallback(not_found)
        .with_state(state)
}
