use reqwest::Method;

use crate::models::{Invoice, InvoicePage, InvoiceStatus, StatusUpdate};

use super::{ApiResult, AppState, clean_filter, normalize_paging};

/// Filters and paging for `GET /api/invoices`, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<InvoiceStatus>,
    pub search: Option<String>,
    pub user_id: Option<i64>,
}

impl Default for InvoiceQuery {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

impl InvoiceQuery {
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        status: Option<String>,
        search: Option<String>,
    ) -> Self {
        let (page, limit) = normalize_paging(page, limit);
        Self {
            page,
            limit,
            status: clean_filter(status).and_then(|s| InvoiceStatus::parse(&s)),
            search: clean_filter(search),
            user_id: None,
        }
    }

    /// Restricts the listing to one student's records.
    pub fn for_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id.filter(|id| *id > 0);
        self
    }

    pub fn has_filters(&self) -> bool {
        self.status.is_some() || self.search.is_some() || self.user_id.is_some()
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(user_id) = self.user_id {
            params.push(("userId", user_id.to_string()));
        }
        params
    }
}

pub async fn list_invoices(
    state: &AppState,
    api_token: &str,
    query: &InvoiceQuery,
) -> ApiResult<InvoicePage> {
    state
        .api
        .get(Some(api_token), "/api/invoices", &query.to_params())
        .await
}

pub async fn get_invoice(state: &AppState, api_token: &str, id: i64) -> ApiResult<Invoice> {
    state
        .api
        .get(Some(api_token), &format!("/api/invoices/{id}"), &[])
        .await
}

pub async fn mark_invoice_paid(state: &AppState, api_token: &str, id: i64) -> ApiResult<Invoice> {
    state
        .api
        .send::<(), _>(
            Method::POST,
            Some(api_token),
            &format!("/api/invoices/{id}/mark-paid"),
            None,
        )
        .await
}

pub async fn update_invoice_status(
    state: &AppState,
    api_token: &str,
    id: i64,
    status: InvoiceStatus,
) -> ApiResult<Invoice> {
    let body = StatusUpdate {
        status: status.as_str(),
    };
    state
        .api
        .send(
            Method::PATCH,
            Some(api_token),
            &format!("/api/invoices/{id}/status"),
            Some(&body),
        )
        .await
}

pub async fn list_user_invoices(
    state: &AppState,
    api_token: &str,
    user_id: i64,
) -> ApiResult<Vec<Invoice>> {
    state
        .api
        .get(Some(api_token), &format!("/api/invoices/user/{user_id}"), &[])
        .await
}

pub async fn delete_invoice(state: &AppState, api_token: &str, id: i64) -> ApiResult<()> {
    state
        .api
        .send_no_content(Method::DELETE, Some(api_token), &format!("/api/invoices/{id}"))
        .await
}
