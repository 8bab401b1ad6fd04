use reqwest::Method;
use serde_json::Value;
use tracing::info;

use crate::models::{
    CreatePaymentPlan, PaymentPlan, PaymentPlanWithSchedules, PlanPage, PlanStatus, StatusUpdate,
};
use crate::schedule::PlanType;

use super::{ApiResult, AppState, clean_filter, normalize_paging};

/// Filters and paging for `GET /api/payment-plans`, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<PlanStatus>,
    pub plan_type: Option<PlanType>,
    pub search: Option<String>,
    pub user_id: Option<i64>,
}

impl Default for PlanQuery {
    fn default() -> Self {
        Self::new(None, None, None, None, None)
    }
}

impl PlanQuery {
    /// Unknown status/type values and blank search terms are dropped.
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        status: Option<String>,
        plan_type: Option<String>,
        search: Option<String>,
    ) -> Self {
        let (page, limit) = normalize_paging(page, limit);
        Self {
            page,
            limit,
            status: clean_filter(status).and_then(|s| PlanStatus::parse(&s)),
            plan_type: clean_filter(plan_type).and_then(|t| PlanType::parse(&t)),
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
        self.status.is_some() || self.plan_type.is_some() || self.search.is_some() || self.user_id.is_some()
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("limit", self.limit.to_string())];
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(plan_type) = self.plan_type {
            params.push(("type", plan_type.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(user_id) = self.user_id {
            params.push(("user_id", user_id.to_string()));
        }
        params
    }
}

pub async fn create_payment_plan(
    state: &AppState,
    api_token: &str,
    body: &CreatePaymentPlan,
) -> ApiResult<PaymentPlanWithSchedules> {
    let created: PaymentPlanWithSchedules = state
        .api
        .send(Method::POST, Some(api_token), "/api/payment-plans", Some(body))
        .await?;
    info!(
        plan_id = created.plan.id,
        user_id = body.user_id,
        plan_type = body.plan_type.as_str(),
        "payment plan created"
    );
    Ok(created)
}

pub async fn list_payment_plans(
    state: &AppState,
    api_token: &str,
    query: &PlanQuery,
) -> ApiResult<PlanPage> {
    state
        .api
        .get(Some(api_token), "/api/payment-plans", &query.to_params())
        .await
}

pub async fn get_payment_plan(
    state: &AppState,
    api_token: &str,
    id: i64,
) -> ApiResult<PaymentPlanWithSchedules> {
    state
        .api
        .get(Some(api_token), &format!("/api/payment-plans/{id}"), &[])
        .await
}

pub async fn list_user_payment_plans(
    state: &AppState,
    api_token: &str,
    user_id: i64,
) -> ApiResult<Vec<PaymentPlan>> {
    state
        .api
        .get(Some(api_token), &format!("/api/payment-plans/user/{user_id}"), &[])
        .await
}

/// Free-form summary object; its shape is owned by the backend.
pub async fn payment_plan_summary(state: &AppState, api_token: &str, id: i64) -> ApiResult<Value> {
    state
        .api
        .get(Some(api_token), &format!("/api/payment-plans/{id}/summary"), &[])
        .await
}

pub async fn update_payment_plan_status(
    state: &AppState,
    api_token: &str,
    id: i64,
    status: PlanStatus,
) -> ApiResult<PaymentPlan> {
    let body = StatusUpdate {
        status: status.as_str(),
    };
    state
        .api
        .send(
            Method::PATCH,
            Some(api_token),
            &format!("/api/payment-plans/{id}/status"),
            Some(&body),
        )
        .await
}

pub async fn cancel_payment_plan(state: &AppState, api_token: &str, id: i64) -> ApiResult<PaymentPlan> {
    state
        .api
        .send::<(), _>(
            Method::POST,
            Some(api_token),
            &format!("/api/payment-plans/{id}/cancel"),
            None,
        )
        .await
}

pub async fn delete_payment_plan(state: &AppState, api_token: &str, id: i64) -> ApiResult<()> {
    state
        .api
        .send_no_content(Method::DELETE, Some(api_token), &format!("/api/payment-plans/{id}"))
        .await
}
