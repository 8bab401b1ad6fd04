// routes/payment_plans.rs
// Admin pages for payment plans: filtered list, create form with live
// schedule preview, detail page and the status/cancel/delete actions.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    format::{display_backend_date, format_date, format_usd},
    models::{PaymentPlan, PlanStatus, StudentOption},
    schedule::{
        CreatePlanForm, EMPTY_PREVIEW_MESSAGE, Field, FieldErrors, MONTHLY_NOTE, PlanForm, PlanType,
        SchedulePreview, latest_start_date, preview_from_form, summarize, validate_create,
    },
    session::SessionUser,
    state::{
        ApiError, AppState, Flash, PlanQuery, cancel_payment_plan, create_payment_plan,
        delete_payment_plan, get_payment_plan, get_user, list_payment_plans, list_students,
        payment_plan_summary, push_flash, search_students, update_payment_plan_status,
    },
};

use super::helpers::*;
use super::not_found::not_found;
use super::pagination::PageWindow;

const PLANS_PATH: &str = "/payment-plans";
const CREATE_FAILED: &str = "Failed to create payment plan. Please try again.";
const STUDENTS_FAILED: &str = "Failed to load students. Please refresh the page.";

#[derive(Template)]
#[template(path = "payment_plans/index.html")]
struct PlansIndexTemplate {
    layout: LayoutView,
    rows: Vec<PlanRow>,
    status_options: Vec<SimpleOption>,
    type_options: Vec<SimpleOption>,
    limit_options: Vec<SimpleOption>,
    search: String,
    user_id: String,
    has_filters: bool,
    window: PageWindow,
    page_href: String,
    error: Option<String>,
}

struct PlanRow {
    id: i64,
    student_name: String,
    student_email: Option<String>,
    total: String,
    paid: String,
    remaining: String,
    status: &'static str,
    status_label: &'static str,
    type_label: &'static str,
    installments: String,
    start_date: String,
    created: String,
    can_cancel: bool,
    can_delete: bool,
}

impl From<PaymentPlan> for PlanRow {
    fn from(plan: PaymentPlan) -> Self {
        let (student_name, student_email) = match &plan.user {
            Some(user) => (user.full_name(), Some(user.email.clone())),
            None => (format!("User #{}", plan.user_id), None),
        };
        PlanRow {
            id: plan.id,
            student_name,
            student_email,
            total: format_usd(plan.total_amount),
            paid: format_usd(plan.paid_amount),
            remaining: format_usd(plan.remaining_amount),
            status: plan.status.as_str(),
            status_label: plan.status.label(),
            type_label: plan.plan_type.label(),
            installments: plan
                .number_of_installments
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".into()),
            start_date: if plan.start_date.is_empty() {
                "N/A".into()
            } else {
                display_backend_date(&plan.start_date)
            },
            created: plan
                .created_at
                .as_deref()
                .map(display_backend_date)
                .unwrap_or_else(|| "-".into()),
            can_cancel: plan.status.can_cancel(),
            can_delete: plan.status.can_delete(),
        }
    }
}

#[derive(Template)]
#[template(path = "payment_plans/form.html")]
struct PlanFormTemplate {
    layout: LayoutView,
    students: Vec<StudentChoice>,
    student_search: String,
    total_amount: String,
    type_options: Vec<SimpleOption>,
    show_installments: bool,
    number_of_installments: String,
    start_date: String,
    min_date: String,
    max_date: String,
    user_id_error: Option<String>,
    total_amount_error: Option<String>,
    type_error: Option<String>,
    installments_error: Option<String>,
    start_date_error: Option<String>,
    form_error: Option<String>,
    preview: PreviewView,
}

struct StudentChoice {
    value: String,
    label: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "payment_plans/preview.html")]
struct PreviewTemplate {
    preview: PreviewView,
}

/// Display strings for the schedule preview panel.
struct PreviewView {
    ready: bool,
    label: String,
    rows: Vec<PreviewRow>,
    total: String,
    hint: Option<String>,
    show_monthly_note: bool,
    empty_message: &'static str,
    monthly_note: &'static str,
}

struct PreviewRow {
    number: u32,
    due_date: String,
    amount: String,
}

impl PreviewView {
    fn from_form(form: &PlanForm) -> Self {
        let plan_type = form
            .plan_type
            .as_deref()
            .and_then(PlanType::parse)
            .unwrap_or_default();
        Self::from_preview(&summarize(&preview_from_form(form), plan_type))
    }

    fn from_preview(preview: &SchedulePreview) -> Self {
        let mut view = PreviewView {
            ready: false,
            label: String::new(),
            rows: Vec::new(),
            total: String::new(),
            hint: None,
            show_monthly_note: false,
            empty_message: EMPTY_PREVIEW_MESSAGE,
            monthly_note: MONTHLY_NOTE,
        };
        if let Some(summary) = preview.summary() {
            view.ready = true;
            view.label = summary.label.clone();
            view.rows = summary
                .items
                .iter()
                .map(|item| PreviewRow {
                    number: item.installment_number,
                    due_date: format_date(item.due_date),
                    amount: format_usd(item.amount),
                })
                .collect();
            view.total = format_usd(summary.total);
            view.hint = summary.per_installment_hint.map(format_usd);
            view.show_monthly_note = summary.show_monthly_note;
        }
        view
    }
}

#[derive(Template)]
#[template(path = "payment_plans/show.html")]
struct PlanShowTemplate {
    layout: LayoutView,
    plan: PlanRow,
    student_name: String,
    student_email: Option<String>,
    end_date: String,
    schedules: Vec<ScheduleRow>,
    summary: Vec<(String, String)>,
    status_options: Vec<SimpleOption>,
}

struct ScheduleRow {
    number: u32,
    due_date: String,
    amount: String,
    status: &'static str,
}

#[derive(Deserialize, Default)]
pub struct PlanListParams {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PlanListParams {
    fn query(self) -> PlanQuery {
        let user_id = clean_opt(self.user_id).and_then(|v| v.parse::<i64>().ok());
        PlanQuery::new(
            parse_u32(self.page),
            parse_u32(self.limit),
            self.status,
            self.plan_type,
            self.search,
        )
        .for_user(user_id)
    }
}

#[derive(Deserialize, Default)]
pub struct NewPlanParams {
    #[serde(default)]
    pub student_search: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

pub async fn plans_index(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Query(params): Query<PlanListParams>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let query = params.query();
    let (rows, total, error) = match list_payment_plans(&st, session.api_token(), &query).await {
        Ok(page) => (
            page.items.into_iter().map(PlanRow::from).collect(),
            page.pagination.total,
            None,
        ),
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "listing payment plans failed");
            let message = e
                .user_message()
                .unwrap_or("Failed to load payment plans")
                .to_string();
            (Vec::new(), 0, Some(message))
        }
    };

    let filter_params: Vec<(&str, String)> = query
        .to_params()
        .into_iter()
        .filter(|(k, _)| *k != "page")
        .collect();

    render_response(PlansIndexTemplate {
        layout: layout(&st, &session).await,
        rows,
        status_options: plan_status_options(query.status),
        type_options: plan_type_filter_options(query.plan_type),
        limit_options: page_size_options(query.limit),
        search: query.search.clone().unwrap_or_default(),
        user_id: query.user_id.map(|id| id.to_string()).unwrap_or_default(),
        has_filters: query.has_filters(),
        window: PageWindow::new(query.page, query.limit, total),
        page_href: format!("{}?{}", PLANS_PATH, query_string(&filter_params)),
        error,
    })
}

pub async fn plans_new(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Query(params): Query<NewPlanParams>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let today = Local::now().date_naive();
    let form = CreatePlanForm {
        plan_type: Some(PlanType::OneTime.as_str().into()),
        start_date: Some(today.format("%Y-%m-%d").to_string()),
        ..CreatePlanForm::default()
    };
    let search = clean_opt(params.student_search);

    render_form(
        &st,
        &session,
        &form,
        search,
        today,
        &FieldErrors::new(),
        None,
        StatusCode::OK,
    )
    .await
}

pub async fn plans_preview(
    session: SessionUser,
    Form(form): Form<PlanForm>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    render_response(PreviewTemplate {
        preview: PreviewView::from_form(&form),
    })
}

pub async fn plans_create(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Form(form): Form<CreatePlanForm>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let today = Local::now().date_naive();
    let body = match validate_create(&form, today) {
        Ok(body) => body,
        Err(errors) => {
            return render_form(
                &st,
                &session,
                &form,
                None,
                today,
                &errors,
                None,
                StatusCode::UNPROCESSABLE_ENTITY,
            )
            .await;
        }
    };

    match create_payment_plan(&st, session.api_token(), &body).await {
        Ok(_) => {
            push_flash(
                &st,
                session.token(),
                Flash::success("Payment plan created successfully!"),
            )
            .await;
            Redirect::to(PLANS_PATH).into_response()
        }
        Err(e) if e.is_unauthorized() => session_expired(&st, &session).await,
        Err(e) => {
            warn!(error = %e, "creating payment plan failed");
            let message = e.user_message().unwrap_or(CREATE_FAILED).to_string();
            render_form(
                &st,
                &session,
                &form,
                None,
                today,
                &FieldErrors::new(),
                Some(message),
                StatusCode::BAD_GATEWAY,
            )
            .await
        }
    }
}

pub async fn plans_show(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let detail = match get_payment_plan(&st, session.api_token(), id).await {
        Ok(detail) => detail,
        Err(ApiError::NotFound(_)) => return not_found().await,
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(plan_id = id, error = %e, "loading payment plan failed");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let (student_name, student_email) = match &detail.plan.user {
        Some(user) => (user.full_name(), Some(user.email.clone())),
        None => match get_user(&st, session.api_token(), detail.plan.user_id).await {
            Ok(user) => (user.full_name(), Some(user.email)),
            Err(_) => (format!("User #{}", detail.plan.user_id), None),
        },
    };

    let summary = match payment_plan_summary(&st, session.api_token(), id).await {
        Ok(value) => summary_pairs(&value),
        Err(e) if e.is_unauthorized() => return session_expired(&st, &session).await,
        Err(e) => {
            warn!(plan_id = id, error = %e, "loading plan summary failed");
            Vec::new()
        }
    };

    let schedules = detail
        .schedules
        .iter()
        .map(|s| ScheduleRow {
            number: s.installment_number,
            due_date: display_backend_date(&s.due_date),
            amount: format_usd(s.amount),
            status: s.status.label(),
        })
        .collect();
    let end_date = detail
        .plan
        .end_date
        .as_deref()
        .map(display_backend_date)
        .unwrap_or_else(|| "-".into());
    let current_status = detail.plan.status;

    render_response(PlanShowTemplate {
        layout: layout(&st, &session).await,
        plan: PlanRow::from(detail.plan),
        student_name,
        student_email,
        end_date,
        schedules,
        summary,
        status_options: PlanStatus::ALL
            .into_iter()
            .map(|s| SimpleOption {
                value: s.as_str().into(),
                label: s.label().into(),
                selected: s == current_status,
            })
            .collect(),
    })
}

pub async fn plans_update_status(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let back_to = format!("{PLANS_PATH}/{id}");
    let Some(status) = PlanStatus::parse(form.status.trim()) else {
        push_flash(
            &st,
            session.token(),
            Flash::error("Failed to update payment plan status"),
        )
        .await;
        return Redirect::to(&back_to).into_response();
    };

    let result = update_payment_plan_status(&st, session.api_token(), id, status).await;
    finish_action(
        &st,
        &session,
        result,
        format!("Payment plan status updated to {}", status.as_str()),
        "Failed to update payment plan status",
        &back_to,
    )
    .await
}

pub async fn plans_cancel(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let result = cancel_payment_plan(&st, session.api_token(), id).await;
    finish_action(
        &st,
        &session,
        result,
        "Payment plan cancelled successfully",
        "Failed to cancel payment plan",
        PLANS_PATH,
    )
    .await
}

pub async fn plans_delete(
    session: SessionUser,
    State(st): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = session.require_admin() {
        return resp;
    }

    let result = delete_payment_plan(&st, session.api_token(), id).await;
    finish_action(
        &st,
        &session,
        result,
        "Payment plan deleted successfully",
        "Failed to delete payment plan",
        PLANS_PATH,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn render_form(
    st: &AppState,
    session: &SessionUser,
    form: &CreatePlanForm,
    student_search: Option<String>,
    today: NaiveDate,
    errors: &FieldErrors,
    form_error: Option<String>,
    status: StatusCode,
) -> Response {
    let students = match &student_search {
        Some(q) => search_students(st, session.api_token(), q).await,
        None => list_students(st, session.api_token()).await,
    };
    let (students, form_error) = match students {
        Ok(list) => (list, form_error),
        Err(e) if e.is_unauthorized() => return session_expired(st, session).await,
        Err(e) => {
            warn!(error = %e, "loading students failed");
            (Vec::new(), form_error.or_else(|| Some(STUDENTS_FAILED.into())))
        }
    };

    let selected_user = form.user_id.as_deref().unwrap_or_default();
    let plan_type = form.plan_type.as_deref().and_then(PlanType::parse);
    let error = |field: Field| errors.get(field).map(str::to_string);

    let tpl = PlanFormTemplate {
        layout: layout(st, session).await,
        students: student_choices(&students, selected_user.trim()),
        student_search: student_search.unwrap_or_default(),
        total_amount: form.total_amount.clone().unwrap_or_default(),
        type_options: plan_type_options(plan_type.or(Some(PlanType::OneTime))),
        show_installments: plan_type == Some(PlanType::Installment),
        number_of_installments: form.number_of_installments.clone().unwrap_or_default(),
        start_date: form.start_date.clone().unwrap_or_default(),
        min_date: today.format("%Y-%m-%d").to_string(),
        max_date: latest_start_date(today).format("%Y-%m-%d").to_string(),
        user_id_error: error(Field::UserId),
        total_amount_error: error(Field::TotalAmount),
        type_error: error(Field::Type),
        installments_error: error(Field::NumberOfInstallments),
        start_date_error: error(Field::StartDate),
        form_error,
        preview: PreviewView::from_form(&form.plan()),
    };

    match render(tpl) {
        Ok(html) => (status, html).into_response(),
        Err(status) => status.into_response(),
    }
}

fn student_choices(students: &[StudentOption], selected: &str) -> Vec<StudentChoice> {
    students
        .iter()
        .map(|s| {
            let value = s.value.to_string();
            StudentChoice {
                selected: value == selected,
                label: format!("{} ({})", s.label, s.email),
                value,
            }
        })
        .collect()
}

/// Scalar top-level entries of the backend's summary object, in its order.
fn summary_pairs(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, v)| {
            let text = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((humanize_key(key), text))
        })
        .collect()
}

fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_u32(value: Option<String>) -> Option<u32> {
    clean_opt(value).and_then(|v| v.parse().ok())
}
