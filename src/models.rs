// models.rs
// Domain models exchanged with the payment backend (JSON envelopes, users,
// payment plans, invoices, pagination).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::{PlanInput, PlanType};

/// User roles for authorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    pub fn is_student(&self) -> bool {
        matches!(self, UserRole::Student)
    }

    /// Landing page after login for this role.
    pub fn home_path(&self) -> &'static str {
        match self {
            UserRole::Admin => "/dashboard",
            UserRole::Student => "/payment-portal",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Student
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Trimmed user embedded in plan and invoice rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Entry of the student selector.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentOption {
    pub value: i64,
    pub label: String,
    pub email: String,
}

impl From<&User> for StudentOption {
    fn from(user: &User) -> Self {
        StudentOption {
            value: user.id,
            label: user.full_name(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub user: User,
}

/// Success envelope used by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<u16>,
}

impl ApiErrorBody {
    pub fn text(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Active,
    Completed,
    Cancelled,
}

impl PlanStatus {
    pub const ALL: [PlanStatus; 3] = [PlanStatus::Active, PlanStatus::Completed, PlanStatus::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "ACTIVE",
            PlanStatus::Completed => "COMPLETED",
            PlanStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanStatus::Active => "Active",
            PlanStatus::Completed => "Completed",
            PlanStatus::Cancelled => "Cancelled",
        }
    }

    /// Only running plans can be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, PlanStatus::Active)
    }

    /// Only cancelled plans can be removed.
    pub fn can_delete(&self) -> bool {
        matches!(self, PlanStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentPlan {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub remaining_amount: Decimal,
    pub status: PlanStatus,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(default)]
    pub number_of_installments: Option<u32>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleEntryStatus {
    Upcoming,
    Paid,
    Overdue,
    Cancelled,
}

impl ScheduleEntryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ScheduleEntryStatus::Upcoming => "Upcoming",
            ScheduleEntryStatus::Paid => "Paid",
            ScheduleEntryStatus::Overdue => "Overdue",
            ScheduleEntryStatus::Cancelled => "Cancelled",
        }
    }
}

/// Installment persisted by the backend for a created plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanScheduleEntry {
    pub installment_number: u32,
    pub due_date: String,
    pub amount: Decimal,
    pub status: ScheduleEntryStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentPlanWithSchedules {
    #[serde(flatten)]
    pub plan: PaymentPlan,
    #[serde(default)]
    pub schedules: Vec<PlanScheduleEntry>,
}

/// Body of `POST /api/payment-plans`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreatePaymentPlan {
    pub user_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(rename = "type")]
    pub plan_type: PlanType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_installments: Option<u32>,
    pub start_date: NaiveDate,
}

impl CreatePaymentPlan {
    /// Installment count is only sent for installment plans.
    pub fn from_input(user_id: i64, input: &PlanInput) -> Self {
        CreatePaymentPlan {
            user_id,
            total_amount: input.total_amount,
            plan_type: input.plan_type,
            number_of_installments: match input.plan_type {
                PlanType::Installment => input.number_of_installments,
                PlanType::OneTime => None,
            },
            start_date: input.start_date,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Upcoming,
    Due,
    Outstanding,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Upcoming,
        InvoiceStatus::Due,
        InvoiceStatus::Outstanding,
        InvoiceStatus::Partial,
        InvoiceStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Upcoming => "UPCOMING",
            InvoiceStatus::Due => "DUE",
            InvoiceStatus::Outstanding => "OUTSTANDING",
            InvoiceStatus::Partial => "PARTIAL",
            InvoiceStatus::Paid => "PAID",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Upcoming => "Upcoming",
            InvoiceStatus::Due => "Due",
            InvoiceStatus::Outstanding => "Outstanding",
            InvoiceStatus::Partial => "Partial",
            InvoiceStatus::Paid => "Paid",
        }
    }

    pub fn can_mark_paid(&self) -> bool {
        !matches!(self, InvoiceStatus::Paid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub payment_plan_id: Option<i64>,
    pub invoice_number: String,
    pub amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    pub status: InvoiceStatus,
    pub due_date: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub user: Option<UserRef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanPage {
    pub items: Vec<PaymentPlan>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate<'a> {
    pub status: &'a str,
}
