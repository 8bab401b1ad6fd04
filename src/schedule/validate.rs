use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{Local, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::CreatePaymentPlan;

use super::{PlanForm, PlanInput, PlanType};

pub const MIN_TOTAL_AMOUNT: Decimal = Decimal::from_parts(100, 0, 0, false, 2);
pub const MAX_TOTAL_AMOUNT: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);
pub const MIN_INSTALLMENTS: u32 = 2;
pub const MAX_INSTALLMENTS: u32 = 12;
pub const START_DATE_WINDOW_MONTHS: u32 = 12;

pub const MSG_AMOUNT_REQUIRED: &str = "Total amount is required";
pub const MSG_AMOUNT_RANGE: &str = "Total amount must be between $1.00 and $999,999.99";
pub const MSG_TYPE_INVALID: &str = "Payment type must be ONE_TIME or INSTALLMENT";
pub const MSG_INSTALLMENTS_RANGE: &str = "Number of installments must be between 2 and 12";
pub const MSG_START_REQUIRED: &str = "Start date is required";
pub const MSG_START_INVALID: &str = "Start date must be a valid date";
pub const MSG_START_PAST: &str = "Start date cannot be in the past";
pub const MSG_START_TOO_FAR: &str = "Start date must be within one year";
pub const MSG_STUDENT_REQUIRED: &str = "Student is required";
pub const MSG_STUDENT_INVALID: &str = "Please select a valid student";

/// Form fields that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    UserId,
    TotalAmount,
    Type,
    NumberOfInstallments,
    StartDate,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::UserId => "user_id",
            Field::TotalAmount => "total_amount",
            Field::Type => "type",
            Field::NumberOfInstallments => "number_of_installments",
            Field::StartDate => "start_date",
        }
    }
}

/// One message per field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.add(field, message);
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(field, msg)| format!("{}: {}", field.as_str(), msg))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Full create form: the schedule fields plus the selected student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePlanForm {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub total_amount: Option<String>,
    #[serde(default, rename = "type")]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub number_of_installments: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl CreatePlanForm {
    /// The schedule-relevant subset, as fed to the preview.
    pub fn plan(&self) -> PlanForm {
        PlanForm {
            total_amount: self.total_amount.clone(),
            plan_type: self.plan_type.clone(),
            number_of_installments: self.number_of_installments.clone(),
            start_date: self.start_date.clone(),
        }
    }
}

/// Validates the schedule fields against `today`.
///
/// Every rule runs independently so the caller can show all problems at
/// once. The installment count is only required for installment plans and is
/// dropped for one-time plans.
pub fn validate(form: &PlanForm, today: NaiveDate) -> Result<PlanInput, FieldErrors> {
    let mut errors = FieldErrors::new();

    let total_amount = match non_blank(&form.total_amount) {
        None => {
            errors.add(Field::TotalAmount, MSG_AMOUNT_REQUIRED);
            None
        }
        Some(raw) => match parse_amount(raw) {
            Some(amount) if amount_in_range(amount) => Some(amount),
            _ => {
                errors.add(Field::TotalAmount, MSG_AMOUNT_RANGE);
                None
            }
        },
    };

    let plan_type = match form.plan_type.as_deref().map(str::trim).and_then(PlanType::parse) {
        Some(t) => Some(t),
        None => {
            errors.add(Field::Type, MSG_TYPE_INVALID);
            None
        }
    };

    let installments = non_blank(&form.number_of_installments).and_then(|v| v.parse::<u32>().ok());

    let start_date = match non_blank(&form.start_date) {
        None => {
            errors.add(Field::StartDate, MSG_START_REQUIRED);
            None
        }
        Some(raw) => match parse_date(raw) {
            None => {
                errors.add(Field::StartDate, MSG_START_INVALID);
                None
            }
            Some(date) if date < today => {
                errors.add(Field::StartDate, MSG_START_PAST);
                None
            }
            Some(date) if date > latest_start_date(today) => {
                errors.add(Field::StartDate, MSG_START_TOO_FAR);
                None
            }
            Some(date) => Some(date),
        },
    };

    let number_of_installments = match plan_type {
        Some(PlanType::Installment) => match installments {
            Some(n) if (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(&n) => Some(n),
            _ => {
                errors.add(Field::NumberOfInstallments, MSG_INSTALLMENTS_RANGE);
                None
            }
        },
        _ => None,
    };

    match (total_amount, plan_type, start_date) {
        (Some(total_amount), Some(plan_type), Some(start_date)) if errors.is_empty() => {
            Ok(PlanInput {
                total_amount,
                plan_type,
                number_of_installments,
                start_date,
            })
        }
        _ => Err(errors),
    }
}

/// [`validate`] against the local calendar date.
pub fn validate_today(form: &PlanForm) -> Result<PlanInput, FieldErrors> {
    validate(form, Local::now().date_naive())
}

/// Validates the student selector together with the schedule fields and
/// builds the request body for the backend.
pub fn validate_create(
    form: &CreatePlanForm,
    today: NaiveDate,
) -> Result<CreatePaymentPlan, FieldErrors> {
    let mut errors = FieldErrors::new();

    let user_id = match non_blank(&form.user_id) {
        None => {
            errors.add(Field::UserId, MSG_STUDENT_REQUIRED);
            None
        }
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                errors.add(Field::UserId, MSG_STUDENT_INVALID);
                None
            }
        },
    };

    let plan = validate(&form.plan(), today);
    if let Err(plan_errors) = &plan {
        errors.merge(plan_errors.clone());
    }

    match (user_id, plan) {
        (Some(user_id), Ok(input)) => Ok(CreatePaymentPlan::from_input(user_id, &input)),
        _ => Err(errors),
    }
}

/// Last acceptable start date: same calendar day one year out, clamped to
/// month end (Feb 29 maps to Feb 28).
pub fn latest_start_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(START_DATE_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub(crate) fn amount_in_range(amount: Decimal) -> bool {
    amount >= MIN_TOTAL_AMOUNT && amount <= MAX_TOTAL_AMOUNT
}
