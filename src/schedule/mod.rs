// schedule module: payment-plan input types, validation, schedule generation
// and the preview summary. Pure functions only; nothing here talks to the
// backend or knows about sessions.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

mod generate;
mod preview;
mod validate;

pub use generate::*;
pub use preview::*;
pub use validate::*;

/// Plan kind as the backend names it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    OneTime,
    Installment,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::OneTime => "ONE_TIME",
            PlanType::Installment => "INSTALLMENT",
        }
    }

    /// Strict parse: only the two wire names are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ONE_TIME" => Some(PlanType::OneTime),
            "INSTALLMENT" => Some(PlanType::Installment),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlanType::OneTime => "One-Time Payment",
            PlanType::Installment => "Installment Plan",
        }
    }
}

impl Default for PlanType {
    fn default() -> Self {
        PlanType::OneTime
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw values of the four schedule-relevant form fields, exactly as typed.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct PlanForm {
    #[serde(default)]
    pub total_amount: Option<String>,
    #[serde(default, rename = "type")]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub number_of_installments: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl PlanForm {
    pub fn new(
        total_amount: &str,
        plan_type: &str,
        number_of_installments: Option<&str>,
        start_date: &str,
    ) -> Self {
        Self {
            total_amount: Some(total_amount.to_string()),
            plan_type: Some(plan_type.to_string()),
            number_of_installments: number_of_installments.map(str::to_string),
            start_date: Some(start_date.to_string()),
        }
    }
}

/// Normalized plan parameters. `number_of_installments` is always `None` for
/// one-time plans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanInput {
    pub total_amount: Decimal,
    pub plan_type: PlanType,
    pub number_of_installments: Option<u32>,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleItem {
    pub installment_number: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

/// Installments ordered by `installment_number`. Empty means "not enough
/// information yet".
pub type Schedule = Vec<ScheduleItem>;
