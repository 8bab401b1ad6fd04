use rust_decimal::Decimal;
use serde::Serialize;

use super::generate::checked_total;
use super::{PlanType, Schedule, ScheduleItem};

pub const EMPTY_PREVIEW_MESSAGE: &str = "Fill in the form to see a preview of the payment schedule";
pub const MONTHLY_NOTE: &str = "Payments are scheduled monthly starting from the selected start date. The exact due dates are shown above.";

/// What the preview panel shows for a computed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchedulePreview {
    /// Not enough information yet.
    Empty,
    Ready(ScheduleSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub label: String,
    pub items: Vec<ScheduleItem>,
    pub total: Decimal,
    /// Installment share rounded to cents ("each payment will be
    /// approximately this amount"). `None` for one-time plans.
    pub per_installment_hint: Option<Decimal>,
    pub show_monthly_note: bool,
}

impl SchedulePreview {
    pub fn is_empty(&self) -> bool {
        matches!(self, SchedulePreview::Empty)
    }

    pub fn summary(&self) -> Option<&ScheduleSummary> {
        match self {
            SchedulePreview::Empty => None,
            SchedulePreview::Ready(summary) => Some(summary),
        }
    }
}

/// Derives the displayed total and label from a schedule. A total that
/// overflows `Decimal` is shown as an empty preview.
pub fn summarize(schedule: &Schedule, plan_type: PlanType) -> SchedulePreview {
    if schedule.is_empty() {
        return SchedulePreview::Empty;
    }

    let amounts: Vec<Decimal> = schedule.iter().map(|item| item.amount).collect();
    let Some(total) = checked_total(&amounts) else {
        return SchedulePreview::Empty;
    };
    let count = schedule.len();

    let (label, per_installment_hint) = match plan_type {
        PlanType::OneTime => ("Single payment".to_string(), None),
        PlanType::Installment => (
            format!("{count} monthly installments"),
            Some((total / Decimal::from(count as u64)).round_dp(2)),
        ),
    };

    SchedulePreview::Ready(ScheduleSummary {
        label,
        items: schedule.clone(),
        total,
        per_installment_hint,
        show_monthly_note: plan_type == PlanType::Installment && count > 1,
    })
}
