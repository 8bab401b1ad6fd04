use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use super::validate::{
    MAX_INSTALLMENTS, MIN_INSTALLMENTS, amount_in_range, non_blank, parse_amount, parse_date,
};
use super::{PlanForm, PlanInput, PlanType, Schedule, ScheduleItem};

/// How an installment total is split into shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundingPolicy {
    /// Every share is the plain decimal quotient `total / n`. The shares may
    /// not add back to the total in whole cents.
    #[default]
    Unrounded,
    /// Shares rounded to cents; the last installment takes the remainder so
    /// the sum equals the total exactly.
    AbsorbInLast,
}

/// Schedule with the default (unrounded) split.
pub fn generate_schedule(input: &PlanInput) -> Schedule {
    generate_schedule_with(input, RoundingPolicy::default())
}

/// Builds the installment list for an already-validated input.
///
/// Inputs that fail basic sanity (non-positive amount, missing or
/// out-of-range installment count, a due date past the calendar's end)
/// produce an empty schedule instead of an error.
pub fn generate_schedule_with(input: &PlanInput, policy: RoundingPolicy) -> Schedule {
    if input.total_amount <= Decimal::ZERO {
        return Vec::new();
    }

    match input.plan_type {
        PlanType::OneTime => vec![ScheduleItem {
            installment_number: 1,
            due_date: input.start_date,
            amount: input.total_amount,
        }],
        PlanType::Installment => {
            let Some(count) = input
                .number_of_installments
                .filter(|n| (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).contains(n))
            else {
                return Vec::new();
            };

            let Some(amounts) = split_amount(input.total_amount, count, policy) else {
                return Vec::new();
            };

            amounts
                .into_iter()
                .enumerate()
                .map(|(index, amount)| {
                    let index = index as u32;
                    Some(ScheduleItem {
                        installment_number: index + 1,
                        due_date: add_months_clamped(input.start_date, index)?,
                        amount,
                    })
                })
                .collect::<Option<Schedule>>()
                .unwrap_or_default()
        }
    }
}

/// Schedule straight from raw form values, for the live preview.
///
/// Parsing is lenient in the sense that anything missing, unparsable or
/// outside the accepted amount range just yields an empty schedule; the
/// start-date window is not enforced here.
pub fn preview_from_form(form: &PlanForm) -> Schedule {
    let (Some(amount), Some(plan_type), Some(start)) = (
        non_blank(&form.total_amount),
        non_blank(&form.plan_type),
        non_blank(&form.start_date),
    ) else {
        return Vec::new();
    };

    let Some(total_amount) = parse_amount(amount).filter(|a| amount_in_range(*a)) else {
        return Vec::new();
    };
    let Some(plan_type) = PlanType::parse(plan_type) else {
        return Vec::new();
    };
    let Some(start_date) = parse_date(start) else {
        return Vec::new();
    };

    let number_of_installments = match plan_type {
        PlanType::OneTime => None,
        PlanType::Installment => {
            match non_blank(&form.number_of_installments).and_then(|v| v.parse::<u32>().ok()) {
                Some(n) => Some(n),
                None => return Vec::new(),
            }
        }
    };

    generate_schedule(&PlanInput {
        total_amount,
        plan_type,
        number_of_installments,
        start_date,
    })
}

/// `start + months`, clamping the day to the end of the target month
/// (Jan 31 + 1 month = Feb 28, or Feb 29 in a leap year).
pub fn add_months_clamped(start: NaiveDate, months: u32) -> Option<NaiveDate> {
    start.checked_add_months(Months::new(months))
}

/// `None` when the rounded shares do not fit in a `Decimal`.
fn split_amount(total: Decimal, count: u32, policy: RoundingPolicy) -> Option<Vec<Decimal>> {
    let divisor = Decimal::from(count);
    match policy {
        RoundingPolicy::Unrounded => Some(vec![total / divisor; count as usize]),
        RoundingPolicy::AbsorbInLast => {
            let share = (total / divisor).round_dp(2);
            let mut amounts = vec![share; count as usize - 1];
            let distributed = checked_total(&amounts)?;
            amounts.push(total.checked_sub(distributed)?);
            Some(amounts)
        }
    }
}

/// Sum that reports overflow instead of panicking.
pub(crate) fn checked_total(amounts: &[Decimal]) -> Option<Decimal> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(*amount))
}
