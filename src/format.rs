// format.rs
// Display helpers shared by the page views: US-dollar amounts and short dates.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// `$1,234.57` style, two decimals, half away from zero.
pub fn format_usd(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded = rounded.abs();
    rounded.rescale(2);

    let text = rounded.to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// `Jan 31, 2025`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Backend dates arrive either as `YYYY-MM-DD` or as full timestamps.
pub fn parse_backend_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Formatted backend date, or the raw text when it cannot be parsed.
pub fn display_backend_date(raw: &str) -> String {
    parse_backend_date(raw)
        .map(format_date)
        .unwrap_or_else(|| raw.to_string())
}
