//! pt-BR display helpers used when rendering lists.

use chrono::NaiveDate;

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `1234.5` -> `R$ 1.234,50`
pub fn format_currency(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();

    let units = (cents / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (idx, digit) in units.chars().enumerate() {
        if idx > 0 && (units.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    format!("{sign}R$ {grouped},{:02}", cents % 100)
}
