use chrono::{Datelike, NaiveDate};

pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Round a currency amount to 2 decimal places for the API boundary.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `YYYY-MM` key for a calendar month.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

/// Parse a `YYYY-MM` key back into (year, month).
pub fn parse_month_key(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.split_once('-')?;
    let year = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// Advance (year, month) by `offset` months. `offset` starts at 0.
pub fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let total = year * 12 + (month as i32 - 1) + offset as i32;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap_or(d)
}

pub fn days_in_month(d: NaiveDate) -> u32 {
    let (ny, nm) = add_months(d.year(), d.month(), 1);
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|first_next| first_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
