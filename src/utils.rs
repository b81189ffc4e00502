use chrono::{Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// Shift a (year, month) pair by `delta` months. `delta` may be negative.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 + delta;
    (total.div_euclid(12), (total.rem_euclid(12) + 1) as u32)
}

pub fn months_between(start: (i32, u32), end: (i32, u32)) -> i32 {
    let year_diff = end.0 - start.0;
    let month_diff = end.1 as i32 - start.1 as i32;
    year_diff * 12 + month_diff
}
