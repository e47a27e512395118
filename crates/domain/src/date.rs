use chrono::prelude::*;
use chrono_tz::Tz;

pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 100 != 0 && year % 4 == 0)
}

// month: January -> 1
pub fn get_month_length(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => panic!("Invalid month"),
    }
}

/// The calendar date in `tz` of the given timestamp
pub fn local_date(timestamp_millis: i64, tz: &Tz) -> NaiveDate {
    let utc = Utc
        .timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    utc.with_timezone(tz).date_naive()
}

/// Timestamp of midnight at the start of `date` in `tz`.
///
/// When midnight does not exist (DST gap) the first valid instant after it is used.
pub fn start_of_day_millis(date: NaiveDate, tz: &Tz) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.timestamp_millis(),
        None => {
            let shifted = midnight + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .unwrap_or_else(|| Utc.from_utc_datetime(&midnight).timestamp_millis())
        }
    }
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// "1st", "2nd", "23rd", "11th"
pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", day, suffix)
}
