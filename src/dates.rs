//! Date handling for the calendar.
//!
//! Every timestamp in the meetups index is authored in one fixed timezone and
//! has to be shown as authored, whatever the viewer's local zone is. All
//! conversions here take that zone explicitly.

use crate::model::{DisplayDate, TimeRange};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Zone the meetup timestamps are authored in.
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::Europe::Paris;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("{year}/{month} is outside the supported calendar range")]
    OutOfRange { year: i32, month: i32 },
}

/// Today's date as seen in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Picks the month to display from optional location segments.
///
/// Both segments must be present and parse as integers to be used; the
/// values are not range-checked. Anything else falls back to `today`.
pub fn resolve_display_date(
    year: Option<&str>,
    month: Option<&str>,
    today: NaiveDate,
) -> DisplayDate {
    let parsed = year
        .zip(month)
        .and_then(|(y, m)| Some((y.trim().parse::<i32>().ok()?, m.trim().parse::<i32>().ok()?)));

    match parsed {
        Some((year, month)) => DisplayDate::new(year, month),
        None => DisplayDate::from_date(today),
    }
}

/// First instant of `date` in `tz`. When local midnight falls in a DST gap
/// the day starts where the gap ends.
fn start_of_day(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    (0..24 * 60)
        .map(|minutes| midnight + Duration::minutes(minutes))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
}

impl TimeRange {
    /// First and last second of the displayed month in `tz`.
    pub fn for_month(date: DisplayDate, tz: Tz) -> Result<Self, DateError> {
        let out_of_range = || DateError::OutOfRange {
            year: date.year,
            month: date.month,
        };

        let first = date.first_day().ok_or_else(out_of_range)?;
        let next = first.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;

        let start = start_of_day(first, tz).ok_or_else(out_of_range)?;
        let next_start = start_of_day(next, tz).ok_or_else(out_of_range)?;

        Ok(TimeRange {
            start_unix: start.timestamp(),
            end_unix: next_start.timestamp() - 1,
        })
    }
}

/// Converts a Unix timestamp to a wall-clock time in `tz`.
pub fn to_reference(timestamp: i64, tz: Tz) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&tz))
}

/// Calendar day of a timestamp in `tz`.
pub fn timestamp_to_date(timestamp: i64, tz: Tz) -> Option<NaiveDate> {
    to_reference(timestamp, tz).map(|dt| dt.date_naive())
}

pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=13).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn format_time(dt: &DateTime<Tz>) -> String {
    dt.format("%-I:%M %P").to_string()
}

/// Human readable date and time span of an event.
///
/// `"March 1st, 2024, at 5:30 pm"` without an end,
/// `"March 2nd, 2024, from 9:00 am to 11:00 am"` with one.
pub fn format_event_datetime(start: i64, end: Option<i64>, tz: Tz) -> Option<String> {
    let start = to_reference(start, tz)?;
    let day = start.day();

    let date = format!(
        "{} {}{}, {}",
        start.format("%B"),
        day,
        ordinal_suffix(day),
        start.year()
    );

    match end.and_then(|e| to_reference(e, tz)) {
        Some(end) => Some(format!(
            "{}, from {} to {}",
            date,
            format_time(&start),
            format_time(&end)
        )),
        None => Some(format!("{}, at {}", date, format_time(&start))),
    }
}

/// Mondays of the week rows needed to show the month starting at `first`
/// with weekends hidden. Rows whose weekdays all fall in a neighbouring month
/// are left out.
pub fn visible_weeks(first: NaiveDate) -> Vec<NaiveDate> {
    let month = first.month();
    let Some(last) = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
    else {
        return vec![];
    };

    let mut monday = first - Duration::days(first.weekday().num_days_from_monday() as i64);
    let mut weeks = Vec::new();
    while monday <= last {
        if (0..5).any(|i| (monday + Duration::days(i)).month() == month) {
            weeks.push(monday);
        }
        monday += Duration::days(7);
    }
    weeks
}

pub fn month_name(month: u32) -> &'static str {
    [
        "",
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ]
    .get(month as usize)
    .copied()
    .unwrap_or("")
}
