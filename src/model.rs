use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `{year, month}` currently shown in the grid.
///
/// Values come verbatim from the location, so `month` is not guaranteed to be
/// within `1..=12`. Use [`DisplayDate::first_day`] to get the normalized month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayDate {
    pub year: i32,
    pub month: i32,
}

impl DisplayDate {
    pub fn new(year: i32, month: i32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month() as i32,
        }
    }

    /// First day of the displayed month, rolling out-of-range months into the
    /// neighbouring years (`2024/13` is January 2025, `2024/0` is December 2023).
    pub fn first_day(&self) -> Option<NaiveDate> {
        let total = self.year.checked_mul(12)?.checked_add(self.month.checked_sub(1)?)?;
        let year = total.div_euclid(12);
        let month = total.rem_euclid(12) as u32 + 1;
        NaiveDate::from_ymd_opt(year, month, 1)
    }

    /// Shifts by whole months, starting from the normalized month.
    pub fn offset_months(&self, delta: i32) -> Option<Self> {
        let first = self.first_day()?;
        let shifted = DisplayDate::from_date(first);
        let total = shifted.year * 12 + (shifted.month - 1) + delta;
        Some(Self {
            year: total.div_euclid(12),
            month: total.rem_euclid(12) + 1,
        })
    }
}

/// Inclusive Unix-second bounds of a month in the reference timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start_unix: i64,
    pub end_unix: i64,
}

impl TimeRange {
    /// Numeric filter understood by the search service.
    pub fn filter(&self) -> String {
        format!(
            "startDate >= {} AND startDate <= {}",
            self.start_unix, self.end_unix
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub lqip: Option<String>,
}

/// A hit as stored in the `meetups` index. Fields the calendar does not know
/// about are kept in `extra` so the record travels through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEventRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<i64>,
    #[serde(rename = "endDate", default)]
    pub end_date: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "pictureMain", default)]
    pub picture_main: Option<Picture>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawEventRecord {
    pub fn picture_url(&self) -> Option<&str> {
        self.picture_main
            .as_ref()
            .and_then(|p| p.url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn lqip_url(&self) -> Option<&str> {
        self.picture_main
            .as_ref()
            .and_then(|p| p.lqip.as_deref())
            .filter(|u| !u.is_empty())
    }
}

/// The shape the month grid consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub metadata: RawEventRecord,
}

impl CalendarEvent {
    pub fn start_date_iso(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_day_normalizes_overflowing_months() {
        assert_eq!(
            DisplayDate::new(2024, 13).first_day(),
            NaiveDate::from_ymd_opt(2025, 1, 1)
        );
        assert_eq!(
            DisplayDate::new(2024, 0).first_day(),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(
            DisplayDate::new(2024, -11).first_day(),
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(DisplayDate::new(i32::MAX, 1).first_day(), None);
    }

    #[test]
    fn offset_months_crosses_year_boundaries() {
        let dec = DisplayDate::new(2024, 12);
        assert_eq!(dec.offset_months(1), Some(DisplayDate::new(2025, 1)));
        assert_eq!(
            DisplayDate::new(2025, 1).offset_months(-1),
            Some(DisplayDate::new(2024, 12))
        );
        assert_eq!(
            DisplayDate::new(2024, 14).offset_months(0),
            Some(DisplayDate::new(2025, 2))
        );
    }

    #[test]
    fn record_keeps_unknown_fields() {
        let json = r#"{
            "objectID": "rec42",
            "name": "Rust Paris",
            "startDate": 1709310600,
            "status": "✅ Confirmed",
            "pictureMain": { "url": "https://img/full.jpg", "lqip": "data:image/jpeg;base64,AAAA" }
        }"#;
        let record: RawEventRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.object_id, "rec42");
        assert_eq!(record.end_date, None);
        assert_eq!(record.picture_url(), Some("https://img/full.jpg"));
        assert_eq!(record.lqip_url(), Some("data:image/jpeg;base64,AAAA"));
        assert_eq!(
            record.extra.get("status"),
            Some(&Value::String("✅ Confirmed".to_string()))
        );
    }

    #[test]
    fn filter_uses_inclusive_bounds() {
        let range = TimeRange {
            start_unix: 10,
            end_unix: 20,
        };
        assert_eq!(range.filter(), "startDate >= 10 AND startDate <= 20");
    }
}
