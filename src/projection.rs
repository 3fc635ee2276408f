use crate::dates::timestamp_to_date;
use crate::model::{CalendarEvent, RawEventRecord};
use chrono_tz::Tz;
use log::warn;

/// Title shown for records without a usable name.
pub const FALLBACK_TITLE: &str = "Untitled meetup";

/// Maps a hit to a grid event. Returns `None` when the record cannot be placed
/// on a day.
pub fn project(record: RawEventRecord, tz: Tz) -> Option<CalendarEvent> {
    let start_date = timestamp_to_date(record.start_date?, tz)?;

    let title = record
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_TITLE)
        .to_string();

    Some(CalendarEvent {
        id: record.object_id.clone(),
        title,
        start_date,
        metadata: record,
    })
}

/// Projects a whole result page, ordered by start time then id.
pub fn project_all(records: Vec<RawEventRecord>, tz: Tz) -> Vec<CalendarEvent> {
    let mut events: Vec<CalendarEvent> = records
        .into_iter()
        .filter_map(|record| {
            let id = record.object_id.clone();
            let projected = project(record, tz);
            if projected.is_none() {
                warn!("Skipping meetup {} without a usable start date.", id);
            }
            projected
        })
        .collect();

    events.sort_by(|a, b| {
        a.metadata
            .start_date
            .cmp(&b.metadata.start_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    events
}
