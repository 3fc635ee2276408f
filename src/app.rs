use crate::dates::{resolve_display_date, DateError};
use crate::modal::EventModal;
use crate::model::{CalendarEvent, DisplayDate, RawEventRecord, TimeRange};
use crate::projection::project_all;
use crate::route::{month_path, DisplayMode, HistoryMode, Navigator, Route};
use crate::search::SearchError;
use crate::sizer::GridSizer;
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use log::{debug, error, info};
use ratatui::layout::Rect;

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load meetups. Please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// Screen areas recorded while drawing, used to resolve mouse clicks.
#[derive(Debug, Clone, Default)]
pub struct HitAreas {
    pub events: Vec<(usize, Rect)>,
    pub prev: Rect,
    pub next: Rect,
    pub title: Rect,
    pub help: Rect,
    pub exit_fullscreen: Rect,
    pub modal: Rect,
    pub modal_close: Rect,
    pub description_toggle: Rect,
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.left() && x < area.right() && y >= area.top() && y < area.bottom()
}

pub struct App {
    pub tz: Tz,
    pub today: NaiveDate,
    pub history_mode: HistoryMode,
    pub navigator: Navigator,
    pub mode: DisplayMode,
    pub display_date: DisplayDate,
    pub events: Vec<CalendarEvent>,
    pub load_state: LoadState,
    pub selected: Option<usize>,
    pub modal: EventModal,
    pub grid: GridSizer,
    pub show_help: bool,
    pub hit_areas: HitAreas,
    query_needed: bool,
}

impl App {
    pub fn new(tz: Tz, history_mode: HistoryMode, location: &str, today: NaiveDate) -> Self {
        let mut app = Self {
            tz,
            today,
            history_mode,
            navigator: Navigator::new(location, history_mode),
            mode: DisplayMode::Website,
            display_date: DisplayDate::from_date(today),
            events: vec![],
            load_state: LoadState::Loading,
            selected: None,
            modal: EventModal::default(),
            grid: GridSizer::default(),
            show_help: false,
            hit_areas: HitAreas::default(),
            query_needed: true,
        };
        app.apply_location();
        app
    }

    // --- Location ---

    /// Re-derives mode and month from the current location.
    fn apply_location(&mut self) {
        let mut route = self.navigator.route();
        if route == Route::LegacyFullscreen {
            self.navigator.replace(month_path(
                self.today.year(),
                self.today.month(),
                DisplayMode::Fullscreen,
            ));
            route = self.navigator.route();
        }
        self.show_route(&route);

        // The grid reports its visible range on first render; out-of-range
        // months and `/` converge to the canonical location here.
        if let Some(first) = self.display_date.first_day() {
            if self
                .navigator
                .sync_visible_range(first, self.mode, HistoryMode::Replace)
            {
                let route = self.navigator.route();
                self.show_route(&route);
            }
        }
    }

    fn show_route(&mut self, route: &Route) {
        let date = match route {
            Route::Month { year, month, .. } => {
                resolve_display_date(Some(year.as_str()), Some(month.as_str()), self.today)
            }
            Route::Home | Route::LegacyFullscreen => {
                resolve_display_date(None, None, self.today)
            }
        };

        self.mode = route.mode();
        self.modal.close();

        if date != self.display_date {
            debug!("Display date {:?} -> {:?}", self.display_date, date);
            self.display_date = date;
            self.events.clear();
            self.selected = None;
            self.query_needed = true;
        }
    }

    pub fn navigate_to(&mut self, target: String) -> bool {
        if self.navigator.navigate(target) {
            self.apply_location();
            true
        } else {
            false
        }
    }

    /// Called whenever the grid starts showing a different range.
    pub fn visible_range_changed(&mut self, visible_start: NaiveDate) -> bool {
        if self
            .navigator
            .sync_visible_range(visible_start, self.mode, self.history_mode)
        {
            self.apply_location();
            true
        } else {
            false
        }
    }

    fn shift_month(&mut self, delta: i32) {
        if let Some(first) = self
            .display_date
            .offset_months(delta)
            .and_then(|d| d.first_day())
        {
            self.visible_range_changed(first);
        }
    }

    pub fn next_month(&mut self) {
        self.shift_month(1);
    }

    pub fn previous_month(&mut self) {
        self.shift_month(-1);
    }

    pub fn go_today(&mut self) {
        let target = month_path(self.today.year(), self.today.month(), self.mode);
        self.navigate_to(target);
    }

    fn path_for_mode(&self, mode: DisplayMode) -> String {
        let first = self
            .display_date
            .first_day()
            .unwrap_or_else(|| self.today.with_day(1).unwrap_or(self.today));
        month_path(first.year(), first.month(), mode)
    }

    pub fn enter_fullscreen(&mut self) -> bool {
        let target = self.path_for_mode(DisplayMode::Fullscreen);
        self.navigate_to(target)
    }

    pub fn exit_fullscreen(&mut self) -> bool {
        let target = self.path_for_mode(DisplayMode::Website);
        self.navigate_to(target)
    }

    pub fn back(&mut self) -> bool {
        if self.navigator.back() {
            self.apply_location();
            true
        } else {
            false
        }
    }

    // --- Queries ---

    pub fn query_needed(&self) -> bool {
        self.query_needed
    }

    pub fn request_refresh(&mut self) {
        self.query_needed = true;
    }

    /// Marks the current month as loading and returns the range to query.
    pub fn begin_query(&mut self) -> Result<TimeRange, DateError> {
        self.query_needed = false;
        match TimeRange::for_month(self.display_date, self.tz) {
            Ok(range) => {
                self.load_state = LoadState::Loading;
                Ok(range)
            }
            Err(e) => {
                error!("Cannot query meetups: {}", e);
                self.events.clear();
                self.selected = None;
                self.load_state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Applies a query result. Results for any month other than the one on
    /// screen are dropped. Returns whether the result was used.
    pub fn accept_meetups(
        &mut self,
        display_date: DisplayDate,
        result: Result<Vec<RawEventRecord>, SearchError>,
    ) -> bool {
        if display_date != self.display_date {
            debug!(
                "Discarding stale result for {:?}, showing {:?}.",
                display_date, self.display_date
            );
            return false;
        }

        match result {
            Ok(records) => {
                self.events = project_all(records, self.tz);
                info!(
                    "Showing {} meetups for {}/{}.",
                    self.events.len(),
                    display_date.year,
                    display_date.month
                );
                self.load_state = LoadState::Loaded;
                self.selected = self.selected.filter(|i| *i < self.events.len());
                if self.selected.is_none() && !self.events.is_empty() {
                    self.selected = Some(0);
                }
            }
            Err(e) => {
                error!("Failed to load meetups: {}", e);
                self.events.clear();
                self.selected = None;
                self.load_state = LoadState::Failed(LOAD_ERROR_MESSAGE.to_string());
            }
        }
        true
    }

    // --- Selection and modal ---

    pub fn events_on(&self, day: NaiveDate) -> impl Iterator<Item = (usize, &CalendarEvent)> {
        self.events
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.start_date == day)
    }

    pub fn next_item(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.events.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    pub fn previous_item(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.events.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    pub fn selected_event(&self) -> Option<&CalendarEvent> {
        self.selected.and_then(|i| self.events.get(i))
    }

    pub fn open_event(&mut self, index: usize) {
        if let Some(event) = self.events.get(index).cloned() {
            self.selected = Some(index);
            self.modal.open(event);
        }
    }

    pub fn open_selected(&mut self) {
        if let Some(i) = self.selected {
            self.open_event(i);
        }
    }

    /// Escape goes to the topmost layer only. Returns whether it was used.
    pub fn escape(&mut self) -> bool {
        if self.show_help {
            self.show_help = false;
            true
        } else if self.modal.close() {
            true
        } else if self.mode == DisplayMode::Fullscreen {
            self.exit_fullscreen()
        } else {
            false
        }
    }

    // --- Mouse ---

    pub fn click(&mut self, x: u16, y: u16) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.modal.is_open() {
            let areas = &self.hit_areas;
            if contains(areas.modal_close, x, y) {
                self.modal.close();
            } else if contains(areas.description_toggle, x, y) {
                self.modal.toggle_description();
            } else if !contains(areas.modal, x, y) {
                // Backdrop.
                self.modal.close();
            }
            return;
        }

        let hit = self
            .hit_areas
            .events
            .iter()
            .find(|(_, area)| contains(*area, x, y))
            .map(|(i, _)| *i);
        if let Some(i) = hit {
            self.open_event(i);
            return;
        }

        let areas = self.hit_areas.clone();
        match self.mode {
            DisplayMode::Website => {
                if contains(areas.prev, x, y) {
                    self.previous_month();
                } else if contains(areas.next, x, y) {
                    self.next_month();
                } else if contains(areas.title, x, y) {
                    self.go_today();
                } else if contains(areas.help, x, y) {
                    self.show_help = true;
                }
            }
            DisplayMode::Fullscreen => {
                if contains(areas.exit_fullscreen, x, y) {
                    self.exit_fullscreen();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::REFERENCE_TIMEZONE;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn app(location: &str) -> App {
        App::new(REFERENCE_TIMEZONE, HistoryMode::Push, location, today())
    }

    fn hit(id: &str, y: i32, m: u32, d: u32) -> RawEventRecord {
        RawEventRecord {
            object_id: id.to_string(),
            name: Some(format!("Meetup {}", id)),
            start_date: Some(
                REFERENCE_TIMEZONE
                    .with_ymd_and_hms(y, m, d, 19, 0, 0)
                    .single()
                    .unwrap()
                    .timestamp(),
            ),
            end_date: None,
            url: None,
            description: Some("d".repeat(301)),
            picture_main: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn home_converges_to_the_current_month() {
        let app = app("/");
        assert_eq!(app.display_date, DisplayDate::new(2026, 10));
        assert_eq!(app.navigator.current(), "/2026/10");
        assert!(!app.navigator.can_go_back());
        assert!(app.query_needed());
    }

    #[test]
    fn legacy_fullscreen_redirects() {
        let app = app("/fullscreen");
        assert_eq!(app.mode, DisplayMode::Fullscreen);
        assert_eq!(app.navigator.current(), "/2026/10/fullscreen");
        assert!(!app.navigator.can_go_back());
    }

    #[test]
    fn out_of_range_month_converges_to_normalized_location() {
        let app = app("/2024/13");
        assert_eq!(app.display_date, DisplayDate::new(2025, 1));
        assert_eq!(app.navigator.current(), "/2025/1");
    }

    #[test]
    fn non_numeric_segments_show_today() {
        let app = app("/abc/def");
        assert_eq!(app.display_date, DisplayDate::new(2026, 10));
        assert_eq!(app.navigator.current(), "/2026/10");
    }

    #[test]
    fn prev_next_keep_location_and_month_together() {
        let mut app = app("/2024/12");
        app.next_month();
        assert_eq!(app.display_date, DisplayDate::new(2025, 1));
        assert_eq!(app.navigator.current(), "/2025/1");

        app.previous_month();
        app.previous_month();
        assert_eq!(app.display_date, DisplayDate::new(2024, 11));
        assert_eq!(app.navigator.current(), "/2024/11");

        assert!(app.back());
        assert_eq!(app.display_date, DisplayDate::new(2024, 12));
        assert_eq!(app.navigator.current(), "/2024/12");
    }

    #[test]
    fn same_visible_range_twice_navigates_once() {
        let mut app = app("/2024/3");
        let april = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(app.visible_range_changed(april));
        assert!(!app.visible_range_changed(april));
        assert!(app.back());
        assert!(!app.navigator.can_go_back());
    }

    #[test]
    fn month_change_requires_a_new_query() {
        let mut app = app("/2024/3");
        app.begin_query().unwrap();
        assert!(!app.query_needed());
        assert_eq!(app.load_state, LoadState::Loading);

        // Re-deriving the same month does not.
        assert!(!app.visible_range_changed(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(!app.query_needed());

        app.next_month();
        assert!(app.query_needed());
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut app = app("/2024/3");
        let march = app.display_date;
        app.begin_query().unwrap();
        app.next_month();
        let april = app.display_date;
        app.begin_query().unwrap();

        assert!(app.accept_meetups(april, Ok(vec![hit("b", 2024, 4, 2)])));
        assert!(!app.accept_meetups(march, Ok(vec![hit("a", 2024, 3, 5)])));

        let ids: Vec<&str> = app.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(app.load_state, LoadState::Loaded);
    }

    #[test]
    fn failures_surface_inline() {
        let mut app = app("/2024/3");
        app.begin_query().unwrap();
        assert!(app.accept_meetups(app.display_date, Err(SearchError::MissingResult)));
        assert_eq!(
            app.load_state,
            LoadState::Failed(LOAD_ERROR_MESSAGE.to_string())
        );
        assert!(app.events.is_empty());
    }

    #[test]
    fn escape_peels_one_layer_at_a_time() {
        let mut app = app("/2024/3/fullscreen");
        app.begin_query().unwrap();
        app.accept_meetups(app.display_date, Ok(vec![hit("a", 2024, 3, 5)]));
        app.open_selected();
        assert!(app.modal.is_open());

        assert!(app.escape());
        assert!(!app.modal.is_open());
        assert_eq!(app.mode, DisplayMode::Fullscreen);

        assert!(app.escape());
        assert_eq!(app.mode, DisplayMode::Website);
        assert_eq!(app.navigator.current(), "/2024/3");
        assert!(!app.escape());
    }

    #[test]
    fn navigating_away_closes_the_modal() {
        let mut app = app("/2024/3");
        app.begin_query().unwrap();
        app.accept_meetups(app.display_date, Ok(vec![hit("a", 2024, 3, 5)]));
        app.open_event(0);
        app.next_month();
        assert!(!app.modal.is_open());
    }

    #[test]
    fn clicks_open_and_dismiss_the_modal() {
        let mut app = app("/2024/3");
        app.begin_query().unwrap();
        app.accept_meetups(
            app.display_date,
            Ok(vec![hit("a", 2024, 3, 5), hit("b", 2024, 3, 6)]),
        );
        app.hit_areas.events = vec![(0, Rect::new(0, 0, 10, 1)), (1, Rect::new(0, 1, 10, 1))];
        app.hit_areas.modal = Rect::new(20, 5, 40, 20);
        app.hit_areas.modal_close = Rect::new(57, 5, 3, 1);
        app.hit_areas.description_toggle = Rect::new(30, 20, 20, 1);

        app.click(3, 1);
        assert_eq!(app.modal.event().map(|e| e.id.as_str()), Some("b"));

        app.click(35, 20);
        assert!(app.modal.is_expanded());

        // Inside the popup: stays open.
        app.click(30, 10);
        assert!(app.modal.is_open());

        // Backdrop.
        app.click(1, 1);
        assert!(!app.modal.is_open());

        app.click(3, 0);
        assert!(app.modal.is_open());
        app.click(58, 5);
        assert!(!app.modal.is_open());
    }

    #[test]
    fn selection_wraps() {
        let mut app = app("/2024/3");
        app.begin_query().unwrap();
        app.accept_meetups(
            app.display_date,
            Ok(vec![hit("a", 2024, 3, 5), hit("b", 2024, 3, 6)]),
        );
        assert_eq!(app.selected, Some(0));
        app.previous_item();
        assert_eq!(app.selected, Some(1));
        app.next_item();
        assert_eq!(app.selected, Some(0));
        let day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let ids: Vec<&str> = app.events_on(day).map(|(_, e)| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn fullscreen_round_trip() {
        let mut app = app("/2024/3");
        assert!(app.enter_fullscreen());
        assert_eq!(app.navigator.current(), "/2024/3/fullscreen");
        assert_eq!(app.mode, DisplayMode::Fullscreen);
        // Same month: no new query needed beyond the initial one.
        app.begin_query().unwrap();
        assert!(app.exit_fullscreen());
        assert!(!app.query_needed());
    }
}
