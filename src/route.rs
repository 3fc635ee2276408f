//! Location handling: parsing `/{year}/{month}[/fullscreen]` and keeping the
//! location in step with the month the grid shows.

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    Website,
    Fullscreen,
}

/// How a user navigation is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
    #[default]
    Push,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: the current month.
    Home,
    /// `/:year/:month` and `/:year/:month/fullscreen`. Segments are kept raw.
    Month {
        year: String,
        month: String,
        mode: DisplayMode,
    },
    /// Legacy `/fullscreen`, redirected to the current month in fullscreen.
    LegacyFullscreen,
}

impl Route {
    pub fn parse(location: &str) -> Option<Route> {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["fullscreen"] => Some(Route::LegacyFullscreen),
            [year, month] => Some(Route::Month {
                year: year.to_string(),
                month: month.to_string(),
                mode: DisplayMode::Website,
            }),
            [year, month, "fullscreen"] => Some(Route::Month {
                year: year.to_string(),
                month: month.to_string(),
                mode: DisplayMode::Fullscreen,
            }),
            _ => None,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        match self {
            Route::Home => DisplayMode::Website,
            Route::Month { mode, .. } => *mode,
            Route::LegacyFullscreen => DisplayMode::Fullscreen,
        }
    }
}

/// Location of a month in the given mode.
pub fn month_path(year: i32, month: u32, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Website => format!("/{}/{}", year, month),
        DisplayMode::Fullscreen => format!("/{}/{}/fullscreen", year, month),
    }
}

/// Owns the current location and the back stack.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: String,
    history: Vec<String>,
    mode: HistoryMode,
}

impl Navigator {
    pub fn new(location: impl Into<String>, mode: HistoryMode) -> Self {
        let mut current = location.into();
        if !current.starts_with('/') {
            current.insert(0, '/');
        }
        Self {
            current,
            history: Vec::new(),
            mode,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Moves to `target` unless already there. Returns whether the location changed.
    pub fn navigate(&mut self, target: String) -> bool {
        let mode = self.mode;
        self.navigate_with(target, mode)
    }

    pub fn replace(&mut self, target: String) -> bool {
        self.navigate_with(target, HistoryMode::Replace)
    }

    fn navigate_with(&mut self, target: String, mode: HistoryMode) -> bool {
        if self.current == target {
            return false;
        }
        debug!("Navigating {} -> {} ({:?})", self.current, target, mode);
        let previous = std::mem::replace(&mut self.current, target);
        if mode == HistoryMode::Push {
            self.history.push(previous);
        }
        true
    }

    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                debug!("Going back {} -> {}", self.current, previous);
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Reacts to the grid reporting a new visible range. Only navigates when the
    /// resulting location differs from the current one, so the notification the
    /// grid emits on its own first render is harmless.
    pub fn sync_visible_range(
        &mut self,
        visible_start: NaiveDate,
        mode: DisplayMode,
        history: HistoryMode,
    ) -> bool {
        let target = month_path(visible_start.year(), visible_start.month(), mode);
        self.navigate_with(target, history)
    }

    /// Parses the current location, falling back to `/` for unknown paths.
    pub fn route(&mut self) -> Route {
        match Route::parse(&self.current) {
            Some(route) => route,
            None => {
                warn!("Unknown location {}, showing the current month.", self.current);
                self.current = "/".to_string();
                Route::Home
            }
        }
    }
}
