pub mod app;
pub mod config;
pub mod dates;
pub mod error;
pub mod keygen;
pub mod loader;
pub mod modal;
pub mod model;
pub mod projection;
pub mod route;
pub mod search;
pub mod sizer;
pub mod tui;
pub mod ui;

use model::{DisplayDate, RawEventRecord};
use search::SearchError;

/// Messages delivered to the event loop from background tasks.
pub enum AppEvent {
    Refresh,
    MeetupsLoaded {
        display_date: DisplayDate,
        result: Result<Vec<RawEventRecord>, SearchError>,
    },
    Resize,
}
