use log::debug;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Visible weekday columns (weekends are hidden).
pub const VISIBLE_DAYS: u16 = 5;

/// A terminal row is about twice as tall as a column is wide.
pub const CELL_ASPECT: u16 = 2;

pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Width that makes day cells square, bounded by what the container offers.
pub fn square_grid_width(cell_height: u16, available_width: u16) -> u16 {
    VISIBLE_DAYS
        .saturating_mul(cell_height)
        .min(available_width)
}

/// Measurements taken while drawing, and the width chosen from them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridSizer {
    /// Container width minus its horizontal padding, in columns.
    pub available_width: u16,
    /// Height of one rendered day cell, in rows.
    pub cell_height: u16,
    width: Option<u16>,
}

impl GridSizer {
    pub fn measure(&mut self, available_width: u16, cell_height: u16) {
        self.available_width = available_width;
        self.cell_height = cell_height;
        if self.width.is_none() {
            self.recompute();
        }
    }

    pub fn recompute(&mut self) {
        let width = square_grid_width(
            self.cell_height.saturating_mul(CELL_ASPECT),
            self.available_width,
        );
        debug!(
            "Grid width {} (cell height {}, available {}).",
            width, self.cell_height, self.available_width
        );
        self.width = Some(width);
    }

    /// Width to draw with. Never wider than the space measured last.
    pub fn width(&self) -> u16 {
        self.width
            .unwrap_or(self.available_width)
            .min(self.available_width)
    }
}

/// Coalesces bursts of triggers into one call, fired once the burst has been
/// quiet for `delay`.
///
/// The first trigger arms a timer, each following trigger re-arms it, and
/// expiry runs the callback. Dropping the debouncer stops its task.
pub struct Debouncer {
    tx: mpsc::UnboundedSender<()>,
    handle: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn<F>(delay: Duration, on_fire: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let handle = tokio::spawn(async move {
            // Idle until something arms the timer.
            while rx.recv().await.is_some() {
                loop {
                    tokio::select! {
                        rearm = rx.recv() => {
                            if rearm.is_none() {
                                return;
                            }
                        }
                        _ = tokio::time::sleep(delay) => {
                            on_fire();
                            break;
                        }
                    }
                }
            }
        });
        Self { tx, handle }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
