use crate::{
    app::App,
    dates::today_in,
    loader::MeetupLoader,
    route::DisplayMode,
    search::MeetupSource,
    sizer::{Debouncer, RESIZE_DEBOUNCE},
    ui::{ui, Theme},
    AppEvent,
};
use crossterm::event::{
    self, Event as CEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind,
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Opens the meetup page in the system browser. Only web links are followed.
fn open_in_browser(link: &str) {
    match url::Url::parse(link) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            if let Err(e) = webbrowser::open(parsed.as_str()) {
                warn!("Could not open {}: {}", parsed, e);
            }
        }
        Ok(parsed) => warn!("Refusing to open {} link {}", parsed.scheme(), link),
        Err(e) => warn!("Invalid meetup link {:?}: {}", link, e),
    }
}

/// Asks the event loop to recompute the grid width. Returns whether the
/// request was queued.
fn request_resize(tx: &mpsc::Sender<AppEvent>) -> bool {
    match tx.try_send(AppEvent::Resize) {
        Ok(()) => true,
        Err(e) => {
            warn!("Dropped grid resize request: {}", e);
            false
        }
    }
}

/// Applies one key press to the app.
pub fn handle_key(app: &mut App, key: KeyEvent) -> Flow {
    if app.show_help {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
                app.show_help = false;
            }
            _ => {}
        }
        return Flow::Continue;
    }

    if app.modal.is_open() {
        match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Char('x') => {
                app.escape();
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => {
                app.modal.toggle_description();
            }
            KeyCode::Char('o') => {
                if let Some(link) = app.modal.event().and_then(|e| e.metadata.url.clone()) {
                    open_in_browser(&link);
                }
            }
            _ => {}
        }
        return Flow::Continue;
    }

    if let KeyCode::Char('?') = key.code {
        app.show_help = true;
        return Flow::Continue;
    }

    match app.mode {
        DisplayMode::Website => match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => app.previous_month(),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => app.next_month(),
            KeyCode::Char('t') => app.go_today(),
            KeyCode::Char('f') => {
                app.enter_fullscreen();
            }
            KeyCode::Down | KeyCode::Char('j') => app.next_item(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
            KeyCode::Enter => app.open_selected(),
            KeyCode::Char('r') => {
                info!("Manual refresh requested.");
                app.request_refresh();
            }
            KeyCode::Backspace => {
                app.back();
            }
            _ => {}
        },
        DisplayMode::Fullscreen => match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Esc | KeyCode::Char('f') => {
                app.exit_fullscreen();
            }
            KeyCode::Backspace => {
                app.back();
            }
            KeyCode::Down | KeyCode::Char('j') => app.next_item(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
            KeyCode::Enter => app.open_selected(),
            _ => {}
        },
    }
    Flow::Continue
}

/// The main application loop. Handles events and updates the app state.
pub async fn run_app<S: MeetupSource>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    source: Arc<S>,
    mut rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
) -> io::Result<()> {
    let theme = Theme::catppuccin_mocha();
    let mut loader = MeetupLoader::new(source, tx.clone());

    let resize_tx = tx;
    let resizer = Debouncer::spawn(RESIZE_DEBOUNCE, move || {
        request_resize(&resize_tx);
    });

    loop {
        if app.query_needed() {
            if let Ok(range) = app.begin_query() {
                loader.load(app.display_date, range);
            }
        }

        terminal.draw(|f| ui(f, app, &theme))?;

        let mode_before = app.mode;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, key) == Flow::Quit {
                        return Ok(());
                    }
                }
                CEvent::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row),
                    MouseEventKind::ScrollDown
                        if app.mode == DisplayMode::Website
                            && !app.modal.is_open()
                            && !app.show_help =>
                    {
                        app.next_month()
                    }
                    MouseEventKind::ScrollUp
                        if app.mode == DisplayMode::Website
                            && !app.modal.is_open()
                            && !app.show_help =>
                    {
                        app.previous_month()
                    }
                    _ => {}
                },
                CEvent::Resize(_, _) => resizer.trigger(),
                _ => {}
            }
        }

        if app.mode != mode_before {
            resizer.trigger();
        }

        while let Ok(app_event) = rx.try_recv() {
            match app_event {
                AppEvent::Refresh => {
                    info!("Automatic refresh triggered.");
                    app.today = today_in(app.tz);
                    app.request_refresh();
                }
                AppEvent::MeetupsLoaded {
                    display_date,
                    result,
                } => {
                    app.accept_meetups(display_date, result);
                }
                AppEvent::Resize => app.grid.recompute(),
            }
        }
    }
}
