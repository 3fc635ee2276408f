use crate::app::{App, LoadState};
use crate::dates::month_name;
use crate::route::DisplayMode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub mod calendar;
pub mod event;

use calendar::draw_month_grid;
use event::draw_event_modal;

pub const APP_TITLE: &str = "Algolia Meetups Calendar";

#[derive(Clone)]
pub struct Theme {
    pub background: Color,
    pub surface: Color,
    pub foreground: Color,
    pub subtle: Color,
    pub yellow: Color,
    pub blue: Color,
    pub mauve: Color,
    pub green: Color,
    pub red: Color,
}

impl Theme {
    pub fn catppuccin_mocha() -> Self {
        Self {
            background: Color::Rgb(30, 30, 46),
            surface: Color::Rgb(49, 50, 68),
            foreground: Color::Rgb(205, 214, 244),
            subtle: Color::Rgb(147, 153, 178),
            yellow: Color::Rgb(249, 226, 175),
            blue: Color::Rgb(137, 180, 250),
            mauve: Color::Rgb(203, 166, 247),
            green: Color::Rgb(166, 227, 161),
            red: Color::Rgb(243, 139, 168),
        }
    }
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Cuts `text` to fit `width` terminal columns, ending with an ellipsis when shortened.
pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

fn month_title(app: &App) -> String {
    match app.display_date.first_day() {
        Some(first) => {
            use chrono::Datelike;
            format!("{} {}", month_name(first.month()), first.year())
        }
        None => format!("{}/{}", app.display_date.year, app.display_date.month),
    }
}

fn status_line(app: &App, theme: &Theme) -> Span<'static> {
    match &app.load_state {
        LoadState::Loading => Span::styled("Loading meetups…", Style::default().fg(theme.subtle)),
        LoadState::Loaded => Span::styled(
            format!("{} meetups", app.events.len()),
            Style::default().fg(theme.green),
        ),
        LoadState::Failed(message) => Span::styled(
            message.clone(),
            Style::default().fg(theme.red).add_modifier(Modifier::BOLD),
        ),
    }
}

pub fn ui(f: &mut Frame, app: &mut App, theme: &Theme) {
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        f.size(),
    );
    app.hit_areas.events.clear();

    match app.mode {
        DisplayMode::Website => draw_website(f, app, theme),
        DisplayMode::Fullscreen => draw_fullscreen(f, app, theme),
    }

    if app.modal.is_open() {
        let area = centered_rect(70, 80, f.size());
        draw_event_modal(f, app, area, theme);
    } else {
        app.hit_areas.modal = Rect::default();
        app.hit_areas.modal_close = Rect::default();
        app.hit_areas.description_toggle = Rect::default();
    }

    if app.show_help {
        let area = centered_rect(60, 60, f.size());
        draw_help_popup(f, app, area, theme);
    }
}

fn draw_website(f: &mut Frame, app: &mut App, theme: &Theme) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Toolbar
            Constraint::Min(0),    // Calendar
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    // Title links back to the current month.
    let title_width = (APP_TITLE.width() as u16).min(main_chunks[0].width);
    let title_area = Rect {
        x: main_chunks[0].x + (main_chunks[0].width - title_width) / 2,
        width: title_width,
        ..main_chunks[0]
    };
    f.render_widget(
        Paragraph::new(APP_TITLE).style(
            Style::default()
                .fg(theme.foreground)
                .add_modifier(Modifier::BOLD),
        ),
        title_area,
    );
    app.hit_areas.title = title_area;

    // Toolbar: prev / month / next
    let toolbar = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(0),
            Constraint::Length(5),
        ])
        .split(main_chunks[1]);
    let button = Style::default().fg(theme.blue).add_modifier(Modifier::BOLD);
    f.render_widget(Paragraph::new(" ◄ ").style(button), toolbar[0]);
    f.render_widget(
        Paragraph::new(month_title(app))
            .style(Style::default().fg(theme.mauve).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        toolbar[1],
    );
    f.render_widget(
        Paragraph::new(" ► ").style(button).alignment(Alignment::Right),
        toolbar[2],
    );
    app.hit_areas.prev = toolbar[0];
    app.hit_areas.next = toolbar[2];

    let container = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.surface))
        .style(Style::default().bg(theme.background));
    let grid_area = container.inner(main_chunks[2]);
    f.render_widget(container, main_chunks[2]);
    draw_month_grid(f, app, grid_area, theme);

    // Footer
    let location = format!(" {} ", app.navigator.current());
    let footer_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10),
            Constraint::Min(0),
            Constraint::Length(location.width() as u16),
        ])
        .split(main_chunks[3]);

    f.render_widget(
        Paragraph::new(" ? Help ").style(Style::default().fg(theme.blue)),
        footer_chunks[0],
    );
    app.hit_areas.help = footer_chunks[0];
    f.render_widget(
        Paragraph::new(Line::from(status_line(app, theme))).alignment(Alignment::Center),
        footer_chunks[1],
    );
    f.render_widget(
        Paragraph::new(location).style(Style::default().fg(theme.subtle)),
        footer_chunks[2],
    );
}

fn draw_fullscreen(f: &mut Frame, app: &mut App, theme: &Theme) {
    let area = f.size();
    let failed = matches!(app.load_state, LoadState::Failed(_));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(if failed { 1 } else { 0 }),
        ])
        .split(area);

    draw_month_grid(f, app, chunks[0], theme);

    if failed {
        f.render_widget(
            Paragraph::new(Line::from(status_line(app, theme))).alignment(Alignment::Center),
            chunks[1],
        );
    }

    let exit = Rect {
        x: area.right().saturating_sub(3),
        y: area.y,
        width: 3.min(area.width),
        height: 1.min(area.height),
    };
    f.render_widget(
        Paragraph::new(" × ").style(Style::default().fg(theme.subtle)),
        exit,
    );
    app.hit_areas.exit_fullscreen = exit;
}

fn draw_help_popup(f: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    f.render_widget(Clear, area);

    let mut rows = vec![
        Row::new(vec!["?", "Toggle Help"]),
        Row::new(vec!["q", "Quit"]),
        Row::new(vec!["↑/↓", "Select Meetup"]),
        Row::new(vec!["Enter", "Meetup Details"]),
        Row::new(vec!["Space", "Show More / Less"]),
        Row::new(vec!["o", "Open Meetup Page"]),
        Row::new(vec!["Esc", "Close / Leave Fullscreen"]),
        Row::new(vec!["Backspace", "Back"]),
    ];
    if app.mode == DisplayMode::Website {
        rows.extend([
            Row::new(vec!["←/→", "Previous / Next Month"]),
            Row::new(vec!["t", "Current Month"]),
            Row::new(vec!["f", "Fullscreen"]),
            Row::new(vec!["r", "Reload Meetups"]),
        ]);
    }

    let table = Table::new(
        rows,
        [Constraint::Percentage(30), Constraint::Percentage(70)],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.mauve))
            .title(" Keyboard Shortcuts "),
    )
    .header(
        Row::new(vec!["Key", "Action"])
            .style(
                Style::default()
                    .fg(theme.yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .bottom_margin(1),
    )
    .column_spacing(1)
    .style(Style::default().fg(theme.foreground).bg(theme.background));

    f.render_widget(table, area);
}
