use crate::app::App;
use crate::dates::visible_weeks;
use crate::sizer::VISIBLE_DAYS;
use crate::ui::{truncate, Theme};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const WEEKDAYS: [&str; VISIBLE_DAYS as usize] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

/// Marker in front of a meetup title: filled when the meetup has a picture.
pub(crate) fn event_marker(has_picture: bool) -> &'static str {
    if has_picture {
        "▣ "
    } else {
        "• "
    }
}

/// Lines available for events once the day number is drawn, keeping one for
/// the overflow count when not everything fits.
pub(crate) fn visible_event_count(total: usize, lines: usize) -> usize {
    if total <= lines {
        total
    } else {
        lines.saturating_sub(1)
    }
}

struct CellEvent {
    index: usize,
    title: String,
    has_picture: bool,
}

pub fn draw_month_grid(f: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let Some(first) = app.display_date.first_day() else {
        return;
    };
    let weeks = visible_weeks(first);
    if weeks.is_empty() || area.height < 2 {
        return;
    }

    let cell_height = (area.height - 1) / weeks.len() as u16;
    app.grid.measure(area.width, cell_height);
    let width = app.grid.width();
    let grid_area = Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(grid_area);

    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, VISIBLE_DAYS as u32); VISIBLE_DAYS as usize])
        .split(chunks[0]);
    for (name, cell) in WEEKDAYS.iter().zip(header_chunks.iter()) {
        f.render_widget(
            Paragraph::new(*name)
                .style(Style::default().fg(theme.blue).bold())
                .alignment(Alignment::Center),
            *cell,
        );
    }

    let week_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(cell_height); weeks.len()])
        .split(chunks[1]);

    for (monday, week_area) in weeks.iter().zip(week_chunks.iter()) {
        let day_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, VISIBLE_DAYS as u32); VISIBLE_DAYS as usize])
            .split(*week_area);
        for (offset, day_area) in day_chunks.iter().enumerate() {
            let day = *monday + ChronoDuration::days(offset as i64);
            draw_day_cell(f, app, day, first.month(), *day_area, theme);
        }
    }
}

fn draw_day_cell(
    f: &mut Frame,
    app: &mut App,
    day: NaiveDate,
    month: u32,
    area: Rect,
    theme: &Theme,
) {
    let in_month = day.month() == month;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if in_month { theme.mauve } else { theme.surface }));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let day_style = if day == app.today {
        Style::default().fg(theme.background).bg(theme.blue).bold()
    } else if in_month {
        Style::default().fg(theme.foreground)
    } else {
        Style::default().fg(theme.subtle).add_modifier(Modifier::DIM)
    };
    f.render_widget(
        Paragraph::new(Span::styled(day.day().to_string(), day_style)),
        Rect { height: 1, ..inner },
    );

    let events: Vec<CellEvent> = app
        .events_on(day)
        .map(|(index, e)| CellEvent {
            index,
            title: e.title.clone(),
            has_picture: e.metadata.picture_url().is_some(),
        })
        .collect();

    let lines = inner.height.saturating_sub(1) as usize;
    let shown = visible_event_count(events.len(), lines);
    let text_width = (inner.width as usize).saturating_sub(2);

    for (row, event) in events.iter().take(shown).enumerate() {
        let line_area = Rect {
            y: inner.y + 1 + row as u16,
            height: 1,
            ..inner
        };
        let is_selected = app.selected == Some(event.index);
        let style = if is_selected {
            Style::default()
                .fg(theme.background)
                .bg(theme.blue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.foreground)
        };
        let line = Line::from(vec![
            Span::styled(event_marker(event.has_picture), style.fg(if is_selected {
                theme.background
            } else {
                theme.green
            })),
            Span::styled(truncate(&event.title, text_width), style),
        ]);
        f.render_widget(Paragraph::new(line), line_area);
        app.hit_areas.events.push((event.index, line_area));
    }

    let hidden = events.len() - shown;
    if hidden > 0 && lines > 0 {
        let more_area = Rect {
            y: inner.y + 1 + shown as u16,
            height: 1,
            ..inner
        };
        f.render_widget(
            Paragraph::new(format!("+{} more", hidden)).style(Style::default().fg(theme.subtle)),
            more_area,
        );
    }
}
