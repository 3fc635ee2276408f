use crate::app::App;
use crate::dates::format_event_datetime;
use crate::ui::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Rows of description shown while the popup is collapsed.
pub const COLLAPSED_DESCRIPTION_LINES: u16 = 6;

pub fn toggle_label(expanded: bool) -> &'static str {
    if expanded {
        "↑ Show less ↑"
    } else {
        "↓ Show more ↓"
    }
}

pub fn draw_event_modal(f: &mut Frame, app: &mut App, area: Rect, theme: &Theme) {
    let Some(event) = app.modal.event() else {
        return;
    };
    let expanded = app.modal.is_expanded();
    let has_toggle = app.modal.has_toggle();

    let mut details = vec![Line::from(Span::styled(
        event.title.clone(),
        Style::default()
            .fg(theme.mauve)
            .add_modifier(Modifier::BOLD),
    ))];
    let when = event
        .metadata
        .start_date
        .and_then(|start| format_event_datetime(start, event.metadata.end_date, app.tz))
        .unwrap_or_else(|| event.start_date_iso());
    details.push(Line::from(Span::styled(
        when,
        Style::default().fg(theme.yellow),
    )));
    if let Some(url) = &event.metadata.url {
        details.push(Line::from(vec![
            Span::styled("🔗 ", Style::default().fg(theme.blue)),
            Span::styled(
                url.clone(),
                Style::default()
                    .fg(theme.blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
        ]));
    }
    match (event.metadata.picture_url(), event.metadata.lqip_url()) {
        (Some(picture), _) => details.push(Line::from(Span::styled(
            format!("▣ {}", picture),
            Style::default().fg(theme.green),
        ))),
        (None, Some(lqip)) => details.push(Line::from(Span::styled(
            format!("▢ {}", lqip),
            Style::default().fg(theme.subtle),
        ))),
        (None, None) => {}
    }
    let description = event.metadata.description.clone().unwrap_or_default();

    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.mauve))
        .title(" Meetup ")
        .style(Style::default().fg(theme.foreground).bg(theme.background));
    let inner = block.inner(area);
    f.render_widget(block, area);
    app.hit_areas.modal = area;

    let close = Rect {
        x: area.right().saturating_sub(4),
        y: area.y,
        width: 3.min(area.width),
        height: 1.min(area.height),
    };
    f.render_widget(
        Paragraph::new(" × ").style(
            Style::default()
                .fg(theme.red)
                .add_modifier(Modifier::BOLD),
        ),
        close,
    );
    app.hit_areas.modal_close = close;

    let details_height = details.len() as u16 + 1;
    let description_height = if has_toggle && !expanded {
        Constraint::Length(COLLAPSED_DESCRIPTION_LINES)
    } else {
        Constraint::Min(0)
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(1)
        .constraints([
            Constraint::Length(details_height),
            description_height,
            Constraint::Length(if has_toggle { 1 } else { 0 }),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(details).wrap(Wrap { trim: true }),
        chunks[0],
    );
    f.render_widget(
        Paragraph::new(description)
            .style(Style::default().fg(theme.foreground))
            .wrap(Wrap { trim: false }),
        chunks[1],
    );

    if has_toggle {
        f.render_widget(
            Paragraph::new(toggle_label(expanded))
                .style(Style::default().fg(theme.blue))
                .alignment(Alignment::Center),
            chunks[2],
        );
        app.hit_areas.description_toggle = chunks[2];
    } else {
        app.hit_areas.description_toggle = Rect::default();
    }
}
