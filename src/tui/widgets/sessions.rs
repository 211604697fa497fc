use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::status_color;
use crate::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .sessions
        .items
        .iter()
        .map(|(status, session)| {
            let minutes = session
                .estimated_time_minutes
                .map(|m| format!("{}m", m))
                .unwrap_or_else(|| "-".to_string());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<13}", status.label()),
                    Style::default().fg(status_color(*status)),
                ),
                Span::styled(
                    format!("{:<13}", truncate(&session.title(), 12)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<12}", session.scheduled_date.format("%Y-%m-%d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<6}", minutes), Style::default().fg(Color::Cyan)),
                Span::raw(truncate(&session.topic_summary(), 50)),
            ]))
        })
        .collect();

    let title = match app.status_filter {
        Some(status) => format!(" Sessions: {} ({}) ", status.label(), app.sessions.items.len()),
        None => format!(" Sessions ({}) ", app.sessions.items.len()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("{:<13}", "Status"), header_style),
        Span::styled(format!("{:<13}", "Session"), header_style),
        Span::styled(format!("{:<12}", "Scheduled"), header_style),
        Span::styled(format!("{:<6}", "Time"), header_style),
        Span::styled("Topics", header_style),
    ]);

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    // Indent the header past the highlight symbol
    let header_area = Rect {
        x: rows[0].x + 2,
        width: rows[0].width.saturating_sub(2),
        ..rows[0]
    };
    f.render_widget(Paragraph::new(header), header_area);

    let mut state = ListState::default();
    state.select(app.sessions.selected);
    f.render_stateful_widget(list, rows[1], &mut state);
}
