use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{progress_bar, status_color};
use crate::models::DisplayStatus;
use crate::truncate;
use crate::tui::App;

const ATTENTION_LIMIT: usize = 8;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Section counts
            Constraint::Length(9), // Stats + next session
            Constraint::Min(0),    // Needs attention
        ])
        .split(area);

    draw_counts(f, app, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    draw_stats(f, app, middle[0]);
    draw_next(f, app, middle[1]);
    draw_attention(f, app, chunks[2]);
}

fn draw_counts(f: &mut Frame, app: &App, area: Rect) {
    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (i, status) in DisplayStatus::ALL.iter().enumerate() {
        let color = status_color(*status);
        let count = Paragraph::new(Line::from(Span::styled(
            format!("{}", app.plan.groups.count(*status)),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} [{}] ", status.label(), i + 1))
                .title_style(Style::default().fg(color)),
        );
        f.render_widget(count, boxes[i]);
    }
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.plan.stats();

    let mut text = vec![
        Line::from(vec![
            Span::styled("Sessions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_sessions),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Completed: ", Style::default().fg(Color::Gray)),
            Span::styled(
                progress_bar(stats.completion_rate, 10),
                Style::default().fg(Color::Green),
            ),
            Span::raw(format!(" {:.0}%", stats.completion_rate)),
        ]),
        Line::from(vec![
            Span::styled("Questions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{}", stats.answered_questions, stats.total_questions),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Time left: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} min", stats.minutes_remaining),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    if stats.skipped > 0 {
        text.push(Line::from(vec![
            Span::styled("Skipped: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} invalid", stats.skipped),
                Style::default().fg(Color::Red),
            ),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_next(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Up Next ")
        .title_style(Style::default().fg(Color::Yellow));

    let text = match app.plan.next_session() {
        Some((status, session)) => vec![
            Line::from(Span::styled(
                session.title(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                status.label(),
                Style::default().fg(status_color(status)),
            )),
            Line::from(vec![
                Span::styled("Due: ", Style::default().fg(Color::Gray)),
                Span::raw(session.scheduled_date.format("%a %b %d").to_string()),
            ]),
            Line::from(vec![
                Span::styled("Topics: ", Style::default().fg(Color::Gray)),
                Span::raw(truncate(&session.topic_summary(), 40)),
            ]),
        ],
        None => vec![Line::from(Span::styled(
            "All sessions completed",
            Style::default().fg(Color::Green),
        ))],
    };

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_attention(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .plan
        .ordered()
        .take_while(|(status, _)| {
            matches!(status, DisplayStatus::Overdue | DisplayStatus::InProgress)
        })
        .take(ATTENTION_LIMIT)
        .map(|(status, session)| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<12}", status.label()),
                    Style::default().fg(status_color(status)),
                ),
                Span::styled(
                    format!("{:<12}", truncate(&session.title(), 11)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<8}", session.scheduled_date.format("%b %d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(truncate(&session.topic_summary(), 40)),
            ]))
        })
        .collect();

    let hidden = (app.plan.groups.count(DisplayStatus::Overdue)
        + app.plan.groups.count(DisplayStatus::InProgress))
    .saturating_sub(items.len());
    let title = if hidden > 0 {
        format!(" Needs Attention (+{} more) ", hidden)
    } else {
        " Needs Attention ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Red));

    f.render_widget(List::new(items).block(block), area);
}
