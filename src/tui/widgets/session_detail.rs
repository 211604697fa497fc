use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{progress_bar, status_color};
use crate::models::{DisplayStatus, SessionRecord};
use crate::timer::{format_clock, PracticeTimer, TimerMode};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some((status, session)) = &app.selected else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Session Detail ");
        let paragraph = Paragraph::new("No session selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Header info
            Constraint::Length(6), // Timer
            Constraint::Min(0),    // Topics
        ])
        .split(area);

    draw_header(f, *status, session, chunks[0]);
    draw_timer(f, app, chunks[1]);
    draw_topics(f, session, chunks[2]);
}

fn draw_header(f: &mut Frame, status: DisplayStatus, session: &SessionRecord, area: Rect) {
    let mut text = vec![
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Gray)),
            Span::styled(
                status.label(),
                Style::default()
                    .fg(status_color(status))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  (backend: {})", session.status.as_str()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            Span::styled("Scheduled: ", Style::default().fg(Color::Gray)),
            Span::raw(session.scheduled_date.format("%A %B %d, %Y").to_string()),
        ]),
    ];

    if let Some(done) = session.completed_at {
        text.push(Line::from(vec![
            Span::styled("Completed: ", Style::default().fg(Color::Gray)),
            Span::styled(
                done.format("%Y-%m-%d %H:%M").to_string(),
                Style::default().fg(Color::Green),
            ),
        ]));
    }

    if session.question_count() > 0 {
        text.push(Line::from(vec![
            Span::styled("Progress: ", Style::default().fg(Color::Gray)),
            Span::styled(
                progress_bar(session.progress_percent(), 10),
                Style::default().fg(Color::Green),
            ),
            Span::raw(format!(
                " {}/{} questions",
                session.answered_count(),
                session.question_count()
            )),
        ]));
    }

    if let Some(minutes) = session.estimated_time_minutes {
        text.push(Line::from(vec![
            Span::styled("Estimated: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{} min", minutes)),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", session.title()))
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_timer(f: &mut Frame, app: &App, area: Rect) {
    let now = app.now();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Timer ")
        .title_style(Style::default().fg(Color::Magenta));

    let Some(timer) = &app.timer else {
        f.render_widget(Paragraph::new("No timer").block(block), area);
        return;
    };

    let (state, state_color) = timer_state(timer, now);
    let mode = match timer.mode {
        TimerMode::Stopwatch => "Stopwatch".to_string(),
        TimerMode::Countdown { duration_secs } => {
            format!("Countdown of {}", format_clock(duration_secs))
        }
    };

    let text = vec![
        Line::from(Span::styled(
            timer.display(now),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(state, Style::default().fg(state_color)),
            Span::styled(format!("  {}", mode), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(
            app.message.clone().unwrap_or_default(),
            Style::default().fg(Color::Yellow),
        )),
    ];

    f.render_widget(
        Paragraph::new(text).block(block).alignment(Alignment::Center),
        area,
    );
}

fn timer_state(timer: &PracticeTimer, now: chrono::DateTime<chrono::Utc>) -> (&'static str, Color) {
    if timer.is_running() {
        ("Running", Color::Green)
    } else if timer.is_finished(now) {
        ("Finished", Color::Red)
    } else {
        ("Paused", Color::Yellow)
    }
}

fn draw_topics(f: &mut Frame, session: &SessionRecord, area: Rect) {
    let items: Vec<ListItem> = if session.topics.is_empty() {
        vec![ListItem::new(Span::styled(
            "No topics listed",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        session
            .topics
            .iter()
            .map(|topic| {
                ListItem::new(Line::from(vec![
                    Span::styled("• ", Style::default().fg(Color::Cyan)),
                    Span::styled(
                        format!("{:<40}", topic.topic_name),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{} questions", topic.num_questions),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Topics ({}) ", session.topics.len()))
        .title_style(Style::default().fg(Color::Green));

    f.render_widget(List::new(items).block(block), area);
}
