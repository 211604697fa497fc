use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, session_detail, sessions};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Sessions"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Sessions | View::SessionDetail => 1,
    };

    let title = format!(
        " Study Plan · {} ",
        app.plan.now.format("%a %b %d %H:%M")
    );

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Sessions => sessions::draw(f, app, area),
        View::SessionDetail => session_detail::draw(f, app, area),
    }
}

fn key(k: &'static str) -> Span<'static> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = match app.view {
        View::Dashboard => vec![
            key("h/l"),
            Span::raw(" Views  "),
            key("1-4"),
            Span::raw(" Section  "),
            key("^r"),
            Span::raw(" Refresh  "),
        ],
        View::Sessions => {
            let mut spans = vec![
                key("h/l"),
                Span::raw(" Views  "),
                key("j/k"),
                Span::raw(" Nav  "),
                key("g/G"),
                Span::raw(" Top/Bot  "),
                key("<CR>"),
                Span::raw(" Open  "),
                key("1-4"),
                Span::raw(" Section  "),
            ];
            if app.status_filter.is_some() {
                spans.extend(vec![key("0/<Esc>"), Span::raw(" All  ")]);
            }
            spans
        }
        View::SessionDetail => vec![
            key("h/<Esc>"),
            Span::raw(" Back  "),
            key("<Space>"),
            Span::raw(" Start/Pause  "),
            key("c"),
            Span::raw(" Countdown  "),
            key("w"),
            Span::raw(" Stopwatch  "),
            key("x"),
            Span::raw(" Reset  "),
        ],
    };

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    if let Some(message) = &app.message {
        if app.view != View::SessionDetail {
            spans.push(Span::styled(
                format!("  | {}", message),
                Style::default().fg(Color::Yellow),
            ));
        }
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
