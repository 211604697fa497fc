mod ui;
mod widgets;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::Database;
use crate::error::AppResult;
use crate::ingest;
use crate::models::{DisplayStatus, SessionRecord};
use crate::plan::StudyPlanView;
use crate::timer::{PracticeTimer, DEFAULT_COUNTDOWN_MINUTES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Sessions,
    SessionDetail,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Sessions,
            View::Sessions => View::Dashboard,
            View::SessionDetail => View::Sessions,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Sessions,
            View::Sessions => View::Dashboard,
            View::SessionDetail => View::Sessions,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    db: Database,
    source: PathBuf,
    fixed_now: Option<DateTime<Utc>>,
    pub view: View,
    pub plan: StudyPlanView,
    pub sessions: StatefulList<(DisplayStatus, SessionRecord)>,
    pub status_filter: Option<DisplayStatus>,
    pub selected: Option<(DisplayStatus, SessionRecord)>,
    pub timer: Option<PracticeTimer>,
    pub message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        db: Database,
        source: PathBuf,
        fixed_now: Option<DateTime<Utc>>,
    ) -> AppResult<Self> {
        let now = fixed_now.unwrap_or_else(Utc::now);
        let plan = StudyPlanView::build(ingest::load_path(&source)?, now);
        let sessions = StatefulList::with_items(list_items(&plan, None));

        Ok(Self {
            db,
            source,
            fixed_now,
            view: View::Dashboard,
            plan,
            sessions,
            status_filter: None,
            selected: None,
            timer: None,
            message: None,
            should_quit: false,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Re-reads the payload and reclassifies against a fresh clock.
    pub fn refresh_data(&mut self) -> AppResult<()> {
        let ingested = ingest::load_path(&self.source)?;
        self.plan = StudyPlanView::build(ingested, self.now());
        self.sessions = StatefulList::with_items(list_items(&self.plan, self.status_filter));

        let selected_id = self.selected.as_ref().map(|(_, s)| s.id.clone());
        if let Some(id) = selected_id {
            self.selected = self
                .plan
                .find(&id)
                .map(|(status, session)| (status, session.clone()));
        }
        if self.selected.is_none() && self.view == View::SessionDetail {
            self.close_session()?;
        }

        self.message = Some(format!(
            "Reloaded {} sessions ({} skipped)",
            self.plan.groups.total(),
            self.plan.skipped.len()
        ));
        Ok(())
    }

    fn set_filter(&mut self, filter: Option<DisplayStatus>) {
        self.status_filter = filter;
        self.sessions = StatefulList::with_items(list_items(&self.plan, filter));
    }

    fn select_session(&mut self) -> AppResult<()> {
        let Some((status, session)) = self.sessions.selected_item().cloned() else {
            return Ok(());
        };

        let now = self.now();
        let timer = self
            .db
            .load_timer(&session.id)?
            .unwrap_or_else(|| PracticeTimer::stopwatch(session.id.clone(), now));

        self.timer = Some(timer);
        self.selected = Some((status, session));
        self.view = View::SessionDetail;
        Ok(())
    }

    fn close_session(&mut self) -> AppResult<()> {
        self.persist_running_timer()?;
        self.timer = None;
        self.selected = None;
        self.view = View::Sessions;
        Ok(())
    }

    fn persist_running_timer(&mut self) -> AppResult<()> {
        let now = self.now();
        if let Some(timer) = &self.timer {
            if timer.is_running() {
                self.db.save_timer(timer, now)?;
            }
        }
        Ok(())
    }

    fn update_timer<F>(&mut self, change: F) -> AppResult<()>
    where
        F: FnOnce(&mut PracticeTimer, DateTime<Utc>),
    {
        let now = self.now();
        if let Some(timer) = self.timer.as_mut() {
            change(timer, now);
            self.db.save_timer(timer, now)?;
        }
        Ok(())
    }

    fn countdown_minutes(&self) -> u32 {
        self.selected
            .as_ref()
            .and_then(|(_, s)| s.estimated_time_minutes)
            .unwrap_or(DEFAULT_COUNTDOWN_MINUTES)
    }

    /// Called every loop iteration; stops countdowns that ran out.
    pub fn tick(&mut self) -> AppResult<()> {
        let now = self.now();
        let finished = match self.timer.as_mut() {
            Some(timer) => timer.tick(now),
            None => false,
        };
        if finished {
            if let Some(timer) = &self.timer {
                self.db.save_timer(timer, now)?;
            }
            self.message = Some("Time's up!".to_string());
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> AppResult<()> {
        self.message = None;

        match key {
            KeyCode::Char('q') => {
                self.persist_running_timer()?;
                self.should_quit = true;
            }

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                // Keep the last good plan on screen if the payload can't be read
                if let Err(e) = self.refresh_data() {
                    self.persist_running_timer()?;
                    self.message = Some(format!("Reload failed: {}", e));
                }
            }

            KeyCode::Esc => match self.view {
                View::SessionDetail => self.close_session()?,
                View::Sessions if self.status_filter.is_some() => self.set_filter(None),
                View::Sessions | View::Dashboard => {}
            },

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::SessionDetail => self.close_session()?,
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Sessions => self.select_session()?,
                View::SessionDetail => {}
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab | KeyCode::BackTab if self.view != View::SessionDetail => {
                self.view = if key == KeyCode::BackTab || modifiers.contains(KeyModifiers::SHIFT) {
                    self.view.prev()
                } else {
                    self.view.next()
                };
            }

            KeyCode::Char('j') | KeyCode::Down if self.view == View::Sessions => {
                self.sessions.next()
            }
            KeyCode::Char('k') | KeyCode::Up if self.view == View::Sessions => {
                self.sessions.previous()
            }
            KeyCode::Char('g') if self.view == View::Sessions => self.sessions.first(),
            KeyCode::Char('G') if self.view == View::Sessions => self.sessions.last(),
            KeyCode::Enter if self.view == View::Sessions => self.select_session()?,

            // Section filters: 1-4 follow priority order, 0 clears
            KeyCode::Char(c @ '0'..='4') if self.view != View::SessionDetail => {
                let filter = c
                    .to_digit(10)
                    .and_then(|d| d.checked_sub(1))
                    .and_then(|i| DisplayStatus::ALL.get(i as usize).copied());
                self.set_filter(filter);
                self.view = View::Sessions;
            }

            // Timer controls
            KeyCode::Char(' ') | KeyCode::Char('s') if self.view == View::SessionDetail => {
                self.update_timer(|t, now| t.toggle(now))?;
            }
            KeyCode::Char('c') if self.view == View::SessionDetail => {
                let minutes = self.countdown_minutes();
                self.update_timer(|t, now| {
                    *t = PracticeTimer::countdown(t.session_id.clone(), minutes, now)
                })?;
            }
            KeyCode::Char('w') if self.view == View::SessionDetail => {
                self.update_timer(|t, now| {
                    *t = PracticeTimer::stopwatch(t.session_id.clone(), now)
                })?;
            }
            KeyCode::Char('x') if self.view == View::SessionDetail => {
                self.update_timer(|t, now| t.reset(now))?;
            }

            _ => {}
        }
        Ok(())
    }
}

fn list_items(
    plan: &StudyPlanView,
    filter: Option<DisplayStatus>,
) -> Vec<(DisplayStatus, SessionRecord)> {
    plan.ordered()
        .filter(|(status, _)| filter.map_or(true, |f| f == *status))
        .map(|(status, session)| (status, session.clone()))
        .collect()
}

pub fn run(db: Database, source: PathBuf, fixed_now: Option<DateTime<Utc>>) -> AppResult<()> {
    // Load before touching the terminal so payload errors print normally
    let mut app = App::new(db, source, fixed_now)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> AppResult<()> {
    loop {
        app.tick()?;
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::at;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PAYLOAD: &str = r#"[
        {"id": "s1", "status": "completed", "scheduled_date": "2024-01-01"},
        {"id": "s2", "status": "pending", "scheduled_date": "2020-01-01", "estimated_time_minutes": 40},
        {"id": "s3", "status": "in_progress", "scheduled_date": "2024-06-01"},
        {"id": "s4", "status": "pending", "scheduled_date": "2099-01-01"},
        {"id": "bad", "status": "pending"}
    ]"#;

    // The temp file must outlive the app, which re-reads it on refresh.
    fn setup_app() -> (App, NamedTempFile) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PAYLOAD.as_bytes()).unwrap();

        let db = Database::open(":memory:").unwrap();
        db.init().unwrap();
        let app = App::new(db, file.path().to_path_buf(), Some(at(2024, 6, 15))).unwrap();
        (app, file)
    }

    fn ids(app: &App) -> Vec<&str> {
        app.sessions.items.iter().map(|(_, s)| s.id.as_str()).collect()
    }

    mod view_tests {
        use super::*;

        #[test]
        fn next_and_prev_cycle_tabs() {
            assert_eq!(View::Dashboard.next(), View::Sessions);
            assert_eq!(View::Sessions.next(), View::Dashboard);
            assert_eq!(View::SessionDetail.prev(), View::Sessions);
        }

        #[test]
        fn stateful_list_wraps() {
            let mut list = StatefulList::with_items(vec![1, 2, 3]);
            list.previous();
            assert_eq!(list.selected, Some(2));
            list.next();
            assert_eq!(list.selected, Some(0));
            list.last();
            assert_eq!(list.selected_item(), Some(&3));
        }

        #[test]
        fn empty_list_has_no_selection() {
            let mut list: StatefulList<i32> = StatefulList::with_items(Vec::new());
            list.next();
            list.first();
            assert_eq!(list.selected, None);
        }
    }

    mod render_tests {
        use super::*;
        use ratatui::backend::TestBackend;

        fn render(app: &App, width: u16, height: u16) -> Vec<String> {
            let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
            terminal.draw(|f| ui::draw(f, app)).unwrap();
            let buffer = terminal.backend().buffer();
            (0..height)
                .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect())
                .collect()
        }

        #[test]
        fn session_header_sits_inside_the_border() {
            let (mut app, _file) = setup_app();
            app.view = View::Sessions;
            let rows = render(&app, 100, 14);

            // Tab bar takes the first three rows
            assert!(rows[3].contains("Sessions (4)"));
            assert!(rows[4].contains("Status"));
            assert!(rows[4].contains("Scheduled"));
            assert!(rows[5].contains("> Overdue"));
        }

        #[test]
        fn dashboard_and_detail_render() {
            let (mut app, _file) = setup_app();
            let rows = render(&app, 100, 30);
            assert!(rows.iter().any(|r| r.contains("Up Next")));

            app.view = View::Sessions;
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
            let rows = render(&app, 100, 30);
            assert!(rows.iter().any(|r| r.contains("Timer")));
            assert!(rows.iter().any(|r| r.contains("Paused")));
        }
    }

    mod app_tests {
        use super::*;

        #[test]
        fn sessions_are_listed_in_priority_order() {
            let (app, _file) = setup_app();
            assert_eq!(ids(&app), vec!["s2", "s3", "s4", "s1"]);
            assert_eq!(app.plan.skipped.len(), 1);
        }

        #[test]
        fn number_keys_filter_by_section() {
            let (mut app, _file) = setup_app();
            app.handle_key(KeyCode::Char('1'), KeyModifiers::NONE).unwrap();
            assert_eq!(app.view, View::Sessions);
            assert_eq!(app.status_filter, Some(DisplayStatus::Overdue));
            assert_eq!(ids(&app), vec!["s2"]);

            app.handle_key(KeyCode::Char('4'), KeyModifiers::NONE).unwrap();
            assert_eq!(ids(&app), vec!["s1"]);

            app.handle_key(KeyCode::Char('0'), KeyModifiers::NONE).unwrap();
            assert_eq!(app.status_filter, None);
            assert_eq!(ids(&app).len(), 4);
        }

        #[test]
        fn opening_a_session_loads_a_paused_timer() {
            let (mut app, _file) = setup_app();
            app.view = View::Sessions;
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();

            assert_eq!(app.view, View::SessionDetail);
            let (status, session) = app.selected.as_ref().unwrap();
            assert_eq!(*status, DisplayStatus::Overdue);
            assert_eq!(session.id, "s2");
            assert!(!app.timer.as_ref().unwrap().is_running());
        }

        #[test]
        fn timer_changes_are_persisted() {
            let (mut app, _file) = setup_app();
            app.view = View::Sessions;
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();

            app.handle_key(KeyCode::Char('c'), KeyModifiers::NONE).unwrap();
            let stored = app.db.load_timer("s2").unwrap().unwrap();
            // Countdown length comes from the session estimate.
            assert_eq!(stored.remaining(app.now()), Some(40 * 60));

            app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE).unwrap();
            assert!(app.timer.as_ref().unwrap().is_running());

            app.handle_key(KeyCode::Esc, KeyModifiers::NONE).unwrap();
            assert_eq!(app.view, View::Sessions);
            assert!(app.timer.is_none());

            // Reopening restores it paused.
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
            assert!(!app.timer.as_ref().unwrap().is_running());
        }

        #[test]
        fn refresh_keeps_selection_and_reports() {
            let (mut app, _file) = setup_app();
            app.view = View::Sessions;
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
            app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL)
                .unwrap();
            assert_eq!(app.view, View::SessionDetail);
            assert_eq!(app.selected.as_ref().unwrap().1.id, "s2");
            assert!(app.message.as_deref().unwrap().contains("4 sessions"));
        }

        #[test]
        fn failed_refresh_keeps_plan_and_timer() {
            let (mut app, file) = setup_app();
            app.view = View::Sessions;
            app.handle_key(KeyCode::Enter, KeyModifiers::NONE).unwrap();
            app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE).unwrap();

            // Payload caught mid-rewrite
            std::fs::write(file.path(), r#"{"sessions": ["#).unwrap();
            app.handle_key(KeyCode::Char('r'), KeyModifiers::CONTROL)
                .unwrap();

            assert!(!app.should_quit);
            assert!(app.message.as_deref().unwrap().starts_with("Reload failed"));
            assert_eq!(app.view, View::SessionDetail);
            assert_eq!(ids(&app), vec!["s2", "s3", "s4", "s1"]);
            assert_eq!(app.plan.groups.total(), 4);
            assert!(app.timer.as_ref().unwrap().is_running());
            assert!(app.db.load_timer("s2").unwrap().is_some());
        }

        #[test]
        fn quit_sets_flag() {
            let (mut app, _file) = setup_app();
            app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE).unwrap();
            assert!(app.should_quit);
        }
    }
}
