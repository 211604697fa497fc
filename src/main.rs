mod config;
mod db;
mod error;
mod ingest;
mod models;
mod plan;
mod timer;
mod tui;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use config::Config;
use db::Database;
use error::{AppError, AppResult};
use models::{DisplayStatus, JsonOutput, SessionRecord};
use plan::StudyPlanView;
use timer::{format_clock, PracticeTimer};

#[derive(Parser)]
#[command(name = "satplan")]
#[command(about = "Classify, prioritise and group study plan practice sessions")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Evaluate as of this time (RFC 3339 or YYYY-MM-DD) instead of the system clock
    #[arg(long, global = true)]
    now: Option<String>,

    /// Verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local timer database
    Init,

    /// Show sessions grouped into overdue, in progress, upcoming and completed
    Plan {
        /// Session JSON payload ("-" for stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Sessions shown per section (0 shows all)
        #[arg(long, short)]
        limit: Option<usize>,

        /// Only show one section (overdue, in-progress, upcoming, completed)
        #[arg(long, short, value_parser = parse_section)]
        section: Option<DisplayStatus>,
    },

    /// Show the next session to work on
    Next {
        /// Session JSON payload ("-" for stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Show one session and its stored timer
    Show {
        /// Session ID
        id: String,

        /// Session JSON payload ("-" for stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Show study plan statistics
    Stats {
        /// Session JSON payload ("-" for stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Inspect stored practice timers
    #[command(subcommand)]
    Timer(TimerCommands),

    /// Launch interactive terminal UI
    Tui {
        /// Session JSON payload
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TimerCommands {
    /// List all stored timers
    List,

    /// Show the stored timer for a session
    Show {
        /// Session ID
        session_id: String,
    },

    /// Delete the stored timer for a session
    Reset {
        /// Session ID
        session_id: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, matches!(cli.command, Commands::Tui { .. }));
    let json = cli.json;

    if let Err(e) = run(cli) {
        if json {
            if let Ok(out) = serde_json::to_string(&JsonOutput::<()>::err(e.to_string())) {
                println!("{}", out);
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn parse_section(value: &str) -> Result<DisplayStatus, String> {
    DisplayStatus::from_str(value).ok_or_else(|| {
        format!(
            "unknown section '{}' (expected overdue, in-progress, upcoming or completed)",
            value
        )
    })
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(config::ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_now(flag: Option<&str>) -> AppResult<DateTime<Utc>> {
    match flag {
        Some(value) => {
            ingest::parse_timestamp(value).ok_or_else(|| AppError::InvalidNow(value.to_string()))
        }
        None => Ok(Utc::now()),
    }
}

fn open_db(path: &Path) -> AppResult<Database> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Database::open(path)?;
    db.init()?;
    Ok(db)
}

/// Falls back to stdin only when something is piped in.
fn resolve_source(
    config: &Config,
    file: Option<PathBuf>,
    stdin_is_terminal: bool,
) -> AppResult<PathBuf> {
    match config.sessions_source(file) {
        Some(source) => Ok(source),
        None if !stdin_is_terminal => Ok(PathBuf::from("-")),
        None => Err(AppError::MissingSource),
    }
}

fn load_view(config: &Config, file: Option<PathBuf>, now: DateTime<Utc>) -> AppResult<StudyPlanView> {
    let source = resolve_source(config, file, std::io::stdin().is_terminal())?;
    let ingested = ingest::load_path(&source)?;
    Ok(StudyPlanView::build(ingested, now))
}

fn plan_json(view: &StudyPlanView, section: Option<DisplayStatus>) -> serde_json::Value {
    match section {
        Some(status) => serde_json::json!({
            "now": view.now,
            "status": status,
            "sessions": view.groups.get(status),
            "skipped": view.skipped,
        }),
        None => serde_json::json!({
            "now": view.now,
            "sections": view.groups,
            "counts": view.groups.counts(),
            "skipped": view.skipped,
        }),
    }
}

fn print_json<T: Serialize>(data: T) -> AppResult<()> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn run(cli: Cli) -> AppResult<()> {
    let config = Config::from_env();
    let now = resolve_now(cli.now.as_deref())?;

    match cli.command {
        Commands::Init => {
            open_db(&config.db_path)?;
            if cli.json {
                print_json(())?;
            } else {
                println!("Database initialized at: {}", config.db_path.display());
            }
        }

        Commands::Plan {
            file,
            limit,
            section,
        } => {
            let view = load_view(&config, file, now)?;
            let limit = limit.unwrap_or(config.preview_limit);

            if cli.json {
                print_json(plan_json(&view, section))?;
            } else {
                print_plan(&view, limit, section);
            }
        }

        Commands::Next { file } => {
            let view = load_view(&config, file, now)?;
            match view.next_session() {
                Some((status, session)) if cli.json => {
                    print_json(serde_json::json!({
                        "status": status,
                        "session": session,
                    }))?;
                }
                Some((status, session)) => {
                    println!("=== Next Session ===");
                    println!();
                    print_session(status, session);
                }
                None if cli.json => print_json(())?,
                None => println!("Nothing left to do. Every session is completed."),
            }
        }

        Commands::Show { id, file } => {
            let view = load_view(&config, file, now)?;
            let (status, session) = view
                .find(&id)
                .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;
            let timer = open_db(&config.db_path)?.load_timer(&id)?;

            if cli.json {
                print_json(serde_json::json!({
                    "status": status,
                    "session": session,
                    "timer": timer,
                }))?;
            } else {
                print_session(status, session);
                if let Some(timer) = timer {
                    println!();
                    print_timer(&timer, now);
                }
            }
        }

        Commands::Stats { file } => {
            let view = load_view(&config, file, now)?;
            let stats = view.stats();
            if cli.json {
                print_json(&stats)?;
            } else {
                println!("=== Study Plan Statistics ===");
                println!("Total sessions: {}", stats.total_sessions);
                println!("Overdue: {}", stats.overdue);
                println!("In progress: {}", stats.in_progress);
                println!("Upcoming: {}", stats.upcoming);
                println!(
                    "Completed: {} ({:.0}%)",
                    stats.completed, stats.completion_rate
                );
                println!(
                    "Questions answered: {}/{}",
                    stats.answered_questions, stats.total_questions
                );
                println!("Estimated time remaining: {} min", stats.minutes_remaining);
                if stats.skipped > 0 {
                    println!("Skipped invalid records: {}", stats.skipped);
                }
            }
        }

        Commands::Timer(timer_cmd) => {
            let db = open_db(&config.db_path)?;
            match timer_cmd {
                TimerCommands::List => {
                    let timers = db.list_timers()?;
                    if cli.json {
                        print_json(&timers)?;
                    } else if timers.is_empty() {
                        println!("No timers stored.");
                    } else {
                        println!("{:<38} {:<10} {:<10} UPDATED", "SESSION", "MODE", "TIME");
                        println!("{}", "-".repeat(75));
                        for t in timers {
                            println!(
                                "{:<38} {:<10} {:<10} {}",
                                truncate(&t.session_id, 36),
                                t.mode.as_str(),
                                t.display(now),
                                t.updated_at.format("%Y-%m-%d %H:%M")
                            );
                        }
                    }
                }

                TimerCommands::Show { session_id } => {
                    let timer = db
                        .load_timer(&session_id)?
                        .ok_or_else(|| AppError::TimerNotFound(session_id.clone()))?;
                    if cli.json {
                        print_json(&timer)?;
                    } else {
                        print_timer(&timer, now);
                    }
                }

                TimerCommands::Reset { session_id } => {
                    if !db.delete_timer(&session_id)? {
                        return Err(AppError::TimerNotFound(session_id));
                    }
                    if cli.json {
                        print_json(())?;
                    } else {
                        println!("Timer for session {} reset.", session_id);
                    }
                }
            }
        }

        Commands::Tui { file } => {
            let source = config
                .sessions_source(file)
                .filter(|p| p != Path::new("-"))
                .ok_or(AppError::MissingSource)?;
            let db = open_db(&config.db_path)?;
            tui::run(db, source, cli.now.is_some().then_some(now))?;
        }
    }

    Ok(())
}

fn print_plan(view: &StudyPlanView, limit: usize, only: Option<DisplayStatus>) {
    if view.groups.is_empty() && view.skipped.is_empty() {
        println!("No sessions in this study plan.");
        return;
    }

    let sections = view
        .groups
        .sections()
        .filter(|section| only.map_or(true, |status| status == section.status));
    for section in sections {
        println!(
            "=== {} ({}) ===",
            section.status.label(),
            section.sessions.len()
        );
        let (shown, hidden) = section.preview(limit);
        if shown.is_empty() {
            println!("  (none)");
        }
        for session in shown {
            println!("  {}", session_line(session));
        }
        if hidden > 0 {
            println!("  ... and {} more", hidden);
        }
        println!();
    }

    if !view.skipped.is_empty() {
        println!(
            "Skipped {} invalid record(s). Use --json or SATPLAN_LOG=warn for details.",
            view.skipped.len()
        );
    }
}

fn session_line(session: &SessionRecord) -> String {
    let minutes = session
        .estimated_time_minutes
        .map(|m| format!("{} min", m))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<12} {:<11} {:<40} {}",
        truncate(&session.title(), 12),
        session.scheduled_date.format("%Y-%m-%d"),
        truncate(&session.topic_summary(), 38),
        minutes
    )
}

fn print_session(status: DisplayStatus, session: &SessionRecord) {
    println!("{} (ID: {})", session.title(), session.id);
    println!("Status: {}", status.label());
    println!("Scheduled: {}", session.scheduled_date.format("%Y-%m-%d"));
    println!("Topics: {}", session.topic_summary());
    if session.question_count() > 0 {
        println!(
            "Progress: {}/{} questions ({:.0}%)",
            session.answered_count(),
            session.question_count(),
            session.progress_percent()
        );
    }
    if let Some(minutes) = session.estimated_time_minutes {
        println!("Estimated time: {} min", minutes);
    }
}

fn print_timer(timer: &PracticeTimer, now: DateTime<Utc>) {
    println!("Session: {}", timer.session_id);
    println!("Mode: {}", timer.mode.as_str());
    println!("Elapsed: {}", format_clock(timer.elapsed(now)));
    if let Some(remaining) = timer.remaining(now) {
        println!("Remaining: {}", format_clock(remaining));
    }
    println!("Updated: {}", timer.updated_at.format("%Y-%m-%d %H:%M"));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod truncate_tests {
        use super::*;

        #[test]
        fn truncate_short_string() {
            assert_eq!(truncate("hello", 10), "hello");
        }

        #[test]
        fn truncate_exact_length() {
            assert_eq!(truncate("hello", 5), "hello");
        }

        #[test]
        fn truncate_long_string() {
            assert_eq!(truncate("hello world", 8), "hello...");
        }

        #[test]
        fn truncate_counts_chars_not_bytes() {
            assert_eq!(truncate("héllo wörld", 8), "héllo...");
        }
    }

    mod now_tests {
        use super::*;
        use crate::models::fixtures::at;

        #[test]
        fn resolve_now_parses_flag() {
            assert_eq!(resolve_now(Some("2024-06-15")).unwrap(), at(2024, 6, 15));
        }

        #[test]
        fn resolve_now_rejects_garbage() {
            assert!(matches!(
                resolve_now(Some("soon")),
                Err(AppError::InvalidNow(_))
            ));
        }

        #[test]
        fn resolve_now_defaults_to_clock() {
            let before = Utc::now();
            let now = resolve_now(None).unwrap();
            assert!(now >= before);
        }
    }

    mod source_tests {
        use super::*;

        fn config(sessions: Option<&str>) -> Config {
            Config {
                db_path: PathBuf::from("satplan.db"),
                sessions_path: sessions.map(PathBuf::from),
                preview_limit: 5,
            }
        }

        #[test]
        fn file_flag_wins() {
            let source = resolve_source(&config(None), Some(PathBuf::from("a.json")), true);
            assert_eq!(source.unwrap(), PathBuf::from("a.json"));
        }

        #[test]
        fn env_source_used_without_flag() {
            let source = resolve_source(&config(Some("env.json")), None, true);
            assert_eq!(source.unwrap(), PathBuf::from("env.json"));
        }

        #[test]
        fn piped_stdin_is_read_without_a_source() {
            let source = resolve_source(&config(None), None, false);
            assert_eq!(source.unwrap(), PathBuf::from("-"));
        }

        #[test]
        fn terminal_stdin_without_a_source_is_an_error() {
            assert!(matches!(
                resolve_source(&config(None), None, true),
                Err(AppError::MissingSource)
            ));
        }

        #[test]
        fn explicit_dash_reads_stdin_even_on_a_terminal() {
            let source = resolve_source(&config(None), Some(PathBuf::from("-")), true);
            assert_eq!(source.unwrap(), PathBuf::from("-"));
        }
    }

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parse_init_command() {
            let cli = Cli::try_parse_from(["satplan", "init"]).unwrap();
            assert!(!cli.json);
            assert!(matches!(cli.command, Commands::Init));
        }

        #[test]
        fn parse_plan_with_file_and_limit() {
            let cli = Cli::try_parse_from(["satplan", "plan", "--file", "plan.json", "-l", "3"])
                .unwrap();
            match cli.command {
                Commands::Plan { file, limit, section } => {
                    assert_eq!(file, Some(PathBuf::from("plan.json")));
                    assert_eq!(limit, Some(3));
                    assert!(section.is_none());
                }
                _ => panic!("Expected Plan command"),
            }
        }

        #[test]
        fn parse_plan_defaults() {
            let cli = Cli::try_parse_from(["satplan", "plan"]).unwrap();
            match cli.command {
                Commands::Plan { file, limit, .. } => {
                    assert!(file.is_none());
                    assert!(limit.is_none());
                }
                _ => panic!("Expected Plan command"),
            }
        }

        #[test]
        fn parse_plan_section_filter() {
            let cli = Cli::try_parse_from(["satplan", "plan", "--section", "in-progress"]).unwrap();
            match cli.command {
                Commands::Plan { section, .. } => {
                    assert_eq!(section, Some(DisplayStatus::InProgress));
                }
                _ => panic!("Expected Plan command"),
            }
            assert!(Cli::try_parse_from(["satplan", "plan", "-s", "someday"]).is_err());
        }

        #[test]
        fn parse_global_now_and_json() {
            let cli =
                Cli::try_parse_from(["satplan", "next", "--now", "2024-06-15", "--json"]).unwrap();
            assert!(cli.json);
            assert_eq!(cli.now.as_deref(), Some("2024-06-15"));
            assert!(matches!(cli.command, Commands::Next { .. }));
        }

        #[test]
        fn parse_stats_with_short_file() {
            let cli = Cli::try_parse_from(["satplan", "stats", "-f", "-"]).unwrap();
            match cli.command {
                Commands::Stats { file } => assert_eq!(file, Some(PathBuf::from("-"))),
                _ => panic!("Expected Stats command"),
            }
        }

        #[test]
        fn parse_show_session() {
            let cli = Cli::try_parse_from(["satplan", "show", "s2", "-f", "plan.json"]).unwrap();
            match cli.command {
                Commands::Show { id, file } => {
                    assert_eq!(id, "s2");
                    assert_eq!(file, Some(PathBuf::from("plan.json")));
                }
                _ => panic!("Expected Show command"),
            }
            assert!(Cli::try_parse_from(["satplan", "show"]).is_err());
        }

        #[test]
        fn parse_timer_show() {
            let cli = Cli::try_parse_from(["satplan", "timer", "show", "abc-123"]).unwrap();
            match cli.command {
                Commands::Timer(TimerCommands::Show { session_id }) => {
                    assert_eq!(session_id, "abc-123");
                }
                _ => panic!("Expected Timer Show command"),
            }
        }

        #[test]
        fn parse_timer_list_and_reset() {
            let cli = Cli::try_parse_from(["satplan", "timer", "list"]).unwrap();
            assert!(matches!(cli.command, Commands::Timer(TimerCommands::List)));

            let cli = Cli::try_parse_from(["satplan", "timer", "reset", "s1"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Timer(TimerCommands::Reset { .. })
            ));
        }

        #[test]
        fn parse_tui_with_verbose() {
            let cli = Cli::try_parse_from(["satplan", "-v", "tui", "-f", "plan.json"]).unwrap();
            assert!(cli.verbose);
            assert!(matches!(cli.command, Commands::Tui { .. }));
        }

        #[test]
        fn parse_invalid_command_fails() {
            assert!(Cli::try_parse_from(["satplan", "invalid"]).is_err());
        }

        #[test]
        fn parse_missing_required_arg_fails() {
            assert!(Cli::try_parse_from(["satplan", "timer", "show"]).is_err());
            assert!(Cli::try_parse_from(["satplan", "plan", "--limit", "many"]).is_err());
        }
    }

    mod render_tests {
        use super::*;
        use crate::error::RecordError;
        use crate::ingest::{Ingested, SkippedRecord};
        use crate::models::fixtures::{at, session};
        use crate::models::{RawStatus, SessionTopic};

        fn view_with_skip() -> StudyPlanView {
            let ingested = Ingested {
                sessions: vec![
                    session("s1", RawStatus::Completed, at(2024, 1, 1)),
                    session("s2", RawStatus::Pending, at(2020, 1, 1)),
                ],
                skipped: vec![SkippedRecord {
                    index: 2,
                    id: Some("bad".into()),
                    error: RecordError::MissingField("scheduled_date"),
                }],
            };
            StudyPlanView::build(ingested, at(2024, 6, 15))
        }

        #[test]
        fn plan_json_reports_skipped_for_one_section() {
            let json = plan_json(&view_with_skip(), Some(DisplayStatus::Overdue));
            assert_eq!(json["status"], "overdue");
            assert_eq!(json["sessions"][0]["id"], "s2");
            assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
            assert_eq!(json["skipped"][0]["id"], "bad");
        }

        #[test]
        fn plan_json_reports_all_sections_and_skipped() {
            let json = plan_json(&view_with_skip(), None);
            assert_eq!(json["counts"]["completed"], 1);
            assert_eq!(json["sections"]["overdue"][0]["id"], "s2");
            assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
        }

        #[test]
        fn session_line_includes_date_topics_and_minutes() {
            let mut s = session("s1", RawStatus::Pending, at(2024, 6, 1));
            s.session_number = Some(4);
            s.estimated_time_minutes = Some(30);
            s.topics = vec![SessionTopic {
                topic_id: None,
                topic_name: "Circles".into(),
                num_questions: 25,
            }];
            let line = session_line(&s);
            assert!(line.starts_with("Session 4"));
            assert!(line.contains("2024-06-01"));
            assert!(line.contains("Circles"));
            assert!(line.ends_with("30 min"));
        }

        #[test]
        fn session_line_without_minutes() {
            let s = session("s1", RawStatus::Pending, at(2024, 6, 1));
            assert!(session_line(&s).ends_with('-'));
        }
    }
}
