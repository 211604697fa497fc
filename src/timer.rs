use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTDOWN_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimerMode {
    Stopwatch,
    Countdown { duration_secs: i64 },
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Stopwatch => "stopwatch",
            TimerMode::Countdown { .. } => "countdown",
        }
    }

    pub fn from_parts(mode: &str, duration_secs: Option<i64>) -> Option<Self> {
        match (mode, duration_secs) {
            ("stopwatch", _) => Some(TimerMode::Stopwatch),
            ("countdown", Some(secs)) if secs > 0 => Some(TimerMode::Countdown {
                duration_secs: secs,
            }),
            _ => None,
        }
    }

    pub fn duration_secs(&self) -> Option<i64> {
        match self {
            TimerMode::Stopwatch => None,
            TimerMode::Countdown { duration_secs } => Some(*duration_secs),
        }
    }
}

/// Practice-session timer. Every operation takes the current time explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeTimer {
    pub session_id: String,
    pub mode: TimerMode,
    pub elapsed_secs: i64,
    pub running_since: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl PracticeTimer {
    pub fn stopwatch(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            mode: TimerMode::Stopwatch,
            elapsed_secs: 0,
            running_since: None,
            updated_at: now,
        }
    }

    pub fn countdown(session_id: impl Into<String>, minutes: u32, now: DateTime<Utc>) -> Self {
        Self {
            mode: TimerMode::Countdown {
                duration_secs: i64::from(minutes.max(1)) * 60,
            },
            ..Self::stopwatch(session_id, now)
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> i64 {
        let running = self
            .running_since
            .map(|since| (now - since).num_seconds().max(0))
            .unwrap_or(0);
        let total = self.elapsed_secs + running;
        match self.mode.duration_secs() {
            Some(limit) => total.min(limit),
            None => total,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.mode
            .duration_secs()
            .map(|limit| (limit - self.elapsed(now)).max(0))
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now) == Some(0)
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.is_running() || self.is_finished(now) {
            return;
        }
        self.running_since = Some(now);
        self.updated_at = now;
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.is_running() {
            return;
        }
        self.elapsed_secs = self.elapsed(now);
        self.running_since = None;
        self.updated_at = now;
    }

    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.is_running() {
            self.pause(now);
        } else {
            self.start(now);
        }
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.elapsed_secs = 0;
        self.running_since = None;
        self.updated_at = now;
    }

    /// Stops a countdown that has run out. Returns true when it just stopped.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running() && self.is_finished(now) {
            self.pause(now);
            true
        } else {
            false
        }
    }

    /// Paused copy with the running time folded in; this is what gets stored.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Self {
        let mut paused = self.clone();
        paused.pause(now);
        paused
    }

    pub fn display(&self, now: DateTime<Utc>) -> String {
        let secs = self.remaining(now).unwrap_or_else(|| self.elapsed(now));
        format_clock(secs)
    }
}

pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
