use std::path::PathBuf;

const DEFAULT_DB_NAME: &str = "satplan.db";
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

pub const ENV_DB: &str = "SATPLAN_DB";
pub const ENV_SESSIONS: &str = "SATPLAN_SESSIONS";
pub const ENV_PREVIEW_LIMIT: &str = "SATPLAN_PREVIEW_LIMIT";
pub const ENV_LOG: &str = "SATPLAN_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub sessions_path: Option<PathBuf>,
    pub preview_limit: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup(ENV_DB)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let sessions_path = lookup(ENV_SESSIONS)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let preview_limit = lookup(ENV_PREVIEW_LIMIT)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PREVIEW_LIMIT);

        Self {
            db_path,
            sessions_path,
            preview_limit,
        }
    }

    /// CLI flag first, then the configured default.
    pub fn sessions_source(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        flag.or_else(|| self.sessions_path.clone())
    }
}

fn default_db_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("satplan")
        .join(DEFAULT_DB_NAME)
}
