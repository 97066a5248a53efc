use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "grocery_planner.db";
pub const DATABASE_ENV: &str = "GROCERY_PLANNER_DB";
pub const LOG_ENV: &str = "GROCERY_PLANNER_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub log_filter: String,
}

impl Settings {
    /// Resolve settings from the environment, with the database defaulting to
    /// `default_dir/grocery_planner.db`.
    pub fn from_env(default_dir: &Path) -> Self {
        Self::resolve(default_dir, |key| std::env::var(key).ok())
    }

    fn resolve(default_dir: &Path, var: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = var(DATABASE_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_dir.join(DATABASE_FILE));

        let log_filter = var(LOG_ENV)
            .or_else(|| var("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Settings {
            database_path,
            log_filter,
        }
    }
}
