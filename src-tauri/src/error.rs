//! Error type shared by storage, CRUD commands and the shopping-list engine.

/// Failures surfaced to the caller of a command or engine run.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// An external read failed; the whole generation is aborted.
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// SQLite error in a CRUD path.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure while opening the database or writing an export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A thread panicked while holding the database connection.
    #[error("database lock poisoned")]
    LockPoisoned,

    /// Input rejected before it reaches storage.
    #[error("{0}")]
    Validation(String),

    /// Explicit update or delete of a record that does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Unique name conflict.
    #[error("{0} already exists")]
    Duplicate(String),

    /// A blocking storage task did not complete.
    #[error("storage task failed: {0}")]
    Join(String),
}

impl PlannerError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Engine-side view of any failure: everything is a lookup failure once it
    /// crosses the catalog boundary.
    pub fn into_lookup(self) -> Self {
        match self {
            Self::Lookup(_) => self,
            other => Self::Lookup(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for PlannerError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e.to_string())
    }
}

pub type Result<T, E = PlannerError> = std::result::Result<T, E>;
