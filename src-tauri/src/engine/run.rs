use super::catalog::Catalog;
use super::present::{render_text, ShoppingList};
use crate::error::Result;
use crate::models::DateRange;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Identifier of one generation. Later runs have larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunId(pub u64);

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out run ids and remembers the most recent one.
#[derive(Debug, Default)]
pub struct RunTracker {
    latest: AtomicU64,
}

impl RunTracker {
    pub fn begin(&self) -> RunId {
        RunId(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, run: RunId) -> bool {
        self.latest.load(Ordering::SeqCst) == run.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The run finished while still the latest; its list was published.
    Current(ShoppingList),
    /// A newer run started before this one finished; the result was dropped.
    Superseded(RunId),
}

/// Entry point for the UI. Each call recomputes from scratch; only the
/// latest run may publish.
pub struct ShoppingListService<C> {
    catalog: C,
    runs: RunTracker,
    published: Mutex<Option<(RunId, ShoppingList)>>,
}

impl<C: Catalog> ShoppingListService<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            runs: RunTracker::default(),
            published: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub async fn generate(&self, range: Option<DateRange>) -> Result<RunOutcome> {
        let run = self.runs.begin();
        tracing::debug!(%run, ?range, "Generating shopping list");

        let result = super::build_shopping_list(&self.catalog, range).await;

        let mut published = self.published.lock().await;
        if !self.runs.is_current(run) {
            tracing::warn!(%run, "Discarding result of superseded run");
            return Ok(RunOutcome::Superseded(run));
        }

        let list = result.inspect_err(|e| {
            tracing::error!(%run, error = %e, "Shopping list generation failed");
        })?;

        tracing::info!(
            %run,
            lines = list.line_count(),
            grand_total = list.grand_total,
            "Shopping list generated"
        );

        *published = Some((run, list.clone()));
        Ok(RunOutcome::Current(list))
    }

    /// Last list published by a current run.
    pub async fn latest(&self) -> Option<ShoppingList> {
        self.published.lock().await.as_ref().map(|(_, list)| list.clone())
    }

    /// Fresh list rendered as text. Does not publish.
    pub async fn export_text(&self, range: Option<DateRange>) -> Result<String> {
        let list = super::build_shopping_list(&self.catalog, range).await?;
        Ok(render_text(&list))
    }
}
