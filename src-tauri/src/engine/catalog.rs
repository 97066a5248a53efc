//! Read access the shopping-list engine needs from persistence.

use crate::commands::{planning, recipes, stock, stores};
use crate::db::Database;
use crate::error::Result;
use crate::models::{DateRange, PlanningEntry, Price, Recipe, Store, Unit};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::Arc;

/// Lookups consumed by one shopping-list generation. Any error aborts the
/// generation.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Planned days in date order, optionally limited to `range`.
    async fn list_planning(&self, range: Option<DateRange>) -> Result<Vec<PlanningEntry>>;

    /// `None` when the recipe was deleted.
    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>>;

    /// On-hand quantity for the exact (name, unit) pair, zero when absent.
    async fn stock_on_hand(&self, name: &str, unit: &Unit) -> Result<f64>;

    /// Every price row recorded for the ingredient.
    async fn prices_for(&self, ingredient: &str) -> Result<Vec<Price>>;

    async fn list_stores(&self) -> Result<Vec<Store>>;
}

/// Catalog backed by the application database. Each lookup runs on the
/// blocking pool so the connection lock is never held across an await.
#[derive(Clone)]
pub struct SqliteCatalog {
    db: Arc<Database>,
}

impl SqliteCatalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock()?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn list_planning(&self, range: Option<DateRange>) -> Result<Vec<PlanningEntry>> {
        self.read(move |conn| planning::list_planning(conn, range)).await
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        self.read(move |conn| recipes::get_recipe(conn, id)).await
    }

    async fn stock_on_hand(&self, name: &str, unit: &Unit) -> Result<f64> {
        let name = name.to_string();
        let unit = unit.clone();
        self.read(move |conn| stock::stock_on_hand(conn, &name, &unit)).await
    }

    async fn prices_for(&self, ingredient: &str) -> Result<Vec<Price>> {
        let ingredient = ingredient.to_string();
        self.read(move |conn| stores::prices_for_ingredient(conn, &ingredient)).await
    }

    async fn list_stores(&self) -> Result<Vec<Store>> {
        self.read(stores::list_stores).await
    }
}
