use crate::error::{PlannerError, Result};
use crate::models::{name_key, Meal, Unit};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub const SCHEMA: &str = "
    -- Recipes; ingredients are stored as a JSON array
    CREATE TABLE IF NOT EXISTS recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        meal_type TEXT NOT NULL,
        ingredients TEXT NOT NULL DEFAULT '[]',
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    -- One recipe per meal per day; empty meals have no row
    CREATE TABLE IF NOT EXISTS planning (
        date DATE NOT NULL,
        meal TEXT NOT NULL,
        recipe_id INTEGER NOT NULL,
        PRIMARY KEY (date, meal)
    );

    -- Pantry stock; name_key is the lowercased name
    CREATE TABLE IF NOT EXISTS stock (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL,
        quantity REAL NOT NULL DEFAULT 0,
        unit TEXT NOT NULL,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (name_key, unit)
    );

    -- Stores
    CREATE TABLE IF NOT EXISTS stores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        name_key TEXT NOT NULL UNIQUE,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    -- One price per ingredient per store
    CREATE TABLE IF NOT EXISTS prices (
        ingredient TEXT NOT NULL,
        ingredient_key TEXT NOT NULL,
        store_id INTEGER NOT NULL,
        unit_price REAL NOT NULL,
        unit TEXT,
        aisle TEXT NOT NULL,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (ingredient_key, store_id),
        FOREIGN KEY (store_id) REFERENCES stores(id)
    );
";

pub struct Database {
    pub conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened database");

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Database {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PlannerError::LockPoisoned)
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;
        initialize_conn(&conn)
    }
}

/// Create the schema and bring older databases up to date.
pub fn initialize_conn(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_conn(conn)?;
    Ok(())
}

fn migrate_conn(conn: &Connection) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    // Databases created before prices carried a basis unit
    if !has_column(&tx, "prices", "unit")? {
        tx.execute("ALTER TABLE prices ADD COLUMN unit TEXT", [])?;
    }

    // Databases that matched names with SQLite NOCASE (ASCII only)
    if !has_column(&tx, "stock", "name_key")? {
        tx.execute("ALTER TABLE stock ADD COLUMN name_key TEXT NOT NULL DEFAULT ''", [])?;
        backfill_keys(&tx, "stock", "name", "name_key")?;
        tx.execute_batch(
            "UPDATE stock SET quantity = (
                 SELECT SUM(s.quantity) FROM stock s WHERE s.name_key = stock.name_key AND s.unit = stock.unit
             )
             WHERE id IN (SELECT MIN(id) FROM stock GROUP BY name_key, unit);
             DELETE FROM stock WHERE id NOT IN (SELECT MIN(id) FROM stock GROUP BY name_key, unit);
             CREATE UNIQUE INDEX IF NOT EXISTS idx_stock_key_unit ON stock (name_key, unit);",
        )?;
    }

    if !has_column(&tx, "stores", "name_key")? {
        tx.execute("ALTER TABLE stores ADD COLUMN name_key TEXT NOT NULL DEFAULT ''", [])?;
        backfill_keys(&tx, "stores", "name", "name_key")?;
        tx.execute("CREATE INDEX IF NOT EXISTS idx_stores_key ON stores (name_key)", [])?;
    }

    if !has_column(&tx, "prices", "ingredient_key")? {
        tx.execute("ALTER TABLE prices ADD COLUMN ingredient_key TEXT NOT NULL DEFAULT ''", [])?;
        backfill_keys(&tx, "prices", "ingredient", "ingredient_key")?;
        tx.execute_batch(
            "DELETE FROM prices WHERE rowid NOT IN (
                 SELECT MAX(rowid) FROM prices GROUP BY ingredient_key, store_id
             );
             CREATE UNIQUE INDEX IF NOT EXISTS idx_prices_key_store ON prices (ingredient_key, store_id);",
        )?;
    }

    tx.commit()?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let columns: Vec<String> = conn
        .prepare(&format!("PRAGMA table_info({})", table))?
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<_>>()?;

    Ok(columns.iter().any(|c| c == column))
}

/// Fill `key` from `source` with the same folding the application uses.
fn backfill_keys(conn: &Connection, table: &str, source: &str, key: &str) -> Result<()> {
    let rows: Vec<(i64, String)> = conn
        .prepare(&format!("SELECT rowid, {} FROM {}", source, table))?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    let mut update = conn.prepare(&format!("UPDATE {} SET {} = ?1 WHERE rowid = ?2", table, key))?;
    for (rowid, name) in &rows {
        update.execute(rusqlite::params![name_key(name), rowid])?;
    }

    tracing::info!(table, rows = rows.len(), "Backfilled name keys");
    Ok(())
}

impl ToSql for Meal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Meal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

impl ToSql for Unit {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Unit {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Unit::from(value.as_str()?))
    }
}

#[cfg(feature = "desktop")]
mod app {
    use super::Database;
    use tauri::{AppHandle, Manager};

    pub trait DatabaseExt {
        fn db(&self) -> &Database;
    }

    impl DatabaseExt for AppHandle {
        fn db(&self) -> &Database {
            self.state::<std::sync::Arc<Database>>().inner()
        }
    }
}

#[cfg(feature = "desktop")]
pub use app::DatabaseExt;
