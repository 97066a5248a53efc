use crate::error::{PlannerError, Result};
use crate::models::{name_key, Price, Store, UpsertPrice};
use rusqlite::{Connection, OptionalExtension, Row};

const SELECT_PRICE: &str = "SELECT ingredient, store_id, unit_price, unit, aisle, updated_at FROM prices";

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<Price> {
    Ok(Price {
        ingredient: row.get(0)?,
        store_id: row.get(1)?,
        unit_price: row.get(2)?,
        unit: row.get(3)?,
        aisle: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn list_stores(conn: &Connection) -> Result<Vec<Store>> {
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM stores ORDER BY id")?;

    let stores = stmt
        .query_map([], store_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(stores)
}

pub fn create_store(conn: &Connection, name: &str) -> Result<Store> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlannerError::Validation("Store name is required".to_string()));
    }

    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM stores WHERE name_key = ?1",
            [name_key(name)],
            |row| row.get(0),
        )
        .optional()?;

    if exists.is_some() {
        return Err(PlannerError::Duplicate(format!("Store '{}'", name)));
    }

    conn.execute(
        "INSERT INTO stores (name, name_key) VALUES (?1, ?2)",
        rusqlite::params![name, name_key(name)],
    )?;
    let id = conn.last_insert_rowid();

    let store = conn.query_row(
        "SELECT id, name, created_at FROM stores WHERE id = ?1",
        [id],
        store_from_row,
    )?;

    Ok(store)
}

/// Delete a store together with every price recorded for it.
pub fn delete_store(conn: &Connection, id: i64) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let removed_prices = tx.execute("DELETE FROM prices WHERE store_id = ?1", [id])?;
    tx.execute("DELETE FROM stores WHERE id = ?1", [id])?;

    tx.commit()?;

    tracing::debug!(store_id = id, removed_prices, "Store deleted");
    Ok(())
}

pub fn list_prices(conn: &Connection) -> Result<Vec<Price>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY ingredient_key, unit_price", SELECT_PRICE))?;

    let prices = stmt
        .query_map([], price_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(prices)
}

/// All price rows for an ingredient, in store order: the per-store price
/// comparison. Names compare on their lowercased key.
pub fn prices_for_ingredient(conn: &Connection, ingredient: &str) -> Result<Vec<Price>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE ingredient_key = ?1 ORDER BY store_id",
        SELECT_PRICE
    ))?;

    let prices = stmt
        .query_map([name_key(ingredient)], price_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(prices)
}

/// Record the price of an ingredient at a store, replacing any earlier price
/// for the same pair.
pub fn upsert_price(conn: &Connection, price: UpsertPrice) -> Result<Price> {
    let ingredient = price.ingredient.trim().to_string();
    let aisle = price.aisle.trim().to_string();

    if ingredient.is_empty()
        || aisle.is_empty()
        || !price.unit_price.is_finite()
        || price.unit_price <= 0.0
    {
        return Err(PlannerError::Validation(
            "Price needs an ingredient, an aisle and a positive amount".to_string(),
        ));
    }

    let store: Option<i64> = conn
        .query_row("SELECT id FROM stores WHERE id = ?1", [price.store_id], |row| row.get(0))
        .optional()?;

    if store.is_none() {
        return Err(PlannerError::not_found("Store", price.store_id));
    }

    let key = name_key(&ingredient);
    conn.execute(
        "INSERT INTO prices (ingredient, ingredient_key, store_id, unit_price, unit, aisle)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(ingredient_key, store_id) DO UPDATE SET
            unit_price = excluded.unit_price,
            unit = excluded.unit,
            aisle = excluded.aisle,
            updated_at = CURRENT_TIMESTAMP",
        rusqlite::params![ingredient, key, price.store_id, price.unit_price, price.unit, aisle],
    )?;

    let saved = conn.query_row(
        &format!("{} WHERE ingredient_key = ?1 AND store_id = ?2", SELECT_PRICE),
        rusqlite::params![key, price.store_id],
        price_from_row,
    )?;

    Ok(saved)
}

pub fn delete_price(conn: &Connection, ingredient: &str, store_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM prices WHERE ingredient_key = ?1 AND store_id = ?2",
        rusqlite::params![name_key(ingredient), store_id],
    )?;
    Ok(())
}

#[cfg(feature = "desktop")]
pub mod invoke {
    use crate::db::DatabaseExt;
    use crate::models::{Price, Store, UpsertPrice};
    use tauri::AppHandle;

    #[tauri::command]
    pub fn get_stores(app: AppHandle) -> Result<Vec<Store>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_stores(&conn).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn create_store(app: AppHandle, name: String) -> Result<Store, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::create_store(&conn, &name).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn delete_store(app: AppHandle, id: i64) -> Result<(), String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::delete_store(&conn, id).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn get_prices(app: AppHandle) -> Result<Vec<Price>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_prices(&conn).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn get_prices_for_ingredient(app: AppHandle, ingredient: String) -> Result<Vec<Price>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::prices_for_ingredient(&conn, &ingredient).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn upsert_price(app: AppHandle, price: UpsertPrice) -> Result<Price, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::upsert_price(&conn, price).map_err(|e| e.to_string())
    }

    #[tauri::command]
    #[allow(non_snake_case)]
    pub fn delete_price(app: AppHandle, ingredient: String, storeId: i64) -> Result<(), String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::delete_price(&conn, &ingredient, storeId).map_err(|e| e.to_string())
    }
}
