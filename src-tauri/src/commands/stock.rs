use crate::error::{PlannerError, Result};
use crate::models::{name_key, AddStock, StockItem, Unit};
use rusqlite::{Connection, OptionalExtension, Row};

const SELECT_STOCK: &str = "SELECT id, name, quantity, unit, updated_at FROM stock";

fn stock_from_row(row: &Row<'_>) -> rusqlite::Result<StockItem> {
    Ok(StockItem {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity: row.get(2)?,
        unit: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

pub fn list_stock(conn: &Connection) -> Result<Vec<StockItem>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT_STOCK))?;

    let items = stmt
        .query_map([], stock_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

fn get_stock(conn: &Connection, id: i64) -> Result<StockItem> {
    conn.query_row(&format!("{} WHERE id = ?1", SELECT_STOCK), [id], stock_from_row)
        .optional()?
        .ok_or_else(|| PlannerError::not_found("Stock item", id))
}

/// Add to the pantry. A repeated (name, unit) pair accumulates onto the
/// existing row; names compare on their lowercased key, units exactly.
pub fn add_stock(conn: &Connection, item: AddStock) -> Result<StockItem> {
    let name = item.name.trim().to_string();
    if name.is_empty() || !item.quantity.is_finite() || item.quantity <= 0.0 {
        return Err(PlannerError::Validation(
            "Stock needs a name and a positive quantity".to_string(),
        ));
    }

    let key = name_key(&name);
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM stock WHERE name_key = ?1 AND unit = ?2",
            rusqlite::params![key, item.unit],
            |row| row.get(0),
        )
        .optional()?;

    let id = match existing {
        Some(id) => {
            conn.execute(
                "UPDATE stock SET quantity = quantity + ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                rusqlite::params![item.quantity, id],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO stock (name, name_key, quantity, unit) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![name, key, item.quantity, item.unit],
            )?;
            conn.last_insert_rowid()
        }
    };

    get_stock(conn, id)
}

pub fn set_stock_quantity(conn: &Connection, id: i64, quantity: f64) -> Result<StockItem> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(PlannerError::Validation(
            "Stock quantity cannot be negative".to_string(),
        ));
    }

    conn.execute(
        "UPDATE stock SET quantity = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        rusqlite::params![quantity, id],
    )?;

    if conn.changes() == 0 {
        return Err(PlannerError::not_found("Stock item", id));
    }

    get_stock(conn, id)
}

pub fn delete_stock(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM stock WHERE id = ?1", [id])?;
    Ok(())
}

pub fn clear_stock(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM stock", [])?)
}

/// Quantity held for an exact (name, unit) pair; zero when absent.
pub fn stock_on_hand(conn: &Connection, name: &str, unit: &Unit) -> Result<f64> {
    let quantity: Option<f64> = conn
        .query_row(
            "SELECT quantity FROM stock WHERE name_key = ?1 AND unit = ?2",
            rusqlite::params![name_key(name), unit],
            |row| row.get(0),
        )
        .optional()?;

    Ok(quantity.unwrap_or(0.0))
}

#[cfg(feature = "desktop")]
pub mod invoke {
    use crate::db::DatabaseExt;
    use crate::models::{AddStock, StockItem};
    use tauri::AppHandle;

    #[tauri::command]
    pub fn get_stock(app: AppHandle) -> Result<Vec<StockItem>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_stock(&conn).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn add_stock(app: AppHandle, item: AddStock) -> Result<StockItem, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::add_stock(&conn, item).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn set_stock_quantity(app: AppHandle, id: i64, quantity: f64) -> Result<StockItem, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::set_stock_quantity(&conn, id, quantity).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn delete_stock(app: AppHandle, id: i64) -> Result<(), String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::delete_stock(&conn, id).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn clear_stock(app: AppHandle) -> Result<usize, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::clear_stock(&conn).map_err(|e| e.to_string())
    }
}
