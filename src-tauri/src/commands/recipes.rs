use crate::error::{PlannerError, Result};
use crate::models::{Ingredient, Meal, Recipe, SaveRecipe};
use rusqlite::{Connection, OptionalExtension, Row};

const SELECT_RECIPE: &str = "SELECT id, name, meal_type, ingredients, updated_at FROM recipes";

fn recipe_from_row(row: &Row<'_>) -> rusqlite::Result<Recipe> {
    let ingredients: String = row.get(3)?;
    let ingredients: Vec<Ingredient> = serde_json::from_str(&ingredients).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Recipe {
        id: row.get(0)?,
        name: row.get(1)?,
        meal_type: row.get(2)?,
        ingredients,
        updated_at: row.get(4)?,
    })
}

pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY name", SELECT_RECIPE))?;

    let recipes = stmt
        .query_map([], recipe_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(recipes)
}

pub fn list_recipes_by_meal(conn: &Connection, meal: Meal) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(&format!("{} WHERE meal_type = ?1 ORDER BY name", SELECT_RECIPE))?;

    let recipes = stmt
        .query_map([meal], recipe_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(recipes)
}

pub fn get_recipe(conn: &Connection, id: i64) -> Result<Option<Recipe>> {
    let recipe = conn
        .query_row(&format!("{} WHERE id = ?1", SELECT_RECIPE), [id], recipe_from_row)
        .optional()?;

    Ok(recipe)
}

/// Keep the ingredients a form is allowed to save: named, with a positive
/// quantity.
fn valid_ingredients(ingredients: Vec<Ingredient>) -> Vec<Ingredient> {
    ingredients
        .into_iter()
        .filter(|i| !i.name.trim().is_empty() && i.quantity.is_finite() && i.quantity > 0.0)
        .map(|i| Ingredient {
            name: i.name.trim().to_string(),
            ..i
        })
        .collect()
}

pub fn save_recipe(conn: &Connection, recipe: SaveRecipe) -> Result<Recipe> {
    let name = recipe.name.trim().to_string();
    if name.is_empty() {
        return Err(PlannerError::Validation("Recipe name is required".to_string()));
    }

    let ingredients = valid_ingredients(recipe.ingredients);
    if ingredients.is_empty() {
        return Err(PlannerError::Validation(
            "Add at least one valid ingredient".to_string(),
        ));
    }

    let ingredients_json = serde_json::to_string(&ingredients)
        .map_err(|e| PlannerError::Validation(e.to_string()))?;

    let id = match recipe.id {
        Some(id) => {
            conn.execute(
                "UPDATE recipes SET name = ?1, meal_type = ?2, ingredients = ?3, updated_at = CURRENT_TIMESTAMP WHERE id = ?4",
                rusqlite::params![name, recipe.meal_type, ingredients_json, id],
            )?;
            if conn.changes() == 0 {
                return Err(PlannerError::not_found("Recipe", id));
            }
            id
        }
        None => {
            conn.execute(
                "INSERT INTO recipes (name, meal_type, ingredients) VALUES (?1, ?2, ?3)",
                rusqlite::params![name, recipe.meal_type, ingredients_json],
            )?;
            conn.last_insert_rowid()
        }
    };

    get_recipe(conn, id)?.ok_or_else(|| PlannerError::not_found("Recipe", id))
}

/// Planning slots that reference the recipe are left in place; the shopping
/// list skips them.
pub fn delete_recipe(conn: &Connection, id: i64) -> Result<()> {
    conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
    Ok(())
}

#[cfg(feature = "desktop")]
pub mod invoke {
    use crate::db::DatabaseExt;
    use crate::models::{Meal, Recipe, SaveRecipe};
    use tauri::AppHandle;

    #[tauri::command]
    pub fn get_recipes(app: AppHandle) -> Result<Vec<Recipe>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_recipes(&conn).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn get_recipes_by_meal(app: AppHandle, meal: Meal) -> Result<Vec<Recipe>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_recipes_by_meal(&conn, meal).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn get_recipe(app: AppHandle, id: i64) -> Result<Option<Recipe>, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::get_recipe(&conn, id).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn save_recipe(app: AppHandle, recipe: SaveRecipe) -> Result<Recipe, String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::save_recipe(&conn, recipe).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn delete_recipe(app: AppHandle, id: i64) -> Result<(), String> {
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::delete_recipe(&conn, id).map_err(|e| e.to_string())
    }
}
