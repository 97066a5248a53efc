pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;


pub use error::{PlannerError, Result};

#[cfg(feature = "desktop")]
pub fn run() {
    use commands::{planning, recipes, shopping, stock, stores};
    use config::Settings;
    use db::Database;
    use engine::{ShoppingListService, SqliteCatalog};
    use std::sync::Arc;
    use tauri::Manager;

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let settings = Settings::from_env(&app_dir);
            logging::init(&settings.log_filter);

            // Initialize database
            let db = Arc::new(Database::open(&settings.database_path)?);
            db.initialize()?;
            tracing::info!(path = %settings.database_path.display(), "Database ready");

            app.manage(ShoppingListService::new(SqliteCatalog::new(Arc::clone(&db))));
            app.manage(db);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Recipes
            recipes::invoke::get_recipes,
            recipes::invoke::get_recipes_by_meal,
            recipes::invoke::get_recipe,
            recipes::invoke::save_recipe,
            recipes::invoke::delete_recipe,
            // Planning
            planning::invoke::get_planning,
            planning::invoke::get_planning_for_period,
            planning::invoke::set_meal,
            // Stock
            stock::invoke::get_stock,
            stock::invoke::add_stock,
            stock::invoke::set_stock_quantity,
            stock::invoke::delete_stock,
            stock::invoke::clear_stock,
            // Stores and prices
            stores::invoke::get_stores,
            stores::invoke::create_store,
            stores::invoke::delete_store,
            stores::invoke::get_prices,
            stores::invoke::get_prices_for_ingredient,
            stores::invoke::upsert_price,
            stores::invoke::delete_price,
            // Shopping list
            shopping::invoke::generate_shopping_list,
            shopping::invoke::get_latest_shopping_list,
            shopping::invoke::export_shopping_list,
            shopping::invoke::suggested_export_name,
            shopping::invoke::save_shopping_list,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
