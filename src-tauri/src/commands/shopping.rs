use crate::engine::{render_text, ShoppingList};
use crate::error::Result;
use std::path::Path;

/// Write the text rendition of `list` to `path`.
pub async fn save_export(path: &Path, list: &ShoppingList) -> Result<()> {
    tokio::fs::write(path, render_text(list)).await?;
    tracing::info!(path = %path.display(), lines = list.line_count(), "Shopping list exported");
    Ok(())
}

#[cfg(feature = "desktop")]
pub mod invoke {
    use crate::engine::{export_file_name, RunOutcome, ShoppingList, ShoppingListService, SqliteCatalog};
    use crate::models::DateRange;
    use std::path::PathBuf;
    use tauri::State;

    type Service = ShoppingListService<SqliteCatalog>;

    /// `None` when a newer generation superseded this one.
    #[tauri::command]
    pub async fn generate_shopping_list(
        service: State<'_, Service>,
        range: Option<DateRange>,
    ) -> Result<Option<ShoppingList>, String> {
        match service.generate(range).await {
            Ok(RunOutcome::Current(list)) => Ok(Some(list)),
            Ok(RunOutcome::Superseded(_)) => Ok(None),
            Err(e) => Err(format!("Could not generate the shopping list: {}", e)),
        }
    }

    #[tauri::command]
    pub async fn get_latest_shopping_list(service: State<'_, Service>) -> Result<Option<ShoppingList>, String> {
        Ok(service.latest().await)
    }

    #[tauri::command]
    pub async fn export_shopping_list(
        service: State<'_, Service>,
        range: Option<DateRange>,
    ) -> Result<String, String> {
        service
            .export_text(range)
            .await
            .map_err(|e| format!("Could not export the shopping list: {}", e))
    }

    #[tauri::command]
    pub fn suggested_export_name() -> String {
        export_file_name(chrono::Local::now().date_naive())
    }

    #[tauri::command]
    pub async fn save_shopping_list(
        service: State<'_, Service>,
        path: PathBuf,
        range: Option<DateRange>,
    ) -> Result<(), String> {
        let list = crate::engine::build_shopping_list(service.catalog(), range)
            .await
            .map_err(|e| e.to_string())?;
        super::save_export(&path, &list).await.map_err(|e| e.to_string())
    }
}
