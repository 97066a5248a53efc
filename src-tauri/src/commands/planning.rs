use crate::error::{PlannerError, Result};
use crate::models::{DateRange, Meal, PlanningEntry};
use chrono::{Datelike, Days, Months, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Planner views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl Period {
    /// Inclusive range of days shown for `date`. Weeks start on Monday.
    pub fn range_containing(self, date: NaiveDate) -> DateRange {
        match self {
            Period::Day => DateRange {
                start: date,
                end: date,
            },
            Period::Week => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                let start = date - Days::new(offset);
                DateRange {
                    start,
                    end: start + Days::new(6),
                }
            }
            Period::Month => {
                let start = date.with_day(1).unwrap_or(date);
                let end = (start + Months::new(1)).pred_opt().unwrap_or(start);
                DateRange { start, end }
            }
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| PlannerError::Validation(format!("Invalid date: {}", value)))
}

fn collect_entries(rows: Vec<(String, Meal, i64)>) -> Result<Vec<PlanningEntry>> {
    let mut days: BTreeMap<NaiveDate, BTreeMap<Meal, i64>> = BTreeMap::new();

    for (date, meal, recipe_id) in rows {
        days.entry(parse_date(&date)?)
            .or_default()
            .insert(meal, recipe_id);
    }

    Ok(days
        .into_iter()
        .map(|(date, meals)| PlanningEntry { date, meals })
        .collect())
}

/// Every planned day in date order, optionally limited to `range`.
pub fn list_planning(conn: &Connection, range: Option<DateRange>) -> Result<Vec<PlanningEntry>> {
    let rows: Vec<(String, Meal, i64)> = match range {
        Some(range) => {
            let mut stmt = conn.prepare(
                "SELECT date, meal, recipe_id FROM planning
                 WHERE date >= ?1 AND date <= ?2
                 ORDER BY date",
            )?;
            let rows = stmt
                .query_map(
                    [format_date(range.start), format_date(range.end)],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare("SELECT date, meal, recipe_id FROM planning ORDER BY date")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };

    collect_entries(rows)
}

pub fn get_planning(conn: &Connection, date: NaiveDate) -> Result<PlanningEntry> {
    let mut stmt = conn.prepare("SELECT meal, recipe_id FROM planning WHERE date = ?1")?;

    let meals = stmt
        .query_map([format_date(date)], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<BTreeMap<Meal, i64>>>()?;

    Ok(PlanningEntry { date, meals })
}

/// Assign a recipe to a meal, or clear the meal with `None`. A day whose
/// meals are all cleared disappears from the planning.
pub fn set_meal(
    conn: &Connection,
    date: NaiveDate,
    meal: Meal,
    recipe_id: Option<i64>,
) -> Result<PlanningEntry> {
    let day = format_date(date);

    match recipe_id {
        Some(recipe_id) => {
            conn.execute(
                "INSERT INTO planning (date, meal, recipe_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT(date, meal) DO UPDATE SET recipe_id = excluded.recipe_id",
                rusqlite::params![day, meal, recipe_id],
            )?;
        }
        None => {
            conn.execute(
                "DELETE FROM planning WHERE date = ?1 AND meal = ?2",
                rusqlite::params![day, meal],
            )?;
        }
    }

    tracing::debug!(date = %day, %meal, ?recipe_id, "Planning updated");

    get_planning(conn, date)
}

#[cfg(feature = "desktop")]
pub mod invoke {
    use super::{parse_date, Period};
    use crate::db::DatabaseExt;
    use crate::models::{Meal, PlanningEntry};
    use tauri::AppHandle;

    #[tauri::command]
    pub fn get_planning(app: AppHandle, date: String) -> Result<PlanningEntry, String> {
        let date = parse_date(&date).map_err(|e| e.to_string())?;
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::get_planning(&conn, date).map_err(|e| e.to_string())
    }

    #[tauri::command]
    pub fn get_planning_for_period(
        app: AppHandle,
        period: Period,
        date: Option<String>,
    ) -> Result<Vec<PlanningEntry>, String> {
        let anchor = match date {
            Some(date) => parse_date(&date).map_err(|e| e.to_string())?,
            None => chrono::Local::now().date_naive(),
        };
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::list_planning(&conn, Some(period.range_containing(anchor))).map_err(|e| e.to_string())
    }

    #[tauri::command]
    #[allow(non_snake_case)]
    pub fn set_meal(
        app: AppHandle,
        date: String,
        meal: Meal,
        recipeId: Option<i64>,
    ) -> Result<PlanningEntry, String> {
        let date = parse_date(&date).map_err(|e| e.to_string())?;
        let conn = app.db().lock().map_err(|e| e.to_string())?;
        super::set_meal(&conn, date, meal, recipeId).map_err(|e| e.to_string())
    }
}
