//! In-memory catalog for engine tests.

use super::catalog::Catalog;
use crate::error::{PlannerError, Result};
use crate::models::{name_key, DateRange, Ingredient, Meal, PlanningEntry, Price, Recipe, Store, Unit};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct FakeCatalog {
    pub planning: Vec<PlanningEntry>,
    pub recipes: HashMap<i64, Recipe>,
    pub stock: Vec<(String, Unit, f64)>,
    pub prices: Vec<Price>,
    pub stores: Vec<Store>,
    pub fail_prices: AtomicBool,
    pub recipe_lookups: AtomicUsize,
    /// When set, the next planning lookup signals `entered` and waits for
    /// the gate to open.
    pub gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ingredient(name: &str, quantity: f64, unit: Unit) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        quantity,
        unit,
    }
}

impl FakeCatalog {
    pub fn recipe(mut self, id: i64, name: &str, ingredients: Vec<Ingredient>) -> Self {
        self.recipes.insert(
            id,
            Recipe {
                id,
                name: name.to_string(),
                meal_type: Meal::Dinner,
                ingredients,
                updated_at: String::new(),
            },
        );
        self
    }

    pub fn plan(mut self, date: NaiveDate, meal: Meal, recipe_id: i64) -> Self {
        match self.planning.iter_mut().find(|e| e.date == date) {
            Some(entry) => {
                entry.meals.insert(meal, recipe_id);
            }
            None => self.planning.push(PlanningEntry {
                date,
                meals: BTreeMap::from([(meal, recipe_id)]),
            }),
        }
        self
    }

    pub fn stocked(mut self, name: &str, unit: Unit, quantity: f64) -> Self {
        self.stock.push((name.to_string(), unit, quantity));
        self
    }

    pub fn store(mut self, id: i64, name: &str) -> Self {
        self.stores.push(Store {
            id,
            name: name.to_string(),
            created_at: String::new(),
        });
        self
    }

    pub fn price(mut self, ingredient: &str, store_id: i64, unit_price: f64, unit: Option<Unit>, aisle: &str) -> Self {
        self.prices.push(Price {
            ingredient: ingredient.to_string(),
            store_id,
            unit_price,
            unit,
            aisle: aisle.to_string(),
            updated_at: String::new(),
        });
        self
    }

    /// Returns (entered, release).
    pub fn gated(self) -> (Self, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((Arc::clone(&entered), Arc::clone(&release)));
        (self, entered, release)
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn list_planning(&self, range: Option<DateRange>) -> Result<Vec<PlanningEntry>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }

        let mut entries: Vec<PlanningEntry> = self
            .planning
            .iter()
            .filter(|e| range.map_or(true, |r| r.contains(e.date)))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.date);
        Ok(entries)
    }

    async fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        self.recipe_lookups.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.recipes.get(&id).cloned())
    }

    async fn stock_on_hand(&self, name: &str, unit: &Unit) -> Result<f64> {
        Ok(self
            .stock
            .iter()
            .find(|(n, u, _)| name_key(n) == name_key(name) && u == unit)
            .map_or(0.0, |(_, _, q)| *q))
    }

    async fn prices_for(&self, ingredient: &str) -> Result<Vec<Price>> {
        if self.fail_prices.load(Ordering::SeqCst) {
            return Err(PlannerError::Lookup("price catalog unreachable".to_string()));
        }
        Ok(self
            .prices
            .iter()
            .filter(|p| name_key(&p.ingredient) == name_key(ingredient))
            .cloned()
            .collect())
    }

    async fn list_stores(&self) -> Result<Vec<Store>> {
        Ok(self.stores.clone())
    }
}
