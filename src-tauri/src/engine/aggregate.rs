use super::catalog::Catalog;
use crate::error::Result;
use crate::models::{name_key, PlanningEntry, Recipe, Unit};
use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Total quantity of one ingredient required by the planned meals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demand {
    pub name: String,
    pub unit: Unit,
    pub quantity: f64,
}

/// Recipes resolved during a single generation. Each id is fetched at most
/// once; deleted recipes are remembered as `None`.
#[derive(Debug, Default)]
pub struct RecipeCache {
    recipes: HashMap<i64, Option<Recipe>>,
}

impl RecipeCache {
    /// Fetch every id not cached yet, concurrently. Returns once all lookups
    /// have settled; the first failure aborts.
    pub async fn resolve<C>(&mut self, catalog: &C, ids: impl IntoIterator<Item = i64>) -> Result<()>
    where
        C: Catalog + ?Sized,
    {
        let mut missing: Vec<i64> = ids
            .into_iter()
            .filter(|id| !self.recipes.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        let fetched = try_join_all(missing.iter().map(|&id| catalog.get_recipe(id))).await?;

        self.recipes.extend(missing.into_iter().zip(fetched));
        Ok(())
    }

    pub fn get(&self, id: i64) -> Option<&Recipe> {
        self.recipes.get(&id).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Sum ingredient quantities over every meal of every planned day.
///
/// Lines are keyed by lowercased name and exact unit, keep the casing of the
/// first occurrence and come out in first-seen order (days by date, meals in
/// breakfast-to-dinner order). Meals pointing at a deleted recipe add nothing.
pub async fn aggregate_demand<C>(catalog: &C, planning: &[PlanningEntry]) -> Result<Vec<Demand>>
where
    C: Catalog + ?Sized,
{
    let mut days: Vec<&PlanningEntry> = planning.iter().collect();
    days.sort_by_key(|entry| entry.date);

    let mut cache = RecipeCache::default();
    cache
        .resolve(catalog, days.iter().flat_map(|entry| entry.meals.values().copied()))
        .await?;

    let mut totals: IndexMap<(String, Unit), Demand> = IndexMap::new();

    for entry in days {
        for (meal, recipe_id) in &entry.meals {
            let Some(recipe) = cache.get(*recipe_id) else {
                tracing::debug!(date = %entry.date, %meal, recipe_id, "Skipping missing recipe");
                continue;
            };

            for ingredient in &recipe.ingredients {
                let key = (name_key(&ingredient.name), ingredient.unit.clone());
                totals
                    .entry(key)
                    .or_insert_with(|| Demand {
                        name: ingredient.name.clone(),
                        unit: ingredient.unit.clone(),
                        quantity: 0.0,
                    })
                    .quantity += ingredient.quantity;
            }
        }
    }

    Ok(totals.into_values().collect())
}
