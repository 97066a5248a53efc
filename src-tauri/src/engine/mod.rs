//! Shopping-list generation: planned demand, netted against stock, sent to
//! the cheapest store and grouped for display.

pub mod aggregate;
pub mod assign;
pub mod catalog;
pub mod netting;
pub mod present;
pub mod run;

pub use aggregate::{aggregate_demand, Demand, RecipeCache};
pub use assign::{assign_stores, AssignedLine, StoreKey, UNCLASSIFIED_AISLE};
pub use catalog::{Catalog, SqliteCatalog};
pub use netting::{net_against_stock, NetDemand};
pub use present::{export_file_name, group_by_store, render_text, ShoppingList, StoreGroup};
pub use run::{RunId, RunOutcome, RunTracker, ShoppingListService};

use crate::error::{PlannerError, Result};
use crate::models::DateRange;

/// Run the whole pipeline once. Every lookup has settled before the next
/// stage starts; any lookup failure aborts with [`PlannerError::Lookup`].
pub async fn build_shopping_list<C>(catalog: &C, range: Option<DateRange>) -> Result<ShoppingList>
where
    C: Catalog + ?Sized,
{
    let planning = catalog
        .list_planning(range)
        .await
        .map_err(PlannerError::into_lookup)?;

    let demand = aggregate_demand(catalog, &planning)
        .await
        .map_err(PlannerError::into_lookup)?;

    let net = net_against_stock(catalog, demand)
        .await
        .map_err(PlannerError::into_lookup)?;

    let stores = catalog
        .list_stores()
        .await
        .map_err(PlannerError::into_lookup)?;

    let lines = assign_stores(catalog, net, &stores)
        .await
        .map_err(PlannerError::into_lookup)?;

    Ok(group_by_store(lines, &stores))
}

#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
mod tests {
    use super::fake::{day, ingredient, FakeCatalog};
    use super::*;
    use crate::models::{Meal, Unit};
    use std::sync::atomic::Ordering;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn pasta_night() -> FakeCatalog {
        FakeCatalog::default()
            .recipe(
                1,
                "Pasta",
                vec![
                    ingredient("pasta", 200.0, Unit::Gram),
                    ingredient("cheese", 100.0, Unit::Gram),
                ],
            )
            .plan(day(2024, 1, 1), Meal::Dinner, 1)
            .stocked("cheese", Unit::Gram, 50.0)
            .store(1, "Store A")
            .price("pasta", 1, 3.00, Some(Unit::Kilogram), "Dry goods")
    }

    #[tokio::test]
    async fn pasta_dinner_end_to_end() {
        let catalog = pasta_night();

        let list = build_shopping_list(&catalog, None).await.unwrap();

        assert_eq!(list.stores.len(), 2);

        let store_a = list.store(StoreKey::Store(1)).unwrap();
        let pasta = &store_a.aisles["Dry goods"][0];
        assert_eq!(pasta.name, "pasta");
        assert_eq!(pasta.quantity, 200.0);
        assert!(close(pasta.line_total, 0.60));
        assert!(close(store_a.subtotal, 0.60));

        let unassigned = list.store(StoreKey::Unassigned).unwrap();
        let cheese = &unassigned.aisles[UNCLASSIFIED_AISLE][0];
        assert_eq!(cheese.name, "cheese");
        assert_eq!(cheese.quantity, 50.0);
        assert_eq!(cheese.unit_price, 0.0);
        assert_eq!(cheese.line_total, 0.0);

        assert!(close(list.grand_total, 0.60));
    }

    #[tokio::test]
    async fn demand_sums_across_days_and_meals() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Omelette", vec![ingredient("Eggs", 3.0, Unit::Piece)])
            .recipe(2, "Cake", vec![ingredient("eggs", 4.0, Unit::Piece), ingredient("flour", 250.0, Unit::Gram)])
            .plan(day(2024, 1, 2), Meal::Breakfast, 1)
            .plan(day(2024, 1, 1), Meal::Snack, 2)
            .plan(day(2024, 1, 2), Meal::Dinner, 2);

        let demand = aggregate_demand(&catalog, &catalog.planning).await.unwrap();

        assert_eq!(demand.len(), 2);
        // First seen is Jan 1st's cake, lowercase
        assert_eq!(demand[0].name, "eggs");
        assert_eq!(demand[0].quantity, 11.0);
        assert_eq!(demand[1].name, "flour");
        assert_eq!(demand[1].quantity, 500.0);
    }

    #[tokio::test]
    async fn demand_is_order_independent() {
        let forward = FakeCatalog::default()
            .recipe(1, "A", vec![ingredient("rice", 100.0, Unit::Gram)])
            .recipe(2, "B", vec![ingredient("rice", 150.0, Unit::Gram)])
            .plan(day(2024, 2, 1), Meal::Lunch, 1)
            .plan(day(2024, 2, 3), Meal::Dinner, 2);
        let backward = FakeCatalog::default()
            .recipe(1, "A", vec![ingredient("rice", 100.0, Unit::Gram)])
            .recipe(2, "B", vec![ingredient("rice", 150.0, Unit::Gram)])
            .plan(day(2024, 2, 3), Meal::Dinner, 2)
            .plan(day(2024, 2, 1), Meal::Lunch, 1);

        let a = aggregate_demand(&forward, &forward.planning).await.unwrap();
        let b = aggregate_demand(&backward, &backward.planning).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0].quantity, 250.0);
    }

    #[tokio::test]
    async fn same_name_different_unit_stays_separate() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Soup", vec![ingredient("milk", 200.0, Unit::Millilitre), ingredient("milk", 1.0, Unit::Litre)])
            .plan(day(2024, 1, 1), Meal::Dinner, 1);

        let demand = aggregate_demand(&catalog, &catalog.planning).await.unwrap();

        assert_eq!(demand.len(), 2);
    }

    #[tokio::test]
    async fn missing_recipes_contribute_nothing() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Toast", vec![ingredient("bread", 2.0, Unit::Piece)])
            .recipe(3, "Empty", vec![])
            .plan(day(2024, 1, 1), Meal::Breakfast, 1)
            .plan(day(2024, 1, 1), Meal::Lunch, 99)
            .plan(day(2024, 1, 1), Meal::Dinner, 3);

        let demand = aggregate_demand(&catalog, &catalog.planning).await.unwrap();

        assert_eq!(demand.len(), 1);
        assert_eq!(demand[0].name, "bread");
    }

    #[tokio::test]
    async fn each_recipe_is_fetched_once_per_run() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Porridge", vec![ingredient("oats", 50.0, Unit::Gram)])
            .plan(day(2024, 1, 1), Meal::Breakfast, 1)
            .plan(day(2024, 1, 2), Meal::Breakfast, 1)
            .plan(day(2024, 1, 3), Meal::Breakfast, 1)
            .plan(day(2024, 1, 3), Meal::Snack, 1);

        let demand = aggregate_demand(&catalog, &catalog.planning).await.unwrap();

        assert_eq!(demand[0].quantity, 200.0);
        assert_eq!(catalog.recipe_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recipe_cache_remembers_deleted_recipes() {
        let catalog = FakeCatalog::default().recipe(1, "Porridge", vec![ingredient("oats", 50.0, Unit::Gram)]);
        let mut cache = RecipeCache::default();
        assert!(cache.is_empty());

        cache.resolve(&catalog, [1, 7, 1, 7]).await.unwrap();
        cache.resolve(&catalog, [7]).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(catalog.recipe_lookups.load(Ordering::SeqCst), 2);
        assert_eq!(cache.get(1).map(|r| r.name.as_str()), Some("Porridge"));
        assert!(cache.get(7).is_none());
    }

    #[tokio::test]
    async fn accented_names_match_stock_and_prices_across_case() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Omelette", vec![ingredient("Œufs", 6.0, Unit::Piece), ingredient("Échalote", 1.0, Unit::Piece)])
            .recipe(2, "Quiche", vec![ingredient("œufs", 3.0, Unit::Piece)])
            .plan(day(2024, 1, 1), Meal::Lunch, 1)
            .plan(day(2024, 1, 1), Meal::Dinner, 2)
            .stocked("ŒUFS", Unit::Piece, 4.0)
            .store(1, "Épicerie")
            .price("œufs", 1, 0.30, None, "Crèmerie")
            .price("échalote", 1, 0.50, None, "Légumes");

        let list = build_shopping_list(&catalog, None).await.unwrap();

        let store = list.store(StoreKey::Store(1)).unwrap();
        let eggs = &store.aisles["Crèmerie"][0];
        assert_eq!(eggs.name, "Œufs");
        assert_eq!(eggs.quantity, 5.0);
        assert_eq!(store.aisles["Légumes"][0].quantity, 1.0);
        assert!(list.store(StoreKey::Unassigned).is_none());
    }

    #[tokio::test]
    async fn fully_stocked_ingredients_are_not_listed() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Salad", vec![ingredient("tomato", 2.0, Unit::Piece), ingredient("oil", 10.0, Unit::Millilitre)])
            .plan(day(2024, 1, 1), Meal::Lunch, 1)
            .stocked("Tomato", Unit::Piece, 5.0)
            .stocked("oil", Unit::Millilitre, 10.0);

        let list = build_shopping_list(&catalog, None).await.unwrap();

        assert!(list.is_empty());
        assert_eq!(list.grand_total, 0.0);
    }

    #[tokio::test]
    async fn stock_in_another_unit_does_not_offset() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Bread", vec![ingredient("flour", 500.0, Unit::Gram)])
            .plan(day(2024, 1, 1), Meal::Lunch, 1)
            .stocked("flour", Unit::Kilogram, 2.0);

        let net = net_against_stock(&catalog, aggregate_demand(&catalog, &catalog.planning).await.unwrap())
            .await
            .unwrap();

        assert_eq!(net.len(), 1);
        assert_eq!(net[0].to_buy, 500.0);
        assert_eq!(net[0].on_hand, 0.0);
    }

    #[tokio::test]
    async fn cheapest_store_wins_until_it_is_deleted() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Stew", vec![ingredient("carrot", 4.0, Unit::Piece)])
            .plan(day(2024, 1, 1), Meal::Dinner, 1)
            .store(1, "A")
            .store(2, "B")
            .price("carrot", 1, 2.50, None, "Produce")
            .price("carrot", 2, 1.90, None, "Vegetables");

        let list = build_shopping_list(&catalog, None).await.unwrap();
        let b = list.store(StoreKey::Store(2)).unwrap();
        assert!(close(b.subtotal, 7.60));
        assert!(list.store(StoreKey::Store(1)).is_none());

        let mut without_b = catalog;
        without_b.stores.retain(|s| s.id != 2);

        let list = build_shopping_list(&without_b, None).await.unwrap();
        let a = list.store(StoreKey::Store(1)).unwrap();
        assert!(close(a.aisles["Produce"][0].line_total, 10.0));
    }

    #[tokio::test]
    async fn lookup_failure_aborts_generation() {
        let catalog = pasta_night();
        catalog.fail_prices.store(true, Ordering::SeqCst);

        let err = build_shopping_list(&catalog, None).await.unwrap_err();

        assert!(matches!(err, PlannerError::Lookup(_)));
    }

    #[tokio::test]
    async fn regeneration_is_identical() {
        let catalog = pasta_night()
            .recipe(2, "Pancakes", vec![ingredient("milk", 300.0, Unit::Millilitre), ingredient("egg", 2.0, Unit::Piece)])
            .plan(day(2024, 1, 2), Meal::Breakfast, 2)
            .store(2, "Store B")
            .price("milk", 2, 0.002, None, "Dairy")
            .price("egg", 2, 0.30, None, "Dairy");

        let first = build_shopping_list(&catalog, None).await.unwrap();
        let second = build_shopping_list(&catalog, None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.grand_total.to_bits(), second.grand_total.to_bits());
        assert_eq!(render_text(&first), render_text(&second));
    }

    #[tokio::test]
    async fn totals_are_consistent() {
        let catalog = FakeCatalog::default()
            .recipe(
                1,
                "Curry",
                vec![
                    ingredient("rice", 300.0, Unit::Gram),
                    ingredient("chicken", 0.5, Unit::Kilogram),
                    ingredient("coconut milk", 400.0, Unit::Millilitre),
                    ingredient("curry paste", 1.0, Unit::Tablespoon),
                ],
            )
            .plan(day(2024, 1, 1), Meal::Dinner, 1)
            .plan(day(2024, 1, 4), Meal::Dinner, 1)
            .store(1, "A")
            .store(2, "B")
            .price("rice", 1, 1.20, Some(Unit::Kilogram), "Grains")
            .price("chicken", 2, 9.90, Some(Unit::Kilogram), "Meat")
            .price("coconut milk", 1, 2.10, Some(Unit::Litre), "World food");

        let list = build_shopping_list(&catalog, None).await.unwrap();

        let subtotals: f64 = list.stores.iter().map(|s| s.subtotal).sum();
        let lines: f64 = list.stores.iter().flat_map(|s| s.lines()).map(|l| l.line_total).sum();

        assert!(close(list.grand_total, subtotals));
        assert!(close(list.grand_total, lines));
        assert!(close(list.grand_total, 0.72 + 9.90 + 1.68));
        assert_eq!(list.line_count(), 4);
    }

    #[tokio::test]
    async fn range_limits_the_planned_days() {
        let catalog = FakeCatalog::default()
            .recipe(1, "Soup", vec![ingredient("leek", 1.0, Unit::Piece)])
            .plan(day(2024, 1, 1), Meal::Dinner, 1)
            .plan(day(2024, 1, 8), Meal::Dinner, 1)
            .plan(day(2024, 1, 9), Meal::Dinner, 1);

        let range = crate::models::DateRange {
            start: day(2024, 1, 8),
            end: day(2024, 1, 14),
        };
        let list = build_shopping_list(&catalog, Some(range)).await.unwrap();

        let leek = list.stores[0].lines().next().unwrap();
        assert_eq!(leek.quantity, 2.0);
    }
}
