use super::catalog::Catalog;
use super::netting::NetDemand;
use crate::error::Result;
use crate::models::{Price, Store, Unit};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;

pub const UNCLASSIFIED_AISLE: &str = "unclassified";

/// Where a line is bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKey {
    Store(i64),
    /// Ingredients without any recorded price.
    Unassigned,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedLine {
    pub name: String,
    pub unit: Unit,
    pub quantity: f64,
    pub store: StoreKey,
    pub aisle: String,
    pub unit_price: f64,
    /// Basis of `unit_price` when it differs from the line unit.
    pub price_unit: Option<Unit>,
    pub line_total: f64,
}

impl AssignedLine {
    pub fn is_priced(&self) -> bool {
        self.store != StoreKey::Unassigned
    }
}

/// Lowest price among rows whose store still exists. Ties keep the first row.
pub fn cheapest<'a>(prices: &'a [Price], live_stores: &HashSet<i64>) -> Option<&'a Price> {
    prices
        .iter()
        .filter(|p| live_stores.contains(&p.store_id))
        .fold(None, |best: Option<&Price>, p| match best {
            Some(b) if b.unit_price <= p.unit_price => Some(b),
            _ => Some(p),
        })
}

/// Quantity to multiply the unit price by: the bought quantity expressed in
/// the price's basis unit when the two are convertible.
pub fn billable_quantity(quantity: f64, unit: &Unit, price: &Price) -> f64 {
    let Some(basis) = &price.unit else {
        return quantity;
    };

    match unit.convert(quantity, basis) {
        Some(converted) => converted,
        None => {
            tracing::warn!(
                ingredient = %price.ingredient,
                line_unit = %unit,
                price_unit = %basis,
                "Price unit does not match the recipe unit; using quantity as is"
            );
            quantity
        }
    }
}

pub fn assign_line(line: NetDemand, prices: &[Price], live_stores: &HashSet<i64>) -> AssignedLine {
    match cheapest(prices, live_stores) {
        Some(price) => {
            let line_total = price.unit_price * billable_quantity(line.to_buy, &line.unit, price);
            let price_unit = price.unit.clone().filter(|u| *u != line.unit);
            AssignedLine {
                name: line.name,
                unit: line.unit,
                quantity: line.to_buy,
                store: StoreKey::Store(price.store_id),
                aisle: price.aisle.clone(),
                unit_price: price.unit_price,
                price_unit,
                line_total,
            }
        }
        None => AssignedLine {
            name: line.name,
            unit: line.unit,
            quantity: line.to_buy,
            store: StoreKey::Unassigned,
            aisle: UNCLASSIFIED_AISLE.to_string(),
            unit_price: 0.0,
            price_unit: None,
            line_total: 0.0,
        },
    }
}

/// Send every line to the store with its cheapest known price.
pub async fn assign_stores<C>(catalog: &C, lines: Vec<NetDemand>, stores: &[Store]) -> Result<Vec<AssignedLine>>
where
    C: Catalog + ?Sized,
{
    let live_stores: HashSet<i64> = stores.iter().map(|s| s.id).collect();

    let prices = try_join_all(lines.iter().map(|line| catalog.prices_for(&line.name))).await?;

    Ok(lines
        .into_iter()
        .zip(prices)
        .map(|(line, prices)| assign_line(line, &prices, &live_stores))
        .collect())
}
