use super::aggregate::Demand;
use super::catalog::Catalog;
use crate::error::Result;
use crate::models::Unit;
use futures::future::try_join_all;
use serde::Serialize;

/// Residuals at or below this are float noise and count as nothing to buy.
pub const RESIDUAL_EPSILON: f64 = 1e-9;

/// A demand line still short after stock is taken into account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetDemand {
    pub name: String,
    pub unit: Unit,
    pub demand: f64,
    pub on_hand: f64,
    pub to_buy: f64,
}

/// `max(0, demand - on_hand)`, with float noise flushed to zero.
pub fn net_quantity(demand: f64, on_hand: f64) -> f64 {
    let residual = demand - on_hand;
    if residual > RESIDUAL_EPSILON {
        residual
    } else {
        0.0
    }
}

/// Subtract on-hand stock from each demand line and drop the lines that are
/// fully covered. Stock only offsets demand in the same unit.
pub async fn net_against_stock<C>(catalog: &C, demand: Vec<Demand>) -> Result<Vec<NetDemand>>
where
    C: Catalog + ?Sized,
{
    let on_hand = try_join_all(
        demand
            .iter()
            .map(|line| catalog.stock_on_hand(&line.name, &line.unit)),
    )
    .await?;

    let net = demand
        .into_iter()
        .zip(on_hand)
        .filter_map(|(line, on_hand)| {
            let to_buy = net_quantity(line.quantity, on_hand);
            if to_buy == 0.0 {
                tracing::debug!(ingredient = %line.name, unit = %line.unit, "Covered by stock");
                return None;
            }
            Some(NetDemand {
                name: line.name,
                unit: line.unit,
                demand: line.quantity,
                on_hand,
                to_buy,
            })
        })
        .collect();

    Ok(net)
}
