use super::assign::{AssignedLine, StoreKey};
use crate::models::Store;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const UNASSIGNED_STORE_NAME: &str = "To be determined (no recorded price)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreGroup {
    pub store: StoreKey,
    pub name: String,
    /// Lines per aisle, aisles in lexicographic order.
    pub aisles: BTreeMap<String, Vec<AssignedLine>>,
    pub subtotal: f64,
}

impl StoreGroup {
    pub fn lines(&self) -> impl Iterator<Item = &AssignedLine> {
        self.aisles.values().flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShoppingList {
    /// Known stores in directory order, then the unassigned bucket. Stores
    /// with nothing to buy are left out.
    pub stores: Vec<StoreGroup>,
    pub grand_total: f64,
}

impl ShoppingList {
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.stores.iter().map(|s| s.lines().count()).sum()
    }

    pub fn store(&self, key: StoreKey) -> Option<&StoreGroup> {
        self.stores.iter().find(|s| s.store == key)
    }
}

/// Group assigned lines by store and aisle and compute the totals.
pub fn group_by_store(lines: Vec<AssignedLine>, stores: &[Store]) -> ShoppingList {
    let mut by_store: BTreeMap<StoreKey, BTreeMap<String, Vec<AssignedLine>>> = BTreeMap::new();
    for line in lines {
        by_store
            .entry(line.store)
            .or_default()
            .entry(line.aisle.clone())
            .or_default()
            .push(line);
    }

    let order = stores
        .iter()
        .map(|s| (StoreKey::Store(s.id), s.name.clone()))
        .chain(std::iter::once((StoreKey::Unassigned, UNASSIGNED_STORE_NAME.to_string())));

    let mut groups = Vec::new();
    for (key, name) in order {
        let Some(aisles) = by_store.remove(&key) else {
            continue;
        };
        let subtotal: f64 = aisles.values().flatten().map(|l| l.line_total).sum();
        groups.push(StoreGroup {
            store: key,
            name,
            aisles,
            subtotal,
        });
    }

    let grand_total: f64 = groups.iter().map(|g| g.subtotal).sum();

    ShoppingList {
        stores: groups,
        grand_total,
    }
}

/// Plain-text rendition, one block per store.
pub fn render_text(list: &ShoppingList) -> String {
    let mut out = String::from("SHOPPING LIST\n\n");

    for group in &list.stores {
        let _ = writeln!(out, "=== {} ===", group.name.to_uppercase());

        for (aisle, lines) in &group.aisles {
            let _ = write!(out, "\n{}:\n", aisle);
            for line in lines {
                let _ = write!(out, "- {}: {} {}", line.name, line.quantity, line.unit);
                if line.is_priced() {
                    let _ = write!(out, " ({:.2}€)", line.line_total);
                }
                out.push('\n');
            }
        }

        let _ = write!(out, "\nTotal {}: {:.2}€\n\n", group.name, group.subtotal);
    }

    out
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("shopping-list-{}.txt", date.format("%Y-%m-%d"))
}
