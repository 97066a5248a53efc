use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A meal of the day. Recipes are tagged with one and planning days hold one
/// recipe per meal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl Meal {
    pub const ALL: [Meal; 4] = [Meal::Breakfast, Meal::Lunch, Meal::Snack, Meal::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Snack => "snack",
            Meal::Dinner => "dinner",
        }
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Meal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Meal::Breakfast),
            "lunch" => Ok(Meal::Lunch),
            "snack" => Ok(Meal::Snack),
            "dinner" => Ok(Meal::Dinner),
            other => Err(format!("Unknown meal: {}", other)),
        }
    }
}

/// Lookup key for ingredient and store names: trimmed and lowercased over the
/// full Unicode range, so "Œufs" and "œufs" are the same ingredient.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Measurement unit of an ingredient quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    Gram,
    Kilogram,
    Millilitre,
    Litre,
    Piece,
    Teaspoon,
    Tablespoon,
    Other(String),
}

/// Units that can be converted into one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Volume,
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::Gram => "g",
            Unit::Kilogram => "kg",
            Unit::Millilitre => "ml",
            Unit::Litre => "L",
            Unit::Piece => "unit",
            Unit::Teaspoon => "tsp",
            Unit::Tablespoon => "tbsp",
            Unit::Other(s) => s,
        }
    }

    /// Dimension and factor to the dimension's base unit (g or ml).
    pub fn scale(&self) -> Option<(Dimension, f64)> {
        match self {
            Unit::Gram => Some((Dimension::Mass, 1.0)),
            Unit::Kilogram => Some((Dimension::Mass, 1000.0)),
            Unit::Millilitre => Some((Dimension::Volume, 1.0)),
            Unit::Litre => Some((Dimension::Volume, 1000.0)),
            _ => None,
        }
    }

    /// Express `quantity` of `self` in `target`. `None` when the units measure
    /// different things.
    pub fn convert(&self, quantity: f64, target: &Unit) -> Option<f64> {
        if self == target {
            return Some(quantity);
        }
        let (from_dim, from_factor) = self.scale()?;
        let (to_dim, to_factor) = target.scale()?;
        if from_dim != to_dim {
            return None;
        }
        Some(quantity * from_factor / to_factor)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Unit {
    fn from(s: &str) -> Self {
        match s.trim() {
            "g" => Unit::Gram,
            "kg" => Unit::Kilogram,
            "ml" => Unit::Millilitre,
            "L" | "l" => Unit::Litre,
            "unit" | "unite" => Unit::Piece,
            "tsp" | "cac" => Unit::Teaspoon,
            "tbsp" | "cas" => Unit::Tablespoon,
            other => Unit::Other(other.to_string()),
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() {
            return Err("Unit cannot be empty".to_string());
        }
        Ok(Unit::from(s.as_str()))
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.as_str().to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub meal_type: Meal,
    pub ingredients: Vec<Ingredient>,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveRecipe {
    pub id: Option<i64>,
    pub name: String,
    pub meal_type: Meal,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlanningEntry {
    pub date: NaiveDate,
    pub meals: BTreeMap<Meal, i64>,
}

/// Inclusive range of planning days.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockItem {
    pub id: i64,
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddStock {
    pub name: String,
    pub quantity: f64,
    pub unit: Unit,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Store {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Price {
    pub ingredient: String,
    pub store_id: i64,
    pub unit_price: f64,
    /// Basis of `unit_price` (e.g. per kg). `None` prices per demand unit.
    pub unit: Option<Unit>,
    pub aisle: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertPrice {
    pub ingredient: String,
    pub store_id: i64,
    pub unit_price: f64,
    pub unit: Option<Unit>,
    pub aisle: String,
}
