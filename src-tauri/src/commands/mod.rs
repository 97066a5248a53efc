pub mod planning;
pub mod recipes;
pub mod shopping;
pub mod stock;
pub mod stores;
