//! Core domain types and logic.

pub mod tick;
pub mod series;
pub mod indicator;
pub mod holding;
pub mod ledger;
pub mod aggregation;
pub mod price_walk;
pub mod engine;
pub mod driver;
pub mod watchlist;
pub mod config_validation;
pub mod error;
