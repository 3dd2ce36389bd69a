//! Data ingestion
//!
//! Statistic and schedule files, and the per-season directories holding them.

pub mod rows;
pub mod season;

pub use rows::RawGameRow;
pub use season::{load_examples, SeasonSource, SeasonSummary};
