//! Feature extraction
//!
//! Selects statistic columns, replays seasons into pre-game averages, and turns matchups into
//! learner feature vectors.

pub mod accumulator;
pub mod catalog;
pub mod extractor;

pub use accumulator::{FeatureSample, GameRecord, Matchup, SeasonAccumulator, WINS_KEY};
pub use catalog::{FactorCatalog, Side, StatFactor};
pub use extractor::{ExtractorKind, FeatureExtractor};
