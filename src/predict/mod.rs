//! Prediction with trained weights
//!
//! Classify new matchups and dump weights for inspection.

pub mod inference;
pub mod weights;

pub use inference::{classify, LinearPredictor};
pub use weights::{format_weights, ranked_weights, write_weights};
