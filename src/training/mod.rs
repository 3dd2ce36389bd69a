//! Model training
//!
//! Sparse vectors, loss functions, and the online gradient learner.

pub mod learner;
pub mod loss;
pub mod metrics;
pub mod sparse;

pub use learner::{Example, LearnedModel, LearnerConfig, OnlineGradientLearner};
pub use loss::{LossFunction, LossPair};
pub use metrics::{RoundDiagnostics, TrainingHistory};
pub use sparse::SparseVector;
