//! Per-round training diagnostics

use std::fmt;

use serde::{Deserialize, Serialize};

/// Diagnostics recorded at the end of one pass over the training set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundDiagnostics {
    /// 1-based round number
    pub round: usize,
    /// Training loss plus regularization penalty
    pub objective: f64,
    /// Sum of the loss over the training set, at the post-round weights
    pub train_loss: f64,
    /// `0.5 * |w|^2`
    pub regularization_penalty: f64,
    pub train_error: f64,
    pub validation_error: f64,
}

impl fmt::Display for RoundDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "objective = {:.2} = {:.2} + {:.2}, train error = {:.4}, validation error = {:.4}",
            self.objective,
            self.train_loss,
            self.regularization_penalty,
            self.train_error,
            self.validation_error
        )
    }
}

/// Error-rate counter for one evaluation pass
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCounter {
    pub mistakes: usize,
    pub total: usize,
}

impl ErrorCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, correct: bool) {
        if !correct {
            self.mistakes += 1;
        }
        self.total += 1;
    }

    /// Fraction of misclassified examples, zero for an empty set
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.mistakes as f64 / self.total as f64
        }
    }
}

/// Training history for tracking progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub rounds: Vec<RoundDiagnostics>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_round(&mut self, diagnostics: RoundDiagnostics) {
        self.rounds.push(diagnostics);
    }

    pub fn last(&self) -> Option<&RoundDiagnostics> {
        self.rounds.last()
    }

    /// Round with the lowest validation error (earliest on ties)
    pub fn best_validation_round(&self) -> Option<&RoundDiagnostics> {
        self.rounds.iter().fold(None, |best, round| match best {
            Some(b) if b.validation_error <= round.validation_error => Some(b),
            _ => Some(round),
        })
    }
}
