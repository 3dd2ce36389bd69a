//! Loss functions for the online learner
//!
//! Each loss is a pure function of `(features, label, weights)` with `label` in `{+1, -1}`, paired
//! with its gradient with respect to the weights.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sparse::SparseVector;
use crate::GridironError;

/// Loss value as a function of `(features, label, weights)`
pub type LossValueFn = fn(&SparseVector, f64, &SparseVector) -> f64;

/// Loss gradient with respect to the weights
pub type LossGradientFn = fn(&SparseVector, f64, &SparseVector) -> SparseVector;

/// A loss together with its gradient, resolved once before training starts
#[derive(Clone, Copy)]
pub struct LossPair {
    pub value: LossValueFn,
    pub gradient: LossGradientFn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossFunction {
    Logistic,
    Hinge,
    Squared,
}

impl LossFunction {
    pub const ALL: [LossFunction; 3] = [
        LossFunction::Logistic,
        LossFunction::Hinge,
        LossFunction::Squared,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LossFunction::Logistic => "logistic",
            LossFunction::Hinge => "hinge",
            LossFunction::Squared => "squared",
        }
    }

    pub fn pair(self) -> LossPair {
        match self {
            LossFunction::Logistic => LossPair {
                value: logistic_loss,
                gradient: logistic_loss_gradient,
            },
            LossFunction::Hinge => LossPair {
                value: hinge_loss,
                gradient: hinge_loss_gradient,
            },
            LossFunction::Squared => LossPair {
                value: squared_loss,
                gradient: squared_loss_gradient,
            },
        }
    }

    pub fn value(self, features: &SparseVector, label: f64, weights: &SparseVector) -> f64 {
        (self.pair().value)(features, label, weights)
    }

    pub fn gradient(
        self,
        features: &SparseVector,
        label: f64,
        weights: &SparseVector,
    ) -> SparseVector {
        (self.pair().gradient)(features, label, weights)
    }
}

impl fmt::Display for LossFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LossFunction {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LossFunction::ALL
            .into_iter()
            .find(|loss| loss.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GridironError::UnknownLoss(s.to_string()))
    }
}

/// `ln(1 + e^{-margin})`
pub fn logistic_loss(features: &SparseVector, label: f64, weights: &SparseVector) -> f64 {
    let z = -weights.dot(features) * label;
    // ln(1 + e^z) without overflowing for large z
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

pub fn logistic_loss_gradient(
    features: &SparseVector,
    label: f64,
    weights: &SparseVector,
) -> SparseVector {
    let margin = weights.dot(features) * label;
    features.scaled(-label / (1.0 + margin.exp()))
}

/// `max(1 - margin, 0)`
pub fn hinge_loss(features: &SparseVector, label: f64, weights: &SparseVector) -> f64 {
    let margin = weights.dot(features) * label;
    (1.0 - margin).max(0.0)
}

/// Zero once the margin exceeds 1; a margin of exactly 1 still takes the sub-gradient `-y * x`.
pub fn hinge_loss_gradient(
    features: &SparseVector,
    label: f64,
    weights: &SparseVector,
) -> SparseVector {
    let margin = weights.dot(features) * label;
    if margin > 1.0 {
        SparseVector::new()
    } else {
        features.scaled(-label)
    }
}

/// `0.5 * (score - y)^2`
pub fn squared_loss(features: &SparseVector, label: f64, weights: &SparseVector) -> f64 {
    let residual = weights.dot(features) - label;
    0.5 * residual * residual
}

pub fn squared_loss_gradient(
    features: &SparseVector,
    label: f64,
    weights: &SparseVector,
) -> SparseVector {
    features.scaled(weights.dot(features) - label)
}
