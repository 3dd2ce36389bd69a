//! Sign-of-score classification with a trained weight vector

use crate::features::FeatureExtractor;
use crate::training::SparseVector;
use crate::Outcome;

/// `Win` when `weights . features` is strictly positive; a zero score is a `Loss`
pub fn classify(weights: &SparseVector, features: &SparseVector) -> Outcome {
    if weights.dot(features) > 0.0 {
        Outcome::Win
    } else {
        Outcome::Loss
    }
}

/// Frozen weights paired with the extractor they were trained against
pub struct LinearPredictor<E> {
    weights: SparseVector,
    extractor: E,
}

impl<E> LinearPredictor<E> {
    pub fn new(weights: SparseVector, extractor: E) -> Self {
        LinearPredictor { weights, extractor }
    }

    pub fn weights(&self) -> &SparseVector {
        &self.weights
    }

    pub fn predict<X>(&self, input: &X) -> Outcome
    where
        E: FeatureExtractor<X>,
    {
        classify(&self.weights, &self.extractor.extract(input))
    }

    /// Fraction of `(input, outcome)` pairs predicted correctly, zero when empty
    pub fn accuracy<'a, X: 'a>(&self, labelled: impl IntoIterator<Item = (&'a X, Outcome)>) -> f64
    where
        E: FeatureExtractor<X>,
    {
        let mut correct = 0usize;
        let mut total = 0usize;
        for (input, outcome) in labelled {
            if self.predict(input) == outcome {
                correct += 1;
            }
            total += 1;
        }
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }
}
