//! Online (stochastic) gradient descent over sparse features

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::loss::LossFunction;
use super::metrics::{ErrorCounter, RoundDiagnostics, TrainingHistory};
use super::sparse::SparseVector;
use crate::features::FeatureExtractor;
use crate::predict::classify;
use crate::{GridironError, Outcome, Result};

/// A labelled raw input.
///
/// `key` identifies the input for the lifetime of a learner; two examples with the same key
/// share one cached feature vector.
#[derive(Debug, Clone)]
pub struct Example<X> {
    pub key: String,
    pub input: X,
    pub label: Outcome,
}

impl<X> Example<X> {
    pub fn new(key: impl Into<String>, input: X, label: Outcome) -> Self {
        Example {
            key: key.into(),
            input,
            label,
        }
    }
}

/// Hyperparameters of one learning run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerConfig {
    pub init_step_size: f64,
    /// The t-th update uses `init_step_size / t^step_size_reduction`
    pub step_size_reduction: f64,
    /// L2 regularization strength (lambda)
    pub regularization: f64,
    /// Passes over the training data
    pub num_rounds: usize,
    pub seed: u64,
}

impl LearnerConfig {
    pub const DEFAULT_SEED: u64 = 42;

    pub fn validate(&self) -> Result<()> {
        if self.num_rounds == 0 {
            return Err(GridironError::Config(
                "num_rounds must be at least 1".to_string(),
            ));
        }
        if !(self.init_step_size > 0.0 && self.init_step_size.is_finite()) {
            return Err(GridironError::Config(format!(
                "init_step_size must be positive, got {}",
                self.init_step_size
            )));
        }
        if !(0.0..=1.0).contains(&self.step_size_reduction) {
            return Err(GridironError::Config(format!(
                "step_size_reduction must be within [0, 1], got {}",
                self.step_size_reduction
            )));
        }
        if !(self.regularization >= 0.0 && self.regularization.is_finite()) {
            return Err(GridironError::Config(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        Ok(())
    }

    /// Step size of update number `t` (1-based, counted across the whole run)
    pub fn step_size(&self, t: u64) -> f64 {
        debug_assert!(t > 0, "update counter starts at 1");
        self.init_step_size / (t as f64).powf(self.step_size_reduction)
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            init_step_size: 0.00001,
            step_size_reduction: 1.0,
            regularization: 0.0,
            num_rounds: 100,
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// Weights and diagnostics produced by a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedModel {
    pub weights: SparseVector,
    pub history: TrainingHistory,
}

/// Extractor output memoized by example key
struct FeatureCache<E> {
    extractor: E,
    cache: HashMap<String, SparseVector>,
}

impl<E> FeatureCache<E> {
    fn features<X>(&mut self, example: &Example<X>) -> &SparseVector
    where
        E: FeatureExtractor<X>,
    {
        if !self.cache.contains_key(&example.key) {
            let features = self.extractor.extract(&example.input);
            self.cache.insert(example.key.clone(), features);
        }
        &self.cache[&example.key]
    }
}

/// Linear classifier trained one example at a time
pub struct OnlineGradientLearner<E> {
    features: FeatureCache<E>,
    weights: SparseVector,
}

impl<E> OnlineGradientLearner<E> {
    pub fn new(extractor: E) -> Self {
        OnlineGradientLearner {
            features: FeatureCache {
                extractor,
                cache: HashMap::new(),
            },
            weights: SparseVector::new(),
        }
    }

    pub fn weights(&self) -> &SparseVector {
        &self.weights
    }

    /// Number of distinct inputs featurized so far
    pub fn cached_inputs(&self) -> usize {
        self.features.cache.len()
    }

    /// Fit fresh weights to `train`, reporting progress against `validation` after every round
    pub fn learn<X>(
        &mut self,
        train: &[Example<X>],
        validation: &[Example<X>],
        loss: LossFunction,
        config: &LearnerConfig,
    ) -> Result<LearnedModel>
    where
        E: FeatureExtractor<X>,
    {
        config.validate()?;
        if train.is_empty() {
            return Err(GridironError::Config(
                "training set is empty".to_string(),
            ));
        }

        let pair = loss.pair();
        let regularization_scale = config.regularization / train.len() as f64;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut updates: u64 = 0;
        let mut history = TrainingHistory::new();

        self.weights = SparseVector::new();

        log::info!(
            "Training on {} examples ({} validation) with {} loss for {} rounds",
            train.len(),
            validation.len(),
            loss,
            config.num_rounds
        );

        for round in 0..config.num_rounds {
            order.shuffle(&mut rng);

            for &i in &order {
                let example = &train[i];
                updates += 1;
                let step_size = config.step_size(updates);

                let features = self.features.features(example);
                let gradient = (pair.gradient)(features, example.label.sign(), &self.weights);

                if config.regularization != 0.0 {
                    let shrink = self.weights.scaled(regularization_scale);
                    self.weights.add_scaled(&gradient, -step_size);
                    self.weights -= &shrink;
                } else {
                    self.weights.add_scaled(&gradient, -step_size);
                }
            }

            let mut train_loss = 0.0;
            for example in train {
                let features = self.features.features(example);
                train_loss += (pair.value)(features, example.label.sign(), &self.weights);
            }
            let regularization_penalty = 0.5 * self.weights.norm_squared();

            let diagnostics = RoundDiagnostics {
                round: round + 1,
                objective: train_loss + regularization_penalty,
                train_loss,
                regularization_penalty,
                train_error: self.error_rate(train),
                validation_error: self.error_rate(validation),
            };
            log::info!("Round {}/{}: {}", round + 1, config.num_rounds, diagnostics);
            history.record_round(diagnostics);
        }

        Ok(LearnedModel {
            weights: self.weights.clone(),
            history,
        })
    }

    /// `Win` when the weighted score is strictly positive
    pub fn predict<X>(&mut self, example: &Example<X>) -> Outcome
    where
        E: FeatureExtractor<X>,
    {
        let features = self.features.features(example);
        classify(&self.weights, features)
    }

    /// Fraction of `examples` whose label disagrees with `predict`
    pub fn error_rate<X>(&mut self, examples: &[Example<X>]) -> f64
    where
        E: FeatureExtractor<X>,
    {
        let mut counter = ErrorCounter::new();
        for example in examples {
            counter.record(self.predict(example) == example.label);
        }
        counter.error_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::loss::squared_loss_gradient;
    use std::cell::Cell;
    use std::rc::Rc;

    fn vector(entries: &[(&str, f64)]) -> SparseVector {
        entries.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn identity(input: &SparseVector) -> SparseVector {
        input.clone()
    }

    fn toy_examples() -> Vec<Example<SparseVector>> {
        vec![
            Example::new("pos", vector(&[("a", 1.0)]), Outcome::Win),
            Example::new("neg", vector(&[("a", -1.0)]), Outcome::Loss),
        ]
    }

    fn toy_config() -> LearnerConfig {
        LearnerConfig {
            init_step_size: 1.0,
            step_size_reduction: 0.0,
            regularization: 0.0,
            num_rounds: 50,
            seed: LearnerConfig::DEFAULT_SEED,
        }
    }

    /// Two overlapping clusters, so training never reaches zero loss
    fn noisy_examples() -> Vec<Example<SparseVector>> {
        (0..40)
            .map(|i| {
                let x = (i as f64 - 20.0) / 7.0;
                let y = ((i * 7) % 11) as f64 / 11.0 - 0.5;
                let label = if x + 0.8 * y > 0.1 || i % 9 == 0 {
                    Outcome::Win
                } else {
                    Outcome::Loss
                };
                Example::new(format!("ex{}", i), vector(&[("x", x), ("y", y), ("bias", 1.0)]), label)
            })
            .collect()
    }

    #[test]
    fn test_separable_toy_set_converges() {
        let examples = toy_examples();
        let mut learner = OnlineGradientLearner::new(identity);
        let model = learner
            .learn(&examples, &examples, LossFunction::Logistic, &toy_config())
            .unwrap();

        assert_eq!(learner.predict(&examples[0]), Outcome::Win);
        assert_eq!(learner.predict(&examples[1]), Outcome::Loss);
        assert!(model.weights.get("a") > 0.0);
        assert_eq!(model.history.rounds.len(), 50);

        let last = model.history.last().unwrap();
        assert_eq!(last.train_error, 0.0);
        assert_eq!(last.validation_error, 0.0);
        assert_eq!(last.regularization_penalty, 0.5 * model.weights.norm_squared());
        assert_eq!(last.objective, last.train_loss + last.regularization_penalty);
    }

    #[test]
    fn test_every_loss_separates_toy_set() {
        let examples = toy_examples();
        for loss in LossFunction::ALL {
            let mut learner = OnlineGradientLearner::new(identity);
            learner.learn(&examples, &[], loss, &toy_config()).unwrap();
            assert_eq!(learner.error_rate(&examples), 0.0, "{} failed", loss);
        }
    }

    #[test]
    fn test_untrained_learner_predicts_loss() {
        let examples = toy_examples();
        let mut learner = OnlineGradientLearner::new(identity);
        // score 0 is not strictly positive
        assert_eq!(learner.predict(&examples[0]), Outcome::Loss);
        assert_eq!(learner.error_rate(&examples), 0.5);
    }

    #[test]
    fn test_runs_are_reproducible() {
        let examples = noisy_examples();
        let (train, validation) = examples.split_at(30);
        let config = LearnerConfig {
            init_step_size: 0.5,
            step_size_reduction: 0.5,
            regularization: 0.1,
            num_rounds: 8,
            seed: 7,
        };

        let mut first = OnlineGradientLearner::new(identity);
        let a = first
            .learn(train, validation, LossFunction::Hinge, &config)
            .unwrap();
        let mut second = OnlineGradientLearner::new(identity);
        let b = second
            .learn(train, validation, LossFunction::Hinge, &config)
            .unwrap();

        assert_eq!(a, b);

        // Relearning on the same learner restarts from empty weights and the same seed.
        let c = first
            .learn(train, validation, LossFunction::Hinge, &config)
            .unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_regularization_shrinks_weights() {
        let examples = noisy_examples();
        let plain = LearnerConfig {
            init_step_size: 0.05,
            num_rounds: 20,
            ..toy_config()
        };
        let regularized = LearnerConfig {
            regularization: 5.0,
            ..plain.clone()
        };

        let mut learner = OnlineGradientLearner::new(identity);
        let unregularized_norm = learner
            .learn(&examples, &[], LossFunction::Squared, &plain)
            .unwrap()
            .weights
            .norm_squared();
        let regularized_norm = learner
            .learn(&examples, &[], LossFunction::Squared, &regularized)
            .unwrap()
            .weights
            .norm_squared();

        assert!(regularized_norm < unregularized_norm);
    }

    #[test]
    fn test_step_counter_runs_across_rounds() {
        // One example: update t=1 uses step 1, update t=2 (second round) uses step 1/2.
        let examples = vec![Example::new("only", vector(&[("a", 2.0)]), Outcome::Win)];
        let config = LearnerConfig {
            init_step_size: 1.0,
            step_size_reduction: 1.0,
            regularization: 0.0,
            num_rounds: 2,
            seed: LearnerConfig::DEFAULT_SEED,
        };

        let mut learner = OnlineGradientLearner::new(identity);
        let model = learner
            .learn(&examples, &[], LossFunction::Squared, &config)
            .unwrap();

        // t=1: score 0, gradient 2 * (0 - 1) = -2, a = 0 + 1 * 2 = 2
        // t=2: score 4, gradient 2 * (4 - 1) = 6, a = 2 - 0.5 * 6 = -1
        assert_eq!(model.weights.get("a"), -1.0);
        assert_eq!(model.history.rounds[0].train_loss, 4.5);
    }

    #[test]
    fn test_rounds_follow_fresh_seeded_shuffles() {
        let examples: Vec<Example<SparseVector>> = (0..6)
            .map(|i| {
                let x = i as f64 - 2.5;
                let label = if i % 2 == 0 { Outcome::Win } else { Outcome::Loss };
                Example::new(
                    format!("ex{}", i),
                    vector(&[("x", x), ("bias", 1.0 + i as f64 * 0.1)]),
                    label,
                )
            })
            .collect();
        let config = LearnerConfig {
            init_step_size: 0.1,
            step_size_reduction: 0.5,
            regularization: 0.0,
            num_rounds: 4,
            seed: 11,
        };

        let mut learner = OnlineGradientLearner::new(identity);
        let model = learner
            .learn(&examples, &[], LossFunction::Squared, &config)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut expected = SparseVector::new();
        let mut t = 0;
        for _ in 0..config.num_rounds {
            order.shuffle(&mut rng);
            for &i in &order {
                t += 1;
                let example = &examples[i];
                let gradient =
                    squared_loss_gradient(&example.input, example.label.sign(), &expected);
                expected.add_scaled(&gradient, -config.step_size(t));
            }
        }
        assert_eq!(model.weights, expected);
    }

    #[test]
    fn test_regularized_update_shrinks_previous_weights() {
        let examples = vec![Example::new("only", vector(&[("a", 2.0)]), Outcome::Win)];
        let config = LearnerConfig {
            init_step_size: 0.5,
            step_size_reduction: 0.0,
            regularization: 0.5,
            num_rounds: 2,
            seed: LearnerConfig::DEFAULT_SEED,
        };

        let mut learner = OnlineGradientLearner::new(identity);
        let model = learner
            .learn(&examples, &[], LossFunction::Squared, &config)
            .unwrap();

        // Round 1: weights start empty, so only the gradient step applies: a = 0.5 * 2 = 1
        assert_eq!(model.history.rounds[0].regularization_penalty, 0.5);
        // Round 2: gradient 2 * (2 - 1) = 2, shrink (0.5 / 1) * 1
        // a = 1 - 0.5 * 2 - 0.5 = -0.5
        assert_eq!(model.weights.get("a"), -0.5);
        assert_eq!(model.history.rounds[1].regularization_penalty, 0.125);
    }

    #[test]
    fn test_features_are_memoized_by_key() {
        let calls = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&calls);
        let extractor = move |input: &SparseVector| {
            counter.set(counter.get() + 1);
            input.clone()
        };

        let examples = toy_examples();
        let mut learner = OnlineGradientLearner::new(extractor);
        learner
            .learn(&examples, &examples, LossFunction::Logistic, &toy_config())
            .unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(learner.cached_inputs(), 2);
    }

    #[test]
    fn test_step_size_schedule() {
        let config = LearnerConfig {
            init_step_size: 2.0,
            step_size_reduction: 0.5,
            ..LearnerConfig::default()
        };
        assert_eq!(config.step_size(1), 2.0);
        assert_eq!(config.step_size(4), 1.0);

        let constant = LearnerConfig {
            step_size_reduction: 0.0,
            ..config
        };
        assert_eq!(constant.step_size(1000), 2.0);
    }

    #[test]
    fn test_rejects_invalid_runs() {
        let examples = toy_examples();
        let mut learner = OnlineGradientLearner::new(identity);

        let empty: Vec<Example<SparseVector>> = Vec::new();
        assert!(matches!(
            learner.learn(&empty, &examples, LossFunction::Logistic, &toy_config()),
            Err(GridironError::Config(_))
        ));

        let invalid = [
            LearnerConfig { num_rounds: 0, ..toy_config() },
            LearnerConfig { init_step_size: 0.0, ..toy_config() },
            LearnerConfig { step_size_reduction: 1.5, ..toy_config() },
            LearnerConfig { regularization: -1.0, ..toy_config() },
        ];
        for config in &invalid {
            assert!(matches!(
                learner.learn(&examples, &examples, LossFunction::Logistic, config),
                Err(GridironError::Config(_))
            ));
        }
    }
}
