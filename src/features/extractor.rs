//! Turning raw learner inputs into sparse feature vectors

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::accumulator::Matchup;
use crate::training::SparseVector;
use crate::GridironError;

/// Maps a raw input to the feature vector the learner sees
pub trait FeatureExtractor<X: ?Sized> {
    fn extract(&self, input: &X) -> SparseVector;
}

impl<X: ?Sized, F> FeatureExtractor<X> for F
where
    F: Fn(&X) -> SparseVector,
{
    fn extract(&self, input: &X) -> SparseVector {
        self(input)
    }
}

/// Built-in matchup featurizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Both teams' averages side by side, suffixed `1` and `2`
    Paired,
    /// Team A's averages minus team B's
    Difference,
}

impl ExtractorKind {
    pub fn name(self) -> &'static str {
        match self {
            ExtractorKind::Paired => "paired",
            ExtractorKind::Difference => "difference",
        }
    }
}

impl FeatureExtractor<Matchup> for ExtractorKind {
    fn extract(&self, input: &Matchup) -> SparseVector {
        match self {
            ExtractorKind::Paired => paired_features(input),
            ExtractorKind::Difference => difference_features(input),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ExtractorKind {
    type Err = GridironError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "paired" => Ok(ExtractorKind::Paired),
            "difference" => Ok(ExtractorKind::Difference),
            _ => Err(GridironError::UnknownExtractor(s.to_string())),
        }
    }
}

pub fn paired_features(matchup: &Matchup) -> SparseVector {
    let mut features = SparseVector::new();
    for (stat, value) in &matchup.team_a {
        features.set(format!("{}1", stat), *value);
    }
    for (stat, value) in &matchup.team_b {
        features.set(format!("{}2", stat), *value);
    }
    features
}

pub fn difference_features(matchup: &Matchup) -> SparseVector {
    &matchup.team_a - &matchup.team_b
}
