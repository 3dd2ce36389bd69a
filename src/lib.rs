//! College football win/loss prediction
//!
//! Replays a season's team-game statistics in schedule order, turns every game into a pair of
//! pre-game season-average vectors, and fits a linear classifier over them with online
//! stochastic gradient descent.

pub mod data;
pub mod features;
pub mod predict;
pub mod training;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::features::ExtractorKind;
use crate::training::{LearnerConfig, LossFunction};

/// Team identifier as it appears in the statistics rows
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamCode(pub String);

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TeamCode {
    fn from(code: &str) -> Self {
        TeamCode(code.to_string())
    }
}

/// Game identifier, shared by the statistics rows and the schedule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameCode(pub String);

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GameCode {
    fn from(code: &str) -> Self {
        GameCode(code.to_string())
    }
}

/// Result of a game from the first team's point of view.
///
/// Ties count as a loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    /// Compare two scores from the first team's perspective
    pub fn from_scores(score: f64, opponent_score: f64) -> Self {
        if score > opponent_score {
            Outcome::Win
        } else {
            Outcome::Loss
        }
    }

    /// Label used by the losses: `+1` for a win, `-1` for a loss
    pub fn sign(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => -1.0,
        }
    }

    /// `1` for a win, `0` for a loss (the `wins-off` statistic)
    pub fn indicator(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "+1"),
            Outcome::Loss => write!(f, "-1"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum GridironError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown loss function: {0} (expected logistic, hinge or squared)")]
    UnknownLoss(String),

    #[error("Unknown feature extractor: {0} (expected paired or difference)")]
    UnknownExtractor(String),

    #[error("Malformed row for game {game}: {message}")]
    MalformedRow { game: GameCode, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridironError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub layout: LayoutConfig,
    pub training: TrainingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding one `<season>-data` directory per season
    pub data_dir: PathBuf,
    pub offensive_factors: PathBuf,
    pub defensive_factors: PathBuf,
    pub statistics_file: String,
    pub schedule_file: String,
    pub train_seasons: Vec<u32>,
    pub validation_seasons: Vec<u32>,
}

/// Column layout of the team-game statistics rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Column of the first line of the factor files
    pub first_stat_column: usize,
    /// Column holding points scored
    pub score_column: usize,
    pub home_rule: HomeRule,
}

/// How the home team of a game is recognised while grouping rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HomeRule {
    /// The team code equals the numeric value of the first `digits` characters of the game code
    GameCodePrefix { digits: usize },
    /// Rows keep the order they were read in
    ArrivalOrder,
}

impl HomeRule {
    /// Whether `team` is the home side of `game` under this rule
    pub fn is_home(&self, team: &TeamCode, game: &GameCode) -> bool {
        match *self {
            HomeRule::GameCodePrefix { digits } => {
                let Some(prefix) = game.0.get(..digits) else {
                    return false;
                };
                match (team.0.trim().parse::<i64>(), prefix.parse::<i64>()) {
                    (Ok(team), Ok(prefix)) => team == prefix,
                    _ => false,
                }
            }
            HomeRule::ArrivalOrder => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub extractor: ExtractorKind,
    pub loss: LossFunction,
    pub init_step_size: f64,
    pub step_size_reduction: f64,
    pub regularization: f64,
    pub num_rounds: usize,
    pub seed: u64,
}

impl TrainingConfig {
    /// Learner settings described by this section
    pub fn learner_config(&self) -> LearnerConfig {
        LearnerConfig {
            init_step_size: self.init_step_size,
            step_size_reduction: self.step_size_reduction,
            regularization: self.regularization,
            num_rounds: self.num_rounds,
            seed: self.seed,
        }
    }

    /// Hand-tuned settings that worked best on the 2005-2012 seasons
    pub fn tuned() -> Self {
        TrainingConfig {
            extractor: ExtractorKind::Paired,
            loss: LossFunction::Logistic,
            init_step_size: 2.0,
            step_size_reduction: 0.3,
            regularization: 0.0,
            num_rounds: 10,
            seed: LearnerConfig::DEFAULT_SEED,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            extractor: ExtractorKind::Paired,
            loss: LossFunction::Logistic,
            init_step_size: 0.00001,
            step_size_reduction: 1.0,
            regularization: 0.0,
            num_rounds: 100,
            seed: LearnerConfig::DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub weights_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                data_dir: PathBuf::from("data"),
                offensive_factors: PathBuf::from("offensiveFactors"),
                defensive_factors: PathBuf::from("defensiveFactors"),
                statistics_file: "team-game-statistics.csv".to_string(),
                schedule_file: "game.csv".to_string(),
                train_seasons: vec![5, 6, 7, 8],
                validation_seasons: vec![9, 10, 11, 12],
            },
            layout: LayoutConfig {
                first_stat_column: 2,
                score_column: 35,
                home_rule: HomeRule::GameCodePrefix { digits: 4 },
            },
            training: TrainingConfig::default(),
            output: OutputConfig {
                weights_path: PathBuf::from("weights"),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GridironError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| GridironError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GridironError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
