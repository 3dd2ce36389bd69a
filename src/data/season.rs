//! Per-season data directories

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::rows::{read_schedule_file, read_statistics_file};
use crate::features::{FactorCatalog, Matchup, SeasonAccumulator};
use crate::training::Example;
use crate::{DataConfig, GridironError, LayoutConfig, Outcome, Result};

/// Statistics and schedule files of one season, found under `<data_dir>/<season>-data/`
#[derive(Debug, Clone)]
pub struct SeasonSource {
    pub season: u32,
    pub statistics_path: PathBuf,
    pub schedule_path: PathBuf,
}

impl SeasonSource {
    pub fn new(data: &DataConfig, season: u32) -> Self {
        let dir = season_dir(&data.data_dir, season);
        SeasonSource {
            season,
            statistics_path: dir.join(&data.statistics_file),
            schedule_path: dir.join(&data.schedule_file),
        }
    }

    /// Read the season's files and replay it.
    ///
    /// Both files are read completely before any game is processed.
    pub fn accumulate<'a>(
        &self,
        catalog: &'a FactorCatalog,
        layout: &LayoutConfig,
    ) -> Result<SeasonAccumulator<'a>> {
        let rows = read_statistics_file(&self.statistics_path).map_err(|e| {
            GridironError::Config(format!(
                "Failed to read statistics for season {} from {}: {}",
                self.season,
                self.statistics_path.display(),
                e
            ))
        })?;
        let schedule = read_schedule_file(&self.schedule_path).map_err(|e| {
            GridironError::Config(format!(
                "Failed to read schedule for season {} from {}: {}",
                self.season,
                self.schedule_path.display(),
                e
            ))
        })?;

        let mut accumulator = SeasonAccumulator::new(catalog, layout);
        accumulator.ingest(rows);
        accumulator.order_games(schedule)?;

        let summary = SeasonSummary::of(self.season, &accumulator);
        log::info!(
            "Season {}: {} games, {} samples, {} dropped",
            summary.season,
            summary.games,
            summary.samples,
            summary.dropped
        );
        Ok(accumulator)
    }
}

fn season_dir(data_dir: &Path, season: u32) -> PathBuf {
    data_dir.join(format!("{}-data", season))
}

/// Counts describing one replayed season
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub season: u32,
    pub games: usize,
    pub samples: usize,
    pub dropped: usize,
    /// Share of samples labelled a win for team A
    pub win_share: f64,
}

impl SeasonSummary {
    pub fn of(season: u32, accumulator: &SeasonAccumulator<'_>) -> Self {
        let samples = accumulator.samples();
        let wins = samples
            .iter()
            .filter(|s| s.outcome == Outcome::Win)
            .count();
        SeasonSummary {
            season,
            games: accumulator.game_count(),
            samples: samples.len(),
            dropped: accumulator.dropped_games(),
            win_share: if samples.is_empty() {
                0.0
            } else {
                wins as f64 / samples.len() as f64
            },
        }
    }
}

/// Learner examples of several seasons, in season order
pub fn load_examples(
    data: &DataConfig,
    catalog: &FactorCatalog,
    layout: &LayoutConfig,
    seasons: &[u32],
) -> Result<Vec<Example<Matchup>>> {
    let mut examples = Vec::new();
    for &season in seasons {
        let accumulator = SeasonSource::new(data, season).accumulate(catalog, layout)?;
        examples.extend(
            accumulator
                .into_samples()
                .into_iter()
                .map(|sample| sample.into_example(season)),
        );
    }
    Ok(examples)
}
