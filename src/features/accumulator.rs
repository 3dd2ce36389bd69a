//! Season replay and pre-game averages
//!
//! Games are replayed in schedule order. Every team keeps one cumulative snapshot per game it
//! has played, and a game is turned into a [`FeatureSample`] from each side's snapshot *before*
//! the game, divided by the number of games it covers. A game where either side has no earlier
//! game is dropped.

use std::collections::{HashMap, HashSet};

use crate::data::RawGameRow;
use crate::features::catalog::FactorCatalog;
use crate::training::{Example, SparseVector};
use crate::{GameCode, HomeRule, LayoutConfig, Outcome, Result, TeamCode};

/// Statistic recording whether the acting team won (1) or not (0)
pub const WINS_KEY: &str = "wins-off";

/// Pre-game average statistics of both sides of a game
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    /// First row of the game (the home team when the home rule recognises it)
    pub team_a: SparseVector,
    pub team_b: SparseVector,
}

/// Learner input for one game plus its result from team A's point of view
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSample {
    pub game: GameCode,
    pub matchup: Matchup,
    pub outcome: Outcome,
}

impl FeatureSample {
    /// Learner example keyed by season and game code
    pub fn into_example(self, season: u32) -> Example<Matchup> {
        Example::new(
            format!("{}/{}", season, self.game),
            self.matchup,
            self.outcome,
        )
    }
}

/// The statistic rows reported for one game
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub code: GameCode,
    rows: Vec<RawGameRow>,
}

impl GameRecord {
    pub fn rows(&self) -> &[RawGameRow] {
        &self.rows
    }

    /// Exactly one row per side
    pub fn is_complete(&self) -> bool {
        self.rows.len() == 2
    }
}

/// Label and averages collected while a game's two orientations are processed
#[derive(Debug, Default)]
struct PendingSample {
    outcome: Option<Outcome>,
    averages: Vec<SparseVector>,
}

/// Replays one season and collects its feature samples
pub struct SeasonAccumulator<'a> {
    catalog: &'a FactorCatalog,
    score_column: usize,
    home_rule: HomeRule,
    games: HashMap<GameCode, GameRecord>,
    discovery_order: Vec<GameCode>,
    teams: HashMap<TeamCode, Vec<SparseVector>>,
    processed: HashSet<GameCode>,
    pending: HashMap<GameCode, PendingSample>,
    samples: Vec<FeatureSample>,
    dropped: usize,
}

impl<'a> SeasonAccumulator<'a> {
    pub fn new(catalog: &'a FactorCatalog, layout: &LayoutConfig) -> Self {
        SeasonAccumulator {
            catalog,
            score_column: layout.score_column,
            home_rule: layout.home_rule,
            games: HashMap::new(),
            discovery_order: Vec::new(),
            teams: HashMap::new(),
            processed: HashSet::new(),
            pending: HashMap::new(),
            samples: Vec::new(),
            dropped: 0,
        }
    }

    /// Group statistic rows into games, skipping header/footer lines.
    ///
    /// Returns the number of rows accepted.
    pub fn ingest<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = RawGameRow>,
    {
        let mut accepted = 0;
        for row in rows {
            if row.is_sentinel() {
                log::trace!("Skipping header/footer row {:?}", row.field(0));
                continue;
            }
            let game = row.game_code();
            let team = row.team_code();
            match self.games.get_mut(&game) {
                Some(record) => {
                    if self.home_rule.is_home(&team, &game) {
                        record.rows.insert(0, row);
                    } else {
                        record.rows.push(row);
                    }
                }
                None => {
                    self.discovery_order.push(game.clone());
                    self.games.insert(
                        game.clone(),
                        GameRecord {
                            code: game,
                            rows: vec![row],
                        },
                    );
                }
            }
            accepted += 1;
        }
        accepted
    }

    /// Process games in the given chronological order.
    ///
    /// Games missing from `order` are never processed. Returns the number of samples produced.
    pub fn order_games<I>(&mut self, order: I) -> Result<usize>
    where
        I: IntoIterator<Item = GameCode>,
    {
        let mut produced = 0;
        for game in order {
            if self.process_game(&game)? {
                produced += 1;
            }
        }
        Ok(produced)
    }

    /// Fold one game into both teams' season state and record its sample.
    ///
    /// Returns whether the game produced a sample.
    pub fn process_game(&mut self, game: &GameCode) -> Result<bool> {
        let Some(record) = self.games.get(game) else {
            log::warn!("Game {} is scheduled but has no statistics", game);
            return Ok(false);
        };
        if !record.is_complete() {
            log::warn!(
                "Game {} has {} statistic rows, expected 2; skipping",
                game,
                record.rows.len()
            );
            return Ok(false);
        }
        if self.processed.contains(game) {
            log::warn!("Game {} is scheduled twice; ignoring the repeat", game);
            return Ok(false);
        }

        // Read both sides before either team's history changes
        let mut sides = Vec::with_capacity(2);
        for i in 0..2 {
            let team_row = &record.rows[i];
            let opponent_row = &record.rows[(i + 1) % 2];

            let mut game_stats = self.catalog.extract(team_row, opponent_row)?;
            let outcome = Outcome::from_scores(
                team_row.value(self.score_column)?,
                opponent_row.value(self.score_column)?,
            );
            game_stats.set(WINS_KEY, outcome.indicator());
            sides.push((team_row.team_code(), game_stats, outcome));
        }

        let mut pending = PendingSample::default();
        for (i, (team, game_stats, outcome)) in sides.into_iter().enumerate() {
            if i == 0 {
                pending.outcome = Some(outcome);
            }

            let history = self.teams.entry(team).or_default();
            let snapshot = match history.last() {
                Some(previous) => {
                    pending
                        .averages
                        .push(previous.divided(history.len() as f64));
                    &game_stats + previous
                }
                None => game_stats,
            };
            history.push(snapshot);
        }

        self.processed.insert(game.clone());
        self.pending.insert(game.clone(), pending);
        Ok(self.arrange_data(game))
    }

    /// Turn a processed game's label and averages into a sample, or drop the game when a side
    /// had no earlier games.
    pub fn arrange_data(&mut self, game: &GameCode) -> bool {
        let Some(pending) = self.pending.remove(game) else {
            return false;
        };
        let mut averages = pending.averages.into_iter();
        match (pending.outcome, averages.next(), averages.next()) {
            (Some(outcome), Some(team_a), Some(team_b)) => {
                self.samples.push(FeatureSample {
                    game: game.clone(),
                    matchup: Matchup { team_a, team_b },
                    outcome,
                });
                true
            }
            _ => {
                log::debug!("Dropping game {}: a team has no earlier games", game);
                self.dropped += 1;
                false
            }
        }
    }

    /// Game codes in the order their first row was read
    pub fn discovery_order(&self) -> &[GameCode] {
        &self.discovery_order
    }

    pub fn game(&self, code: &GameCode) -> Option<&GameRecord> {
        self.games.get(code)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Cumulative snapshots of a team, one per game played so far
    pub fn snapshots(&self, team: &TeamCode) -> &[SparseVector] {
        self.teams.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Season totals of a team after its last processed game
    pub fn final_snapshot(&self, team: &TeamCode) -> Option<&SparseVector> {
        self.teams.get(team).and_then(|history| history.last())
    }

    /// Teams ordered by their season total of `stat`, smallest first
    pub fn rank_teams(&self, stat: &str) -> Vec<(TeamCode, f64)> {
        let mut ranked: Vec<(TeamCode, f64)> = self
            .teams
            .iter()
            .filter_map(|(team, history)| history.last().map(|s| (team.clone(), s.get(stat))))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Samples in processing order
    pub fn samples(&self) -> &[FeatureSample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<FeatureSample> {
        self.samples
    }

    /// Processed games that were dropped for lack of history
    pub fn dropped_games(&self) -> usize {
        self.dropped
    }
}
