//! Raw statistic and schedule rows
//!
//! Both sources are comma-separated with no quoting. Header and footer lines are recognised by
//! a first field that starts with a double quote and are kept here as-is; callers decide to skip
//! them.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::{GameCode, GridironError, Result, TeamCode};

/// One team's reported statistics for one game
#[derive(Debug, Clone, PartialEq)]
pub struct RawGameRow {
    fields: Vec<String>,
}

impl RawGameRow {
    pub fn new(fields: Vec<String>) -> Self {
        RawGameRow { fields }
    }

    /// Split a single comma-separated line
    pub fn from_line(line: &str) -> Self {
        RawGameRow::new(line.split(',').map(|f| f.trim().to_string()).collect())
    }

    /// Header/footer line rather than data
    pub fn is_sentinel(&self) -> bool {
        self.fields
            .first()
            .map_or(true, |first| is_sentinel_field(first))
    }

    pub fn team_code(&self) -> TeamCode {
        TeamCode(self.field(0).unwrap_or_default().to_string())
    }

    pub fn game_code(&self) -> GameCode {
        GameCode(self.field(1).unwrap_or_default().to_string())
    }

    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric value of a column
    pub fn value(&self, column: usize) -> Result<f64> {
        let raw = self.field(column).ok_or_else(|| GridironError::MalformedRow {
            game: self.game_code(),
            message: format!(
                "team {} row has {} columns, column {} requested",
                self.team_code(),
                self.fields.len(),
                column
            ),
        })?;
        raw.parse::<f64>().map_err(|_| GridironError::MalformedRow {
            game: self.game_code(),
            message: format!(
                "team {} column {} is not numeric: {:?}",
                self.team_code(),
                column,
                raw
            ),
        })
    }
}

/// A quoted first field marks a header or footer line
pub fn is_sentinel_field(field: &str) -> bool {
    field.is_empty() || field.starts_with('"')
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All);
    builder
}

/// Read every row of a team-game statistics source, sentinel lines included
pub fn read_statistics<R: Read>(source: R) -> Result<Vec<RawGameRow>> {
    let mut reader = reader_builder().from_reader(source);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(RawGameRow::new(record.iter().map(str::to_string).collect()));
    }
    Ok(rows)
}

pub fn read_statistics_file(path: &Path) -> Result<Vec<RawGameRow>> {
    let file = std::fs::File::open(path)?;
    read_statistics(file)
}

/// Game codes of a schedule source in file order, sentinel lines dropped
pub fn read_schedule<R: Read>(source: R) -> Result<Vec<GameCode>> {
    let mut reader = reader_builder().from_reader(source);
    let mut games = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(code) = record.get(0) else {
            continue;
        };
        if is_sentinel_field(code) {
            continue;
        }
        games.push(GameCode(code.to_string()));
    }
    Ok(games)
}

pub fn read_schedule_file(path: &Path) -> Result<Vec<GameCode>> {
    let file = std::fs::File::open(path)?;
    read_schedule(file)
}
