//! Offensive and defensive statistic selection
//!
//! Two factor files list the same statistic columns line by line as `name,flag`. Line `i` of
//! both files refers to column `first_column + i`, and each file switches that column on (`1`)
//! or off (`0`) independently for offense and defense.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::data::RawGameRow;
use crate::training::SparseVector;
use crate::{GridironError, Result};

/// Which team's row a statistic is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The acting team's own row
    Offense,
    /// The opponent's row
    Defense,
}

impl Side {
    /// Suffix keeping like-named offensive and defensive statistics apart
    pub fn suffix(self) -> &'static str {
        match self {
            Side::Offense => "-off",
            Side::Defense => "-def",
        }
    }
}

/// A selected statistic and the row column it lives in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFactor {
    pub name: String,
    pub column: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactorCatalog {
    offensive: Vec<StatFactor>,
    defensive: Vec<StatFactor>,
}

impl FactorCatalog {
    /// Build from already-split factor lines (`[name, flag]`)
    pub fn from_lines<O, D, L, F>(offensive: O, defensive: D, first_column: usize) -> Result<Self>
    where
        O: IntoIterator<Item = L>,
        D: IntoIterator<Item = L>,
        L: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        let offensive: Vec<Vec<String>> = offensive.into_iter().map(split_line).collect();
        let defensive: Vec<Vec<String>> = defensive.into_iter().map(split_line).collect();

        if offensive.len() != defensive.len() {
            return Err(GridironError::Config(format!(
                "factor files disagree: {} offensive lines vs {} defensive lines",
                offensive.len(),
                defensive.len()
            )));
        }

        let mut catalog = FactorCatalog::default();
        for (i, (off, def)) in offensive.iter().zip(&defensive).enumerate() {
            let column = first_column + i;
            if let Some(name) = parse_factor(off, i + 1, Side::Offense)? {
                insert_factor(&mut catalog.offensive, name, column);
            }
            if let Some(name) = parse_factor(def, i + 1, Side::Defense)? {
                insert_factor(&mut catalog.defensive, name, column);
            }
        }
        Ok(catalog)
    }

    /// Read two factor sources
    pub fn from_readers<R1: Read, R2: Read>(
        offensive: R1,
        defensive: R2,
        first_column: usize,
    ) -> Result<Self> {
        let offensive = read_factor_records(offensive)?;
        let defensive = read_factor_records(defensive)?;
        Self::from_lines(
            offensive.iter().map(|r| r.iter()),
            defensive.iter().map(|r| r.iter()),
            first_column,
        )
    }

    pub fn load(offensive: &Path, defensive: &Path, first_column: usize) -> Result<Self> {
        let open = |path: &Path| {
            std::fs::File::open(path).map_err(|e| {
                GridironError::Config(format!(
                    "Failed to open factor file {}: {}",
                    path.display(),
                    e
                ))
            })
        };
        let catalog = Self::from_readers(open(offensive)?, open(defensive)?, first_column)?;
        log::info!(
            "Using {} offensive and {} defensive statistics",
            catalog.offensive.len(),
            catalog.defensive.len()
        );
        Ok(catalog)
    }

    pub fn offensive(&self) -> &[StatFactor] {
        &self.offensive
    }

    pub fn defensive(&self) -> &[StatFactor] {
        &self.defensive
    }

    pub fn factors(&self, side: Side) -> &[StatFactor] {
        match side {
            Side::Offense => &self.offensive,
            Side::Defense => &self.defensive,
        }
    }

    /// Offensive statistics from `team`'s row plus defensive statistics from `opponent`'s row,
    /// keyed `<name>-off` / `<name>-def`
    pub fn extract(&self, team: &RawGameRow, opponent: &RawGameRow) -> Result<SparseVector> {
        let mut stats = SparseVector::new();
        for (side, row) in [(Side::Offense, team), (Side::Defense, opponent)] {
            for factor in self.factors(side) {
                stats.set(
                    format!("{}{}", factor.name, side.suffix()),
                    row.value(factor.column)?,
                );
            }
        }
        Ok(stats)
    }
}

fn split_line<L, F>(line: L) -> Vec<String>
where
    L: IntoIterator<Item = F>,
    F: AsRef<str>,
{
    line.into_iter().map(|f| f.as_ref().trim().to_string()).collect()
}

/// Name of an enabled factor, `None` when switched off
fn parse_factor(fields: &[String], line: usize, side: Side) -> Result<Option<String>> {
    let file = match side {
        Side::Offense => "offensive",
        Side::Defense => "defensive",
    };
    let (Some(name), Some(flag)) = (fields.first(), fields.get(1)) else {
        return Err(GridironError::Config(format!(
            "{} factor line {} should be `name,flag`",
            file, line
        )));
    };
    match flag.parse::<i64>() {
        Ok(1) => Ok(Some(name.clone())),
        Ok(_) => Ok(None),
        Err(_) => Err(GridironError::Config(format!(
            "{} factor line {} has a non-integer flag {:?}",
            file, line, flag
        ))),
    }
}

/// A repeated name keeps its latest column
fn insert_factor(factors: &mut Vec<StatFactor>, name: String, column: usize) {
    match factors.iter_mut().find(|f| f.name == name) {
        Some(existing) => existing.column = column,
        None => factors.push(StatFactor { name, column }),
    }
}

fn read_factor_records<R: Read>(source: R) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok(records)
}
