//! Human-readable dump of trained weights
//!
//! One `name<TAB>weight` line per feature, heaviest weight first. The dump is meant for reading,
//! nothing in the crate loads it back.

use std::fmt::Write as _;
use std::path::Path;

use crate::training::SparseVector;
use crate::Result;

/// Features ordered by descending weight, ties broken by name
pub fn ranked_weights(weights: &SparseVector) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = weights
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

pub fn format_weights(weights: &SparseVector) -> String {
    let mut out = String::new();
    for (name, value) in ranked_weights(weights) {
        // Writing to a String cannot fail
        let _ = writeln!(out, "{}\t{}", name, value);
    }
    out
}

pub fn write_weights(path: &Path, weights: &SparseVector) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, format_weights(weights))?;
    log::info!("Wrote {} weights to {}", weights.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sorted_descending() {
        let weights: SparseVector = [
            ("rush yard-off1", 0.25),
            ("wins-off2", -1.5),
            ("points-off1", 2.0),
            ("pass yard-off1", 0.25),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            format_weights(&weights),
            "points-off1\t2\npass yard-off1\t0.25\nrush yard-off1\t0.25\nwins-off2\t-1.5\n"
        );
    }

    #[test]
    fn test_nan_weights_sort_deterministically() {
        let forward: SparseVector = [("b", 1.0), ("nan", f64::NAN), ("a", -2.0), ("zero", 0.0)]
            .into_iter()
            .collect();
        let names: Vec<&str> = ranked_weights(&forward).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["nan", "b", "zero", "a"]);
    }

    #[test]
    fn test_write_weights_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("weights");
        let weights: SparseVector = [("a", 1.0)].into_iter().collect();

        write_weights(&path, &weights).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\t1\n");
    }
}
