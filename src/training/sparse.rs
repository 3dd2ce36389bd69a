//! Sparse named-feature vectors
//!
//! Both feature vectors and weight vectors are maps from feature name to value. Absent entries
//! are zero. Entries are kept ordered by name, so sums over a vector always run in the same
//! order and repeated runs produce bit-identical results.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: BTreeMap<String, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a feature, zero when absent
    pub fn get(&self, key: &str) -> f64 {
        self.entries.get(key).copied().unwrap_or(0.0)
    }

    /// Set a feature, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), value);
    }

    /// Add `value` to a feature
    pub fn increment(&mut self, key: &str, value: f64) {
        match self.entries.get_mut(key) {
            Some(existing) => *existing += value,
            None => {
                self.entries.insert(key.to_string(), value);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of explicitly stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, f64> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Inner product; only keys present in both vectors contribute
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .entries
            .iter()
            .filter_map(|(key, value)| large.entries.get(key).map(|v| value * v))
            .sum()
    }

    /// `self += other * factor`
    pub fn add_scaled(&mut self, other: &SparseVector, factor: f64) {
        for (key, value) in &other.entries {
            self.increment(key, value * factor);
        }
    }

    pub fn scale_assign(&mut self, factor: f64) {
        for value in self.entries.values_mut() {
            *value *= factor;
        }
    }

    /// Every entry multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> SparseVector {
        let mut out = self.clone();
        out.scale_assign(factor);
        out
    }

    /// Every entry divided by `divisor`
    pub fn divided(&self, divisor: f64) -> SparseVector {
        debug_assert!(divisor != 0.0, "division of a sparse vector by zero");
        let mut out = self.clone();
        for value in out.entries.values_mut() {
            *value /= divisor;
        }
        out
    }

    /// Squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.entries.values().map(|v| v * v).sum()
    }
}

impl AddAssign<&SparseVector> for SparseVector {
    fn add_assign(&mut self, other: &SparseVector) {
        self.add_scaled(other, 1.0);
    }
}

impl SubAssign<&SparseVector> for SparseVector {
    fn sub_assign(&mut self, other: &SparseVector) {
        self.add_scaled(other, -1.0);
    }
}

impl Add<&SparseVector> for &SparseVector {
    type Output = SparseVector;

    fn add(self, other: &SparseVector) -> SparseVector {
        let mut out = self.clone();
        out += other;
        out
    }
}

impl Sub<&SparseVector> for &SparseVector {
    type Output = SparseVector;

    fn sub(self, other: &SparseVector) -> SparseVector {
        let mut out = self.clone();
        out -= other;
        out
    }
}

impl Mul<f64> for &SparseVector {
    type Output = SparseVector;

    fn mul(self, factor: f64) -> SparseVector {
        self.scaled(factor)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut out = SparseVector::new();
        for (key, value) in iter {
            out.set(key, value);
        }
        out
    }
}

impl<'a> IntoIterator for &'a SparseVector {
    type Item = (&'a String, &'a f64);
    type IntoIter = btree_map::Iter<'a, String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
