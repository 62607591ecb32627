//! Score direction
//!
//! Distance scores rank lower-is-better, cosine scores higher-is-better. The
//! ranker never hardcodes a direction: it takes a [`Comparator`] alongside
//! the scores.

use kbquery_core::Vector;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

/// Orders scores for one metric
pub trait Comparator {
    fn direction(&self) -> Direction;

    /// `Less` when `a` ranks ahead of `b`. NaN ranks behind every number.
    fn compare(&self, a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match self.direction() {
                Direction::LowerIsBetter => OrderedFloat(a).cmp(&OrderedFloat(b)),
                Direction::HigherIsBetter => OrderedFloat(b).cmp(&OrderedFloat(a)),
            },
        }
    }

    fn better_than(&self, a: f32, b: f32) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// A score passes unless the threshold is strictly better than it, so a
    /// score exactly at the threshold passes.
    fn passes(&self, score: f32, threshold: f32) -> bool {
        !self.better_than(threshold, score)
    }
}

impl Comparator for Direction {
    fn direction(&self) -> Direction {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Squared L2 distance, unbounded above
    #[default]
    SquaredEuclidean,
    /// Cosine similarity in [-1, 1]
    Cosine,
}

impl Metric {
    #[inline]
    pub fn score(&self, a: &Vector, b: &Vector) -> f32 {
        match self {
            Metric::SquaredEuclidean => a.squared_l2_distance(b),
            Metric::Cosine => a.cosine_similarity(b),
        }
    }

    /// Scores closer than this are treated as ties.
    pub fn default_tie_epsilon(&self) -> f32 {
        match self {
            Metric::SquaredEuclidean => 1e-3,
            Metric::Cosine => 1e-6,
        }
    }

    /// Confidence threshold used when a configuration does not set one.
    pub fn default_threshold(&self) -> f32 {
        match self {
            Metric::SquaredEuclidean => 500.0,
            Metric::Cosine => 0.45,
        }
    }
}

impl Comparator for Metric {
    fn direction(&self) -> Direction {
        match self {
            Metric::SquaredEuclidean => Direction::LowerIsBetter,
            Metric::Cosine => Direction::HigherIsBetter,
        }
    }
}
