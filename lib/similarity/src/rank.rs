//! Ranking and selection
//!
//! Turns scored candidates into one [`Outcome`]:
//!
//! 1. no candidates → [`Outcome::NoMatch`]
//! 2. stable sort by the metric's [`Comparator`]
//! 3. group adjacent scores closer than epsilon into tie groups
//! 4. draw uniformly among the first `pool_size` members of the top group
//! 5. a drawn score worse than the threshold → [`Outcome::LowConfidence`]
//!
//! `pool_size = 1` is deterministic best-match; a larger pool spreads answers
//! across records that score the same. Randomness only enters at step 4,
//! through the caller's RNG.

use crate::metric::Comparator;
use kbquery_core::{Error, Result};
use rand::Rng;
use smallvec::SmallVec;
use std::ops::Range;

/// A candidate paired with its score
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f32,
}

impl<T> Scored<T> {
    pub fn new(item: T, score: f32) -> Self {
        Self { item, score }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Answer { item: T, score: f32 },
    /// Nothing survived filtering
    NoMatch,
    /// A match existed but failed the confidence threshold
    LowConfidence { best_score: f32 },
}

impl<T> Outcome<T> {
    pub fn is_answer(&self) -> bool {
        matches!(self, Outcome::Answer { .. })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Answer { item, score } => Outcome::Answer {
                item: f(item),
                score,
            },
            Outcome::NoMatch => Outcome::NoMatch,
            Outcome::LowConfidence { best_score } => Outcome::LowConfidence { best_score },
        }
    }
}

/// Tie groups over scores already sorted best-first. Two neighbors tie when
/// they are equal or differ by less than `epsilon`.
pub fn tie_groups(sorted: &[f32], epsilon: f32) -> SmallVec<[Range<usize>; 4]> {
    let mut groups = SmallVec::new();
    let mut start = 0;
    for i in 1..=sorted.len() {
        let breaks = i == sorted.len() || {
            let diff = (sorted[i] - sorted[i - 1]).abs();
            !(diff == 0.0 || diff < epsilon)
        };
        if breaks {
            if start < i {
                groups.push(start..i);
            }
            start = i;
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selector {
    pool_size: usize,
    threshold: f32,
    epsilon: f32,
}

impl Selector {
    pub fn new(pool_size: usize, threshold: f32, epsilon: f32) -> Result<Self> {
        if pool_size < 1 {
            return Err(Error::InvalidPoolSize(pool_size));
        }
        if !threshold.is_finite() {
            return Err(Error::InvalidThreshold(threshold));
        }
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(Error::InvalidEpsilon(epsilon));
        }
        Ok(Self {
            pool_size,
            threshold,
            epsilon,
        })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn select<T, C, R>(&self, mut candidates: Vec<Scored<T>>, comparator: &C, rng: &mut R) -> Outcome<T>
    where
        C: Comparator + ?Sized,
        R: Rng + ?Sized,
    {
        if candidates.is_empty() {
            return Outcome::NoMatch;
        }

        candidates.sort_by(|a, b| comparator.compare(a.score, b.score));
        let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let groups = tie_groups(&scores, self.epsilon);
        let top = groups.first().map(|g| g.len()).unwrap_or(1);
        let eligible = top.min(self.pool_size);

        let pick = if eligible > 1 {
            rng.random_range(0..eligible)
        } else {
            0
        };

        let Some(chosen) = candidates.into_iter().nth(pick) else {
            return Outcome::NoMatch;
        };
        tracing::debug!(
            tie_group = top,
            eligible,
            pick,
            score = chosen.score,
            threshold = self.threshold,
            "candidate selected"
        );

        if !comparator.passes(chosen.score, self.threshold) {
            return Outcome::LowConfidence {
                best_score: chosen.score,
            };
        }

        Outcome::Answer {
            item: chosen.item,
            score: chosen.score,
        }
    }
}
