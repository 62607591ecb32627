//! Per-query similarity indexes
//!
//! An index is built fresh over the filtered candidates of one query, so it
//! only needs to be cheap to build. Two flavors:
//!
//! - [`FlatIndex`] scores every stored vector against the query pairwise.
//! - [`MatrixIndex`] keeps the candidates as one row-major matrix and scores
//!   all rows in parallel (query tensor against candidate matrix). For
//!   squared distance it expands `|a|² + |b|² - 2a·b`, which can differ from
//!   the flat result by float rounding.

use crate::metric::{Comparator, Metric};
use kbquery_core::{Error, Result, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub trait VectorIndex {
    fn metric(&self) -> Metric;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The best `min(k, len)` positions with their scores, best first. Equal
    /// scores keep insertion order.
    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    #[default]
    Flat,
    Matrix,
}

impl IndexKind {
    pub fn build(&self, metric: Metric, vectors: Vec<Vector>) -> Result<Box<dyn VectorIndex + Send + Sync>> {
        Ok(match self {
            IndexKind::Flat => Box::new(FlatIndex::build(metric, vectors)?),
            IndexKind::Matrix => Box::new(MatrixIndex::build(metric, vectors)?),
        })
    }
}

fn common_dim(vectors: &[Vector]) -> Result<usize> {
    let dim = vectors.first().map(|v| v.dim()).unwrap_or(0);
    for v in vectors {
        if v.dim() != dim {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: v.dim(),
            });
        }
    }
    Ok(dim)
}

fn check_query(dim: usize, query: &Vector, k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidK);
    }
    if query.dim() != dim {
        return Err(Error::InvalidDimension {
            expected: dim,
            actual: query.dim(),
        });
    }
    Ok(())
}

/// Best `k` of `scores`, stable on ties.
fn top_k(metric: Metric, scores: Vec<f32>, k: usize) -> Vec<(usize, f32)> {
    let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| metric.compare(a.1, b.1));
    ranked.truncate(k);
    ranked
}

/// Exact pairwise search
#[derive(Debug, Clone)]
pub struct FlatIndex {
    metric: Metric,
    dim: usize,
    vectors: Vec<Vector>,
}

impl FlatIndex {
    pub fn build(metric: Metric, vectors: Vec<Vector>) -> Result<Self> {
        let dim = common_dim(&vectors)?;
        Ok(Self {
            metric,
            dim,
            vectors,
        })
    }
}

impl VectorIndex for FlatIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>> {
        if self.vectors.is_empty() {
            return if k == 0 { Err(Error::InvalidK) } else { Ok(Vec::new()) };
        }
        check_query(self.dim, query, k)?;
        let scores = self
            .vectors
            .iter()
            .map(|v| self.metric.score(query, v))
            .collect();
        Ok(top_k(self.metric, scores, k))
    }
}

/// Row-major candidate matrix scored in parallel
#[derive(Debug, Clone)]
pub struct MatrixIndex {
    metric: Metric,
    dim: usize,
    rows: usize,
    data: Vec<f32>,
    /// Squared row norms for distance; empty for cosine
    sq_norms: Vec<f32>,
}

impl MatrixIndex {
    pub fn build(metric: Metric, vectors: Vec<Vector>) -> Result<Self> {
        let dim = common_dim(&vectors)?;
        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dim);
        let mut sq_norms = Vec::new();

        for v in vectors {
            match metric {
                Metric::Cosine => data.extend_from_slice(v.normalized().as_slice()),
                Metric::SquaredEuclidean => {
                    sq_norms.push(v.dot(&v));
                    data.extend_from_slice(v.as_slice());
                }
            }
        }

        Ok(Self {
            metric,
            dim,
            rows,
            data,
            sq_norms,
        })
    }
}

impl VectorIndex for MatrixIndex {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn len(&self) -> usize {
        self.rows
    }

    fn search(&self, query: &Vector, k: usize) -> Result<Vec<(usize, f32)>> {
        if self.rows == 0 {
            return if k == 0 { Err(Error::InvalidK) } else { Ok(Vec::new()) };
        }
        check_query(self.dim, query, k)?;

        let scores: Vec<f32> = match self.metric {
            Metric::Cosine => {
                let q = query.normalized();
                if self.dim == 0 {
                    vec![0.0; self.rows]
                } else {
                    self.data
                        .par_chunks(self.dim)
                        .map(|row| kbquery_core::vector::dot(q.as_slice(), row))
                        .collect()
                }
            }
            Metric::SquaredEuclidean => {
                let q_sq = query.dot(query);
                if self.dim == 0 {
                    vec![0.0; self.rows]
                } else {
                    self.data
                        .par_chunks(self.dim)
                        .zip(self.sq_norms.par_iter())
                        .map(|(row, &r_sq)| {
                            let d = r_sq + q_sq - 2.0 * kbquery_core::vector::dot(query.as_slice(), row);
                            // clamp rounding below zero; NaN stays NaN and ranks last
                            if d < 0.0 {
                                0.0
                            } else {
                                d
                            }
                        })
                        .collect()
                }
            }
        };

        Ok(top_k(self.metric, scores, k))
    }
}
