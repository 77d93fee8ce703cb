//! Distance metrics for vector similarity.
//!
//! All scores are computed in `f64` and oriented so that **higher is more
//! similar**, which is what [`crate::VectorIndex::top_k`] sorts on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity metric used by an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine similarity: `dot(a, b) / (|a| * |b|)`.
    ///
    /// Range: [-1, 1], where 1 means identical direction. If either vector has
    /// zero magnitude the similarity is defined as 0.
    #[default]
    Cosine,

    /// Raw dot product. Unbounded; equal to cosine for unit-length vectors.
    DotProduct,

    /// Euclidean (L2) distance mapped to `1 / (1 + d)`, range (0, 1].
    Euclidean,
}

impl DistanceMetric {
    /// Compute the similarity score between two vectors.
    ///
    /// Callers guarantee equal lengths; the index checks dimensions before
    /// scoring.
    #[inline]
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::DotProduct => dot_product(a, b),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }

    /// Get the name of this metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::DotProduct => "dot_product",
            DistanceMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" | "cos" => Ok(DistanceMetric::Cosine),
            "dot" | "dot_product" | "dotproduct" | "inner" => Ok(DistanceMetric::DotProduct),
            "euclidean" | "l2" | "euclid" => Ok(DistanceMetric::Euclidean),
            _ => Err(format!("Unknown distance metric: {}", s)),
        }
    }
}

/// Cosine similarity with an explicit zero-magnitude guard.
///
/// A zero vector has no direction, so its similarity to anything (including
/// another zero vector) is 0 rather than the NaN that `0.0 / 0.0` would give.
/// The result is clamped to [-1, 1] to absorb rounding on near-parallel inputs.
#[inline]
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !denom.is_normal() {
        return 0.0;
    }

    (dot / denom).clamp(-1.0, 1.0)
}

#[inline]
fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

#[inline]
fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
