//! Vector similarity for embedding retrieval

use serde::{Deserialize, Serialize};

/// Cosine similarity; 0.0 when either vector has zero norm or lengths differ
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (norm_a * norm_b)
}

/// Euclidean distance; infinite when lengths differ
pub fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Scores of one candidate against a query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub index: usize,
    pub cosine: f32,
    pub euclidean: f32,
    pub dot: f32,
}

/// Score every candidate and return the `top_k` best by cosine similarity
pub fn rank(query: &[f32], candidates: &[Vec<f32>], top_k: usize) -> Vec<Similarity> {
    let mut scored: Vec<Similarity> = candidates
        .iter()
        .enumerate()
        .map(|(index, c)| Similarity {
            index,
            cosine: cosine(query, c),
            euclidean: euclidean(query, c),
            dot: dot(query, c),
        })
        .collect();
    scored.sort_by(|a, b| b.cosine.total_cmp(&a.cosine).then(a.index.cmp(&b.index)));
    scored.truncate(top_k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_measures() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((euclidean(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_rank_orders_by_cosine() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![0.0, 1.0], vec![1.0, 0.1], vec![1.0, 1.0]];
        let ranked = rank(&query, &candidates, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked[1].index, 2);
    }
}
