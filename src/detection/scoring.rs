//! Candidate confidence scoring
//!
//! Weighted sum of four step functions. Each term is clamped to `[0, 1]`
//! before weighting, so the total stays in `[0, 1]`.

use crate::config::CandidateConfig;
use crate::constants::scoring::{AREA_WEIGHT, ASPECT_WEIGHT, SOLIDITY_WEIGHT, VERTEX_WEIGHT};

use super::candidate::Candidate;

pub struct ConfidenceScorer<'a> {
    config: &'a CandidateConfig,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a CandidateConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, candidate: &Candidate) -> f32 {
        let aspect = aspect_score((candidate.aspect_ratio - self.config.card_aspect_ratio).abs());
        let area = area_score(candidate.area_ratio);
        let vertices = vertex_score(candidate.vertex_count);
        let solidity = solidity_score(candidate.solidity);

        let total = ASPECT_WEIGHT * aspect.clamp(0.0, 1.0)
            + AREA_WEIGHT * area.clamp(0.0, 1.0)
            + VERTEX_WEIGHT * vertices.clamp(0.0, 1.0)
            + SOLIDITY_WEIGHT * solidity.clamp(0.0, 1.0);

        total.clamp(0.0, 1.0) as f32
    }

    /// Score every candidate in place and return the index of the winner.
    ///
    /// Ties keep the earliest candidate.
    pub fn select_best(&self, candidates: &mut [Candidate]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for i in 0..candidates.len() {
            candidates[i].confidence = self.score(&candidates[i]);
            match best {
                Some(b) if candidates[i].confidence <= candidates[b].confidence => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// `diff` is the distance from the card aspect ratio
fn aspect_score(diff: f64) -> f64 {
    if diff < 0.08 {
        1.0
    } else if diff < 0.15 {
        0.95
    } else if diff < 0.20 {
        0.85
    } else if diff < 0.30 {
        0.75
    } else {
        0.5
    }
}

/// Mid-sized subjects score best; tiny or frame-filling ones are suspect
fn area_score(ratio: f64) -> f64 {
    if (0.40..=0.70).contains(&ratio) {
        1.0
    } else if ratio > 0.70 && ratio <= 0.95 {
        0.98
    } else if (0.30..0.40).contains(&ratio) {
        0.95
    } else if (0.15..0.30).contains(&ratio) {
        0.90
    } else if (0.05..0.15).contains(&ratio) {
        0.85
    } else {
        0.75
    }
}

fn vertex_score(count: usize) -> f64 {
    match count {
        4 => 1.0,
        5 => 0.95,
        6 => 0.85,
        7 => 0.75,
        _ => 0.65,
    }
}

fn solidity_score(solidity: f64) -> f64 {
    if solidity > 0.95 {
        1.0
    } else if solidity > 0.90 {
        0.95
    } else if solidity > 0.85 {
        0.90
    } else {
        solidity.max(0.70)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::card::CARD_ASPECT_RATIO;
    use crate::detection::BoundingBox;

    fn candidate(area_ratio: f64, aspect_ratio: f64, vertex_count: usize, solidity: f64) -> Candidate {
        Candidate {
            index: 0,
            bbox: BoundingBox::new(0, 0, 10, 14),
            area: 140.0,
            area_ratio,
            aspect_ratio,
            vertex_count,
            solidity,
            confidence: 0.0,
        }
    }

    #[test]
    fn test_aspect_bands() {
        assert_eq!(aspect_score(0.0), 1.0);
        assert_eq!(aspect_score(0.079), 1.0);
        assert_eq!(aspect_score(0.08), 0.95);
        assert_eq!(aspect_score(0.19), 0.85);
        assert_eq!(aspect_score(0.25), 0.75);
        assert_eq!(aspect_score(0.30), 0.5);
    }

    #[test]
    fn test_area_bands() {
        assert_eq!(area_score(0.40), 1.0);
        assert_eq!(area_score(0.70), 1.0);
        assert_eq!(area_score(0.80), 0.98);
        assert_eq!(area_score(0.95), 0.98);
        assert_eq!(area_score(0.35), 0.95);
        assert_eq!(area_score(0.20), 0.90);
        assert_eq!(area_score(0.05), 0.85);
        assert_eq!(area_score(0.97), 0.75);
        assert_eq!(area_score(0.01), 0.75);
    }

    #[test]
    fn test_vertex_and_solidity_bands() {
        assert_eq!(vertex_score(4), 1.0);
        assert_eq!(vertex_score(5), 0.95);
        assert_eq!(vertex_score(6), 0.85);
        assert_eq!(vertex_score(7), 0.75);
        assert_eq!(vertex_score(12), 0.65);

        assert_eq!(solidity_score(0.99), 1.0);
        assert_eq!(solidity_score(0.93), 0.95);
        assert_eq!(solidity_score(0.87), 0.90);
        assert_eq!(solidity_score(0.80), 0.80);
        assert_eq!(solidity_score(0.40), 0.70);
    }

    #[test]
    fn test_ideal_card_scores_one() {
        let config = CandidateConfig::default();
        let score = ConfidenceScorer::new(&config).score(&candidate(0.5, CARD_ASPECT_RATIO, 4, 1.0));
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_full_coverage_rectangle_scores_high() {
        let config = CandidateConfig::default();
        let score = ConfidenceScorer::new(&config).score(&candidate(1.0, 0.7143, 4, 1.0));
        assert!(score >= 0.9, "score was {}", score);
        assert!((score - 0.925).abs() < 1e-6);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let config = CandidateConfig::default();
        let scorer = ConfidenceScorer::new(&config);
        for &(area, aspect, vertices, solidity) in &[
            (0.0, 0.0, 3, 0.0),
            (1.0, 1.0, 100, 1.0),
            (0.5, 0.5, 8, 0.5),
        ] {
            let score = scorer.score(&candidate(area, aspect, vertices, solidity));
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn test_select_best_prefers_first_on_tie() {
        let config = CandidateConfig::default();
        let mut candidates = vec![
            candidate(0.2, CARD_ASPECT_RATIO, 6, 0.9),
            candidate(0.5, CARD_ASPECT_RATIO, 4, 1.0),
            candidate(0.5, CARD_ASPECT_RATIO, 4, 1.0),
        ];
        let best = ConfidenceScorer::new(&config).select_best(&mut candidates);
        assert_eq!(best, Some(1));
        assert!(candidates.iter().all(|c| c.confidence > 0.0));
        assert!(ConfidenceScorer::new(&config).select_best(&mut []).is_none());
    }
}
