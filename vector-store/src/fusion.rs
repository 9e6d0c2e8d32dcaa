//! Hybrid score fusion: blends a lexical and a semantic ranking.
//!
//! Both component scores are min-max normalized to [0, 1] within the
//! candidate set before blending, so the `alpha` weight has a consistent
//! meaning regardless of each sub-metric's native scale:
//!
//! `fused = alpha * semantic + (1 - alpha) * lexical`
//!
//! `alpha = 1.0` reproduces the pure semantic ranking, `alpha = 0.0` the
//! pure lexical one. Ties break by first-seen insertion order, which keeps
//! the ranking deterministic and reproducible.

use crate::errors::StoreError;

/// One candidate with its component scores.
///
/// A candidate missing from one of the two rankings carries `None` for that
/// component and contributes 0 to the blend.
#[derive(Clone, Debug)]
pub struct Candidate<T> {
    pub item: T,
    pub lexical: Option<f32>,
    pub semantic: Option<f32>,
}

/// Rejects `alpha` outside [0.0, 1.0].
pub fn validate_alpha(alpha: f32) -> Result<(), StoreError> {
    if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "alpha must be in [0.0, 1.0], got {alpha}"
        )))
    }
}

/// Fuses the candidate set into a ranking ordered by descending blended
/// score. Insertion order of `candidates` is the tie-break order.
pub fn fuse<T>(candidates: Vec<Candidate<T>>, alpha: f32) -> Vec<(T, f32)> {
    let lex_scores: Vec<f32> = candidates.iter().filter_map(|c| c.lexical).collect();
    let sem_scores: Vec<f32> = candidates.iter().filter_map(|c| c.semantic).collect();
    let lexical = normalizer(lex_scores.into_iter());
    let semantic = normalizer(sem_scores.into_iter());

    let mut fused: Vec<(T, f32)> = candidates
        .into_iter()
        .map(|c| {
            let lex = c.lexical.map(|s| lexical(s)).unwrap_or(0.0);
            let sem = c.semantic.map(|s| semantic(s)).unwrap_or(0.0);
            (c.item, alpha * sem + (1.0 - alpha) * lex)
        })
        .collect();

    // Stable sort: equal scores keep insertion order.
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused
}

/// Builds a min-max normalizer over the observed score range.
///
/// A degenerate range (all scores equal, or a single candidate) maps every
/// present score to 1.0 so it still outranks absent components.
fn normalizer(scores: impl Iterator<Item = f32>) -> impl Fn(f32) -> f32 {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for s in scores {
        min = min.min(s);
        max = max.max(s);
    }
    let span = max - min;
    move |s: f32| {
        if !span.is_finite() || span <= f32::EPSILON {
            1.0
        } else {
            (s - min) / span
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate<&'static str>> {
        // "lex" wins the lexical ranking, "sem" the semantic one,
        // "mid" sits in between on both.
        vec![
            Candidate {
                item: "lex",
                lexical: Some(9.0),
                semantic: Some(0.10),
            },
            Candidate {
                item: "mid",
                lexical: Some(5.0),
                semantic: Some(0.50),
            },
            Candidate {
                item: "sem",
                lexical: Some(1.0),
                semantic: Some(0.95),
            },
        ]
    }

    fn rank_of(ranking: &[(&str, f32)], item: &str) -> usize {
        ranking.iter().position(|(i, _)| *i == item).unwrap()
    }

    #[test]
    fn alpha_extremes_reproduce_component_rankings() {
        let lexical: Vec<&str> = fuse(candidates(), 0.0).into_iter().map(|(i, _)| i).collect();
        assert_eq!(lexical, ["lex", "mid", "sem"]);

        let semantic: Vec<&str> = fuse(candidates(), 1.0).into_iter().map(|(i, _)| i).collect();
        assert_eq!(semantic, ["sem", "mid", "lex"]);
    }

    #[test]
    fn normalization_maps_each_component_to_unit_range() {
        let fused = fuse(candidates(), 0.0);
        assert_eq!(fused[0].1, 1.0);
        assert_eq!(fused[2].1, 0.0);
    }

    #[test]
    fn rank_shifts_monotonically_with_alpha() {
        // The semantic winner can only climb as alpha rises.
        let mut last = usize::MAX;
        for alpha in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let fused = fuse(candidates(), alpha);
            let rank = rank_of(&fused, "sem");
            assert!(rank <= last, "rank of 'sem' regressed at alpha={alpha}");
            last = rank;
        }
    }

    #[test]
    fn missing_component_scores_contribute_zero() {
        let cands = vec![
            Candidate {
                item: "both",
                lexical: Some(1.0),
                semantic: Some(0.2),
            },
            Candidate {
                item: "lex-only",
                lexical: Some(2.0),
                semantic: None,
            },
        ];
        let fused = fuse(cands, 1.0);
        // Pure semantic: the lexical-only candidate scores 0.
        assert_eq!(fused[0].0, "both");
        assert_eq!(fused[1].1, 0.0);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let cands = vec![
            Candidate {
                item: "first",
                lexical: Some(3.0),
                semantic: Some(3.0),
            },
            Candidate {
                item: "second",
                lexical: Some(3.0),
                semantic: Some(3.0),
            },
        ];
        let fused = fuse(cands, 0.5);
        assert_eq!(fused[0].0, "first");
        assert_eq!(fused[1].0, "second");
    }

    #[test]
    fn alpha_bounds_are_enforced() {
        assert!(validate_alpha(0.0).is_ok());
        assert!(validate_alpha(0.5).is_ok());
        assert!(validate_alpha(1.0).is_ok());
        assert!(validate_alpha(-0.1).is_err());
        assert!(validate_alpha(1.1).is_err());
        assert!(validate_alpha(f32::NAN).is_err());
    }
}
