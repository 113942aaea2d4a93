use std::cmp::Ordering;

use super::result::MatchStatus;

/// NaN never outranks a real score.
fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Score descending, then code ascending.
pub fn compare_candidates(a_code: &str, a_score: f32, b_code: &str, b_score: f32) -> Ordering {
    rank_key(b_score)
        .total_cmp(&rank_key(a_score))
        .then_with(|| a_code.cmp(b_code))
}

/// Sorts `(index, score)` pairs with [`compare_candidates`], resolving codes
/// through `codes`, and keeps the first `k`.
pub fn select_top_k(mut candidates: Vec<(usize, f32)>, codes: &[String], k: usize) -> Vec<(usize, f32)> {
    let code_of = |idx: usize| codes.get(idx).map(String::as_str).unwrap_or("");

    candidates.sort_by(|a, b| compare_candidates(code_of(a.0), a.1, code_of(b.0), b.1));
    candidates.truncate(k);
    candidates
}

/// `confident` when `top_score >= threshold` (inclusive), `low` otherwise.
pub fn classify(top_score: f32, threshold: f32, confident: MatchStatus, low: MatchStatus) -> MatchStatus {
    if rank_key(top_score) >= threshold {
        confident
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes() -> Vec<String> {
        ["J3", "J1", "J2", "J0"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_by_score_then_code() {
        let ranked = select_top_k(vec![(0, 0.5), (1, 0.5), (2, 0.9), (3, 0.1)], &codes(), 10);

        assert_eq!(ranked, vec![(2, 0.9), (1, 0.5), (0, 0.5), (3, 0.1)]);
    }

    #[test]
    fn truncates_to_k() {
        let ranked = select_top_k(vec![(0, 0.5), (1, 0.7), (2, 0.9)], &codes(), 2);

        assert_eq!(ranked, vec![(2, 0.9), (1, 0.7)]);
    }

    #[test]
    fn nan_sinks_to_the_bottom() {
        let ranked = select_top_k(vec![(0, f32::NAN), (1, -0.2)], &codes(), 2);

        assert_eq!(ranked[0], (1, -0.2));
        assert!(ranked[1].1.is_nan());
    }

    #[test]
    fn threshold_boundary_is_inclusive() {
        assert_eq!(
            classify(0.3, 0.3, MatchStatus::Ok, MatchStatus::Uncertain),
            MatchStatus::Ok
        );
        assert_eq!(
            classify(0.2999, 0.3, MatchStatus::Ok, MatchStatus::Indecis),
            MatchStatus::Indecis
        );
        assert_eq!(
            classify(f32::NAN, 0.0, MatchStatus::Ok, MatchStatus::Uncertain),
            MatchStatus::Uncertain
        );
    }
}
