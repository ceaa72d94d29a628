//! UCB1 arm selection over rotation statistics.
//!
//! Pure functions: the candidate set and the trial count are passed in
//! explicitly and nothing is retained between calls.

use rotation_core::{Rotation, RotationError, RotationResult};

/// Upper confidence bound of one arm.
///
/// Both denominators are smoothed by one so that arms without shows get a
/// finite, maximal exploration bonus, and `ln(trials + 1)` is zero rather
/// than undefined on the very first trial.
pub fn score(shows: u64, clicks: u64, trials: u64) -> f64 {
    let shows = shows as f64 + 1.0;
    let mean_clicks = clicks as f64 / shows;
    let exploration = (2.0 * (trials as f64 + 1.0).ln() / shows).sqrt();
    mean_clicks + exploration
}

/// Pick the rotation to show next.
///
/// Candidates are scanned in order and a candidate replaces the current best
/// when its score is greater than or equal to it, so exact ties go to the
/// later candidate. The running maximum starts at zero.
pub fn select(candidates: &[Rotation], trials: u64) -> RotationResult<&Rotation> {
    let mut best_score = 0.0f64;
    let mut best = None;

    for candidate in candidates {
        let score = score(candidate.shows, candidate.clicks, trials);
        if score >= best_score {
            best_score = score;
            best = Some(candidate);
        }
    }

    best.ok_or(RotationError::NoCandidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn arm(id: i64, shows: u64, clicks: u64) -> Rotation {
        Rotation {
            id,
            banner_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            shows,
            clicks,
            deleted: false,
        }
    }

    #[test]
    fn test_score_formula() {
        // 3 / 10 + sqrt(2 * ln(100) / 10)
        let expected = 0.3 + (2.0 * 100f64.ln() / 10.0).sqrt();
        assert!((score(9, 3, 99) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_score_first_trial_is_zero() {
        assert_eq!(score(0, 0, 0), 0.0);
    }

    #[test]
    fn test_unseen_arm_gets_largest_bonus() {
        assert!(score(0, 0, 50) > score(10, 0, 50));
    }

    #[test]
    fn test_empty_candidates() {
        let err = select(&[], 10).unwrap_err();
        assert!(matches!(err, RotationError::NoCandidates));
    }

    #[test]
    fn test_single_candidate_always_wins() {
        let arms = [arm(1, 0, 0)];
        assert_eq!(select(&arms, 0).unwrap().id, 1);
    }

    #[test]
    fn test_ties_go_to_later_candidate() {
        let arms = [arm(1, 4, 1), arm(2, 4, 1)];
        for _ in 0..10 {
            assert_eq!(select(&arms, 8).unwrap().id, 2);
        }

        let reversed = [arm(2, 4, 1), arm(1, 4, 1)];
        assert_eq!(select(&reversed, 8).unwrap().id, 1);
    }

    #[test]
    fn test_first_trial_picks_last_candidate() {
        // Every score is zero when nothing has been shown yet.
        let arms = [arm(1, 0, 0), arm(2, 0, 0), arm(3, 0, 0)];
        assert_eq!(select(&arms, 0).unwrap().id, 3);
    }

    #[test]
    fn test_clicks_beat_exploration() {
        let arms = [arm(1, 10, 10), arm(2, 10, 0), arm(3, 10, 0)];
        assert_eq!(select(&arms, 30).unwrap().id, 1);
    }

    #[test]
    fn test_under_explored_arm_wins() {
        let arms = [arm(1, 100, 5), arm(2, 1, 0)];
        assert_eq!(select(&arms, 101).unwrap().id, 2);
    }
}
