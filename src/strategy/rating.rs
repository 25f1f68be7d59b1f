//! Sequential Elo-style team ratings.
//!
//! Replays matches in date order and attaches to every row the ratings
//! both teams held *before* that match. A row's own result only moves
//! the table after its pre-match ratings have been recorded, so no
//! feature ever sees the outcome it is meant to predict.

use std::collections::HashMap;

use tracing::debug;

use crate::config::RatingConfig;
use crate::types::{EngineError, MatchRecord};

/// A match row with the pre-match ratings of both sides attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedMatch {
    /// Position of the row in the tracker's input, before sorting.
    pub input_index: usize,
    pub record: MatchRecord,
    pub home_rating: f64,
    pub away_rating: f64,
}

impl RatedMatch {
    /// Home minus away, pre-match.
    pub fn rating_differential(&self) -> f64 {
        self.home_rating - self.away_rating
    }
}

/// Expected score of a side rated `rating` against `opponent`.
pub fn expected_score(rating: f64, opponent: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent - rating) / 400.0))
}

/// Rating adjustments `(home_delta, away_delta)` for a finished match.
///
/// Without draws a level score counts as 0.0 for the home side; the away
/// side always takes the complementary score, so the two deltas cancel.
pub fn rating_deltas(
    home_rating: f64,
    away_rating: f64,
    home_goals: u32,
    away_goals: u32,
    k_factor: f64,
    allow_draws: bool,
) -> (f64, f64) {
    let score_home = match home_goals.cmp(&away_goals) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => 0.0,
        std::cmp::Ordering::Equal if allow_draws => 0.5,
        std::cmp::Ordering::Equal => 0.0,
    };
    let expected_home = expected_score(home_rating, away_rating);
    let home_delta = k_factor * (score_home - expected_home);
    let away_delta = k_factor * ((1.0 - score_home) - (1.0 - expected_home));
    (home_delta, away_delta)
}

/// Per-team rating table rebuilt from scratch on every `process` call.
pub struct SequentialRatingTracker {
    config: RatingConfig,
    allow_draws: bool,
    ratings: HashMap<String, f64>,
}

impl SequentialRatingTracker {
    pub fn new(config: RatingConfig, allow_draws: bool) -> Self {
        Self {
            config,
            allow_draws,
            ratings: HashMap::new(),
        }
    }

    /// Current rating of a team (the initial rating if never seen).
    pub fn rating(&self, team: &str) -> f64 {
        self.ratings
            .get(team)
            .copied()
            .unwrap_or(self.config.initial_rating)
    }

    /// Final rating table after the last `process` call.
    pub fn ratings(&self) -> &HashMap<String, f64> {
        &self.ratings
    }

    /// Rate a batch of matches.
    ///
    /// The batch is stable-sorted by date first; rows sharing a date keep
    /// their input order. Output is in processing (date) order and each
    /// row carries its `input_index`. Rows without a final score read the
    /// table but never write it.
    pub fn process(&mut self, matches: Vec<MatchRecord>) -> Result<Vec<RatedMatch>, EngineError> {
        self.ratings.clear();

        let mut indexed: Vec<(usize, MatchRecord)> = matches.into_iter().enumerate().collect();
        indexed.sort_by_key(|(_, m)| m.date);

        let mut rated = Vec::with_capacity(indexed.len());
        let mut updates = 0usize;

        for (input_index, record) in indexed {
            if record.home_team.trim().is_empty() {
                return Err(EngineError::MissingField { row: input_index, field: "home_team" });
            }
            if record.away_team.trim().is_empty() {
                return Err(EngineError::MissingField { row: input_index, field: "away_team" });
            }

            let home_rating = self.rating(&record.home_team);
            let away_rating = self.rating(&record.away_team);

            match (record.home_goals, record.away_goals) {
                (Some(home_goals), Some(away_goals)) => {
                    let (home_delta, away_delta) = rating_deltas(
                        home_rating,
                        away_rating,
                        home_goals,
                        away_goals,
                        self.config.k_factor,
                        self.allow_draws,
                    );
                    self.ratings
                        .insert(record.home_team.clone(), home_rating + home_delta);
                    self.ratings
                        .insert(record.away_team.clone(), away_rating + away_delta);
                    updates += 1;
                }
                (None, None) => {}
                _ => return Err(EngineError::PartialScore { row: input_index }),
            }

            rated.push(RatedMatch {
                input_index,
                record,
                home_rating,
                away_rating,
            });
        }

        debug!(
            rows = rated.len(),
            updates,
            teams = self.ratings.len(),
            "Ratings rebuilt"
        );

        Ok(rated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarketOdds;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    fn played(day: u32, home: &str, away: &str, hg: u32, ag: u32) -> MatchRecord {
        MatchRecord::live(d(day), home, away, MarketOdds::three_way(2.0, 3.3, 3.8)).with_score(hg, ag)
    }

    fn tracker() -> SequentialRatingTracker {
        SequentialRatingTracker::new(RatingConfig::default(), true)
    }

    #[test]
    fn test_expected_score_even_ratings() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);
        // 400 points stronger → 10:1 odds
        assert!((expected_score(1900.0, 1500.0) - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_first_match_uses_default_rating() {
        let rated = tracker().process(vec![played(1, "A", "B", 2, 0)]).unwrap();
        assert_eq!(rated[0].home_rating, 1500.0);
        assert_eq!(rated[0].away_rating, 1500.0);
        assert_eq!(rated[0].rating_differential(), 0.0);
    }

    #[test]
    fn test_win_moves_ratings_by_half_k() {
        let mut t = tracker();
        t.process(vec![played(1, "A", "B", 1, 0)]).unwrap();
        assert!((t.rating("A") - 1510.0).abs() < 1e-9);
        assert!((t.rating("B") - 1490.0).abs() < 1e-9);
        assert_eq!(t.rating("unseen"), 1500.0);
    }

    #[test]
    fn test_features_never_see_own_result() {
        let history = vec![played(1, "A", "B", 3, 0), played(2, "B", "C", 1, 1)];

        let mut with_result = history.clone();
        with_result.push(played(5, "A", "C", 4, 0));
        let mut without_result = history;
        without_result.push(MatchRecord::live(d(5), "A", "C", MarketOdds::three_way(2.0, 3.3, 3.8)));

        let a = tracker().process(with_result).unwrap();
        let b = tracker().process(without_result).unwrap();

        assert_eq!(a[2].home_rating, b[2].home_rating);
        assert_eq!(a[2].away_rating, b[2].away_rating);
        assert_eq!(a[2].rating_differential(), b[2].rating_differential());
    }

    #[test]
    fn test_live_rows_do_not_update() {
        let mut t = tracker();
        let live = MatchRecord::live(d(3), "A", "B", MarketOdds::three_way(2.0, 3.3, 3.8));
        t.process(vec![played(1, "A", "B", 2, 1), live.clone(), live]).unwrap();
        assert!((t.rating("A") - 1510.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsorted_input_is_sorted_first() {
        let rows = vec![played(9, "A", "B", 0, 2), played(1, "A", "B", 2, 0)];
        let rated = tracker().process(rows).unwrap();

        assert_eq!(rated[0].record.date, d(1));
        assert_eq!(rated[0].input_index, 1);
        assert_eq!(rated[1].input_index, 0);
        // The later match sees the earlier result.
        assert!(rated[1].rating_differential() > 0.0);
    }

    #[test]
    fn test_same_date_keeps_input_order() {
        let rows = vec![
            played(4, "A", "B", 1, 0),
            played(4, "C", "D", 1, 0),
            played(4, "E", "F", 1, 0),
        ];
        let rated = tracker().process(rows).unwrap();
        let order: Vec<usize> = rated.iter().map(|r| r.input_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_rating_mass_conserved() {
        for &(ra, rb, k) in &[(1500.0, 1500.0, 20.0), (1720.5, 1380.0, 32.0), (1200.0, 1850.0, 10.0)] {
            for &(hg, ag) in &[(2u32, 0u32), (0, 1), (1, 1)] {
                for &allow_draws in &[true, false] {
                    let (dh, da) = rating_deltas(ra, rb, hg, ag, k, allow_draws);
                    assert!((dh + da).abs() < 1e-9, "deltas {dh} {da} do not cancel");
                    assert!((dh.abs() - da.abs()).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_table_mass_conserved_over_season() {
        let rows = vec![
            played(1, "A", "B", 2, 0),
            played(2, "C", "A", 1, 1),
            played(3, "B", "C", 0, 3),
            played(4, "A", "C", 2, 2),
        ];
        let mut t = tracker();
        t.process(rows).unwrap();
        let total: f64 = t.ratings().values().sum();
        assert!((total - 3.0 * 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_hockey_tie_scored_as_home_loss() {
        let (dh, da) = rating_deltas(1500.0, 1500.0, 2, 2, 20.0, false);
        assert!((dh + 10.0).abs() < 1e-9);
        assert!((da - 10.0).abs() < 1e-9);

        let (dh, da) = rating_deltas(1500.0, 1500.0, 2, 2, 20.0, true);
        assert!(dh.abs() < 1e-12);
        assert!(da.abs() < 1e-12);
    }

    #[test]
    fn test_missing_team_is_fatal() {
        let mut row = played(1, "A", "B", 1, 0);
        row.away_team = "  ".into();
        let err = tracker().process(vec![played(1, "A", "C", 1, 0), row]).unwrap_err();
        assert_eq!(err, EngineError::MissingField { row: 1, field: "away_team" });
    }

    #[test]
    fn test_partial_score_is_fatal() {
        let mut row = played(1, "A", "B", 1, 0);
        row.away_goals = None;
        let err = tracker().process(vec![row]).unwrap_err();
        assert_eq!(err, EngineError::PartialScore { row: 0 });
    }

    #[test]
    fn test_each_process_call_rebuilds() {
        let mut t = tracker();
        t.process(vec![played(1, "A", "B", 5, 0)]).unwrap();
        let rated = t.process(vec![played(2, "A", "B", 1, 0)]).unwrap();
        assert_eq!(rated[0].home_rating, 1500.0);
    }
}
