//! Daily limits and allowlist enforced through full sessions.

use rust_decimal_macros::dec;

use edgeguard::storage;
use edgeguard::strategy::DecisionRecord;
use edgeguard::types::{DailyRiskState, Sport};

use crate::fixture::{soccer_day, Fixture};
use crate::session_flow::run;

/// Both soccer fixtures carry a clear edge.
const GENEROUS_PREDICTIONS: &str = "\
date,home_team,away_team,p_home,p_draw,p_away
2025-03-15,Arsenal,Chelsea,0.55,0.25,0.20
2025-03-15,Wolves,Everton,0.50,0.25,0.25
";

/// The same slate with two more edged fixtures posted later in the day.
const LATER_LIVE: &str = "\
date,season,home_team,away_team,home_odds,draw_odds,away_odds,home_goals,away_goals,home_rest,away_rest
2025-03-15,2024,Arsenal,Chelsea,2.10,3.40,3.60,,,7,6
2025-03-15,2024,Wolves,Everton,2.50,3.20,2.90,,,7,7
2025-03-15,2024,Leeds,Fulham,2.10,3.40,3.60,,,7,7
2025-03-15,2024,Spurs,Villa,2.10,3.40,3.60,,,7,7
";

const LATER_PREDICTIONS: &str = "\
date,home_team,away_team,p_home,p_draw,p_away
2025-03-15,Arsenal,Chelsea,0.55,0.25,0.20
2025-03-15,Wolves,Everton,0.50,0.25,0.25
2025-03-15,Leeds,Fulham,0.55,0.25,0.20
2025-03-15,Spurs,Villa,0.55,0.25,0.20
";

fn codes(decisions: &[DecisionRecord]) -> Vec<&'static str> {
    decisions
        .iter()
        .map(|d| match d {
            DecisionRecord::Admitted(_) => "admitted",
            DecisionRecord::Rejected { reason, .. } => reason.code(),
            DecisionRecord::Failed { .. } => "failed",
            DecisionRecord::AlreadySuggested { .. } => "duplicate",
        })
        .collect()
}

#[test]
fn test_bet_limit_carries_across_runs_of_the_same_day() {
    let fx = Fixture::new();
    fx.write("predictions_soccer.csv", GENEROUS_PREDICTIONS);
    let mut cfg = fx.config();
    cfg.safety.max_bets_per_day = 3;
    let state_file = cfg.session.state_file.clone();

    let mut state =
        storage::state_for_day(Some(&state_file), soccer_day(), cfg.safety.bankroll_start).unwrap();
    let first = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(codes(&first.decisions), vec!["admitted", "admitted"]);
    storage::save_state(&state, Some(&state_file)).unwrap();

    let mut state =
        storage::state_for_day(Some(&state_file), soccer_day(), cfg.safety.bankroll_start).unwrap();
    assert_eq!(state.bets_placed, 2);
    assert_eq!(state.suggested.len(), 2);

    // Same fixtures are not suggested twice; the new ones spend the rest.
    fx.write("live_odds_soccer.csv", LATER_LIVE);
    fx.write("predictions_soccer.csv", LATER_PREDICTIONS);
    let second = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(
        codes(&second.decisions),
        vec!["duplicate", "duplicate", "admitted", "daily_bets"]
    );
    assert_eq!(second.suggestions[0].home_team, "Leeds");
    assert_eq!(state.bets_placed, 3);
}

#[test]
fn test_suggestion_file_accumulates_over_the_day() {
    let fx = Fixture::new();
    let cfg = fx.config();
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let first = run(&cfg, Sport::Soccer, &mut state);
    let dir = &cfg.session.output_dir;
    storage::append_suggestions(dir, Sport::Soccer, soccer_day(), &first.suggestions).unwrap();

    let again = run(&cfg, Sport::Soccer, &mut state);
    assert!(again.suggestions.is_empty());
    let path =
        storage::append_suggestions(dir, Sport::Soccer, soccer_day(), &again.suggestions).unwrap();

    let json = std::fs::read_to_string(path).unwrap();
    assert_eq!(json.matches("Arsenal vs Chelsea").count(), 1);
    assert_eq!(state.bets_placed, 1);
}

#[test]
fn test_daily_loss_limit_boundary() {
    let fx = Fixture::new();
    let cfg = fx.config();

    // 5% of 1000 lost: at the limit, rejected.
    let mut state = DailyRiskState::new(soccer_day(), dec!(1000));
    state.record_result(dec!(-50));
    let report = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(codes(&report.decisions), vec!["daily_loss", "edge"]);

    // One cent short of the limit: admitted, stake on the reduced bankroll.
    let mut state = DailyRiskState::new(soccer_day(), dec!(1000));
    state.record_result(dec!(-49.99));
    let report = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(report.suggestions[0].suggested_stake, dec!(9.50));
}

#[test]
fn test_allowlist_from_config() {
    let fx = Fixture::new();
    fx.write("predictions_soccer.csv", GENEROUS_PREDICTIONS);
    let mut cfg = fx.config();
    cfg.safety.allowed_teams = vec!["Wolves".into(), "Everton".into()];
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(codes(&report.decisions), vec!["allowlist", "admitted"]);
    assert_eq!(report.suggestions[0].home_team, "Wolves");
}

#[test]
fn test_odds_band_from_config() {
    let fx = Fixture::new();
    let mut cfg = fx.config();
    cfg.safety.max_odds = 2.0;
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);
    assert_eq!(codes(&report.decisions), vec!["odds", "edge"]);
}
