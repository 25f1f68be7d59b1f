//! End-to-end sessions: CSV files → ratings → features → predictions →
//! risk gate → suggestions.

use rust_decimal_macros::dec;

use edgeguard::config::AppConfig;
use edgeguard::engine::{Session, SessionInputs};
use edgeguard::model::PrecomputedModel;
use edgeguard::storage;
use edgeguard::strategy::{DecisionRecord, SessionOutcome, SessionReport};
use edgeguard::types::{DailyRiskState, Outcome, Sport};

use crate::fixture::{hockey_day, soccer_day, Fixture};

pub fn run(cfg: &AppConfig, sport: Sport, state: &mut DailyRiskState) -> SessionReport {
    let files = cfg.data.files_for(sport);
    let inputs = SessionInputs::load(files).unwrap();
    let model = PrecomputedModel::from_csv(sport, &files.predictions).unwrap();
    let session = Session::from_config(sport, cfg, Box::new(model));
    let bankroll = state.current_bankroll();
    session.run(&inputs, state, bankroll).unwrap()
}

#[test]
fn test_soccer_session_end_to_end() {
    let fx = Fixture::new();
    let cfg = fx.config();
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);

    assert_eq!(report.outcome, SessionOutcome::Completed);
    assert_eq!(report.decisions.len(), 2);
    assert_eq!(report.suggestions.len(), 1);

    let s = &report.suggestions[0];
    assert_eq!(s.match_label, "Arsenal vs Chelsea");
    assert_eq!(s.pick, Outcome::Home);
    assert_eq!(s.odds, 2.10);
    assert!((s.edge - (0.55 - 1.0 / 2.10)).abs() < 1e-12);
    assert_eq!(s.suggested_stake, dec!(10.00));

    match &report.decisions[1] {
        DecisionRecord::Rejected { key, reason } => {
            assert_eq!(key.home_team, "Wolves");
            assert_eq!(reason.code(), "edge");
        }
        other => panic!("expected edge rejection, got {other:?}"),
    }
    assert_eq!(state.bets_placed, 1);
}

#[test]
fn test_hockey_session_end_to_end() {
    let fx = Fixture::new();
    let cfg = fx.config();
    let mut state = DailyRiskState::new(hockey_day(), dec!(2500));

    let report = run(&cfg, Sport::Hockey, &mut state);

    assert_eq!(report.suggestions.len(), 1);
    let s = &report.suggestions[0];
    assert_eq!(s.sport, Sport::Hockey);
    assert_eq!(s.pick, Outcome::Home);
    assert_eq!(s.suggested_stake, dec!(25.00));
}

#[test]
fn test_kill_switch_file_halts_before_any_evaluation() {
    let fx = Fixture::new();
    let cfg = fx.config();
    fx.write("KILL_SWITCH", "");
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);

    assert_eq!(report.outcome, SessionOutcome::Halted { at: 0, unevaluated: 2 });
    assert!(report.decisions.is_empty());
    assert!(report.suggestions.is_empty());
    assert_eq!(state.bets_placed, 0);
}

#[test]
fn test_missing_prediction_fails_only_that_candidate() {
    let fx = Fixture::new();
    fx.write(
        "predictions_soccer.csv",
        "date,home_team,away_team,p_home,p_draw,p_away\n\
         2025-03-15,Arsenal,Chelsea,0.55,0.25,0.20\n",
    );
    let cfg = fx.config();
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);

    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.outcome, SessionOutcome::Completed);
}

#[test]
fn test_suggestions_written_to_output_dir() {
    let fx = Fixture::new();
    let cfg = fx.config();
    let mut state = DailyRiskState::new(soccer_day(), cfg.safety.bankroll_start);

    let report = run(&cfg, Sport::Soccer, &mut state);
    let path = storage::append_suggestions(
        &cfg.session.output_dir,
        Sport::Soccer,
        soccer_day(),
        &report.suggestions,
    )
    .unwrap();

    let json = std::fs::read_to_string(path).unwrap();
    assert!(json.contains("\"match\": \"Arsenal vs Chelsea\""));
    assert!(json.contains("\"pick\": \"home\""));
}
