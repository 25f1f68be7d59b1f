//! EDGEGUARD: risk-gated bet suggestion engine.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the day's risk state, runs one session per enabled sport and
//! prints the alerts-only suggestion list. With
//! `session.poll_interval_secs` set, re-runs on that interval until
//! Ctrl+C.

use anyhow::Result;
use chrono::Local;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use edgeguard::config::{self, AppConfig};
use edgeguard::engine::{Session, SessionInputs};
use edgeguard::model::PrecomputedModel;
use edgeguard::storage;
use edgeguard::strategy::{SessionOutcome, SessionReport};
use edgeguard::types::{DailyRiskState, Sport, Suggestion};

const BANNER: &str = r#"
 _____ ____   ____ _____ ____ _   _    _    ____  ____
| ____|  _ \ / ___| ____/ ___| | | |  / \  |  _ \|  _ \
|  _| | | | | |  _|  _|| |  _| | | | / _ \ | |_) | | | |
| |___| |_| | |_| | |__| |_| | |_| |/ ___ \|  _ <| |_| |
|_____|____/ \____|_____\____|\___//_/   \_\_| \_\____/

  Risk-gated bet suggestions (alerts only)
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("EDGEGUARD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load_or_default(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        bankroll_start = %cfg.safety.bankroll_start,
        max_bet_pct = %cfg.safety.max_bet_pct,
        edge_threshold = cfg.safety.edge_threshold,
        max_bets_per_day = cfg.safety.max_bets_per_day,
        kill_switch = %cfg.safety.kill_switch_path,
        "EDGEGUARD starting up"
    );
    debug!(
        seed = cfg.model.random_seed,
        n_estimators = cfg.model.n_estimators,
        max_depth = cfg.model.max_depth,
        "Model hyperparameters (training side only)"
    );

    if !cfg.safety.alerts_only {
        warn!("alerts_only = false has no effect: no order placement exists, running alerts-only");
    }

    let Some(secs) = cfg.session.poll_interval_secs else {
        return run_once(&cfg);
    };

    // -- Poll loop -------------------------------------------------------

    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval_secs = secs, "Entering poll loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let run_cfg = cfg.clone();
                match tokio::task::spawn_blocking(move || run_once(&run_cfg)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(error = %format!("{e:#}"), "Run failed, continuing to next"),
                    Err(e) => error!(error = %e, "Run task panicked, continuing to next"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("EDGEGUARD shut down cleanly.");
    Ok(())
}

/// One pass over every enabled sport, sharing the day's risk state.
fn run_once(cfg: &AppConfig) -> Result<()> {
    let today = Local::now().date_naive();
    let state_file = cfg.session.state_file.as_str();
    let mut state = storage::state_for_day(Some(state_file), today, cfg.safety.bankroll_start)?;

    let mut suggestions: Vec<Suggestion> = Vec::new();
    for &sport in Sport::ALL {
        if !cfg.safety.sport_enabled(sport) {
            info!(sport = %sport, "Market disabled, skipping");
            continue;
        }

        match run_sport(cfg, sport, &mut state) {
            Ok(report) => {
                let dir = &cfg.session.output_dir;
                if let Err(e) = storage::append_suggestions(dir, sport, today, &report.suggestions) {
                    // Admissions are already counted; the state below must still be saved.
                    error!(sport = %sport, error = %format!("{e:#}"), "Failed to write suggestions");
                }
                suggestions.extend(report.suggestions);
                if let SessionOutcome::Halted { unevaluated, .. } = report.outcome {
                    warn!(sport = %sport, unevaluated, "Kill switch active, skipping remaining sports");
                    break;
                }
            }
            Err(e) => {
                error!(sport = %sport, error = %format!("{e:#}"), "Session failed");
            }
        }
    }

    storage::save_state(&state, Some(state_file))?;
    print_suggestions(&suggestions, &state);
    Ok(())
}

fn run_sport(cfg: &AppConfig, sport: Sport, state: &mut DailyRiskState) -> Result<SessionReport> {
    let files = cfg.data.files_for(sport);
    let inputs = SessionInputs::load(files)?;
    let model = PrecomputedModel::from_csv(sport, &files.predictions)?;
    let session = Session::from_config(sport, cfg, Box::new(model));

    // Stakes and the loss check use the bankroll as of the last settled result.
    let bankroll = state.current_bankroll();
    Ok(session.run(&inputs, state, bankroll)?)
}

fn print_suggestions(suggestions: &[Suggestion], state: &DailyRiskState) {
    println!("=== SAFE BET SUGGESTIONS (ALERTS ONLY) ===");
    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for s in suggestions {
        println!("{s}");
    }
    println!("Daily state: {state}");
}

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "edgeguard=info";

/// Any value switches the console output to one JSON object per event.
const JSON_LOG_ENV: &str = "EDGEGUARD_LOG_JSON";

/// Console logging for one-shot runs and the poll loop. `RUST_LOG`
/// overrides the default filter. JSON lines also carry the thread id of
/// the blocking worker a poll tick ran on.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = fmt().with_env_filter(filter).with_target(true);

    if std::env::var_os(JSON_LOG_ENV).is_some() {
        subscriber.json().with_thread_ids(true).init();
    } else {
        subscriber.init();
    }
}
