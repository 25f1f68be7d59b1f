//! Risk gate.
//!
//! Every candidate passes through an ordered chain of guards before it
//! becomes a suggestion. The first guard that fails short-circuits the
//! chain and its rejection is the reported reason. The standard chain
//! is kill switch → allowlist → edge threshold → odds band → daily
//! limits.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::edge::EdgeEstimate;
use super::staking::FlatStake;
use crate::config::SafetyConfig;
use crate::types::{DailyRiskState, MatchRecord, Sport, Suggestion};

// ---------------------------------------------------------------------------
// Kill switch
// ---------------------------------------------------------------------------

/// External session-wide halt signal. Presence alone halts; there is
/// no payload.
pub trait KillSwitch: Send + Sync {
    fn is_active(&self) -> bool;

    /// Where the signal lives, for logs and rejection messages.
    fn describe(&self) -> String;
}

/// Kill switch backed by a marker file: active while the path exists.
#[derive(Debug, Clone)]
pub struct FileKillSwitch {
    path: PathBuf,
}

impl FileKillSwitch {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl KillSwitch for FileKillSwitch {
    fn is_active(&self) -> bool {
        self.path.exists()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process kill switch. Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct FlagKillSwitch {
    flag: Arc<AtomicBool>,
}

impl FlagKillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl KillSwitch for FlagKillSwitch {
    fn is_active(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "in-process flag".to_string()
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// Why a candidate was not admitted. These are routine outcomes, not
/// errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// Halts the whole session, not just this candidate.
    #[error("kill switch active ({marker})")]
    KillSwitch { marker: String },

    #[error("{home} vs {away} not in team allowlist")]
    NotAllowlisted { home: String, away: String },

    #[error("edge {edge:.4} below threshold {threshold:.4}")]
    EdgeBelowThreshold { edge: f64, threshold: f64 },

    #[error("odds {odds} outside [{min}, {max}]")]
    OddsOutOfBand { odds: f64, min: f64, max: f64 },

    #[error("daily bet limit reached: {placed}/{max}")]
    DailyBetLimit { placed: u32, max: u32 },

    #[error("daily loss limit reached: loss ratio {loss_ratio} >= {limit}")]
    DailyLossLimit { loss_ratio: Decimal, limit: Decimal },
}

impl Rejection {
    /// Short stable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::KillSwitch { .. } => "kill_switch",
            Rejection::NotAllowlisted { .. } => "allowlist",
            Rejection::EdgeBelowThreshold { .. } => "edge",
            Rejection::OddsOutOfBand { .. } => "odds",
            Rejection::DailyBetLimit { .. } => "daily_bets",
            Rejection::DailyLossLimit { .. } => "daily_loss",
        }
    }

    /// Whether evaluation of the remaining candidates must stop.
    pub fn halts_session(&self) -> bool {
        matches!(self, Rejection::KillSwitch { .. })
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Everything a guard may look at. Read-only.
pub struct GuardContext<'a> {
    pub record: &'a MatchRecord,
    pub estimate: &'a EdgeEstimate,
    pub state: &'a DailyRiskState,
    pub bankroll: Decimal,
}

/// One veto condition in the chain.
pub trait Guard: Send + Sync {
    /// Name for logging and for inspecting the chain order.
    fn name(&self) -> &'static str;

    /// Part of the check that needs no candidate. Runs for every
    /// candidate before anything about it is computed.
    fn precheck(&self) -> Result<(), Rejection> {
        Ok(())
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection>;
}

pub struct KillSwitchGuard {
    switch: Box<dyn KillSwitch>,
}

impl KillSwitchGuard {
    pub fn new(switch: impl KillSwitch + 'static) -> Self {
        Self { switch: Box::new(switch) }
    }
}

impl Guard for KillSwitchGuard {
    fn name(&self) -> &'static str {
        "kill_switch"
    }

    fn precheck(&self) -> Result<(), Rejection> {
        if self.switch.is_active() {
            return Err(Rejection::KillSwitch {
                marker: self.switch.describe(),
            });
        }
        Ok(())
    }

    /// The switch is consulted in `precheck` only, once per candidate.
    fn check(&self, _ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        Ok(())
    }
}

/// Both teams must be listed. An empty list admits everyone.
pub struct AllowlistGuard {
    teams: HashSet<String>,
}

impl AllowlistGuard {
    pub fn new<I, S>(teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            teams: teams.into_iter().map(Into::into).collect(),
        }
    }
}

impl Guard for AllowlistGuard {
    fn name(&self) -> &'static str {
        "allowlist"
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        if self.teams.is_empty() {
            return Ok(());
        }
        let r = ctx.record;
        if self.teams.contains(&r.home_team) && self.teams.contains(&r.away_team) {
            Ok(())
        } else {
            Err(Rejection::NotAllowlisted {
                home: r.home_team.clone(),
                away: r.away_team.clone(),
            })
        }
    }
}

pub struct EdgeThresholdGuard {
    threshold: f64,
}

impl EdgeThresholdGuard {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Guard for EdgeThresholdGuard {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        let edge = ctx.estimate.edge();
        if edge >= self.threshold {
            Ok(())
        } else {
            Err(Rejection::EdgeBelowThreshold {
                edge,
                threshold: self.threshold,
            })
        }
    }
}

/// Inclusive band on the chosen outcome's odds.
pub struct OddsBandGuard {
    min: f64,
    max: f64,
}

impl OddsBandGuard {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl Guard for OddsBandGuard {
    fn name(&self) -> &'static str {
        "odds"
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        let odds = ctx.estimate.odds();
        if odds >= self.min && odds <= self.max {
            Ok(())
        } else {
            Err(Rejection::OddsOutOfBand {
                odds,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Bet count and loss-ratio limits for the day.
///
/// The loss ratio is measured against `state.start_bankroll` using the
/// bankroll passed in for this evaluation; it must stay strictly below
/// the limit. A non-positive start bankroll leaves the loss check open.
pub struct DailyLimitGuard {
    max_bets: u32,
    loss_limit: Decimal,
}

impl DailyLimitGuard {
    pub fn new(max_bets: u32, loss_limit: Decimal) -> Self {
        Self { max_bets, loss_limit }
    }
}

impl Guard for DailyLimitGuard {
    fn name(&self) -> &'static str {
        "daily_limits"
    }

    fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        let state = ctx.state;
        if state.bets_placed >= self.max_bets {
            return Err(Rejection::DailyBetLimit {
                placed: state.bets_placed,
                max: self.max_bets,
            });
        }
        if state.start_bankroll <= Decimal::ZERO {
            return Ok(());
        }
        let loss_ratio = (state.start_bankroll - ctx.bankroll) / state.start_bankroll;
        if loss_ratio < self.loss_limit {
            Ok(())
        } else {
            Err(Rejection::DailyLossLimit {
                loss_ratio,
                limit: self.loss_limit,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Ordered guard chain plus stake sizing.
pub struct RiskGate {
    guards: Vec<Box<dyn Guard>>,
    staking: FlatStake,
}

impl RiskGate {
    /// Empty chain (admits everything) with the given staking rule.
    pub fn new(staking: FlatStake) -> Self {
        Self {
            guards: Vec::new(),
            staking,
        }
    }

    /// The standard chain for a safety configuration.
    pub fn from_config(config: &SafetyConfig, kill_switch: impl KillSwitch + 'static) -> Self {
        let mut gate = Self::new(FlatStake::new(config.max_bet_pct));
        gate.add_guard(KillSwitchGuard::new(kill_switch));
        gate.add_guard(AllowlistGuard::new(config.allowed_teams.iter().cloned()));
        gate.add_guard(EdgeThresholdGuard::new(config.edge_threshold));
        gate.add_guard(OddsBandGuard::new(config.min_odds, config.max_odds));
        gate.add_guard(DailyLimitGuard::new(
            config.max_bets_per_day,
            config.daily_loss_limit_pct,
        ));
        gate
    }

    /// Append a guard to the end of the chain.
    pub fn add_guard(&mut self, guard: impl Guard + 'static) {
        self.guards.push(Box::new(guard));
    }

    /// Guard names in evaluation order.
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Candidate-independent checks (the kill switch), in chain order.
    pub fn precheck(&self) -> Result<(), Rejection> {
        for guard in &self.guards {
            guard.precheck()?;
        }
        Ok(())
    }

    /// Run the whole chain without touching state.
    pub fn check(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        self.precheck()?;
        self.check_candidate(ctx)
    }

    fn check_candidate(&self, ctx: &GuardContext<'_>) -> Result<(), Rejection> {
        for guard in &self.guards {
            guard.check(ctx)?;
        }
        Ok(())
    }

    /// Run the chain and, on success, size the bet and count it against
    /// the day.
    pub fn admit(
        &self,
        sport: Sport,
        record: &MatchRecord,
        estimate: &EdgeEstimate,
        state: &mut DailyRiskState,
        bankroll: Decimal,
    ) -> Result<Suggestion, Rejection> {
        self.precheck()?;
        self.admit_prechecked(sport, record, estimate, state, bankroll)
    }

    /// `admit` for a caller that already ran `precheck` for this
    /// candidate.
    pub fn admit_prechecked(
        &self,
        sport: Sport,
        record: &MatchRecord,
        estimate: &EdgeEstimate,
        state: &mut DailyRiskState,
        bankroll: Decimal,
    ) -> Result<Suggestion, Rejection> {
        let ctx = GuardContext {
            record,
            estimate,
            state,
            bankroll,
        };
        if let Err(rejection) = self.check_candidate(&ctx) {
            debug!(
                fixture = %record.label(),
                reason = rejection.code(),
                detail = %rejection,
                "Candidate rejected"
            );
            return Err(rejection);
        }

        let suggestion = Suggestion {
            sport,
            date: record.date,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            match_label: record.label(),
            pick: estimate.outcome(),
            odds: estimate.odds(),
            edge: estimate.edge(),
            suggested_stake: self.staking.stake(bankroll),
        };
        state.record_admission(record.key());
        Ok(suggestion)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
