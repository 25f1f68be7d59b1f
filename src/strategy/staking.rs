//! Stake sizing.
//!
//! Flat fraction of bankroll, rounded to cents. Edge size does not
//! scale the stake: a bigger edge from an unvalidated model is not a
//! reason to bet more.

use rust_decimal::Decimal;
use tracing::debug;

/// Flat-fraction staking configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatStake {
    /// Stake as a fraction of bankroll.
    pub fraction: Decimal,
    /// Currency precision (decimal places).
    pub precision: u32,
}

impl FlatStake {
    pub fn new(fraction: Decimal) -> Self {
        Self { fraction, precision: 2 }
    }

    /// Stake for the given bankroll. Non-positive bankrolls stake zero.
    /// Rounds half to even, like the reporting layer.
    pub fn stake(&self, bankroll: Decimal) -> Decimal {
        if bankroll <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let stake = (bankroll * self.fraction).round_dp(self.precision);
        debug!(
            bankroll = %bankroll,
            fraction = %self.fraction,
            stake = %stake,
            "Stake sized"
        );
        stake
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
