//! American-odds payout arithmetic.
//!
//! Pure decimal math over signed odds: mis-rounding here corrupts the
//! bankroll ledger downstream, so every result goes through one fixed
//! rounding rule and identical inputs always reproduce bit-for-bit.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{PickResult, VerdictError};

/// Currency scale for every payout value.
const PAYOUT_SCALE: u32 = 2;

pub struct PayoutCalculator;

impl PayoutCalculator {
    /// Validate payout inputs: positive stake, |odds| >= 100.
    pub fn validate(odds: i32, stake: Decimal) -> Result<(), VerdictError> {
        if stake <= Decimal::ZERO {
            return Err(VerdictError::InvalidInput(format!(
                "stake must be positive, got {stake}"
            )));
        }
        if odds.abs() < 100 {
            return Err(VerdictError::InvalidInput(format!(
                "American odds must satisfy |odds| >= 100, got {odds}"
            )));
        }
        Ok(())
    }

    /// Net bankroll effect of a settled pick.
    ///
    /// Win: `stake × odds/100` (positive odds) or `stake × 100/|odds|`
    /// (negative odds). Push: zero, stake returned. Loss: `−stake`.
    /// An ungraded result pays zero.
    pub fn payout(result: PickResult, odds: i32, stake: Decimal) -> Result<Decimal, VerdictError> {
        match result {
            PickResult::Win => Self::win_profit(odds, stake),
            PickResult::Loss => {
                Self::validate(odds, stake)?;
                Ok(Self::round(-stake))
            }
            PickResult::Push | PickResult::Unset => Ok(Decimal::ZERO),
        }
    }

    /// Profit on a winning pick.
    pub fn win_profit(odds: i32, stake: Decimal) -> Result<Decimal, VerdictError> {
        Self::validate(odds, stake)?;
        let profit = if odds > 0 {
            stake * Decimal::from(odds) / Decimal::ONE_HUNDRED
        } else {
            stake * Decimal::ONE_HUNDRED / Decimal::from(odds.abs())
        };
        Ok(Self::round(profit))
    }

    /// The single rounding rule for currency values.
    fn round(value: Decimal) -> Decimal {
        value.round_dp_with_strategy(PAYOUT_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
