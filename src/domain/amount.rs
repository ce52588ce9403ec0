//! Amount type
//!
//! Domain primitive for the value carried by one side of a ledger entry.
//! Ledger entries never hold zero or negative amounts, so the check happens
//! once, at construction time. Values are rounded to paisa (2dp) first, the
//! scale of the `debit`/`credit` columns.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal places stored in the ledger
pub const AMOUNT_SCALE: u32 = 2;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use transport_ledger::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(5000, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(5000, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),
}

impl Amount {
    /// Create a new Amount.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if the value is <= 0 once rounded to 2dp
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        let rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(rounded.normalize()))
    }

    /// Build an Amount from the magnitude of a signed value.
    ///
    /// Used where the sign selects the posting direction (adjustments) and
    /// the entry itself must carry the absolute value.
    pub fn from_magnitude(value: Decimal) -> Result<Self, AmountError> {
        Self::new(value.abs())
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
