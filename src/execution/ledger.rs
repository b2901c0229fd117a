//! Position ledger
//!
//! All-in / all-out: every trade converts the entire balance of one currency
//! into the other, so after a completed trade either the quote or the base
//! balance is zero.

use super::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position state derived from the ledger balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    /// No base currency held
    Flat,
    /// Holding base currency
    Long,
}

/// Result of closing the position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedPosition {
    /// Base amount sold
    pub base_sold: Decimal,
    /// Quote received (`base_sold * price`)
    pub proceeds: Decimal,
    /// `base_sold * (price - entry_price)`, unknown without an entry price
    pub profit: Option<Decimal>,
}

/// Balances and entry price of the single open position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    quote_balance: Decimal,
    base_balance: Decimal,
    entry_price: Option<Decimal>,
}

impl Ledger {
    /// Create a ledger; an entry price is only kept while base is held
    pub fn new(quote_balance: Decimal, base_balance: Decimal, entry_price: Option<Decimal>) -> Self {
        let entry_price = if base_balance > Decimal::ZERO {
            entry_price
        } else {
            None
        };

        Self {
            quote_balance,
            base_balance,
            entry_price,
        }
    }

    /// A flat ledger holding only quote currency
    pub fn with_quote(quote_balance: Decimal) -> Self {
        Self::new(quote_balance, Decimal::ZERO, None)
    }

    /// `(quote_balance, base_balance, entry_price)`
    pub fn current_state(&self) -> (Decimal, Decimal, Option<Decimal>) {
        (self.quote_balance, self.base_balance, self.entry_price)
    }

    pub fn quote_balance(&self) -> Decimal {
        self.quote_balance
    }

    pub fn base_balance(&self) -> Decimal {
        self.base_balance
    }

    pub fn entry_price(&self) -> Option<Decimal> {
        self.entry_price
    }

    /// FLAT when no base is held, LONG otherwise
    pub fn position(&self) -> PositionState {
        if self.base_balance > Decimal::ZERO {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    /// Total value in quote currency at `price`
    pub fn equity(&self, price: Decimal) -> Decimal {
        self.quote_balance + self.base_balance * price
    }

    /// Convert the entire quote balance into base at `price`
    ///
    /// Returns the base amount acquired. The ledger is untouched on error.
    pub fn open_long(&mut self, price: Decimal) -> Result<Decimal, LedgerError> {
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(price));
        }
        if self.quote_balance <= Decimal::ZERO {
            return Err(LedgerError::NoQuoteBalance(self.quote_balance));
        }
        if self.base_balance != Decimal::ZERO {
            return Err(LedgerError::PositionAlreadyOpen(self.base_balance));
        }

        let acquired = self.quote_balance / price;
        self.base_balance = acquired;
        self.quote_balance = Decimal::ZERO;
        self.entry_price = Some(price);
        Ok(acquired)
    }

    /// Convert the entire base balance into quote at `price`
    ///
    /// Proceeds are credited once; profit is reported separately and never
    /// added to the balance a second time. The ledger is untouched on error.
    pub fn close_long(&mut self, price: Decimal) -> Result<ClosedPosition, LedgerError> {
        if price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(price));
        }
        if self.base_balance <= Decimal::ZERO {
            return Err(LedgerError::NoOpenPosition(self.base_balance));
        }

        let base_sold = self.base_balance;
        let proceeds = base_sold * price;
        let profit = self.entry_price.map(|entry| base_sold * (price - entry));

        self.quote_balance += proceeds;
        self.base_balance = Decimal::ZERO;
        self.entry_price = None;

        Ok(ClosedPosition {
            base_sold,
            proceeds,
            profit,
        })
    }
}
