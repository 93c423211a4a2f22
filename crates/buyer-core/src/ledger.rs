//! Budget ledger

use thiserror::Error;

/// A purchase the ledger refused because the balance was too low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("price {price} exceeds remaining budget {balance}")]
pub struct InsufficientFunds {
    pub price: u64,
    pub balance: u64,
}

/// Running budget of the buyer. The balance can only shrink through
/// [`Ledger::spend`], which never takes it below zero.
#[derive(Debug, Clone)]
pub struct Ledger {
    balance: u64,
}

impl Ledger {
    pub fn new(budget: u64) -> Self {
        Self { balance: budget }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn can_afford(&self, price: u64) -> bool {
        price <= self.balance
    }

    /// Deduct `price`, returning the new balance
    pub fn spend(&mut self, price: u64) -> Result<u64, InsufficientFunds> {
        if !self.can_afford(price) {
            return Err(InsufficientFunds {
                price,
                balance: self.balance,
            });
        }
        self.balance -= price;
        Ok(self.balance)
    }
}
