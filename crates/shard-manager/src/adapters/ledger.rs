//! In-memory balance ledger
//!
//! Implements `BalanceLedger` over a map of balances behind a lock.

use crate::domain::{Address, Wei};
use crate::ports::BalanceLedger;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// In-memory balances keyed by address.
pub struct InMemoryLedger {
    balances: RwLock<HashMap<Address, Wei>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
        }
    }

    /// Mint `amount` to `account` (test and simulation funding).
    pub fn credit(&self, account: Address, amount: Wei) {
        let mut balances = self.balances.write();
        let balance = balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceLedger for InMemoryLedger {
    fn balance(&self, account: &Address) -> Wei {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Wei) -> Result<(), String> {
        let mut balances = self.balances.write();

        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(format!(
                "insufficient balance: {} has {}, needs {}",
                hex::encode(from),
                available,
                amount
            ));
        }
        if from == to {
            return Ok(());
        }

        balances.insert(*from, available - amount);
        let credited = balances.entry(*to).or_insert(0);
        *credited = credited.saturating_add(amount);

        debug!(
            "[smc] transfer {} from {} to {}",
            amount,
            hex::encode(from),
            hex::encode(to)
        );
        Ok(())
    }
}
