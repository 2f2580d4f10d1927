//! Manager configuration
//!
//! Every honest participant must run with the same values; they feed the
//! period clock, the sampler and the deposit check.

use crate::domain::{keccak256, Address, Wei};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// 100 ether in wei.
pub const DEFAULT_DEPOSIT_SIZE: Wei = 100_000_000_000_000_000_000;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field that must be positive is zero.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Shard manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Number of shards.
    pub shard_count: u16,
    /// Blocks per period.
    pub period_length: u64,
    /// How many periods ahead a proposer may be looked up.
    pub lookahead_periods: u64,
    /// Exact deposit a validator must lock.
    pub deposit_size: Wei,
    /// Custody account holding deposits and receipt value.
    pub manager_address: Address,
    /// Bounded capacity of the command mailbox.
    pub mailbox_capacity: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            shard_count: 100,
            period_length: 5,
            lookahead_periods: 4,
            deposit_size: DEFAULT_DEPOSIT_SIZE,
            manager_address: default_manager_address(),
            mailbox_capacity: 1024,
        }
    }
}

impl ManagerConfig {
    /// Create config for testing.
    pub fn for_testing() -> Self {
        Self {
            shard_count: 4,
            period_length: 5,
            lookahead_periods: 4,
            deposit_size: 1_000,
            manager_address: default_manager_address(),
            mailbox_capacity: 16,
        }
    }

    /// Load from `SMC_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            shard_count: lookup("SMC_SHARD_COUNT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.shard_count),

            period_length: lookup("SMC_PERIOD_LENGTH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.period_length),

            lookahead_periods: lookup("SMC_LOOKAHEAD_PERIODS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.lookahead_periods),

            deposit_size: lookup("SMC_DEPOSIT_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.deposit_size),

            manager_address: defaults.manager_address,

            mailbox_capacity: lookup("SMC_MAILBOX_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mailbox_capacity),
        }
    }

    /// Reject values the manager cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_count == 0 {
            return Err(ConfigError::Zero("shard_count"));
        }
        if self.period_length == 0 {
            return Err(ConfigError::Zero("period_length"));
        }
        if self.deposit_size == 0 {
            return Err(ConfigError::Zero("deposit_size"));
        }
        if self.mailbox_capacity == 0 {
            return Err(ConfigError::Zero("mailbox_capacity"));
        }
        Ok(())
    }

    /// Period containing `block_number`.
    pub fn period_of(&self, block_number: u64) -> u64 {
        block_number / self.period_length
    }
}

/// `keccak256("validator_manager")[12..]`
fn default_manager_address() -> Address {
    let hash = keccak256(b"validator_manager");
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_values() {
        let config = ManagerConfig::default();
        assert_eq!(config.shard_count, 100);
        assert_eq!(config.period_length, 5);
        assert_eq!(config.lookahead_periods, 4);
        assert_eq!(config.deposit_size, 10u128.pow(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_testing_is_valid() {
        assert!(ManagerConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_from_vars_overrides_and_falls_back() {
        let vars: HashMap<&str, &str> = [
            ("SMC_SHARD_COUNT", "8"),
            ("SMC_PERIOD_LENGTH", "not-a-number"),
            ("SMC_DEPOSIT_SIZE", "42"),
        ]
        .into_iter()
        .collect();

        let config = ManagerConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.shard_count, 8);
        assert_eq!(config.period_length, 5);
        assert_eq!(config.deposit_size, 42);
        assert_eq!(config.mailbox_capacity, 1024);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = ManagerConfig {
            period_length: 0,
            ..ManagerConfig::for_testing()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("period_length")));

        let config = ManagerConfig {
            shard_count: 0,
            ..ManagerConfig::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_period_of() {
        let config = ManagerConfig::for_testing();
        assert_eq!(config.period_of(0), 0);
        assert_eq!(config.period_of(4), 0);
        assert_eq!(config.period_of(5), 1);
        assert_eq!(config.period_of(23), 4);
    }
}
