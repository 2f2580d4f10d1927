//! # Shard Manager Metrics
//!
//! Prometheus counters for the manager's state transitions.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! shard-manager = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `smc_deposits_total` - Validators registered
//! - `smc_withdrawals_total` - Validators withdrawn
//! - `smc_headers_accepted_total` - Collation headers accepted
//! - `smc_receipts_created_total` - Cross-shard receipts created
//! - `smc_operations_rejected_total` - Rejected commands (by error kind)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Validators registered
    pub static ref DEPOSITS: IntCounter = register_int_counter!(
        "smc_deposits_total",
        "Total number of validator deposits"
    )
    .expect("Failed to create DEPOSITS metric");

    /// Validators withdrawn
    pub static ref WITHDRAWALS: IntCounter = register_int_counter!(
        "smc_withdrawals_total",
        "Total number of validator withdrawals"
    )
    .expect("Failed to create WITHDRAWALS metric");

    /// Collation headers accepted
    pub static ref HEADERS_ACCEPTED: IntCounter = register_int_counter!(
        "smc_headers_accepted_total",
        "Total number of collation headers accepted"
    )
    .expect("Failed to create HEADERS_ACCEPTED metric");

    /// Cross-shard receipts created
    pub static ref RECEIPTS_CREATED: IntCounter = register_int_counter!(
        "smc_receipts_created_total",
        "Total number of cross-shard receipts created"
    )
    .expect("Failed to create RECEIPTS_CREATED metric");

    /// Rejected commands, labeled by error kind
    pub static ref OPERATIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "smc_operations_rejected_total",
        "Total number of rejected commands",
        &["command", "kind"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");
}

/// Record a validator deposit
#[cfg(feature = "metrics")]
pub fn record_deposit() {
    DEPOSITS.inc();
}

/// Record a validator withdrawal
#[cfg(feature = "metrics")]
pub fn record_withdrawal() {
    WITHDRAWALS.inc();
}

/// Record an accepted header
#[cfg(feature = "metrics")]
pub fn record_header_accepted() {
    HEADERS_ACCEPTED.inc();
}

/// Record a created receipt
#[cfg(feature = "metrics")]
pub fn record_receipt_created() {
    RECEIPTS_CREATED.inc();
}

/// Record a rejected command
#[cfg(feature = "metrics")]
pub fn record_rejected(command: &str, kind: &str) {
    OPERATIONS_REJECTED.with_label_values(&[command, kind]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_deposit() {}

#[cfg(not(feature = "metrics"))]
pub fn record_withdrawal() {}

#[cfg(not(feature = "metrics"))]
pub fn record_header_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_receipt_created() {}

#[cfg(not(feature = "metrics"))]
pub fn record_rejected(_command: &str, _kind: &str) {}
