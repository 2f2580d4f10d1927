//! In-memory event log
//!
//! Implements `EventLog`; watchers read entries back in append order.

use crate::domain::{LogEntry, LogTopic};
use crate::ports::EventLog;
use parking_lot::RwLock;

/// Append-only in-memory log.
pub struct InMemoryEventLog {
    entries: RwLock<Vec<LogEntry>>,
}

impl InMemoryEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// All entries in append order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// Entries whose signature topic is `topic`.
    pub fn with_topic(&self, topic: LogTopic) -> Vec<LogEntry> {
        let hash = topic.hash();
        self.entries
            .read()
            .iter()
            .filter(|e| e.signature_topic() == Some(&hash))
            .cloned()
            .collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, entry: LogEntry) {
        self.entries.write().push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_filters() {
        let log = InMemoryEventLog::new();
        log.append(LogEntry::new(1, vec![LogTopic::Deposit.hash()], vec![0]));
        log.append(LogEntry::new(2, vec![LogTopic::TxToShard.hash()], vec![1]));
        log.append(LogEntry::new(3, vec![LogTopic::Deposit.hash()], vec![2]));

        assert_eq!(log.len(), 3);
        let deposits = log.with_topic(LogTopic::Deposit);
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].block_number, 1);
        assert_eq!(deposits[1].block_number, 3);
        assert!(log.with_topic(LogTopic::Withdraw).is_empty());
    }
}
