//! Ledger events
//!
//! Every successful state change appends one event to an append-only log.
//! Indexers read the log; the ledger never reads it back.

use crate::core::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum EventKind {
    /// Tokens moved (`from` is the zero address for the initial mint)
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Allowance set
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    /// Owner changed (`new` is the zero address after renouncing)
    OwnershipTransferred { previous: Address, new: Address },
}

/// A recorded event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerEvent {
    /// Position in the log, starting at 0
    pub seq: u64,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

/// Append-only event log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number
    pub fn record(&mut self, kind: EventKind) -> u64 {
        let seq = self.events.len() as u64;
        self.events.push(LedgerEvent {
            seq,
            kind,
            timestamp: Utc::now(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn all(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Events with `seq >= from`
    pub fn since(&self, from: u64) -> &[LedgerEvent] {
        let start = (from as usize).min(self.events.len());
        &self.events[start..]
    }

    /// The most recent `count` events, oldest first
    pub fn latest(&self, count: usize) -> &[LedgerEvent] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: u128) -> EventKind {
        EventKind::Transfer {
            from: Address::ZERO,
            to: Address::new([1; 20]),
            amount,
        }
    }

    #[test]
    fn test_record_assigns_sequence() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        assert_eq!(log.record(transfer(1)), 0);
        assert_eq!(log.record(transfer(2)), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.all()[1].kind, transfer(2));
    }

    #[test]
    fn test_since_and_latest() {
        let mut log = EventLog::new();
        for i in 0..5 {
            log.record(transfer(i));
        }

        assert_eq!(log.since(3).len(), 2);
        assert_eq!(log.since(3)[0].seq, 3);
        assert!(log.since(99).is_empty());

        let latest = log.latest(2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].seq, 3);
        assert_eq!(log.latest(10).len(), 5);
    }

    #[test]
    fn test_event_json_shape() {
        let mut log = EventLog::new();
        log.record(transfer(7));

        let json = serde_json::to_value(&log.all()[0]).unwrap();
        assert_eq!(json["seq"], 0);
        assert_eq!(json["kind"]["Transfer"]["from"], Address::ZERO.to_string());
        assert_eq!(json["kind"]["Transfer"]["amount"], 7);
    }
}
