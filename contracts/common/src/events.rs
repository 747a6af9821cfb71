//! Events for FundMe
//!
//! Events are emitted during contract execution and can be indexed
//! off-chain. They are the only record of what an operation did besides
//! the resulting state.

use crate::Vec;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use crate::types::Address;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Ledger Events (0x01 - 0x1F)
    Funded = 0x01,
    Withdrawn = 0x02,

    // Price Feed Events (0x60 - 0x7F)
    AnswerUpdated = 0x60,
    NewRound = 0x61,
    FeedOperatorChanged = 0x62,
}

/// Main event enum containing all FundMe events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum FundMeEvent {
    // ============ Ledger Events ============

    /// Emitted when a contribution is accepted
    Funded {
        funder: Address,
        amount: u128,
        usd_value: u128,
        total_funded: u128,
        balance: u128,
    },

    /// Emitted when the owner withdraws the balance
    Withdrawn {
        owner: Address,
        amount: u128,
        funders_cleared: u64,
        cached_roster: bool,
    },

    // ============ Price Feed Events ============

    /// Emitted when the feed publishes an answer
    AnswerUpdated {
        current: i128,
        round_id: u64,
        updated_at: u64,
    },

    /// Emitted when a new round starts
    NewRound {
        round_id: u64,
        started_by: Address,
        started_at: u64,
    },

    /// Emitted when the feed operator changes
    FeedOperatorChanged {
        old_operator: Address,
        new_operator: Address,
    },
}

impl FundMeEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Funded { .. } => EventType::Funded,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::AnswerUpdated { .. } => EventType::AnswerUpdated,
            Self::NewRound { .. } => EventType::NewRound,
            Self::FeedOperatorChanged { .. } => EventType::FeedOperatorChanged,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting multiple events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<FundMeEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: FundMeEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[FundMeEvent] {
        &self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&FundMeEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&FundMeEvent> {
        self.events.last()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Move every event of `other` to the end of this log
    pub fn append(&mut self, other: &mut EventLog) {
        self.events.append(&mut other.events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = FundMeEvent::Funded {
            funder: [1u8; 32],
            amount: 50_000_000_000_000_000,
            usd_value: 100_000_000_000_000_000_000,
            total_funded: 50_000_000_000_000_000,
            balance: 50_000_000_000_000_000,
        };

        assert_eq!(event.event_type(), EventType::Funded);
    }

    #[test]
    fn test_event_serialization() {
        let event = FundMeEvent::Withdrawn {
            owner: [1u8; 32],
            amount: 250_000_000_000_000_000,
            funders_cleared: 5,
            cached_roster: true,
        };

        let bytes = event.to_bytes();
        let restored = FundMeEvent::from_bytes(&bytes).unwrap();

        assert_eq!(event, restored);
    }

    #[test]
    fn test_event_log_append() {
        let mut log = EventLog::new();
        let mut nested = EventLog::new();

        log.emit(FundMeEvent::NewRound {
            round_id: 1,
            started_by: [2u8; 32],
            started_at: 10,
        });
        log.emit(FundMeEvent::AnswerUpdated {
            current: 2_000_00000000,
            round_id: 1,
            updated_at: 10,
        });
        nested.emit(FundMeEvent::Withdrawn {
            owner: [1u8; 32],
            amount: 0,
            funders_cleared: 0,
            cached_roster: false,
        });

        log.append(&mut nested);

        assert!(nested.is_empty());
        assert_eq!(log.len(), 3);
        assert_eq!(log.filter_by_type(EventType::Withdrawn).len(), 1);
        assert_eq!(log.last().map(|e| e.event_type()), Some(EventType::Withdrawn));
    }
}
