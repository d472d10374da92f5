//! Bus phase state machine
//!
//! Tracks where the master is within a transaction:
//!
//! ```text
//! Idle ─start─▶ Address ─address ack─▶ Data ─data─▶ Data
//!                  ▲                     │
//!                  └───repeated start────┘
//! any ─failure─▶ Errored        any ─stop─▶ Idle
//! ```

use super::events::Event;
use crate::error::ErrorKind;

/// Transaction phase of the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusPhase {
    /// No transaction in progress
    Idle,
    /// START sent, waiting for an address byte
    Address,
    /// Slave addressed, data bytes flowing
    Data,
    /// A step failed; everything but `start` and `stop` is skipped
    Errored(ErrorKind),
}

impl BusPhase {
    /// Check if a transaction is open on the bus
    pub fn in_transaction(&self) -> bool {
        matches!(self, BusPhase::Address | BusPhase::Data)
    }

    /// Check if a failure is latched
    pub fn is_error(&self) -> bool {
        matches!(self, BusPhase::Errored(_))
    }

    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use BusPhase::*;
        use Event::*;

        match (self, event) {
            // Recovery and failure apply from every phase
            (_, Stopped) => Idle,
            (_, Failed(kind)) => Errored(kind),

            // START is never skipped, even after a failure
            (_, Started) => Address,

            (Address, AddressAcked) => Data,
            (Data, DataTransferred) => Data,
            (Data, RepeatedStart) => Address,

            // Out-of-order steps leave the phase unchanged
            (state, _) => state,
        }
    }
}
