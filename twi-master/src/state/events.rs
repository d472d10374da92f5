//! Events that trigger phase transitions

use crate::error::ErrorKind;

/// Outcome of a bus primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// START transmitted
    Started,
    /// Repeated START transmitted
    RepeatedStart,
    /// SLA+W or SLA+R acknowledged
    AddressAcked,
    /// Data byte sent or received
    DataTransferred,
    /// A step failed
    Failed(ErrorKind),
    /// STOP sent or the bus was forced back to idle
    Stopped,
}
