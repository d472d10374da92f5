//! Transaction phase tracking
//!
//! The phase is bookkeeping only: hardware ordering is enforced by the
//! status codes each primitive checks.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::BusPhase;
