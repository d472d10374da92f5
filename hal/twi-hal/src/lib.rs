//! TWI Hardware Abstraction Layer
//!
//! This crate defines the hardware boundary of the TWI master driver: the
//! three peripheral registers the bus engine reads and writes, a monotonic
//! millisecond clock for timeout measurement, and the protocol status codes
//! the peripheral reports. Chip-specific HALs (ATmega328P, ...) implement
//! the traits; the bus engine in `twi-master` only ever sees the traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  twi-fram (FRAM read/write client)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twi-master (bus transaction engine)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twi-hal (this crate - traits)          │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ twi-hal-      │       │  sim (host    │
//! │  atmega328p   │       │  tests)       │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`registers::TwiRegisters`] - Control, status, data and bit-rate registers
//! - [`clock::Clock`] - Millisecond time source for poll timeouts

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod i2c;
pub mod registers;
#[cfg(feature = "sim")]
pub mod sim;
pub mod status;

// Re-export key items at crate root for convenience
pub use clock::Clock;
pub use i2c::{BusConfig, Prescaler};
pub use registers::TwiRegisters;
pub use status::{TwiStatus, STATUS_MASK};
