//! ATmega328P-specific HAL for the TWI master driver
//!
//! This crate provides ATmega328P implementations of the `twi-hal` traits:
//!
//! - [`twi::Atmega328pTwi`] - the memory-mapped TWI register block
//! - [`clock::MillisCounter`] - a millisecond counter advanced from a timer ISR
//!
//! The ATmega2560 maps its TWI registers at the same addresses, so the
//! register block works unchanged on that part.
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! ```ignore
//! static MILLIS: MillisCounter = MillisCounter::new();
//!
//! // In the 1 kHz timer compare ISR:
//! MILLIS.tick();
//!
//! let twi = unsafe { Atmega328pTwi::steal() };
//! ```

#![no_std]

pub mod clock;
pub mod twi;

pub use clock::MillisCounter;
pub use twi::Atmega328pTwi;

// Re-export shared items from twi-hal
pub use twi_hal::{BusConfig, Clock, TwiRegisters};
