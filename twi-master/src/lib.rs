//! Polling TWI (I2C) master bus engine
//!
//! This crate drives a master-mode TWI peripheral through the individual
//! steps of an I2C transaction:
//!
//! - START / repeated START
//! - SLA+W and SLA+R address phases
//! - Data bytes out, data bytes in (ACK and final NACK)
//! - STOP
//!
//! Every step busy-polls the peripheral with a timeout, checks the status
//! code against the one the protocol expects and latches the first failure.
//! The hardware is reached only through the `twi-hal` traits, so the engine
//! runs unchanged against real registers or a simulated peripheral.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod address;
pub mod bus;
pub mod error;
pub mod hook;
pub mod state;
pub mod transaction;

pub use address::SlaveAddress;
pub use bus::I2cMasterBus;
pub use error::{ErrorKind, Step, TransactionError};
pub use hook::{ErrorHook, NoHook};
pub use state::BusPhase;
pub use twi_hal::BusConfig;
