//! FRAM client for the TWI master
//!
//! Byte and array reads and writes to an I2C FRAM (FM24-style parts) built
//! directly on the `twi-master` bus primitives:
//!
//! - [`Fram::write`] / [`Fram::write_array`] - one write transaction
//! - [`Fram::read`] / [`Fram::read_array`] / [`Fram::read_vec`] - write the
//!   word address, then read back with a repeated START
//!
//! Word addresses are one or two bytes wide, see [`AddressMode`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod fram;

pub use config::{AddressMode, FramConfig, WordAddress};
pub use fram::{Fram, FramError};
