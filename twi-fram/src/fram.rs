//! FRAM client
//!
//! Byte and array access to an I2C FRAM through the TWI master primitives.
//!
//! # Transactions
//!
//! Write:
//! - START, SLA+W, word address (1 or 2 bytes), data bytes, STOP
//!
//! Read:
//! - START, SLA+W, word address, repeated START, SLA+R
//! - N-1 bytes received with ACK, last byte received with NACK
//! - STOP
//!
//! Before each transaction the client idles for `settle_ms` so back-to-back
//! accesses are spaced out. STOP is sent after every transaction, including
//! failed ones, so the bus is always left idle.

use heapless::Vec;
use twi_hal::{Clock, TwiRegisters};
use twi_master::{ErrorHook, ErrorKind, I2cMasterBus, NoHook};

use crate::config::{FramConfig, WordAddress};

/// FRAM access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramError {
    /// A bus step failed
    Bus(ErrorKind),
    /// Word address does not fit the configured address width
    AddressOutOfRange(u16),
    /// Requested more bytes than the result buffer holds
    BufferTooSmall,
}

impl From<ErrorKind> for FramError {
    fn from(kind: ErrorKind) -> Self {
        FramError::Bus(kind)
    }
}

impl core::fmt::Display for FramError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FramError::Bus(kind) => write!(f, "bus error: {}", kind),
            FramError::AddressOutOfRange(word) => {
                write!(f, "word address {:#06x} out of range", word)
            }
            FramError::BufferTooSmall => write!(f, "result buffer too small"),
        }
    }
}

/// FRAM device on a TWI master bus
///
/// The bus must have been initialized with the FRAM's slave address; the
/// client uses its precomputed SLA+W and SLA+R bytes.
pub struct Fram<R, C, H = NoHook> {
    bus: I2cMasterBus<R, C, H>,
    config: FramConfig,
}

impl<R, C, H> Fram<R, C, H>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    /// Create a client on an initialized bus
    pub fn new(bus: I2cMasterBus<R, C, H>, config: FramConfig) -> Self {
        Self { bus, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &FramConfig {
        &self.config
    }

    /// The underlying bus
    pub fn bus(&self) -> &I2cMasterBus<R, C, H> {
        &self.bus
    }

    /// Mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut I2cMasterBus<R, C, H> {
        &mut self.bus
    }

    /// Give back the bus
    pub fn release(self) -> I2cMasterBus<R, C, H> {
        self.bus
    }

    /// Write one byte at `word`
    pub fn write(&mut self, word: u16, byte: u8) -> Result<(), FramError> {
        self.write_array(word, &[byte])
    }

    /// Write `bytes` starting at `word`
    ///
    /// The device auto-increments its word address. An empty slice does
    /// nothing.
    pub fn write_array(&mut self, word: u16, bytes: &[u8]) -> Result<(), FramError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let address = self.config.address_mode.encode(word)?;

        self.settle();
        #[cfg(feature = "defmt")]
        defmt::trace!("FRAM write {=usize} bytes at {=u16:#x}", bytes.len(), word);

        let result = self.write_steps(&address, bytes);
        self.finish(result)
    }

    /// Read one byte at `word`
    pub fn read(&mut self, word: u16) -> Result<u8, FramError> {
        let mut byte = [0u8; 1];
        self.read_array(word, &mut byte)?;
        Ok(byte[0])
    }

    /// Fill `buffer` starting at `word`
    ///
    /// An empty buffer does nothing.
    pub fn read_array(&mut self, word: u16, buffer: &mut [u8]) -> Result<(), FramError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let address = self.config.address_mode.encode(word)?;

        self.settle();
        #[cfg(feature = "defmt")]
        defmt::trace!("FRAM read {=usize} bytes at {=u16:#x}", buffer.len(), word);

        let result = self.read_steps(&address, buffer);
        self.finish(result)
    }

    /// Read `count` bytes starting at `word` into a new vector
    pub fn read_vec<const N: usize>(
        &mut self,
        word: u16,
        count: usize,
    ) -> Result<Vec<u8, N>, FramError> {
        let mut bytes = Vec::new();
        bytes
            .resize(count, 0)
            .map_err(|_| FramError::BufferTooSmall)?;
        self.read_array(word, &mut bytes)?;
        Ok(bytes)
    }

    /// Busy-wait until more than `settle_ms` have passed
    fn settle(&self) {
        if self.config.settle_ms == 0 {
            return;
        }
        let clock = self.bus.clock();
        let reference = clock.now_ms();
        while clock.elapsed_since(reference) <= self.config.settle_ms {
            core::hint::spin_loop();
        }
    }

    /// START, SLA+W and the word address
    fn select(&mut self, address: &WordAddress) -> Result<(), ErrorKind> {
        let sla_w = self.bus.write_address();
        self.bus.start()?;
        self.bus.address_write(sla_w)?;
        for &byte in address.bytes() {
            self.bus.data_write(byte)?;
        }
        Ok(())
    }

    fn write_steps(&mut self, address: &WordAddress, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.select(address)?;
        for &byte in bytes {
            self.bus.data_write(byte)?;
        }
        Ok(())
    }

    fn read_steps(&mut self, address: &WordAddress, buffer: &mut [u8]) -> Result<(), ErrorKind> {
        self.select(address)?;

        let sla_r = self.bus.read_address();
        self.bus.repeated_start()?;
        self.bus.address_read(sla_r)?;

        if let Some((last, head)) = buffer.split_last_mut() {
            for slot in head {
                *slot = self.bus.data_read()?;
            }
            *last = self.bus.data_read_final()?;
        }
        Ok(())
    }

    /// Send STOP and merge its outcome with the transaction's
    fn finish<T>(&mut self, result: Result<T, ErrorKind>) -> Result<T, FramError> {
        let stopped = self.bus.stop();

        #[cfg(feature = "defmt")]
        if let Err(kind) = &result {
            defmt::warn!("FRAM transaction aborted: {}", kind);
        }

        let value = result?;
        stopped?;
        Ok(value)
    }
}
