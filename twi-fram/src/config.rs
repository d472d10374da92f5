//! FRAM access configuration

use crate::fram::FramError;

/// Width of the word address sent after SLA+W
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// One address byte (parts up to 256 bytes)
    EightBit,
    /// Two address bytes, high byte first
    SixteenBit,
}

/// Encoded word address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordAddress {
    bytes: [u8; 2],
    len: usize,
}

impl WordAddress {
    /// Bytes to transmit, in wire order
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl AddressMode {
    /// Encode `word` for the wire
    ///
    /// Fails with [`FramError::AddressOutOfRange`] if `word` does not fit in
    /// one byte in [`AddressMode::EightBit`] mode.
    pub fn encode(self, word: u16) -> Result<WordAddress, FramError> {
        match self {
            AddressMode::EightBit => {
                let byte = u8::try_from(word).map_err(|_| FramError::AddressOutOfRange(word))?;
                Ok(WordAddress {
                    bytes: [byte, 0],
                    len: 1,
                })
            }
            AddressMode::SixteenBit => Ok(WordAddress {
                bytes: word.to_be_bytes(),
                len: 2,
            }),
        }
    }
}

/// FRAM client configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramConfig {
    /// Word address width
    pub address_mode: AddressMode,
    /// Idle time before every transaction, in milliseconds
    pub settle_ms: u32,
}

impl Default for FramConfig {
    fn default() -> Self {
        Self {
            address_mode: AddressMode::EightBit,
            settle_ms: 10,
        }
    }
}
