//! Bus configuration
//!
//! Raw register values for the bit-rate generator plus the poll timeout.
//! Presets assume a 16 MHz CPU clock.

/// Bit-rate prescaler (TWPS bits of TWSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    /// Divide by 1
    Div1 = 0,
    /// Divide by 4
    Div4 = 1,
    /// Divide by 16
    Div16 = 2,
    /// Divide by 64
    Div64 = 3,
}

impl Prescaler {
    /// Get the TWPS register bits
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// TWI master configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    /// Bit rate register (TWBR) value
    pub bit_rate: u8,
    /// Bit-rate prescaler
    pub prescaler: Prescaler,
    /// Upper bound for every status poll, in milliseconds
    pub timeout_ms: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BusConfig {
    /// Standard mode (100 kHz at 16 MHz)
    pub const STANDARD: Self = Self {
        bit_rate: 72,
        prescaler: Prescaler::Div1,
        timeout_ms: 1,
    };

    /// Fast mode (400 kHz at 16 MHz)
    pub const FAST: Self = Self {
        bit_rate: 12,
        prescaler: Prescaler::Div1,
        timeout_ms: 1,
    };

    /// Same configuration with a different poll timeout
    pub const fn with_timeout_ms(self, timeout_ms: u32) -> Self {
        Self { timeout_ms, ..self }
    }
}
