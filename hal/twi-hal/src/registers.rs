//! TWI register abstractions
//!
//! The master engine drives the peripheral exclusively through this trait,
//! which lets it run against memory-mapped hardware or a simulated register
//! block alike.

/// Control register (TWCR) bit masks
pub mod control {
    /// Completion flag; writing 1 clears it and starts the next operation
    pub const TWINT: u8 = 0x80;
    /// Enable acknowledge on received bytes
    pub const TWEA: u8 = 0x40;
    /// START condition request
    pub const TWSTA: u8 = 0x20;
    /// STOP condition request, cleared by hardware once sent
    pub const TWSTO: u8 = 0x10;
    /// Write collision flag
    pub const TWWC: u8 = 0x08;
    /// Peripheral enable
    pub const TWEN: u8 = 0x04;
    /// Interrupt enable
    pub const TWIE: u8 = 0x01;
}

/// TWI peripheral register block
///
/// Getters read the live register value on every call; implementations
/// backed by hardware must use volatile accesses.
pub trait TwiRegisters {
    /// Read the control register (TWCR)
    fn control(&self) -> u8;

    /// Write the control register (TWCR)
    fn set_control(&mut self, value: u8);

    /// Read the raw status register (TWSR), prescaler bits included
    fn status(&self) -> u8;

    /// Write the prescaler bits of the status register
    fn set_prescaler(&mut self, bits: u8);

    /// Read the data register (TWDR)
    fn data(&self) -> u8;

    /// Write the data register (TWDR)
    fn set_data(&mut self, value: u8);

    /// Write the bit rate register (TWBR)
    fn set_bit_rate(&mut self, value: u8);
}

impl<T: TwiRegisters + ?Sized> TwiRegisters for &mut T {
    fn control(&self) -> u8 {
        (**self).control()
    }

    fn set_control(&mut self, value: u8) {
        (**self).set_control(value)
    }

    fn status(&self) -> u8 {
        (**self).status()
    }

    fn set_prescaler(&mut self, bits: u8) {
        (**self).set_prescaler(bits)
    }

    fn data(&self) -> u8 {
        (**self).data()
    }

    fn set_data(&mut self, value: u8) {
        (**self).set_data(value)
    }

    fn set_bit_rate(&mut self, value: u8) {
        (**self).set_bit_rate(value)
    }
}
