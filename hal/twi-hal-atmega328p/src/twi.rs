//! TWI register block for ATmega328P
//!
//! Register map (data space addresses):
//!
//! | Register | Address |
//! |----------|---------|
//! | TWBR     | 0xB8    |
//! | TWSR     | 0xB9    |
//! | TWDR     | 0xBB    |
//! | TWCR     | 0xBC    |

use twi_hal::TwiRegisters;

/// The address of the 2-wire bit rate register
pub const TWBR: *mut u8 = 0x00B8 as *mut u8;

/// The address of the 2-wire status register
pub const TWSR: *mut u8 = 0x00B9 as *mut u8;

/// The address of the 2-wire data register
pub const TWDR: *mut u8 = 0x00BB as *mut u8;

/// The address of the 2-wire control register
pub const TWCR: *mut u8 = 0x00BC as *mut u8;

/// Writable bits of TWSR
const TWPS_MASK: u8 = 0x03;

/// Handle to the hardware 2-wire interface
///
/// Only one handle may exist at a time; the master engine assumes it is
/// the sole user of the registers.
pub struct Atmega328pTwi {
    _private: (),
}

impl Atmega328pTwi {
    /// Create a handle to the TWI registers
    ///
    /// # Safety
    ///
    /// The caller must ensure no other handle to the TWI peripheral is alive
    /// and that the code runs on an ATmega328P (or a part with the same
    /// register map).
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl TwiRegisters for Atmega328pTwi {
    fn control(&self) -> u8 {
        // SAFETY: TWCR is a valid MMIO register on this part
        unsafe { TWCR.read_volatile() }
    }

    fn set_control(&mut self, value: u8) {
        // SAFETY: see `control`
        unsafe { TWCR.write_volatile(value) }
    }

    fn status(&self) -> u8 {
        // SAFETY: TWSR is a valid MMIO register on this part
        unsafe { TWSR.read_volatile() }
    }

    fn set_prescaler(&mut self, bits: u8) {
        // SAFETY: only the prescaler bits of TWSR are writable
        unsafe { TWSR.write_volatile(bits & TWPS_MASK) }
    }

    fn data(&self) -> u8 {
        // SAFETY: TWDR is a valid MMIO register on this part
        unsafe { TWDR.read_volatile() }
    }

    fn set_data(&mut self, value: u8) {
        // SAFETY: see `data`
        unsafe { TWDR.write_volatile(value) }
    }

    fn set_bit_rate(&mut self, value: u8) {
        // SAFETY: TWBR is a valid MMIO register on this part
        unsafe { TWBR.write_volatile(value) }
    }
}
