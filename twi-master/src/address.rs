//! Slave addressing

/// Bit 0 of the address byte selects the transfer direction
const RW_BIT: u8 = 0x01;

/// Validated 7-bit slave address
///
/// The two on-wire forms (SLA+W and SLA+R) are derived once and reused for
/// every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveAddress(u8);

impl SlaveAddress {
    /// Create an address, or `None` if it does not fit in 7 bits
    pub const fn new(address: u8) -> Option<Self> {
        if address > 0x7F {
            None
        } else {
            Some(Self(address))
        }
    }

    /// The 7-bit address
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Address byte for a write transfer (SLA+W)
    pub const fn write(self) -> u8 {
        (self.0 << 1) & !RW_BIT
    }

    /// Address byte for a read transfer (SLA+R)
    pub const fn read(self) -> u8 {
        (self.0 << 1) | RW_BIT
    }
}

impl TryFrom<u8> for SlaveAddress {
    type Error = u8;

    fn try_from(address: u8) -> Result<Self, Self::Error> {
        Self::new(address).ok_or(address)
    }
}
