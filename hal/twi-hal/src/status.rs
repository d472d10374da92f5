//! TWI status codes
//!
//! The top five bits of the status register report what the peripheral just
//! did. Only the master-mode codes are modelled; slave-mode codes decode to
//! `None`.

/// Mask selecting the status bits of TWSR (prescaler bits excluded)
pub const STATUS_MASK: u8 = 0xF8;

/// Master-mode status values of the 2-wire status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TwiStatus {
    /// Illegal START or STOP condition
    BusError = 0x00,
    /// START condition transmitted
    StartTransmitted = 0x08,
    /// Repeated START condition transmitted
    RepeatedStartTransmitted = 0x10,
    /// SLA+W transmitted, ACK received
    AddressWriteAck = 0x18,
    /// SLA+W transmitted, NACK received
    AddressWriteNack = 0x20,
    /// Data byte transmitted, ACK received
    DataWriteAck = 0x28,
    /// Data byte transmitted, NACK received
    DataWriteNack = 0x30,
    /// Arbitration lost in SLA+W/R or data bytes
    ArbitrationLost = 0x38,
    /// SLA+R transmitted, ACK received
    AddressReadAck = 0x40,
    /// SLA+R transmitted, NACK received
    AddressReadNack = 0x48,
    /// Data byte received, ACK returned
    DataReadAck = 0x50,
    /// Data byte received, NACK returned
    DataReadNack = 0x58,
    /// No relevant state information available
    NoInformation = 0xF8,
}

impl TwiStatus {
    /// Get the status as its register value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode a raw TWSR value
    ///
    /// The prescaler bits are masked off before matching. Returns `None`
    /// for codes that only occur in slave modes.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value & STATUS_MASK {
            0x00 => Some(Self::BusError),
            0x08 => Some(Self::StartTransmitted),
            0x10 => Some(Self::RepeatedStartTransmitted),
            0x18 => Some(Self::AddressWriteAck),
            0x20 => Some(Self::AddressWriteNack),
            0x28 => Some(Self::DataWriteAck),
            0x30 => Some(Self::DataWriteNack),
            0x38 => Some(Self::ArbitrationLost),
            0x40 => Some(Self::AddressReadAck),
            0x48 => Some(Self::AddressReadNack),
            0x50 => Some(Self::DataReadAck),
            0x58 => Some(Self::DataReadNack),
            0xF8 => Some(Self::NoInformation),
            _ => None,
        }
    }
}
