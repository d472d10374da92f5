//! Bus error taxonomy
//!
//! Every protocol step fails in one of two ways: the completion flag never
//! sets within the timeout budget, or it sets but the status register holds
//! a code other than the one the step expects. STOP has no status check and
//! therefore only a timeout variant.

/// Protocol step of a master transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// START condition
    Start,
    /// SLA+W
    AddressWrite,
    /// Data byte transmitted
    DataWrite,
    /// Repeated START condition
    RepeatedStart,
    /// SLA+R
    AddressRead,
    /// Data byte received with ACK
    DataRead,
    /// Data byte received with NACK
    DataReadFinal,
    /// STOP condition
    Stop,
}

/// Types of bus failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// START never completed
    StartTimeout,
    /// START completed with an unexpected status
    StartNotReached,
    /// SLA+W never completed
    AddressWriteTimeout,
    /// SLA+W was not acknowledged as expected
    AddressWriteNotReached,
    /// Data transmission never completed
    DataWriteTimeout,
    /// Data byte was not acknowledged as expected
    DataWriteNotReached,
    /// Repeated START never completed
    RepeatedStartTimeout,
    /// Repeated START completed with an unexpected status
    RepeatedStartNotReached,
    /// SLA+R never completed
    AddressReadTimeout,
    /// SLA+R was not acknowledged as expected
    AddressReadNotReached,
    /// Acknowledged receive never completed
    DataReadTimeout,
    /// Acknowledged receive reported an unexpected status
    DataReadNotReached,
    /// Final (not acknowledged) receive never completed
    DataReadFinalTimeout,
    /// Final receive reported an unexpected status
    DataReadFinalNotReached,
    /// STOP request bit never cleared
    StopTimeout,
}

impl ErrorKind {
    /// The protocol step that failed
    pub fn step(self) -> Step {
        use ErrorKind::*;

        match self {
            StartTimeout | StartNotReached => Step::Start,
            AddressWriteTimeout | AddressWriteNotReached => Step::AddressWrite,
            DataWriteTimeout | DataWriteNotReached => Step::DataWrite,
            RepeatedStartTimeout | RepeatedStartNotReached => Step::RepeatedStart,
            AddressReadTimeout | AddressReadNotReached => Step::AddressRead,
            DataReadTimeout | DataReadNotReached => Step::DataRead,
            DataReadFinalTimeout | DataReadFinalNotReached => Step::DataReadFinal,
            StopTimeout => Step::Stop,
        }
    }

    /// Check if the completion flag never set
    pub fn is_timeout(self) -> bool {
        use ErrorKind::*;

        matches!(
            self,
            StartTimeout
                | AddressWriteTimeout
                | DataWriteTimeout
                | RepeatedStartTimeout
                | AddressReadTimeout
                | DataReadTimeout
                | DataReadFinalTimeout
                | StopTimeout
        )
    }

    /// One-byte diagnostic code
    ///
    /// Transmit-side failures use 0x01-0x07, receive-side failures
    /// 0x11-0x18, matching the codes field tooling already decodes.
    pub fn code(self) -> u8 {
        use ErrorKind::*;

        match self {
            StartNotReached => 0x01,
            AddressWriteNotReached => 0x02,
            DataWriteNotReached => 0x03,
            StartTimeout => 0x04,
            AddressWriteTimeout => 0x05,
            DataWriteTimeout => 0x06,
            StopTimeout => 0x07,
            RepeatedStartNotReached => 0x11,
            AddressReadNotReached => 0x12,
            DataReadNotReached => 0x13,
            DataReadFinalNotReached => 0x14,
            RepeatedStartTimeout => 0x15,
            AddressReadTimeout => 0x16,
            DataReadTimeout => 0x17,
            DataReadFinalTimeout => 0x18,
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let failure = if self.is_timeout() {
            "timed out"
        } else {
            "unexpected status"
        };
        write!(f, "{:?} {} (code {:#04x})", self.step(), failure, self.code())
    }
}

/// Errors from composed transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionError {
    /// A bus step failed
    Bus(ErrorKind),
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
}

impl From<ErrorKind> for TransactionError {
    fn from(kind: ErrorKind) -> Self {
        TransactionError::Bus(kind)
    }
}

impl core::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransactionError::Bus(kind) => write!(f, "bus error: {}", kind),
            TransactionError::InvalidAddress(address) => {
                write!(f, "invalid 7-bit address {:#04x}", address)
            }
        }
    }
}

impl embedded_hal::i2c::Error for TransactionError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind as HalErrorKind, NoAcknowledgeSource};

        match self {
            TransactionError::Bus(ErrorKind::AddressWriteNotReached)
            | TransactionError::Bus(ErrorKind::AddressReadNotReached) => {
                HalErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            TransactionError::Bus(ErrorKind::DataWriteNotReached) => {
                HalErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
            _ => HalErrorKind::Other,
        }
    }
}
