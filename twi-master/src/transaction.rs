//! `embedded-hal` I2C implementation
//!
//! Composes the bus primitives into full transactions so drivers written
//! against [`embedded_hal::i2c::I2c`] can run on the TWI master. Each
//! transaction addresses the slave given per call, not the one configured
//! at [`init`](I2cMasterBus::init).
//!
//! Adjacent operations of the same direction share one address phase; a
//! direction change issues a repeated START. The last byte of every read run
//! is answered with NACK, and STOP is always sent at the end, also after a
//! failure.

use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};
use twi_hal::{Clock, TwiRegisters};

use crate::address::SlaveAddress;
use crate::bus::I2cMasterBus;
use crate::error::{ErrorKind, TransactionError};
use crate::hook::ErrorHook;

impl<R, C, H> ErrorType for I2cMasterBus<R, C, H>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    type Error = TransactionError;
}

impl<R, C, H> I2c<SevenBitAddress> for I2cMasterBus<R, C, H>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let address =
            SlaveAddress::new(address).ok_or(TransactionError::InvalidAddress(address))?;
        if operations.is_empty() {
            return Ok(());
        }

        let result = run_operations(self, address, operations);
        let stopped = self.stop();
        result?;
        stopped?;
        Ok(())
    }
}

fn run_operations<R, C, H>(
    bus: &mut I2cMasterBus<R, C, H>,
    address: SlaveAddress,
    operations: &mut [Operation<'_>],
) -> Result<(), ErrorKind>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    bus.start()?;

    // Direction of the current address phase; None before the first one
    let mut reading: Option<bool> = None;

    for i in 0..operations.len() {
        // An empty read moves no bytes and must not open a read phase
        if matches!(&operations[i], Operation::Read(buffer) if buffer.is_empty()) {
            continue;
        }
        let next_is_read = continues_read_run(&operations[i + 1..]);

        match &mut operations[i] {
            Operation::Write(bytes) => {
                if reading != Some(false) {
                    address_phase(bus, address, false, reading.is_some())?;
                    reading = Some(false);
                }
                for &byte in bytes.iter() {
                    bus.data_write(byte)?;
                }
            }
            Operation::Read(buffer) => {
                if reading != Some(true) {
                    address_phase(bus, address, true, reading.is_some())?;
                    reading = Some(true);
                }
                let last = buffer.len().saturating_sub(1);
                for (j, slot) in buffer.iter_mut().enumerate() {
                    *slot = if j == last && !next_is_read {
                        bus.data_read_final()?
                    } else {
                        bus.data_read()?
                    };
                }
            }
        }
    }

    Ok(())
}

/// Check if the next operation that moves bytes is a read
///
/// Empty reads are skipped, so the last byte of a read run is still
/// NACKed when only empty reads follow it.
fn continues_read_run(rest: &[Operation<'_>]) -> bool {
    rest.iter()
        .find(|op| !matches!(op, Operation::Read(buffer) if buffer.is_empty()))
        .is_some_and(|op| matches!(op, Operation::Read(_)))
}

fn address_phase<R, C, H>(
    bus: &mut I2cMasterBus<R, C, H>,
    address: SlaveAddress,
    read: bool,
    restart: bool,
) -> Result<(), ErrorKind>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    if restart {
        bus.repeated_start()?;
    }
    if read {
        bus.address_read(address.read())
    } else {
        bus.address_write(address.write())
    }
}
