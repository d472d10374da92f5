//! TWI master bus engine
//!
//! [`I2cMasterBus`] drives one TWI peripheral through the primitive steps of
//! a master transaction. Each step writes the control register, busy-polls
//! for completion with a timeout and validates the status code the hardware
//! reports.
//!
//! # Error latch
//!
//! The first failing step records its [`ErrorKind`] in a latch and reports it
//! to the [`ErrorHook`]. While the latch is set every primitive other than
//! [`start`](I2cMasterBus::start) and [`stop`](I2cMasterBus::stop) returns
//! the latched kind without touching the hardware, so a transaction that
//! fails partway aborts cheaply. Callers always finish a transaction with
//! `stop`, which clears the latch and returns the peripheral to idle.
//!
//! # Example
//!
//! ```ignore
//! let mut bus = I2cMasterBus::init(twi, clock, NoHook, address, BusConfig::default());
//!
//! let result = (|| {
//!     bus.start()?;
//!     bus.address_write(bus.write_address())?;
//!     bus.data_write(0x05)?;
//!     bus.data_write(0x42)
//! })();
//! bus.stop()?;
//! ```

use twi_hal::registers::control::{TWEA, TWEN, TWINT, TWSTA, TWSTO};
use twi_hal::{BusConfig, Clock, TwiRegisters, TwiStatus, STATUS_MASK};

use crate::address::SlaveAddress;
use crate::error::ErrorKind;
use crate::hook::{ErrorHook, NoHook};
use crate::state::{BusPhase, Event};

fn operation_complete(control: u8) -> bool {
    control & TWINT != 0
}

fn stop_sent(control: u8) -> bool {
    control & TWSTO == 0
}

/// Master-mode TWI bus handle
///
/// Owns the register block, the clock used for poll timeouts and the error
/// hook. All primitives take `&mut self`; sharing a bus between execution
/// contexts needs external locking.
pub struct I2cMasterBus<R, C, H = NoHook> {
    regs: R,
    clock: C,
    hook: H,
    config: BusConfig,
    address: SlaveAddress,
    last_error: Option<ErrorKind>,
    last_status: u8,
    phase: BusPhase,
}

impl<R, C, H> I2cMasterBus<R, C, H>
where
    R: TwiRegisters,
    C: Clock,
    H: ErrorHook,
{
    /// Program the peripheral and create the bus handle
    ///
    /// Writes the bit rate, enables the peripheral and sets the prescaler.
    /// The write and read address bytes for `address` are computed here and
    /// stay fixed until [`disable`](Self::disable).
    pub fn init(mut regs: R, clock: C, hook: H, address: SlaveAddress, config: BusConfig) -> Self {
        regs.set_bit_rate(config.bit_rate);
        regs.set_control(TWEN);
        regs.set_prescaler(config.prescaler.bits());

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "TWI master enabled: slave {=u8:#x}, TWBR {=u8}, timeout {=u32} ms",
            address.get(),
            config.bit_rate,
            config.timeout_ms
        );

        Self {
            regs,
            clock,
            hook,
            config,
            address,
            last_error: None,
            last_status: TwiStatus::NoInformation.as_u8(),
            phase: BusPhase::Idle,
        }
    }

    /// Disable the peripheral and give back its parts
    ///
    /// Clears the control and bit rate registers.
    pub fn disable(mut self) -> (R, C, H) {
        self.regs.set_control(0);
        self.regs.set_bit_rate(0);
        (self.regs, self.clock, self.hook)
    }

    /// Send a START condition
    ///
    /// Runs even when an error is latched; success clears the latch.
    pub fn start(&mut self) -> Result<(), ErrorKind> {
        self.execute(
            TWINT | TWSTA | TWEN,
            TwiStatus::StartTransmitted,
            ErrorKind::StartTimeout,
            ErrorKind::StartNotReached,
        )?;
        self.advance(Event::Started);
        Ok(())
    }

    /// Send an SLA+W byte and expect an ACK
    pub fn address_write(&mut self, address: u8) -> Result<(), ErrorKind> {
        self.check_latch()?;
        self.regs.set_data(address);
        self.execute(
            TWINT | TWEN,
            TwiStatus::AddressWriteAck,
            ErrorKind::AddressWriteTimeout,
            ErrorKind::AddressWriteNotReached,
        )?;
        self.advance(Event::AddressAcked);
        Ok(())
    }

    /// Send a data byte and expect an ACK
    pub fn data_write(&mut self, byte: u8) -> Result<(), ErrorKind> {
        self.check_latch()?;
        self.regs.set_data(byte);
        self.execute(
            TWINT | TWEN,
            TwiStatus::DataWriteAck,
            ErrorKind::DataWriteTimeout,
            ErrorKind::DataWriteNotReached,
        )?;
        self.advance(Event::DataTransferred);
        Ok(())
    }

    /// Send a repeated START without releasing the bus
    ///
    /// The control write is the same as for [`start`](Self::start); only the
    /// expected status differs.
    pub fn repeated_start(&mut self) -> Result<(), ErrorKind> {
        self.check_latch()?;
        self.execute(
            TWINT | TWSTA | TWEN,
            TwiStatus::RepeatedStartTransmitted,
            ErrorKind::RepeatedStartTimeout,
            ErrorKind::RepeatedStartNotReached,
        )?;
        self.advance(Event::RepeatedStart);
        Ok(())
    }

    /// Send an SLA+R byte and expect an ACK
    pub fn address_read(&mut self, address: u8) -> Result<(), ErrorKind> {
        self.check_latch()?;
        self.regs.set_data(address);
        self.execute(
            TWINT | TWEN,
            TwiStatus::AddressReadAck,
            ErrorKind::AddressReadTimeout,
            ErrorKind::AddressReadNotReached,
        )?;
        self.advance(Event::AddressAcked);
        Ok(())
    }

    /// Receive a byte and acknowledge it
    pub fn data_read(&mut self) -> Result<u8, ErrorKind> {
        self.check_latch()?;
        self.execute(
            TWINT | TWEN | TWEA,
            TwiStatus::DataReadAck,
            ErrorKind::DataReadTimeout,
            ErrorKind::DataReadNotReached,
        )?;
        self.advance(Event::DataTransferred);
        Ok(self.regs.data())
    }

    /// Receive the last byte of a read burst and answer with NACK
    ///
    /// The NACK tells the slave to stop driving the bus. The received byte is
    /// returned; callers that only need the terminator may drop it.
    pub fn data_read_final(&mut self) -> Result<u8, ErrorKind> {
        self.check_latch()?;
        self.execute(
            TWINT | TWEN,
            TwiStatus::DataReadNack,
            ErrorKind::DataReadFinalTimeout,
            ErrorKind::DataReadFinalNotReached,
        )?;
        self.advance(Event::DataTransferred);
        Ok(self.regs.data())
    }

    /// End the transaction and return the bus to idle
    ///
    /// With an error latched no STOP is sent: the peripheral is reset to
    /// idle-enabled and the latch cleared. Otherwise a STOP is requested and
    /// the STOP request bit polled until the hardware clears it. If that
    /// times out the failure is reported, the peripheral is forced back to
    /// idle-enabled and `Err(StopTimeout)` is returned with the latch already
    /// cleared.
    pub fn stop(&mut self) -> Result<(), ErrorKind> {
        if let Some(_kind) = self.last_error {
            #[cfg(feature = "defmt")]
            defmt::debug!("TWI recovering from {}", _kind);
            self.reset_control();
            return Ok(());
        }

        self.regs.set_control(TWINT | TWEN | TWSTO);
        if let Err(kind) = self.wait_for(stop_sent, ErrorKind::StopTimeout) {
            self.reset_control();
            return Err(kind);
        }

        self.advance(Event::Stopped);
        Ok(())
    }

    /// The slave address given at initialization
    pub fn address(&self) -> SlaveAddress {
        self.address
    }

    /// SLA+W byte for the configured slave
    pub fn write_address(&self) -> u8 {
        self.address.write()
    }

    /// SLA+R byte for the configured slave
    pub fn read_address(&self) -> u8 {
        self.address.read()
    }

    /// Latched failure, if any
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Last masked status code read from the peripheral
    pub fn last_status(&self) -> u8 {
        self.last_status
    }

    /// Current transaction phase
    pub fn phase(&self) -> BusPhase {
        self.phase
    }

    /// Bus configuration
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// The clock used for poll timeouts
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The error hook
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// The register block
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutable access to the register block
    ///
    /// Writing registers behind the engine's back desynchronizes the phase
    /// tracking; intended for diagnostics and tests.
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    fn check_latch(&self) -> Result<(), ErrorKind> {
        match self.last_error {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }

    /// Issue a command, wait for TWINT and validate the status
    fn execute(
        &mut self,
        command: u8,
        expected: TwiStatus,
        timeout: ErrorKind,
        mismatch: ErrorKind,
    ) -> Result<(), ErrorKind> {
        self.regs.set_control(command);
        self.wait_for(operation_complete, timeout)?;

        let status = self.regs.status() & STATUS_MASK;
        self.last_status = status;
        if status != expected.as_u8() {
            return Err(self.fail(mismatch));
        }

        self.last_error = None;
        Ok(())
    }

    /// Busy-poll the control register until `ready` holds or the timeout
    /// budget is exceeded
    fn wait_for(&mut self, ready: fn(u8) -> bool, timeout: ErrorKind) -> Result<(), ErrorKind> {
        let reference = self.clock.now_ms();
        loop {
            if ready(self.regs.control()) {
                return Ok(());
            }
            if self.clock.elapsed_since(reference) > self.config.timeout_ms {
                self.last_status = self.regs.status() & STATUS_MASK;
                return Err(self.fail(timeout));
            }
        }
    }

    fn fail(&mut self, kind: ErrorKind) -> ErrorKind {
        self.last_error = Some(kind);
        self.advance(Event::Failed(kind));

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "TWI {} failed: {} (status {=u8:#x})",
            kind.step(),
            kind,
            self.last_status
        );

        self.hook.on_error(kind);
        kind
    }

    fn reset_control(&mut self) {
        self.regs.set_control(0);
        self.regs.set_control(TWEN);
        self.last_error = None;
        self.advance(Event::Stopped);
    }

    fn advance(&mut self, event: Event) {
        self.phase = self.phase.transition(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Step;
    use proptest::prelude::*;
    use twi_hal::sim::{BusEvent, Fault, SimClock, SimTwi};

    /// Hook that records every reported failure
    #[derive(Default)]
    struct Recorder {
        kinds: Vec<ErrorKind>,
    }

    impl ErrorHook for Recorder {
        fn on_error(&mut self, kind: ErrorKind) {
            self.kinds.push(kind);
        }
    }

    type SimBus = I2cMasterBus<SimTwi, SimClock, Recorder>;

    fn sim_bus(config: BusConfig) -> SimBus {
        let address = SlaveAddress::new(0x50).unwrap();
        I2cMasterBus::init(
            SimTwi::new(0x50),
            SimClock::new(),
            Recorder::default(),
            address,
            config,
        )
    }

    /// Steps of a one-byte-address read in operation order, so the index of
    /// each step equals its operation index in the simulator
    const READ_SEQUENCE: [Step; 8] = [
        Step::Start,
        Step::AddressWrite,
        Step::DataWrite,
        Step::RepeatedStart,
        Step::AddressRead,
        Step::DataRead,
        Step::DataReadFinal,
        Step::Stop,
    ];

    fn run_step(bus: &mut SimBus, step: Step) -> Result<(), ErrorKind> {
        match step {
            Step::Start => bus.start(),
            Step::AddressWrite => bus.address_write(0xA0),
            Step::DataWrite => bus.data_write(0x10),
            Step::RepeatedStart => bus.repeated_start(),
            Step::AddressRead => bus.address_read(0xA1),
            Step::DataRead => bus.data_read().map(|_| ()),
            Step::DataReadFinal => bus.data_read_final().map(|_| ()),
            Step::Stop => bus.stop(),
        }
    }

    /// Run the read sequence until the first failure
    fn run_until_failure(bus: &mut SimBus) -> Option<(usize, ErrorKind)> {
        READ_SEQUENCE
            .iter()
            .enumerate()
            .find_map(|(i, step)| run_step(bus, *step).err().map(|kind| (i, kind)))
    }

    fn timeout_kind(step: Step) -> ErrorKind {
        match step {
            Step::Start => ErrorKind::StartTimeout,
            Step::AddressWrite => ErrorKind::AddressWriteTimeout,
            Step::DataWrite => ErrorKind::DataWriteTimeout,
            Step::RepeatedStart => ErrorKind::RepeatedStartTimeout,
            Step::AddressRead => ErrorKind::AddressReadTimeout,
            Step::DataRead => ErrorKind::DataReadTimeout,
            Step::DataReadFinal => ErrorKind::DataReadFinalTimeout,
            Step::Stop => ErrorKind::StopTimeout,
        }
    }

    fn mismatch_kind(step: Step) -> Option<ErrorKind> {
        match step {
            Step::Start => Some(ErrorKind::StartNotReached),
            Step::AddressWrite => Some(ErrorKind::AddressWriteNotReached),
            Step::DataWrite => Some(ErrorKind::DataWriteNotReached),
            Step::RepeatedStart => Some(ErrorKind::RepeatedStartNotReached),
            Step::AddressRead => Some(ErrorKind::AddressReadNotReached),
            Step::DataRead => Some(ErrorKind::DataReadNotReached),
            Step::DataReadFinal => Some(ErrorKind::DataReadFinalNotReached),
            Step::Stop => None,
        }
    }

    #[test]
    fn test_init_programs_peripheral() {
        let bus = sim_bus(BusConfig::FAST);

        assert_eq!(bus.registers().bit_rate(), 12);
        assert_eq!(bus.registers().prescaler(), 0);
        assert_eq!(bus.registers().control_value(), TWEN);
        assert_eq!(bus.write_address(), 0xA0);
        assert_eq!(bus.read_address(), 0xA1);
        assert_eq!(bus.phase(), BusPhase::Idle);
        assert_eq!(bus.last_error(), None);
    }

    #[test]
    fn test_disable_clears_registers() {
        let mut sim = SimTwi::new(0x50);
        let clock = SimClock::new();
        let address = SlaveAddress::new(0x50).unwrap();

        let bus = I2cMasterBus::init(&mut sim, &clock, NoHook, address, BusConfig::default());
        let _ = bus.disable();

        assert_eq!(sim.control_value(), 0);
        assert_eq!(sim.bit_rate(), 0);
    }

    #[test]
    fn test_write_transaction() {
        let mut bus = sim_bus(BusConfig::default());

        bus.start().unwrap();
        assert_eq!(bus.phase(), BusPhase::Address);
        bus.address_write(0xA0).unwrap();
        assert_eq!(bus.phase(), BusPhase::Data);
        bus.data_write(0x05).unwrap();
        bus.data_write(0x42).unwrap();
        bus.stop().unwrap();

        assert_eq!(bus.phase(), BusPhase::Idle);
        assert_eq!(bus.registers().memory()[0x05], 0x42);
        assert_eq!(
            bus.registers().trace(),
            &[
                BusEvent::Start,
                BusEvent::Address(0xA0),
                BusEvent::Write(0x05),
                BusEvent::Write(0x42),
                BusEvent::Stop,
            ]
        );
        assert!(bus.hook().kinds.is_empty());
    }

    #[test]
    fn test_read_transaction_returns_bytes() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().memory_mut()[0x10..0x13].copy_from_slice(&[0xDE, 0xAD, 0x42]);

        bus.start().unwrap();
        bus.address_write(0xA0).unwrap();
        bus.data_write(0x10).unwrap();
        bus.repeated_start().unwrap();
        bus.address_read(0xA1).unwrap();
        assert_eq!(bus.data_read(), Ok(0xDE));
        assert_eq!(bus.data_read(), Ok(0xAD));
        assert_eq!(bus.data_read_final(), Ok(0x42));
        bus.stop().unwrap();

        assert_eq!(bus.last_status(), TwiStatus::DataReadNack.as_u8());
    }

    #[test]
    fn test_address_nack_aborts_transaction() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(1, Fault::Status(0x20));

        bus.start().unwrap();
        assert_eq!(bus.address_write(0xA0), Err(ErrorKind::AddressWriteNotReached));
        assert_eq!(bus.last_error(), Some(ErrorKind::AddressWriteNotReached));
        assert_eq!(bus.last_status(), 0x20);

        let writes = bus.registers().register_writes();
        assert_eq!(bus.data_write(0x05), Err(ErrorKind::AddressWriteNotReached));
        assert_eq!(bus.data_write(0x42), Err(ErrorKind::AddressWriteNotReached));
        assert_eq!(bus.registers().register_writes(), writes);

        assert_eq!(bus.stop(), Ok(()));
        assert_eq!(bus.last_error(), None);
        assert_eq!(bus.phase(), BusPhase::Idle);
        assert_eq!(bus.registers().control_value(), TWEN);
        assert_eq!(bus.hook().kinds, vec![ErrorKind::AddressWriteNotReached]);
        assert!(!bus.registers().trace().contains(&BusEvent::Write(0x05)));
    }

    #[test]
    fn test_latched_primitives_touch_nothing() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(0, Fault::Status(0x38));
        assert_eq!(bus.start(), Err(ErrorKind::StartNotReached));

        let writes = bus.registers().register_writes();
        let polls = bus.registers().control_polls();

        assert_eq!(bus.address_write(0xA0), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.data_write(0x00), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.repeated_start(), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.address_read(0xA1), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.data_read(), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.data_read_final(), Err(ErrorKind::StartNotReached));

        assert_eq!(bus.registers().register_writes(), writes);
        assert_eq!(bus.registers().control_polls(), polls);
        assert_eq!(bus.last_error(), Some(ErrorKind::StartNotReached));
        assert_eq!(bus.hook().kinds.len(), 1);
    }

    #[test]
    fn test_start_runs_and_clears_latch() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(0, Fault::Hang);

        assert_eq!(bus.start(), Err(ErrorKind::StartTimeout));
        assert_eq!(bus.last_error(), Some(ErrorKind::StartTimeout));

        assert_eq!(bus.start(), Ok(()));
        assert_eq!(bus.last_error(), None);
        assert_eq!(bus.phase(), BusPhase::Address);
        assert_eq!(bus.hook().kinds, vec![ErrorKind::StartTimeout]);

        // The rest of the transaction proceeds normally
        bus.address_write(0xA0).unwrap();
        bus.stop().unwrap();
    }

    #[test]
    fn test_start_without_stop_sees_repeated_start() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(1, Fault::Status(0x20));

        bus.start().unwrap();
        assert_eq!(bus.address_write(0xA0), Err(ErrorKind::AddressWriteNotReached));

        // The peripheral still holds the bus, so START answers 0x10
        assert_eq!(bus.start(), Err(ErrorKind::StartNotReached));
        assert_eq!(bus.last_status(), TwiStatus::RepeatedStartTransmitted.as_u8());
        assert_eq!(bus.last_error(), Some(ErrorKind::StartNotReached));

        assert_eq!(bus.stop(), Ok(()));
        assert_eq!(bus.start(), Ok(()));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut bus = sim_bus(BusConfig::default());

        assert_eq!(bus.stop(), Ok(()));
        assert_eq!(bus.registers().control_value() & TWEN, TWEN);
        assert_eq!(bus.stop(), Ok(()));
        assert_eq!(bus.registers().control_value() & TWEN, TWEN);
        assert_eq!(bus.phase(), BusPhase::Idle);
        assert!(bus.hook().kinds.is_empty());
    }

    #[test]
    fn test_stop_timeout_forces_idle() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(0, Fault::Hang);

        assert_eq!(bus.stop(), Err(ErrorKind::StopTimeout));
        assert_eq!(bus.last_error(), None);
        assert_eq!(bus.registers().control_value(), TWEN);
        assert_eq!(bus.phase(), BusPhase::Idle);
        assert_eq!(bus.hook().kinds, vec![ErrorKind::StopTimeout]);

        // The bus is usable straight away
        assert_eq!(bus.stop(), Ok(()));
    }

    #[test]
    fn test_status_mismatch_for_every_step() {
        for (index, step) in READ_SEQUENCE.iter().enumerate() {
            let Some(expected) = mismatch_kind(*step) else {
                continue;
            };
            let mut bus = sim_bus(BusConfig::default());
            bus.registers_mut().fail_at(index, Fault::Status(0x38));

            assert_eq!(run_until_failure(&mut bus), Some((index, expected)));
            assert_eq!(bus.hook().kinds, vec![expected]);
            assert_eq!(bus.phase(), BusPhase::Errored(expected));
        }
    }

    #[test]
    fn test_address_register_kept_on_mismatch() {
        let mut bus = sim_bus(BusConfig::default());
        bus.registers_mut().fail_at(1, Fault::Status(0x20));

        bus.start().unwrap();
        let _ = bus.address_write(0xA0);
        assert_eq!(bus.registers().data(), 0xA0);
    }

    #[test]
    fn test_timeout_survives_clock_wrap() {
        let address = SlaveAddress::new(0x50).unwrap();
        let mut bus = I2cMasterBus::init(
            SimTwi::new(0x50),
            SimClock::new().starting_at(u32::MAX - 1),
            Recorder::default(),
            address,
            BusConfig::default(),
        );
        bus.registers_mut().fail_at(0, Fault::Hang);

        assert_eq!(bus.start(), Err(ErrorKind::StartTimeout));
        assert!(bus.registers().control_polls() <= 2);
    }

    proptest! {
        #[test]
        fn prop_timeout_sets_step_kind(index in 0usize..8, timeout_ms in 1u32..50) {
            let mut bus = sim_bus(BusConfig::default().with_timeout_ms(timeout_ms));
            bus.registers_mut().fail_at(index, Fault::Hang);

            let step = READ_SEQUENCE[index];
            let expected = timeout_kind(step);
            prop_assert_eq!(run_until_failure(&mut bus), Some((index, expected)));
            prop_assert_eq!(&bus.hook().kinds, &vec![expected]);

            // Every completed step polls once; the hung one is bounded by the budget
            let hung_polls = bus.registers().control_polls() - index;
            prop_assert!(hung_polls <= timeout_ms as usize + 1);

            if step == Step::Stop {
                prop_assert_eq!(bus.last_error(), None);
            } else {
                prop_assert_eq!(bus.last_error(), Some(expected));
            }
        }
    }
}
