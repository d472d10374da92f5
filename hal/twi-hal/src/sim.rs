//! Simulated TWI peripheral for host-side testing
//!
//! [`SimTwi`] behaves like the master-mode TWI block wired to a single FRAM
//! slave: it answers START requests, acknowledges its own address, stores
//! written bytes after the word address and returns stored bytes on reads.
//! Every operation is recorded as a [`BusEvent`], and faults can be injected
//! into any operation by index.
//!
//! [`SimClock`] advances by a fixed step on every reading, so poll loops that
//! never see their completion flag still terminate.

use core::cell::Cell;

use heapless::Vec;

use crate::clock::Clock;
use crate::registers::control::{TWEA, TWEN, TWINT, TWSTA, TWSTO};
use crate::registers::TwiRegisters;
use crate::status::TwiStatus;

/// Bytes of simulated slave memory; word addresses wrap at this size
pub const MEMORY_SIZE: usize = 512;

/// Maximum recorded events
pub const TRACE_CAPACITY: usize = 64;

/// Maximum pending faults
pub const MAX_FAULTS: usize = 8;

/// Bus-level event seen by the simulated peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// START condition
    Start,
    /// Repeated START condition
    RepeatedStart,
    /// Address byte (SLA+R/W)
    Address(u8),
    /// Data byte sent by the master
    Write(u8),
    /// Data byte received by the master, acknowledged or not
    Read {
        /// Master returned ACK
        ack: bool,
    },
    /// STOP condition
    Stop,
}

/// Fault injected into one peripheral operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The operation never completes (TWINT stays clear, TWSTO stays set)
    Hang,
    /// The operation completes but reports this status code
    Status(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Started,
    Writing { address_bytes_left: usize, word: usize },
    Reading,
}

/// Simulated TWI register block with an attached FRAM slave
pub struct SimTwi {
    control: u8,
    status: u8,
    data: u8,
    bit_rate: u8,
    prescaler: u8,
    slave: u8,
    address_width: usize,
    memory: [u8; MEMORY_SIZE],
    pointer: usize,
    mode: Mode,
    in_transaction: bool,
    operations: usize,
    faults: Vec<(usize, Fault), MAX_FAULTS>,
    trace: Vec<BusEvent, TRACE_CAPACITY>,
    register_writes: usize,
    control_polls: Cell<usize>,
}

impl SimTwi {
    /// Create a peripheral whose slave answers to the 7-bit `slave` address
    /// and expects one-byte word addresses
    pub fn new(slave: u8) -> Self {
        Self {
            control: 0,
            status: TwiStatus::NoInformation.as_u8(),
            data: 0,
            bit_rate: 0,
            prescaler: 0,
            slave,
            address_width: 1,
            memory: [0; MEMORY_SIZE],
            pointer: 0,
            mode: Mode::Idle,
            in_transaction: false,
            operations: 0,
            faults: Vec::new(),
            trace: Vec::new(),
            register_writes: 0,
            control_polls: Cell::new(0),
        }
    }

    /// Make the slave expect two-byte (big-endian) word addresses
    pub fn with_wide_addresses(mut self) -> Self {
        self.address_width = 2;
        self
    }

    /// Inject `fault` into the operation with index `operation`
    ///
    /// Operations are control-register writes with TWINT set, counted from
    /// zero since creation or the last [`clear_trace`](Self::clear_trace).
    ///
    /// # Panics
    ///
    /// Panics if more than [`MAX_FAULTS`] faults are pending.
    pub fn fail_at(&mut self, operation: usize, fault: Fault) {
        self.faults
            .push((operation, fault))
            .expect("fault list full");
    }

    /// Recorded bus events
    pub fn trace(&self) -> &[BusEvent] {
        &self.trace
    }

    /// Forget recorded events, counters and pending faults
    pub fn clear_trace(&mut self) {
        self.trace.clear();
        self.faults.clear();
        self.operations = 0;
        self.register_writes = 0;
        self.control_polls.set(0);
    }

    /// Number of register writes performed by the master
    pub fn register_writes(&self) -> usize {
        self.register_writes
    }

    /// Number of control register reads performed by the master
    pub fn control_polls(&self) -> usize {
        self.control_polls.get()
    }

    /// Control register value, without counting as a poll
    pub fn control_value(&self) -> u8 {
        self.control
    }

    /// Bit rate register value
    pub fn bit_rate(&self) -> u8 {
        self.bit_rate
    }

    /// Prescaler bits of the status register
    pub fn prescaler(&self) -> u8 {
        self.prescaler
    }

    /// Slave memory
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable slave memory, for seeding read tests
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn take_fault(&mut self, operation: usize) -> Option<Fault> {
        let index = self.faults.iter().position(|(op, _)| *op == operation)?;
        Some(self.faults.swap_remove(index).1)
    }

    fn record(&mut self, event: BusEvent) {
        // A full trace drops events rather than failing the operation
        let _ = self.trace.push(event);
    }

    fn start(&mut self) -> TwiStatus {
        let repeated = self.in_transaction;
        self.in_transaction = true;
        self.mode = Mode::Started;
        if repeated {
            self.record(BusEvent::RepeatedStart);
            TwiStatus::RepeatedStartTransmitted
        } else {
            self.record(BusEvent::Start);
            TwiStatus::StartTransmitted
        }
    }

    fn address(&mut self) -> TwiStatus {
        let sla = self.data;
        self.record(BusEvent::Address(sla));
        let read = sla & 1 != 0;
        if sla >> 1 != self.slave {
            self.mode = Mode::Idle;
            return if read {
                TwiStatus::AddressReadNack
            } else {
                TwiStatus::AddressWriteNack
            };
        }
        if read {
            self.mode = Mode::Reading;
            TwiStatus::AddressReadAck
        } else {
            self.mode = Mode::Writing {
                address_bytes_left: self.address_width,
                word: 0,
            };
            TwiStatus::AddressWriteAck
        }
    }

    fn write(&mut self, address_bytes_left: usize, word: usize) -> TwiStatus {
        let byte = self.data;
        self.record(BusEvent::Write(byte));
        if address_bytes_left > 0 {
            let word = (word << 8) | byte as usize;
            self.mode = Mode::Writing {
                address_bytes_left: address_bytes_left - 1,
                word,
            };
            if address_bytes_left == 1 {
                self.pointer = word % MEMORY_SIZE;
            }
        } else {
            self.memory[self.pointer] = byte;
            self.pointer = (self.pointer + 1) % MEMORY_SIZE;
        }
        TwiStatus::DataWriteAck
    }

    fn read(&mut self, ack: bool) -> TwiStatus {
        self.record(BusEvent::Read { ack });
        self.data = self.memory[self.pointer];
        self.pointer = (self.pointer + 1) % MEMORY_SIZE;
        if ack {
            TwiStatus::DataReadAck
        } else {
            TwiStatus::DataReadNack
        }
    }
}

impl TwiRegisters for SimTwi {
    fn control(&self) -> u8 {
        self.control_polls.set(self.control_polls.get() + 1);
        self.control
    }

    fn set_control(&mut self, value: u8) {
        self.register_writes += 1;

        if value & TWINT == 0 {
            // Plain configuration write, no bus operation
            self.control = value;
            if value & TWEN == 0 {
                self.in_transaction = false;
                self.mode = Mode::Idle;
            }
            return;
        }

        let operation = self.operations;
        self.operations += 1;
        let fault = self.take_fault(operation);
        let requested = value & !TWINT;

        if value & TWSTO != 0 {
            self.record(BusEvent::Stop);
            self.in_transaction = false;
            self.mode = Mode::Idle;
            self.status = TwiStatus::NoInformation.as_u8();
            self.control = match fault {
                Some(Fault::Hang) => requested,
                _ => requested & !TWSTO,
            };
            return;
        }

        let held_bus = self.in_transaction;
        let status = if value & TWSTA != 0 {
            self.start()
        } else {
            match self.mode {
                Mode::Started => self.address(),
                Mode::Writing {
                    address_bytes_left,
                    word,
                } => self.write(address_bytes_left, word),
                Mode::Reading => self.read(value & TWEA != 0),
                Mode::Idle => TwiStatus::NoInformation,
            }
        };

        match fault {
            Some(Fault::Hang) => self.control = requested,
            Some(Fault::Status(code)) => {
                self.status = code | self.prescaler;
                self.control = requested | TWINT;
            }
            None => {
                self.status = status.as_u8() | self.prescaler;
                self.control = requested | TWINT;
            }
        }

        // A failed START never takes the bus
        if fault.is_some() && value & TWSTA != 0 {
            self.in_transaction = held_bus;
        }
    }

    fn status(&self) -> u8 {
        self.status
    }

    fn set_prescaler(&mut self, bits: u8) {
        self.register_writes += 1;
        self.prescaler = bits & 0x03;
    }

    fn data(&self) -> u8 {
        self.data
    }

    fn set_data(&mut self, value: u8) {
        self.register_writes += 1;
        self.data = value;
    }

    fn set_bit_rate(&mut self, value: u8) {
        self.register_writes += 1;
        self.bit_rate = value;
    }
}

/// Clock that advances by a fixed step every time it is read
pub struct SimClock {
    now: Cell<u32>,
    step: u32,
    reads: Cell<u32>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Clock starting at zero, advancing 1 ms per reading
    pub fn new() -> Self {
        Self::with_step(1)
    }

    /// Clock starting at zero, advancing `step` ms per reading
    pub fn with_step(step: u32) -> Self {
        Self {
            now: Cell::new(0),
            step,
            reads: Cell::new(0),
        }
    }

    /// Start the clock at `now` instead of zero
    pub fn starting_at(self, now: u32) -> Self {
        self.now.set(now);
        self
    }

    /// Move the clock forward without counting a reading
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    /// Number of readings taken so far
    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        self.reads.set(self.reads.get() + 1);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(sim: &mut SimTwi, value: u8) -> u8 {
        sim.set_control(value);
        sim.status() & 0xF8
    }

    #[test]
    fn test_write_transaction_stores_bytes() {
        let mut sim = SimTwi::new(0x50);

        assert_eq!(request(&mut sim, TWINT | TWSTA | TWEN), 0x08);
        sim.set_data(0xA0);
        assert_eq!(request(&mut sim, TWINT | TWEN), 0x18);
        sim.set_data(0x05);
        assert_eq!(request(&mut sim, TWINT | TWEN), 0x28);
        sim.set_data(0x42);
        assert_eq!(request(&mut sim, TWINT | TWEN), 0x28);
        sim.set_control(TWINT | TWSTO | TWEN);

        assert_eq!(sim.memory()[0x05], 0x42);
        assert_eq!(sim.control_value() & TWSTO, 0);
        assert_eq!(
            sim.trace(),
            &[
                BusEvent::Start,
                BusEvent::Address(0xA0),
                BusEvent::Write(0x05),
                BusEvent::Write(0x42),
                BusEvent::Stop,
            ]
        );
    }

    #[test]
    fn test_foreign_address_is_nacked() {
        let mut sim = SimTwi::new(0x50);
        request(&mut sim, TWINT | TWSTA | TWEN);
        sim.set_data(0xA2);
        assert_eq!(request(&mut sim, TWINT | TWEN), 0x20);
    }

    #[test]
    fn test_hang_keeps_flag_clear() {
        let mut sim = SimTwi::new(0x50);
        sim.fail_at(0, Fault::Hang);
        sim.set_control(TWINT | TWSTA | TWEN);
        assert_eq!(sim.control_value() & TWINT, 0);
    }

    #[test]
    fn test_failed_start_leaves_bus_free() {
        let mut sim = SimTwi::new(0x50);
        sim.fail_at(0, Fault::Hang);
        sim.set_control(TWINT | TWSTA | TWEN);

        assert_eq!(request(&mut sim, TWINT | TWSTA | TWEN), 0x08);
    }

    #[test]
    #[should_panic(expected = "fault list full")]
    fn test_fault_list_overflow_panics() {
        let mut sim = SimTwi::new(0x50);
        for operation in 0..=MAX_FAULTS {
            sim.fail_at(operation, Fault::Hang);
        }
    }

    #[test]
    fn test_clock_steps_per_reading() {
        let clock = SimClock::with_step(5);
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_ms(), 5);
        assert_eq!(clock.reads(), 2);
    }
}
