//! Auxiliary serial EEPROM driver
//!
//! A polled two-wire state machine with the same transaction pattern as the
//! radio bus but no interrupt-context hazard: every operation runs start to
//! stop in main-line code. The device NACKs while an internal write cycle
//! is in progress, so each operation begins with bounded acknowledge
//! polling; the bound is derived from the core clock rather than the
//! traditional hard-coded iteration count, which only held at one clock
//! speed. Any failure forces a stop condition before returning so the bus
//! is never left mid-transaction.

use radio_core::DriverError;

/// Two-wire bus primitives the driver polls.
///
/// `write` and `start` report the acknowledge state of the addressed
/// device; `stop` always releases the bus.
pub trait TwiHal {
    /// Issue a (repeated) start condition; true when the bus was taken
    fn start(&self) -> bool;

    /// Issue a stop condition and release the bus
    fn stop(&self);

    /// Shift one byte out; true when the device acknowledged it
    fn write(&self, byte: u8) -> bool;

    /// Shift one byte in, acknowledging it when `ack` is set
    fn read(&self, ack: bool) -> u8;
}

/// Write-cycle acknowledge polling bound for a given core clock.
///
/// Scaled so the wall-clock bound stays roughly constant across clock
/// speeds; at 8 MHz it matches the 0xFF iterations the bound was
/// originally tuned to.
pub const fn ack_retry_limit(cpu_hz: u32) -> u32 {
    let limit = cpu_hz / 31_250;
    if limit < 16 {
        16
    } else {
        limit
    }
}

/// Write page size of the supported parts, in bytes
pub const PAGE_SIZE: usize = 32;

const READ_BIT: u8 = 0x01;

/// Byte/burst driver for a 16-bit-addressed serial EEPROM
pub struct Eeprom<'a, H: TwiHal> {
    hw: &'a H,
    device_address: u8,
    retry_limit: u32,
}

impl<'a, H: TwiHal> Eeprom<'a, H> {
    /// `device_address` is the 8-bit bus address with the R/W bit clear
    pub fn new(hw: &'a H, device_address: u8, cpu_hz: u32) -> Self {
        Self {
            hw,
            device_address,
            retry_limit: ack_retry_limit(cpu_hz),
        }
    }

    /// Poll until the device acknowledges its address or the retry bound is
    /// exhausted. Leaves the bus addressed for a write on success.
    fn wait_ready(&self) -> Result<(), DriverError> {
        for _ in 0..self.retry_limit {
            if self.hw.start() && self.hw.write(self.device_address) {
                return Ok(());
            }
            self.hw.stop();
        }
        self.hw.stop();
        Err(DriverError::Nack)
    }

    /// Address the memory cell after a successful `wait_ready`
    fn send_address(&self, address: u16) -> Result<(), DriverError> {
        let [low, high] = address.to_le_bytes();
        if !self.hw.write(high) || !self.hw.write(low) {
            self.hw.stop();
            return Err(DriverError::Nack);
        }
        Ok(())
    }

    /// Read one byte
    pub fn byte_read(&self, address: u16) -> Result<u8, DriverError> {
        let mut buf = [0u8; 1];
        self.burst_read(address, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one byte; completes after the device's internal write cycle
    /// is observed on the next operation, not within this call.
    pub fn byte_write(&self, address: u16, value: u8) -> Result<(), DriverError> {
        self.burst_write(address, &[value])
    }

    /// Sequential read of `buf.len()` bytes starting at `address`
    pub fn burst_read(&self, address: u16, buf: &mut [u8]) -> Result<(), DriverError> {
        if buf.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        self.wait_ready()?;
        self.send_address(address)?;

        // Repeated start, switching to read mode
        if !self.hw.start() || !self.hw.write(self.device_address | READ_BIT) {
            self.hw.stop();
            return Err(DriverError::Nack);
        }
        let last = buf.len() - 1;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.hw.read(i != last);
        }
        self.hw.stop();
        Ok(())
    }

    /// Page-bounded sequential write.
    ///
    /// The data must fit the page the address falls in; the device wraps
    /// within a page rather than carrying into the next one.
    pub fn burst_write(&self, address: u16, data: &[u8]) -> Result<(), DriverError> {
        if data.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        let page_remaining = PAGE_SIZE - (address as usize % PAGE_SIZE);
        if data.len() > page_remaining {
            return Err(DriverError::InvalidArgument);
        }
        self.wait_ready()?;
        self.send_address(address)?;
        for &byte in data {
            if !self.hw.write(byte) {
                self.hw.stop();
                return Err(DriverError::Nack);
            }
        }
        self.hw.stop();
        Ok(())
    }
}
