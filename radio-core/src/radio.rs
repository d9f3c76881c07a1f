//! Transceiver register/frame access protocol and interrupt bridge
//!
//! Every transaction is bracketed by one chip-select assertion and runs
//! inside a critical section: the bus is exclusively owned by this protocol
//! while active, and an interrupt landing mid-command would corrupt the
//! chip-select framing.

use core::cell::Cell;

use critical_section::Mutex;

use crate::bus::SpiBus;
use crate::hal::SpiHal;
use crate::regs::{self, cmd};
use crate::types::DriverError;

/// Handler invoked from the transceiver interrupt vector with the chip's
/// interrupt-status byte. Runs synchronously in interrupt context with all
/// other interrupts masked for its full duration; a handler that issues
/// long frame transactions delays every other interrupt accordingly.
pub type IrqHandler = &'static (dyn Fn(u8) + Sync);

/// Register and frame access to an AT86RF230-class transceiver
pub struct Radio<'b, H: SpiHal> {
    bus: &'b SpiBus<H>,
    irq_handler: Mutex<Cell<Option<IrqHandler>>>,
}

impl<'b, H: SpiHal> Radio<'b, H> {
    pub fn new(bus: &'b SpiBus<H>) -> Self {
        Self {
            bus,
            irq_handler: Mutex::new(Cell::new(None)),
        }
    }

    /// Read one 8-bit register
    pub fn register_read(&self, address: u8) -> Result<u8, DriverError> {
        critical_section::with(|_cs| {
            let tx = [cmd::REGISTER_READ | (address & cmd::ADDRESS_MASK), 0];
            let mut rx = [0u8; 2];
            self.bus.hw().select();
            let result = self.bus.transfer_blocking(&tx, &mut rx);
            self.bus.hw().deselect();
            result.map(|_| rx[1])
        })
    }

    /// Write one 8-bit register
    pub fn register_write(&self, address: u8, value: u8) -> Result<(), DriverError> {
        critical_section::with(|_cs| {
            let tx = [cmd::REGISTER_WRITE | (address & cmd::ADDRESS_MASK), value];
            let mut rx = [0u8; 2];
            self.bus.hw().select();
            let result = self.bus.transfer_blocking(&tx, &mut rx);
            self.bus.hw().deselect();
            result
        })
    }

    /// Read a masked bit-field out of a register. Pure software composition
    /// on top of one register read; no extra bus traffic.
    pub fn subregister_read(&self, address: u8, mask: u8, shift: u8) -> Result<u8, DriverError> {
        Ok((self.register_read(address)? & mask) >> shift)
    }

    /// Read-modify-write a masked bit-field.
    ///
    /// The whole sequence holds one critical section, so no other writer of
    /// the same register can interleave between the read and the
    /// write-back. Bits outside `mask` are preserved.
    pub fn subregister_write(
        &self,
        address: u8,
        mask: u8,
        shift: u8,
        value: u8,
    ) -> Result<(), DriverError> {
        critical_section::with(|_cs| {
            let current = self.register_read(address)?;
            let merged = (current & !mask) | ((value << shift) & mask);
            self.register_write(address, merged)
        })
    }

    /// Upload a frame to the transceiver's packet buffer: command opcode,
    /// PHR length byte, then the PSDU streamed under one chip-select
    /// assertion with the usual wait-for-complete discipline per byte.
    pub fn frame_write(&self, frame: &[u8]) -> Result<(), DriverError> {
        if frame.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        if frame.len() > regs::MAX_FRAME_SIZE {
            return Err(DriverError::FrameTooLarge);
        }
        critical_section::with(|_cs| {
            self.bus.hw().select();
            let result = self
                .bus
                .write_blocking(&[cmd::FRAME_WRITE, frame.len() as u8])
                .and_then(|_| self.bus.write_blocking(frame));
            self.bus.hw().deselect();
            result
        })
    }

    /// Download the received frame: the chip answers the command opcode
    /// with the PHR length byte, then streams that many PSDU bytes into
    /// `buf`. Returns the frame length.
    pub fn frame_read(&self, buf: &mut [u8]) -> Result<usize, DriverError> {
        critical_section::with(|_cs| {
            self.bus.hw().select();
            let result = self.frame_read_locked(buf);
            self.bus.hw().deselect();
            result
        })
    }

    fn frame_read_locked(&self, buf: &mut [u8]) -> Result<usize, DriverError> {
        let tx = [cmd::FRAME_READ, 0];
        let mut rx = [0u8; 2];
        self.bus.transfer_blocking(&tx, &mut rx)?;

        let length = rx[1] as usize;
        if length == 0 || length > regs::MAX_FRAME_SIZE {
            return Err(DriverError::FrameTooLarge);
        }
        if length > buf.len() {
            return Err(DriverError::FrameTooLarge);
        }
        self.bus.read_blocking(&mut buf[..length])?;
        Ok(length)
    }

    // ---- convenience on top of the register protocol ----------------------

    /// Transceiver part number, for probing the chip at bring-up
    pub fn part_number(&self) -> Result<u8, DriverError> {
        self.register_read(regs::PART_NUM)
    }

    /// Low five bits of TRX_STATUS
    pub fn trx_status(&self) -> Result<u8, DriverError> {
        let (mask, shift) = regs::sub::TRX_STATUS;
        self.subregister_read(regs::TRX_STATUS, mask, shift)
    }

    /// Issue a state-machine command through TRX_STATE.trx_cmd
    pub fn state_command(&self, command: u8) -> Result<(), DriverError> {
        let (mask, shift) = regs::sub::TRX_CMD;
        self.subregister_write(regs::TRX_STATE, mask, shift, command)
    }

    /// Tune to an IEEE 802.15.4 channel (11..=26)
    pub fn set_channel(&self, channel: u8) -> Result<(), DriverError> {
        if !(11..=26).contains(&channel) {
            return Err(DriverError::InvalidArgument);
        }
        let (mask, shift) = regs::sub::CHANNEL;
        self.subregister_write(regs::PHY_CC_CCA, mask, shift, channel)
    }

    // ---- interrupt bridge -------------------------------------------------

    /// Install the transceiver interrupt handler, replacing any previous one
    pub fn set_irq_handler(&self, handler: IrqHandler) {
        critical_section::with(|cs| self.irq_handler.borrow(cs).set(Some(handler)));
    }

    /// Currently installed interrupt handler, if any
    pub fn irq_handler(&self) -> Option<IrqHandler> {
        critical_section::with(|cs| self.irq_handler.borrow(cs).get())
    }

    /// Remove the interrupt handler; further events are dropped
    pub fn clear_irq_handler(&self) {
        critical_section::with(|cs| self.irq_handler.borrow(cs).set(None));
    }

    /// Transceiver interrupt vector: read the interrupt-status register
    /// (which also clears it in the chip) and hand the status byte to the
    /// installed handler. No handler, or a bus already mid-transfer, means
    /// the event is dropped; a higher layer is expected to tolerate that.
    pub fn handle_interrupt(&self) {
        let status = match self.register_read(regs::IRQ_STATUS) {
            Ok(status) => status,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("transceiver event dropped, bus busy");
                return;
            }
        };
        if let Some(handler) = self.irq_handler() {
            handler(status);
        }
    }
}
