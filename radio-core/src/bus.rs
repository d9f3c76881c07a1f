//! Serial bus transaction driver
//!
//! One transfer may be in flight at a time; the `busy` flag gates new
//! requests and any attempt to start a second transfer is a caller error,
//! surfaced as [`DriverError::Busy`] with no retry or queuing.

use core::cell::RefCell;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, Ordering};

use crate::hal::SpiHal;
use crate::types::{BusConfig, DriverError};

/// Capacity of the buffered-mode staging buffer in bytes
pub const BUFFER_CAPACITY: usize = 32;

/// Descriptor for an interrupt-driven buffered transfer.
///
/// The write cursor leads the read cursor by one byte; received bytes
/// replace sent ones in place. The transfer ends when the read cursor
/// reaches the end marker.
#[derive(Default)]
struct BufferedTransfer {
    buf: [u8; BUFFER_CAPACITY],
    len: usize,
    write_pos: usize,
    read_pos: usize,
}

/// Byte-oriented serial bus driver shared by every peripheral.
///
/// The blocking variant holds the calling context for the full duration of
/// the transfer (proportional to length times bit time); do not call it
/// from a context that must stay responsive to time-critical interrupts
/// unless that cost is acceptable. There is no timeout: an unresponsive
/// peripheral stalls the caller.
pub struct SpiBus<H: SpiHal> {
    hw: H,
    busy: AtomicBool,
    buffered: Mutex<RefCell<BufferedTransfer>>,
}

impl<H: SpiHal> SpiBus<H> {
    pub fn new(hw: H) -> Self {
        Self {
            hw,
            busy: AtomicBool::new(false),
            buffered: Mutex::new(RefCell::new(BufferedTransfer::default())),
        }
    }

    /// Configure the bus peripheral and reset busy/descriptor state.
    ///
    /// Cannot fail: no invalid combination of role, mode, bit order and
    /// divider is representable.
    pub fn initialize(&self, config: &BusConfig) {
        self.hw.configure(config);
        critical_section::with(|cs| {
            *self.buffered.borrow_ref_mut(cs) = BufferedTransfer::default();
        });
        self.busy.store(false, Ordering::Release);
        #[cfg(feature = "defmt")]
        defmt::debug!("spi bus configured");
    }

    /// Direct access to the bus peripheral, for chip-select framing by the
    /// protocol layer that owns the transaction.
    pub fn hw(&self) -> &H {
        &self.hw
    }

    /// Non-blocking status query
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn claim(&self) -> Result<(), DriverError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| DriverError::Busy)
    }

    /// Full-duplex blocking transfer.
    ///
    /// Writes `tx[0]`, then for each following byte waits for the transfer
    /// complete flag, captures the previous response into `rx`, and writes
    /// the next outgoing byte; one final wait captures the last response.
    /// A one-byte transfer is exactly one send/receive exchange.
    pub fn transfer_blocking(&self, tx: &[u8], rx: &mut [u8]) -> Result<(), DriverError> {
        if tx.is_empty() || rx.len() < tx.len() {
            return Err(DriverError::InvalidArgument);
        }
        self.claim()?;

        self.hw.write_data(tx[0]);
        for i in 1..tx.len() {
            while !self.hw.transfer_complete() {}
            rx[i - 1] = self.hw.read_data();
            self.hw.write_data(tx[i]);
        }
        while !self.hw.transfer_complete() {}
        rx[tx.len() - 1] = self.hw.read_data();

        self.busy.store(false, Ordering::Release);
        Ok(())
    }

    /// Write-only blocking stream; responses are clocked in and discarded.
    ///
    /// Same wait-for-complete discipline as [`Self::transfer_blocking`].
    pub fn write_blocking(&self, tx: &[u8]) -> Result<(), DriverError> {
        if tx.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        self.claim()?;

        for &byte in tx {
            self.hw.write_data(byte);
            while !self.hw.transfer_complete() {}
            let _ = self.hw.read_data();
        }

        self.busy.store(false, Ordering::Release);
        Ok(())
    }

    /// Read-only blocking stream; dummy zero bytes are clocked out.
    pub fn read_blocking(&self, rx: &mut [u8]) -> Result<(), DriverError> {
        if rx.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        self.claim()?;

        for byte in rx.iter_mut() {
            self.hw.write_data(0);
            while !self.hw.transfer_complete() {}
            *byte = self.hw.read_data();
        }

        self.busy.store(false, Ordering::Release);
        Ok(())
    }

    /// Start an interrupt-driven buffered transfer and return immediately.
    ///
    /// `data` is copied into the internal buffer, the descriptor is armed
    /// and the first byte sent; the rest of the exchange continues from
    /// [`Self::handle_transfer_complete`] until the end marker is reached,
    /// at which point the busy flag clears.
    pub fn transfer_buffered(&self, data: &[u8]) -> Result<(), DriverError> {
        if data.is_empty() {
            return Err(DriverError::InvalidArgument);
        }
        if data.len() > BUFFER_CAPACITY {
            return Err(DriverError::FrameTooLarge);
        }
        self.claim()?;

        critical_section::with(|cs| {
            let mut t = self.buffered.borrow_ref_mut(cs);
            t.buf[..data.len()].copy_from_slice(data);
            t.len = data.len();
            t.write_pos = 1;
            t.read_pos = 0;
            self.hw.write_data(t.buf[0]);
        });
        Ok(())
    }

    /// Interrupt-context continuation of a buffered transfer.
    ///
    /// Bound to the bus transfer-complete vector while buffered mode is in
    /// use; each invocation stores the received byte and sends the next one.
    pub fn handle_transfer_complete(&self) {
        if !self.busy.load(Ordering::Acquire) {
            // Spurious interrupt with no transfer armed
            return;
        }
        critical_section::with(|cs| {
            let mut t = self.buffered.borrow_ref_mut(cs);
            if t.read_pos >= t.len {
                return;
            }
            let pos = t.read_pos;
            t.buf[pos] = self.hw.read_data();
            t.read_pos += 1;
            if t.write_pos < t.len {
                let next = t.buf[t.write_pos];
                self.hw.write_data(next);
                t.write_pos += 1;
            } else if t.read_pos == t.len {
                self.busy.store(false, Ordering::Release);
            }
        });
    }

    /// Copy out the bytes received by the last completed buffered transfer.
    ///
    /// Returns the transfer length, or [`DriverError::Busy`] while the
    /// exchange is still running.
    pub fn read_buffered(&self, out: &mut [u8]) -> Result<usize, DriverError> {
        if self.is_busy() {
            return Err(DriverError::Busy);
        }
        critical_section::with(|cs| {
            let t = self.buffered.borrow_ref(cs);
            if out.len() < t.len {
                return Err(DriverError::InvalidArgument);
            }
            out[..t.len].copy_from_slice(&t.buf[..t.len]);
            Ok(t.len)
        })
    }
}
