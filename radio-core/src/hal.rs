//! Hardware traits consumed by the core subsystems
//!
//! One board supplies exactly one implementation of each trait; the core
//! never touches a register directly. All methods take `&self` because the
//! same hardware handle is reached from both main-line code and interrupt
//! context on a single-core machine.

use crate::types::BusConfig;
use crate::isr::Vector;

/// Dual-channel 16-bit hardware timer.
///
/// Channel A is the high-priority delay compare, channel B the slow-tick
/// compare. The counter free-runs and overflows naturally at 0xFFFF.
pub trait TimerHal {
    /// Start the counter free-running and clear any pending status flags
    fn start(&self);

    /// Disable the peripheral clock and power the timer down
    fn stop(&self);

    /// Current value of the free-running counter
    fn counter(&self) -> u16;

    /// Arm the delay compare register (channel A) at an absolute count
    fn set_delay_compare(&self, at: u16);

    fn enable_delay_irq(&self);
    fn disable_delay_irq(&self);

    /// Clear a stale channel A compare-match flag
    fn clear_delay_flag(&self);

    /// Arm the slow-tick compare register (channel B) at an absolute count
    fn set_slow_tick_compare(&self, at: u16);

    fn enable_slow_tick_irq(&self);
    fn disable_slow_tick_irq(&self);
    fn clear_slow_tick_flag(&self);

    fn enable_overflow_irq(&self);
    fn disable_overflow_irq(&self);
}

/// Byte-granular full-duplex serial bus peripheral.
///
/// `write_data` starts an exchange; `transfer_complete` goes high when the
/// shifted-in byte is ready in the data register for `read_data`.
pub trait SpiHal {
    /// Apply a bus configuration. Always succeeds; every combination of
    /// role, mode, bit order and divider is representable in hardware.
    fn configure(&self, config: &BusConfig);

    /// Assert the slave select line
    fn select(&self);

    /// Deassert the slave select line
    fn deselect(&self);

    /// Load a byte into the shift register, starting the exchange
    fn write_data(&self, byte: u8);

    /// True once the current exchange has finished
    fn transfer_complete(&self) -> bool;

    /// Read the byte captured by the last completed exchange
    fn read_data(&self) -> u8;
}

/// Hardware-side acknowledge for the four interrupt vectors
pub trait IrqController {
    /// Clear the pending flag for `vector` at the interrupt controller
    fn acknowledge(&self, vector: Vector);
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Scriptable hardware stand-ins for host testing

    use super::*;
    use core::cell::{Cell, RefCell};
    use heapless::Deque;
    use portable_atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

    /// Mock dual-channel timer with manually advanced counter.
    ///
    /// Atomic state so the mock can stand in for hardware shared with
    /// interrupt context, exactly like the real peripherals.
    #[derive(Default)]
    pub struct MockTimer {
        counter: AtomicU16,
        delay_compare: AtomicU16,
        slow_tick_compare: AtomicU16,
        delay_irq: AtomicBool,
        slow_tick_irq: AtomicBool,
        overflow_irq: AtomicBool,
        delay_flag_clears: AtomicUsize,
        running: AtomicBool,
    }

    impl MockTimer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the free-running counter to an exact value
        pub fn set_counter(&self, value: u16) {
            self.counter.store(value, Ordering::Relaxed);
        }

        /// Advance the counter, wrapping like the hardware does
        pub fn advance(&self, ticks: u16) {
            let counter = self.counter.load(Ordering::Relaxed);
            self.counter.store(counter.wrapping_add(ticks), Ordering::Relaxed);
        }

        pub fn delay_compare(&self) -> u16 {
            self.delay_compare.load(Ordering::Relaxed)
        }

        pub fn slow_tick_compare(&self) -> u16 {
            self.slow_tick_compare.load(Ordering::Relaxed)
        }

        pub fn delay_irq_enabled(&self) -> bool {
            self.delay_irq.load(Ordering::Relaxed)
        }

        pub fn slow_tick_irq_enabled(&self) -> bool {
            self.slow_tick_irq.load(Ordering::Relaxed)
        }

        pub fn overflow_irq_enabled(&self) -> bool {
            self.overflow_irq.load(Ordering::Relaxed)
        }

        pub fn delay_flag_clears(&self) -> usize {
            self.delay_flag_clears.load(Ordering::Relaxed)
        }

        pub fn running(&self) -> bool {
            self.running.load(Ordering::Relaxed)
        }
    }

    impl TimerHal for MockTimer {
        fn start(&self) {
            self.running.store(true, Ordering::Relaxed);
        }

        fn stop(&self) {
            self.running.store(false, Ordering::Relaxed);
        }

        fn counter(&self) -> u16 {
            self.counter.load(Ordering::Relaxed)
        }

        fn set_delay_compare(&self, at: u16) {
            self.delay_compare.store(at, Ordering::Relaxed);
        }

        fn enable_delay_irq(&self) {
            self.delay_irq.store(true, Ordering::Relaxed);
        }

        fn disable_delay_irq(&self) {
            self.delay_irq.store(false, Ordering::Relaxed);
        }

        fn clear_delay_flag(&self) {
            self.delay_flag_clears.fetch_add(1, Ordering::Relaxed);
        }

        fn set_slow_tick_compare(&self, at: u16) {
            self.slow_tick_compare.store(at, Ordering::Relaxed);
        }

        fn enable_slow_tick_irq(&self) {
            self.slow_tick_irq.store(true, Ordering::Relaxed);
        }

        fn disable_slow_tick_irq(&self) {
            self.slow_tick_irq.store(false, Ordering::Relaxed);
        }

        fn clear_slow_tick_flag(&self) {}

        fn enable_overflow_irq(&self) {
            self.overflow_irq.store(true, Ordering::Relaxed);
        }

        fn disable_overflow_irq(&self) {
            self.overflow_irq.store(false, Ordering::Relaxed);
        }
    }

    /// Mock bus peripheral.
    ///
    /// Outgoing bytes are recorded in `written`; incoming bytes come from a
    /// scripted reply queue, or echo the last written byte in loopback mode,
    /// or read as zero.
    #[derive(Default)]
    pub struct MockSpi {
        pub config: RefCell<Option<BusConfig>>,
        pub written: RefCell<heapless::Vec<u8, 256>>,
        replies: RefCell<Deque<u8, 256>>,
        last_written: Cell<u8>,
        loopback: Cell<bool>,
        pub selected: Cell<bool>,
        pub select_count: Cell<usize>,
        pub deselect_count: Cell<usize>,
    }

    impl MockSpi {
        pub fn new() -> Self {
            Self::default()
        }

        /// Echo every written byte back instead of using scripted replies
        pub fn set_loopback(&self, on: bool) {
            self.loopback.set(on);
        }

        /// Queue bytes the peer will answer with, in order
        pub fn script_replies(&self, bytes: &[u8]) {
            let mut replies = self.replies.borrow_mut();
            for &b in bytes {
                replies.push_back(b).ok();
            }
        }

        /// Bytes shifted out so far
        pub fn written_bytes(&self) -> heapless::Vec<u8, 256> {
            self.written.borrow().clone()
        }
    }

    impl SpiHal for MockSpi {
        fn configure(&self, config: &BusConfig) {
            *self.config.borrow_mut() = Some(*config);
        }

        fn select(&self) {
            self.selected.set(true);
            self.select_count.set(self.select_count.get() + 1);
        }

        fn deselect(&self) {
            self.selected.set(false);
            self.deselect_count.set(self.deselect_count.get() + 1);
        }

        fn write_data(&self, byte: u8) {
            self.written.borrow_mut().push(byte).ok();
            self.last_written.set(byte);
        }

        fn transfer_complete(&self) -> bool {
            true
        }

        fn read_data(&self) -> u8 {
            if let Some(b) = self.replies.borrow_mut().pop_front() {
                b
            } else if self.loopback.get() {
                self.last_written.get()
            } else {
                0
            }
        }
    }

    /// Records which vectors were acknowledged, in order
    #[derive(Default)]
    pub struct MockIrqController {
        pub acknowledged: RefCell<heapless::Vec<Vector, 32>>,
    }

    impl MockIrqController {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl IrqController for MockIrqController {
        fn acknowledge(&self, vector: Vector) {
            self.acknowledged.borrow_mut().push(vector).ok();
        }
    }
}
