//! System clock, high-priority delay scheduler and slow-tick dispatcher
//!
//! All three share the one dual-channel hardware timer, so they live in a
//! single context object. The tick counter and pending-tick counter are
//! atomics because the interrupt side writes them directly; the callback
//! slots sit behind critical-section protected cells because main-line
//! code mutates them while the interrupt side reads.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use portable_atomic::{AtomicU16, Ordering};

use crate::hal::TimerHal;
use crate::types::DriverError;

/// Handler invoked from interrupt context when a high-priority delay
/// expires. Executes with all other interrupts masked for its full
/// duration; keep it short.
pub type DelayHandler = &'static (dyn Fn() + Sync);

/// Handler invoked once per accrued slow tick from [`SystemTimer::run_pending`]
pub type TickHandler = &'static (dyn Fn() + Sync);

/// Init-time timer parameters
#[derive(Copy, Clone, Debug)]
pub struct TimerConfig {
    /// Slow-tick period in raw ticks (a ~20 ms equivalent on real boards)
    pub slow_tick_reload: u16,
}

impl Default for TimerConfig {
    fn default() -> Self {
        // 20 ms at a 1 MHz tick after the usual /8 prescaler
        Self {
            slow_tick_reload: 20_000,
        }
    }
}

/// At most one live delay request; a new one is rejected while this is
/// outstanding. No queuing.
#[derive(Default)]
struct DelayRequest {
    remaining_high: u16,
    remaining_low: u16,
    handler: Option<DelayHandler>,
}

/// Monotonic system time plus the two compare-channel services.
///
/// `now()` is safe from any context including other interrupts; everything
/// else follows the shared-resource discipline described per method.
pub struct SystemTimer<H: TimerHal> {
    hw: H,
    config: TimerConfig,
    high_word: AtomicU16,
    delay: Mutex<RefCell<DelayRequest>>,
    pending_ticks: AtomicU16,
    tick_handler: Mutex<Cell<Option<TickHandler>>>,
}

impl<H: TimerHal> SystemTimer<H> {
    pub fn new(hw: H, config: TimerConfig) -> Self {
        Self {
            hw,
            config,
            high_word: AtomicU16::new(0),
            delay: Mutex::new(RefCell::new(DelayRequest::default())),
            pending_ticks: AtomicU16::new(0),
            tick_handler: Mutex::new(Cell::new(None)),
        }
    }

    /// Start the timer free-running, zero all software state and enable the
    /// overflow and slow-tick interrupts.
    pub fn initialize(&self) {
        critical_section::with(|cs| {
            self.high_word.store(0, Ordering::Release);
            self.pending_ticks.store(0, Ordering::Release);
            *self.delay.borrow_ref_mut(cs) = DelayRequest::default();
            self.tick_handler.borrow(cs).set(None);

            self.hw.start();
            self.hw
                .set_slow_tick_compare(self.hw.counter().wrapping_add(self.config.slow_tick_reload));
            self.hw.enable_overflow_irq();
            self.hw.enable_slow_tick_irq();
        });
        #[cfg(feature = "defmt")]
        defmt::debug!("system timer running, slow tick every {} ticks", self.config.slow_tick_reload);
    }

    /// Disable all timer interrupts and power the peripheral down
    pub fn deinitialize(&self) {
        critical_section::with(|_cs| {
            self.hw.disable_overflow_irq();
            self.hw.disable_slow_tick_irq();
            self.hw.disable_delay_irq();
            self.hw.stop();
        });
    }

    /// Direct access to the timer hardware, for the board's vector glue
    pub fn hw(&self) -> &H {
        &self.hw
    }

    // ---- system clock -----------------------------------------------------

    /// Current 32-bit tick count.
    ///
    /// Double-read of the software high word around the hardware low word;
    /// a read is valid only when the high word is unchanged, otherwise it
    /// retries. Never blocks and takes no critical section: the overflow
    /// interrupt cannot race more than one increment ahead between reads on
    /// this architecture, so the retry loop is the whole correctness story.
    pub fn now(&self) -> u32 {
        loop {
            let high = self.high_word.load(Ordering::Acquire);
            let low = self.hw.counter();
            if self.high_word.load(Ordering::Acquire) == high {
                return (u32::from(high) << 16) | u32::from(low);
            }
        }
    }

    /// Timer overflow vector: extend the hardware counter into the high word
    pub fn handle_overflow(&self) {
        self.high_word.fetch_add(1, Ordering::AcqRel);
    }

    // ---- high-priority delay ----------------------------------------------

    /// Schedule a one-shot `handler` after `ticks` raw ticks.
    ///
    /// Rejects zero-length delays and rejects with [`DriverError::Busy`]
    /// while a delay is already outstanding, leaving it untouched. The
    /// whole arm sequence runs inside a critical section so the compare
    /// handler cannot observe a half-built request.
    ///
    /// Delays longer than 0xFFFF ticks are burned in full 0xFFFF spans and
    /// complete after `((ticks >> 16) + 1) * 0xFFFF + (ticks & 0xFFFF)` raw
    /// ticks, slightly past the requested count.
    pub fn start_delay(&self, ticks: u32, handler: DelayHandler) -> Result<(), DriverError> {
        if ticks == 0 {
            return Err(DriverError::InvalidArgument);
        }
        critical_section::with(|cs| {
            let mut slot = self.delay.borrow_ref_mut(cs);
            if slot.handler.is_some() {
                return Err(DriverError::Busy);
            }

            let high = (ticks >> 16) as u16;
            let low = ticks as u16;
            slot.handler = Some(handler);
            if high == 0 {
                // The delay completes on this one compare match
                slot.remaining_high = 0;
                slot.remaining_low = 0;
                self.hw.set_delay_compare(self.hw.counter().wrapping_add(low));
            } else {
                // Burn the high half off in maximal 0xFFFF spans first
                slot.remaining_high = high;
                slot.remaining_low = low;
                self.hw.set_delay_compare(self.hw.counter().wrapping_add(0xFFFF));
            }
            self.hw.clear_delay_flag();
            self.hw.enable_delay_irq();
            Ok(())
        })
    }

    /// Cancel any outstanding delay. Safe to call whether or not one is
    /// active; the installed handler is dropped without being invoked.
    pub fn stop_delay(&self) {
        critical_section::with(|cs| {
            *self.delay.borrow_ref_mut(cs) = DelayRequest::default();
            self.hw.disable_delay_irq();
        });
    }

    /// True while a delay request is outstanding
    pub fn delay_active(&self) -> bool {
        critical_section::with(|cs| self.delay.borrow_ref(cs).handler.is_some())
    }

    /// Delay compare vector (channel A).
    ///
    /// Three-way countdown: burn a full 0xFFFF span per remaining high-word
    /// count, then one span for a nonzero low remainder, then complete by
    /// disabling the interrupt and invoking the handler once. With no
    /// handler installed the interrupt is disabled and nothing else happens.
    pub fn handle_delay_compare(&self) {
        let fired = critical_section::with(|cs| {
            let mut slot = self.delay.borrow_ref_mut(cs);
            if slot.handler.is_none() {
                // Defensive idle state: nothing scheduled, stop firing
                self.hw.disable_delay_irq();
                return None;
            }
            if slot.remaining_high > 0 {
                slot.remaining_high -= 1;
                self.hw.set_delay_compare(self.hw.counter().wrapping_add(0xFFFF));
                return None;
            }
            if slot.remaining_low > 0 {
                let span = slot.remaining_low;
                slot.remaining_low = 0;
                self.hw.set_delay_compare(self.hw.counter().wrapping_add(span));
                return None;
            }
            self.hw.disable_delay_irq();
            slot.handler.take()
        });
        // One-shot contract: slot already cleared, so the handler may
        // schedule the next delay immediately.
        if let Some(handler) = fired {
            handler();
        }
    }

    // ---- slow tick --------------------------------------------------------

    /// Install the slow-tick handler, replacing any previous one
    pub fn install_tick_handler(&self, handler: TickHandler) {
        critical_section::with(|cs| self.tick_handler.borrow(cs).set(Some(handler)));
    }

    /// Currently installed slow-tick handler, if any
    pub fn tick_handler(&self) -> Option<TickHandler> {
        critical_section::with(|cs| self.tick_handler.borrow(cs).get())
    }

    /// Remove the slow-tick handler; subsequent ticks are discarded
    pub fn remove_tick_handler(&self) {
        critical_section::with(|cs| self.tick_handler.borrow(cs).set(None));
    }

    /// Slow-tick compare vector (channel B): accrue one pending tick and
    /// re-arm a full period ahead of the current count, keeping the period
    /// free-running regardless of main-loop latency.
    pub fn handle_slow_tick_compare(&self) {
        self.pending_ticks.fetch_add(1, Ordering::AcqRel);
        self.hw
            .set_slow_tick_compare(self.hw.counter().wrapping_add(self.config.slow_tick_reload));
    }

    /// Number of slow ticks waiting to be dispatched
    pub fn pending_ticks(&self) -> u16 {
        self.pending_ticks.load(Ordering::Acquire)
    }

    /// Cooperative dispatch point, called from the main loop.
    ///
    /// With no handler installed the backlog is discarded so it cannot grow
    /// without bound. Otherwise the handler runs once per tick pending at
    /// entry; ticks accruing while the handler runs are kept for the next
    /// call.
    pub fn run_pending(&self) {
        let handler = self.tick_handler();
        let Some(handler) = handler else {
            self.pending_ticks.store(0, Ordering::Release);
            return;
        };
        let due = self.pending_ticks.load(Ordering::Acquire);
        for _ in 0..due {
            handler();
            self.pending_ticks.fetch_sub(1, Ordering::AcqRel);
        }
    }
}
