//! Interrupt dispatch layer
//!
//! Routes each hardware interrupt vector to exactly one subsystem entry
//! point. The table is fixed at construction; there is no runtime
//! re-binding.

use crate::hal::{IrqController, SpiHal, TimerHal};
use crate::radio::Radio;
use crate::timer::SystemTimer;

/// The four interrupt vectors this core consumes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Vector {
    /// Free-running counter wrapped: extend the tick count high word
    TimerOverflow,
    /// Compare channel A: high-priority delay state machine
    DelayCompare,
    /// Compare channel B: slow-tick accrual and re-arm
    SlowTickCompare,
    /// Transceiver IRQ line captured: status read and callback
    TransceiverIrq,
}

/// Vector-to-subsystem routing, one handler per vector.
///
/// The board's vector stubs call [`InterruptDispatch::dispatch`] with the
/// vector that fired; the hardware pending flag is acknowledged here before
/// the subsystem handler runs.
pub struct InterruptDispatch<'a, I, T, S>
where
    I: IrqController,
    T: TimerHal,
    S: SpiHal,
{
    irq: &'a I,
    timer: &'a SystemTimer<T>,
    radio: &'a Radio<'a, S>,
}

impl<'a, I, T, S> InterruptDispatch<'a, I, T, S>
where
    I: IrqController,
    T: TimerHal,
    S: SpiHal,
{
    pub fn new(irq: &'a I, timer: &'a SystemTimer<T>, radio: &'a Radio<'a, S>) -> Self {
        Self { irq, timer, radio }
    }

    /// Acknowledge and service one vector
    pub fn dispatch(&self, vector: Vector) {
        self.irq.acknowledge(vector);
        match vector {
            Vector::TimerOverflow => self.timer.handle_overflow(),
            Vector::DelayCompare => self.timer.handle_delay_compare(),
            Vector::SlowTickCompare => self.timer.handle_slow_tick_compare(),
            Vector::TransceiverIrq => self.radio.handle_interrupt(),
        }
    }
}
