//! Board wiring for an AT90USB1287-class radio stick
//!
//! This is the fixed pin/register mapping table the core consumes: Timer1
//! provides the system tick and both compare channels, the SPI peripheral
//! talks to the transceiver, and the transceiver IRQ line is wired to the
//! Timer1 input-capture unit. Nothing in here contains policy; it is all
//! volatile register plumbing behind the `radio-core` hardware traits.

use core::cell::Cell;
use core::ptr;

use critical_section::Mutex;
use embedded_hal::spi::{Phase, Polarity};
use radio_core::hal::{IrqController, SpiHal, TimerHal};
use radio_core::{BitOrder, BusConfig, BusRole, ClockDivider, Vector};

/// Core clock after the CKDIV8 fuse is cleared
pub const CPU_HZ: u32 = 8_000_000;

/// Timer1 runs from the core clock through a /8 prescaler
pub const TICK_HZ: u32 = CPU_HZ / 8;

/// Slow-tick period, a 20 ms equivalent in raw ticks
pub const SLOW_TICK_RELOAD: u16 = (TICK_HZ / 1000 * 20) as u16;

// Timer1
const TCCR1A: usize = 0x80;
const TCCR1B: usize = 0x81;
const TCNT1L: usize = 0x84;
const TCNT1H: usize = 0x85;
const OCR1AL: usize = 0x88;
const OCR1AH: usize = 0x89;
const OCR1BL: usize = 0x8A;
const OCR1BH: usize = 0x8B;
const TIMSK1: usize = 0x6F;
const TIFR1: usize = 0x36;
const PRR0: usize = 0x64;

const TOIE1: u8 = 0x01;
const OCIE1A: u8 = 0x02;
const OCIE1B: u8 = 0x04;
const ICIE1: u8 = 0x20;
const TOV1: u8 = 0x01;
const OCF1A: u8 = 0x02;
const OCF1B: u8 = 0x04;
const ICF1: u8 = 0x20;
const CS_DIV8: u8 = 0x02;
const PRTIM1: u8 = 0x08;

// SPI
const SPCR: usize = 0x4C;
const SPSR: usize = 0x4D;
const SPDR: usize = 0x4E;
const SPE: u8 = 0x40;
const DORD: u8 = 0x20;
const MSTR: u8 = 0x10;
const CPOL: u8 = 0x08;
const CPHA: u8 = 0x04;
const SPIF: u8 = 0x80;
const SPI2X: u8 = 0x01;

// Port B carries the bus: SS = PB0, SCK = PB1, MOSI = PB2, MISO = PB3
const DDRB: usize = 0x24;
const PORTB: usize = 0x25;
const SS: u8 = 0x01;
const SCK: u8 = 0x02;
const MOSI: u8 = 0x04;

#[inline(always)]
fn reg_read(addr: usize) -> u8 {
    unsafe { ptr::read_volatile(addr as *const u8) }
}

#[inline(always)]
fn reg_write(addr: usize, value: u8) {
    unsafe { ptr::write_volatile(addr as *mut u8, value) }
}

#[inline(always)]
fn reg_set(addr: usize, bits: u8) {
    reg_write(addr, reg_read(addr) | bits);
}

#[inline(always)]
fn reg_clear(addr: usize, bits: u8) {
    reg_write(addr, reg_read(addr) & !bits);
}

/// Timer1 behind the core's [`TimerHal`] trait
pub struct BoardTimer;

impl TimerHal for BoardTimer {
    fn start(&self) {
        reg_clear(PRR0, PRTIM1);
        reg_write(TCCR1A, 0); // normal mode, counter free-runs to 0xFFFF
        reg_write(TCCR1B, CS_DIV8);
        reg_write(TIFR1, TOV1 | OCF1A | OCF1B | ICF1);
    }

    fn stop(&self) {
        reg_write(TCCR1B, 0);
        reg_set(PRR0, PRTIM1);
    }

    fn counter(&self) -> u16 {
        // Low byte first; the hardware latches the high byte alongside it
        let low = reg_read(TCNT1L);
        let high = reg_read(TCNT1H);
        u16::from_le_bytes([low, high])
    }

    fn set_delay_compare(&self, at: u16) {
        let [low, high] = at.to_le_bytes();
        reg_write(OCR1AH, high);
        reg_write(OCR1AL, low);
    }

    fn enable_delay_irq(&self) {
        reg_set(TIMSK1, OCIE1A);
    }

    fn disable_delay_irq(&self) {
        reg_clear(TIMSK1, OCIE1A);
    }

    fn clear_delay_flag(&self) {
        reg_write(TIFR1, OCF1A);
    }

    fn set_slow_tick_compare(&self, at: u16) {
        let [low, high] = at.to_le_bytes();
        reg_write(OCR1BH, high);
        reg_write(OCR1BL, low);
    }

    fn enable_slow_tick_irq(&self) {
        reg_set(TIMSK1, OCIE1B);
    }

    fn disable_slow_tick_irq(&self) {
        reg_clear(TIMSK1, OCIE1B);
    }

    fn clear_slow_tick_flag(&self) {
        reg_write(TIFR1, OCF1B);
    }

    fn enable_overflow_irq(&self) {
        reg_set(TIMSK1, TOIE1);
    }

    fn disable_overflow_irq(&self) {
        reg_clear(TIMSK1, TOIE1);
    }
}

/// SPI peripheral behind the core's [`SpiHal`] trait.
///
/// The transceiver is the only slave on this bus; its chip select rides the
/// SS line directly.
pub struct BoardSpi;

impl BoardSpi {
    fn control_bits(config: &BusConfig) -> (u8, u8) {
        let mut spcr = SPE;
        if config.role == BusRole::Master {
            spcr |= MSTR;
        }
        if config.bit_order == BitOrder::LsbFirst {
            spcr |= DORD;
        }
        if config.mode.polarity == Polarity::IdleHigh {
            spcr |= CPOL;
        }
        if config.mode.phase == Phase::CaptureOnSecondTransition {
            spcr |= CPHA;
        }
        // SPR1:0 plus the SPI2X doubler cover all seven dividers
        let (spr, spi2x) = match config.divider {
            ClockDivider::Div2 => (0x00, SPI2X),
            ClockDivider::Div4 => (0x00, 0),
            ClockDivider::Div8 => (0x01, SPI2X),
            ClockDivider::Div16 => (0x01, 0),
            ClockDivider::Div32 => (0x02, SPI2X),
            ClockDivider::Div64 => (0x02, 0),
            ClockDivider::Div128 => (0x03, 0),
        };
        (spcr | spr, spi2x)
    }
}

impl SpiHal for BoardSpi {
    fn configure(&self, config: &BusConfig) {
        if config.role == BusRole::Master {
            reg_set(DDRB, SS | SCK | MOSI);
            reg_set(PORTB, SS); // deselected
        } else {
            reg_clear(DDRB, SS | SCK | MOSI);
        }
        let (spcr, spsr) = Self::control_bits(config);
        reg_write(SPCR, spcr);
        reg_write(SPSR, spsr);
    }

    fn select(&self) {
        reg_clear(PORTB, SS);
    }

    fn deselect(&self) {
        reg_set(PORTB, SS);
    }

    fn write_data(&self, byte: u8) {
        reg_write(SPDR, byte);
    }

    fn transfer_complete(&self) -> bool {
        reg_read(SPSR) & SPIF != 0
    }

    fn read_data(&self) -> u8 {
        reg_read(SPDR)
    }
}

/// Hardware flag acknowledge for the four vectors.
///
/// All four live in TIFR1 on this board; the transceiver IRQ arrives
/// through the input-capture unit.
pub struct BoardIrq;

impl IrqController for BoardIrq {
    fn acknowledge(&self, vector: Vector) {
        let flag = match vector {
            Vector::TimerOverflow => TOV1,
            Vector::DelayCompare => OCF1A,
            Vector::SlowTickCompare => OCF1B,
            Vector::TransceiverIrq => ICF1,
        };
        reg_write(TIFR1, flag);
    }
}

/// Enable the input-capture interrupt carrying the transceiver IRQ line
pub fn enable_transceiver_irq() {
    reg_write(TIFR1, ICF1);
    reg_set(TIMSK1, ICIE1);
}

/// Mask the transceiver IRQ at the capture unit
pub fn disable_transceiver_irq() {
    reg_clear(TIMSK1, ICIE1);
}

type Dispatch = radio_core::InterruptDispatch<'static, BoardIrq, BoardTimer, BoardSpi>;

static DISPATCH: Mutex<Cell<Option<&'static Dispatch>>> = Mutex::new(Cell::new(None));

/// Bind the dispatcher the vector stubs forward to. Call once at startup,
/// before interrupts are enabled globally.
pub fn bind_vectors(dispatch: &'static Dispatch) {
    critical_section::with(|cs| DISPATCH.borrow(cs).set(Some(dispatch)));
}

fn forward(vector: Vector) {
    let dispatch = critical_section::with(|cs| DISPATCH.borrow(cs).get());
    if let Some(dispatch) = dispatch {
        dispatch.dispatch(vector);
    }
}

// Vector stubs. The target runtime binds these to TIMER1_OVF, TIMER1_COMPA,
// TIMER1_COMPB and TIMER1_CAPT respectively; each fires with global
// interrupts masked and none can preempt another.

/// TIMER1_OVF: tick-counter high word
pub fn timer_overflow_vector() {
    forward(Vector::TimerOverflow);
}

/// TIMER1_COMPA: high-priority delay
pub fn delay_compare_vector() {
    forward(Vector::DelayCompare);
}

/// TIMER1_COMPB: slow-tick accrual
pub fn slow_tick_compare_vector() {
    forward(Vector::SlowTickCompare);
}

/// TIMER1_CAPT: transceiver IRQ bridge
pub fn transceiver_irq_vector() {
    forward(Vector::TransceiverIrq);
}
