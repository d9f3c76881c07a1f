#![no_std]

//! Firmware library for the 802.15.4 radio stick
//!
//! Thin board layer over `radio-core`: the register wiring for the
//! AT90USB-class MCU, the auxiliary serial EEPROM driver, and the
//! composition helpers `main` uses to wire the singleton context objects
//! together.

pub use radio_core::*;
pub use static_cell::StaticCell;

pub mod board;
pub mod eeprom;

use board::{BoardIrq, BoardSpi, BoardTimer, SLOW_TICK_RELOAD};

/// Dispatcher type for this board's vector table
pub type BoardDispatch = InterruptDispatch<'static, BoardIrq, BoardTimer, BoardSpi>;

static BUS: StaticCell<SpiBus<BoardSpi>> = StaticCell::new();
static TIMER: StaticCell<SystemTimer<BoardTimer>> = StaticCell::new();
static RADIO: StaticCell<Radio<'static, BoardSpi>> = StaticCell::new();
static IRQ: BoardIrq = BoardIrq;
static DISPATCH: StaticCell<BoardDispatch> = StaticCell::new();

/// The device's singleton subsystems, initialized once at startup
pub struct RadioStick {
    pub bus: &'static SpiBus<BoardSpi>,
    pub timer: &'static SystemTimer<BoardTimer>,
    pub radio: &'static Radio<'static, BoardSpi>,
}

/// Bring up bus, timer and radio and bind the interrupt vectors.
///
/// Call exactly once, with global interrupts still disabled; enabling them
/// afterwards is the caller's last bring-up step.
pub fn init_board() -> RadioStick {
    let bus = BUS.init(SpiBus::new(BoardSpi));
    bus.initialize(&default_bus_config());

    let timer = TIMER.init(SystemTimer::new(
        BoardTimer,
        TimerConfig {
            slow_tick_reload: SLOW_TICK_RELOAD,
        },
    ));
    timer.initialize();

    let radio = RADIO.init(Radio::new(bus));

    let dispatch = DISPATCH.init(InterruptDispatch::new(&IRQ, timer, radio));
    board::bind_vectors(dispatch);
    board::enable_transceiver_irq();

    #[cfg(feature = "defmt")]
    defmt::info!("✅ board initialized, tick rate {} Hz", board::TICK_HZ);

    RadioStick { bus, timer, radio }
}
