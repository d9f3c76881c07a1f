#![cfg_attr(not(feature = "std"), no_std)]

//! # Radio Core
//!
//! Interrupt-driven core for an IEEE 802.15.4 radio stick: system clock and
//! tick dispatch, byte-granular serial bus transactions, and the
//! register/frame access protocol of an AT86RF230-class transceiver.
//!
//! Everything here is hardware-independent. Board wiring is supplied through
//! the traits in [`hal`], so the whole crate runs against mocks on a host.

pub mod types;
pub mod hal;
pub mod bus;
pub mod timer;
pub mod regs;
pub mod radio;
pub mod isr;

pub use types::*;
pub use bus::SpiBus;
pub use timer::{SystemTimer, TimerConfig, DelayHandler, TickHandler};
pub use radio::{Radio, IrqHandler};
pub use isr::{InterruptDispatch, Vector};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bus setup for the transceiver: master, SPI mode 0, MSB first,
/// core clock divided by four.
pub fn default_bus_config() -> BusConfig {
    BusConfig {
        role: BusRole::Master,
        mode: embedded_hal::spi::MODE_0,
        bit_order: BitOrder::MsbFirst,
        divider: ClockDivider::Div4,
    }
}
