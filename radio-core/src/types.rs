//! Shared data types for bus configuration and driver errors

use embedded_hal::spi::Mode;

/// Role of this end of the synchronous serial bus
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BusRole {
    /// Drives the clock line
    Master,
    /// Clocked by the remote end
    Slave,
}

/// Bit order on the serial data lines
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Bus clock divider relative to the core clock.
///
/// The seven dividers supported by the bus peripheral; there is no
/// unrepresentable combination, so configuration cannot fail.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClockDivider {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl ClockDivider {
    /// Numeric division factor
    pub const fn factor(&self) -> u16 {
        match self {
            ClockDivider::Div2 => 2,
            ClockDivider::Div4 => 4,
            ClockDivider::Div8 => 8,
            ClockDivider::Div16 => 16,
            ClockDivider::Div32 => 32,
            ClockDivider::Div64 => 64,
            ClockDivider::Div128 => 128,
        }
    }
}

/// Complete serial bus configuration.
///
/// Clock phase and polarity use the `embedded-hal` [`Mode`] vocabulary
/// (`MODE_0` through `MODE_3`).
#[derive(Copy, Clone, Debug)]
pub struct BusConfig {
    pub role: BusRole,
    pub mode: Mode,
    pub bit_order: BitOrder,
    pub divider: ClockDivider,
}

/// Driver failure taxonomy.
///
/// Every failure is value-returned and checked by the caller; none is fatal
/// to the system. There is no automatic retry at this layer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DriverError {
    /// The resource (bus, delay slot) is already in use
    Busy,
    /// Null-equivalent or out-of-range argument, checked at entry
    InvalidArgument,
    /// Frame or buffer length exceeds the fixed capacity
    FrameTooLarge,
    /// The addressed device did not acknowledge within the polling bound
    Nack,
}

#[cfg(feature = "std")]
impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::Busy => write!(f, "resource busy"),
            DriverError::InvalidArgument => write!(f, "invalid argument"),
            DriverError::FrameTooLarge => write!(f, "frame exceeds buffer capacity"),
            DriverError::Nack => write!(f, "device did not acknowledge"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}
