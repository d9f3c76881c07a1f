//! Host-side integration tests for the radio stick core
//!
//! Everything runs against mock hardware: the crate-provided timer and bus
//! mocks plus [`support::RadioModel`], a scripted AT86RF230-class slave
//! that checks chip-select framing and opcode composition.


#[cfg(test)]
mod timer_tests;

#[cfg(test)]
mod bus_tests;
