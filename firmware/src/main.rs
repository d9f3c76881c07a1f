#![cfg_attr(feature = "embedded", no_std)]
#![cfg_attr(feature = "embedded", no_main)]

//! Radio stick entry point: bring the board up, park the transceiver in a
//! known state and drain slow ticks cooperatively forever.

#[cfg(feature = "defmt")]
use defmt_rtt as _;

#[cfg(feature = "embedded")]
use panic_halt as _;

use radiostick_firmware::*;

#[cfg_attr(not(feature = "embedded"), allow(dead_code))]
fn run() -> ! {
    let stick = init_board();

    let _part = stick.radio.part_number().ok();
    #[cfg(feature = "defmt")]
    defmt::info!("🔧 transceiver part {}", _part);

    // Known idle state and default channel before anyone installs handlers
    let _ = stick.radio.state_command(regs::state_cmd::FORCE_TRX_OFF);
    let _ = stick.radio.set_channel(11);

    static HEARTBEAT: fn() = || {
        #[cfg(feature = "defmt")]
        defmt::trace!("💓 slow tick");
    };
    stick.timer.install_tick_handler(&HEARTBEAT);

    #[cfg(feature = "defmt")]
    defmt::info!("✨ radio stick ready");

    // Cooperative main loop; interrupts do the time-critical work
    loop {
        stick.timer.run_pending();
    }
}

/// The target runtime jumps here after .data/.bss setup
#[cfg(feature = "embedded")]
#[no_mangle]
pub extern "C" fn main() -> ! {
    run()
}

#[cfg(not(feature = "embedded"))]
fn main() {
    // Host build exists for type-checking only; the board paths are
    // exercised by the workspace test crates.
    println!("radiostick firmware: build with --features embedded for the target");
}
