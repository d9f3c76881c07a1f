//! System clock, delay scheduler and slow-tick dispatcher behavior

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use rstest::rstest;

use radio_core::hal::mock::MockTimer;
use radio_core::hal::TimerHal;
use radio_core::{DriverError, SystemTimer, TickHandler, TimerConfig};

fn make_timer() -> &'static SystemTimer<MockTimer> {
    let timer = Box::leak(Box::new(SystemTimer::new(
        MockTimer::new(),
        TimerConfig::default(),
    )));
    timer.initialize();
    timer
}

fn counting_handler() -> (&'static (dyn Fn() + Sync), Arc<AtomicU32>) {
    let count = Arc::new(AtomicU32::new(0));
    let cloned = count.clone();
    let handler: &'static (dyn Fn() + Sync) =
        Box::leak(Box::new(move || {
            cloned.fetch_add(1, Ordering::SeqCst);
        }));
    (handler, count)
}

// ---- system clock ----------------------------------------------------------

#[test]
fn now_tracks_simulated_overflows() {
    let timer = make_timer();
    for n in 1..=40u32 {
        timer.handle_overflow();
        timer.hw().set_counter((n * 7) as u16);
        assert_eq!(timer.now(), (n << 16) | (n * 7));
    }
}

proptest! {
    #[test]
    fn now_composes_overflow_count_and_low_word(overflows in 0u32..500, low: u16) {
        let timer = make_timer();
        for _ in 0..overflows {
            timer.handle_overflow();
        }
        timer.hw().set_counter(low);
        prop_assert_eq!(timer.now(), (overflows << 16) | u32::from(low));
    }
}

#[test]
fn now_is_monotonic_across_wraps() {
    let timer = make_timer();
    let mut previous = timer.now();
    for step in 0..200u32 {
        timer.hw().advance(1000);
        if timer.hw().counter() < 1000 {
            // The hardware wrapped; the overflow vector fires with it
            timer.handle_overflow();
        }
        let now = timer.now();
        assert!(now > previous, "step {step}: {now:#x} !> {previous:#x}");
        previous = now;
    }
}

// ---- high-priority delay ---------------------------------------------------

/// Compare matches needed to exhaust a delay of `ticks`: one per full
/// 0xFFFF span of the high half, one more for a nonzero low remainder when
/// spans were needed, and the final completing match.
#[rstest]
#[case::single_tick(1, 1)]
#[case::mid_low_range(0x1234, 1)]
#[case::max_single_span(0xFFFF, 1)]
#[case::exact_one_span(0x1_0000, 2)]
#[case::span_plus_one(0x1_0001, 3)]
#[case::spans_plus_remainder(0x2_ABCD, 4)]
#[case::exact_three_spans(0x3_0000, 4)]
fn delay_fires_after_expected_compare_matches(#[case] ticks: u32, #[case] expected: u32) {
    let timer = make_timer();
    let (handler, fired) = counting_handler();

    timer.start_delay(ticks, handler).unwrap();

    let mut matches = 0;
    while fired.load(Ordering::SeqCst) == 0 {
        assert!(matches < 16, "delay never completed");
        timer.handle_delay_compare();
        matches += 1;
    }
    assert_eq!(matches, expected);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(!timer.delay_active(), "one-shot contract: slot cleared");
    assert!(!timer.hw().delay_irq_enabled());
}

#[test]
fn final_remainder_span_matches_low_word() {
    let timer = make_timer();
    let (handler, _fired) = counting_handler();

    timer.hw().set_counter(0);
    timer.start_delay(0x2_00AB, handler).unwrap();
    assert_eq!(timer.hw().delay_compare(), 0xFFFF);

    timer.handle_delay_compare(); // first span
    timer.handle_delay_compare(); // second span
    timer.handle_delay_compare(); // arms the remainder
    let counter = timer.hw().counter();
    assert_eq!(timer.hw().delay_compare(), counter.wrapping_add(0x00AB));
}

#[test]
fn long_delay_elapses_full_spans_plus_remainder() {
    let timer = make_timer();
    let (handler, fired) = counting_handler();
    timer.hw().set_counter(0);

    let ticks: u32 = 0x2_00AB;
    timer.start_delay(ticks, handler).unwrap();

    let mut elapsed: u32 = 0;
    let mut previous: u16 = 0;
    while fired.load(Ordering::SeqCst) == 0 {
        let compare = timer.hw().delay_compare();
        elapsed += u32::from(compare.wrapping_sub(previous));
        previous = compare;
        timer.hw().set_counter(compare);
        timer.handle_delay_compare();
    }
    // The high half is burned in full 0xFFFF spans, so the wall time runs
    // slightly past the request: (high + 1) * 0xFFFF + low.
    assert_eq!(elapsed, 3 * 0xFFFF + 0x00AB);
    assert!(elapsed >= ticks);
}

#[test]
fn concurrent_delay_request_is_rejected_and_harmless() {
    let timer = make_timer();
    let (first, first_count) = counting_handler();
    let (second, second_count) = counting_handler();

    timer.start_delay(0x100, first).unwrap();
    assert_eq!(timer.start_delay(5, second), Err(DriverError::Busy));

    // The original request is untouched and completes normally
    timer.handle_delay_compare();
    assert_eq!(first_count.load(Ordering::SeqCst), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 0);
}

#[test]
fn delay_handler_may_start_the_next_delay() {
    let timer = make_timer();
    let (inner, inner_count) = counting_handler();
    let chained: &'static (dyn Fn() + Sync) = Box::leak(Box::new(move || {
        timer.start_delay(7, inner).unwrap();
    }));

    timer.start_delay(3, chained).unwrap();
    timer.handle_delay_compare();
    assert!(timer.delay_active(), "handler rescheduled from completion");
    timer.handle_delay_compare();
    assert_eq!(inner_count.load(Ordering::SeqCst), 1);
}

#[test]
fn stopped_delay_never_fires() {
    let timer = make_timer();
    let (handler, fired) = counting_handler();

    timer.start_delay(0x50, handler).unwrap();
    timer.stop_delay();
    timer.handle_delay_compare();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!timer.hw().delay_irq_enabled());
}

// ---- slow tick -------------------------------------------------------------

#[test]
fn run_pending_without_handler_zeroes_any_backlog() {
    let timer = make_timer();
    for _ in 0..37 {
        timer.handle_slow_tick_compare();
    }
    timer.run_pending();
    assert_eq!(timer.pending_ticks(), 0);

    // And stays zero on an already-empty queue
    timer.run_pending();
    assert_eq!(timer.pending_ticks(), 0);
}

#[test]
fn run_pending_invokes_handler_once_per_accrued_tick() {
    let timer = make_timer();
    let (handler, count) = counting_handler();
    timer.install_tick_handler(handler);

    for _ in 0..5 {
        timer.handle_slow_tick_compare();
    }
    timer.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 5);
    assert_eq!(timer.pending_ticks(), 0);
}

#[test]
fn ticks_accrued_mid_run_wait_for_the_next_call() {
    let timer = make_timer();
    let count = Arc::new(AtomicU32::new(0));
    let cloned = count.clone();
    let handler: TickHandler = Box::leak(Box::new(move || {
        // The first invocation takes long enough for another tick to land
        if cloned.fetch_add(1, Ordering::SeqCst) == 0 {
            timer.handle_slow_tick_compare();
        }
    }));
    timer.install_tick_handler(handler);

    timer.handle_slow_tick_compare();
    timer.handle_slow_tick_compare();
    timer.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 2, "only the ticks pending at entry");
    assert_eq!(timer.pending_ticks(), 1, "mid-run tick kept for next call");

    timer.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(timer.pending_ticks(), 0);
}

#[test]
fn removing_the_handler_discards_later_ticks() {
    let timer = make_timer();
    let (handler, count) = counting_handler();
    timer.install_tick_handler(handler);
    timer.handle_slow_tick_compare();
    timer.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 1);

    timer.remove_tick_handler();
    timer.handle_slow_tick_compare();
    timer.handle_slow_tick_compare();
    timer.run_pending();
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(timer.pending_ticks(), 0);
}

#[test]
fn slow_tick_period_is_independent_of_dispatch_latency() {
    let timer = make_timer();
    timer.hw().set_counter(1_000);
    timer.handle_slow_tick_compare();
    assert_eq!(timer.hw().slow_tick_compare(), 21_000);

    // Main loop stalls; the next compare still re-arms from "now"
    timer.hw().set_counter(30_000);
    timer.handle_slow_tick_compare();
    assert_eq!(timer.hw().slow_tick_compare(), 50_000);
}
