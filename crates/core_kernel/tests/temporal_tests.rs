//! Tests for the clock abstraction

use chrono::{Duration, TimeZone, Utc};
use core_kernel::{Clock, FixedClock, SystemClock};

#[test]
fn test_system_clock_is_close_to_now() {
    let before = Utc::now();
    let now = SystemClock.now();
    let after = Utc::now();
    assert!(now >= before && now <= after);
}

#[test]
fn test_fixed_clock_set_and_advance() {
    let start = Utc.with_ymd_and_hms(2025, 1, 4, 0, 0, 0).unwrap();
    let clock = FixedClock::new(start);

    clock.advance(Duration::days(3));
    assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 7, 0, 0, 0).unwrap());

    let reset = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
    clock.set(reset);
    assert_eq!(clock.now(), reset);
}

#[test]
fn test_fixed_clock_usable_as_trait_object() {
    let clock: Box<dyn Clock> = Box::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap()));
    assert_eq!(clock.now().date_naive().to_string(), "2025-01-09");
}
