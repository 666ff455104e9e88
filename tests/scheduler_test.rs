use chrono::{Local, NaiveDate, TimeZone};
use insight_hub::scheduler::{ms_until_next, DayGuard};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn day_guard_claims_each_day_once() {
    let guard = DayGuard::new();
    let today = day(2025, 2, 9);

    assert!(guard.claim(today));
    assert!(!guard.claim(today));

    // A new day is claimable even while yesterday's stamp stands.
    assert!(guard.claim(day(2025, 2, 10)));
}

#[test]
fn day_guard_release_allows_a_retry() {
    let guard = DayGuard::new();
    let today = day(2025, 2, 9);

    assert!(guard.claim(today));
    guard.release(today);
    assert!(guard.claim(today));
}

#[test]
fn day_guard_release_of_a_different_day_is_a_no_op() {
    let guard = DayGuard::new();
    let today = day(2025, 2, 10);

    assert!(guard.claim(today));
    guard.release(day(2025, 2, 9));
    assert!(!guard.claim(today));
}

#[test]
fn next_fire_is_later_today_when_not_yet_passed() {
    let now = Local.with_ymd_and_hms(2025, 2, 9, 7, 30, 0).unwrap();
    assert_eq!(ms_until_next(now, 8, 0), 30 * 60 * 1000);
}

#[test]
fn next_fire_rolls_to_tomorrow_at_or_after_the_mark() {
    let exactly = Local.with_ymd_and_hms(2025, 2, 9, 8, 0, 0).unwrap();
    assert_eq!(ms_until_next(exactly, 8, 0), 24 * 60 * 60 * 1000);

    let after = Local.with_ymd_and_hms(2025, 2, 9, 9, 15, 0).unwrap();
    assert_eq!(ms_until_next(after, 8, 0), (22 * 60 + 45) * 60 * 1000);
}
