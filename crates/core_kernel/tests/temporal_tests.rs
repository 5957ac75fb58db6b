//! Tests for accounting periods and date windows

use chrono::NaiveDate;
use core_kernel::{DateWindow, Period};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_single_day_period() {
    let period = Period::day(date(2024, 3, 15));
    assert_eq!(period.from(), period.to());
    assert!(period.contains(date(2024, 3, 15)));
    assert!(!period.contains(date(2024, 3, 16)));
}

#[test]
fn test_windows_partition_the_timeline() {
    let period = Period::new(date(2024, 1, 1), date(2024, 3, 31)).unwrap();
    let opening = period.opening_window();
    let activity = period.activity_window();

    for day in [date(2023, 12, 31), date(2024, 1, 1), date(2024, 2, 29), date(2024, 3, 31)] {
        // Every day up to the end of the period is in exactly one of the two windows
        assert!(opening.contains(day) ^ activity.contains(day));
        assert!(period.cumulative_window().contains(day));
    }
    assert!(!period.cumulative_window().contains(date(2024, 4, 1)));
}

#[test]
fn test_window_bounds() {
    let period = Period::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
    assert_eq!(DateWindow::Within(period).lower_bound(), Some(date(2024, 1, 1)));
    assert_eq!(DateWindow::Within(period).upper_limit(), (date(2024, 1, 31), true));
    assert_eq!(DateWindow::Through(date(2024, 1, 31)).lower_bound(), None);
    assert_eq!(DateWindow::Before(date(2024, 1, 1)).upper_limit(), (date(2024, 1, 1), false));
}
