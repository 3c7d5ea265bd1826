//! Clock policy: which advent days are open.
//!
//! In December the unlocked day follows the day of the month (capped at 25).
//! Outside December the calendar runs in demo mode with a fixed day so it can
//! be exercised year-round. A debug override, when present, wins over both
//! and is deliberately left unclamped: values above 25 open everything and
//! values below 1 lock everything.

use chrono::{Datelike, Local, NaiveDate};

/// Number of days on the calendar.
pub const ADVENT_DAYS: u32 = 25;

/// Unlocked day used outside December.
pub const DEMO_DAY: i64 = 5;

/// Unlocked day for `today`, honouring an optional override.
pub fn current_unlocked_day(today: NaiveDate, override_day: Option<i64>) -> i64 {
    current_unlocked_day_with_demo(today, override_day, DEMO_DAY)
}

/// Same as [`current_unlocked_day`] with a configurable demo day.
pub fn current_unlocked_day_with_demo(
    today: NaiveDate,
    override_day: Option<i64>,
    demo_day: i64,
) -> i64 {
    if let Some(day) = override_day {
        return day;
    }
    if today.month() == 12 {
        i64::from(today.day().min(ADVENT_DAYS))
    } else {
        demo_day
    }
}

/// Unlocked day for the local wall clock.
pub fn unlocked_day_now(override_day: Option<i64>, demo_day: i64) -> i64 {
    current_unlocked_day_with_demo(Local::now().date_naive(), override_day, demo_day)
}

/// A day can be opened when it is an advent day and not past the unlocked day.
pub fn is_openable(day: i64, unlocked_day: i64) -> bool {
    (1..=i64::from(ADVENT_DAYS)).contains(&day) && day <= unlocked_day
}

/// Percentage of the way to Christmas Eve delivery (the workshop tracker).
pub fn workshop_progress(unlocked_day: i64) -> f64 {
    let day = unlocked_day.clamp(0, i64::from(ADVENT_DAYS));
    (day as f64 / f64::from(ADVENT_DAYS) * 100.0).min(100.0)
}

/// True once the final day is unlocked.
pub fn is_christmas(unlocked_day: i64) -> bool {
    unlocked_day >= i64::from(ADVENT_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn december_follows_day_of_month() {
        assert_eq!(current_unlocked_day(date(2025, 12, 1), None), 1);
        assert_eq!(current_unlocked_day(date(2025, 12, 17), None), 17);
    }

    #[test]
    fn december_caps_at_twenty_five() {
        assert_eq!(current_unlocked_day(date(2025, 12, 25), None), 25);
        assert_eq!(current_unlocked_day(date(2025, 12, 31), None), 25);
    }

    #[test]
    fn outside_december_uses_demo_day() {
        assert_eq!(current_unlocked_day(date(2025, 11, 30), None), DEMO_DAY);
        assert_eq!(current_unlocked_day(date(2026, 1, 3), None), DEMO_DAY);
        assert_eq!(
            current_unlocked_day_with_demo(date(2026, 7, 3), None, 12),
            12
        );
    }

    #[test]
    fn override_takes_precedence_even_out_of_range() {
        assert_eq!(current_unlocked_day(date(2025, 12, 10), Some(3)), 3);
        assert_eq!(current_unlocked_day(date(2025, 12, 10), Some(40)), 40);
        assert_eq!(current_unlocked_day(date(2025, 6, 10), Some(-2)), -2);
    }

    #[test]
    fn gating_examples() {
        assert!(is_openable(1, 5));
        assert!(is_openable(5, 5));
        assert!(!is_openable(10, 5));
        assert!(!is_openable(0, 5));
        assert!(!is_openable(26, 99));
    }

    #[test]
    fn override_extremes() {
        assert!((1..=25).all(|d| is_openable(d, 100)));
        assert!((1..=25).all(|d| !is_openable(d, 0)));
        assert!((1..=25).all(|d| !is_openable(d, -7)));
    }

    #[test]
    fn workshop_progress_tracks_unlocked_day() {
        assert_eq!(workshop_progress(0), 0.0);
        assert_eq!(workshop_progress(5), 20.0);
        assert_eq!(workshop_progress(25), 100.0);
        assert_eq!(workshop_progress(60), 100.0);
        assert_eq!(workshop_progress(-3), 0.0);
        assert!(is_christmas(25));
        assert!(!is_christmas(24));
    }

    proptest! {
        #[test]
        fn openable_iff_within_unlocked(day in 1i64..=25, unlocked in -30i64..60) {
            prop_assert_eq!(is_openable(day, unlocked), day <= unlocked);
        }

        #[test]
        fn december_day_is_always_in_range(d in 1u32..=31) {
            let unlocked = current_unlocked_day(date(2024, 12, d), None);
            prop_assert!((1..=25).contains(&unlocked));
        }
    }
}
