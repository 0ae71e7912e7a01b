//! Timeline-derived project figures

use chrono::NaiveDate;

/// Share of the project timeline elapsed at `today`, in percent.
///
/// 0 before the start, 100 after the end, 0 for a zero-length timeline.
pub fn progress_percentage(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> f64 {
    if today < start {
        return 0.0;
    }
    if today > end {
        return 100.0;
    }
    let total = (end - start).num_days();
    if total <= 0 {
        return 0.0;
    }
    let elapsed = (today - start).num_days();
    (elapsed as f64 / total as f64 * 100.0).min(100.0)
}

pub fn duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_before_and_after_timeline() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 11);
        assert_eq!(progress_percentage(start, end, date(2024, 12, 31)), 0.0);
        assert_eq!(progress_percentage(start, end, date(2025, 1, 12)), 100.0);
    }

    #[test]
    fn test_linear_progress() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 11);
        assert_eq!(progress_percentage(start, end, start), 0.0);
        assert_eq!(progress_percentage(start, end, date(2025, 1, 6)), 50.0);
        assert_eq!(progress_percentage(start, end, end), 100.0);
    }

    #[test]
    fn test_zero_length_timeline() {
        let day = date(2025, 1, 1);
        assert_eq!(progress_percentage(day, day, day), 0.0);
    }

    #[test]
    fn test_fractional_progress_is_not_rounded() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 4);
        let percent = progress_percentage(start, end, date(2025, 1, 2));
        assert!((percent - 100.0 / 3.0).abs() < 1e-9);
        assert_ne!(percent, 33.33);
        assert_eq!(duration_days(start, end), 3);
    }
}
