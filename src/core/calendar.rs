//! Clock and calendar arithmetic
//!
//! Every date-dependent operation reads time through a [`Clock`] so the
//! classifier and dispatcher stay deterministic under test.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Time of day periods, used for peer availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Morning,   // 06:00-12:00
    Afternoon, // 12:00-18:00
    Evening,   // 18:00-22:00
    Night,     // 22:00-06:00
}

impl TimePeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            18..=21 => TimePeriod::Evening,
            _ => TimePeriod::Night, // 22-23, 0-5
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
            TimePeriod::Night => "night",
        }
    }
}

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    fn period(&self) -> TimePeriod {
        TimePeriod::from_hour(self.now().hour())
    }
}

/// Wall-clock time in the host's local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Clock at 09:00 on the given date
    pub fn on(date: NaiveDate) -> Self {
        Self::new(date.and_hms_opt(9, 0, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Next occurrence of `weekday` on or after `today`
///
/// When the weekday is today the result is today, unless `force_next_week`
/// is set ("next friday" said on a Friday), in which case it is a week out.
pub fn next_weekday(today: NaiveDate, weekday: Weekday, force_next_week: bool) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut ahead = (target - current).rem_euclid(7);
    if ahead == 0 && force_next_week {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

/// Monday..=Sunday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let start = date - Duration::days(offset);
    (start, start + Duration::days(6))
}

/// First..=last day of the month containing `date`
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let end = next_month.map(|d| d - Duration::days(1)).unwrap_or(date);
    (start, end)
}

/// Long human form, e.g. "Wednesday, October 14, 2026 at 09:00 AM"
pub fn describe_datetime(now: NaiveDateTime) -> String {
    now.format("%A, %B %d, %Y at %I:%M %p").to_string()
}

/// Short human form for a date, e.g. "Friday, October 16"
pub fn describe_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_time_period_from_hour() {
        assert_eq!(TimePeriod::from_hour(6), TimePeriod::Morning);
        assert_eq!(TimePeriod::from_hour(13), TimePeriod::Afternoon);
        assert_eq!(TimePeriod::from_hour(19), TimePeriod::Evening);
        assert_eq!(TimePeriod::from_hour(23), TimePeriod::Night);
        assert_eq!(TimePeriod::from_hour(3), TimePeriod::Night);
    }

    #[test]
    fn test_next_weekday_later_this_week() {
        // 2026-10-14 is a Wednesday
        let today = date(2026, 10, 14);
        assert_eq!(next_weekday(today, Weekday::Fri, false), date(2026, 10, 16));
        assert_eq!(next_weekday(today, Weekday::Mon, false), date(2026, 10, 19));
    }

    #[test]
    fn test_next_weekday_same_day() {
        let today = date(2026, 10, 14);
        assert_eq!(next_weekday(today, Weekday::Wed, false), today);
        assert_eq!(next_weekday(today, Weekday::Wed, true), date(2026, 10, 21));
    }

    #[test]
    fn test_week_and_month_bounds() {
        let (start, end) = week_bounds(date(2026, 10, 14));
        assert_eq!(start, date(2026, 10, 12));
        assert_eq!(end, date(2026, 10, 18));

        let (start, end) = month_bounds(date(2026, 12, 5));
        assert_eq!(start, date(2026, 12, 1));
        assert_eq!(end, date(2026, 12, 31));
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::on(date(2026, 10, 14));
        assert_eq!(clock.today(), date(2026, 10, 14));
        assert_eq!(clock.period(), TimePeriod::Morning);
    }

    #[test]
    fn test_describe_datetime() {
        let now = date(2026, 10, 14).and_hms_opt(15, 5, 0).unwrap();
        assert_eq!(describe_datetime(now), "Wednesday, October 14, 2026 at 03:05 PM");
    }
}
