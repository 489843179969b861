//! Time formatting helpers and per-granularity tick label strategies

use chrono::{Datelike, NaiveDateTime};

use crate::{DeviceClass, TimePeriod};

pub const FMT_MILLISECOND: &str = ".%3f";
pub const FMT_SECOND: &str = ":%S";
pub const FMT_MINUTE: &str = "%I:%M";
pub const FMT_HOUR_24: &str = "%H:%M";
pub const FMT_HOUR: &str = "%I %p";
pub const FMT_DAY_OF_WEEK: &str = "%A";
pub const FMT_WEEKDAY: &str = "%a";
pub const FMT_DAY: &str = "%b %e";
pub const FMT_WEEK: &str = "%b %d";
pub const FMT_MONTH: &str = "%B";
pub const FMT_MONTH_ABBR: &str = "%b";
pub const FMT_YEAR: &str = "%Y";
pub const FMT_DAY_PADDED: &str = "%e";
pub const FMT_DATE: &str = "%b %Y";

pub fn format_time(dt: &NaiveDateTime, fmt: &str) -> String {
    dt.format(fmt).to_string()
}

/// English ordinal for a day number: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal_suffix_of(i: i64) -> String {
    let j = i.rem_euclid(10);
    let k = i.rem_euclid(100);

    let suffix = if j == 1 && k != 11 {
        "st"
    } else if j == 2 && k != 12 {
        "nd"
    } else if j == 3 && k != 13 {
        "rd"
    } else {
        "th"
    };

    format!("{i}{suffix}")
}

// ============================================================================
// STRATEGY PATTERN: Tick label formatting
// ============================================================================

/// Boxed tick label function
pub type TickFormatter = Box<dyn Fn(&NaiveDateTime) -> String>;

/// Strategy trait for the time formatting collaborator
pub trait TimeFormatter {
    /// Label function for x-axis ticks at the given granularity
    fn tick_formatter(&self, period: TimePeriod, device: DeviceClass) -> TickFormatter;
}

/// Default chrono-backed formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTimeFormatter;

impl TimeFormatter for ChronoTimeFormatter {
    fn tick_formatter(&self, period: TimePeriod, device: DeviceClass) -> TickFormatter {
        match period {
            TimePeriod::Hour => Box::new(|dt| format_time(dt, FMT_HOUR_24)),
            TimePeriod::Day => Box::new(move |dt| {
                let time = format_time(dt, FMT_HOUR_24);
                if time == "12:00" {
                    let noon = if device.is_mobile() { "NN" } else { "Noon" };
                    noon.to_string()
                } else {
                    time
                }
            }),
            TimePeriod::Week => Box::new(|dt| {
                format_time(dt, FMT_WEEKDAY)
                    .chars()
                    .next()
                    .map(String::from)
                    .unwrap_or_default()
            }),
            TimePeriod::Month => Box::new(|dt| ordinal_suffix_of(dt.day() as i64)),
            TimePeriod::Quarter | TimePeriod::Year | TimePeriod::Other => {
                Box::new(|dt| format_time(dt, FMT_MONTH_ABBR))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_timestamp;

    fn at(ts: &str) -> NaiveDateTime {
        parse_timestamp(ts).unwrap()
    }

    #[test]
    fn test_ordinal_suffix() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (111, "111th"),
        ];
        for (n, expected) in cases {
            assert_eq!(ordinal_suffix_of(n), expected);
        }
    }

    #[test]
    fn test_day_noon_label() {
        let f = ChronoTimeFormatter;
        let desktop = f.tick_formatter(TimePeriod::Day, DeviceClass::Desktop);
        let mobile = f.tick_formatter(TimePeriod::Day, DeviceClass::Mobile);

        assert_eq!(desktop(&at("2023-01-01T12:00:00Z")), "Noon");
        assert_eq!(mobile(&at("2023-01-01T12:00:00Z")), "NN");
        assert_eq!(desktop(&at("2023-01-01T18:00:00Z")), "18:00");
    }

    #[test]
    fn test_week_initials() {
        let f = ChronoTimeFormatter.tick_formatter(TimePeriod::Week, DeviceClass::Desktop);
        // 2023-01-02 is a Monday
        assert_eq!(f(&at("2023-01-02T12:00:00Z")), "M");
        assert_eq!(f(&at("2023-01-07T12:00:00Z")), "S");
    }

    #[test]
    fn test_month_and_fallback_labels() {
        let month = ChronoTimeFormatter.tick_formatter(TimePeriod::Month, DeviceClass::Desktop);
        assert_eq!(month(&at("2023-03-21T12:00:00Z")), "21st");

        let other = ChronoTimeFormatter.tick_formatter(TimePeriod::Other, DeviceClass::Desktop);
        assert_eq!(other(&at("2023-03-21T12:00:00Z")), "Mar");
    }
}
