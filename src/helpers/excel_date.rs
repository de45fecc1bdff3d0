use chrono::{NaiveDate, NaiveDateTime};

const MICROSECONDS_PER_DAY: f64 = 86_400_000_000f64;

/// Converts a date-time to an Excel serial number in the 1900 date system.
///
/// Serial 1 is 1900-01-01. Excel treats 1900 as a leap year (a Lotus 1-2-3
/// bug it kept for compatibility), so dates before 1900-03-01 are shifted by
/// one day to stay on the serial numbers Excel displays.
pub(crate) fn to_serial(datetime: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let elapsed = *datetime - epoch;
    let days = elapsed.num_days();
    let micros = (elapsed - chrono::Duration::days(days))
        .num_microseconds()
        .unwrap_or(0);
    // Handle Lotus 1-2-3 leap year bug
    let days = if days < 61 { days - 1 } else { days };
    days as f64 + micros as f64 / MICROSECONDS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn serials_match_excel() {
        assert_eq!(to_serial(&datetime(1900, 1, 1, 0, 0)), 1.0);
        assert_eq!(to_serial(&datetime(1900, 2, 28, 0, 0)), 59.0);
        assert_eq!(to_serial(&datetime(1900, 3, 1, 0, 0)), 61.0);
        assert_eq!(to_serial(&datetime(2024, 1, 21, 0, 0)), 45312.0);
        assert_eq!(to_serial(&datetime(2024, 1, 21, 12, 0)), 45312.5);
    }
}
