//! Timestamps as stored by the watch.

use core::fmt;

use chrono::{DateTime, FixedOffset, Months, NaiveDate, NaiveTime, TimeDelta, Timelike};

/// A timezone code, as configured on the watch.
///
/// Codes count half hours from UTC-12:00: `0x16` is UTC-1:00, `0x18` is UTC
/// and `0x1d` is UTC+2:30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timezone(pub u8);

impl Timezone {
    /// Offset from UTC in seconds.
    pub fn offset_seconds(self) -> i32 {
        let tz = i32::from(self.0) - 24;
        (tz / 2) * 3600 + (tz % 2) * 1800
    }

    /// Offset from UTC, if within a day.
    pub fn offset(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.offset_seconds())
    }
}

/// A minute and second replacing those of a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeUpdate {
    pub minute: u8,
    pub second: u8,
}

impl TimeUpdate {
    pub fn from_bytes([minute, second]: [u8; 2]) -> Self {
        Self { minute, second }
    }
}

/// Year 0 of the stored year field.
const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch"),
};

/// A calendar timestamp with the watch's UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpsTime(DateTime<FixedOffset>);

impl GpsTime {
    /// Assemble a timestamp from its stored fields: year (since 2000), month,
    /// day, hour, minute and second.
    ///
    /// Out-of-range fields carry into the next larger field, so day 0 is the
    /// last day of the previous month and hour 24 is midnight of the next day.
    /// Every combination of fields lands between 1999 and 2277.
    pub fn from_fields(fields: [u8; 6], offset: FixedOffset) -> Self {
        let [year, month, day, hour, minute, second] = fields;

        // Month 0 is December of the previous year.
        let date = match (12 * u32::from(year) + u32::from(month)).checked_sub(1) {
            Some(months) => EPOCH + Months::new(months),
            None => EPOCH - Months::new(1),
        };

        let local = date.and_time(NaiveTime::MIN)
            + TimeDelta::days(i64::from(day) - 1)
            + TimeDelta::hours(i64::from(hour))
            + TimeDelta::minutes(i64::from(minute))
            + TimeDelta::seconds(i64::from(second));

        let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
        Self(DateTime::from_naive_utc_and_offset(utc, offset))
    }

    /// Apply a minute/second update to this reference time.
    ///
    /// A minute lower than the reference minute is taken to mean an hour
    /// boundary was crossed. Daylight saving transitions are not detected.
    pub fn updated(self, update: TimeUpdate) -> Self {
        let mut t = self.0;

        if u32::from(update.minute) < t.minute() {
            t += TimeDelta::hours(1);
        }

        let t = t - TimeDelta::minutes(i64::from(t.minute()))
            - TimeDelta::seconds(i64::from(t.second()))
            + TimeDelta::minutes(i64::from(update.minute))
            + TimeDelta::seconds(i64::from(update.second));

        Self(t)
    }

    pub fn datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl From<GpsTime> for DateTime<FixedOffset> {
    fn from(t: GpsTime) -> Self {
        t.0
    }
}

impl fmt::Display for GpsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%:z"))
    }
}

/// Assemble a duration from its stored hour, minute and second.
pub fn duration_from_fields([hour, minute, second]: [u8; 3]) -> TimeDelta {
    TimeDelta::hours(i64::from(hour))
        + TimeDelta::minutes(i64::from(minute))
        + TimeDelta::seconds(i64::from(second))
}
