//! Points in time, represented as Julian dates (JD) in universal time, and
//! their relation to civil days in a fixed-offset timezone.
//!
//! Timezones are given as offsets east of UTC in minutes, so Japan Standard
//! Time (UTC+9) is `540`.

use chrono::{DateTime, TimeZone, Utc};

use crate::date::Date;

/// Julian date of 1970-01-01T00:00Z.
pub const UNIX_EPOCH: f64 = 2440587.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A point in universal time, represented in Julian date (JD).
///
/// # Example
///
/// ```
/// use koyomi::{Date, Instant};
///
/// let noon = Instant::from_date(Date::from_gregorian(2000, 1, 1).unwrap(), 12, 0, 0.0, 0);
/// assert_eq!(Instant(2451545.0), noon);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Instant(pub f64);

impl Instant {
    /// Returns the Julian date.
    pub fn julian_day(&self) -> f64 {
        self.0
    }

    /// The instant at the given wall-clock time of a civil day, in timezone
    /// ahead (east) of UTC by `tz_offset_minutes` minutes.
    pub fn from_date(
        date: Date,
        hour: u32,
        minute: u32,
        second: f64,
        tz_offset_minutes: i32,
    ) -> Self {
        let secs = (hour * 3600 + minute * 60) as f64 + second;
        Instant(Self::at_start_of_day(date, tz_offset_minutes).0 + secs / 86400.0)
    }

    /// The first instant (midnight) of a civil day.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::{Date, Instant};
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// assert_eq!(Instant(2451544.125), Instant::at_start_of_day(date, 540));
    /// ```
    pub fn at_start_of_day(date: Date, tz_offset_minutes: i32) -> Self {
        Instant(date.jdn() as f64 - 0.5 - tz_offset_minutes as f64 / 1440.0)
    }

    /// Returns the date at the time point in timezone ahead (east) of UTC by
    /// `tz_offset_minutes` minutes.
    ///
    /// Days are counted from JDN 0, so instants before the start of that day
    /// clamp to it.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Instant;
    ///
    /// let j2000 = Instant(2451545.0); // 2000-01-01T12:00Z
    /// assert_eq!((2000, 1, 1), j2000.date_in_timezone(540).gregorian());
    /// assert_eq!((1999, 12, 31), Instant(2451544.1).date_in_timezone(0).gregorian());
    /// ```
    pub fn date_in_timezone(&self, tz_offset_minutes: i32) -> Date {
        // Millisecond resolution, so that midnights computed by
        // `at_start_of_day` land on their own day.
        let millis = ((self.0 + 0.5) * MILLIS_PER_DAY).round() as i64
            + tz_offset_minutes as i64 * 60_000;
        let days = millis.div_euclid(MILLIS_PER_DAY as i64);
        Date::from_jdn(u32::try_from(days).unwrap_or(if days < 0 { 0 } else { u32::MAX }))
    }

    /// The first instant of the civil day this instant falls on.
    pub fn start_of_day(&self, tz_offset_minutes: i32) -> Self {
        Self::at_start_of_day(self.date_in_timezone(tz_offset_minutes), tz_offset_minutes)
    }

    /// The last millisecond of the civil day this instant falls on.
    pub fn end_of_day(&self, tz_offset_minutes: i32) -> Self {
        let next = self.date_in_timezone(tz_offset_minutes) + 1;
        Instant(Self::at_start_of_day(next, tz_offset_minutes).0 - 1.0 / MILLIS_PER_DAY)
    }

    /// How far into its civil day this instant is, in `[0, 1)`.
    pub fn fraction_of_day(&self, tz_offset_minutes: i32) -> f64 {
        self.0 - self.start_of_day(tz_offset_minutes).0
    }

    /// The current time, from the system clock.
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// The instant `millis` milliseconds after 1970-01-01T00:00Z.
    pub fn from_unix_millis(millis: i64) -> Self {
        Instant(UNIX_EPOCH + millis as f64 / MILLIS_PER_DAY)
    }

    /// Milliseconds since 1970-01-01T00:00Z, rounded to the nearest
    /// millisecond.
    pub fn to_unix_millis(&self) -> i64 {
        ((self.0 - UNIX_EPOCH) * MILLIS_PER_DAY).round() as i64
    }

    /// Converts back into a `chrono` UTC timestamp.
    ///
    /// Returns `None` outside the range `chrono` supports.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use koyomi::Instant;
    ///
    /// let dt = Utc.with_ymd_and_hms(1989, 1, 8, 0, 0, 0).unwrap();
    /// assert_eq!(Some(dt), Instant::from(dt).to_datetime_utc());
    /// ```
    pub fn to_datetime_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.to_unix_millis()).single()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Instant {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::from_unix_millis(dt.timestamp_millis())
    }
}
