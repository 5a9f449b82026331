//! Calendar-independant date, with Julian, Gregorian and civil (cutover)
//! representations.

use std::ops::{Add, Sub};

use crate::error::{Error, Result};

/// A calendar-independant date.
///
/// Supported range begins from January 1, 4713 BC, proleptic Julian calendar.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Date {
    jdn: u32,
}

impl Date {
    /// First day of the Gregorian calendar, 1582-10-15 (JDN 2299161).
    ///
    /// [`Date::civil`] and [`Date::from_civil`] use the Julian calendar before
    /// this day and the Gregorian calendar from it on.
    pub const GREGORIAN_REFORM: Date = Date { jdn: 2299161 };

    /// Creates a `Date` with a Julian day number (JDN).
    pub fn from_jdn(jdn: u32) -> Self {
        Self { jdn }
    }
    /// Returns the Julian day number (JDN) of the date.
    pub fn jdn(&self) -> u32 {
        self.jdn
    }

    /// Creates a `Date` with a Gregorian calendar date.
    ///
    /// `year` should be an astronomical year number, i.e. 1 BC is `0`, 2
    /// BC is `-1`, etc.
    ///
    /// Returns `None` if the result date is out of supported range.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// assert_eq!(2451545, date.jdn());
    /// ```
    pub fn from_gregorian(year: i32, month: i32, day: i32) -> Option<Self> {
        let (y, m, d) = (year, month, day);
        u32::try_from(
            (1461 * (y + 4800 + (m - 14) / 12)) / 4 + (367 * (m - 2 - 12 * ((m - 14) / 12))) / 12
                - (3 * ((y + 4900 + (m - 14) / 12) / 100)) / 4
                + d
                - 32075,
        )
        .map(Self::from_jdn)
        .ok()
    }
    /// Represents the date in Gregorian calendar.
    ///
    /// Returns in `(year, month, day)` format.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_jdn(2451545);
    /// assert_eq!((2000, 1, 1), date.gregorian());
    /// ```
    pub fn gregorian(&self) -> (i32, i32, i32) {
        let jdn = self.jdn as i64;
        let f = jdn + 1401 + (((4 * jdn + 274277) / 146097) * 3) / 4 - 38;
        let e = 4 * f + 3;
        let g = (e % 1461) / 4;
        let h = 5 * g + 2;
        let day = (h % 153) / 5 + 1;
        let month = (h / 153 + 2) % 12 + 1;
        let year = e / 1461 - 4716 + (12 + 2 - month) / 12;
        (year as i32, month as i32, day as i32)
    }

    /// Creates a `Date` with a proleptic Julian calendar date.
    ///
    /// `year` is an astronomical year number, as in [`Date::from_gregorian`].
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_julian(1582, 10, 4).unwrap();
    /// assert_eq!(2299160, date.jdn());
    /// ```
    pub fn from_julian(year: i32, month: i32, day: i32) -> Option<Self> {
        let a = (14 - month).div_euclid(12);
        let y = year as i64 + 4800 - a as i64;
        let m = (month + 12 * a - 3) as i64;
        let jdn = day as i64 + (153 * m + 2).div_euclid(5) + 365 * y + y.div_euclid(4) - 32083;
        u32::try_from(jdn).map(Self::from_jdn).ok()
    }
    /// Represents the date in proleptic Julian calendar, as `(year, month,
    /// day)`.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_jdn(2299160);
    /// assert_eq!((1582, 10, 4), date.julian());
    /// ```
    pub fn julian(&self) -> (i32, i32, i32) {
        let c = self.jdn as i64 + 32082;
        let d = (4 * c + 3) / 1461;
        let e = c - 1461 * d / 4;
        let m = (5 * e + 2) / 153;
        let day = e - (153 * m + 2) / 5 + 1;
        let month = m + 3 - 12 * (m / 10);
        let year = d - 4800 + m / 10;
        (year as i32, month as i32, day as i32)
    }

    /// Creates a `Date` with a civil date: Julian calendar before
    /// [`Date::GREGORIAN_REFORM`], Gregorian calendar since.
    ///
    /// Returns `None` for the ten days skipped by the reform (1582-10-05 to
    /// 1582-10-14) or if the date is out of supported range. Field ranges are
    /// not checked, see [`Date::from_civil_checked`].
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let eve = Date::from_civil(1582, 10, 4).unwrap();
    /// let reform = Date::from_civil(1582, 10, 15).unwrap();
    /// assert_eq!(1, reform - eve);
    /// assert!(Date::from_civil(1582, 10, 10).is_none());
    /// ```
    pub fn from_civil(year: i32, month: i32, day: i32) -> Option<Self> {
        match Self::from_gregorian(year, month, day) {
            Some(date) if date >= Self::GREGORIAN_REFORM => Some(date),
            _ => Self::from_julian(year, month, day).filter(|&date| date < Self::GREGORIAN_REFORM),
        }
    }
    /// Like [`Date::from_civil`], but rejects months outside `1..=12` and days
    /// past the end of the month.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// assert!(Date::from_civil_checked(1900, 2, 29).is_err()); // Gregorian
    /// assert!(Date::from_civil_checked(1500, 2, 29).is_ok()); // Julian
    /// ```
    pub fn from_civil_checked(year: i32, month: i32, day: i32) -> Result<Self> {
        let invalid = || Error::InvalidDate { year, month, day };
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        let date = Self::from_civil(year, month, day).ok_or_else(invalid)?;
        let year_type = if date < Self::GREGORIAN_REFORM {
            YearType::from_julian(year)
        } else {
            YearType::from_gregorian(year)
        };
        if day < 1 || day > days_in_month(month, year_type) {
            return Err(invalid());
        }
        Ok(date)
    }
    /// Represents the date in the civil calendar, see [`Date::from_civil`].
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// assert_eq!((1582, 10, 4), Date::from_jdn(2299160).civil());
    /// assert_eq!((1582, 10, 15), Date::from_jdn(2299161).civil());
    /// ```
    pub fn civil(&self) -> (i32, i32, i32) {
        if *self >= Self::GREGORIAN_REFORM {
            self.gregorian()
        } else {
            self.julian()
        }
    }
    /// Formats the civil date like ISO 8601 (but in the Julian calendar before
    /// the reform).
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_julian(645, 7, 17).unwrap();
    /// assert_eq!("0645-07-17", date.iso_civil());
    /// ```
    pub fn iso_civil(&self) -> String {
        let (y, m, d) = self.civil();
        format!("{:04}-{:02}-{:02}", y, m, d)
    }

    /// Returns the sexagenary day number of the date, numbered from 1
    /// (甲子) to 60 (癸亥).
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::Date;
    ///
    /// let date = Date::from_gregorian(2000, 1, 1).unwrap();
    /// assert_eq!(55, date.sexagenary()); // 戊午
    /// ```
    pub fn sexagenary(&self) -> i32 {
        ((self.jdn + 49) % 60 + 1) as i32
    }
}

impl Add<i32> for Date {
    type Output = Date;
    fn add(self, rhs: i32) -> Self::Output {
        Date::from_jdn(if rhs >= 0 {
            self.jdn + rhs as u32
        } else {
            self.jdn - rhs.wrapping_neg() as u32
        })
    }
}
impl Sub<Date> for Date {
    type Output = i32;
    fn sub(self, rhs: Date) -> Self::Output {
        self.jdn as i32 - rhs.jdn as i32
    }
}

/// Indicates whether a year is a leap year or common year.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum YearType {
    Common,
    Leap,
}

impl YearType {
    /// Determines if `year` is a leap year in Gregorian calendar.
    fn from_gregorian(year: i32) -> Self {
        if year % 4 == 0 && year % 100 != 0 || year % 400 == 0 {
            Self::Leap
        } else {
            Self::Common
        }
    }
    /// Determines if `year` is a leap year in Julian calendar.
    fn from_julian(year: i32) -> Self {
        if year.rem_euclid(4) == 0 {
            Self::Leap
        } else {
            Self::Common
        }
    }
    /// Returns `true` if `self` is `Leap`, otherwise `false`.
    fn is_leap(&self) -> bool {
        matches!(self, YearType::Leap)
    }
}

fn days_in_month(month: i32, year_type: YearType) -> i32 {
    match month {
        2 => 28 + year_type.is_leap() as i32,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
