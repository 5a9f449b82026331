//! Japanese lunisolar calendar (旧暦) and era (元号) computation.
//!
//! Months are assembled from true or mean new moons and solar terms computed
//! with a short series ephemeris, under the calendar system that was in use in
//! Japan at the time, from the mean motions before 元嘉暦 to 天保暦. Eras come
//! from an embedded table reaching from 神武 to 令和, with a choice between
//! the rival courts where eras diverge.
//!
//! # Examples
//!
//! Basic usage with [`Date`]:
//!
//! ```
//! use koyomi::Date;
//!
//! let date = Date::from_gregorian(2000, 1, 1).unwrap();
//!
//! assert_eq!(2451545, date.jdn());
//! assert_eq!(55, date.sexagenary()); // 戊午
//! assert_eq!((1999, 12, 19), date.julian());
//! ```
//!
//! Japanese lunisolar calendar:
//!
//! ```
//! use koyomi::{Date, Instant};
//! use koyomi::japanese::JapaneseCalendar;
//! use koyomi::lunisolar::Month::*;
//!
//! let calendar = JapaneseCalendar::default();
//! let noon = Instant::from_date(Date::from_gregorian(2000, 1, 1).unwrap(), 12, 0, 0.0, 540);
//! let date = calendar.materialize(noon);
//!
//! assert_eq!(Some(1999), date.year());
//! assert_eq!(Some(Common(11)), date.month());
//! assert_eq!(Some(25), date.day_of_month());
//! assert_eq!(Some("平成"), date.era().map(|e| e.name()));
//! assert_eq!(Some(12), date.year_of_era());
//! ```
//!
//! Lower-level pieces are in [`lunisolar`], which is not tied to Japan: any
//! [`lunisolar::chronology::Chronology`] and timezone can be used.

pub mod date;
pub mod error;
pub mod instant;
pub mod japanese;
pub mod lunisolar;

pub use date::Date;
pub use error::{Error, Result};
pub use instant::Instant;
