//! The Japanese lunisolar calendar (旧暦) and its eras.
//!
//! [`JapaneseCalendar`] ties the historical calendar systems of
//! [`chronology`] to the era table of [`era`], for civil days in a fixed
//! timezone (JST by default). [`LunisolarDate`] is the stateful view of one
//! instant in it.
//!
//! # Example
//!
//! ```
//! use koyomi::{Date, Instant};
//! use koyomi::japanese::JapaneseCalendar;
//! use koyomi::lunisolar::Month::*;
//!
//! let calendar = JapaneseCalendar::default();
//! let noon = Instant::from_date(Date::from_gregorian(2017, 7, 22).unwrap(), 12, 0, 0.0, 540);
//! let date = calendar.materialize(noon);
//!
//! assert_eq!(Some(2017), date.year());
//! assert_eq!(Some(Leap(5)), date.month());
//! assert_eq!(Some(29), date.day_of_month());
//! assert_eq!(Some("heisei"), date.era().map(|e| e.key()));
//! assert_eq!(Some(29), date.year_of_era());
//! ```

use std::sync::Arc;

use tracing::{trace, warn};

use crate::date::Date;
use crate::instant::Instant;
use crate::lunisolar::solver::TermSolver;
use crate::lunisolar::{CalendarAssembler, LunisolarMonth, LunisolarYear, Month};

pub mod chronology;
pub mod era;
pub mod fmt;

pub use chronology::JapaneseChronology;

use era::{Era, EraRegistry, Lineage};
use fmt::{FormatStyle, Formatter};

/// Japan Standard Time, UTC+9, in minutes.
pub const ZONE_OFFSET_MINUTES: i32 = 540;

/// 1873-01-01T00:00+09:00, when Japan switched to the Gregorian calendar.
///
/// From this day on, years of era count civil years.
pub const GREGORIAN_ADOPTION: f64 = 2405159.125;

/// Settings of a [`JapaneseCalendar`].
///
/// # Example
///
/// ```
/// use koyomi::japanese::Config;
/// use koyomi::japanese::era::{HeianCourt, Lineage};
///
/// let config = Config::default()
///     .with_timezone_offset(0)
///     .with_lineage(Lineage { heian: HeianCourt::Heishi, ..Lineage::default() });
/// assert_eq!(0, config.tz_offset_minutes);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Config {
    /// Offset of civil days east of UTC.
    pub tz_offset_minutes: i32,
    /// Which era lists to follow where they diverge.
    pub lineage: Lineage,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tz_offset_minutes: ZONE_OFFSET_MINUTES,
            lineage: Lineage::default(),
        }
    }
}

impl Config {
    pub fn with_timezone_offset(self, tz_offset_minutes: i32) -> Self {
        Self {
            tz_offset_minutes,
            ..self
        }
    }
    pub fn with_lineage(self, lineage: Lineage) -> Self {
        Self { lineage, ..self }
    }
}

/// The calendar systems of Japan with an era registry.
#[derive(Debug, Clone)]
pub struct JapaneseCalendar {
    config: Config,
    registry: Arc<EraRegistry>,
}

impl Default for JapaneseCalendar {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl JapaneseCalendar {
    /// A calendar with the built-in era table.
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, EraRegistry::builtin(config.lineage))
    }

    /// A calendar with a custom era registry. The lineage of `config` is not
    /// applied to it.
    pub fn with_registry(config: Config, registry: Arc<EraRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &EraRegistry {
        &self.registry
    }

    /// The calendar system in use at `julian_day`.
    pub fn chronology_for(&self, julian_day: f64) -> JapaneseChronology {
        JapaneseChronology::for_julian_day(julian_day)
    }

    /// The lunisolar year `julian_day` falls in, assembled under the system in
    /// use at that day.
    pub fn year_calendar(&self, julian_day: f64) -> LunisolarYear {
        let chronology = self.chronology_for(julian_day);
        CalendarAssembler::new(&chronology, self.config.tz_offset_minutes).year_calendar(julian_day)
    }

    /// Number of the lunisolar year `julian_day` falls in.
    pub fn lunisolar_year_of(&self, julian_day: f64) -> i32 {
        self.year_calendar(julian_day).year
    }

    /// Year of `era` at `instant`, counting the year the era started as 1.
    ///
    /// Years are lunisolar before [`GREGORIAN_ADOPTION`] and civil from then
    /// on.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::{Date, Instant};
    /// use koyomi::japanese::JapaneseCalendar;
    ///
    /// let calendar = JapaneseCalendar::default();
    /// let meiji = calendar.registry().era("meiji", "meiji").unwrap();
    /// let noon =
    ///     |y, m, d| Instant::from_date(Date::from_gregorian(y, m, d).unwrap(), 12, 0, 0.0, 540);
    ///
    /// assert_eq!(5, calendar.year_of_era(meiji, noon(1872, 12, 31)));
    /// assert_eq!(6, calendar.year_of_era(meiji, noon(1873, 1, 1)));
    /// ```
    pub fn year_of_era(&self, era: &Era, instant: Instant) -> i32 {
        self.counted_year(instant.0) - self.counted_year(era.from_julian_day()) + 1
    }

    /// [`year_of_era`](Self::year_of_era) with the lunisolar year of the
    /// target already known.
    fn year_of_era_in(&self, era: &Era, julian_day: f64, lunisolar_year: i32) -> i32 {
        let year = if julian_day >= GREGORIAN_ADOPTION {
            self.civil_date(julian_day).civil().0
        } else {
            lunisolar_year
        };
        year - self.counted_year(era.from_julian_day()) + 1
    }

    fn counted_year(&self, julian_day: f64) -> i32 {
        if julian_day >= GREGORIAN_ADOPTION {
            self.civil_date(julian_day).civil().0
        } else {
            self.lunisolar_year_of(julian_day)
        }
    }

    fn civil_date(&self, julian_day: f64) -> Date {
        Instant(julian_day).date_in_timezone(self.config.tz_offset_minutes)
    }

    /// A materialized [`LunisolarDate`] of `instant`.
    pub fn materialize(&self, instant: Instant) -> LunisolarDate<'_> {
        let mut date = LunisolarDate::new(self);
        date.set(instant);
        date.materialize();
        date
    }
}

#[derive(Debug, Clone)]
struct Derived<'c> {
    calendar_of_year: LunisolarYear,
    /// Position of the month in `calendar_of_year`.
    month_index: usize,
    year: i32,
    month: Month,
    day_of_month: u32,
    civil_date: Date,
    chronology: JapaneseChronology,
    era: Option<&'c Era>,
    year_of_era: i32,
    solar_term: Option<u32>,
}

#[derive(Debug, Clone)]
enum State<'c> {
    Unset,
    Set(Instant),
    Materialized(Instant, Box<Derived<'c>>),
}

/// One instant on a [`JapaneseCalendar`], computed on demand.
///
/// A date is *unset* until [`set`](Self::set), then *set* until
/// [`materialize`](Self::materialize) computes its fields. Field accessors
/// return `None` unless the date is materialized. Setting a new instant drops
/// the computed fields.
///
/// # Example
///
/// ```
/// use koyomi::{Date, Instant};
/// use koyomi::japanese::{JapaneseCalendar, LunisolarDate};
///
/// let calendar = JapaneseCalendar::default();
/// let mut date = LunisolarDate::new(&calendar);
/// assert!(!date.is_set());
///
/// date.set(Instant::from_date(Date::from_gregorian(2019, 5, 1).unwrap(), 12, 0, 0.0, 540));
/// assert_eq!(None, date.year_of_era());
///
/// date.materialize();
/// assert_eq!(Some("令和"), date.era().map(|e| e.name()));
/// assert_eq!(Some(1), date.year_of_era());
/// ```
#[derive(Debug, Clone)]
pub struct LunisolarDate<'c> {
    calendar: &'c JapaneseCalendar,
    state: State<'c>,
}

impl<'c> LunisolarDate<'c> {
    /// An unset date.
    pub fn new(calendar: &'c JapaneseCalendar) -> Self {
        Self {
            calendar,
            state: State::Unset,
        }
    }

    pub fn calendar(&self) -> &'c JapaneseCalendar {
        self.calendar
    }

    /// Points the date at `instant`, dropping computed fields.
    pub fn set(&mut self, instant: Instant) {
        self.state = State::Set(instant);
    }

    /// Back to unset.
    pub fn clear(&mut self) {
        self.state = State::Unset;
    }

    pub fn is_set(&self) -> bool {
        !matches!(self.state, State::Unset)
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self.state, State::Materialized(..))
    }

    /// Computes the fields of a set date. Does nothing if the date is unset or
    /// already materialized.
    pub fn materialize(&mut self) {
        let State::Set(instant) = self.state else {
            return;
        };
        let calendar = self.calendar;
        let julian_day = instant.0;
        let chronology = calendar.chronology_for(julian_day);
        let calendar_of_year = calendar.year_calendar(julian_day);
        let Some(month_index) = calendar_of_year
            .months
            .iter()
            .position(|m| m.contains(julian_day))
        else {
            warn!(julian_day, year = calendar_of_year.year, "no month contains the day");
            return;
        };
        let (year, month, day_of_month) = match calendar_of_year.ymd_for(julian_day) {
            Ok(ymd) => ymd,
            Err(side) => {
                warn!(julian_day, ?side, "day is outside its lunisolar year");
                return;
            }
        };
        let era = calendar.registry.era_of(julian_day);
        let year_of_era = match era {
            Some(era) => calendar.year_of_era_in(era, julian_day, year),
            None => year,
        };
        let civil_date = calendar.civil_date(julian_day);
        let solar_term = solar_term_on(
            calendar,
            &chronology,
            &calendar_of_year.months[month_index],
            civil_date,
        );
        trace!(
            julian_day,
            year,
            ?month,
            day_of_month,
            era = era.map(Era::key),
            year_of_era,
            "materialized"
        );
        self.state = State::Materialized(
            instant,
            Box::new(Derived {
                calendar_of_year,
                month_index,
                year,
                month,
                day_of_month,
                civil_date,
                chronology,
                era,
                year_of_era,
                solar_term,
            }),
        );
    }

    fn derived(&self) -> Option<&Derived<'c>> {
        match &self.state {
            State::Materialized(_, derived) => Some(derived),
            _ => None,
        }
    }

    /// The instant the date is set to.
    pub fn instant(&self) -> Option<Instant> {
        match self.state {
            State::Unset => None,
            State::Set(instant) | State::Materialized(instant, _) => Some(instant),
        }
    }

    pub fn julian_day(&self) -> Option<f64> {
        self.instant().map(|i| i.0)
    }

    /// Lunisolar year.
    pub fn year(&self) -> Option<i32> {
        self.derived().map(|d| d.year)
    }

    pub fn month(&self) -> Option<Month> {
        self.derived().map(|d| d.month)
    }

    /// Month number, `1..=12`, intercalary or not.
    pub fn month_of_year(&self) -> Option<u32> {
        self.month().map(|m| m.num())
    }

    pub fn day_of_month(&self) -> Option<u32> {
        self.derived().map(|d| d.day_of_month)
    }

    pub fn is_intercalary(&self) -> Option<bool> {
        self.month().map(|m| m.is_leap())
    }

    /// The era, `None` also before the first era of the registry.
    pub fn era(&self) -> Option<&'c Era> {
        self.derived()?.era
    }

    /// Year of [`era`](Self::era). Days before the first era count the
    /// lunisolar year instead.
    pub fn year_of_era(&self) -> Option<i32> {
        self.derived().map(|d| d.year_of_era)
    }

    /// The calendar system the date was computed with.
    pub fn chronology(&self) -> Option<JapaneseChronology> {
        self.derived().map(|d| d.chronology)
    }

    /// All months of the lunisolar year.
    pub fn calendar_of_year(&self) -> Option<&LunisolarYear> {
        self.derived().map(|d| &d.calendar_of_year)
    }

    /// The month the date falls in.
    pub fn lunisolar_month(&self) -> Option<&LunisolarMonth> {
        self.derived().map(|d| &d.calendar_of_year.months[d.month_index])
    }

    /// The civil day in the calendar's timezone.
    pub fn civil_date(&self) -> Option<Date> {
        self.derived().map(|d| d.civil_date)
    }

    /// Sexagenary number of the lunisolar year, 1 (甲子) to 60 (癸亥).
    pub fn sexagenary_year(&self) -> Option<u32> {
        self.year().map(|y| (y - 4).rem_euclid(60) as u32 + 1)
    }

    /// Sexagenary number of the civil day, 1 (甲子) to 60 (癸亥).
    pub fn sexagenary_day(&self) -> Option<u32> {
        self.civil_date().map(|d| d.sexagenary() as u32)
    }

    /// 六曜, `0..6` in the order of [`fmt::rokuyo`].
    pub fn rokuyo(&self) -> Option<u32> {
        self.derived().map(|d| (d.month.num() + d.day_of_month) % 6)
    }

    /// Index of the solar term falling on the civil day, if one does. See
    /// [`fmt::solar_term`].
    pub fn solar_term(&self) -> Option<u32> {
        self.derived()?.solar_term
    }

    /// Formats the date. `None` unless materialized.
    ///
    /// From 1873 the civil month and day are written, as the official
    /// calendar is Gregorian by then.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::{Date, Instant};
    /// use koyomi::japanese::JapaneseCalendar;
    /// use koyomi::japanese::fmt::{FormatStyle, Formatter};
    ///
    /// let calendar = JapaneseCalendar::default();
    /// let mut formatter = Formatter::default();
    /// let noon =
    ///     |y, m, d| Instant::from_date(Date::from_gregorian(y, m, d).unwrap(), 12, 0, 0.0, 540);
    ///
    /// let date = calendar.materialize(noon(1868, 10, 23));
    /// let text = date.formatted(FormatStyle::Long, "ja", &mut formatter);
    /// assert_eq!(Some("明治1年9月8日".to_owned()), text);
    ///
    /// let date = calendar.materialize(noon(2019, 5, 1));
    /// let text = date.formatted(FormatStyle::Medium, "ja", &mut formatter);
    /// assert_eq!(Some("R1.5.1".to_owned()), text);
    /// ```
    pub fn formatted(
        &self,
        style: FormatStyle,
        locale: &str,
        formatter: &mut Formatter,
    ) -> Option<String> {
        let derived = self.derived()?;
        let (month, day) = if self.julian_day()? >= GREGORIAN_ADOPTION {
            let (_, m, d) = derived.civil_date.civil();
            (Month::Common(m as u32), d as u32)
        } else {
            (derived.month, derived.day_of_month)
        };
        let fields = fmt::Fields {
            era: derived.era,
            year: derived.year_of_era,
            month,
            day,
            rokuyo: self.rokuyo()?,
        };
        Some(formatter.format(&fields, style, locale))
    }
}

/// The solar term on `date`, found among the terms of its month.
fn solar_term_on(
    calendar: &JapaneseCalendar,
    chronology: &JapaneseChronology,
    month: &LunisolarMonth,
    date: Date,
) -> Option<u32> {
    let tz = calendar.config.tz_offset_minutes;
    let start = Instant::at_start_of_day(date, tz).0;
    let end = Instant::at_start_of_day(date + 1, tz).0;
    let on_day = |t: &f64| (start..end).contains(t);
    if !month.mid_climates.iter().chain(&month.pre_climates).any(on_day) {
        return None;
    }
    let solver = TermSolver::new(chronology);
    (0..24).find(|&k| on_day(&solver.solar_term(end - 1e-6, (k * 15) as f64)))
}
