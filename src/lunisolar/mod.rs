//! Lunisolar calendar assembly.
//!
//! Months start on the civil day of a new moon. Months are numbered by the
//! principal solar terms (中気) they hold: the month holding the winter
//! solstice is the 11th. A solstice year (歳, [`Annus`]) with thirteen months
//! gets one intercalary month, the first one holding no principal term.
//!
//! [`Annus`] runs from month 11 to month 10 (or an intercalary 10th), which
//! is what the rules are stated in. The calendar year people use,
//! [`LunisolarYear`], starts at month 1 instead and is cut out of two
//! consecutive solstice years.
//!
//! Everything here is parameterized by a [`Chronology`] and a timezone, see
//! [`crate::japanese`] for the historical Japanese setup.

use tracing::{debug, warn};

use crate::date::Date;
use crate::instant::Instant;

pub mod chronology;
pub mod ephemeris;
pub mod solver;

use chronology::Chronology;
use solver::TermSolver;

/// Name of a month: `Common(n)` is the `n`th month, `Leap(n)` the
/// intercalary month following it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Month {
    Common(u32),
    Leap(u32),
}

impl Month {
    /// The month number, `1..=12`, intercalary or not.
    pub fn num(&self) -> u32 {
        use Month::*;
        *match self {
            Common(v) | Leap(v) => v,
        }
    }
    /// `true` for an intercalary month.
    pub fn is_leap(&self) -> bool {
        matches!(self, Self::Leap(_))
    }
}

/// A month and the solar terms falling in it.
///
/// All instants are Julian dates. `interval_start` is the civil midnight the
/// month starts at, and the month lasts until `interval_end` (exclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct LunisolarMonth {
    /// Calendar year the month belongs to.
    pub year: i32,
    pub month: Month,
    pub interval_start: f64,
    pub interval_end: f64,
    /// Principal terms (中気), at multiples of 30° of solar longitude.
    pub mid_climates: Vec<f64>,
    /// Minor terms (節気), the odd multiples of 15°.
    pub pre_climates: Vec<f64>,
}

impl LunisolarMonth {
    /// Month number, `1..=12`.
    pub fn month_of_year(&self) -> u32 {
        self.month.num()
    }
    /// `true` for an intercalary month.
    pub fn is_intercalary(&self) -> bool {
        self.month.is_leap()
    }
    /// Whether `julian_day` falls within the month.
    pub fn contains(&self, julian_day: f64) -> bool {
        (self.interval_start..self.interval_end).contains(&julian_day)
    }
    /// Length of the month in days, 29 or 30.
    pub fn days(&self) -> u32 {
        (self.interval_end - self.interval_start).round() as u32
    }
}

/// A solstice year (歳), from month 11 up to, not including, the next month
/// 11.
#[derive(Debug, Clone, PartialEq)]
pub struct Annus {
    /// The year most of the solstice year falls in, i.e. the year of the
    /// second winter solstice.
    pub annus: i32,
    pub winter_solstice: f64,
    pub next_winter_solstice: f64,
    pub months: Vec<LunisolarMonth>,
}

impl Annus {
    /// The intercalary month, if the year has one.
    pub fn leap_month(&self) -> Option<Month> {
        self.months.iter().map(|m| m.month).find(Month::is_leap)
    }
}

/// Months of one calendar year, from month 1 to the month before the next
/// month 1.
///
/// # Example
///
/// ```
/// use koyomi::{Date, Instant};
/// use koyomi::japanese::JapaneseChronology;
/// use koyomi::lunisolar::{CalendarAssembler, Month::*};
///
/// let assembler = CalendarAssembler::new(&JapaneseChronology::Tenpo, 540);
/// let noon = Instant::from_date(Date::from_gregorian(2017, 7, 22).unwrap(), 12, 0, 0.0, 540);
/// let year = assembler.year_calendar(noon.0);
///
/// assert_eq!(2017, year.year);
/// assert_eq!(13, year.months.len());
/// assert_eq!(Ok((2017, Leap(5), 29)), year.ymd_for(noon.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LunisolarYear {
    pub year: i32,
    pub months: Vec<LunisolarMonth>,
    tz_offset_minutes: i32,
}

/// Tells that a day is not in a year, and on which side.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OutOfYear {
    Before,
    After,
}

impl LunisolarYear {
    /// First instant of the year.
    pub fn start(&self) -> Option<f64> {
        self.months.first().map(|m| m.interval_start)
    }
    /// First instant after the year.
    pub fn end(&self) -> Option<f64> {
        self.months.last().map(|m| m.interval_end)
    }
    /// The month `julian_day` falls in.
    pub fn month_for(&self, julian_day: f64) -> Result<&LunisolarMonth, OutOfYear> {
        match (self.start(), self.end()) {
            (Some(start), _) if julian_day < start => Err(OutOfYear::Before),
            (Some(_), Some(end)) if julian_day < end => Ok(self
                .months
                .iter()
                .rev()
                .find(|m| m.interval_start <= julian_day)
                .ok_or(OutOfYear::Before)?),
            _ => Err(OutOfYear::After),
        }
    }
    /// Year, month and day of month of `julian_day`, or which side of this
    /// year it lies on.
    pub fn ymd_for(&self, julian_day: f64) -> Result<(i32, Month, u32), OutOfYear> {
        let month = self.month_for(julian_day)?;
        let tz = self.tz_offset_minutes;
        let day = Instant(julian_day).date_in_timezone(tz)
            - Instant(month.interval_start).date_in_timezone(tz)
            + 1;
        Ok((month.year, month.month, day as u32))
    }
}

/// Solar terms of interest per solstice year: 24 plus slack on both ends.
const MAX_TERMS: usize = 32;
/// Months of a solstice year, plus the closing one.
const MAX_MONTHS: usize = 15;

/// Assembles months and years under a chronology, for civil days in a
/// timezone.
#[derive(Copy, Clone)]
pub struct CalendarAssembler<'c> {
    solver: TermSolver<'c>,
    tz_offset_minutes: i32,
}

impl<'c> CalendarAssembler<'c> {
    /// `tz_offset_minutes` is east of UTC, `540` for Japan.
    pub fn new(chronology: &'c dyn Chronology, tz_offset_minutes: i32) -> Self {
        Self {
            solver: TermSolver::new(chronology),
            tz_offset_minutes,
        }
    }

    pub fn solver(&self) -> &TermSolver<'c> {
        &self.solver
    }

    pub fn tz_offset_minutes(&self) -> i32 {
        self.tz_offset_minutes
    }

    fn start_of_day(&self, julian_day: f64) -> f64 {
        Instant(julian_day).start_of_day(self.tz_offset_minutes).0
    }

    fn start_of_next_day(&self, julian_day: f64) -> f64 {
        let date = Instant(julian_day).date_in_timezone(self.tz_offset_minutes);
        Instant::at_start_of_day(date + 1, self.tz_offset_minutes).0
    }

    /// Civil midnight a month starts at, given its new moon.
    ///
    /// Under a day-advance rule a new moon late in the day starts its month
    /// on the next day.
    pub fn month_start(&self, new_moon: f64) -> f64 {
        let threshold = self.solver.chronology().day_advance_threshold();
        let start = self.start_of_day(new_moon);
        if threshold < 1.0 && new_moon - start >= threshold {
            self.start_of_next_day(new_moon)
        } else {
            start
        }
    }

    /// `(month start, new moon)` of the last month starting before
    /// `next_midnight`.
    fn month_before(&self, next_midnight: f64) -> (f64, f64) {
        let new_moon = self.solver.new_moon(next_midnight);
        let start = self.month_start(new_moon);
        if start < next_midnight {
            return (start, new_moon);
        }
        // Pushed past the day by the day-advance rule.
        let new_moon = self.solver.new_moon(new_moon - 2.0);
        (self.month_start(new_moon), new_moon)
    }

    /// New moon opening the year `year`: the last one at or before a
    /// synodic month ahead of the vernal equinox.
    pub fn first_day_of_year(&self, year: i32) -> f64 {
        let tz = self.tz_offset_minutes;
        // Before 4713 BC there is nothing to count days from.
        let april_1 = Date::from_civil(year, 4, 1).unwrap_or_else(|| Date::from_jdn(0));
        let equinox = self
            .solver
            .solar_term(Instant::at_start_of_day(april_1, tz).end_of_day(tz).0, 0.0);
        let month = self.solver.chronology().synodic_month_length();
        self.solver.new_moon(equinox - month)
    }

    /// Assembles the solstice year ending with the winter solstice of
    /// `annus`.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::japanese::JapaneseChronology;
    /// use koyomi::lunisolar::{CalendarAssembler, Month::*};
    ///
    /// let assembler = CalendarAssembler::new(&JapaneseChronology::Tenpo, 540);
    /// let annus = assembler.solstice_year(2023);
    ///
    /// assert_eq!(13, annus.months.len());
    /// assert_eq!(Some(Leap(2)), annus.leap_month());
    /// ```
    pub fn solstice_year(&self, annus: i32) -> Annus {
        let winter_solstice = self.solver.solar_term(self.first_day_of_year(annus), 270.0);
        let next_winter_solstice = self
            .solver
            .solar_term(self.first_day_of_year(annus + 1), 270.0);

        let (first, mut new_moon) = self.month_before(self.start_of_next_day(winter_solstice));
        let (last, _) = self.month_before(self.start_of_next_day(next_winter_solstice));
        let month = self.solver.chronology().synodic_month_length();
        let mut starts = vec![first];
        while starts.len() < MAX_MONTHS {
            new_moon = self.solver.new_moon(new_moon + month + 1.0);
            let start = self.month_start(new_moon);
            // Mean new moons restart at the next solstice and may land just
            // short of `last`.
            if start >= last - month / 2.0 {
                break;
            }
            starts.push(start);
        }
        starts.push(last);

        // Terms from the one before the solstice to past the last month.
        let mut angle = 255;
        let mut term = self.solver.solar_term(winter_solstice, angle as f64);
        let mut terms = vec![(term, angle)];
        while term < last + 1.0 && terms.len() < MAX_TERMS {
            angle = (angle + 15) % 360;
            term = self.solver.solar_term(term + 17.0, angle as f64);
            terms.push((term, angle));
        }

        let count = starts.len() - 1;
        if !(12..=13).contains(&count) {
            warn!(annus, months = count, "unexpected number of months between winter solstices");
        }
        let mut needs_leap = count == 13;
        let mut num = 10;
        let mut months = Vec::with_capacity(count);
        for bounds in starts.windows(2) {
            let (start, end) = (bounds[0], bounds[1]);
            let (mut mid_climates, mut pre_climates) = (Vec::new(), Vec::new());
            for &(t, a) in terms.iter().filter(|(t, _)| (start..end).contains(t)) {
                if a % 30 == 0 {
                    mid_climates.push(t);
                } else {
                    pre_climates.push(t);
                }
            }
            let month = if needs_leap && mid_climates.is_empty() {
                needs_leap = false;
                Month::Leap(num)
            } else {
                num = num % 12 + 1;
                Month::Common(num)
            };
            let year = if month.num() >= 11 { annus - 1 } else { annus };
            months.push(LunisolarMonth {
                year,
                month,
                interval_start: start,
                interval_end: end,
                mid_climates,
                pre_climates,
            });
        }

        let annus = Annus {
            annus,
            winter_solstice,
            next_winter_solstice,
            months,
        };
        debug!(
            annus = annus.annus,
            months = annus.months.len(),
            leap = ?annus.leap_month(),
            "assembled solstice year"
        );
        annus
    }

    /// Assembles the calendar year `year`, from its month 1 to the next
    /// month 1.
    pub fn calendar_year(&self, year: i32) -> LunisolarYear {
        let first_month = |annus: &Annus| {
            annus
                .months
                .iter()
                .position(|m| m.month == Month::Common(1))
                .unwrap_or(annus.months.len())
        };
        let mut this = self.solstice_year(year);
        let mut next = self.solstice_year(year + 1);
        let mut months = this.months.split_off(first_month(&this));
        next.months.truncate(first_month(&next));
        months.append(&mut next.months);
        LunisolarYear {
            year,
            months,
            tz_offset_minutes: self.tz_offset_minutes,
        }
    }

    /// Assembles the calendar year `julian_day` falls in.
    pub fn year_calendar(&self, julian_day: f64) -> LunisolarYear {
        let mut year = Instant(julian_day)
            .date_in_timezone(self.tz_offset_minutes)
            .civil()
            .0;
        let mut calendar = self.calendar_year(year);
        // A lunisolar year straddles two civil years, one step is enough
        // unless the tables are broken.
        for _ in 0..2 {
            match calendar.month_for(julian_day) {
                Ok(_) => break,
                Err(OutOfYear::Before) => year -= 1,
                Err(OutOfYear::After) => year += 1,
            }
            calendar = self.calendar_year(year);
        }
        calendar
    }

    /// Day of month of `julian_day` in the month whose new moon is
    /// `first_day_of_month`, counting from 1.
    ///
    /// Returns `None` if `julian_day` precedes the month.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::{Date, Instant};
    /// use koyomi::japanese::JapaneseChronology;
    /// use koyomi::lunisolar::CalendarAssembler;
    ///
    /// let assembler = CalendarAssembler::new(&JapaneseChronology::Tenpo, 540);
    /// let new_moon = assembler.solver().new_moon(2451545.0);
    /// let day = Instant::from_date(Date::from_gregorian(1999, 12, 17).unwrap(), 12, 0, 0.0, 540);
    /// assert_eq!(Some(10), assembler.day_of_month(new_moon, day.0));
    /// ```
    pub fn day_of_month(&self, first_day_of_month: f64, julian_day: f64) -> Option<u32> {
        let tz = self.tz_offset_minutes;
        let first = Instant(self.month_start(first_day_of_month)).date_in_timezone(tz);
        let days = Instant(julian_day).date_in_timezone(tz) - first;
        u32::try_from(days + 1).ok().filter(|&d| d > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::japanese::JapaneseChronology;
    use crate::lunisolar::chronology::ChronologyParameters;
    use Month::*;

    const JST: i32 = 540;
    const TENPO: ChronologyParameters =
        ChronologyParameters::new_unchecked(365.242234, 29.530588, 1.0, true, true);
    const SENMYO: ChronologyParameters =
        ChronologyParameters::new_unchecked(365.244643, 29.530595, 6300.0 / 8400.0, true, false);

    fn date_of(julian_day: f64) -> String {
        Instant(julian_day).date_in_timezone(JST).iso_civil()
    }

    fn noon(y: i32, m: i32, d: i32) -> f64 {
        Instant::from_date(Date::from_civil(y, m, d).unwrap(), 12, 0, 0.0, JST).0
    }

    #[test]
    fn months() {
        let assembler = CalendarAssembler::new(&TENPO, JST);
        let annus = assembler.solstice_year(2000);
        let stds = [
            (11, "1999-12-08"),
            (12, "2000-01-07"),
            (1, "2000-02-05"),
            (2, "2000-03-06"),
            (3, "2000-04-05"),
            (4, "2000-05-04"),
            (5, "2000-06-02"),
            (6, "2000-07-02"),
            (7, "2000-07-31"),
            (8, "2000-08-29"),
            (9, "2000-09-28"),
            (10, "2000-10-27"),
        ];
        assert_eq!(stds.len(), annus.months.len());
        for (std, month) in stds.iter().zip(&annus.months) {
            assert_eq!(Common(std.0), month.month);
            assert_eq!(std.1, date_of(month.interval_start));
        }
        assert_eq!("2000-11-26", date_of(annus.months[11].interval_end));
        assert_eq!("1999-12-22", date_of(annus.winter_solstice));
        assert_eq!("2000-12-21", date_of(annus.next_winter_solstice));
        assert_eq!(None, annus.leap_month());
        assert_eq!(1999, annus.months[1].year);
        assert_eq!(2000, annus.months[2].year);
    }

    #[test]
    fn leap_months() {
        let stds = [
            (11, "2022-11-24"),
            (12, "2022-12-23"),
            (1, "2023-01-22"),
            (2, "2023-02-20"),
            (-2, "2023-03-22"),
            (3, "2023-04-20"),
            (4, "2023-05-20"),
            (5, "2023-06-18"),
            (6, "2023-07-18"),
            (7, "2023-08-16"),
            (8, "2023-09-15"),
            (9, "2023-10-15"),
            (10, "2023-11-13"),
        ];
        let assembler = CalendarAssembler::new(&TENPO, JST);
        let annus = assembler.solstice_year(2023);
        for (std, month) in stds.iter().zip(&annus.months) {
            let std_month = if std.0 > 0 {
                Common(std.0 as u32)
            } else {
                Leap(-std.0 as u32)
            };
            assert_eq!(
                (std_month, std.1.to_owned()),
                (month.month, date_of(month.interval_start))
            );
        }
        assert_eq!(stds.len(), annus.months.len());
        assert_eq!("2023-12-13", date_of(annus.months[12].interval_end));
    }

    #[test]
    fn intercalary_month_has_no_principal_term() {
        let assembler = CalendarAssembler::new(&TENPO, JST);
        for annus in 1990..2030 {
            let annus = assembler.solstice_year(annus);
            let leaps: Vec<_> = annus.months.iter().filter(|m| m.is_intercalary()).collect();
            match annus.months.len() {
                12 => assert!(leaps.is_empty(), "{}", annus.annus),
                13 => {
                    assert_eq!(1, leaps.len(), "{}", annus.annus);
                    assert!(leaps[0].mid_climates.is_empty(), "{}", annus.annus);
                }
                n => panic!("{} months in {}", n, annus.annus),
            }
            for month in annus.months.iter().filter(|m| !m.is_intercalary()) {
                assert!(!month.mid_climates.is_empty(), "{:?}", month);
            }
            assert!(annus.months[0].contains(annus.winter_solstice));
            for pair in annus.months.windows(2) {
                assert_eq!(pair[0].interval_end, pair[1].interval_start);
                assert!((29..=30).contains(&pair[0].days()));
            }
        }
    }

    #[test]
    fn mean_sun_years_open_on_the_true_solstice() {
        for (chronology, years) in [
            (JapaneseChronology::Genka, 460..560),
            (JapaneseChronology::Origin, 300..400),
        ] {
            let assembler = CalendarAssembler::new(&chronology, JST);
            for annus in years {
                let annus = assembler.solstice_year(annus);
                let leaps = annus.months.iter().filter(|m| m.is_intercalary()).count();
                match annus.months.len() {
                    12 => assert_eq!(0, leaps, "{chronology:?} {}", annus.annus),
                    13 => assert_eq!(1, leaps, "{chronology:?} {}", annus.annus),
                    n => panic!("{n} months in {chronology:?} {}", annus.annus),
                }
                assert!(annus.months[0].contains(annus.winter_solstice), "{}", annus.annus);
                for month in &annus.months {
                    assert!((29..=30).contains(&month.days()), "{month:?}");
                }
            }
        }
        let genka = CalendarAssembler::new(&JapaneseChronology::Genka, JST);
        assert_eq!(None, genka.solstice_year(462).leap_month());
    }

    #[test]
    fn calendar_year() {
        let assembler = CalendarAssembler::new(&TENPO, JST);
        let year = assembler.calendar_year(2017);
        let names: Vec<_> = year.months.iter().map(|m| m.month).collect();
        assert_eq!(
            vec![
                Common(1),
                Common(2),
                Common(3),
                Common(4),
                Common(5),
                Leap(5),
                Common(6),
                Common(7),
                Common(8),
                Common(9),
                Common(10),
                Common(11),
                Common(12),
            ],
            names
        );
        assert!(year.months.iter().all(|m| m.year == 2017));
        assert_eq!("2017-01-28", date_of(year.start().unwrap()));
        assert_eq!("2018-02-16", date_of(year.end().unwrap()));
    }

    #[test]
    fn dates() {
        use OutOfYear::*;
        let assembler = CalendarAssembler::new(&TENPO, JST);
        let data = [
            ((2017, 1, 28), Ok((2017, Common(1), 1))),
            ((2017, 6, 24), Ok((2017, Leap(5), 1))),
            ((2017, 7, 22), Ok((2017, Leap(5), 29))),
            ((2017, 7, 23), Ok((2017, Common(6), 1))),
            ((2018, 2, 15), Ok((2017, Common(12), 30))),
            ((2017, 1, 27), Err(Before)),
            ((2018, 2, 16), Err(After)),
        ];
        let year = assembler.calendar_year(2017);
        for ((y, m, d), std) in data {
            assert_eq!(std, year.ymd_for(noon(y, m, d)), "{y}-{m}-{d}");
        }
    }

    #[test]
    fn year_calendar_finds_the_year() {
        let assembler = CalendarAssembler::new(&TENPO, JST);
        for ((y, m, d), std) in [
            ((2000, 1, 1), (1999, Common(11), 25)),
            ((2023, 3, 22), (2023, Leap(2), 1)),
            ((1989, 1, 7), (1988, Common(11), 30)),
            ((2019, 5, 1), (2019, Common(3), 27)),
        ] {
            let jd = noon(y, m, d);
            assert_eq!(Ok(std), assembler.year_calendar(jd).ymd_for(jd), "{y}-{m}-{d}");
        }
    }

    #[test]
    fn day_advance() {
        let assembler = CalendarAssembler::new(&SENMYO, JST);
        // New moon at 23:41 local time on 1000-08-02 (Julian).
        let new_moon = assembler.solver().new_moon(noon(1000, 8, 3));
        assert_eq!("1000-08-02", date_of(new_moon));
        assert_eq!("1000-08-03", date_of(assembler.month_start(new_moon)));
        assert_eq!(None, assembler.day_of_month(new_moon, noon(1000, 8, 2)));
        assert_eq!(Some(1), assembler.day_of_month(new_moon, noon(1000, 8, 3)));
        let year = assembler.year_calendar(noon(1000, 8, 2));
        assert_eq!(Ok((1000, Common(6), 30)), year.ymd_for(noon(1000, 8, 2)));
        assert_eq!(Ok((1000, Common(7), 1)), year.ymd_for(noon(1000, 8, 3)));

        let plain = CalendarAssembler::new(&TENPO, JST);
        assert_eq!(Some(1), plain.day_of_month(new_moon, new_moon));
        assert_eq!(Some(2), plain.day_of_month(new_moon, noon(1000, 8, 3)));
    }
}
