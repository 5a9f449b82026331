//! Eras (元号) and the periods grouping them.
//!
//! The eras shipped with this crate are read from `data/eras.txt`, a plain
//! text table. Each line is one of
//!
//! ```text
//! # comment
//! period <key> [<lineage>]
//! <era key> <name> <first day> [<last day>]
//! ```
//!
//! Days are civil dates in Japan (Julian calendar before 1582-10-15) written
//! `YYYY-MM-DD` with astronomical years. An era without a last day lasts until
//! the next era of its period starts. Periods tagged with a lineage are only
//! used when that lineage is selected, see [`Lineage`].

use std::sync::Arc;

use once_cell::sync::Lazy;

use super::ZONE_OFFSET_MINUTES;
use crate::date::Date;
use crate::error::{ConfigurationError, Result, TableErrorKind};
use crate::instant::Instant;

/// An era: a key unique within its period, a display name and a half-open
/// interval of Julian dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Era {
    key: String,
    name: String,
    from_julian_day: f64,
    to_julian_day: Option<f64>,
}

impl Era {
    /// `to_julian_day` is exclusive. `None` leaves the era open-ended.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        from_julian_day: f64,
        to_julian_day: Option<f64>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            from_julian_day,
            to_julian_day,
        }
    }
    /// Romanized key, like `"heisei"`.
    pub fn key(&self) -> &str {
        &self.key
    }
    /// Display name, like `"平成"`.
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn from_julian_day(&self) -> f64 {
        self.from_julian_day
    }
    pub fn to_julian_day(&self) -> Option<f64> {
        self.to_julian_day
    }
    pub fn contains(&self, julian_day: f64) -> bool {
        julian_day >= self.from_julian_day && self.to_julian_day.is_none_or(|to| julian_day < to)
    }
}

/// A run of consecutive eras.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    key: String,
    eras: Vec<Era>,
}

impl Period {
    /// Validates and creates a period.
    ///
    /// Eras must be in order and must not overlap, and only the last one may
    /// be open-ended. Gaps between eras are allowed.
    pub fn new(key: impl Into<String>, eras: Vec<Era>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() || eras.iter().any(|e| e.key.is_empty()) {
            return Err(ConfigurationError::EmptyKey { period: key }.into());
        }
        if eras.is_empty() {
            return Err(ConfigurationError::EmptyPeriod { period: key }.into());
        }
        for (i, era) in eras.iter().enumerate() {
            let (period, name) = (key.clone(), era.key.clone());
            let error = if eras[..i].iter().any(|e| e.key == era.key) {
                ConfigurationError::DuplicateKey { period, era: name }
            } else if era.to_julian_day.is_some_and(|to| to <= era.from_julian_day) {
                ConfigurationError::NonPositiveSpan { period, era: name }
            } else if era.to_julian_day.is_none() && i + 1 < eras.len() {
                ConfigurationError::OpenEnded { period, era: name }
            } else if i > 0
                && eras[i - 1]
                    .to_julian_day
                    .is_some_and(|to| era.from_julian_day < to)
            {
                ConfigurationError::Overlap { period, era: name }
            } else {
                continue;
            };
            return Err(error.into());
        }
        Ok(Self { key, eras })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
    pub fn eras(&self) -> &[Era] {
        &self.eras
    }
    /// Start of the first era.
    pub fn from_julian_day(&self) -> f64 {
        self.eras[0].from_julian_day
    }
    /// End of the last era, `None` if it is still going on.
    pub fn to_julian_day(&self) -> Option<f64> {
        self.eras[self.eras.len() - 1].to_julian_day
    }
    pub fn contains(&self, julian_day: f64) -> bool {
        julian_day >= self.from_julian_day()
            && self.to_julian_day().is_none_or(|to| julian_day < to)
    }
    /// The era `julian_day` falls in. Days in a gap between eras have none.
    pub fn era_of(&self, julian_day: f64) -> Option<&Era> {
        self.eras.iter().find(|e| e.contains(julian_day))
    }
}

/// Court of the late Heian period whose eras are followed for 1181-1185.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum HeianCourt {
    /// The Taira (平氏), who kept 養和 and 寿永.
    Heishi,
    /// The Minamoto (源氏), who kept 治承 and then took up 元暦.
    #[default]
    Genji,
}

/// Imperial line whose eras are followed from 1331 to 1392.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum ImperialCourt {
    /// The Northern Court (持明院統).
    Jimyoin,
    /// The Southern Court (大覚寺統).
    #[default]
    Daikakuji,
}

/// Selects one of the rival era lists for each contested time.
///
/// # Example
///
/// ```
/// use koyomi::japanese::era::{HeianCourt, ImperialCourt, Lineage};
///
/// let lineage = Lineage::default();
/// assert_eq!(HeianCourt::Genji, lineage.heian);
/// assert_eq!(ImperialCourt::Daikakuji, lineage.court);
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Lineage {
    pub heian: HeianCourt,
    pub court: ImperialCourt,
}

impl Lineage {
    pub const ALL: [Lineage; 4] = [
        Lineage::new(HeianCourt::Heishi, ImperialCourt::Jimyoin),
        Lineage::new(HeianCourt::Heishi, ImperialCourt::Daikakuji),
        Lineage::new(HeianCourt::Genji, ImperialCourt::Jimyoin),
        Lineage::new(HeianCourt::Genji, ImperialCourt::Daikakuji),
    ];

    pub const fn new(heian: HeianCourt, court: ImperialCourt) -> Self {
        Self { heian, court }
    }

    /// Position in [`Lineage::ALL`].
    pub fn index(self) -> usize {
        let heian = match self.heian {
            HeianCourt::Heishi => 0,
            HeianCourt::Genji => 1,
        };
        let court = match self.court {
            ImperialCourt::Jimyoin => 0,
            ImperialCourt::Daikakuji => 1,
        };
        heian * 2 + court
    }

    /// Whether a period tagged `tag` is used under this lineage.
    fn selects(self, tag: &str) -> std::result::Result<bool, TableErrorKind> {
        Ok(match tag {
            "heishi" => self.heian == HeianCourt::Heishi,
            "genji" => self.heian == HeianCourt::Genji,
            "jimyoin" => self.court == ImperialCourt::Jimyoin,
            "daikakuji" => self.court == ImperialCourt::Daikakuji,
            _ => return Err(TableErrorKind::UnknownLineage(tag.to_owned())),
        })
    }
}

static TABLE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/eras.txt"));

static BUILTIN: Lazy<[Arc<EraRegistry>; 4]> = Lazy::new(|| {
    Lineage::ALL.map(|lineage| match EraRegistry::from_table(TABLE, lineage) {
        Ok(registry) => Arc::new(registry),
        Err(e) => panic!("built-in era table is broken: {}", e),
    })
});

/// Periods in lookup order.
///
/// Lookups take the first period containing a day, so a period listed earlier
/// overrides those after it where they overlap.
///
/// # Example
///
/// ```
/// use koyomi::{Date, Instant};
/// use koyomi::japanese::era::{EraRegistry, Lineage};
///
/// let registry = EraRegistry::builtin(Lineage::default());
/// let day = Instant::from_date(Date::from_gregorian(2019, 5, 1).unwrap(), 12, 0, 0.0, 540);
/// let era = registry.era_of(day.0).unwrap();
///
/// assert_eq!("reiwa", era.key());
/// assert_eq!("令和", era.name());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EraRegistry {
    periods: Vec<Period>,
}

impl EraRegistry {
    /// Validates and creates a registry. Only the last era of the last period
    /// may be open-ended.
    pub fn new(periods: Vec<Period>) -> Result<Self> {
        if let Some((_, init)) = periods.split_last() {
            if let Some(period) = init.iter().find(|p| p.to_julian_day().is_none()) {
                let era = &period.eras[period.eras.len() - 1];
                return Err(ConfigurationError::OpenEnded {
                    period: period.key.clone(),
                    era: era.key.clone(),
                }
                .into());
            }
        }
        Ok(Self { periods })
    }

    /// The registry shipped with this crate.
    ///
    /// # Panics
    ///
    /// If the embedded table is malformed. It is parsed once per lineage, on
    /// first use.
    pub fn builtin(lineage: Lineage) -> Arc<EraRegistry> {
        Arc::clone(&BUILTIN[lineage.index()])
    }

    /// Parses an era table, keeping the periods `lineage` selects.
    ///
    /// Periods of other lineages are checked all the same.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::japanese::era::{EraRegistry, Lineage};
    ///
    /// let table = "period modern\nheisei 平成 1989-01-08\n";
    /// let registry = EraRegistry::from_table(table, Lineage::default()).unwrap();
    /// assert_eq!("heisei", registry.periods()[0].eras()[0].key());
    ///
    /// assert!(EraRegistry::from_table("heisei 平成 1989-01-08\n", Lineage::default()).is_err());
    /// ```
    pub fn from_table(text: &str, lineage: Lineage) -> Result<Self> {
        struct Draft<'a> {
            key: &'a str,
            selected: bool,
            // (key, name, from, last day)
            eras: Vec<(&'a str, &'a str, Date, Option<Date>)>,
        }

        let mut drafts: Vec<Draft> = Vec::new();
        for (line_num, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let content = line.split('#').next().unwrap_or_default();
            let fields: Vec<_> = content.split_whitespace().collect();
            let wrap_err = |field_num: usize, reason: TableErrorKind| {
                ConfigurationError::Table {
                    line_num,
                    field_num,
                    reason,
                }
            };
            match fields.as_slice() {
                [] => continue,
                ["period", rest @ ..] => {
                    let (key, selected) = match rest {
                        [] => return Err(wrap_err(2, TableErrorKind::MissingField).into()),
                        [key] => (*key, true),
                        [key, tag] => (*key, lineage.selects(tag).map_err(|e| wrap_err(3, e))?),
                        [_, _, ..] => return Err(wrap_err(4, TableErrorKind::ExtraField).into()),
                    };
                    drafts.push(Draft {
                        key,
                        selected,
                        eras: Vec::new(),
                    });
                }
                [key, rest @ ..] => {
                    let draft = drafts
                        .last_mut()
                        .ok_or_else(|| wrap_err(1, TableErrorKind::NoPeriod))?;
                    let (name, from, to) = match rest {
                        [] => return Err(wrap_err(2, TableErrorKind::MissingField).into()),
                        [_] => return Err(wrap_err(3, TableErrorKind::MissingField).into()),
                        [name, from] => {
                            (*name, parse_date(from).map_err(|e| wrap_err(3, e))?, None)
                        }
                        [name, from, to] => (
                            *name,
                            parse_date(from).map_err(|e| wrap_err(3, e))?,
                            Some(parse_date(to).map_err(|e| wrap_err(4, e))?),
                        ),
                        [_, _, _, ..] => return Err(wrap_err(5, TableErrorKind::ExtraField).into()),
                    };
                    draft.eras.push((key, name, from, to));
                }
            }
        }

        let mut periods = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let starts: Vec<_> = draft.eras.iter().map(|e| midnight(e.2)).collect();
            let eras = draft
                .eras
                .iter()
                .enumerate()
                .map(|(i, &(key, name, _, last_day))| {
                    // An explicit last day wins, otherwise the era runs up to
                    // the next one.
                    let to = last_day
                        .map(|d| midnight(d + 1))
                        .or_else(|| starts.get(i + 1).copied());
                    Era::new(key, name, starts[i], to)
                })
                .collect();
            let period = Period::new(draft.key, eras)?;
            if draft.selected {
                periods.push(period);
            }
        }
        Self::new(periods)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The first period containing `julian_day`.
    pub fn period_of(&self, julian_day: f64) -> Option<&Period> {
        self.periods.iter().find(|p| p.contains(julian_day))
    }

    /// The era of `julian_day`, `None` before the first era.
    pub fn era_of(&self, julian_day: f64) -> Option<&Era> {
        self.period_of(julian_day)?.era_of(julian_day)
    }

    /// Looks an era up by period and era key.
    pub fn era(&self, period: &str, key: &str) -> Option<&Era> {
        self.periods
            .iter()
            .find(|p| p.key == period)?
            .eras
            .iter()
            .find(|e| e.key == key)
    }
}

fn midnight(date: Date) -> f64 {
    Instant::at_start_of_day(date, ZONE_OFFSET_MINUTES).0
}

/// Parses `YYYY-MM-DD`, the year possibly negative.
fn parse_date(text: &str) -> std::result::Result<Date, TableErrorKind> {
    let mut parts = text.rsplitn(3, '-');
    let (Some(d), Some(m), Some(y)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TableErrorKind::InvalidDate(text.to_owned()));
    };
    let [y, m, d] = [y, m, d].map(|s| s.parse::<i32>().map_err(TableErrorKind::InvalidInt));
    Date::from_civil_checked(y?, m?, d?).map_err(|_| TableErrorKind::InvalidDate(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn noon(y: i32, m: i32, d: i32) -> f64 {
        Instant::from_date(Date::from_civil(y, m, d).unwrap(), 12, 0, 0.0, ZONE_OFFSET_MINUTES).0
    }

    fn table_error(text: &str) -> (usize, usize, TableErrorKind) {
        match EraRegistry::from_table(text, Lineage::default()) {
            Err(Error::InvalidConfiguration(ConfigurationError::Table {
                line_num,
                field_num,
                reason,
            })) => (line_num, field_num, reason),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn builtin() {
        for lineage in Lineage::ALL {
            let registry = EraRegistry::builtin(lineage);
            assert_eq!(18, registry.periods().len());
            assert_eq!(lineage.index(), Lineage::ALL.iter().position(|&l| l == lineage).unwrap());
        }
        let registry = EraRegistry::builtin(Lineage::default());
        assert!(Arc::ptr_eq(&registry, &EraRegistry::builtin(Lineage::default())));
        let last = registry.periods().last().unwrap();
        assert_eq!(("reiwa", None), (last.key(), last.to_julian_day()));
        assert_eq!(Some("元亨"), registry.era("kamakura", "genko").map(Era::name));
        assert_eq!(Some("元弘"), registry.era("nanboku-cho", "genko").map(Era::name));
    }

    #[test]
    fn boundaries() {
        let registry = EraRegistry::builtin(Lineage::default());
        for (std, (y, m, d)) in [
            (None, (-659, 2, 17)),
            (Some("jinmu"), (-659, 2, 18)),
            (Some("taika"), (645, 7, 17)),
            (Some("kanei"), (1645, 1, 12)),
            (Some("shoho"), (1645, 1, 13)),
            (Some("keio"), (1868, 10, 22)),
            (Some("meiji"), (1868, 10, 23)),
            (Some("showa"), (1989, 1, 7)),
            (Some("heisei"), (1989, 1, 8)),
            (Some("heisei"), (2019, 4, 30)),
            (Some("reiwa"), (2019, 5, 1)),
            (Some("reiwa"), (2100, 1, 1)),
        ] {
            assert_eq!(std, registry.era_of(noon(y, m, d)).map(Era::key), "{y}-{m}-{d}");
        }
        // Eras change at midnight in Japan.
        let heisei = registry.era("heisei", "heisei").unwrap();
        assert_eq!(
            Instant::at_start_of_day(Date::from_gregorian(1989, 1, 8).unwrap(), 540).0,
            heisei.from_julian_day()
        );
        assert_eq!("heisei", registry.era_of(heisei.from_julian_day()).unwrap().key());
        assert_eq!("showa", registry.era_of(heisei.from_julian_day() - 1e-6).unwrap().key());
    }

    #[test]
    fn lineages() {
        use HeianCourt::*;
        use ImperialCourt::*;
        for (std, heian, court, (y, m, d)) in [
            ("yowa", Heishi, Daikakuji, (1182, 1, 1)),
            ("jisho", Genji, Daikakuji, (1182, 1, 1)),
            ("juei", Heishi, Daikakuji, (1184, 6, 1)),
            ("genryaku", Genji, Daikakuji, (1184, 6, 1)),
            ("bunji", Heishi, Jimyoin, (1186, 1, 1)),
            ("shokei", Genji, Jimyoin, (1332, 6, 1)),
            ("genko", Genji, Daikakuji, (1332, 6, 1)),
            ("ryakuo", Heishi, Jimyoin, (1340, 1, 1)),
            ("engen", Heishi, Daikakuji, (1340, 1, 1)),
            ("kenmu", Genji, Jimyoin, (1335, 1, 1)),
            ("meitoku", Genji, Jimyoin, (1393, 1, 1)),
            ("meitoku", Genji, Daikakuji, (1393, 1, 1)),
        ] {
            let registry = EraRegistry::builtin(Lineage::new(heian, court));
            assert_eq!(Some(std), registry.era_of(noon(y, m, d)).map(Era::key), "{y}-{m}-{d}");
        }
    }

    #[test]
    fn lookups_are_exclusive_and_monotonic() {
        for lineage in Lineage::ALL {
            let registry = EraRegistry::builtin(lineage);
            let mut jd = noon(-659, 2, 18);
            let end = noon(2030, 1, 1);
            let mut prev = registry.era_of(jd).unwrap().from_julian_day();
            while jd < end {
                let era = registry.era_of(jd).unwrap_or_else(|| panic!("no era at {jd}"));
                assert!(era.contains(jd));
                assert!(era.from_julian_day() >= prev, "{} at {jd}", era.key());
                prev = era.from_julian_day();
                jd += 10.0;
            }
        }
    }

    #[test]
    fn table_errors() {
        use TableErrorKind::*;
        assert_eq!((1, 1, NoPeriod), table_error("heisei 平成 1989-01-08"));
        assert_eq!((1, 2, MissingField), table_error("period"));
        assert_eq!((1, 4, ExtraField), table_error("period a genji b"));
        assert_eq!((1, 3, UnknownLineage("taira".into())), table_error("period a taira"));
        assert_eq!((3, 2, MissingField), table_error("# eras\nperiod a\nheisei\n"));
        assert_eq!((2, 3, MissingField), table_error("period a\nheisei 平成"));
        assert_eq!((2, 5, ExtraField), table_error("period a\nheisei 平成 1989-01-08 2019-04-30 x"));
        assert_eq!(
            (2, 3, InvalidDate("1989-13-01".into())),
            table_error("period a\nheisei 平成 1989-13-01")
        );
        assert_eq!(
            (2, 4, InvalidDate("1582-10-10".into())),
            table_error("period a\nx x 1582-10-01 1582-10-10")
        );
        assert_eq!((2, 3, InvalidDate("1989".into())), table_error("period a\nheisei 平成 1989"));
        assert!(matches!(table_error("period a\nheisei 平成 1989-01-xx"), (2, 3, InvalidInt(_))));
    }

    #[test]
    fn validation() {
        use ConfigurationError::*;
        let check = |text: &str| match EraRegistry::from_table(text, Lineage::default()) {
            Ok(_) => None,
            Err(Error::InvalidConfiguration(e)) => Some(e),
            Err(e) => panic!("{:?}", e),
        };
        for (std, text) in [
            (None, "period a\nx x 2000-01-01 2000-12-31\nperiod b\ny y 2001-01-01"),
            (Some(EmptyPeriod { period: "a".into() }), "period a\nperiod b\nx x 2000-01-01"),
            (
                Some(NonPositiveSpan { period: "a".into(), era: "x".into() }),
                "period a\nx x 2000-01-02 2000-01-01",
            ),
            (
                Some(NonPositiveSpan { period: "a".into(), era: "x".into() }),
                "period a\nx x 2000-01-01\ny y 1999-01-01 1999-12-31",
            ),
            (
                Some(Overlap { period: "a".into(), era: "y".into() }),
                "period a\nx x 2000-01-01 2000-12-31\ny y 2000-06-01 2000-12-31",
            ),
            (
                Some(DuplicateKey { period: "a".into(), era: "x".into() }),
                "period a\nx x 2000-01-01\nx y 2001-01-01 2001-12-31",
            ),
            (
                Some(OpenEnded { period: "a".into(), era: "x".into() }),
                "period a\nx x 2000-01-01\nperiod b\ny y 2001-01-01",
            ),
            // Unselected periods are checked too.
            (
                Some(EmptyPeriod { period: "h".into() }),
                "period h heishi\nperiod a\nx x 2000-01-01",
            ),
        ] {
            assert_eq!(std, check(text), "{text}");
        }

        let empty = Error::InvalidConfiguration(EmptyKey { period: "a".into() });
        assert_eq!(Err(empty), Period::new("a", vec![Era::new("", "", 0.0, None)]));
        let open = Period::new(
            "a",
            vec![Era::new("x", "x", 0.0, None), Era::new("y", "y", 1.0, Some(2.0))],
        );
        let expected = OpenEnded {
            period: "a".into(),
            era: "x".into(),
        };
        assert_eq!(Err(Error::InvalidConfiguration(expected)), open);
        let gap = vec![Era::new("x", "x", 0.0, Some(1.0)), Era::new("y", "y", 5.0, Some(6.0))];
        let period = Period::new("a", gap).unwrap();
        assert_eq!(None, period.era_of(3.0));
        assert!(period.contains(3.0));
    }
}
