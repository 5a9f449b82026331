//! Calendar systems (暦法) used in Japan, and when each took effect.

use crate::lunisolar::chronology::{Chronology, ChronologyParameters};

/// A historical Japanese calendar system.
///
/// The Taien (大衍暦) variants are the same calendar with the day-advance
/// limit changed in 766, 768, 793 and 837.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum JapaneseChronology {
    /// Mean motions before any imported calendar.
    Origin,
    Genka,
    Giho,
    Taien,
    Taien766,
    Taien768,
    Taien793,
    Taien837,
    Goki,
    Senmyo,
    Jokyo,
    Horyaku,
    Kansei,
    Tenpo,
}

use JapaneseChronology::*;

const TAIEN_YEAR: f64 = 365.244408;
const TAIEN_MONTH: f64 = 29.530592;

impl JapaneseChronology {
    /// All systems, oldest first.
    pub const ALL: [JapaneseChronology; 14] = [
        Origin, Genka, Giho, Taien, Taien766, Taien768, Taien793, Taien837, Goki, Senmyo, Jokyo,
        Horyaku, Kansei, Tenpo,
    ];

    /// The system in use at `julian_day`.
    ///
    /// # Example
    ///
    /// ```
    /// use koyomi::japanese::JapaneseChronology;
    ///
    /// assert_eq!(JapaneseChronology::Tenpo, JapaneseChronology::for_julian_day(2451545.0));
    /// assert_eq!(JapaneseChronology::Origin, JapaneseChronology::for_julian_day(0.0));
    /// ```
    pub fn for_julian_day(julian_day: f64) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|c| c.effective_from().is_none_or(|from| julian_day >= from))
            .unwrap_or(Origin)
    }

    /// First instant (JST midnight) the system was used on.
    pub fn effective_from(self) -> Option<f64> {
        Some(match self {
            Origin => return None,
            Genka => 1886925.125,
            Giho => 1975664.125,
            Taien => 2000145.125,
            Taien766 => 2000883.125,
            Taien768 => 2001592.125,
            Taien793 => 2010746.125,
            Taien837 => 2026811.125,
            Goki => 2034460.125,
            Senmyo => 2035936.125,
            Jokyo => 2336528.125,
            Horyaku => 2362101.125,
            Kansei => 2377812.125,
            Tenpo => 2394614.125,
        })
    }

    pub fn parameters(self) -> ChronologyParameters {
        let p = ChronologyParameters::new_unchecked;
        match self {
            Origin => p(365.244776, 29.530597, 1.0, false, false),
            Genka => p(365.2467, 29.530585, 1.0, true, false),
            Giho => p(365.244776, 29.530597, 1.0, true, false),
            Taien => p(TAIEN_YEAR, TAIEN_MONTH, 1.0, true, false),
            Taien766 => p(TAIEN_YEAR, TAIEN_MONTH, 2660.0 / 3040.0, true, false),
            Taien768 => p(TAIEN_YEAR, TAIEN_MONTH, 2534.0 / 3040.0, true, false),
            Taien793 => p(TAIEN_YEAR, TAIEN_MONTH, 2787.0 / 3040.0, true, false),
            Taien837 => p(TAIEN_YEAR, TAIEN_MONTH, 2660.0 / 3040.0, true, false),
            Goki => p(365.244776, 29.530597, 1.0, true, false),
            Senmyo => p(365.244643, 29.530595, 6300.0 / 8400.0, true, false),
            Jokyo => p(365.241696, 29.530590, 1.0, true, false),
            Horyaku => p(365.241542, 29.530590, 1.0, true, false),
            Kansei => p(365.242347, 29.530584, 1.0, true, false),
            Tenpo => p(365.242234, 29.530588, 1.0, true, true),
        }
    }

    /// Romanized name.
    pub fn name(self) -> &'static str {
        match self {
            Origin => "Origin",
            Genka => "Genka",
            Giho => "Giho",
            Taien | Taien766 | Taien768 | Taien793 | Taien837 => "Taien",
            Goki => "Goki",
            Senmyo => "Senmyo",
            Jokyo => "Jokyo",
            Horyaku => "Horyaku",
            Kansei => "Kansei",
            Tenpo => "Tenpo",
        }
    }

    /// Name in Japanese.
    pub fn japanese_name(self) -> &'static str {
        match self {
            Origin => "暦法以前",
            Genka => "元嘉暦",
            Giho => "儀鳳暦",
            Taien | Taien766 | Taien768 | Taien793 | Taien837 => "大衍暦",
            Goki => "五紀暦",
            Senmyo => "宣明暦",
            Jokyo => "貞享暦",
            Horyaku => "宝暦暦",
            Kansei => "寛政暦",
            Tenpo => "天保暦",
        }
    }
}

impl Chronology for JapaneseChronology {
    fn tropical_year_length(&self) -> f64 {
        self.parameters().tropical_year_length()
    }
    fn synodic_month_length(&self) -> f64 {
        self.parameters().synodic_month_length()
    }
    fn day_advance_threshold(&self) -> f64 {
        self.parameters().day_advance_threshold()
    }
    fn use_dynamic_moon(&self) -> bool {
        self.parameters().use_dynamic_moon()
    }
    fn use_dynamic_sun(&self) -> bool {
        self.parameters().use_dynamic_sun()
    }
}
