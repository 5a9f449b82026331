//! The constants a lunisolar calendar system is computed with.

use crate::error::{ConfigurationError, Result};

/// Constants of a historical calendar system.
///
/// Calendars in use at different times approximated the motions of the Sun
/// and the Moon differently. Implementors describe one such approximation.
pub trait Chronology {
    /// Length of the tropical year, in days.
    fn tropical_year_length(&self) -> f64;
    /// Mean length of the synodic month, in days.
    fn synodic_month_length(&self) -> f64;
    /// Fraction of the civil day after which a new moon starts its month on
    /// the next day (進朔). `1.0` disables the rule.
    fn day_advance_threshold(&self) -> f64;
    /// Whether new moons are true conjunctions rather than mean ones.
    fn use_dynamic_moon(&self) -> bool;
    /// Whether solar terms are true longitudes rather than equal divisions of
    /// the year.
    fn use_dynamic_sun(&self) -> bool;
}

/// A plain set of [`Chronology`] constants.
///
/// # Example
///
/// ```
/// use koyomi::lunisolar::chronology::{Chronology, ChronologyParameters};
///
/// let params = ChronologyParameters::new(365.242234, 29.530588, 1.0, true, true).unwrap();
/// assert_eq!(29.530588, params.synodic_month_length());
/// assert!(ChronologyParameters::new(365.25, 29.53, 0.0, true, true).is_err());
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChronologyParameters {
    tropical_year_length: f64,
    synodic_month_length: f64,
    day_advance_threshold: f64,
    use_dynamic_moon: bool,
    use_dynamic_sun: bool,
}

impl ChronologyParameters {
    /// Validates and creates a set of constants.
    ///
    /// Both lengths must be positive and the threshold must lie in `(0, 1]`.
    pub fn new(
        tropical_year_length: f64,
        synodic_month_length: f64,
        day_advance_threshold: f64,
        use_dynamic_moon: bool,
        use_dynamic_sun: bool,
    ) -> Result<Self> {
        if !(tropical_year_length.is_finite() && tropical_year_length > 0.0) {
            return Err(ConfigurationError::Chronology("tropical_year_length").into());
        }
        if !(synodic_month_length.is_finite() && synodic_month_length > 0.0) {
            return Err(ConfigurationError::Chronology("synodic_month_length").into());
        }
        if !(day_advance_threshold > 0.0 && day_advance_threshold <= 1.0) {
            return Err(ConfigurationError::Chronology("day_advance_threshold").into());
        }
        Ok(Self::new_unchecked(
            tropical_year_length,
            synodic_month_length,
            day_advance_threshold,
            use_dynamic_moon,
            use_dynamic_sun,
        ))
    }

    /// For tables known to be valid at compile time.
    pub(crate) const fn new_unchecked(
        tropical_year_length: f64,
        synodic_month_length: f64,
        day_advance_threshold: f64,
        use_dynamic_moon: bool,
        use_dynamic_sun: bool,
    ) -> Self {
        Self {
            tropical_year_length,
            synodic_month_length,
            day_advance_threshold,
            use_dynamic_moon,
            use_dynamic_sun,
        }
    }
}

impl Chronology for ChronologyParameters {
    fn tropical_year_length(&self) -> f64 {
        self.tropical_year_length
    }
    fn synodic_month_length(&self) -> f64 {
        self.synodic_month_length
    }
    fn day_advance_threshold(&self) -> f64 {
        self.day_advance_threshold
    }
    fn use_dynamic_moon(&self) -> bool {
        self.use_dynamic_moon
    }
    fn use_dynamic_sun(&self) -> bool {
        self.use_dynamic_sun
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn validation() {
        for (name, params) in [
            ("tropical_year_length", (0.0, 29.5, 1.0)),
            ("tropical_year_length", (f64::NAN, 29.5, 1.0)),
            ("synodic_month_length", (365.25, -29.5, 1.0)),
            ("day_advance_threshold", (365.25, 29.5, 1.5)),
            ("day_advance_threshold", (365.25, 29.5, f64::NAN)),
        ] {
            assert_eq!(
                Err(Error::InvalidConfiguration(ConfigurationError::Chronology(name))),
                ChronologyParameters::new(params.0, params.1, params.2, true, false)
            );
        }
        let ok = ChronologyParameters::new(365.244643, 29.530595, 0.75, true, false).unwrap();
        assert_eq!(0.75, ok.day_advance_threshold());
        assert!(!ok.use_dynamic_sun());
    }
}
