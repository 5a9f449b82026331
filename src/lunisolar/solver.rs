//! Iterative search for solar terms and new moons.
//!
//! Both searches look backwards: they return the latest event at or before
//! the given instant. Each iteration steps by the angular error scaled with
//! the mean period, which converges in a handful of steps. The wraparound
//! guards below keep the search from jumping a whole cycle; removing any of
//! them moves months around in the historical tables.

use tracing::warn;

use super::chronology::Chronology;
use super::ephemeris::{Body, J2000, longitude, normalize};

/// Convergence tolerance on the angular error, in degrees.
pub const TOLERANCE: f64 = 1e-6;

/// Hard cap on iterations. Reaching it is not an error, the last estimate is
/// returned as is.
pub const MAX_ITERATIONS: u32 = 100_000;

/// Secular growth of the synodic month, in days per day.
pub const SYNODIC_MONTH_INCREMENT: f64 = 2.162e-9;

/// Forces another iteration after backing off from an overshoot.
const SENTINEL_DELTA: f64 = 10.0;

/// Ecliptic longitude of the winter solstice, where mean lattices restart.
const WINTER_SOLSTICE: f64 = 270.0;

/// Finds solar terms and new moons under a [`Chronology`].
///
/// # Example
///
/// ```
/// use koyomi::lunisolar::chronology::ChronologyParameters;
/// use koyomi::lunisolar::ephemeris::J2000;
/// use koyomi::lunisolar::solver::TermSolver;
///
/// let tenpo = ChronologyParameters::new(365.242234, 29.530588, 1.0, true, true).unwrap();
/// let solver = TermSolver::new(&tenpo);
///
/// let solstice = solver.latest_solar_term(J2000, 270.0);
/// assert!((solstice - 2451534.8136).abs() < 1e-3); // 1999-12-22
/// ```
#[derive(Copy, Clone)]
pub struct TermSolver<'c> {
    chronology: &'c dyn Chronology,
}

impl<'c> TermSolver<'c> {
    pub fn new(chronology: &'c dyn Chronology) -> Self {
        Self { chronology }
    }

    /// The chronology this solver works under.
    pub fn chronology(&self) -> &'c dyn Chronology {
        self.chronology
    }

    /// Length of the synodic month around `julian_day`.
    ///
    /// Grows slowly with time when true new moons are used, constant
    /// otherwise.
    pub fn synodic_month(&self, julian_day: f64) -> f64 {
        let base = self.chronology.synodic_month_length();
        if self.chronology.use_dynamic_moon() {
            base + (julian_day - J2000) * SYNODIC_MONTH_INCREMENT
        } else {
            base
        }
    }

    /// The solar term at `angle` degrees at or before `julian_day`, true or
    /// mean depending on the chronology.
    pub fn solar_term(&self, julian_day: f64, angle: f64) -> f64 {
        if self.chronology.use_dynamic_sun() {
            self.latest_solar_term(julian_day, angle)
        } else {
            self.latest_mean_solar_term(julian_day, angle)
        }
    }

    /// The new moon at or before `julian_day`, true or mean depending on the
    /// chronology.
    pub fn new_moon(&self, julian_day: f64) -> f64 {
        if self.chronology.use_dynamic_moon() {
            self.first_day_of_month(julian_day)
        } else {
            self.latest_mean_new_moon(julian_day)
        }
    }

    /// The latest instant at or before `julian_day` when the true Sun reaches
    /// ecliptic longitude `angle`.
    pub fn latest_solar_term(&self, julian_day: f64, angle: f64) -> f64 {
        let target = normalize(angle);
        let year = self.chronology.tropical_year_length();
        let mut t = julian_day;
        for iteration in 1..=MAX_ITERATIONS {
            let mut lon = longitude(Body::Sun, t);
            // Just short of the equinox: 359.x° is a small negative error.
            if target == 0.0 && lon > 359.0 {
                lon -= 360.0;
            }
            let mut delta = lon - target;
            if iteration == 1 {
                // Step backwards only, so the result is never after `julian_day`.
                delta = normalize(delta);
            } else if delta > 180.0 {
                delta -= 360.0;
            } else if delta < -180.0 {
                delta += 360.0;
            }
            t -= delta * year / 360.0;
            if delta.abs() <= TOLERANCE {
                return t;
            }
        }
        warn!(julian_day, angle, estimate = t, "solar term search did not converge");
        t
    }

    /// The latest true new moon at or before `julian_day`.
    pub fn first_day_of_month(&self, julian_day: f64) -> f64 {
        let mut t = julian_day;
        for iteration in 1..=MAX_ITERATIONS {
            let mut delta = longitude(Body::Moon, t) - longitude(Body::Sun, t);
            if iteration == 1 {
                delta = normalize(delta);
            }
            // Moon slightly behind the Sun: the conjunction is just ahead.
            if delta >= 280.0 {
                delta -= 360.0;
            }
            // Not near a conjunction, measure back to the previous one.
            if !(-40.0..=40.0).contains(&delta) {
                delta = normalize(delta);
            }
            t -= delta * self.synodic_month(t) / 360.0;
            if delta.abs() <= TOLERANCE && t > julian_day {
                // Converged on the following new moon; back off and go on.
                t -= self.synodic_month(t) / 2.0;
                delta = SENTINEL_DELTA;
            }
            if delta.abs() <= TOLERANCE {
                return t;
            }
        }
        warn!(julian_day, estimate = t, "new moon search did not converge");
        t
    }

    /// The latest mean solar term at `angle` degrees at or before
    /// `julian_day`.
    ///
    /// Mean terms split the tropical year into 24 even steps, counted from
    /// the true winter solstice that opens each solstice year.
    pub fn latest_mean_solar_term(&self, julian_day: f64, angle: f64) -> f64 {
        let step = self.chronology.tropical_year_length() / 24.0;
        let offset = (normalize(angle - WINTER_SOLSTICE) / 15.0).round() * step;
        let solstice = self.latest_solar_term(julian_day, WINTER_SOLSTICE);
        let term = solstice + offset;
        if term <= julian_day {
            return term;
        }
        self.latest_solar_term(solstice - 1.0, WINTER_SOLSTICE) + offset
    }

    /// The latest mean new moon at or before `julian_day`.
    ///
    /// Mean new moons step by the synodic month from the true new moon at or
    /// before the latest winter solstice.
    pub fn latest_mean_new_moon(&self, julian_day: f64) -> f64 {
        let month = self.chronology.synodic_month_length();
        let solstice = self.latest_solar_term(julian_day, WINTER_SOLSTICE);
        let anchor = self.first_day_of_month(solstice);
        anchor + ((julian_day - anchor) / month).floor() * month
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::japanese::JapaneseChronology;
    use crate::lunisolar::chronology::ChronologyParameters;
    use approx::assert_abs_diff_eq;

    const TENPO: ChronologyParameters =
        ChronologyParameters::new_unchecked(365.242234, 29.530588, 1.0, true, true);
    const MEAN: ChronologyParameters =
        ChronologyParameters::new_unchecked(365.244776, 29.530597, 1.0, false, false);

    fn angular_error(a: f64, b: f64) -> f64 {
        let d = normalize(a - b);
        d.min(360.0 - d)
    }

    #[test]
    fn j2000() {
        let solver = TermSolver::new(&TENPO);
        let solstice = solver.latest_solar_term(J2000, 270.0);
        assert_abs_diff_eq!(2451534.8136, solstice, epsilon = 1e-3);
        assert_abs_diff_eq!(270.0, longitude(Body::Sun, solstice), epsilon = 1e-5);
        let new_moon = solver.first_day_of_month(J2000);
        assert_abs_diff_eq!(2451520.4401, new_moon, epsilon = 1e-3);
    }

    #[test]
    fn solar_terms_are_latest() {
        let solver = TermSolver::new(&TENPO);
        let mut jd = 2_100_000.0;
        while jd < 2_500_000.0 {
            for k in 0..24 {
                let angle = (k * 15) as f64;
                let t = solver.latest_solar_term(jd, angle);
                assert!(t <= jd + 1e-6, "{angle}° from {jd}: {t}");
                assert!(jd - t < 366.0, "{angle}° from {jd}: {t}");
                assert!(angular_error(longitude(Body::Sun, t), angle) <= 1e-5);
            }
            jd += 9876.5;
        }
    }

    #[test]
    fn new_moons_are_latest() {
        let solver = TermSolver::new(&TENPO);
        let mut jd = 2_100_000.0;
        while jd < 2_500_000.0 {
            let t = solver.first_day_of_month(jd);
            assert!(t <= jd + 1e-6, "from {jd}: {t}");
            assert!(jd - t < 30.0, "from {jd}: {t}");
            let elongation = longitude(Body::Moon, t) - longitude(Body::Sun, t);
            assert!(angular_error(elongation, 0.0) <= 1e-5, "from {jd}: {t}");
            jd += 987.65;
        }
    }

    #[test]
    fn equinox_wraparound() {
        let solver = TermSolver::new(&TENPO);
        // Vernal equinox of 2000, on March 20.
        let equinox = solver.latest_solar_term(2451625.0, 0.0);
        assert_abs_diff_eq!(2451623.8061, equinox, epsilon = 1e-3);
        let year_before = solver.latest_solar_term(equinox - 0.01, 0.0);
        assert_abs_diff_eq!(365.24, equinox - year_before, epsilon = 0.1);
    }

    #[test]
    fn mean_lattices() {
        let solver = TermSolver::new(&MEAN);
        let year = MEAN.tropical_year_length();
        let month = MEAN.synodic_month_length();
        for jd in [1_500_000.0, 1_800_000.3, 1_900_000.7] {
            let solstice = solver.latest_solar_term(jd, 270.0);
            let term = solver.solar_term(jd, 270.0);
            assert_eq!(solstice, term);
            for k in 1..24 {
                let angle = normalize(270.0 + (k * 15) as f64);
                let term = solver.solar_term(solstice + year - 1.0, angle);
                assert_abs_diff_eq!(solstice + k as f64 * year / 24.0, term, epsilon = 1e-6);
            }
            let before = solver.solar_term(solstice + 1.0, 285.0);
            assert!(before < solstice && solstice - before < year);

            let mid_year = solstice + 100.0;
            let new_moon = solver.new_moon(mid_year);
            assert!(new_moon <= mid_year && mid_year - new_moon < month);
            assert_abs_diff_eq!(new_moon, solver.new_moon(new_moon + month - 1e-3), epsilon = 1e-6);
        }
        assert_eq!(month, solver.synodic_month(J2000 + 1e6));
    }

    #[test]
    fn mean_lattices_follow_the_true_sun_and_moon() {
        for chronology in JapaneseChronology::ALL {
            let solver = TermSolver::new(&chronology);
            let year = chronology.tropical_year_length();
            let month = chronology.synodic_month_length();
            let from = chronology.effective_from().unwrap_or(1_700_000.125);
            for jd in [from + 30.0, from + 200.0, from + 3000.0] {
                let solstice = solver.solar_term(jd, 270.0);
                assert!(solstice <= jd, "{chronology:?} at {jd}");
                let true_solstice = solver.latest_solar_term(jd, 270.0);
                assert_abs_diff_eq!(true_solstice, solstice, epsilon = 1e-6);
                for k in 0..24 {
                    let angle = (k * 15) as f64;
                    let mean = solver.solar_term(jd, angle);
                    let d = (mean - solver.latest_solar_term(jd, angle)).abs();
                    let d = d.min((d - year).abs());
                    assert!(d < 3.0, "{chronology:?} {angle}° at {jd}: {d}");
                }

                let new_moon = solver.new_moon(jd);
                assert!(new_moon <= jd && jd - new_moon < month, "{chronology:?} at {jd}");
                let d = (new_moon - solver.first_day_of_month(jd)).rem_euclid(month);
                let d = d.min(month - d);
                assert!(d < 1.0, "{chronology:?} new moon at {jd}: {d}");
            }
        }
    }

    #[test]
    fn synodic_month_drifts() {
        let solver = TermSolver::new(&TENPO);
        assert_eq!(29.530588, solver.synodic_month(J2000));
        assert_abs_diff_eq!(
            29.530588 - 2.162e-3,
            solver.synodic_month(J2000 - 1e6),
            epsilon = 1e-12
        );
    }

    #[test]
    fn pathological_input_terminates() {
        let solver = TermSolver::new(&TENPO);
        assert!(solver.latest_solar_term(f64::NAN, 90.0).is_nan());
        assert!(solver.first_day_of_month(f64::NAN).is_nan());
    }
}
