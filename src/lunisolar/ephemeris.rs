//! Ecliptic longitude of the Sun and the Moon from a short perturbation
//! series.
//!
//! The series is coarse (a few hundredths of a degree) but it is the one the
//! historical tables of this crate are tuned against, so its coefficients must
//! not be "improved".

/// Julian date of the J2000.0 epoch.
pub const J2000: f64 = 2451545.0;

/// Days in a Julian century.
pub const DAYS_PER_CENTURY: f64 = 36525.0;

/// A body whose longitude can be computed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Body {
    Sun,
    Moon,
}

/// `amplitude × (t_coefficient or T) × cos(rate × T + phase)`, in degrees.
#[derive(Debug, Copy, Clone)]
struct Perturbation {
    amplitude: f64,
    /// `None` multiplies by T, for the one secular term of the Sun.
    t_coefficient: Option<f64>,
    rate: f64,
    phase: f64,
}

const fn term(amplitude: f64, rate: f64, phase: f64) -> Perturbation {
    Perturbation {
        amplitude,
        t_coefficient: Some(1.0),
        rate,
        phase,
    }
}

const fn secular(amplitude: f64, rate: f64, phase: f64) -> Perturbation {
    Perturbation {
        amplitude,
        t_coefficient: None,
        rate,
        phase,
    }
}

#[rustfmt::skip]
static SUN: [Perturbation; 16] = [
    term(0.0004, 31557.0, 161.0), term(0.0004, 29930.0, 48.0),
    term(0.0005, 2281.0, 221.0), term(0.0005, 155.0, 118.0),
    term(0.0006, 33718.0, 316.0), term(0.0007, 9038.0, 64.0),
    term(0.0007, 3035.0, 110.0), term(0.0007, 65929.0, 45.0),
    term(0.0013, 22519.0, 352.0), term(0.0015, 45038.0, 254.0),
    term(0.0018, 445267.0, 208.0), term(0.0018, 19.0, 159.0),
    term(0.0020, 32964.0, 158.0), term(0.0200, 71998.1, 265.1),
    secular(-0.0048, 35999.05, 267.52), term(1.9147, 35999.05, 267.52),
];

#[rustfmt::skip]
static MOON: [Perturbation; 61] = [
    term(0.0003, 2322131.0, 191.0), term(0.0003, 4067.0, 70.0),
    term(0.0003, 549197.0, 220.0), term(0.0003, 1808933.0, 58.0),
    term(0.0003, 349472.0, 337.0), term(0.0003, 381404.0, 354.0),
    term(0.0003, 958465.0, 340.0), term(0.0004, 12006.0, 187.0),
    term(0.0004, 39871.0, 223.0), term(0.0005, 509131.0, 242.0),
    term(0.0005, 1745069.0, 24.0), term(0.0005, 1908795.0, 90.0),
    term(0.0006, 2258267.0, 156.0), term(0.0006, 111869.0, 38.0),
    term(0.0007, 27864.0, 127.0), term(0.0007, 485333.0, 186.0),
    term(0.0007, 405201.0, 50.0), term(0.0007, 790672.0, 114.0),
    term(0.0008, 1403732.0, 98.0), term(0.0009, 858602.0, 129.0),
    term(0.0011, 1920802.0, 186.0), term(0.0012, 1267871.0, 249.0),
    term(0.0016, 1856938.0, 152.0), term(0.0018, 401329.0, 274.0),
    term(0.0021, 341337.0, 16.0), term(0.0021, 71998.0, 85.0),
    term(0.0021, 990397.0, 357.0), term(0.0022, 818536.0, 151.0),
    term(0.0023, 922466.0, 163.0), term(0.0024, 99863.0, 122.0),
    term(0.0026, 1379739.0, 17.0), term(0.0027, 918399.0, 182.0),
    term(0.0028, 1934.0, 145.0), term(0.0037, 541062.0, 259.0),
    term(0.0038, 1781068.0, 21.0), term(0.0040, 133.0, 29.0),
    term(0.0040, 1844932.0, 56.0), term(0.0040, 1331734.0, 283.0),
    term(0.0050, 481266.0, 205.0), term(0.0052, 31932.0, 107.0),
    term(0.0068, 926533.0, 323.0), term(0.0079, 449334.0, 188.0),
    term(0.0085, 826671.0, 111.0), term(0.0100, 1431597.0, 315.0),
    term(0.0107, 1303870.0, 246.0), term(0.0110, 489205.0, 142.0),
    term(0.0125, 1443603.0, 52.0), term(0.0154, 75870.0, 41.0),
    term(0.0304, 513197.9, 222.5), term(0.0347, 445267.1, 27.9),
    term(0.0409, 441199.8, 47.4), term(0.0458, 854535.2, 148.2),
    term(0.0533, 1367733.1, 280.7), term(0.0571, 377336.3, 13.2),
    term(0.0588, 63863.5, 124.2), term(0.1144, 966404.0, 276.5),
    term(0.1851, 35999.0, 87.53), term(0.2136, 954397.7, 179.93),
    term(0.6583, 890534.2, 145.7), term(1.2740, 413335.3, 10.74),
    term(6.2888, 477198.86, 44.963),
];

impl Body {
    fn perturbations(self) -> &'static [Perturbation] {
        match self {
            Body::Sun => &SUN,
            Body::Moon => &MOON,
        }
    }
    /// `(rate, offset)` of the secular term, degrees per century and degrees.
    fn proportional(self) -> (f64, f64) {
        match self {
            Body::Sun => (36000.7695, 280.4659),
            Body::Moon => (481267.8809, 218.3162),
        }
    }
}

/// Normalizes an angle in degrees into `[0, 360)`.
///
/// # Example
///
/// ```
/// use koyomi::lunisolar::ephemeris::normalize;
///
/// assert_eq!(350.0, normalize(-10.0));
/// assert_eq!(0.0, normalize(720.0));
/// ```
pub fn normalize(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 { 0.0 } else { r }
}

/// Julian centuries elapsed since J2000.
pub fn julian_centuries(julian_day: f64) -> f64 {
    (julian_day - J2000) / DAYS_PER_CENTURY
}

/// Apparent ecliptic longitude of `body` in degrees, in `[0, 360)`.
///
/// # Example
///
/// ```
/// use koyomi::lunisolar::ephemeris::{longitude, Body, J2000};
///
/// let sun = longitude(Body::Sun, J2000);
/// assert!((sun - 280.38).abs() < 0.01);
/// ```
pub fn longitude(body: Body, julian_day: f64) -> f64 {
    let t = julian_centuries(julian_day);
    let periodic: f64 = body
        .perturbations()
        .iter()
        .map(|p| {
            p.amplitude
                * p.t_coefficient.unwrap_or(t)
                * normalize(p.rate * t + p.phase).to_radians().cos()
        })
        .sum();
    normalize(periodic + mean_longitude(body, julian_day))
}

/// The secular (mean motion) part of [`longitude`] alone.
///
/// The result is not normalized: the offset is added after normalizing the
/// rate term, so it lies in `[offset, offset + 360)`.
pub fn mean_longitude(body: Body, julian_day: f64) -> f64 {
    let (rate, offset) = body.proportional();
    normalize(rate * julian_centuries(julian_day)) + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn j2000() {
        assert_abs_diff_eq!(280.3774, longitude(Body::Sun, J2000), epsilon = 1e-4);
        assert_abs_diff_eq!(223.3139, longitude(Body::Moon, J2000), epsilon = 1e-4);
        assert_abs_diff_eq!(280.4659, mean_longitude(Body::Sun, J2000), epsilon = 1e-12);
    }

    #[test]
    fn series_lengths() {
        assert_eq!(16, Body::Sun.perturbations().len());
        assert_eq!(61, Body::Moon.perturbations().len());
        // The largest lunar term is the equation of the center.
        let largest = Body::Moon
            .perturbations()
            .iter()
            .map(|p| p.amplitude)
            .fold(0.0, f64::max);
        assert_eq!(6.2888, largest);
    }

    #[test]
    fn range() {
        let mut jd = 1_000_000.0;
        while jd < 3_000_000.0 {
            for body in [Body::Sun, Body::Moon] {
                let lon = longitude(body, jd);
                assert!((0.0..360.0).contains(&lon), "{body:?} at {jd}: {lon}");
            }
            jd += 1234.567;
        }
    }

    #[test]
    fn moon_outruns_sun() {
        // The elongation grows by roughly 12.2° a day.
        let jd = 2457957.625;
        let e0 = longitude(Body::Moon, jd) - longitude(Body::Sun, jd);
        let e1 = longitude(Body::Moon, jd + 1.0) - longitude(Body::Sun, jd + 1.0);
        let step = normalize(e1 - e0);
        assert!((10.0..15.0).contains(&step), "{step}");
    }
}
