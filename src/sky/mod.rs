//! Sky directions and named target sources.

pub mod catalogue;

pub use catalogue::*;

pub use marlu::RADec;

/// A direction from sexagesimal right ascension (h, m, s) and declination
/// (sign, d, m, s).
pub fn radec_from_sexagesimal(hms: (f64, f64, f64), sign: char, dms: (f64, f64, f64)) -> RADec {
    let ra_hours = hms.0 + hms.1 / 60.0 + hms.2 / 3600.0;
    let dec_abs = dms.0 + dms.1 / 60.0 + dms.2 / 3600.0;
    let dec = if sign == '-' { -dec_abs } else { dec_abs };
    RADec::from_degrees(ra_hours * 15.0, dec)
}

/// The direction at direction cosines `(l, m)` in a SIN projection about
/// `centre`, i.e. the inverse of [`RADec::to_lmn`]. `l` increases towards the
/// east and `m` towards the north celestial pole. `None` if `(l, m)` is off
/// the projected hemisphere.
pub fn radec_from_lm(l: f64, m: f64, centre: RADec) -> Option<RADec> {
    let n2 = 1.0 - l * l - m * m;
    if n2.is_nan() || n2 <= 0.0 {
        return None;
    }
    let n = n2.sqrt();
    let (s_dec0, c_dec0) = centre.dec.sin_cos();
    let ra = centre.ra + l.atan2(c_dec0 * n - m * s_dec0);
    let dec = (m * c_dec0 + s_dec0 * n).asin();
    Some(RADec {
        ra: ra.rem_euclid(std::f64::consts::TAU),
        dec,
    })
}

/// Degrees, for logs.
pub fn format_radec(radec: RADec) -> String {
    format!("({:.4}°, {:.4}°)", radec.ra.to_degrees(), radec.dec.to_degrees())
}

/// Something to point at.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSource {
    pub name: String,
    pub radec: RADec,
}

impl TargetSource {
    pub fn new<S: Into<String>>(name: S, radec: RADec) -> TargetSource {
        TargetSource {
            name: name.into(),
            radec,
        }
    }

    /// Is this (a field on) Cygnus A? Checked case-insensitively so that
    /// "Cyg A", "CygA" and "cygnus" all count.
    pub fn is_cyg(&self) -> bool {
        mentions_cyg(&self.name)
    }
}

pub(crate) fn mentions_cyg(name: &str) -> bool {
    name.to_ascii_lowercase().contains("cyg")
}
