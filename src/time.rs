//! Time handling: LOFAR sidereal time, timestamp tuples and the formats MoM
//! expects.

use std::f64::consts::TAU;

use hifitime::{Duration, Epoch};
use marlu::{precession::precess_time, RADec};
use thiserror::Error;

use crate::constants::LOFAR_POSITION;

/// A UTC timestamp as (year, month, day, hour, minute, second).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampTuple {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("'{text}' isn't a timestamp of the form YYYY-MM-DDThh:mm:ss: {reason}")]
    BadFormat { text: String, reason: String },

    #[error("'{0}' isn't a valid UTC date")]
    BadDate(String),
}

impl TimestampTuple {
    /// The tuple of an epoch, rounded to the nearest second.
    pub fn from_epoch(epoch: Epoch) -> TimestampTuple {
        let (year, month, day, hour, minute, second, _) = epoch
            .round(Duration::from_seconds(1.0))
            .to_gregorian_utc();
        TimestampTuple {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    pub fn to_epoch(self) -> Result<Epoch, TimestampError> {
        Epoch::maybe_from_gregorian_utc(
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            0,
        )
        .map_err(|_| TimestampError::BadDate(self.mom_timestamp()))
    }

    /// Parse a UTC `YYYY-MM-DDThh:mm:ss`, to the nearest second.
    pub fn parse(s: &str) -> Result<TimestampTuple, TimestampError> {
        let epoch =
            Epoch::from_gregorian_str(s.trim()).map_err(|e| TimestampError::BadFormat {
                text: s.to_string(),
                reason: e.to_string(),
            })?;
        Ok(TimestampTuple::from_epoch(epoch))
    }

    pub fn mom_timestamp(&self) -> String {
        format!(
            "{:4}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }

    pub fn date_string(&self) -> String {
        format!("{:4}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// ISO-8601 duration in whole seconds, as MoM writes them (`PT300S`).
pub fn mom_duration(duration: Duration) -> String {
    format!("PT{:02}S", duration.to_seconds().round() as i64)
}

/// Local mean sidereal time at the array centre \[radians\], taking UT1 to
/// be UTC.
pub fn lofar_sidereal_time(epoch: Epoch) -> f64 {
    let zenith = RADec {
        ra: 0.0,
        dec: LOFAR_POSITION.latitude_rad,
    };
    let p = precess_time(
        LOFAR_POSITION.longitude_rad,
        LOFAR_POSITION.latitude_rad,
        zenith,
        epoch,
        Duration::from_seconds(0.0),
    );
    p.lmst.rem_euclid(TAU)
}

/// Elevation of a direction above the LOFAR horizon \[radians\].
pub fn elevation(radec: RADec, epoch: Epoch) -> f64 {
    radec
        .to_hadec(lofar_sidereal_time(epoch))
        .to_azel(LOFAR_POSITION.latitude_rad)
        .el
}
