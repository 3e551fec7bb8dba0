//! What the user asked for: one planning run's configuration.

use std::{collections::BTreeSet, path::PathBuf};

use hifitime::{Duration, Epoch};
use thiserror::Error;

use crate::{
    sky::ElevationBounds,
    tags::{expand_products, Clock, DataProduct, Status},
};

/// When the first observation starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartTime {
    /// This long after "now".
    Wait(Duration),

    /// Exactly then.
    At(Epoch),
}

impl StartTime {
    pub fn resolve(self, now: Epoch) -> Epoch {
        match self {
            StartTime::Wait(wait) => now + wait,
            StartTime::At(epoch) => epoch,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobConfigError {
    #[error("No data products were requested")]
    NoModes,

    #[error("No clock frequencies are allowed")]
    NoClocks,

    #[error("Minimum elevation ({min}°) is above the maximum elevation ({max}°)")]
    InvertedElevation { min: f64, max: f64 },

    #[error("Observation duration must be positive, got {0} s")]
    BadDuration(f64),

    #[error("Gap between observations can't be negative, got {0} s")]
    BadGap(f64),

    #[error(transparent)]
    Timestamp(#[from] crate::time::TimestampError),
}

/// Everything that's fixed for a planning run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfiguration {
    /// Requested data products, as given. Composite tags are expanded by
    /// [`JobConfiguration::requested_products`].
    pub modes: BTreeSet<DataProduct>,

    /// Nominal observation length \[seconds\].
    pub duration_seconds: f64,

    /// Idle time between observations \[seconds\].
    pub gap_seconds: f64,

    pub station_group: String,
    pub include_stations: Vec<String>,
    pub exclude_stations: Vec<String>,

    pub min_elevation_deg: f64,
    pub max_elevation_deg: f64,

    pub clocks: BTreeSet<Clock>,
    pub start: StartTime,

    /// Observe this source in every observation instead of picking one.
    pub source: Option<String>,

    /// Read the template from this file rather than using the built-in one.
    pub custom_template: Option<PathBuf>,

    pub max_subbands: usize,

    pub storage_cluster: String,
    pub storage_partition: String,
    pub processing_cluster: String,
    pub processing_partition: String,

    /// Correlator integration time \[seconds\].
    pub integration_time_seconds: f64,

    pub status: Status,
}

impl Default for JobConfiguration {
    fn default() -> Self {
        JobConfiguration {
            modes: [DataProduct::Xc, DataProduct::Fe, DataProduct::Cs, DataProduct::Is]
                .into_iter()
                .collect(),
            duration_seconds: 300.0,
            gap_seconds: 60.0,
            station_group: "all".to_string(),
            include_stations: vec![],
            exclude_stations: vec![],
            min_elevation_deg: 30.0,
            max_elevation_deg: 90.0,
            clocks: [Clock::Mhz160, Clock::Mhz200].into_iter().collect(),
            start: StartTime::Wait(Duration::from_seconds(600.0)),
            source: None,
            custom_template: None,
            max_subbands: 488,
            storage_cluster: "CEP4".to_string(),
            storage_partition: "/data/projects".to_string(),
            processing_cluster: "CEP4".to_string(),
            processing_partition: "cpu".to_string(),
            integration_time_seconds: 2.0,
            status: Status::Opened,
        }
    }
}

impl JobConfiguration {
    /// The products template entries are matched against.
    pub fn requested_products(&self) -> BTreeSet<DataProduct> {
        expand_products(&self.modes)
    }

    pub fn elevation_bounds(&self) -> ElevationBounds {
        ElevationBounds {
            min_deg: self.min_elevation_deg,
            max_deg: self.max_elevation_deg,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_seconds(self.duration_seconds)
    }

    pub fn gap(&self) -> Duration {
        Duration::from_seconds(self.gap_seconds)
    }

    pub fn validate(&self) -> Result<(), JobConfigError> {
        if self.modes.is_empty() {
            return Err(JobConfigError::NoModes);
        }
        if self.clocks.is_empty() {
            return Err(JobConfigError::NoClocks);
        }
        if self.min_elevation_deg > self.max_elevation_deg {
            return Err(JobConfigError::InvertedElevation {
                min: self.min_elevation_deg,
                max: self.max_elevation_deg,
            });
        }
        if self.duration_seconds <= 0.0 {
            return Err(JobConfigError::BadDuration(self.duration_seconds));
        }
        if self.gap_seconds < 0.0 {
            return Err(JobConfigError::BadGap(self.gap_seconds));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let job = JobConfiguration::default();
        assert!(job.validate().is_ok());
        let products = job.requested_products();
        assert!(products.contains(&DataProduct::Bm));
        assert!(products.contains(&DataProduct::Tr));
        assert!(products.contains(&DataProduct::Cv));
        assert!(products.contains(&DataProduct::IsIquv));
    }

    #[test]
    fn bad_jobs() {
        let job = JobConfiguration {
            min_elevation_deg: 60.0,
            max_elevation_deg: 20.0,
            ..Default::default()
        };
        assert!(matches!(
            job.validate(),
            Err(JobConfigError::InvertedElevation { .. })
        ));

        let job = JobConfiguration {
            modes: BTreeSet::new(),
            ..Default::default()
        };
        assert_eq!(job.validate(), Err(JobConfigError::NoModes));

        let job = JobConfiguration {
            clocks: BTreeSet::new(),
            ..Default::default()
        };
        assert_eq!(job.validate(), Err(JobConfigError::NoClocks));

        let job = JobConfiguration {
            duration_seconds: 0.0,
            ..Default::default()
        };
        assert_eq!(job.validate(), Err(JobConfigError::BadDuration(0.0)));
    }

    #[test]
    fn start_times() {
        let now = Epoch::from_gregorian_utc_hms(2024, 1, 1, 12, 0, 0);
        let later = StartTime::Wait(Duration::from_seconds(90.0)).resolve(now);
        assert_eq!(later, Epoch::from_gregorian_utc_hms(2024, 1, 1, 12, 1, 30));
        let fixed = Epoch::from_gregorian_utc_hms(2025, 5, 5, 0, 0, 0);
        assert_eq!(StartTime::At(fixed).resolve(now), fixed);
    }
}
