//! Useful constants.

use marlu::LatLngHeight;

lazy_static::lazy_static! {
    /// CS002 LBA, the array reference position.
    pub static ref LOFAR_POSITION: LatLngHeight = LatLngHeight {
        longitude_rad: 6.869_837_540_f64.to_radians(),
        latitude_rad: 52.915_122_495_f64.to_radians(),
        height_metres: 49.344,
    };
}

/// Highest subband index a LOFAR station can deliver.
pub const MAX_SUBBAND: u32 = 511;

/// Time lost retuning the clock between observations \[seconds\].
pub const CLOCK_SWITCH_PENALTY_SECONDS: f64 = 120.0;

/// FE observations with the LBAs always run for this long \[seconds\].
pub const FE_LBA_DURATION_SECONDS: f64 = 600.0;

/// A pipeline starts this long after its observation ends \[seconds\].
pub const PIPELINE_START_MARGIN_SECONDS: f64 = 300.0;

/// Pipelines are given this many times their observation's duration.
pub const PIPELINE_DURATION_FACTOR: f64 = 2.0;

/// Default demixing window (frequency channels, time slots).
pub const DEFAULT_DEMIX_FREQ_STEP: u32 = 64;
pub const DEFAULT_DEMIX_TIME_STEP: u32 = 10;

/// Auxiliary beams sit this much closer together than Nyquist.
pub const BEAM_GRID_OVERSAMPLING: f64 = 1.1;

/// Half-width of the multi-beam grid; the grid is (2n+1)x(2n+1).
pub const BEAM_GRID_HALF_WIDTH: i32 = 2;

/// Auxiliary beams get roughly this fraction of the primary beam's subbands.
pub const BEAM_GRID_SUBBAND_DIVISOR: f64 = 25.0;

/// Tied-array ring settings for TR observations.
pub const TAB_RINGS: u32 = 5;
pub const TAB_RING_SIZE: f64 = 0.006;

/// Stokes downsampling factors.
pub const TR_DOWNSAMPLING: u32 = 16;
pub const PULSAR_DOWNSAMPLING: u32 = 128;

/// Effective station apertures used to work out beam spacing \[metres\].
pub const HBA_CORE_APERTURE_M: f64 = 30.75;
pub const HBA_REMOTE_APERTURE_M: f64 = 41.05;
pub const HBA_INTERNATIONAL_APERTURE_M: f64 = 56.5;
pub const LBA_NL_APERTURE_M: f64 = 81.34;
pub const LBA_INTERNATIONAL_APERTURE_M: f64 = 65.0;
