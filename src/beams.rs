//! Auxiliary pointings for multi-beam (BM) observations.

use log::trace;
use marlu::constants::VEL_C;

use crate::{
    constants::{
        BEAM_GRID_HALF_WIDTH, BEAM_GRID_OVERSAMPLING, HBA_CORE_APERTURE_M,
        HBA_INTERNATIONAL_APERTURE_M, HBA_REMOTE_APERTURE_M, LBA_INTERNATIONAL_APERTURE_M,
        LBA_NL_APERTURE_M,
    },
    error::PlanError,
    observation::Beam,
    sky::{format_radec, radec_from_lm, TargetSource},
    stations::StationSet,
    tags::{AntennaFamily, Clock},
};

/// The aperture that sets the station beam width \[metres\]. The widest
/// baseline class present wins.
pub fn station_aperture_m(family: AntennaFamily, stations: &StationSet) -> f64 {
    let any_international = stations.iter().any(|s| s.is_international());
    match family {
        AntennaFamily::Hba => {
            if any_international {
                HBA_INTERNATIONAL_APERTURE_M
            } else if stations.iter().any(|s| s.is_remote()) {
                HBA_REMOTE_APERTURE_M
            } else {
                HBA_CORE_APERTURE_M
            }
        }
        AntennaFamily::Lba => {
            if any_international {
                LBA_INTERNATIONAL_APERTURE_M
            } else {
                LBA_NL_APERTURE_M
            }
        }
    }
}

/// Sky frequency of the top edge of `subband` \[Hz\].
pub fn subband_frequency_hz(clock: Clock, subband: u32) -> f64 {
    clock.mhz() as f64 * 1e6 * (subband as f64 / 1024.0)
}

/// Nyquist sampling interval of the station beam \[radians\].
pub fn nyquist_spacing_rad(freq_hz: f64, aperture_m: f64) -> f64 {
    0.5 * VEL_C / (freq_hz * aperture_m)
}

/// Everything needed to lay out a multi-beam grid.
#[derive(Debug, Clone)]
pub struct BeamGrid<'a> {
    pub centre: &'a TargetSource,
    pub family: AntennaFamily,
    pub clock: Clock,
    pub stations: &'a StationSet,

    /// The highest subband the primary beam observes.
    pub max_subband: u32,

    /// Subbands each auxiliary beam observes.
    pub aux_subbands: &'a [u32],

    pub storage_cluster: &'a str,
    pub storage_partition: &'a str,
}

impl BeamGrid<'_> {
    /// Grid spacing \[radians\].
    pub fn spacing_rad(&self) -> f64 {
        // Subband 0 has no frequency; treat it as subband 1 so the spacing
        // stays finite.
        let freq_hz = subband_frequency_hz(self.clock, self.max_subband.max(1));
        let aperture_m = station_aperture_m(self.family, self.stations);
        nyquist_spacing_rad(freq_hz, aperture_m) / BEAM_GRID_OVERSAMPLING
    }

    /// The 24 beams of a 5x5 grid around the centre, leaving out the centre
    /// itself. Rows run along `m` and are filled along `l`; beams are named
    /// `Aux-001` onwards and get sap ids from 1 in the same order.
    ///
    /// Fails if the grid's corners fall off the projected hemisphere, which
    /// happens when the top subband is so low that the beam is very wide.
    pub fn auxiliary_beams(&self) -> Result<Vec<Beam>, PlanError> {
        let spacing = self.spacing_rad();
        trace!(
            "Multi-beam grid around {} at {}: spacing {:.5} rad",
            self.centre.name,
            format_radec(self.centre.radec),
            spacing
        );

        let n = BEAM_GRID_HALF_WIDTH;
        let corner = n as f64 * std::f64::consts::SQRT_2 * spacing;
        if corner >= 1.0 {
            return Err(PlanError::BeamGrid {
                target: self.centre.name.clone(),
                max_subband: self.max_subband,
                spacing_deg: spacing.to_degrees(),
            });
        }

        let mut beams = Vec::with_capacity(((2 * n + 1) * (2 * n + 1) - 1) as usize);
        for m in -n..=n {
            for l in -n..=n {
                if l == 0 && m == 0 {
                    continue;
                }
                let sap_id = beams.len() + 1;
                let name = format!("Aux-{sap_id:03}");
                let radec = radec_from_lm(l as f64 * spacing, m as f64 * spacing, self.centre.radec)
                    .ok_or_else(|| PlanError::BeamGrid {
                        target: self.centre.name.clone(),
                        max_subband: self.max_subband,
                        spacing_deg: spacing.to_degrees(),
                    })?;
                trace!("{name} (l={l}, m={m}): {}", format_radec(radec));
                beams.push(Beam::new(
                    sap_id,
                    TargetSource::new(name, radec),
                    self.aux_subbands,
                    self.storage_cluster,
                    self.storage_partition,
                ));
            }
        }
        Ok(beams)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        sky::RADec,
        stations::{station_group, StationId},
    };

    fn grid(
        centre: &TargetSource,
        family: AntennaFamily,
        stations: &StationSet,
        max_subband: u32,
    ) -> Result<(Vec<Beam>, f64), PlanError> {
        let aux: Vec<u32> = (100..110).collect();
        let grid = BeamGrid {
            centre,
            family,
            clock: Clock::Mhz200,
            stations,
            max_subband,
            aux_subbands: &aux,
            storage_cluster: "CEP4",
            storage_partition: "/data/projects",
        };
        Ok((grid.auxiliary_beams()?, grid.spacing_rad()))
    }

    fn grid_beams(family: AntennaFamily, group: &str) -> (Vec<Beam>, f64) {
        let centre = TargetSource::new("3C 196", RADec::from_degrees(123.4, 48.2));
        let stations = station_group(group).unwrap();
        grid(&centre, family, &stations, 320).unwrap()
    }

    #[test]
    fn twenty_four_beams_numbered_from_one() {
        let (beams, _) = grid_beams(AntennaFamily::Hba, "core");
        assert_eq!(beams.len(), 24);
        for (i, beam) in beams.iter().enumerate() {
            assert_eq!(beam.sap_id, i + 1);
            assert_eq!(beam.target.name, format!("Aux-{:03}", i + 1));
            assert_eq!(beam.subbands, "100..109");
            assert_eq!(beam.num_subbands, 10);
        }
        assert_eq!(beams[0].target.name, "Aux-001");
        assert_eq!(beams[23].target.name, "Aux-024");
    }

    #[test]
    fn grid_is_row_major_in_m() {
        let centre = RADec::from_degrees(123.4, 48.2);
        let (beams, spacing) = grid_beams(AntennaFamily::Hba, "core");
        // First row: m = -2, l = -2..=2.
        let lmn = beams[0].target.radec.to_lmn(centre);
        assert_abs_diff_eq!(lmn.l, -2.0 * spacing, epsilon = 1e-9);
        assert_abs_diff_eq!(lmn.m, -2.0 * spacing, epsilon = 1e-9);
        let lmn = beams[1].target.radec.to_lmn(centre);
        assert_abs_diff_eq!(lmn.l, -spacing, epsilon = 1e-9);
        assert_abs_diff_eq!(lmn.m, -2.0 * spacing, epsilon = 1e-9);
        // Middle row skips the centre: index 11 is (l=-1, m=0), 12 is (1, 0).
        let lmn = beams[11].target.radec.to_lmn(centre);
        assert_abs_diff_eq!(lmn.l, -spacing, epsilon = 1e-9);
        assert_abs_diff_eq!(lmn.m, 0.0, epsilon = 1e-9);
        let lmn = beams[12].target.radec.to_lmn(centre);
        assert_abs_diff_eq!(lmn.l, spacing, epsilon = 1e-9);
    }

    #[test]
    fn spacing_follows_nyquist() {
        let (_, spacing) = grid_beams(AntennaFamily::Hba, "core");
        let freq = 200e6 * 320.0 / 1024.0;
        let expected = 0.5 * VEL_C / (freq * HBA_CORE_APERTURE_M) / 1.1;
        assert_abs_diff_eq!(spacing, expected, epsilon = 1e-12);
    }

    #[test]
    fn apertures() {
        let hba = AntennaFamily::Hba;
        let lba = AntennaFamily::Lba;
        let core = station_group("core").unwrap();
        let nl = station_group("nl").unwrap();
        let all = station_group("all").unwrap();
        assert_abs_diff_eq!(station_aperture_m(hba, &core), 30.75);
        assert_abs_diff_eq!(station_aperture_m(hba, &nl), 41.05);
        assert_abs_diff_eq!(station_aperture_m(hba, &all), 56.5);
        assert_abs_diff_eq!(station_aperture_m(lba, &nl), 81.34);
        assert_abs_diff_eq!(station_aperture_m(lba, &all), 65.0);
        // An unrecognised name doesn't count as international.
        let mut odd = core.clone();
        odd.insert(StationId::new("CS02"));
        assert_abs_diff_eq!(station_aperture_m(hba, &odd), 30.75);
        // Wider apertures give tighter grids.
        let (_, core_spacing) = grid_beams(hba, "core");
        let (_, all_spacing) = grid_beams(hba, "all");
        assert!(all_spacing < core_spacing);
    }

    #[test]
    fn wide_beams_leave_the_sky() {
        let centre = TargetSource::new("Cyg A", RADec::from_degrees(299.87, 40.73));
        let nl = station_group("nl").unwrap();
        // Subband 21 at 200 MHz is ~4 MHz; the LBA beam is tens of degrees
        // wide and the grid corners are past the horizon of the projection.
        assert!(matches!(
            grid(&centre, AntennaFamily::Lba, &nl, 21),
            Err(PlanError::BeamGrid { max_subband: 21, .. })
        ));
        let (beams, _) = grid(&centre, AntennaFamily::Lba, &nl, 300).unwrap();
        assert!(beams
            .iter()
            .all(|b| b.target.radec.ra.is_finite() && b.target.radec.dec.is_finite()));
    }
}
