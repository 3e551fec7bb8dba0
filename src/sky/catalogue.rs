//! Calibrator and pulsar catalogues, and the heuristics that pick a source
//! for an observation.

use hifitime::Epoch;
use log::debug;

use super::{radec_from_sexagesimal, RADec, TargetSource};
use crate::{
    error::PlanError,
    tags::AntennaFamily,
    time::{elevation, lofar_sidereal_time},
};

/// Allowed elevation range of a target \[degrees\].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationBounds {
    pub min_deg: f64,
    pub max_deg: f64,
}

impl ElevationBounds {
    pub fn contains(&self, elevation_rad: f64) -> bool {
        let el = elevation_rad.to_degrees();
        el >= self.min_deg && el <= self.max_deg
    }
}

/// Where the planner gets its targets from.
pub trait SourceCatalogue {
    /// Look up a source by one of its names.
    fn find_by_name(&self, name: &str) -> Result<TargetSource, PlanError>;

    /// The best flux calibrator around `at`. LBA callers pass no bounds.
    fn best_calibrator(
        &self,
        at: Epoch,
        family: AntennaFamily,
        bounds: Option<ElevationBounds>,
    ) -> Result<TargetSource, PlanError>;

    /// The best pulsar around `at`.
    fn best_pulsar(
        &self,
        at: Epoch,
        family: AntennaFamily,
        bounds: ElevationBounds,
    ) -> Result<TargetSource, PlanError>;
}

/// A catalogue row: all names the source answers to (the first is its
/// display name) and its direction.
#[derive(Debug, Clone)]
pub struct CatalogueEntry {
    pub names: Vec<&'static str>,
    pub radec: RADec,
}

impl CatalogueEntry {
    fn new(names: &[&'static str], hms: (f64, f64, f64), sign: char, dms: (f64, f64, f64)) -> Self {
        CatalogueEntry {
            names: names.to_vec(),
            radec: radec_from_sexagesimal(hms, sign, dms),
        }
    }

    fn answers_to(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }

    fn to_target(&self) -> TargetSource {
        TargetSource::new(self.names[0], self.radec)
    }
}

/// The standard LOFAR calibrators and a handful of bright pulsars.
#[derive(Debug, Clone)]
pub struct LofarCatalogue {
    pub hba_calibrators: Vec<CatalogueEntry>,
    pub lba_calibrators: Vec<CatalogueEntry>,
    pub hba_pulsars: Vec<CatalogueEntry>,
    pub lba_pulsars: Vec<CatalogueEntry>,
}

impl Default for LofarCatalogue {
    fn default() -> Self {
        let e = CatalogueEntry::new;
        let b0329 = e(&["B0329+54", "J0332+5434"], (3.0, 32.0, 59.37), '+', (54.0, 34.0, 43.6));
        let b0809 = e(&["B0809+74", "J0814+7429"], (8.0, 14.0, 59.5), '+', (74.0, 29.0, 5.7));
        let b0950 = e(&["B0950+08", "J0953+0755"], (9.0, 53.0, 9.3), '+', (7.0, 55.0, 35.8));
        let b1133 = e(&["B1133+16", "J1136+1551"], (11.0, 36.0, 3.25), '+', (15.0, 51.0, 4.5));
        let b1508 = e(&["B1508+55", "J1509+5531"], (15.0, 9.0, 25.6), '+', (55.0, 31.0, 32.4));
        let b1919 = e(&["B1919+21", "J1921+2153"], (19.0, 21.0, 44.8), '+', (21.0, 53.0, 2.0));
        let b1933 = e(&["B1933+16", "J1935+1616"], (19.0, 35.0, 47.8), '+', (16.0, 16.0, 40.0));
        let b2217 = e(&["B2217+47", "J2219+4754"], (22.0, 19.0, 48.1), '+', (47.0, 54.0, 53.9));
        let c196 = e(&["3C 196", "3C196", "196"], (8.0, 13.0, 36.0), '+', (48.0, 13.0, 3.0));

        LofarCatalogue {
            hba_calibrators: vec![
                e(&["3C 48", "3C48", "48"], (1.0, 37.0, 41.2994), '+', (33.0, 9.0, 35.134)),
                e(&["3C 147", "3C147", "147"], (5.0, 42.0, 36.1379), '+', (49.0, 51.0, 7.234)),
                c196.clone(),
                e(&["3C 295", "3C295", "295"], (14.0, 11.0, 20.6), '+', (52.0, 12.0, 9.0)),
                e(&["3C 380", "3C380", "380"], (18.0, 29.0, 31.7248), '+', (48.0, 44.0, 46.9515)),
            ],
            lba_calibrators: vec![
                c196,
                e(&["Cyg A", "CygA", "cyg"], (19.0, 59.0, 28.3), '+', (40.0, 44.0, 2.0)),
            ],
            hba_pulsars: vec![
                b0329.clone(),
                b0809.clone(),
                b0950.clone(),
                b1133.clone(),
                b1508,
                b1919.clone(),
                b1933,
                b2217,
            ],
            lba_pulsars: vec![b0329, b0809, b0950, b1133, b1919],
        }
    }
}

/// Distance between two points on the unit circle at angles `a` and `b`.
fn chord(a: f64, b: f64) -> f64 {
    let (sa, ca) = a.sin_cos();
    let (sb, cb) = b.sin_cos();
    ((ca - cb).powi(2) + (sa - sb).powi(2)).sqrt()
}

/// Of the `candidates` above the horizon limits at `at`, the one closest to
/// the meridian.
fn closest_to_meridian<'a>(
    candidates: &'a [CatalogueEntry],
    at: Epoch,
    bounds: Option<ElevationBounds>,
) -> Option<&'a CatalogueEntry> {
    let lst = lofar_sidereal_time(at);
    candidates
        .iter()
        .filter(|c| match bounds {
            Some(b) => b.contains(elevation(c.radec, at)),
            None => true,
        })
        .min_by(|a, b| {
            chord(lst, a.radec.ra)
                .partial_cmp(&chord(lst, b.radec.ra))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn no_suitable_source(kind: &'static str, at: Epoch, bounds: Option<ElevationBounds>) -> PlanError {
    let (min_deg, max_deg) = bounds.map_or((-90.0, 90.0), |b| (b.min_deg, b.max_deg));
    PlanError::NoSuitableSource {
        kind,
        at: at.to_string(),
        min_deg,
        max_deg,
    }
}

impl LofarCatalogue {
    fn calibrators(&self, family: AntennaFamily) -> &[CatalogueEntry] {
        match family {
            AntennaFamily::Lba => &self.lba_calibrators,
            AntennaFamily::Hba => &self.hba_calibrators,
        }
    }

    fn pulsars(&self, family: AntennaFamily) -> &[CatalogueEntry] {
        match family {
            AntennaFamily::Lba => &self.lba_pulsars,
            AntennaFamily::Hba => &self.hba_pulsars,
        }
    }
}

impl SourceCatalogue for LofarCatalogue {
    fn find_by_name(&self, name: &str) -> Result<TargetSource, PlanError> {
        self.hba_calibrators
            .iter()
            .chain(&self.lba_calibrators)
            .chain(&self.hba_pulsars)
            .chain(&self.lba_pulsars)
            .find(|e| e.answers_to(name.trim()))
            .map(CatalogueEntry::to_target)
            .ok_or_else(|| PlanError::SourceSpecification {
                name: name.to_string(),
            })
    }

    fn best_calibrator(
        &self,
        at: Epoch,
        family: AntennaFamily,
        bounds: Option<ElevationBounds>,
    ) -> Result<TargetSource, PlanError> {
        let best = closest_to_meridian(self.calibrators(family), at, bounds)
            .ok_or_else(|| no_suitable_source("calibrator", at, bounds))?;
        debug!("Best {family} calibrator at {at}: {}", best.names[0]);
        Ok(best.to_target())
    }

    fn best_pulsar(
        &self,
        at: Epoch,
        family: AntennaFamily,
        bounds: ElevationBounds,
    ) -> Result<TargetSource, PlanError> {
        let best = closest_to_meridian(self.pulsars(family), at, Some(bounds))
            .ok_or_else(|| no_suitable_source("pulsar", at, Some(bounds)))?;
        debug!("Best {family} pulsar at {at}: {}", best.names[0]);
        Ok(best.to_target())
    }
}
