//! Turn a schedule template and a job into a sequence of observations.

use std::collections::BTreeSet;

use hifitime::{Duration, Epoch};
use itertools::Itertools;
use log::{debug, info, warn};
use vec1::Vec1;

use crate::{
    backend::backend_for_products,
    beams::BeamGrid,
    constants::BEAM_GRID_SUBBAND_DIVISOR,
    error::PlanError,
    job::JobConfiguration,
    observation::{Beam, Observation},
    pipeline::attach_pipeline,
    read::read_sequence_file,
    sky::{SourceCatalogue, TargetSource},
    stations::{resolve_stations, station_group, StationSet},
    subbands::{parse_subbands, truncate_subbands},
    tags::{AntennaFamily, DataProduct},
    template::{default_template, ScheduleTemplateEntry},
    timeline::{mean_timestamp, TimelineBuilder},
};

/// The template the job asks for: its custom sequence file if it has one,
/// otherwise the built-in sequence.
pub fn load_template(job: &JobConfiguration) -> Result<Vec<ScheduleTemplateEntry>, PlanError> {
    match &job.custom_template {
        Some(path) => {
            info!("Reading schedule template from {}", path.display());
            read_sequence_file(path)
        }
        None => Ok(default_template()),
    }
}

/// The products `entry` would observe for this job, or `None` if it is
/// skipped because of its clock or because none of its products were
/// asked for.
pub fn entry_products(
    entry: &ScheduleTemplateEntry,
    job: &JobConfiguration,
    requested: &BTreeSet<DataProduct>,
) -> Option<Vec1<DataProduct>> {
    if !job.clocks.contains(&entry.clock) {
        debug!("Skipping '{entry}': clock {} MHz not allowed", entry.clock);
        return None;
    }
    let products: Vec<DataProduct> = entry.products.intersection(requested).copied().collect();
    match Vec1::try_from_vec(products) {
        Ok(p) => Some(p),
        Err(_) => {
            debug!("Skipping '{entry}': none of its products were requested");
            None
        }
    }
}

/// Narrow `stations` to what `products` can use. Coherent products need the
/// core; TAB rings need the superterp.
pub fn stations_for_products(
    stations: &StationSet,
    products: &[DataProduct],
) -> Result<StationSet, PlanError> {
    let mut restriction = None;
    if products.iter().any(|p| p.is_coherent()) {
        restriction = Some("core");
    }
    if products.contains(&DataProduct::Tr) {
        restriction = Some("superterp");
    }

    let group = match restriction {
        None => return Ok(stations.clone()),
        Some(group) => group,
    };
    let allowed = station_group(group).unwrap_or_default();
    let restricted: StationSet = stations.intersection(&allowed).cloned().collect();
    if restricted.is_empty() && !stations.is_empty() {
        return Err(PlanError::InvalidStationSet(format!(
            "none of the selected stations are in the {group}, which {} needs",
            products.iter().join("+")
        )));
    }
    Ok(restricted)
}

/// The name an observation gets, e.g. "XC+BM 64ch LBA_OUTER". Products are
/// listed in their canonical order (that of [`DataProduct`]), whatever order
/// they are given in.
pub fn observation_name(entry: &ScheduleTemplateEntry, products: &[DataProduct]) -> String {
    format!(
        "{} {}ch {}",
        products.iter().sorted().join("+"),
        entry.channels_per_subband,
        entry.antenna_set
    )
}

/// Per-run state shared by every template entry.
pub struct Planner<'a> {
    job: &'a JobConfiguration,
    catalogue: &'a dyn SourceCatalogue,
    stations: StationSet,

    /// Observed by every entry, if the job names a source.
    explicit_source: Option<TargetSource>,

    /// When sources are picked for.
    mean_timestamp: Epoch,
}

impl<'a> Planner<'a> {
    /// Resolve everything about the job that doesn't depend on an individual
    /// entry. `num_observations` is how many entries survive filtering.
    pub fn new(
        job: &'a JobConfiguration,
        catalogue: &'a dyn SourceCatalogue,
        start: Epoch,
        num_observations: usize,
    ) -> Result<Planner<'a>, PlanError> {
        let stations = resolve_stations(
            &job.station_group,
            &job.include_stations,
            &job.exclude_stations,
        )?;
        let explicit_source = job
            .source
            .as_deref()
            .map(|name| catalogue.find_by_name(name))
            .transpose()?;
        let mean_timestamp = mean_timestamp(start, num_observations, job.duration(), job.gap());
        debug!("Sources are picked for {mean_timestamp}");

        Ok(Planner {
            job,
            catalogue,
            stations,
            explicit_source,
            mean_timestamp,
        })
    }

    fn target_for(
        &self,
        family: AntennaFamily,
        products: &[DataProduct],
    ) -> Result<TargetSource, PlanError> {
        if let Some(source) = &self.explicit_source {
            return Ok(source.clone());
        }
        let bounds = self.job.elevation_bounds();
        if products.iter().any(|p| p.is_pulsar()) {
            self.catalogue
                .best_pulsar(self.mean_timestamp, family, bounds)
        } else {
            let bounds = match family {
                AntennaFamily::Lba => None,
                AntennaFamily::Hba => Some(bounds),
            };
            self.catalogue
                .best_calibrator(self.mean_timestamp, family, bounds)
        }
    }

    /// Build the observation for one surviving entry, starting at `start`,
    /// including its pipeline if the entry has one.
    pub fn expand_entry(
        &self,
        entry: &ScheduleTemplateEntry,
        products: Vec1<DataProduct>,
        start: Epoch,
    ) -> Result<Observation, PlanError> {
        let family = entry.antenna_set.family();
        let stations = stations_for_products(&self.stations, &products)?;
        let target = self.target_for(family, &products)?;

        let (backend, duration_override) = backend_for_products(
            products.iter(),
            family,
            entry.channels_per_subband,
            self.job.integration_time_seconds,
        );
        let duration = match duration_override {
            Some(seconds) => {
                warn!(
                    "{} with {} always runs for {seconds} s, not {} s",
                    DataProduct::Fe,
                    entry.antenna_set,
                    self.job.duration_seconds
                );
                Duration::from_seconds(seconds)
            }
            None => self.job.duration(),
        };

        let all_subbands = parse_subbands(&entry.subbands)?;
        let subbands = truncate_subbands(&all_subbands, self.job.max_subbands);
        let mut beams = Vec1::new(Beam::new(
            0,
            target.clone(),
            &subbands,
            &self.job.storage_cluster,
            &self.job.storage_partition,
        ));
        if products.contains(&DataProduct::Bm) {
            let num_aux_subbands =
                (self.job.max_subbands as f64 / BEAM_GRID_SUBBAND_DIVISOR).round() as usize;
            let aux_subbands = truncate_subbands(&all_subbands, num_aux_subbands);
            let grid = BeamGrid {
                centre: &target,
                family,
                clock: entry.clock,
                stations: &stations,
                max_subband: *subbands.last(),
                aux_subbands: &aux_subbands,
                storage_cluster: &self.job.storage_cluster,
                storage_partition: &self.job.storage_partition,
            };
            beams.extend(grid.auxiliary_beams()?);
        }

        let mut observation = Observation {
            name: observation_name(entry, &products),
            antenna_set: entry.antenna_set,
            band: entry.band,
            start,
            duration,
            stations,
            clock: entry.clock,
            bit_mode: entry.bit_mode,
            products,
            beams,
            backend,
            status: self.job.status,
            children: vec![],
        };
        if let Some(descriptor) = &entry.pipeline {
            attach_pipeline(&mut observation, descriptor, self.job);
        }
        Ok(observation)
    }
}

/// Plan every entry of `template` for `job`, with the first observation
/// starting relative to `now`.
///
/// Entries run in template order. Entries whose clock isn't allowed, or
/// which have none of the requested products, are dropped without taking
/// any time. Any error aborts the whole plan.
pub fn plan(
    job: &JobConfiguration,
    template: &[ScheduleTemplateEntry],
    catalogue: &dyn SourceCatalogue,
    now: Epoch,
) -> Result<Vec<Observation>, PlanError> {
    let requested = job.requested_products();
    let surviving: Vec<(&ScheduleTemplateEntry, Vec1<DataProduct>)> = template
        .iter()
        .filter_map(|entry| entry_products(entry, job, &requested).map(|p| (entry, p)))
        .collect();
    debug!(
        "{} of {} template entries survive filtering",
        surviving.len(),
        template.len()
    );

    let start = job.start.resolve(now);
    let planner = Planner::new(job, catalogue, start, surviving.len())?;
    let mut timeline = TimelineBuilder::new(start, job.gap());
    let mut observations = Vec::with_capacity(surviving.len());
    for (entry, products) in surviving {
        let obs_start = timeline.stamp(entry.clock);
        let observation = planner.expand_entry(entry, products, obs_start)?;
        info!(
            "{} '{}' on {}: {} beam(s), {} station(s), {} s",
            observation.start,
            observation.name,
            observation.primary_beam().target.name,
            observation.beams.len(),
            observation.stations.len(),
            observation.duration.to_seconds()
        );
        timeline.advance(observation.duration);
        observations.push(observation);
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        sky::{ElevationBounds, LofarCatalogue, RADec},
        tags::{AntennaSet, BitMode, Clock, FrequencyBand},
    };

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Lookup {
        Calibrator(AntennaFamily, Option<ElevationBounds>),
        Pulsar(AntennaFamily, ElevationBounds),
    }

    /// Hands out fixed targets and remembers what it was asked for.
    #[derive(Default)]
    struct RecordingCatalogue {
        lookups: RefCell<Vec<Lookup>>,
    }

    impl SourceCatalogue for RecordingCatalogue {
        fn find_by_name(&self, name: &str) -> Result<TargetSource, PlanError> {
            Err(PlanError::SourceSpecification {
                name: name.to_string(),
            })
        }

        fn best_calibrator(
            &self,
            _at: Epoch,
            family: AntennaFamily,
            bounds: Option<ElevationBounds>,
        ) -> Result<TargetSource, PlanError> {
            self.lookups
                .borrow_mut()
                .push(Lookup::Calibrator(family, bounds));
            Ok(TargetSource::new(
                "calibrator",
                RADec::from_degrees(123.4, 48.2),
            ))
        }

        fn best_pulsar(
            &self,
            _at: Epoch,
            family: AntennaFamily,
            bounds: ElevationBounds,
        ) -> Result<TargetSource, PlanError> {
            self.lookups.borrow_mut().push(Lookup::Pulsar(family, bounds));
            Ok(TargetSource::new("pulsar", RADec::from_degrees(53.2, 54.6)))
        }
    }

    fn hba(products: &[DataProduct]) -> ScheduleTemplateEntry {
        ScheduleTemplateEntry::new(
            AntennaSet::HbaDual,
            FrequencyBand::HbaLow,
            "77..320",
            16,
            Clock::Mhz200,
            BitMode::Sixteen,
            products,
        )
    }

    fn bounded_job() -> JobConfiguration {
        JobConfiguration {
            min_elevation_deg: 40.0,
            max_elevation_deg: 80.0,
            ..Default::default()
        }
    }

    fn lba_xc() -> ScheduleTemplateEntry {
        ScheduleTemplateEntry::new(
            AntennaSet::LbaOuter,
            FrequencyBand::LbaLow,
            "12..499",
            64,
            Clock::Mhz200,
            BitMode::Eight,
            &[DataProduct::Xc],
        )
    }

    #[test]
    fn filtering() {
        let job = JobConfiguration::default();
        let requested = job.requested_products();
        let products = entry_products(&lba_xc(), &job, &requested).unwrap();
        assert_eq!(products.as_slice(), &[DataProduct::Xc]);

        let job = JobConfiguration {
            clocks: [Clock::Mhz160].into_iter().collect(),
            ..Default::default()
        };
        assert!(entry_products(&lba_xc(), &job, &requested).is_none());

        let job = JobConfiguration {
            modes: [DataProduct::Fe].into_iter().collect(),
            ..Default::default()
        };
        assert!(entry_products(&lba_xc(), &job, &job.requested_products()).is_none());
    }

    #[test]
    fn station_restrictions() {
        let all = station_group("all").unwrap();
        let core = station_group("core").unwrap();
        let superterp = station_group("superterp").unwrap();

        assert_eq!(stations_for_products(&all, &[DataProduct::Xc]).unwrap(), all);
        assert_eq!(stations_for_products(&all, &[DataProduct::Cv]).unwrap(), core);
        assert_eq!(
            stations_for_products(&all, &[DataProduct::IsI, DataProduct::CsI]).unwrap(),
            core
        );
        assert_eq!(stations_for_products(&all, &[DataProduct::Tr]).unwrap(), superterp);
        // The input is untouched.
        assert_eq!(all.len(), station_group("all").unwrap().len());

        let remote = station_group("remote").unwrap();
        assert!(matches!(
            stations_for_products(&remote, &[DataProduct::Cs]),
            Err(PlanError::InvalidStationSet(_))
        ));
    }

    #[test]
    fn names() {
        let entry = lba_xc();
        assert_eq!(
            observation_name(&entry, &[DataProduct::Xc, DataProduct::Bm]),
            "XC+BM 64ch LBA_OUTER"
        );
        assert_eq!(
            observation_name(&entry, &[DataProduct::Bm, DataProduct::Xc]),
            "XC+BM 64ch LBA_OUTER"
        );
    }

    #[test]
    fn explicit_source_is_used_everywhere() {
        let job = JobConfiguration {
            source: Some("3C 196".to_string()),
            ..Default::default()
        };
        let template = default_template();
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);
        let observations = plan(&job, &template, &LofarCatalogue::default(), now).unwrap();
        assert!(!observations.is_empty());
        for obs in &observations {
            assert_eq!(obs.primary_beam().target.name, "3C 196");
        }
    }

    #[test]
    fn unknown_explicit_source() {
        let job = JobConfiguration {
            source: Some("Vulcan".to_string()),
            ..Default::default()
        };
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);
        assert!(matches!(
            plan(&job, &[lba_xc()], &LofarCatalogue::default(), now),
            Err(PlanError::SourceSpecification { .. })
        ));
    }

    #[test]
    fn fe_with_lba_runs_ten_minutes() {
        let job = JobConfiguration {
            source: Some("B0329+54".to_string()),
            ..Default::default()
        };
        let entry = ScheduleTemplateEntry::new(
            AntennaSet::LbaSparseEven,
            FrequencyBand::LbaLow,
            "12..499",
            64,
            Clock::Mhz200,
            BitMode::Eight,
            &[DataProduct::Fe],
        );
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);
        let observations = plan(&job, &[entry.clone(), entry], &LofarCatalogue::default(), now).unwrap();
        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].duration, Duration::from_seconds(600.0));
        // The realised duration moves the timeline.
        assert_eq!(
            observations[1].start,
            observations[0].start + Duration::from_seconds(660.0)
        );
    }

    #[test]
    fn pulsar_products_get_pulsars() {
        let job = bounded_job();
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);
        let cases: [&[DataProduct]; 5] = [
            &[DataProduct::Fe],
            &[DataProduct::Cs],
            &[DataProduct::Is],
            &[DataProduct::Tr],
            &[DataProduct::Xc, DataProduct::Fe],
        ];
        for products in cases {
            let catalogue = RecordingCatalogue::default();
            let observations = plan(&job, &[hba(products)], &catalogue, now).unwrap();
            assert_eq!(observations[0].primary_beam().target.name, "pulsar");
            assert_eq!(
                catalogue.lookups.into_inner(),
                vec![Lookup::Pulsar(AntennaFamily::Hba, job.elevation_bounds())]
            );
        }
    }

    #[test]
    fn correlated_products_get_calibrators() {
        let job = bounded_job();
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);

        let catalogue = RecordingCatalogue::default();
        let observations = plan(&job, &[hba(&[DataProduct::Xc])], &catalogue, now).unwrap();
        assert_eq!(observations[0].primary_beam().target.name, "calibrator");
        assert_eq!(
            catalogue.lookups.into_inner(),
            vec![Lookup::Calibrator(
                AntennaFamily::Hba,
                Some(job.elevation_bounds())
            )]
        );

        // LBA calibrators are picked regardless of the job's elevation limits.
        let catalogue = RecordingCatalogue::default();
        plan(&job, &[lba_xc()], &catalogue, now).unwrap();
        assert_eq!(
            catalogue.lookups.into_inner(),
            vec![Lookup::Calibrator(AntennaFamily::Lba, None)]
        );
    }

    #[test]
    fn low_subbands_make_an_impossible_grid() {
        let job = JobConfiguration {
            source: Some("Cyg A".to_string()),
            max_subbands: 10,
            ..Default::default()
        };
        let entry = ScheduleTemplateEntry::new(
            AntennaSet::LbaOuter,
            FrequencyBand::LbaLow,
            "12..499",
            64,
            Clock::Mhz200,
            BitMode::Eight,
            &[DataProduct::Xc, DataProduct::Bm],
        );
        let now = Epoch::from_gregorian_utc_hms(2024, 6, 1, 12, 0, 0);
        assert!(matches!(
            plan(&job, &[entry], &LofarCatalogue::default(), now),
            Err(PlanError::BeamGrid { max_subband: 21, .. })
        ));
    }
}
