//! Post-processing pipelines attached to observations.

use hifitime::Duration;
use log::debug;

use crate::{
    constants::{PIPELINE_DURATION_FACTOR, PIPELINE_START_MARGIN_SECONDS},
    job::JobConfiguration,
    observation::{Observation, Pipeline},
    sky::mentions_cyg,
    template::PipelineDescriptor,
};

/// Drop every source mentioning Cygnus from a demixing list.
fn without_cyg(sources: &Option<Vec<String>>) -> Option<Vec<String>> {
    sources
        .as_ref()
        .map(|list| list.iter().filter(|s| !mentions_cyg(s)).cloned().collect())
}

/// The parameters a pipeline of `observation` actually runs with: the demix
/// window filled in, and Cygnus A never demixed from an observation of it.
pub fn resolve_parameters(
    descriptor: &PipelineDescriptor,
    observation: &Observation,
) -> PipelineDescriptor {
    let mut parameters = descriptor.clone();
    let (freq, time) = descriptor.demix_steps();
    parameters.demix_window = Some((freq, time));

    if observation.beams.iter().any(|b| b.target.is_cyg()) {
        parameters.demix_always = without_cyg(&descriptor.demix_always);
        parameters.demix_if_needed = without_cyg(&descriptor.demix_if_needed);
    }
    parameters
}

/// How many processing tasks a pipeline over `num_subbands` subbands is
/// split into.
pub fn num_tasks(num_subbands: usize) -> usize {
    num_subbands / 3 + 1
}

/// Build the pipeline for `observation` and append it as its child.
pub fn attach_pipeline(
    observation: &mut Observation,
    descriptor: &PipelineDescriptor,
    job: &JobConfiguration,
) {
    let parameters = resolve_parameters(descriptor, observation);
    let start = observation.end() + Duration::from_seconds(PIPELINE_START_MARGIN_SECONDS);
    let duration =
        Duration::from_seconds(observation.duration.to_seconds() * PIPELINE_DURATION_FACTOR);
    let pipeline = Pipeline {
        name: format!("{} pipeline", observation.name),
        parameters,
        input_sap_ids: observation.beams.iter().map(|b| b.sap_id).collect(),
        start,
        duration,
        processing_cluster: job.processing_cluster.clone(),
        processing_partition: job.processing_partition.clone(),
        num_tasks: num_tasks(observation.primary_beam().num_subbands),
        status: job.status,
    };
    debug!(
        "Attached '{}' ({} tasks) starting {start}",
        pipeline.name, pipeline.num_tasks
    );
    observation.append_child(pipeline);
}

#[cfg(test)]
mod tests {
    use hifitime::Epoch;
    use vec1::vec1;

    use super::*;
    use crate::{
        backend::backend_for_products,
        observation::Beam,
        sky::{RADec, TargetSource},
        stations::station_group,
        tags::*,
    };

    fn observation_of(target: &str, subbands: &[u32]) -> Observation {
        let products = vec1![DataProduct::Xc];
        let (backend, _) = backend_for_products(products.iter(), AntennaFamily::Lba, 64, 1.0);
        Observation {
            name: "XC 64ch LBA_OUTER".to_string(),
            antenna_set: AntennaSet::LbaOuter,
            band: FrequencyBand::LbaLow,
            start: Epoch::from_gregorian_utc_hms(2024, 6, 1, 10, 0, 0),
            duration: Duration::from_seconds(300.0),
            stations: station_group("nl").unwrap(),
            clock: Clock::Mhz200,
            bit_mode: BitMode::Eight,
            products,
            beams: vec1![Beam::new(
                0,
                TargetSource::new(target, RADec::from_degrees(299.87, 40.73)),
                subbands,
                "CEP4",
                "/data/projects",
            )],
            backend,
            status: Status::Opened,
            children: vec![],
        }
    }

    fn demixing() -> PipelineDescriptor {
        PipelineDescriptor::ndppp(16, 2)
            .with_demix_always(&["CygA", "CasA"])
            .with_demix_if_needed(&["cyg", "TauA"])
    }

    #[test]
    fn timing_and_tasks() {
        let mut obs = observation_of("3C 196", &(12..=499).collect::<Vec<_>>());
        attach_pipeline(&mut obs, &demixing(), &JobConfiguration::default());
        assert_eq!(obs.children.len(), 1);
        let p = &obs.children[0];
        assert_eq!(p.start, Epoch::from_gregorian_utc_hms(2024, 6, 1, 10, 10, 0));
        assert_eq!(p.duration, Duration::from_seconds(600.0));
        // 488 subbands.
        assert_eq!(p.num_tasks, 163);
        assert_eq!(p.input_sap_ids, vec![0]);
        assert_eq!(p.parameters.demix_window, Some((64, 10)));
        assert_eq!(obs.pipeline_inputs(p).count(), 1);
    }

    #[test]
    fn cyg_is_not_demixed_from_itself() {
        let mut obs = observation_of("Cyg A", &[100, 101]);
        attach_pipeline(&mut obs, &demixing(), &JobConfiguration::default());
        let p = &obs.children[0].parameters;
        assert_eq!(p.demix_always, Some(vec!["CasA".to_string()]));
        assert_eq!(p.demix_if_needed, Some(vec!["TauA".to_string()]));
        assert_eq!(obs.children[0].num_tasks, 1);
    }

    #[test]
    fn other_targets_keep_cyg() {
        let obs = observation_of("3C 196", &[100]);
        let p = resolve_parameters(&demixing(), &obs);
        assert_eq!(
            p.demix_always,
            Some(vec!["CygA".to_string(), "CasA".to_string()])
        );
        assert_eq!(num_tasks(0), 1);
        assert_eq!(num_tasks(3), 2);
    }
}
