//! The planned entities: observations, their beams and their pipelines.

use hifitime::{Duration, Epoch};
use vec1::Vec1;

use crate::{
    backend::BackendProcessing,
    sky::TargetSource,
    stations::StationSet,
    subbands::format_subbands,
    tags::{AntennaSet, BitMode, Clock, DataProduct, FrequencyBand, Status},
    template::PipelineDescriptor,
    time::TimestampTuple,
};

/// A station beam ("sub-array pointing").
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    /// Unique within an observation; 0 is the primary target.
    pub sap_id: usize,

    pub target: TargetSource,

    /// Subband specification in range syntax.
    pub subbands: String,

    /// How many subbands `subbands` covers.
    pub num_subbands: usize,

    pub storage_cluster: String,
    pub storage_partition: String,
}

impl Beam {
    pub fn new(
        sap_id: usize,
        target: TargetSource,
        subbands: &[u32],
        storage_cluster: &str,
        storage_partition: &str,
    ) -> Beam {
        Beam {
            sap_id,
            target,
            subbands: format_subbands(subbands),
            num_subbands: subbands.len(),
            storage_cluster: storage_cluster.to_string(),
            storage_partition: storage_partition.to_string(),
        }
    }
}

/// A post-processing pipeline hanging off an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub name: String,

    /// Averaging and demixing settings, with source lists already stripped
    /// of the observation's own targets.
    pub parameters: PipelineDescriptor,

    /// SAP ids of the parent observation's beams this pipeline reads.
    pub input_sap_ids: Vec<usize>,

    pub start: Epoch,
    pub duration: Duration,

    pub processing_cluster: String,
    pub processing_partition: String,

    pub num_tasks: usize,
    pub status: Status,
}

/// One planned observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub name: String,
    pub antenna_set: AntennaSet,
    pub band: FrequencyBand,
    pub start: Epoch,
    pub duration: Duration,
    pub stations: StationSet,
    pub clock: Clock,
    pub bit_mode: BitMode,

    /// The data products this observation was planned for.
    pub products: Vec1<DataProduct>,

    /// Beam 0 is the primary target; the rest are numbered from 1 upwards.
    pub beams: Vec1<Beam>,

    pub backend: BackendProcessing,
    pub status: Status,
    pub children: Vec<Pipeline>,
}

impl Observation {
    pub fn end(&self) -> Epoch {
        self.start + self.duration
    }

    pub fn primary_beam(&self) -> &Beam {
        self.beams.first()
    }

    pub fn append_child(&mut self, pipeline: Pipeline) {
        self.children.push(pipeline);
    }

    /// The beams a pipeline of this observation reads.
    pub fn pipeline_inputs<'a>(&'a self, pipeline: &'a Pipeline) -> impl Iterator<Item = &'a Beam> {
        pipeline
            .input_sap_ids
            .iter()
            .filter_map(move |&id| self.beams.iter().find(|b| b.sap_id == id))
    }
}

/// Groups the observations of one plan, named after the first observation's
/// start date.
#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub description: Option<String>,
    pub children: Vec1<Observation>,
}

impl Folder {
    pub fn new(observations: Vec1<Observation>) -> Folder {
        let name = TimestampTuple::from_epoch(observations.first().start).date_string();
        Folder {
            name,
            description: None,
            children: observations,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}
