//! Schedule templates: the candidate instrument configurations a plan is
//! built from.

use std::{collections::BTreeSet, fmt};

use itertools::Itertools;

use crate::{
    constants::{DEFAULT_DEMIX_FREQ_STEP, DEFAULT_DEMIX_TIME_STEP},
    tags::{AntennaSet, BitMode, Clock, DataProduct, FrequencyBand},
};

/// Kinds of post-processing pipeline a template entry can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Averaging and demixing with NDPPP.
    Ndppp,
}

impl PipelineKind {
    pub const NDPPP_KEYWORD: &'static str = "NDPPP";

    pub fn keyword(self) -> &'static str {
        match self {
            PipelineKind::Ndppp => Self::NDPPP_KEYWORD,
        }
    }
}

/// Averaging and demixing parameters of an NDPPP pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescriptor {
    pub kind: PipelineKind,

    /// How many channels to average.
    pub avg_freq_step: u32,

    /// How many time slots to average.
    pub avg_time_step: u32,

    /// The demixing window as (channels, time slots). `None` gets the
    /// default of (64, 10).
    pub demix_window: Option<(u32, u32)>,

    /// Sources to always demix, e.g. "CygA", "CasA".
    pub demix_always: Option<Vec<String>>,

    /// Sources to demix if they turn out to be a problem.
    pub demix_if_needed: Option<Vec<String>>,
}

impl PipelineDescriptor {
    pub fn ndppp(avg_freq_step: u32, avg_time_step: u32) -> PipelineDescriptor {
        PipelineDescriptor {
            kind: PipelineKind::Ndppp,
            avg_freq_step,
            avg_time_step,
            demix_window: None,
            demix_always: None,
            demix_if_needed: None,
        }
    }

    pub fn with_demix_window(mut self, freq_step: u32, time_step: u32) -> Self {
        self.demix_window = Some((freq_step, time_step));
        self
    }

    pub fn with_demix_always(mut self, sources: &[&str]) -> Self {
        self.demix_always = Some(sources.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_demix_if_needed(mut self, sources: &[&str]) -> Self {
        self.demix_if_needed = Some(sources.iter().map(|s| s.to_string()).collect());
        self
    }

    /// The demixing window, with defaults filled in.
    pub fn demix_steps(&self) -> (u32, u32) {
        self.demix_window
            .unwrap_or((DEFAULT_DEMIX_FREQ_STEP, DEFAULT_DEMIX_TIME_STEP))
    }

    /// The demixing window must be a whole number of averaging steps on both
    /// axes.
    pub fn validate(&self) -> Result<(), String> {
        let (demix_freq_step, demix_time_step) = self.demix_steps();
        for (name, value) in [
            ("averaging frequency step", self.avg_freq_step),
            ("averaging time step", self.avg_time_step),
            ("demixing frequency step", demix_freq_step),
            ("demixing time step", demix_time_step),
        ] {
            if value == 0 {
                return Err(format!("NDPPP {name} must be positive"));
            }
        }
        if demix_freq_step % self.avg_freq_step != 0 {
            return Err(format!(
                "NDPPP demixing frequency step ({demix_freq_step}) is not a multiple of the averaging frequency step ({})",
                self.avg_freq_step
            ));
        }
        if demix_time_step % self.avg_time_step != 0 {
            return Err(format!(
                "NDPPP demixing time step ({demix_time_step}) is not a multiple of the averaging time step ({})",
                self.avg_time_step
            ));
        }
        Ok(())
    }
}

impl fmt::Display for PipelineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.kind.keyword(),
            self.avg_freq_step,
            self.avg_time_step
        )?;
        if let Some((freq, time)) = self.demix_window {
            write!(f, " {freq} {time}")?;
        }
        if let Some(sources) = &self.demix_always {
            write!(f, " demix_always={}", sources.join(","))?;
        }
        if let Some(sources) = &self.demix_if_needed {
            write!(f, " demix_if_needed={}", sources.join(","))?;
        }
        Ok(())
    }
}

/// One candidate instrument configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTemplateEntry {
    pub antenna_set: AntennaSet,
    pub band: FrequencyBand,

    /// Subband specification, e.g. "77..324".
    pub subbands: String,

    pub channels_per_subband: u32,
    pub clock: Clock,
    pub bit_mode: BitMode,
    pub products: BTreeSet<DataProduct>,
    pub pipeline: Option<PipelineDescriptor>,
}

impl ScheduleTemplateEntry {
    pub fn new(
        antenna_set: AntennaSet,
        band: FrequencyBand,
        subbands: &str,
        channels_per_subband: u32,
        clock: Clock,
        bit_mode: BitMode,
        products: &[DataProduct],
    ) -> ScheduleTemplateEntry {
        ScheduleTemplateEntry {
            antenna_set,
            band,
            subbands: subbands.to_string(),
            channels_per_subband,
            clock,
            bit_mode,
            products: products.iter().copied().collect(),
            pipeline: None,
        }
    }

    pub fn with_pipeline(mut self, pipeline: PipelineDescriptor) -> Self {
        self.pipeline = Some(pipeline);
        self
    }
}

/// The line format read by [`crate::read::parse_sequence`].
impl fmt::Display for ScheduleTemplateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            self.antenna_set,
            self.band,
            self.subbands,
            self.channels_per_subband,
            self.clock,
            self.bit_mode,
            self.products.iter().join(" ")
        )?;
        if let Some(pipeline) = &self.pipeline {
            write!(f, " {pipeline}")?;
        }
        Ok(())
    }
}

/// The standard commissioning sequence.
pub fn default_template() -> Vec<ScheduleTemplateEntry> {
    use AntennaSet::*;
    use BitMode::*;
    use Clock::*;
    use DataProduct::*;
    use FrequencyBand::*;

    let e = ScheduleTemplateEntry::new;
    let dmx = PipelineDescriptor::ndppp(16, 2)
        .with_demix_window(64, 10)
        .with_demix_always(&["CygA", "CasA"]);
    vec![
        e(LbaOuter, LbaLow, "12..499", 64, Mhz200, Eight, &[Xc]),
        e(LbaOuter, LbaLow, "12..499", 64, Mhz200, Eight, &[Xc, Bm]).with_pipeline(dmx.clone()),
        e(LbaSparseEven, LbaLow, "12..499", 64, Mhz200, Eight, &[Fe]),
        e(LbaOuter, LbaHigh, "54..453", 16, Mhz200, Sixteen, &[Cs, Is]),
        e(LbaInner, LbaLow, "12..499", 1, Mhz200, Eight, &[Cv]),
        e(LbaOuter, LbaHigh, "154..397", 64, Mhz160, Sixteen, &[Xc]),
        e(HbaDual, HbaLow, "77..320", 16, Mhz160, Sixteen, &[IsIquv]),
        e(HbaDual, HbaLow, "77..320", 64, Mhz200, Sixteen, &[Xc]).with_pipeline(
            PipelineDescriptor::ndppp(4, 1).with_demix_if_needed(&["CygA", "CasA", "TauA"]),
        ),
        e(HbaDual, HbaLow, "77..320", 16, Mhz200, Sixteen, &[Tr]),
        e(HbaDualInner, HbaLow, "51..442", 64, Mhz200, Eight, &[Xc, Bm]).with_pipeline(dmx),
        e(HbaJoined, HbaLow, "77..320", 16, Mhz200, Eight, &[CsI, IsI]),
        e(HbaZero, HbaLow, "77..320", 16, Mhz200, Sixteen, &[CsIquv]),
        e(HbaOne, HbaMid, "100..400", 64, Mhz160, Sixteen, &[Xc]),
        e(HbaDual, HbaHigh, "54..296", 64, Mhz200, Sixteen, &[Xc]),
        e(HbaDual, HbaLow, "77..320", 16, Mhz200, Sixteen, &[Fe, Cs]),
    ]
}
