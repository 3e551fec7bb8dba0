//! Rendering a plan as a MoM project XML document.

use std::fmt::{self, Display, Write};

use itertools::Itertools;

use crate::{
    backend::{BackendProcessing, Stokes, TiedArrayBeams},
    observation::{Beam, Folder, Observation, Pipeline},
    tags::Status,
    time::{mom_duration, TimestampTuple},
};

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const PROJECT_OPEN: &str = r#"<mom2:project xmlns:lofar="http://www.astron.nl/MoM2-Lofar"
    xmlns:mom2="http://www.astron.nl/MoM2"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://www.astron.nl/MoM2-Lofar http://lofar.astron.nl:8080/mom3/schemas/LofarMoM2.xsd http://www.astron.nl/MoM2 http://lofar.astron.nl:8080/mom3/schemas/MoM2.xsd ">"#;

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn mom_status(status: Status) -> &'static str {
    match status {
        Status::Opened => "<mom2:openedStatus/>",
        Status::Approved => "<mom2:approvedStatus/>",
    }
}

/// An indenting element writer.
struct XmlWriter<'w, W: Write> {
    out: &'w mut W,
    depth: usize,
}

impl<'w, W: Write> XmlWriter<'w, W> {
    fn new(out: &'w mut W) -> Self {
        XmlWriter { out, depth: 0 }
    }

    fn line(&mut self, text: &str) -> fmt::Result {
        writeln!(self.out, "{:width$}{text}", "", width = 2 * self.depth)
    }

    /// `tag` may carry attributes, e.g. `item index="0"`.
    fn open(&mut self, tag: &str) -> fmt::Result {
        self.line(&format!("<{tag}>"))?;
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self, tag: &str) -> fmt::Result {
        self.depth = self.depth.saturating_sub(1);
        let name = tag.split_whitespace().next().unwrap_or(tag);
        self.line(&format!("</{name}>"))
    }

    fn leaf<T: Display>(&mut self, tag: &str, value: T) -> fmt::Result {
        let name = tag.split_whitespace().next().unwrap_or(tag);
        let value = escape_xml(&value.to_string());
        self.line(&format!("<{tag}>{value}</{name}>"))
    }

    fn flag(&mut self, tag: &str, value: bool) -> fmt::Result {
        self.leaf(tag, value)
    }

    fn status(&mut self, status: Status) -> fmt::Result {
        self.open("currentStatus")?;
        self.line(mom_status(status))?;
        self.close("currentStatus")
    }

    fn tied_array_beams(&mut self, tabs: Option<&TiedArrayBeams>) -> fmt::Result {
        let default = TiedArrayBeams::default();
        let tabs = tabs.unwrap_or(&default);
        self.open("tiedArrayBeams")?;
        self.flag("flyseye", tabs.flyseye)?;
        self.leaf("nrTabRings", tabs.nr_tab_rings)?;
        self.leaf("tabRingSize", format!("{:.6}", tabs.tab_ring_size))?;
        if tabs.beam_offsets.is_empty() {
            self.line("<tiedArrayBeamList/>")?;
        } else {
            self.open("tiedArrayBeamList")?;
            for (l, m) in &tabs.beam_offsets {
                self.line(&format!(
                    "<tiedArrayBeam><coherent>true</coherent><angle1>{l:.6}</angle1><angle2>{m:.6}</angle2></tiedArrayBeam>"
                ))?;
            }
            self.close("tiedArrayBeamList")?;
        }
        self.close("tiedArrayBeams")
    }

    fn stokes(&mut self, stokes: &Stokes) -> fmt::Result {
        let s = stokes.suffix();
        self.leaf(&format!("subbandsPerFile{s}"), stokes.subbands_per_file)?;
        self.leaf(&format!("numberCollapsedChannels{s}"), stokes.collapsed_channels)?;
        self.leaf(&format!("stokesDownsamplingSteps{s}"), stokes.downsampling_steps)?;
        self.leaf(&format!("which{s}"), stokes.polarizations)
    }

    fn backend(&mut self, obs: &Observation, backend: &BackendProcessing) -> fmt::Result {
        self.flag("correlatedData", backend.correlated_data)?;
        self.flag("filteredData", false)?;
        self.flag("beamformedData", false)?;
        self.flag("coherentStokesData", backend.coherent_stokes.is_some())?;
        self.flag("incoherentStokesData", backend.incoherent_stokes.is_some())?;
        self.leaf("antenna", obs.antenna_set.mom_name())?;
        self.line(&format!("<clock mode=\"{} MHz\"/>", obs.clock.mhz()))?;
        self.leaf("instrumentFilter", obs.band.mom_filter())?;
        self.leaf("integrationInterval", backend.integration_time_seconds)?;
        self.leaf("channelsPerSubband", backend.channels_per_subband)?;
        self.open("pencilBeams")?;
        self.flag("flyseye", false)?;
        self.line("<pencilBeamList/>")?;
        self.close("pencilBeams")?;
        self.tied_array_beams(backend.tied_array_beams.as_ref())?;
        self.open("stokes")?;
        self.flag("integrateChannels", false)?;
        for stokes in backend
            .coherent_stokes
            .iter()
            .chain(backend.incoherent_stokes.iter())
        {
            self.stokes(stokes)?;
        }
        self.close("stokes")?;
        self.line("<stationSet>Custom</stationSet>")?;
        self.open("stations")?;
        for station in &obs.stations {
            self.line(&format!("<station name=\"{}\"/>", escape_xml(station.as_str())))?;
        }
        self.close("stations")?;
        self.leaf("timeFrame", "UT")?;
        self.leaf("startTime", TimestampTuple::from_epoch(obs.start).mom_timestamp())?;
        self.leaf("endTime", TimestampTuple::from_epoch(obs.end()).mom_timestamp())?;
        self.leaf("duration", mom_duration(obs.duration))?;
        self.flag("bypassPff", false)?;
        self.flag("enableSuperterp", backend.enable_superterp)?;
        self.leaf("numberOfBitsPerSample", obs.bit_mode.bits())
    }

    fn measurement(&mut self, obs: &Observation, beam: &Beam) -> fmt::Result {
        let (kind, attributes) = if obs.backend.needs_beam_observation() {
            ("lofar:BFMeasurementType", "lofar:bfMeasurementAttributes")
        } else {
            ("lofar:UVMeasurementType", "lofar:uvMeasurementAttributes")
        };
        self.open(&format!("item index=\"{}\"", beam.sap_id))?;
        self.open(&format!("lofar:measurement xsi:type=\"{kind}\""))?;
        self.leaf("name", &beam.target.name)?;
        self.leaf("description", &obs.name)?;
        self.status(obs.status)?;
        self.open(attributes)?;
        self.leaf("measurementType", "Target")?;
        self.open("specification")?;
        self.leaf("targetName", &beam.target.name)?;
        self.leaf("ra", beam.target.radec.ra.to_degrees())?;
        self.leaf("dec", beam.target.radec.dec.to_degrees())?;
        self.leaf("equinox", "J2000")?;
        self.leaf("duration", mom_duration(obs.duration))?;
        self.open("subbandsSpecification")?;
        self.leaf("contiguous", false)?;
        self.leaf("subbands", &beam.subbands)?;
        self.close("subbandsSpecification")?;
        self.tied_array_beams(obs.backend.tied_array_beams.as_ref())?;
        self.close("specification")?;
        self.close(attributes)?;
        self.close("lofar:measurement")?;
        self.close("item")
    }

    fn pipeline(&mut self, obs: &Observation, pipeline: &Pipeline, index: usize) -> fmt::Result {
        let p = &pipeline.parameters;
        let (demix_freq_step, demix_time_step) = p.demix_steps();
        let source_list =
            |list: &Option<Vec<String>>| list.as_ref().map(|l| format!("[{}]", l.join(",")));

        self.open(&format!("item index=\"{index}\""))?;
        self.open("lofar:pipeline xsi:type=\"lofar:AveragingPipelineType\"")?;
        self.leaf("name", &pipeline.name)?;
        self.leaf("description", &pipeline.name)?;
        self.status(pipeline.status)?;
        self.open("pipelineAttributes")?;
        self.leaf("defaultTemplate", "Preprocessing Pipeline")?;
        self.leaf("duration", mom_duration(pipeline.duration))?;
        self.leaf("startTime", TimestampTuple::from_epoch(pipeline.start).mom_timestamp())?;
        self.leaf(
            "endTime",
            TimestampTuple::from_epoch(pipeline.start + pipeline.duration).mom_timestamp(),
        )?;
        self.open("demixingParameters")?;
        self.leaf("averagingFreqStep", p.avg_freq_step)?;
        self.leaf("averagingTimeStep", p.avg_time_step)?;
        self.leaf("demixFreqStep", demix_freq_step)?;
        self.leaf("demixTimeStep", demix_time_step)?;
        self.leaf("demixAlways", source_list(&p.demix_always).unwrap_or_default())?;
        self.leaf("demixIfNeeded", source_list(&p.demix_if_needed).unwrap_or_default())?;
        self.leaf("ignoreTarget", "")?;
        self.close("demixingParameters")?;
        self.open("processingCluster")?;
        self.leaf("name", &pipeline.processing_cluster)?;
        self.leaf("partition", &pipeline.processing_partition)?;
        self.leaf("numberOfTasks", pipeline.num_tasks)?;
        self.close("processingCluster")?;
        self.close("pipelineAttributes")?;
        self.open("usedDataProducts")?;
        for beam in obs.pipeline_inputs(pipeline) {
            self.leaf("item", format!("{}.SAP{:03}", obs.name, beam.sap_id))?;
        }
        self.close("usedDataProducts")?;
        self.close("lofar:pipeline")?;
        self.close("item")
    }

    fn observation(&mut self, obs: &Observation, project: &str) -> fmt::Result {
        self.open("lofar:observation")?;
        self.leaf("name", &obs.name)?;
        self.leaf("description", &obs.name)?;
        self.status(obs.status)?;
        self.open("lofar:observationAttributes")?;
        self.leaf("name", &obs.name)?;
        self.leaf("projectName", project)?;
        self.leaf("instrument", obs.backend.instrument_name())?;
        self.open("userSpecification")?;
        self.backend(obs, &obs.backend)?;
        self.close("userSpecification")?;
        self.close("lofar:observationAttributes")?;
        self.open("children")?;
        for beam in &obs.beams {
            self.measurement(obs, beam)?;
        }
        for (i, pipeline) in obs.children.iter().enumerate() {
            self.pipeline(obs, pipeline, obs.beams.len() + i)?;
        }
        self.close("children")?;
        self.close("lofar:observation")
    }

    fn folder(&mut self, folder: &Folder, project: &str) -> fmt::Result {
        self.open("lofar:folder")?;
        self.leaf("name", &folder.name)?;
        if let Some(description) = &folder.description {
            self.leaf("description", description)?;
        }
        self.open("children")?;
        for (i, obs) in folder.children.iter().enumerate() {
            self.open(&format!("item index=\"{i}\""))?;
            self.observation(obs, project)?;
            self.close("item")?;
        }
        self.close("children")?;
        self.close("lofar:folder")
    }
}

/// A folder of observations, wrapped in a MoM project. Its `Display` is the
/// XML document.
pub struct MomProject<'a> {
    pub folder: &'a Folder,
    pub project: &'a str,
}

impl Display for MomProject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{XML_HEADER}")?;
        writeln!(f, "{PROJECT_OPEN}")?;
        let mut xml = XmlWriter::new(f);
        xml.depth = 1;
        xml.leaf("name", self.project)?;
        xml.leaf("description", self.project)?;
        xml.open("children")?;
        xml.open("item index=\"0\"")?;
        xml.folder(self.folder, self.project)?;
        xml.close("item")?;
        xml.close("children")?;
        writeln!(f, "</mom2:project>")
    }
}

/// The MoM XML document for `folder` in `project`.
pub fn to_mom_xml(folder: &Folder, project: &str) -> String {
    MomProject { folder, project }.to_string()
}

/// A short human-readable listing of a plan, one observation per line.
pub fn summarise(folder: &Folder) -> String {
    folder
        .children
        .iter()
        .map(|obs| {
            format!(
                "{} {:>6} s  {:<28} {} ({})",
                TimestampTuple::from_epoch(obs.start).mom_timestamp(),
                obs.duration.to_seconds(),
                obs.name,
                obs.primary_beam().target.name,
                obs.children.iter().map(|p| &p.name).join(", ")
            )
        })
        .join("\n")
}
