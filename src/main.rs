use std::path::PathBuf;

use clap::{AppSettings, Parser};
use hifitime::{Duration, Epoch};
use itertools::Itertools;
use log::{debug, info};
use thiserror::Error;
use vec1::Vec1;

use momplan::{
    load_template, plan,
    tags::{Clock, DataProduct, Status},
    time::TimestampTuple,
    write::{summarise, to_mom_xml},
    Folder, JobConfigError, JobConfiguration, LofarCatalogue, PlanError, StartTime,
};

#[derive(Parser)]
#[clap(about, version)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// Data products to plan for. XC, FE, CS and IS also enable their
    /// variants (BM; TR; CS_I, CS_IQUV, CV; IS_I, IS_IQUV). [default: XC FE CS
    /// IS]
    #[clap(short, long, multiple_values(true))]
    modes: Vec<DataProduct>,

    /// Length of each observation [seconds].
    #[clap(short, long, default_value = "300")]
    duration: f64,

    /// Idle time between observations [seconds].
    #[clap(long, default_value = "60")]
    gap: f64,

    /// Station group: superterp, core, remote, nl, europe, all or none.
    #[clap(short, long, default_value = "all")]
    stations: String,

    /// Stations to add to the group.
    #[clap(long, multiple_values(true))]
    include: Vec<String>,

    /// Stations to remove from the group.
    #[clap(long, multiple_values(true))]
    exclude: Vec<String>,

    /// Lowest allowed target elevation [degrees].
    #[clap(long, default_value = "30")]
    min_elevation: f64,

    /// Highest allowed target elevation [degrees].
    #[clap(long, default_value = "90")]
    max_elevation: f64,

    /// Allowed clock frequencies [MHz]. [default: 160 200]
    #[clap(long, multiple_values(true))]
    clocks: Vec<Clock>,

    /// Start this long from now [seconds].
    #[clap(short, long, default_value = "600")]
    wait: f64,

    /// Start at this UTC time (YYYY-MM-DDThh:mm:ss). Overrides --wait.
    #[clap(long)]
    start: Option<String>,

    /// Observe this source every time, rather than picking calibrators and
    /// pulsars.
    #[clap(long)]
    source: Option<String>,

    /// Plan this custom sequence instead of the built-in one.
    #[clap(short, long)]
    template: Option<PathBuf>,

    /// Most subbands per observation.
    #[clap(long, default_value = "488")]
    max_subbands: usize,

    #[clap(long, default_value = "CEP4")]
    storage_cluster: String,

    #[clap(long, default_value = "/data/projects")]
    storage_partition: String,

    #[clap(long, default_value = "CEP4")]
    processing_cluster: String,

    #[clap(long, default_value = "cpu")]
    processing_partition: String,

    /// Correlator integration time [seconds].
    #[clap(long, default_value = "2")]
    integration_time: f64,

    /// Initial status of everything planned: opened or approved.
    #[clap(long, default_value = "opened")]
    status: Status,

    /// MoM project to plan into.
    #[clap(short, long, default_value = "2024LOFAROBS")]
    project: String,

    /// Description of the folder holding the plan.
    #[clap(long)]
    description: Option<String>,

    /// Where to write the XML. Defaults to <project>-<date>.xml.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,
}

#[derive(Error, Debug)]
enum MomplanError {
    #[error(transparent)]
    Config(#[from] JobConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Couldn't get the current time: {0}")]
    Clock(String),

    #[error("Nothing to plan: no template entry matches the requested modes and clocks")]
    NothingPlanned,

    #[error("Couldn't write {}: {err}", file.display())]
    Write {
        file: PathBuf,
        #[source]
        err: std::io::Error,
    },
}

impl Args {
    fn to_job(&self) -> Result<JobConfiguration, JobConfigError> {
        let defaults = JobConfiguration::default();
        let modes = if self.modes.is_empty() {
            defaults.modes
        } else {
            self.modes.iter().copied().collect()
        };
        let clocks = if self.clocks.is_empty() {
            defaults.clocks
        } else {
            self.clocks.iter().copied().collect()
        };
        let start = match &self.start {
            Some(s) => StartTime::At(TimestampTuple::parse(s)?.to_epoch()?),
            None => StartTime::Wait(Duration::from_seconds(self.wait)),
        };

        let job = JobConfiguration {
            modes,
            duration_seconds: self.duration,
            gap_seconds: self.gap,
            station_group: self.stations.clone(),
            include_stations: self.include.clone(),
            exclude_stations: self.exclude.clone(),
            min_elevation_deg: self.min_elevation,
            max_elevation_deg: self.max_elevation,
            clocks,
            start,
            source: self.source.clone(),
            custom_template: self.template.clone(),
            max_subbands: self.max_subbands,
            storage_cluster: self.storage_cluster.clone(),
            storage_partition: self.storage_partition.clone(),
            processing_cluster: self.processing_cluster.clone(),
            processing_partition: self.processing_partition.clone(),
            integration_time_seconds: self.integration_time,
            status: self.status,
        };
        job.validate()?;
        Ok(job)
    }
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), MomplanError> {
    let args = Args::parse();
    setup_logging(args.verbosity);

    let job = args.to_job()?;
    debug!(
        "Planning for {}",
        job.requested_products().iter().join(", ")
    );
    let template = load_template(&job)?;
    let now = Epoch::now().map_err(|e| MomplanError::Clock(e.to_string()))?;
    let observations = plan(&job, &template, &LofarCatalogue::default(), now)?;
    let observations = Vec1::try_from_vec(observations).map_err(|_| MomplanError::NothingPlanned)?;

    let mut folder = Folder::new(observations);
    if let Some(description) = &args.description {
        folder = folder.with_description(description.as_str());
    }
    for line in summarise(&folder).lines() {
        debug!("{line}");
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}-{}.xml", args.project, folder.name)));
    std::fs::write(&output, to_mom_xml(&folder, &args.project)).map_err(|err| {
        MomplanError::Write {
            file: output.clone(),
            err,
        }
    })?;
    info!(
        "Wrote {} observation(s) to {}",
        folder.children.len(),
        output.display()
    );
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();
}
