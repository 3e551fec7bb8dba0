//! Plan commissioning observation sequences for LOFAR and write them out as
//! MoM projects.

pub mod backend;
pub mod beams;
pub mod constants;
mod error;
pub mod job;
pub mod observation;
pub mod pipeline;
pub mod planner;
pub mod read;
pub mod sky;
pub mod stations;
pub mod subbands;
pub mod tags;
pub mod template;
pub mod time;
pub mod timeline;
pub mod write;

pub use error::{PlanError, SubbandSpecError};
pub use job::{JobConfigError, JobConfiguration, StartTime};
pub use observation::{Beam, Folder, Observation, Pipeline};
pub use planner::{load_template, plan};
pub use sky::{LofarCatalogue, SourceCatalogue, TargetSource};
pub use template::{default_template, ScheduleTemplateEntry};
pub use write::to_mom_xml;
