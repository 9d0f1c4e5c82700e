// Scheduling core: due-job discovery, dispatch, and result bookkeeping

pub mod engine;
pub mod finder;
pub mod in_flight;
pub mod marker;
pub mod pipeline;
pub mod resolver;
pub mod window;

pub use engine::{Scheduler, SchedulerEngine};
pub use finder::DueJobFinder;
pub use in_flight::InFlight;
pub use marker::{MarkReport, ResultMarker};
pub use pipeline::{Pipeline, PipelineHandle};
pub use resolver::TemplateResolver;
pub use window::{next_window, HISTORY_DEPTH};
