//! The four-stage valuation pipeline and its supporting pieces.

mod config;
mod context;
mod error;
mod factory;
pub mod gates;
pub mod naming;
mod runner;
pub mod stages;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, PipelineOutcome};
pub use factory::{OpenAiPipelineFactory, PipelineFactory};
pub use gates::{assess_audit, assess_existence, AuditVerdict, ExistenceCheck};
pub use naming::{archive_filename, company_stem};
pub use runner::{Pipeline, EXTRACTING_LABEL, RENDERING_LABEL};
pub use stages::{build_task, Stage, StagePrompts};
