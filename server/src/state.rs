use std::sync::Arc;

use dcfcrew::pipeline::PipelineFactory;
use dcfcrew::{JobControl, JobStore};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub control: Arc<JobControl>,
}

impl AppState {
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self::with_store(Arc::new(JobStore::new()), factory)
    }

    pub fn with_store(store: Arc<JobStore>, factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            control: Arc::new(JobControl::new(store, factory)),
        }
    }
}
