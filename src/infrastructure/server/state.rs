use crate::application::bridge::Orchestrator;
use std::sync::Arc;

pub(crate) struct ServerState {
    orchestrator: Arc<Orchestrator>,
}

impl ServerState {
    pub(crate) fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub(crate) fn orchestrator(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }
}
