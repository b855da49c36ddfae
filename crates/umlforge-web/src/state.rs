use std::sync::Arc;

use chrono::{DateTime, Utc};
use umlforge_core::{DesignModelBuilder, DiagramGenerator, ExtractionOrchestrator};

use crate::config::ServerConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ExtractionOrchestrator>,
    pub builder: DesignModelBuilder,
    pub generator: DiagramGenerator,
    pub config: Arc<ServerConfig>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> umlforge_core::Result<Self> {
        let orchestrator = ExtractionOrchestrator::from_config(config.pipeline.clone())?;
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    pub fn with_orchestrator(config: ServerConfig, orchestrator: ExtractionOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            builder: DesignModelBuilder::new(),
            generator: DiagramGenerator::new(config.render_options()),
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    fn default() -> Self {
        let config = ServerConfig::default();
        let orchestrator = ExtractionOrchestrator::new(config.pipeline.clone());
        Self::with_orchestrator(config, orchestrator)
    }
}
