use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use umlforge_core::ingest::{assess_requirements, ExtractionMetadata, RequirementsReport};
use umlforge_core::{DesignModel, DiagramStatistics, ExtractionStrategy, SyntaxReport};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract))
        .route("/validate", post(validate_requirements))
        .route("/health", get(health))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractMetadata {
    /// Seconds, rounded to two decimals
    pub processing_time: f64,
    pub text_length: usize,
    pub statistics: DiagramStatistics,
    pub validation: SyntaxReport,
    pub extraction: ExtractionMetadata,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub uml_model: DesignModel,
    pub mermaid_code: String,
    pub metadata: ExtractMetadata,
}

async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let Json(request) = payload?;
    let started = Instant::now();
    let text = request.text.trim();
    tracing::info!("Processing text of length {} characters", text.chars().count());

    let raw = state
        .orchestrator
        .process(text)
        .await
        .map_err(umlforge_core::Error::from)?;
    let model = state.builder.build(&raw);
    let diagram = state.generator.generate(&model);
    let statistics = DiagramStatistics::of(&model);

    let elapsed = started.elapsed().as_secs_f64();
    tracing::info!(
        "Extracted {} classes and {} relationships in {:.2}s",
        model.classes().len(),
        model.relationships().len(),
        elapsed
    );

    Ok(Json(ExtractResponse {
        mermaid_code: diagram.code,
        metadata: ExtractMetadata {
            processing_time: (elapsed * 100.0).round() / 100.0,
            text_length: text.chars().count(),
            statistics,
            validation: diagram.validation,
            extraction: raw.metadata,
        },
        uml_model: model,
    }))
}

async fn validate_requirements(
    State(state): State<AppState>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<RequirementsReport>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(assess_requirements(
        &request.text,
        state.orchestrator.config(),
    )))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub strategy: ExtractionStrategy,
    pub services: BTreeMap<&'static str, &'static str>,
    pub version: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let availability = |available: bool| if available { "available" } else { "unavailable" };
    let provider = state.orchestrator.provider();
    let model_configured = state.orchestrator.config().model_endpoint.is_some();

    let services = BTreeMap::from([
        (
            "model_provider",
            if model_configured {
                availability(provider.strategy() == ExtractionStrategy::Hybrid)
            } else {
                "not_configured"
            },
        ),
        ("rule_based_extractor", "available"),
        ("text_normalizer", "available"),
        ("diagram_generator", "available"),
    ]);

    Json(HealthResponse {
        status: "healthy",
        strategy: provider.strategy(),
        services,
        version: env!("CARGO_PKG_VERSION"),
    })
}
