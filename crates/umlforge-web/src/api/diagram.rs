use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use umlforge_core::model::ModelReport;
use umlforge_core::{
    AppliedChange, Change, DesignModel, DiagramStatistics, Export, ExportFormat, StatisticsReport,
    SyntaxReport,
};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update", post(update_diagram))
        .route("/export", post(export_diagram))
        .route("/validate", post(validate_diagram))
        .route("/statistics", post(statistics))
}

#[derive(Debug, Deserialize)]
pub struct ModelRequest {
    #[serde(default)]
    pub uml_model: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub uml_model: Option<Value>,
    #[serde(default)]
    pub changes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub uml_model: Option<Value>,
    #[serde(default)]
    pub format: Option<String>,
}

fn parse_model(value: Option<Value>) -> Result<DesignModel, ApiError> {
    match value {
        None | Some(Value::Null) => Err(ApiError::missing_model()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::from(umlforge_core::Error::from(e))),
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateMetadata {
    pub statistics: DiagramStatistics,
    pub validation: SyntaxReport,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub uml_model: DesignModel,
    pub mermaid_code: String,
    pub changes_applied: Vec<AppliedChange>,
    pub metadata: UpdateMetadata,
}

async fn update_diagram(
    State(state): State<AppState>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let Json(request) = payload?;
    let mut model = parse_model(request.uml_model)?;
    let changes = request
        .changes
        .into_iter()
        .map(Change::from_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(umlforge_core::Error::from)?;

    let updated = match state.generator.update(&mut model, &changes) {
        Ok(updated) => updated,
        Err(e) => {
            let failed_change = e.index();
            return Err(ApiError::from(umlforge_core::Error::from(e))
                .with_partial_model(failed_change, &model));
        }
    };

    Ok(Json(UpdateResponse {
        metadata: UpdateMetadata {
            statistics: DiagramStatistics::of(&model),
            validation: updated.diagram.validation,
        },
        mermaid_code: updated.diagram.code,
        changes_applied: updated.applied,
        uml_model: model,
    }))
}

async fn export_diagram(
    State(state): State<AppState>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<Export>, ApiError> {
    let Json(request) = payload?;
    let model = parse_model(request.uml_model)?;
    let format = match request.format.as_deref() {
        Some(raw) => raw
            .parse::<ExportFormat>()
            .map_err(umlforge_core::Error::from)?,
        None => ExportFormat::default(),
    };

    let export = state
        .generator
        .export(&model, format)
        .map_err(umlforge_core::Error::from)?;
    Ok(Json(export))
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    #[serde(flatten)]
    pub report: ModelReport,
    pub statistics: DiagramStatistics,
}

async fn validate_diagram(
    State(state): State<AppState>,
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let Json(request) = payload?;
    let model = parse_model(request.uml_model)?;
    Ok(Json(ValidationResponse {
        report: state.generator.review(&model),
        statistics: DiagramStatistics::of(&model),
    }))
}

async fn statistics(
    payload: Result<Json<ModelRequest>, JsonRejection>,
) -> Result<Json<StatisticsReport>, ApiError> {
    let Json(request) = payload?;
    let model = parse_model(request.uml_model)?;
    Ok(Json(StatisticsReport::of(&model)))
}
