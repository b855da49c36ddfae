use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::extractor::{
    EntityLabel, ExtractionError, ExtractionProvider, ExtractionResult, ExtractionStrategy,
    RawEntity, RawRelationship,
};

const DEFAULT_MAX_INPUT: usize = 4_096;

/// Client for an external inference service exposing
/// `POST {endpoint}/entities` and `POST {endpoint}/relationships`.
pub struct RemoteModelProvider {
    client: Client,
    endpoint: Url,
    max_input: usize,
}

#[derive(Serialize)]
struct EntityRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RelationshipRequest<'a> {
    text: &'a str,
    entities: Vec<EntityRef<'a>>,
}

#[derive(Serialize)]
struct EntityRef<'a> {
    text: &'a str,
    label: &'static str,
}

#[derive(Deserialize)]
struct ModelEntity {
    text: String,
    label: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: usize,
    #[serde(default)]
    belongs_to: Option<String>,
}

#[derive(Deserialize)]
struct ModelRelationship {
    source: String,
    target: String,
    #[serde(alias = "type", alias = "relationship_type")]
    kind: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    context: String,
}

const fn default_confidence() -> f64 {
    1.0
}

impl RemoteModelProvider {
    pub fn new(endpoint: Url, timeout: Duration) -> ExtractionResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::ModelUnavailable(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    #[must_use]
    pub fn with_client(client: Client, mut endpoint: Url) -> Self {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Self {
            client,
            endpoint,
            max_input: DEFAULT_MAX_INPUT,
        }
    }

    #[must_use]
    pub const fn with_max_input(mut self, max_input: usize) -> Self {
        self.max_input = max_input;
        self
    }

    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn check_length(&self, text: &str) -> ExtractionResult<()> {
        if text.len() > self.max_input {
            return Err(ExtractionError::ContextTooLong(text.len(), self.max_input));
        }
        Ok(())
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ExtractionResult<T> {
        let url = self
            .endpoint
            .join(path)
            .map_err(|e| ExtractionError::Failed(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ExtractionError::ModelUnavailable(e.to_string())
                } else {
                    ExtractionError::Failed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractionError::RateLimited);
        }
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ExtractionError::ModelUnavailable(status.to_string()));
        }
        if !status.is_success() {
            return Err(ExtractionError::Failed(format!(
                "model service returned {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ExtractionError::Failed(format!("invalid model response: {e}")))
    }
}

#[async_trait::async_trait]
impl ExtractionProvider for RemoteModelProvider {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Model
    }

    async fn extract_entities(&self, text: &str) -> ExtractionResult<Vec<RawEntity>> {
        self.check_length(text)?;
        let entities: Vec<ModelEntity> = self.post("entities", &EntityRequest { text }).await?;

        Ok(entities
            .into_iter()
            .filter(|e| !e.text.trim().is_empty())
            .map(|e| {
                let mut entity = RawEntity::new(
                    e.text.trim(),
                    EntityLabel::from_model_label(&e.label),
                    e.confidence,
                )
                .with_span(e.start, e.end);
                entity.owner = e.belongs_to;
                entity
            })
            .collect())
    }

    async fn extract_relationships(
        &self,
        text: &str,
        known: &[RawEntity],
    ) -> ExtractionResult<Vec<RawRelationship>> {
        self.check_length(text)?;
        let request = RelationshipRequest {
            text,
            entities: known
                .iter()
                .map(|e| EntityRef {
                    text: &e.text,
                    label: e.label.as_str(),
                })
                .collect(),
        };
        let relationships: Vec<ModelRelationship> = self.post("relationships", &request).await?;

        Ok(relationships
            .into_iter()
            .map(|r| {
                RawRelationship::new(r.source, r.target, r.kind, r.confidence)
                    .with_context(r.context)
            })
            .collect())
    }
}
