use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;

use super::extractor::{
    EntityLabel, ExtractionProvider, ExtractionStrategy, FallbackProvider, RawEntity,
    RawRelationship, RuleBasedProvider,
};
use super::normalizer::{DefaultNormalizer, NormalizationError, Normalizer};
use super::remote::RemoteModelProvider;
use super::requirements::{check_length, InputError};
use crate::config::PipelineConfig;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),
}

pub type IngestResult<T> = Result<T, IngestError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub original_length: usize,
    pub processed_length: usize,
    pub chunk_count: usize,
    pub failed_chunks: usize,
    pub strategy: ExtractionStrategy,
    pub timed_out: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtractionResult {
    pub entities: Vec<RawEntity>,
    pub relationships: Vec<RawRelationship>,
    pub processed_text: String,
    pub metadata: ExtractionMetadata,
}

impl RawExtractionResult {
    pub fn entities_with_label(&self, label: EntityLabel) -> impl Iterator<Item = &RawEntity> {
        self.entities.iter().filter(move |e| e.label == label)
    }

    pub fn classes(&self) -> impl Iterator<Item = &RawEntity> {
        self.entities_with_label(EntityLabel::Class)
    }
}

/// Keeps one entity per case-insensitive text: the most confident one, in
/// the position where that text was first seen.
pub fn merge_entities<I>(entities: I) -> Vec<RawEntity>
where
    I: IntoIterator<Item = RawEntity>,
{
    let mut merged: Vec<RawEntity> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entity in entities {
        if entity.text.trim().is_empty() {
            continue;
        }
        let key = entity.text.to_lowercase();
        if let Some(&index) = positions.get(&key) {
            if entity.confidence > merged[index].confidence {
                merged[index] = entity;
            }
        } else {
            positions.insert(key, merged.len());
            merged.push(entity);
        }
    }

    merged
}

pub struct ExtractionOrchestrator {
    normalizer: Box<dyn Normalizer>,
    provider: Arc<dyn ExtractionProvider>,
    fallback: Arc<dyn ExtractionProvider>,
    config: PipelineConfig,
}

impl ExtractionOrchestrator {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            normalizer: Box::new(DefaultNormalizer::new()),
            provider: Arc::new(FallbackProvider::rule_based_only()),
            fallback: Arc::new(RuleBasedProvider::with_default_patterns()),
            config,
        }
    }

    /// Builds the orchestrator with the remote model as primary provider
    /// when an endpoint is configured.
    pub fn from_config(config: PipelineConfig) -> crate::Result<Self> {
        config.validate()?;
        let primary: Option<Arc<dyn ExtractionProvider>> = match config.model_endpoint()? {
            Some(endpoint) => {
                tracing::info!("Using model endpoint {}", endpoint);
                let remote: Arc<dyn ExtractionProvider> =
                    Arc::new(RemoteModelProvider::new(endpoint, config.request_timeout())?);
                Some(remote)
            }
            None => {
                tracing::info!("No model endpoint configured, using rule-based extraction");
                None
            }
        };
        Ok(Self::new(config).with_provider(Arc::new(FallbackProvider::new(primary))))
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ExtractionProvider>) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Box<dyn Normalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn ExtractionProvider {
        self.provider.as_ref()
    }

    pub async fn process(&self, text: &str) -> IngestResult<RawExtractionResult> {
        let started = Instant::now();
        let trimmed = text.trim();
        check_length(trimmed, &self.config)?;

        let processed = self.normalizer.normalize(trimmed)?;
        tracing::info!(
            "Processing {} characters ({} after normalization)",
            trimmed.chars().count(),
            processed.chars().count()
        );

        let mut result = match tokio::time::timeout(
            self.config.request_timeout(),
            self.run(&processed, Arc::clone(&self.provider)),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "Extraction exceeded {}s, rerunning with rule-based extraction",
                    self.config.timeout_secs
                );
                let mut result = self.run(&processed, Arc::clone(&self.fallback)).await;
                result.metadata.timed_out = true;
                result
            }
        };

        result.metadata.original_length = trimmed.chars().count();
        result.metadata.processed_length = processed.chars().count();
        result.metadata.duration_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.processed_text = processed;

        tracing::info!(
            "Extracted {} entities and {} relationships in {}ms",
            result.entities.len(),
            result.relationships.len(),
            result.metadata.duration_ms
        );
        Ok(result)
    }

    async fn run(
        &self,
        processed: &str,
        provider: Arc<dyn ExtractionProvider>,
    ) -> RawExtractionResult {
        let chunks: Vec<String> = self
            .config
            .chunk_settings()
            .chunks(processed)
            .map(|c| c.text.to_string())
            .collect();
        let mut failed = vec![false; chunks.len()];

        let mut candidates = Vec::new();
        for (i, batch) in entities_per_chunk(&provider, &chunks).await.into_iter().enumerate() {
            match batch {
                Some(batch) => candidates.extend(batch),
                None => failed[i] = true,
            }
        }
        let entities = merge_entities(candidates);

        let relationship_batches = relationships_per_chunk(&provider, &chunks, &entities).await;
        let mut relationships = Vec::new();
        for (i, batch) in relationship_batches.into_iter().enumerate() {
            match batch {
                Some(batch) => relationships.extend(batch),
                None => failed[i] = true,
            }
        }

        RawExtractionResult {
            entities,
            relationships,
            processed_text: String::new(),
            metadata: ExtractionMetadata {
                chunk_count: chunks.len(),
                failed_chunks: failed.iter().filter(|f| **f).count(),
                strategy: provider.strategy(),
                ..ExtractionMetadata::default()
            },
        }
    }
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Runs entity extraction for every chunk concurrently. Slot `i` holds the
/// result for chunk `i`, `None` when that chunk failed.
async fn entities_per_chunk(
    provider: &Arc<dyn ExtractionProvider>,
    chunks: &[String],
) -> Vec<Option<Vec<RawEntity>>> {
    let mut tasks = JoinSet::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let provider = Arc::clone(provider);
        let chunk = chunk.clone();
        tasks.spawn(async move { (index, provider.extract_entities(&chunk).await) });
    }

    let mut results = vec![None; chunks.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(entities))) => results[index] = Some(entities),
            Ok((index, Err(e))) => {
                tracing::warn!("Entity extraction failed for chunk {}: {}", index, e);
            }
            Err(e) => tracing::warn!("Entity extraction task failed: {}", e),
        }
    }
    results
}

async fn relationships_per_chunk(
    provider: &Arc<dyn ExtractionProvider>,
    chunks: &[String],
    entities: &[RawEntity],
) -> Vec<Option<Vec<RawRelationship>>> {
    let mut tasks = JoinSet::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let lower = chunk.to_lowercase();
        let known: Vec<RawEntity> = entities
            .iter()
            .filter(|e| lower.contains(&e.text.to_lowercase()))
            .cloned()
            .collect();
        let provider = Arc::clone(provider);
        let chunk = chunk.clone();
        tasks.spawn(async move { (index, provider.extract_relationships(&chunk, &known).await) });
    }

    let mut results = vec![None; chunks.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(relationships))) => results[index] = Some(relationships),
            Ok((index, Err(e))) => {
                tracing::warn!("Relationship extraction failed for chunk {}: {}", index, e);
            }
            Err(e) => tracing::warn!("Relationship extraction task failed: {}", e),
        }
    }
    results
}
