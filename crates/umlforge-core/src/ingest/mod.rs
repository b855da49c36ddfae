mod builder;
mod extractor;
mod lexicon;
mod normalizer;
mod pipeline;
mod remote;
mod requirements;

pub use builder::{
    infer_attribute_type, infer_multiplicity, infer_parameters, infer_return_type,
    DesignModelBuilder,
};
pub use extractor::{
    EntityLabel, ExtractionError, ExtractionPattern, ExtractionProvider, ExtractionResult,
    ExtractionStrategy, FallbackProvider, RawEntity, RawRelationship, RelationshipPattern,
    RuleBasedProvider,
};
pub use normalizer::{
    Chunk, ChunkSettings, Chunks, DefaultNormalizer, NormalizationError, NormalizationResult,
    Normalizer,
};
pub use pipeline::{
    merge_entities, ExtractionMetadata, ExtractionOrchestrator, IngestError, IngestResult,
    RawExtractionResult,
};
pub use remote::RemoteModelProvider;
pub use requirements::{
    assess_requirements, check_length, InputError, RequirementsIssue, RequirementsReport,
    TextCounts,
};
