#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod render;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use ingest::{
    DesignModelBuilder, EntityLabel, ExtractionOrchestrator, ExtractionProvider,
    ExtractionStrategy, FallbackProvider, InputError, RawEntity, RawExtractionResult,
    RawRelationship, RemoteModelProvider, RuleBasedProvider,
};
pub use model::{
    AppliedChange, Attribute, Change, ChangeError, ChangeOutcome, DesignClass, DesignModel,
    DesignRelationship, Method, ModelError, ModelReport, Point, RelationshipKind, Visibility,
};
pub use render::{
    DetailedStatistics, DiagramGenerator, DiagramStatistics, Export, ExportFormat,
    GeneratedDiagram, LayoutDirection, MermaidRenderer, RenderOptions, StatisticsReport,
    SyntaxReport, UpdatedDiagram,
};
