mod export;
mod mermaid;
mod stats;
mod validate;

use serde::{Deserialize, Serialize};

pub use export::{Export, ExportError, ExportFormat, ExportMetadata};
pub use mermaid::{
    connector, sanitize_identifier, sanitize_text, LayoutDirection, MermaidRenderer,
    RenderOptions, EMPTY_NOTE, PREAMBLE,
};
pub use stats::{
    AttributeCounts, ClassCounts, Complexity, DetailedStatistics, DiagramStatistics,
    MethodCounts, RelationshipCounts, StatisticsReport,
};
pub use validate::{validate, SyntaxReport};

use crate::model::{AppliedChange, Change, ChangeError, DesignModel, IssueKind, ModelIssue, ModelReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramMetadata {
    pub class_count: usize,
    pub relationship_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_direction: Option<LayoutDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDiagram {
    pub code: String,
    pub validation: SyntaxReport,
    pub metadata: DiagramMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedDiagram {
    pub diagram: GeneratedDiagram,
    pub applied: Vec<AppliedChange>,
}

/// Renders, validates, edits and exports design models with one set of
/// render options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramGenerator {
    renderer: MermaidRenderer,
}

impl DiagramGenerator {
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self {
            renderer: MermaidRenderer::new(options),
        }
    }

    pub const fn renderer(&self) -> &MermaidRenderer {
        &self.renderer
    }

    pub fn generate(&self, model: &DesignModel) -> GeneratedDiagram {
        let code = self.renderer.render(model);
        let validation = validate(&code);
        if !validation.is_valid {
            tracing::warn!("Generated diagram failed validation: {:?}", validation.errors);
        }
        GeneratedDiagram {
            code,
            validation,
            metadata: DiagramMetadata {
                class_count: model.classes().len(),
                relationship_count: model.relationships().len(),
                layout_direction: self.renderer.options().direction,
            },
        }
    }

    /// Applies `changes` in order, then renders the result.
    pub fn update(
        &self,
        model: &mut DesignModel,
        changes: &[Change],
    ) -> Result<UpdatedDiagram, ChangeError> {
        tracing::info!("Applying {} changes", changes.len());
        let applied = model.apply_changes(changes)?;
        Ok(UpdatedDiagram {
            diagram: self.generate(model),
            applied,
        })
    }

    /// Structural check of the model plus syntax findings for its rendering.
    pub fn review(&self, model: &DesignModel) -> ModelReport {
        let mut report = model.check();
        let syntax = validate(&self.renderer.render(model));
        for error in syntax.errors {
            report.push(ModelIssue::error(IssueKind::Syntax, error));
        }
        for warning in syntax.warnings {
            report.push(ModelIssue::warning(IssueKind::Syntax, warning));
        }
        report
    }

    pub fn export(&self, model: &DesignModel, format: ExportFormat) -> Result<Export, ExportError> {
        tracing::info!("Exporting diagram as {}", format);
        Export::new(model, format, &self.renderer)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{ChangeOutcome, DesignClass, DesignRelationship, RelationshipKind};

    fn user_account() -> DesignModel {
        let mut model = DesignModel::new();
        model.add_class(DesignClass::new("User"));
        model.add_class(DesignClass::new("Account"));
        model.add_relationship(DesignRelationship::new(
            "User",
            "Account",
            RelationshipKind::Composition,
        ));
        model
    }

    #[test]
    fn test_generate_with_direction() {
        let generator =
            DiagramGenerator::new(RenderOptions::new().with_direction(LayoutDirection::TopToBottom));
        let diagram = generator.generate(&user_account());

        assert!(diagram.code.starts_with("classDiagram\n    direction TB\n"));
        assert!(diagram.validation.is_valid);
        assert_eq!(diagram.metadata.class_count, 2);
        assert_eq!(diagram.metadata.layout_direction, Some(LayoutDirection::TopToBottom));
    }

    #[test]
    fn test_update_reverses_relationship() {
        let changes: Vec<Change> = [
            json!({"type": "remove_relationship", "source": "User", "target": "Account"}),
            json!({"type": "add_relationship", "source": "Account", "target": "User", "relationship_type": "association"}),
        ]
        .into_iter()
        .map(|v| Change::from_value(v).unwrap())
        .collect();

        let mut model = user_account();
        let updated = DiagramGenerator::default().update(&mut model, &changes).unwrap();

        assert!(model.find_relationship("User", "Account").is_none());
        assert_eq!(
            model.find_relationship("Account", "User").unwrap().kind,
            RelationshipKind::Association
        );
        assert!(updated.diagram.code.contains("Account \"1\" --> \"1\" User"));
        assert!(updated
            .applied
            .iter()
            .all(|a| a.outcome == ChangeOutcome::Applied));
    }

    #[test]
    fn test_review_combines_model_and_syntax_findings() {
        let mut model = user_account();
        model.add_class(DesignClass::new("Ghost"));
        model.add_relationship(DesignRelationship::new(
            "User",
            "Missing",
            RelationshipKind::Association,
        ));

        let report = DiagramGenerator::default().review(&model);
        assert!(!report.is_valid);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::MissingClass);
    }

    #[test]
    fn test_export_unsupported_format_code() {
        let err: crate::Error = "png".parse::<ExportFormat>().unwrap_err().into();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
        assert!(err.is_client_error());
    }
}
