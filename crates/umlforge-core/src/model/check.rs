use std::collections::{HashMap, HashSet};

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};

use super::design::DesignModel;
use super::relationship::RelationshipKind;

const SUGGESTION_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateClass,
    MissingClass,
    SelfReference,
    InheritanceCycle,
    Syntax,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl ModelIssue {
    #[must_use]
    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: Severity::Error,
            relationship: None,
        }
    }

    #[must_use]
    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    #[must_use]
    pub fn with_relationship(mut self, source: &str, target: &str) -> Self {
        self.relationship = Some(format!("{source} -> {target}"));
        self
    }
}

/// Structural findings for a model. Errors make it invalid; warnings and
/// suggestions do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    pub is_valid: bool,
    pub issues: Vec<ModelIssue>,
    pub warnings: Vec<ModelIssue>,
    pub suggestions: Vec<String>,
}

impl Default for ModelReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

impl ModelReport {
    pub fn push(&mut self, issue: ModelIssue) {
        match issue.severity {
            Severity::Error => {
                self.is_valid = false;
                self.issues.push(issue);
            }
            Severity::Warning => self.warnings.push(issue),
        }
    }
}

impl DesignModel {
    /// Reports duplicate names, dangling relationship endpoints, self
    /// references and inheritance cycles.
    pub fn check(&self) -> ModelReport {
        let mut report = ModelReport::default();

        let mut seen = HashSet::new();
        if !self
            .classes()
            .iter()
            .all(|c| seen.insert(c.name().to_lowercase()))
        {
            report.push(ModelIssue::error(
                IssueKind::DuplicateClass,
                "Duplicate class names found",
            ));
        }

        for rel in self.relationships() {
            for (role, name) in [("source", rel.source()), ("target", rel.target())] {
                if self.find_class(name).is_some() {
                    continue;
                }
                let mut message = format!("Relationship {role} class \"{name}\" not found");
                if let Some(candidate) = self.closest_class_name(name) {
                    message.push_str(&format!(" (did you mean \"{candidate}\"?)"));
                }
                report.push(
                    ModelIssue::error(IssueKind::MissingClass, message)
                        .with_relationship(rel.source(), rel.target()),
                );
            }

            if rel.is_self_loop() {
                report.push(
                    ModelIssue::warning(
                        IssueKind::SelfReference,
                        format!("Self-referencing relationship in class \"{}\"", rel.source()),
                    )
                    .with_relationship(rel.source(), rel.target()),
                );
            }
        }

        if self.has_inheritance_cycle() {
            report.push(ModelIssue::warning(
                IssueKind::InheritanceCycle,
                "Inheritance relationships form a cycle",
            ));
        }

        if self.classes().is_empty() {
            report
                .suggestions
                .push("Consider adding at least one class to create a meaningful diagram".into());
        }
        if self.relationships().is_empty() && self.classes().len() > 1 {
            report.suggestions.push(
                "Consider adding relationships between classes to show system structure".into(),
            );
        }

        report
    }

    fn closest_class_name(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.classes()
            .iter()
            .map(|c| {
                (
                    c.name(),
                    strsim::normalized_levenshtein(&lower, &c.name().to_lowercase()),
                )
            })
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate)
    }

    fn has_inheritance_cycle(&self) -> bool {
        let mut graph = DiGraph::<(), ()>::new();
        let mut nodes = HashMap::new();
        for rel in self.relationships() {
            if rel.kind != RelationshipKind::Inheritance || rel.is_self_loop() {
                continue;
            }
            let mut node = |name: &str| {
                *nodes
                    .entry(name.to_lowercase())
                    .or_insert_with(|| graph.add_node(()))
            };
            let (source, target) = (node(rel.source()), node(rel.target()));
            graph.add_edge(source, target, ());
        }
        is_cyclic_directed(&graph)
    }
}
