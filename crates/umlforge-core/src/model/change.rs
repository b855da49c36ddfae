use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::class::{Attribute, DesignClass, Method, Point};
use super::design::DesignModel;
use super::relationship::{DesignRelationship, RelationshipKind};
use super::ModelError;

#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },
    #[error(transparent)]
    NameConflict(#[from] ModelError),
    #[error("Change {index} failed: {source}")]
    Failed {
        index: usize,
        #[source]
        source: Box<ChangeError>,
    },
}

impl ChangeError {
    fn invalid(kind: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    /// Position of the failing change in a batch, if known.
    pub const fn index(&self) -> Option<usize> {
        match self {
            Self::Failed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassModifications {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub add_attributes: Vec<Attribute>,
    #[serde(default)]
    pub add_methods: Vec<Method>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipModifications {
    #[serde(default, rename = "type")]
    pub kind: Option<RelationshipKind>,
    #[serde(default)]
    pub multiplicity_source: Option<String>,
    #[serde(default)]
    pub multiplicity_target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// One incremental edit to a [`DesignModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    AddClass(DesignClass),
    RemoveClass {
        class_name: String,
    },
    ModifyClass {
        class_name: String,
        modifications: ClassModifications,
    },
    AddRelationship(DesignRelationship),
    RemoveRelationship {
        source: String,
        target: String,
    },
    ModifyRelationship {
        source: String,
        target: String,
        modifications: RelationshipModifications,
    },
    Unrecognized {
        kind: String,
    },
}

fn default_class_name() -> String {
    "NewClass".to_string()
}

fn default_multiplicity() -> String {
    "1".to_string()
}

const fn default_confidence() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct ClassPayload {
    #[serde(default = "default_class_name")]
    name: String,
    #[serde(default)]
    attributes: Vec<Attribute>,
    #[serde(default)]
    methods: Vec<Method>,
    #[serde(default)]
    position: Point,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

#[derive(Deserialize)]
struct RelationshipPayload {
    #[serde(default)]
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default, rename = "type")]
    kind: RelationshipKind,
    #[serde(default = "default_multiplicity")]
    multiplicity_source: String,
    #[serde(default = "default_multiplicity")]
    multiplicity_target: String,
    #[serde(default)]
    label: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChangeRecord {
    AddClass {
        class: ClassPayload,
    },
    RemoveClass {
        class_name: String,
    },
    ModifyClass {
        class_name: String,
        #[serde(default)]
        modifications: ClassModifications,
    },
    AddRelationship {
        relationship: RelationshipPayload,
    },
    RemoveRelationship {
        source: String,
        target: String,
    },
    ModifyRelationship {
        source: String,
        target: String,
        #[serde(default)]
        modifications: RelationshipModifications,
    },
}

const KNOWN_KINDS: &[&str] = &[
    "add_class",
    "remove_class",
    "modify_class",
    "add_relationship",
    "remove_relationship",
    "modify_relationship",
];

impl Change {
    /// Parses a `{type, ...payload}` record. Add payloads may be nested under
    /// `class`/`relationship` or given flat. Unknown types parse to
    /// [`Change::Unrecognized`].
    pub fn from_value(value: Value) -> Result<Self, ChangeError> {
        let Value::Object(mut record) = value else {
            return Err(ChangeError::invalid("change", "expected an object"));
        };
        let kind = match record.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(ChangeError::invalid("change", "missing \"type\"")),
        };
        if !KNOWN_KINDS.contains(&kind.as_str()) {
            return Ok(Self::Unrecognized { kind });
        }

        let nested = match kind.as_str() {
            "add_class" => Some("class"),
            "add_relationship" => Some("relationship"),
            _ => None,
        };
        if let Some(key) = nested {
            if !record.contains_key(key) {
                record.remove("type");
                let mut payload = std::mem::take(&mut record);
                // flat relationship records cannot reuse "type" for the kind
                if let Some(relationship_kind) = payload
                    .remove("relationship_type")
                    .or_else(|| payload.remove("kind"))
                {
                    payload.insert("type".into(), relationship_kind);
                }
                record.insert("type".into(), Value::String(kind.clone()));
                record.insert(key.into(), Value::Object(payload));
            }
        }

        let parsed: ChangeRecord = serde_json::from_value(Value::Object(record))
            .map_err(|e| ChangeError::invalid(&kind, e.to_string()))?;
        Self::from_record(parsed)
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::AddClass(_) => "add_class",
            Self::RemoveClass { .. } => "remove_class",
            Self::ModifyClass { .. } => "modify_class",
            Self::AddRelationship(_) => "add_relationship",
            Self::RemoveRelationship { .. } => "remove_relationship",
            Self::ModifyRelationship { .. } => "modify_relationship",
            Self::Unrecognized { kind } => kind,
        }
    }
}

impl Change {
    fn from_record(record: ChangeRecord) -> Result<Self, ChangeError> {
        Ok(match record {
            ChangeRecord::AddClass { class } => {
                let name = class.name.trim();
                if name.is_empty() {
                    return Err(ChangeError::invalid("add_class", "class name is empty"));
                }
                let mut built = DesignClass::new(name)
                    .with_position(class.position)
                    .with_confidence(class.confidence);
                built.attributes = class.attributes;
                built.methods = class.methods;
                Self::AddClass(built)
            }
            ChangeRecord::RemoveClass { class_name } => Self::RemoveClass { class_name },
            ChangeRecord::ModifyClass {
                class_name,
                modifications,
            } => Self::ModifyClass {
                class_name,
                modifications,
            },
            ChangeRecord::AddRelationship { relationship: r } => {
                if r.source.trim().is_empty() || r.target.trim().is_empty() {
                    return Err(ChangeError::invalid(
                        "add_relationship",
                        "source and target are required",
                    ));
                }
                Self::AddRelationship(
                    DesignRelationship::new(r.source.trim(), r.target.trim(), r.kind)
                        .with_multiplicities(r.multiplicity_source, r.multiplicity_target)
                        .with_label(r.label)
                        .with_confidence(r.confidence),
                )
            }
            ChangeRecord::RemoveRelationship { source, target } => {
                Self::RemoveRelationship { source, target }
            }
            ChangeRecord::ModifyRelationship {
                source,
                target,
                modifications,
            } => Self::ModifyRelationship {
                source,
                target,
                modifications,
            },
        })
    }
}

impl TryFrom<Value> for Change {
    type Error = ChangeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOutcome {
    Applied,
    Merged,
    NotFound,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub outcome: ChangeOutcome,
}

impl DesignModel {
    pub fn apply_change(&mut self, change: &Change) -> Result<ChangeOutcome, ChangeError> {
        let outcome = match change {
            Change::AddClass(class) => {
                if self.add_class(class.clone()) {
                    ChangeOutcome::Applied
                } else {
                    ChangeOutcome::Merged
                }
            }
            Change::RemoveClass { class_name } => found(self.remove_class(class_name)),
            Change::ModifyClass {
                class_name,
                modifications,
            } => self.modify_class(class_name, modifications)?,
            Change::AddRelationship(relationship) => {
                if self.add_relationship(relationship.clone()) {
                    ChangeOutcome::Applied
                } else {
                    ChangeOutcome::Merged
                }
            }
            Change::RemoveRelationship { source, target } => {
                found(self.remove_relationship(source, target))
            }
            Change::ModifyRelationship {
                source,
                target,
                modifications,
            } => match self.find_relationship_mut(source, target) {
                Some(relationship) => {
                    if let Some(kind) = modifications.kind {
                        relationship.kind = kind;
                    }
                    if let Some(m) = &modifications.multiplicity_source {
                        relationship.multiplicity_source.clone_from(m);
                    }
                    if let Some(m) = &modifications.multiplicity_target {
                        relationship.multiplicity_target.clone_from(m);
                    }
                    if let Some(label) = &modifications.label {
                        relationship.label.clone_from(label);
                    }
                    ChangeOutcome::Applied
                }
                None => ChangeOutcome::NotFound,
            },
            Change::Unrecognized { kind } => {
                tracing::warn!("Skipping unrecognized change type: {}", kind);
                ChangeOutcome::Skipped
            }
        };
        tracing::debug!("Change {} -> {:?}", change.kind(), outcome);
        Ok(outcome)
    }

    /// Applies changes in order. A failure at change `k` leaves changes
    /// before `k` applied and reports `k` in the error.
    pub fn apply_changes(&mut self, changes: &[Change]) -> Result<Vec<AppliedChange>, ChangeError> {
        let mut applied = Vec::with_capacity(changes.len());
        for (index, change) in changes.iter().enumerate() {
            let outcome = self
                .apply_change(change)
                .map_err(|e| ChangeError::Failed {
                    index,
                    source: Box::new(e),
                })?;
            applied.push(AppliedChange {
                index,
                kind: change.kind().to_string(),
                outcome,
            });
        }
        Ok(applied)
    }

    fn modify_class(
        &mut self,
        class_name: &str,
        modifications: &ClassModifications,
    ) -> Result<ChangeOutcome, ChangeError> {
        if self.find_class(class_name).is_none() {
            return Ok(ChangeOutcome::NotFound);
        }

        let mut current = class_name.to_string();
        if let Some(new_name) = modifications.name.as_deref() {
            if let Err(e) = self.rename_class(class_name, new_name) {
                tracing::warn!("Refusing rename of {}: {}", class_name, e);
                return Err(e.into());
            }
            current = new_name.trim().to_string();
        }

        if let Some(class) = self.find_class_mut(&current) {
            for attribute in &modifications.add_attributes {
                class.add_attribute(attribute.clone());
            }
            for method in &modifications.add_methods {
                class.add_method(method.clone());
            }
        }
        Ok(ChangeOutcome::Applied)
    }
}

const fn found(hit: bool) -> ChangeOutcome {
    if hit {
        ChangeOutcome::Applied
    } else {
        ChangeOutcome::NotFound
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> Change {
        Change::from_value(value).unwrap()
    }

    fn base_model() -> DesignModel {
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
    fn test_nested_and_flat_add_payloads() {
        let nested = parse(json!({"type": "add_class", "class": {"name": "Order"}}));
        let flat = parse(json!({"type": "add_class", "name": "Order"}));
        assert_eq!(nested, flat);

        let rel = parse(json!({
            "type": "add_relationship",
            "source": "Order",
            "target": "User",
            "relationship_type": "aggregation"
        }));
        match rel {
            Change::AddRelationship(r) => {
                assert_eq!(r.source(), "Order");
                assert_eq!(r.kind, RelationshipKind::Aggregation);
                assert_eq!(r.multiplicity_target, "1");
            }
            other => panic!("unexpected change {other:?}"),
        }

        match parse(json!({"type": "add_relationship", "source": "A", "target": "B"})) {
            Change::AddRelationship(r) => assert_eq!(r.kind, RelationshipKind::Association),
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn test_add_class_defaults_name() {
        match parse(json!({"type": "add_class", "class": {}})) {
            Change::AddClass(class) => assert_eq!(class.name(), "NewClass"),
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let change = parse(json!({"type": "rotate_class", "class_name": "User"}));
        assert_eq!(
            change,
            Change::Unrecognized {
                kind: "rotate_class".into()
            }
        );

        let mut model = base_model();
        let applied = model.apply_changes(&[change]).unwrap();
        assert_eq!(applied[0].outcome, ChangeOutcome::Skipped);
        assert_eq!(model, base_model());
    }

    #[test]
    fn test_malformed_records_rejected() {
        assert!(Change::from_value(json!(["add_class"])).is_err());
        assert!(Change::from_value(json!({"class_name": "User"})).is_err());
        assert!(Change::from_value(json!({"type": "remove_class"})).is_err());
        assert!(Change::from_value(json!({
            "type": "add_relationship",
            "relationship": {"source": "A", "target": "B", "type": "uses"}
        }))
        .is_err());
        assert!(Change::from_value(json!({
            "type": "add_relationship",
            "relationship": {"source": "A"}
        }))
        .is_err());
    }

    #[test]
    fn test_edit_pipeline_reverses_relationship() {
        let changes = vec![
            parse(json!({"type": "remove_relationship", "source": "User", "target": "Account"})),
            parse(json!({
                "type": "add_relationship",
                "relationship": {"source": "Account", "target": "User", "type": "association"}
            })),
        ];
        let mut model = base_model();
        let applied = model.apply_changes(&changes).unwrap();

        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|a| a.outcome == ChangeOutcome::Applied));
        assert!(model.find_relationship("User", "Account").is_none());
        let reverse = model.find_relationship("Account", "User").unwrap();
        assert_eq!(reverse.kind, RelationshipKind::Association);
        assert_eq!(model.relationships().len(), 1);
    }

    #[test]
    fn test_modify_class_renames_and_adds_members() {
        let change = parse(json!({
            "type": "modify_class",
            "class_name": "user",
            "modifications": {
                "name": "Customer",
                "add_attributes": [{"name": "email"}, {"name": "EMAIL"}],
                "add_methods": [{"name": "login", "return_type": "Boolean"}]
            }
        }));
        let mut model = base_model();
        assert_eq!(model.apply_change(&change).unwrap(), ChangeOutcome::Applied);

        let customer = model.find_class("Customer").unwrap();
        assert_eq!(customer.attributes.len(), 1);
        assert_eq!(customer.methods[0].return_type, "Boolean");
        assert!(model.find_relationship("Customer", "Account").is_some());
    }

    #[test]
    fn test_modify_missing_targets_are_noops() {
        let mut model = base_model();
        let changes = vec![
            parse(json!({"type": "modify_class", "class_name": "Ghost"})),
            parse(json!({
                "type": "modify_relationship",
                "source": "Account",
                "target": "User",
                "modifications": {"label": "owns"}
            })),
            parse(json!({"type": "remove_class", "class_name": "Ghost"})),
        ];
        let applied = model.apply_changes(&changes).unwrap();
        assert!(applied.iter().all(|a| a.outcome == ChangeOutcome::NotFound));
        assert_eq!(model, base_model());
    }

    #[test]
    fn test_modify_relationship_fields() {
        let mut model = base_model();
        let change = parse(json!({
            "type": "modify_relationship",
            "source": "USER",
            "target": "account",
            "modifications": {"type": "aggregation", "multiplicity_target": "0..*", "label": "holds"}
        }));
        model.apply_change(&change).unwrap();

        let rel = model.find_relationship("User", "Account").unwrap();
        assert_eq!(rel.kind, RelationshipKind::Aggregation);
        assert_eq!(rel.multiplicity_source, "1");
        assert_eq!(rel.multiplicity_target, "0..*");
        assert_eq!(rel.label, "holds");
    }

    #[test]
    fn test_failure_keeps_earlier_changes_and_reports_index() {
        let changes = vec![
            parse(json!({"type": "add_class", "name": "Order"})),
            parse(json!({
                "type": "modify_class",
                "class_name": "User",
                "modifications": {"name": "account"}
            })),
            parse(json!({"type": "add_class", "name": "Invoice"})),
        ];
        let mut model = base_model();
        let err = model.apply_changes(&changes).unwrap_err();

        assert_eq!(err.index(), Some(1));
        assert!(model.find_class("Order").is_some());
        assert!(model.find_class("Invoice").is_none());
        assert!(model.find_class("User").is_some());
    }

    #[test]
    fn test_repeated_add_class_merges() {
        let mut model = base_model();
        let change = parse(json!({"type": "add_class", "name": "user", "attributes": [{"name": "id"}]}));
        assert_eq!(model.apply_change(&change).unwrap(), ChangeOutcome::Merged);
        assert_eq!(model.classes().len(), 2);
        assert_eq!(model.find_class("User").unwrap().attributes.len(), 1);
    }
}
