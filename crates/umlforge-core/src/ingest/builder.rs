use super::extractor::{EntityLabel, RawEntity, RawRelationship};
use super::lexicon;
use super::pipeline::{merge_entities, RawExtractionResult};
use crate::model::{
    Attribute, DesignClass, DesignModel, DesignRelationship, Method, Point, RelationshipKind,
};

pub const GRID_COLUMNS: usize = 4;
pub const GRID_SPACING: Point = Point::new(250.0, 200.0);

const TYPE_RULES: &[(&[&str], &str)] = &[
    (&["id", "code", "number"], "Integer"),
    (&["price", "amount", "balance", "rate"], "Float"),
    (&["date", "time", "created", "updated"], "DateTime"),
    (&["is", "has", "can", "active", "enabled"], "Boolean"),
];

const COUNT_WORDS: &[&str] = &["count", "total", "size", "number"];
const PREDICATE_VERBS: &[&str] = &["is", "has", "can", "check", "validate", "verify", "exists"];
const QUERY_VERBS: &[&str] = &[
    "get", "find", "fetch", "load", "search", "query", "retrieve", "list", "read",
];

const MANY_WORDS: &[&str] = &["many", "multiple", "various", "list", "collection", "group", "set"];

/// Maps raw extraction output onto a [`DesignModel`].
#[derive(Debug, Clone, Copy)]
pub struct DesignModelBuilder {
    columns: usize,
    spacing: Point,
}

impl DesignModelBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: GRID_COLUMNS,
            spacing: GRID_SPACING,
        }
    }

    #[must_use]
    pub const fn with_grid(mut self, columns: usize, spacing: Point) -> Self {
        self.columns = if columns == 0 { 1 } else { columns };
        self.spacing = spacing;
        self
    }

    pub fn build(&self, raw: &RawExtractionResult) -> DesignModel {
        self.build_from(&raw.entities, &raw.relationships)
    }

    pub fn build_from(&self, entities: &[RawEntity], relationships: &[RawRelationship]) -> DesignModel {
        let mut model = DesignModel::new();

        let classes = merge_entities(
            entities
                .iter()
                .filter(|e| e.label == EntityLabel::Class)
                .cloned(),
        );
        for entity in &classes {
            let name = class_name(&entity.text);
            if name.is_empty() {
                continue;
            }
            model.add_class(DesignClass::new(name).with_confidence(entity.confidence));
        }

        for entity in entities.iter().filter(|e| e.label != EntityLabel::Class) {
            let name = member_name(&entity.text);
            if name.is_empty() {
                continue;
            }
            let Some(owner) = infer_owner(&model, entity) else {
                tracing::debug!("Dropping {} {:?}: no class to own it", entity.label, name);
                continue;
            };
            let Some(class) = model.find_class_mut(&owner) else {
                continue;
            };
            if entity.label == EntityLabel::Attribute {
                let type_name = infer_attribute_type(&name);
                class.attributes.push(Attribute::new(name, type_name));
            } else {
                let method = Method::new(name.clone())
                    .with_parameters(infer_parameters(&name))
                    .with_return_type(infer_return_type(&name));
                class.methods.push(method);
            }
        }

        for raw in relationships {
            let (Some(source), Some(target)) = (
                resolve_class(&model, &raw.source),
                resolve_class(&model, &raw.target),
            ) else {
                tracing::debug!(
                    "Dropping relationship {} -> {}: unresolved endpoint",
                    raw.source,
                    raw.target
                );
                continue;
            };
            let multiplicity = infer_multiplicity(&raw.context);
            model.add_relationship(
                DesignRelationship::new(source, target, RelationshipKind::from_raw(&raw.kind))
                    .with_multiplicities(multiplicity, multiplicity)
                    .with_confidence(raw.confidence),
            );
        }

        self.post_process(&mut model);
        model
    }

    fn post_process(&self, model: &mut DesignModel) {
        for class in model.classes_mut() {
            class.dedupe_members();
        }
        let dropped = model.drop_self_loops();
        if dropped > 0 {
            tracing::debug!("Dropped {} self-referencing relationships", dropped);
        }
        model.sort();

        for (i, class) in model.classes_mut().enumerate() {
            let column = (i % self.columns) as f64;
            let row = (i / self.columns) as f64;
            class.position = Point::new(column * self.spacing.x, row * self.spacing.y);
        }
    }
}

impl Default for DesignModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn class_name(text: &str) -> String {
    let text = text.trim();
    if text.contains(char::is_whitespace) {
        text.split_whitespace().map(lexicon::capitalize).collect()
    } else {
        text.to_string()
    }
}

fn member_name(text: &str) -> String {
    text.trim()
        .trim_end_matches("()")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn resolve_class(model: &DesignModel, name: &str) -> Option<String> {
    model
        .find_class(name.trim())
        .or_else(|| model.find_class(&lexicon::singular(name.trim())))
        .map(|c| c.name().to_string())
}

/// Owner hint first, then the longest class name contained in the member
/// text, then the most confident class.
fn infer_owner(model: &DesignModel, entity: &RawEntity) -> Option<String> {
    if let Some(owner) = entity
        .owner
        .as_deref()
        .and_then(|hint| resolve_class(model, hint))
    {
        return Some(owner);
    }

    let text = entity.text.to_lowercase();
    let mut by_substring: Option<&DesignClass> = None;
    for class in model.classes() {
        if !text.contains(&class.name().to_lowercase()) {
            continue;
        }
        if by_substring.is_none_or(|best| class.name().len() > best.name().len()) {
            by_substring = Some(class);
        }
    }
    if let Some(class) = by_substring {
        return Some(class.name().to_string());
    }

    let mut most_confident: Option<&DesignClass> = None;
    for class in model.classes() {
        if most_confident.is_none_or(|best| class.confidence > best.confidence) {
            most_confident = Some(class);
        }
    }
    most_confident.map(|c| c.name().to_string())
}

fn keyword_matches(keyword: &str, token: &str) -> bool {
    token == keyword || (keyword.len() >= 4 && token.starts_with(keyword))
}

pub fn infer_attribute_type(name: &str) -> &'static str {
    let tokens = lexicon::tokens(name);
    TYPE_RULES
        .iter()
        .find(|(keywords, _)| {
            keywords
                .iter()
                .any(|k| tokens.iter().any(|t| keyword_matches(k, t)))
        })
        .map_or("String", |(_, type_name)| *type_name)
}

/// `name` starts with `verb` followed by nothing, a separator, a digit or
/// an uppercase hump.
fn has_verb_prefix(name: &str, verb: &str) -> bool {
    if name.len() < verb.len() || !name.is_char_boundary(verb.len()) {
        return false;
    }
    if !name[..verb.len()].eq_ignore_ascii_case(verb) {
        return false;
    }
    name[verb.len()..].chars().next().is_none_or(|c| {
        c == '_' || c == '-' || c.is_whitespace() || c.is_uppercase() || c.is_ascii_digit()
    })
}

pub fn infer_parameters(name: &str) -> Vec<String> {
    let parameter = if has_verb_prefix(name, "get") {
        None
    } else if has_verb_prefix(name, "set") || has_verb_prefix(name, "update") {
        Some("value")
    } else if has_verb_prefix(name, "create") {
        Some("data")
    } else if has_verb_prefix(name, "delete") {
        Some("id")
    } else {
        None
    };
    parameter.into_iter().map(String::from).collect()
}

pub fn infer_return_type(name: &str) -> &'static str {
    let tokens = lexicon::tokens(name);
    if tokens.iter().any(|t| COUNT_WORDS.contains(&t.as_str())) {
        return "Integer";
    }
    match tokens.first().map(String::as_str) {
        Some(first) if PREDICATE_VERBS.contains(&first) => "Boolean",
        Some(first) if QUERY_VERBS.contains(&first) => "Object",
        _ => "void",
    }
}

/// Multiplicity hinted by the sentence a relationship came from. Applied to
/// both ends alike.
pub fn infer_multiplicity(context: &str) -> &'static str {
    let lower = context.to_lowercase();
    let mut words = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty());
    if words.any(|w| {
        MANY_WORDS
            .iter()
            .any(|m| w == *m || w.strip_suffix('s') == Some(*m))
    }) {
        return "1..*";
    }
    if lower.contains("optional") || lower.contains("may have") || lower.contains("can have") {
        return "0..1";
    }
    "1"
}
