use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::lexicon::{self, AUXILIARY_VERBS, CAPITALIZED_STOPWORDS, FILLER_WORDS};
use crate::model::RelationshipKind;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Failed(String),
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Context too long: {0} bytes (max: {1})")]
    ContextTooLong(usize, usize),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityLabel {
    Class,
    Attribute,
    Method,
}

impl EntityLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "CLASS",
            Self::Attribute => "ATTRIBUTE",
            Self::Method => "METHOD",
        }
    }

    /// Model labels other than ATTRIBUTE and METHOD are treated as classes.
    pub fn from_model_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "ATTRIBUTE" => Self::Attribute,
            "METHOD" => Self::Method,
            _ => Self::Class,
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub text: String,
    pub label: EntityLabel,
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    #[serde(default, rename = "belongs_to", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl RawEntity {
    #[must_use]
    pub fn new(text: impl Into<String>, label: EntityLabel, confidence: f64) -> Self {
        Self {
            text: text.into(),
            label,
            confidence: confidence.clamp(0.0, 1.0),
            start: 0,
            end: 0,
            owner: None,
        }
    }

    #[must_use]
    pub const fn with_span(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelationship {
    pub source: String,
    pub target: String,
    pub kind: String,
    pub confidence: f64,
    #[serde(default)]
    pub context: String,
}

impl RawRelationship {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: kind.into(),
            confidence: confidence.clamp(0.0, 1.0),
            context: String::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    #[default]
    RuleBased,
    Model,
    Hybrid,
}

impl ExtractionStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::Model => "model",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Source of candidate entities and relationships for one chunk of text.
#[async_trait::async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn strategy(&self) -> ExtractionStrategy;

    fn is_available(&self) -> bool {
        true
    }

    async fn extract_entities(&self, text: &str) -> ExtractionResult<Vec<RawEntity>>;

    async fn extract_relationships(
        &self,
        text: &str,
        known: &[RawEntity],
    ) -> ExtractionResult<Vec<RawRelationship>>;
}

/// Entity pattern. Named groups `name`, `owner` and `object` are honored
/// when present; otherwise the whole match is the entity text.
pub struct ExtractionPattern {
    pub label: EntityLabel,
    pub regex: regex::Regex,
    pub confidence: f64,
}

impl ExtractionPattern {
    pub fn new(label: EntityLabel, pattern: &str, confidence: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            label,
            regex: regex::Regex::new(pattern)?,
            confidence,
        })
    }
}

pub struct RelationshipPattern {
    pub kind: RelationshipKind,
    pub regex: regex::Regex,
    pub source_group: usize,
    pub target_group: usize,
}

impl RelationshipPattern {
    pub fn new(
        kind: RelationshipKind,
        pattern: &str,
        source_group: usize,
        target_group: usize,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            regex: regex::Regex::new(pattern)?,
            source_group,
            target_group,
        })
    }
}

const CLASS_CONFIDENCE: f64 = 0.6;
const MEMBER_CONFIDENCE: f64 = 0.5;
const BASE_RELATIONSHIP_CONFIDENCE: f64 = 0.7;
const STRONG_INDICATOR_BONUS: f64 = 0.1;
const HEDGE_PENALTY: f64 = 0.2;
const MIN_RELATIONSHIP_CONFIDENCE: f64 = 0.1;

const HEDGE_WORDS: &[&str] = &["maybe", "perhaps", "possibly", "could", "might"];
const OBJECT_STOPWORDS: &[&str] = &["with", "from", "into", "for", "and", "via", "using"];
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

const DETERMINERS: &str = r"(?:(?:an?|the|one|each|every|its|their|some)\s+)*";
const MODAL: &str = r"(?:(?:can|could|may|might|must|should|will|would)\s+)?";

const CLASS_SHAPES: &[&str] = &[
    r"\b[A-Z][a-z][a-zA-Z0-9]*\b",
    r"\b[a-z][a-z0-9]*[A-Z][A-Za-z0-9]*\b",
    r"\b[A-Za-z][A-Za-z0-9]*_[A-Za-z0-9_]+\b",
    r"\b[A-Z]{3,}\b",
];

const ATTRIBUTE_SHAPES: &[&str] = &[
    r"\b(?P<name>[a-z][a-z_]*)\s+(?:of|for)\s+(?:(?:the|a|an|each|every)\s+)?(?P<owner>[A-Za-z][A-Za-z_]*)",
    r"\b(?P<owner>[A-Z][A-Za-z_]*)'s\s+(?P<name>[a-z][A-Za-z_]*)",
    r"\b(?P<name>[a-z][A-Za-z_]*)\s+(?:attribute|field|property)\b",
];

const METHOD_SHAPES: &[&str] = &[
    r"\b(?P<owner>[A-Za-z]+)\s+(?:can|should|will|must)\s+(?P<name>[a-z]+)(?:\s+(?:(?:an?|the)\s+)?(?P<object>[A-Za-z]+))?",
    r"(?i)\b(?P<name>login|logout|register|create|update|delete|save|calculate|validate|check|send|receive|search|cancel|approve|submit)\b",
];

/// Pattern-based provider used when no model is configured or the model fails.
pub struct RuleBasedProvider {
    patterns: Vec<ExtractionPattern>,
    relationship_patterns: Vec<RelationshipPattern>,
}

impl RuleBasedProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            patterns: Vec::new(),
            relationship_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: ExtractionPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn with_relationship_pattern(mut self, pattern: RelationshipPattern) -> Self {
        self.relationship_patterns.push(pattern);
        self
    }

    #[must_use]
    pub fn with_default_patterns() -> Self {
        let mut provider = Self::new();

        let shapes = CLASS_SHAPES
            .iter()
            .map(|p| (EntityLabel::Class, *p, CLASS_CONFIDENCE))
            .chain(
                ATTRIBUTE_SHAPES
                    .iter()
                    .map(|p| (EntityLabel::Attribute, *p, MEMBER_CONFIDENCE)),
            )
            .chain(
                METHOD_SHAPES
                    .iter()
                    .map(|p| (EntityLabel::Method, *p, MEMBER_CONFIDENCE)),
            );
        for (label, pattern, confidence) in shapes {
            if let Ok(p) = ExtractionPattern::new(label, pattern, confidence) {
                provider.patterns.push(p);
            }
        }

        let (det, modal) = (DETERMINERS, MODAL);
        let relationships = [
            (
                RelationshipKind::Aggregation,
                format!(
                    r"(?i)\b(\w+)\s+{modal}(?:has|have|holds?|keeps?)\s+(?:multiple|many|several)\s+(\w+)"
                ),
                1,
                2,
            ),
            (
                RelationshipKind::Aggregation,
                r"(?i)\b(\w+)\s+(?:is\s+|are\s+)?(?:(?:an?|the)\s+)?(?:collection|group|set)\s+of\s+(\w+)"
                    .to_string(),
                1,
                2,
            ),
            (
                RelationshipKind::Aggregation,
                format!(
                    r"(?i)\b(?:many|multiple|various|several)\s+(\w+)\s+(?:belong\s+to|are\s+in)\s+{det}(\w+)"
                ),
                2,
                1,
            ),
            (
                RelationshipKind::Composition,
                format!(
                    r"(?i)\b(\w+)\s+{modal}(?:contains?|owns?|manages?|has|have)\s+{det}(\w+)"
                ),
                1,
                2,
            ),
            (
                RelationshipKind::Composition,
                format!(r"(?i)\b(\w+)\s+(?:is|are)\s+(?:an?\s+)?part\s+of\s+{det}(\w+)"),
                2,
                1,
            ),
            (
                RelationshipKind::Inheritance,
                r"(?i)\b(\w+)\s+(?:extends|inherits\s+from|is\s+a\s+type\s+of|is\s+a\s+kind\s+of|is\s+an?)\s+(\w+)"
                    .to_string(),
                1,
                2,
            ),
            (
                RelationshipKind::Association,
                format!(
                    r"(?i)\b(\w+)\s+{modal}(?:uses?|references?|connects\s+to|links\s+to|talks\s+to|communicates\s+with|depends\s+on|interacts\s+with)\s+{det}(\w+)"
                ),
                1,
                2,
            ),
        ];
        for (kind, pattern, source, target) in relationships {
            if let Ok(p) = RelationshipPattern::new(kind, &pattern, source, target) {
                provider.relationship_patterns.push(p);
            }
        }

        provider
    }

    fn class_candidates(&self, text: &str) -> Vec<RawEntity> {
        let mut classes = Vec::new();
        for pattern in self.patterns.iter().filter(|p| p.label == EntityLabel::Class) {
            for m in pattern.regex.find_iter(text) {
                let word = m.as_str();
                if word.chars().count() <= 2 || lexicon::is_stopword(word, CAPITALIZED_STOPWORDS) {
                    continue;
                }
                classes.push(
                    RawEntity::new(word, EntityLabel::Class, pattern.confidence)
                        .with_span(m.start(), m.end()),
                );
            }
        }
        classes
    }

    fn member_candidates(&self, text: &str, classes: &KnownNames<'_>) -> Vec<RawEntity> {
        let mut members = Vec::new();
        for pattern in self.patterns.iter().filter(|p| p.label != EntityLabel::Class) {
            for caps in pattern.regex.captures_iter(text) {
                let Some(matched) = caps.name("name").or_else(|| caps.get(0)) else {
                    continue;
                };
                let word = matched.as_str();
                if word.chars().count() <= 2 || lexicon::is_stopword(word, FILLER_WORDS) {
                    continue;
                }
                if pattern.label == EntityLabel::Method
                    && lexicon::is_stopword(word, AUXILIARY_VERBS)
                {
                    continue;
                }

                let name = match (pattern.label, caps.name("object")) {
                    (EntityLabel::Method, Some(object)) if is_object_word(object.as_str()) => {
                        format!(
                            "{}{}",
                            word.to_lowercase(),
                            lexicon::capitalize(&lexicon::singular(object.as_str()))
                        )
                    }
                    (EntityLabel::Method, _) => word.to_lowercase(),
                    _ => word.to_string(),
                };

                let mut entity = RawEntity::new(name, pattern.label, pattern.confidence)
                    .with_span(matched.start(), matched.end());
                if let Some(owner) = caps.name("owner").and_then(|o| classes.resolve(o.as_str())) {
                    entity = entity.with_owner(owner);
                }
                members.push(entity);
            }
        }
        members
    }
}

impl Default for RuleBasedProvider {
    fn default() -> Self {
        Self::with_default_patterns()
    }
}

#[async_trait::async_trait]
impl ExtractionProvider for RuleBasedProvider {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::RuleBased
    }

    async fn extract_entities(&self, text: &str) -> ExtractionResult<Vec<RawEntity>> {
        let mut entities = self.class_candidates(text);
        let members = {
            let known = KnownNames::new(&entities);
            self.member_candidates(text, &known)
        };
        entities.extend(members);
        Ok(entities)
    }

    async fn extract_relationships(
        &self,
        text: &str,
        known: &[RawEntity],
    ) -> ExtractionResult<Vec<RawRelationship>> {
        let names = KnownNames::new(known);
        let mut claimed = HashSet::new();
        let mut relationships = Vec::new();

        for pattern in &self.relationship_patterns {
            for caps in pattern.regex.captures_iter(text) {
                let (Some(whole), Some(source), Some(target)) = (
                    caps.get(0),
                    caps.get(pattern.source_group),
                    caps.get(pattern.target_group),
                ) else {
                    continue;
                };
                let (Some(source), Some(target)) =
                    (names.resolve(source.as_str()), names.resolve(target.as_str()))
                else {
                    continue;
                };
                let key = (source.to_lowercase(), target.to_lowercase());
                if key.0 == key.1 || !claimed.insert(key) {
                    continue;
                }

                let context = enclosing_sentence(text, whole.start(), whole.end());
                relationships.push(
                    RawRelationship::new(
                        source,
                        target,
                        pattern.kind.as_str(),
                        calibrate(pattern.kind, context),
                    )
                    .with_context(context),
                );
            }
        }

        Ok(relationships)
    }
}

/// Case-insensitive lookup of entity names, also keyed by naive singular.
struct KnownNames<'a> {
    by_key: HashMap<String, &'a str>,
}

impl<'a> KnownNames<'a> {
    fn new(entities: &'a [RawEntity]) -> Self {
        let mut by_key = HashMap::new();
        for entity in entities {
            by_key
                .entry(entity.text.to_lowercase())
                .or_insert(entity.text.as_str());
        }
        for entity in entities {
            by_key
                .entry(lexicon::singular(&entity.text))
                .or_insert(entity.text.as_str());
        }
        Self { by_key }
    }

    fn resolve(&self, word: &str) -> Option<&'a str> {
        let lower = word.to_lowercase();
        self.by_key
            .get(&lower)
            .or_else(|| self.by_key.get(&lexicon::singular(&lower)))
            .copied()
    }
}

fn is_object_word(word: &str) -> bool {
    word.chars().count() > 2
        && !lexicon::is_stopword(word, FILLER_WORDS)
        && !lexicon::is_stopword(word, OBJECT_STOPWORDS)
}

fn strong_indicators(kind: RelationshipKind) -> &'static [&'static str] {
    match kind {
        RelationshipKind::Composition => &["contains", "owns", "manages", "controls", "part of"],
        RelationshipKind::Aggregation => {
            &["has multiple", "has many", "has several", "collection of", "group of"]
        }
        RelationshipKind::Inheritance => &["extends", "inherits", "is a type of", "is a kind of"],
        RelationshipKind::Association => &["uses", "references", "connects", "depends on"],
    }
}

fn calibrate(kind: RelationshipKind, context: &str) -> f64 {
    let lower = context.to_lowercase();
    let mut confidence = BASE_RELATIONSHIP_CONFIDENCE;
    if strong_indicators(kind).iter().any(|w| lower.contains(w)) {
        confidence += STRONG_INDICATOR_BONUS;
    }
    if lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| HEDGE_WORDS.contains(&w))
    {
        confidence = (confidence - HEDGE_PENALTY).max(MIN_RELATIONSHIP_CONFIDENCE);
    }
    confidence.min(1.0)
}

fn enclosing_sentence(text: &str, start: usize, end: usize) -> &str {
    let from = text[..start]
        .rfind(SENTENCE_TERMINATORS)
        .map_or(0, |i| i + 1);
    let to = text[end..]
        .find(SENTENCE_TERMINATORS)
        .map_or(text.len(), |i| end + i + 1);
    text[from..to].trim()
}

/// Provider handed to the orchestrator: tries the primary model when one is
/// configured and defers to the rule-based extractor otherwise.
pub struct FallbackProvider {
    primary: Option<Arc<dyn ExtractionProvider>>,
    fallback: RuleBasedProvider,
}

impl FallbackProvider {
    #[must_use]
    pub fn new(primary: Option<Arc<dyn ExtractionProvider>>) -> Self {
        Self {
            primary,
            fallback: RuleBasedProvider::with_default_patterns(),
        }
    }

    #[must_use]
    pub fn rule_based_only() -> Self {
        Self::new(None)
    }

    pub fn has_primary(&self) -> bool {
        self.primary.as_ref().is_some_and(|p| p.is_available())
    }
}

impl Default for FallbackProvider {
    fn default() -> Self {
        Self::rule_based_only()
    }
}

#[async_trait::async_trait]
impl ExtractionProvider for FallbackProvider {
    fn strategy(&self) -> ExtractionStrategy {
        if self.has_primary() {
            ExtractionStrategy::Hybrid
        } else {
            ExtractionStrategy::RuleBased
        }
    }

    async fn extract_entities(&self, text: &str) -> ExtractionResult<Vec<RawEntity>> {
        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            match primary.extract_entities(text).await {
                Ok(entities) if !entities.is_empty() => return Ok(entities),
                Ok(_) => tracing::debug!("Model returned no entities, using rule-based extraction"),
                Err(ExtractionError::ModelUnavailable(reason)) => {
                    tracing::debug!("Model unavailable ({}), using rule-based extraction", reason);
                }
                Err(e) => tracing::warn!("Model entity extraction failed: {}", e),
            }
        }
        self.fallback.extract_entities(text).await
    }

    async fn extract_relationships(
        &self,
        text: &str,
        known: &[RawEntity],
    ) -> ExtractionResult<Vec<RawRelationship>> {
        if let Some(primary) = self.primary.as_ref().filter(|p| p.is_available()) {
            match primary.extract_relationships(text, known).await {
                Ok(relationships) if !relationships.is_empty() => return Ok(relationships),
                Ok(_) => tracing::debug!(
                    "Model returned no relationships, using rule-based extraction"
                ),
                Err(ExtractionError::ModelUnavailable(reason)) => {
                    tracing::debug!("Model unavailable ({}), using rule-based extraction", reason);
                }
                Err(e) => tracing::warn!("Model relationship extraction failed: {}", e),
            }
        }
        self.fallback.extract_relationships(text, known).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_texts(entities: &[RawEntity], label: EntityLabel) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.text.as_str())
            .collect()
    }

    fn known(names: &[&str]) -> Vec<RawEntity> {
        names
            .iter()
            .map(|n| RawEntity::new(*n, EntityLabel::Class, 0.9))
            .collect()
    }

    struct FixedProvider {
        entities: ExtractionResult<Vec<RawEntity>>,
    }

    #[async_trait::async_trait]
    impl ExtractionProvider for FixedProvider {
        fn strategy(&self) -> ExtractionStrategy {
            ExtractionStrategy::Model
        }

        async fn extract_entities(&self, _text: &str) -> ExtractionResult<Vec<RawEntity>> {
            match &self.entities {
                Ok(entities) => Ok(entities.clone()),
                Err(_) => Err(ExtractionError::Failed("model crashed".into())),
            }
        }

        async fn extract_relationships(
            &self,
            _text: &str,
            _known: &[RawEntity],
        ) -> ExtractionResult<Vec<RawRelationship>> {
            Err(ExtractionError::ModelUnavailable("offline".into()))
        }
    }

    struct OfflineProvider;

    #[async_trait::async_trait]
    impl ExtractionProvider for OfflineProvider {
        fn strategy(&self) -> ExtractionStrategy {
            ExtractionStrategy::Model
        }

        fn is_available(&self) -> bool {
            false
        }

        async fn extract_entities(&self, _text: &str) -> ExtractionResult<Vec<RawEntity>> {
            Err(ExtractionError::ModelUnavailable("offline".into()))
        }

        async fn extract_relationships(
            &self,
            _text: &str,
            _known: &[RawEntity],
        ) -> ExtractionResult<Vec<RawRelationship>> {
            Err(ExtractionError::ModelUnavailable("offline".into()))
        }
    }

    #[test]
    fn test_label_from_model() {
        assert_eq!(EntityLabel::from_model_label("attribute"), EntityLabel::Attribute);
        assert_eq!(EntityLabel::from_model_label("METHOD"), EntityLabel::Method);
        assert_eq!(EntityLabel::from_model_label("ORG"), EntityLabel::Class);
    }

    #[tokio::test]
    async fn test_rule_based_class_candidates() {
        let provider = RuleBasedProvider::with_default_patterns();
        let entities = provider
            .extract_entities("The Customer places an Order. Each OrderItem has a SKU.")
            .await
            .unwrap();

        let classes = entity_texts(&entities, EntityLabel::Class);
        assert!(classes.contains(&"Customer"));
        assert!(classes.contains(&"Order"));
        assert!(classes.contains(&"OrderItem"));
        assert!(classes.contains(&"SKU"));
        assert!(!classes.contains(&"The"));
        assert!(!classes.contains(&"Each"));
        assert!(entities
            .iter()
            .filter(|e| e.label == EntityLabel::Class)
            .all(|e| (e.confidence - 0.6).abs() < f64::EPSILON));
    }

    #[tokio::test]
    async fn test_rule_based_members_with_owner_hints() {
        let provider = RuleBasedProvider::with_default_patterns();
        let entities = provider
            .extract_entities("Customers can place orders. The Customer's email is unique.")
            .await
            .unwrap();

        let method = entities
            .iter()
            .find(|e| e.label == EntityLabel::Method && e.text == "placeOrder")
            .unwrap();
        assert_eq!(method.owner.as_deref(), Some("Customers"));

        let attribute = entities
            .iter()
            .find(|e| e.label == EntityLabel::Attribute && e.text == "email")
            .unwrap();
        assert_eq!(attribute.owner.as_deref(), Some("Customer"));
    }

    #[tokio::test]
    async fn test_relationship_patterns() {
        let provider = RuleBasedProvider::with_default_patterns();
        let known = known(&["Customer", "Order", "Admin", "User", "Wheel", "Car"]);
        let text = "A Customer has multiple Orders. Admin is a type of User. \
                    A Wheel is part of the Car.";
        let relationships = provider.extract_relationships(text, &known).await.unwrap();

        let find = |s: &str, t: &str| {
            relationships
                .iter()
                .find(|r| r.source == s && r.target == t)
                .unwrap()
        };
        let orders = find("Customer", "Order");
        assert_eq!(orders.kind, "aggregation");
        assert!((orders.confidence - 0.8).abs() < 1e-9);
        assert_eq!(orders.context, "A Customer has multiple Orders.");

        assert_eq!(find("Admin", "User").kind, "inheritance");
        assert_eq!(find("Car", "Wheel").kind, "composition");
        assert_eq!(relationships.len(), 3);
    }

    #[tokio::test]
    async fn test_membership_phrases_aggregate_into_the_whole() {
        let provider = RuleBasedProvider::with_default_patterns();
        let known = known(&["Book", "Library"]);

        for text in ["Many Books belong to a Library.", "Multiple Books are in Library."] {
            let relationships = provider.extract_relationships(text, &known).await.unwrap();
            assert_eq!(relationships.len(), 1, "{text}");
            assert_eq!(relationships[0].source, "Library");
            assert_eq!(relationships[0].target, "Book");
            assert_eq!(relationships[0].kind, "aggregation");
        }
    }

    #[tokio::test]
    async fn test_hedged_relationship_confidence() {
        let provider = RuleBasedProvider::with_default_patterns();
        let relationships = provider
            .extract_relationships("A Library might contain Books.", &known(&["Library", "Book"]))
            .await
            .unwrap();

        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].target, "Book");
        assert!((relationships[0].confidence - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_words_are_discarded() {
        let provider = RuleBasedProvider::with_default_patterns();
        let relationships = provider
            .extract_relationships("The Customer uses a Voucher.", &known(&["Customer"]))
            .await
            .unwrap();
        assert!(relationships.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_on_primary_error() {
        let provider = FallbackProvider::new(Some(Arc::new(FixedProvider {
            entities: Err(ExtractionError::Failed(String::new())),
        })));
        let entities = provider
            .extract_entities("A Customer places an Order.")
            .await
            .unwrap();
        assert!(entity_texts(&entities, EntityLabel::Class).contains(&"Customer"));
    }

    #[tokio::test]
    async fn test_fallback_on_empty_primary_result() {
        let provider = FallbackProvider::new(Some(Arc::new(FixedProvider {
            entities: Ok(Vec::new()),
        })));
        let entities = provider
            .extract_entities("A Customer places an Order.")
            .await
            .unwrap();
        assert!(!entities.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_primary_reports_rule_based() {
        let provider = FallbackProvider::new(Some(Arc::new(OfflineProvider)));
        assert!(!provider.has_primary());
        assert_eq!(provider.strategy(), ExtractionStrategy::RuleBased);

        let entities = provider
            .extract_entities("A Customer places an Order.")
            .await
            .unwrap();
        assert!(entity_texts(&entities, EntityLabel::Class).contains(&"Customer"));
    }

    #[tokio::test]
    async fn test_primary_result_preferred() {
        let provider = FallbackProvider::new(Some(Arc::new(FixedProvider {
            entities: Ok(vec![RawEntity::new("Invoice", EntityLabel::Class, 0.95)]),
        })));
        assert_eq!(provider.strategy(), ExtractionStrategy::Hybrid);

        let entities = provider
            .extract_entities("A Customer places an Order.")
            .await
            .unwrap();
        assert_eq!(entity_texts(&entities, EntityLabel::Class), vec!["Invoice"]);

        let relationships = provider
            .extract_relationships("A Customer has many Orders.", &known(&["Customer", "Order"]))
            .await
            .unwrap();
        assert_eq!(relationships.len(), 1);
    }
}
