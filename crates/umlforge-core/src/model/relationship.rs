use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Composition,
    Aggregation,
    #[default]
    Association,
    Inheritance,
}

impl RelationshipKind {
    pub const ALL: [Self; 4] = [
        Self::Composition,
        Self::Aggregation,
        Self::Association,
        Self::Inheritance,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Composition => "composition",
            Self::Aggregation => "aggregation",
            Self::Association => "association",
            Self::Inheritance => "inheritance",
        }
    }

    /// Lenient mapping for provider output: anything unrecognized is an
    /// association.
    pub fn from_raw(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::debug!("Unknown relationship kind {:?}, using association", raw);
            Self::Association
        })
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "composition" => Ok(Self::Composition),
            "aggregation" => Ok(Self::Aggregation),
            "association" => Ok(Self::Association),
            "inheritance" => Ok(Self::Inheritance),
            _ => Err(crate::Error::InvalidRelationshipKind(s.to_string())),
        }
    }
}

fn default_multiplicity() -> String {
    "1".to_string()
}

const fn default_confidence() -> f64 {
    1.0
}

/// Directed relationship between two classes, keyed by the case-insensitive
/// (source, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRelationship {
    source: String,
    target: String,
    #[serde(rename = "type", default)]
    pub kind: RelationshipKind,
    #[serde(default = "default_multiplicity")]
    pub multiplicity_source: String,
    #[serde(default = "default_multiplicity")]
    pub multiplicity_target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl DesignRelationship {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            multiplicity_source: default_multiplicity(),
            multiplicity_target: default_multiplicity(),
            label: String::new(),
            confidence: 1.0,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub(crate) fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub(crate) fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    #[must_use]
    pub fn with_multiplicities(
        mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.multiplicity_source = source.into();
        self.multiplicity_target = target.into();
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source.to_lowercase() == self.target.to_lowercase()
    }

    /// Whether either endpoint names `class` (ignoring case).
    pub fn touches(&self, class: &str) -> bool {
        let class = class.to_lowercase();
        self.source.to_lowercase() == class || self.target.to_lowercase() == class
    }

    pub(crate) fn key(&self) -> (String, String) {
        (self.source.to_lowercase(), self.target.to_lowercase())
    }
}
