use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::model::Severity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Text is required")]
    MissingText,
    #[error("Text too short ({length} characters, minimum {minimum} required)")]
    TextTooShort { length: usize, minimum: usize },
    #[error("Text too long ({length} characters, maximum {maximum} allowed)")]
    TextTooLong { length: usize, maximum: usize },
}

/// Length gate applied to trimmed input before any processing.
pub fn check_length(text: &str, config: &PipelineConfig) -> Result<(), InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::MissingText);
    }
    let length = trimmed.chars().count();
    if length < config.min_text_length {
        return Err(InputError::TextTooShort {
            length,
            minimum: config.min_text_length,
        });
    }
    if length > config.max_text_length {
        return Err(InputError::TextTooLong {
            length,
            maximum: config.max_text_length,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsIssue {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub severity: Severity,
}

impl RequirementsIssue {
    fn new(kind: &str, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextCounts {
    pub character_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
}

impl TextCounts {
    pub fn of(text: &str) -> Self {
        Self {
            character_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            sentence_count: text
                .split(['.', '!', '?'])
                .filter(|s| !s.trim().is_empty())
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementsReport {
    pub is_valid: bool,
    pub issues: Vec<RequirementsIssue>,
    pub suggestions: Vec<String>,
    pub statistics: TextCounts,
}

const MEANINGFUL_INDICATORS: &[&str] = &[
    "class", "user", "system", "has", "contains", "manages", "interface",
];

/// Checks whether a text is worth sending through extraction. Never fails;
/// problems are reported as issues.
pub fn assess_requirements(text: &str, config: &PipelineConfig) -> RequirementsReport {
    let text = text.trim();
    let lower = text.to_lowercase();
    let statistics = TextCounts::of(text);
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    match check_length(text, config) {
        Ok(()) => {}
        Err(InputError::MissingText | InputError::TextTooShort { .. }) => {
            issues.push(RequirementsIssue::new(
                "length",
                "Text is too short for meaningful class extraction",
                Severity::Error,
            ));
        }
        Err(InputError::TextTooLong { .. }) => {
            issues.push(RequirementsIssue::new(
                "length",
                "Text exceeds maximum length limit",
                Severity::Error,
            ));
        }
    }

    if !MEANINGFUL_INDICATORS.iter().any(|w| lower.contains(w)) {
        issues.push(RequirementsIssue::new(
            "content",
            "Text may not contain sufficient software requirements for class extraction",
            Severity::Warning,
        ));
        suggestions.push(
            "Consider adding more specific requirements about classes, relationships, or system components"
                .to_string(),
        );
    }

    if lower.contains("user") && lower.contains("login") {
        suggestions.push(
            "Detected user authentication patterns - consider User, Account, or Login classes"
                .to_string(),
        );
    }
    if lower.contains("data") {
        suggestions.push(
            "Detected data-related requirements - consider DataModel or Repository classes"
                .to_string(),
        );
    }

    RequirementsReport {
        is_valid: !issues.iter().any(|i| i.severity == Severity::Error),
        issues,
        suggestions,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_boundaries() {
        let config = PipelineConfig::default();
        let short = "a".repeat(49);
        assert_eq!(
            check_length(&short, &config),
            Err(InputError::TextTooShort {
                length: 49,
                minimum: 50
            })
        );
        assert!(check_length(&"a".repeat(50), &config).is_ok());
        assert!(matches!(
            check_length(&"a".repeat(10_001), &config),
            Err(InputError::TextTooLong { .. })
        ));
        assert_eq!(check_length("   \n ", &config), Err(InputError::MissingText));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let config = PipelineConfig::default();
        assert!(check_length(&"é".repeat(50), &config).is_ok());
    }

    #[test]
    fn test_assess_valid_requirements() {
        let text = "The system lets a user login. Each user has an account with stored data.";
        let report = assess_requirements(text, &PipelineConfig::default());

        assert!(report.is_valid);
        assert!(report.issues.is_empty());
        assert_eq!(report.statistics.sentence_count, 2);
        assert_eq!(report.statistics.word_count, 14);
        assert_eq!(report.suggestions.len(), 2);
    }

    #[test]
    fn test_assess_short_and_vague_text() {
        let report = assess_requirements("Cats sleep.", &PipelineConfig::default());

        assert!(!report.is_valid);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].severity, Severity::Error);
        assert_eq!(report.issues[1].kind, "content");
        assert_eq!(report.suggestions.len(), 1);
    }
}
