use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mermaid::MermaidRenderer;
use crate::model::DesignModel;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Format {format} not supported (supported: {})", .supported.join(", "))]
    UnsupportedFormat {
        format: String,
        supported: Vec<String>,
    },
    #[error("Export serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    fn unsupported(format: &str) -> Self {
        Self::UnsupportedFormat {
            format: format.to_string(),
            supported: ExportFormat::ALL
                .iter()
                .map(|f| f.as_str().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Mermaid,
    Json,
}

impl ExportFormat {
    pub const ALL: [Self; 2] = [Self::Mermaid, Self::Json];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Json => "json",
        }
    }

    pub const fn filename(self) -> &'static str {
        match self {
            Self::Mermaid => "uml_diagram.mmd",
            Self::Json => "uml_model.json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ExportError::unsupported(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub class_count: usize,
    pub relationship_count: usize,
    pub exported_at: DateTime<Utc>,
}

/// A rendered or serialized model ready to be saved under `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub format: ExportFormat,
    pub data: String,
    pub filename: String,
    pub metadata: ExportMetadata,
}

impl Export {
    pub fn new(
        model: &DesignModel,
        format: ExportFormat,
        renderer: &MermaidRenderer,
    ) -> Result<Self, ExportError> {
        let data = match format {
            ExportFormat::Mermaid => renderer.render(model),
            ExportFormat::Json => serde_json::to_string_pretty(model)?,
        };
        Ok(Self {
            format,
            data,
            filename: format.filename().to_string(),
            metadata: ExportMetadata {
                class_count: model.classes().len(),
                relationship_count: model.relationships().len(),
                exported_at: Utc::now(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DesignClass;

    #[test]
    fn test_parse_format() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        let err = "svg".parse::<ExportFormat>().unwrap_err();
        match &err {
            ExportError::UnsupportedFormat { format, supported } => {
                assert_eq!(format, "svg");
                assert_eq!(supported, &["mermaid", "json"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), "Format svg not supported (supported: mermaid, json)");
    }

    #[test]
    fn test_json_export_round_trips() {
        let mut model = DesignModel::new();
        model.add_class(DesignClass::new("Invoice"));
        let export = Export::new(&model, ExportFormat::Json, &MermaidRenderer::default()).unwrap();

        assert_eq!(export.filename, "uml_model.json");
        assert_eq!(export.metadata.class_count, 1);
        assert!(export.data.contains('\n'));
        let restored: DesignModel = serde_json::from_str(&export.data).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn test_mermaid_export() {
        let mut model = DesignModel::new();
        model.add_class(DesignClass::new("Invoice"));
        let export =
            Export::new(&model, ExportFormat::Mermaid, &MermaidRenderer::default()).unwrap();
        assert_eq!(export.filename, "uml_diagram.mmd");
        assert!(export.data.starts_with("classDiagram"));
    }
}
