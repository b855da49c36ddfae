use serde::{Deserialize, Serialize};
use umlforge_core::{LayoutDirection, PipelineConfig, RenderOptions};

pub const DEFAULT_PORT: u16 = 5000;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Layout direction written into every rendered diagram
    #[serde(default)]
    pub direction: LayoutDirection,
    #[serde(default)]
    pub mark_static: bool,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            direction: LayoutDirection::default(),
            mark_static: false,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = match std::env::var("UMLFORGE_PORT") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring UMLFORGE_PORT={}: {}", raw, e);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };
        let direction = match std::env::var("UMLFORGE_DIRECTION") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring UMLFORGE_DIRECTION: {}", e);
                LayoutDirection::default()
            }),
            Err(_) => LayoutDirection::default(),
        };

        Self {
            port,
            direction,
            mark_static: std::env::var("UMLFORGE_MARK_STATIC")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            pipeline: PipelineConfig::from_env(),
        }
    }

    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions::new()
            .with_direction(self.direction)
            .with_mark_static(self.mark_static)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        let options = config.render_options();
        assert_eq!(options.direction, Some(LayoutDirection::TopToBottom));
        assert!(!options.mark_static);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"direction": "LR", "pipeline": {"timeout_secs": 5}}"#)
                .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.direction, LayoutDirection::LeftToRight);
        assert_eq!(config.pipeline.timeout_secs, 5);
        assert_eq!(config.pipeline.min_text_length, 50);
    }
}
