pub mod edit;
pub mod extract;
pub mod render;
pub mod stats;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use umlforge_core::{DesignModel, ExportFormat, LayoutDirection, RenderOptions};

#[derive(Parser)]
#[command(
    name = "umlforge",
    about = "Turn requirement text into UML class diagrams",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct RenderArgs {
    /// Layout direction (TB, BT, LR, RL)
    #[arg(long)]
    pub direction: Option<LayoutDirection>,
    /// Append `$` to static members
    #[arg(long)]
    pub mark_static: bool,
}

impl RenderArgs {
    pub fn options(&self) -> RenderOptions {
        let options = RenderOptions::new().with_mark_static(self.mark_static);
        match self.direction {
            Some(direction) => options.with_direction(direction),
            None => options,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a design model from requirement text
    Extract {
        /// Requirements file; `-` or omitted reads stdin
        file: Option<PathBuf>,
        /// Output format (mermaid, json)
        #[arg(long, default_value = "mermaid")]
        format: ExportFormat,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Render a serialized model as Mermaid
    Render {
        /// Model JSON file; `-` reads stdin
        model: PathBuf,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Apply a JSON array of changes to a model
    Edit {
        /// Model JSON file
        model: PathBuf,
        /// Changes JSON file; `-` reads stdin
        changes: PathBuf,
        /// Output format (mermaid, json)
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[command(flatten)]
        render: RenderArgs,
    },
    /// Check Mermaid class-diagram syntax
    Validate {
        /// Diagram file; `-` reads stdin
        diagram: PathBuf,
    },
    /// Show statistics and recommendations for a model
    Stats {
        /// Model JSON file; `-` reads stdin
        model: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Reads a file, or stdin when `path` is absent or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

pub fn read_model(path: &Path) -> Result<DesignModel> {
    let raw = read_input(Some(path))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid model in {}", path.display()))
}
