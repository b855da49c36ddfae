use std::path::Path;

use anyhow::Result;
use console::style;
use umlforge_core::{
    DesignModelBuilder, DiagramGenerator, ExportFormat, ExtractionOrchestrator, PipelineConfig,
    RenderOptions,
};

use super::read_input;

pub async fn run(file: Option<&Path>, format: ExportFormat, options: RenderOptions) -> Result<()> {
    let text = read_input(file)?;
    tracing::debug!("Read {} bytes of requirements text", text.len());
    let orchestrator = ExtractionOrchestrator::from_config(PipelineConfig::from_env())?;

    let raw = orchestrator
        .process(&text)
        .await
        .map_err(umlforge_core::Error::from)?;
    let model = DesignModelBuilder::new().build(&raw);
    tracing::info!(
        "Built model with {} classes from {} entities",
        model.classes().len(),
        raw.entities.len()
    );

    let generator = DiagramGenerator::new(options);
    let export = generator.export(&model, format)?;
    print!("{}", export.data);
    if !export.data.ends_with('\n') {
        println!();
    }

    eprintln!(
        "{} {} classes, {} relationships ({}, {} ms)",
        style("●").green(),
        model.classes().len(),
        model.relationships().len(),
        raw.metadata.strategy.as_str(),
        raw.metadata.duration_ms
    );
    if raw.metadata.timed_out {
        eprintln!("  {} extraction timed out, rule-based results used", style("!").yellow());
    }
    if raw.metadata.failed_chunks > 0 {
        eprintln!(
            "  {} {} of {} chunks failed",
            style("!").yellow(),
            raw.metadata.failed_chunks,
            raw.metadata.chunk_count
        );
    }
    Ok(())
}
