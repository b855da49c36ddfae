use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;
use serde_json::Value;
use umlforge_core::model::ChangeOutcome;
use umlforge_core::{Change, DiagramGenerator, ExportFormat, RenderOptions};

use super::{read_input, read_model};

pub fn run(
    model_path: &Path,
    changes_path: &Path,
    format: ExportFormat,
    options: RenderOptions,
) -> Result<()> {
    if model_path == Path::new("-") && changes_path == Path::new("-") {
        bail!("model and changes cannot both come from stdin");
    }
    let mut model = read_model(model_path)?;
    let raw = read_input(Some(changes_path))?;
    let records: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("expected a JSON array of changes in {}", changes_path.display()))?;
    tracing::debug!("Parsed {} change records from {}", records.len(), changes_path.display());
    let changes = records
        .into_iter()
        .map(Change::from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let generator = DiagramGenerator::new(options);
    let updated = generator.update(&mut model, &changes)?;

    for applied in &updated.applied {
        tracing::debug!("Change {} ({}) -> {:?}", applied.index, applied.kind, applied.outcome);
        let marker = match applied.outcome {
            ChangeOutcome::Applied | ChangeOutcome::Merged => style("✓").green(),
            ChangeOutcome::NotFound => style("?").yellow(),
            ChangeOutcome::Skipped => style("-").dim(),
        };
        eprintln!("{marker} #{} {} ({:?})", applied.index, applied.kind, applied.outcome);
    }

    let export = generator.export(&model, format)?;
    print!("{}", export.data);
    if !export.data.ends_with('\n') {
        println!();
    }
    Ok(())
}
