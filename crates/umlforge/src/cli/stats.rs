use std::path::Path;

use anyhow::Result;
use console::style;
use umlforge_core::StatisticsReport;

use super::read_model;

pub fn run(model: &Path, json: bool) -> Result<()> {
    let model = read_model(model)?;
    let report = StatisticsReport::of(&model);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.statistics;
    let summary = &stats.summary;
    println!(
        "{} ({})",
        style(format!("Quality score: {}", report.quality_score)).bold(),
        report.complexity.as_str()
    );
    println!(
        "  Classes: {} ({} with attributes, {} with methods)",
        summary.classes.total, summary.classes.with_attributes, summary.classes.with_methods
    );
    println!("  Relationships: {}", summary.relationships.total);
    for (kind, count) in &summary.relationships.by_type {
        println!("    {kind}: {count}");
    }
    println!("  Attributes: {}", stats.attributes.total);
    for (type_name, count) in &stats.attributes.types {
        println!("    {type_name}: {count}");
    }
    println!("  Methods: {}", stats.methods.total);
    for (return_type, count) in &stats.methods.return_types {
        println!("    {return_type}: {count}");
    }

    for advice in &report.recommendations {
        println!("{} {advice}", style("→").cyan());
    }
    Ok(())
}
