use std::path::Path;

use anyhow::{Result, bail};
use console::style;
use umlforge_core::render::validate;

use super::read_input;

pub fn run(diagram: &Path) -> Result<()> {
    let source = read_input(Some(diagram))?;
    let report = validate(&source);

    for error in &report.errors {
        eprintln!("{} {error}", style("✗").red());
    }
    for warning in &report.warnings {
        eprintln!("{} {warning}", style("!").yellow());
    }

    if !report.is_valid {
        bail!("diagram has {} syntax errors", report.errors.len());
    }
    eprintln!("{} Diagram syntax is valid", style("●").green());
    Ok(())
}
