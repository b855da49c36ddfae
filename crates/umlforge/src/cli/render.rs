use std::path::Path;

use anyhow::Result;
use umlforge_core::{MermaidRenderer, RenderOptions};

use super::read_model;

pub fn run(model: &Path, options: RenderOptions) -> Result<()> {
    let model = read_model(model)?;
    print!("{}", MermaidRenderer::new(options).render(&model));
    Ok(())
}
