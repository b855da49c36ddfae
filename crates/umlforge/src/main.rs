mod cli;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    dispatch(cli.command).await
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Extract {
            file,
            format,
            render,
        } => cli::extract::run(file.as_deref(), format, render.options()).await,
        Commands::Render { model, render } => cli::render::run(&model, render.options()),
        Commands::Edit {
            model,
            changes,
            format,
            render,
        } => cli::edit::run(&model, &changes, format, render.options()),
        Commands::Validate { diagram } => cli::validate::run(&diagram),
        Commands::Stats { model, json } => cli::stats::run(&model, json),
    }
}
