mod cli;

use anyhow::Context;
use kustomize2hcl::resource::ResourceCollection;
use kustomize2hcl::writer::HclWriter;
use std::path::{Path, PathBuf};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("KUSTOMIZE2HCL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = convert(cli) {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn convert(cli: cli::Cli) -> anyhow::Result<()> {
    enter_directories(&cli.directory)?;

    let mut collection = load(&cli.input)?;
    tracing::info!(resources = collection.len(), "loaded resources");

    let writer = HclWriter::new(cli.provider.into());
    writer.write(&cli.output, &mut collection)?;
    Ok(())
}

/// `cd` into each of `directories` in turn, relative paths resolve against the previous one
fn enter_directories(directories: &[PathBuf]) -> anyhow::Result<()> {
    for directory in directories {
        let work_dir = directory
            .canonicalize()
            .with_context(|| format!("-C/--directory {}", directory.display()))?;
        std::env::set_current_dir(&work_dir)
            .with_context(|| format!("changing work directory to {}", work_dir.display()))?;

        tracing::debug!(directory = %work_dir.display(), "changed work directory");
    }

    Ok(())
}

fn load(input: &Path) -> anyhow::Result<ResourceCollection> {
    if input == Path::new("-") {
        let stdin = std::io::read_to_string(std::io::stdin()).context("reading stdin")?;
        return Ok(ResourceCollection::from_yaml(&stdin)?);
    }

    let mut collection = ResourceCollection::default();
    collection.load(input)?;
    Ok(collection)
}
