use anyhow::Context;
use clap::Parser;

use billing_cleaner::{cli, pipeline, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Serve(cmd) => server::run(cmd).await.context("serve failed"),
        cli::Command::Clean(cmd) => clean(cmd).await.context("clean failed"),
    }
}

async fn clean(cmd: cli::CleanArgs) -> anyhow::Result<()> {
    let output = cmd
        .output
        .unwrap_or_else(|| pipeline::default_cleaned_output_path(&cmd.input));
    let input = cmd.input;

    let metrics =
        tokio::task::spawn_blocking(move || pipeline::clean_file(&input, &output)).await??;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
