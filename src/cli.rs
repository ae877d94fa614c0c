use std::path::PathBuf;

use clap::{Parser, Subcommand};

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Parser, Debug)]
#[command(name = "billing-cleaner")]
#[command(about = "Patient billing CSV cleaner (HTTP upload service + local CLI)", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the upload page and the upload-and-clean API.
    Serve(ServeArgs),
    /// Clean a local CSV file and print its metrics as JSON.
    Clean(CleanArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Directory holding temporary uploads and cleaned files.
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Largest accepted upload, in MiB.
    #[arg(long, default_value_t = 50)]
    pub max_upload_mb: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CleanArgs {
    /// Raw patient billing CSV.
    #[arg(long)]
    pub input: PathBuf,

    /// Cleaned CSV output path. Defaults to <input stem>-cleaned.csv next to the input.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
