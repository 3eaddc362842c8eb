//! `fitdump` -- a small CLI front end for decoding and re-encoding FIT files,
//! useful for spot-checking this crate's output against vendor tooling.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fit_codec::{EncodeInput, UserRecord};
use fit_profile::CsvProfileCatalog;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fitdump", about = "Inspect and re-encode FIT activity files")]
struct Cli {
    /// Directory containing messages.csv/types.csv (and their undocumented_*.csv
    /// counterparts).
    #[arg(long, default_value = "profile", global = true)]
    profile_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a FIT file and print every record's fields.
    Dump { path: PathBuf },
    /// Decode a FIT file and re-encode it against a template's definitions.
    Reencode {
        path: PathBuf,
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> fit_codec::Result<()> {
    let catalog = CsvProfileCatalog::load_from_dir(&cli.profile_dir)?;

    match cli.command {
        Command::Dump { path } => {
            let segments = fit_codec::decode(&path, &catalog)?;
            for (segment_index, segment) in segments.iter().enumerate() {
                tracing::debug!(segment_index, records = segment.records.len(), "dumping segment");
                for record in &segment.records {
                    println!("{record:#?}");
                }
            }
        }
        Command::Reencode { path, template, out } => {
            let decoded = fit_codec::decode(&path, &catalog)?
                .into_iter()
                .next()
                .expect("decode always yields at least one segment");
            let template_registry = fit_codec::decode(&template, &catalog)?
                .into_iter()
                .next()
                .expect("decode always yields at least one segment");

            let records: Vec<UserRecord> = decoded
                .records
                .iter()
                .map(|r| UserRecord {
                    message_name: r.message_name.clone(),
                    local_message_number: r.local_message_number,
                    fields: r.fields.clone(),
                })
                .collect();

            fit_codec::encode(
                &out,
                EncodeInput::Records {
                    records,
                    template: Some(&template_registry),
                },
                &catalog,
            )?;
        }
    }

    Ok(())
}
