mod commands;
mod logging;
mod progress;

use std::fs;
use std::io::{self, Write};
use std::process;

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use material_sync_core::{AppConfig, FixedPartition, SyncEngine};
use progress::CliReporter;
use tracing::error;

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match material_sync_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Ingest { payload, partition }) => {
            let json = fs::read_to_string(&payload)
                .with_context(|| format!("reading payload {}", payload.display()))?;
            if let Err(err) = run_ingest(&config, &json, partition) {
                error!("Error: {:#}", err);
                process::exit(1);
            }
        }
        Some(Commands::Files { json }) => {
            let db = open_database(&config)?;
            let records = db.list_file_records()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                for record in &records {
                    println!(
                        "{:<18} {:<8} {}  {}{}",
                        record.material_category.to_string().cyan(),
                        record.last_event.as_str(),
                        record.last_event_at.to_rfc3339(),
                        record.directory_path.dimmed(),
                        record.file_name,
                    );
                }
                println!("{} file records", records.len());
            }
        }
        Some(Commands::Directories) => {
            let db = open_database(&config)?;
            for entry in db.list_directory_entries()? {
                println!(
                    "{}  {}  {}",
                    entry.last_modified_at.to_rfc3339(),
                    entry.partition_token.yellow(),
                    entry.directory_path,
                );
            }
        }
        Some(Commands::Commits { limit }) => {
            let db = open_database(&config)?;
            for entry in db.list_commit_log(limit)? {
                println!(
                    "{}  {}  {}  +{} ~{} -{}  {}",
                    entry.received_at.to_rfc3339(),
                    entry.commit_id.yellow(),
                    entry.repository_name,
                    entry.added.len(),
                    entry.modified.len(),
                    entry.removed.len(),
                    entry.message.lines().next().unwrap_or_default(),
                );
            }
        }
        Some(Commands::PrintConfig) => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Some(Commands::TruncateDb) => {
            match prompt_confirm(
                "Are you SURE you want to COMPLETELY DELETE the Database?",
                Some(false),
            ) {
                Ok(true) => {
                    let db = open_database(&config)?;
                    db.truncate_all()?;
                    println!("All tables truncated");
                }
                _ => {
                    process::exit(0);
                }
            }
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn open_database(config: &AppConfig) -> anyhow::Result<material_sync_core::Database> {
    material_sync_core::Database::open(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))
}

fn run_ingest(config: &AppConfig, json: &str, partition: Option<String>) -> anyhow::Result<()> {
    let engine = SyncEngine::new(config.clone());
    let resolver = partition
        .map(FixedPartition)
        .or_else(|| engine.configured_partition())
        .ok_or_else(|| {
            anyhow!("no partition token: pass --partition or set partition_token in Config.toml")
        })?;

    let summary = engine.ingest_json(json, &resolver, &CliReporter)?;

    if !summary.report.errors.is_empty() {
        println!(
            "{} files could not be processed",
            format!("{}", summary.report.errors.len()).red()
        );
    }
    println!(
        "{} commits applied, {} skipped, {} created, {} updated, {} deleted",
        format!("{}", summary.commits_processed).green(),
        summary.commits_skipped.len(),
        summary.report.records_created,
        summary.report.records_updated,
        summary.report.records_deleted,
    );
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
