// Sales Pipeline - Main executable
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value as JsonValue};

use sales_pipeline::{
    api::StageHandler,
    storage::LocalArtifactStore,
    utils::{init_logging, PipelineConfig},
};

#[derive(Parser)]
#[command(name = "sales-pipeline", version, author = "Gabriel Demetrios Lafis")]
#[command(about = "Transform, load and query sales records")]
struct Cli {
    /// Sets a custom config file (JSON or YAML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Root directory holding one sub-directory per bucket
    #[arg(short, long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Overrides the configured log level
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clean a raw table into transformed_<key>
    Transform {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },
    /// Build databases/<db file name> from a cleaned table
    Load {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        db_file_name: Option<String>,
    },
    /// Aggregate over a store
    Query {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        /// Equality filter as COLUMN=VALUE, repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        /// Group-by column, repeatable, order preserved
        #[arg(long = "group-by")]
        group_by: Vec<String>,
    },
    /// Run a stage with a JSON event file as its request
    Invoke {
        #[arg(value_enum)]
        stage: Stage,
        event: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Stage {
    Transform,
    Load,
    Query,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", s))
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(dir) = &cli.data_dir {
        config.storage.root = dir.clone();
    }

    // Initialize logging
    if let Err(err) = init_logging(config.log_level_filter()) {
        eprintln!("Error initializing logger: {}", err);
    }

    let store = LocalArtifactStore::new(&config.storage.root)?;
    let handler = StageHandler::new(&store, &config);

    let (stage, event) = match cli.command {
        Command::Transform { bucket, key } => {
            (Stage::Transform, json!({ "bucket_name": bucket, "key": key }))
        }
        Command::Load { bucket, key, db_file_name } => {
            let mut event = json!({ "bucket_name": bucket, "csv_file_key": key });
            if let Some(name) = db_file_name {
                event["db_file_name"] = JsonValue::String(name);
            }
            (Stage::Load, event)
        }
        Command::Query { bucket, key, filters, group_by } => {
            let filters: serde_json::Map<String, JsonValue> = filters
                .into_iter()
                .map(|(column, value)| (column, JsonValue::String(value)))
                .collect();
            let event = json!({
                "bucket_name": bucket,
                "key": key,
                "Filters": filters,
                "Group By": group_by,
            });
            (Stage::Query, event)
        }
        Command::Invoke { stage, event } => {
            let contents = fs::read_to_string(&event)
                .with_context(|| format!("reading event file {}", event.display()))?;
            let event: JsonValue = serde_json::from_str(&contents)
                .map_err(|e| anyhow!("event file {} is not valid JSON: {}", event.display(), e))?;
            (stage, event)
        }
    };

    let response = match stage {
        Stage::Transform => handler.handle_transform(&event),
        Stage::Load => handler.handle_load(&event),
        Stage::Query => handler.handle_query(&event),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.is_success())
}
