use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use replay_a11y_core::{
    coerce_timestamp, new_storage, process_violations, reference_timestamp, render_issues,
    AxeResults, JsonSegmentSplitter, OutputFormat, SessionSplitter, StorageProvider,
    StorageSettings, TracingReporter,
};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "replay-a11y",
    author,
    version,
    about = "Accessibility evaluation for recorded session replays"
)]
struct Cli {
    /// Settings file (TOML, YAML or JSON) using the environment variable names as keys
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download and decompress segments, printing them as a JSON array
    Fetch {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Download and split segments, reporting event count and reference timestamp
    Inspect {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
        /// Emit JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Normalize raw accessibility engine results read from FILE or stdin
    Normalize {
        /// Session time to stamp onto every issue; malformed values become 0
        #[arg(long, value_name = "VALUE")]
        timestamp: Option<String>,
        /// Emit JSON instead of human-readable text
        #[arg(long)]
        json: bool,
        file: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch { names } => {
            let storage = build_storage(cli.config.as_deref()).await?;
            let segments = storage.download_from_filenames(&names).await;
            println!("{}", serde_json::to_string_pretty(&segments)?);
        }
        Commands::Inspect { names, json } => {
            let storage = build_storage(cli.config.as_deref()).await?;
            inspect(storage.as_ref(), &names, json).await?;
        }
        Commands::Normalize {
            timestamp,
            json,
            file,
        } => normalize(timestamp.as_deref(), json, file.as_deref())?,
    }
    Ok(())
}

async fn build_storage(config: Option<&Path>) -> Result<Arc<dyn StorageProvider>> {
    let settings = load_settings(config)?;
    info!(provider = ?settings.provider, bucket = %settings.bucket, "using segment storage");
    new_storage(&settings, Arc::new(TracingReporter)).await
}

/// Settings file values first, then the process environment on top.
fn load_settings(path: Option<&Path>) -> Result<StorageSettings> {
    let mut vars = HashMap::new();
    if let Some(path) = path {
        let file: HashMap<String, String> = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .with_context(|| format!("failed to load settings from {}", path.display()))?;
        vars.extend(file.into_iter().map(|(k, v)| (k.to_uppercase(), v)));
    }
    vars.extend(std::env::vars());
    StorageSettings::from_map(vars)
}

async fn inspect(storage: &dyn StorageProvider, names: &[String], json: bool) -> Result<()> {
    let segments = storage.download_from_filenames(names).await;
    let events = JsonSegmentSplitter
        .split(&segments)
        .context("failed to split downloaded segments")?;
    let timestamp = reference_timestamp(&events);
    if json {
        let summary = json!({
            "segments": segments.len(),
            "events": events.len(),
            "reference_timestamp": timestamp,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} event(s) across {} segment(s); reference timestamp {}",
        events.len(),
        segments.len(),
        timestamp
    );
    Ok(())
}

fn normalize(timestamp: Option<&str>, json: bool, file: Option<&Path>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine results from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read engine results from stdin")?;
            buffer
        }
    };
    let results: AxeResults =
        serde_json::from_str(&raw).context("engine results are not valid JSON")?;

    let timestamp = timestamp
        .map(|raw| serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
        .unwrap_or(Value::Null);
    let issues = process_violations(&results, coerce_timestamp(&timestamp));

    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    print!("{}", render_issues(&issues, format)?);
    if json {
        println!();
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,aws=warn,hyper=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
