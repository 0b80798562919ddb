//! OData payload converter.
//!
//! Reads an Atom/XML or JSON payload, binds it to the domain model and
//! writes it back out in another format:
//! - entities, entity sets and standalone properties
//! - V3 and V4 wire vocabularies
//! - optional base URI override for relative links

mod convert;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use odata_client::{ClientConfig, ODataClient};
use odata_common::{Format, ServiceVersion, Url};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use convert::{convert, parse_format, Shape};

#[derive(Parser, Debug)]
#[command(name = "odata-convert")]
#[command(about = "Convert OData payloads between Atom/XML and JSON")]
struct Args {
    /// Payload file to read
    #[arg(short, long)]
    input: PathBuf,

    /// Format of the input (atom, xml, json, ...)
    #[arg(long, value_parser = parse_format)]
    from: Format,

    /// Format to write (atom, xml, json, ...)
    #[arg(long, value_parser = parse_format)]
    to: Format,

    /// Shape of the payload
    #[arg(long, value_enum, default_value = "entity")]
    shape: Shape,

    /// OData protocol version (v3 or v4); overrides the config file
    #[arg(long)]
    service_version: Option<String>,

    /// Base URI for relative links, overriding the payload's own
    #[arg(long)]
    base: Option<String>,

    /// Client configuration file (YAML)
    #[arg(long, env = "ODATA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Payloads go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let version = args
        .service_version
        .as_deref()
        .map(|v| {
            ServiceVersion::parse(v).with_context(|| format!("Unknown service version '{}'", v))
        })
        .transpose()?;

    let mut config = match (&args.config, version) {
        (Some(path), _) => ClientConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, Some(version)) => ClientConfig::for_version(version),
        (None, None) => ClientConfig::default(),
    }
    .with_env_overrides();
    if let Some(version) = version {
        config.version = version;
    }

    let base = args
        .base
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid --base URI")?;

    let client = ODataClient::new(config)?.with_base(base);

    info!(
        input = %args.input.display(),
        from = %args.from,
        to = %args.to,
        shape = ?args.shape,
        version = %client.version(),
        "Converting payload"
    );

    let file = File::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let output = convert(
        BufReader::new(file),
        client.reader(),
        client.writer(),
        args.from,
        args.to,
        args.shape,
    )?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;

    info!(bytes = output.len(), "Conversion complete");
    Ok(())
}
