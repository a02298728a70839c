//! # Marquetry Inspect
//!
//! Loads a document, composes an inspector for every root object and prints
//! its outline. Optionally runs the validator.
//!
//! Logging is controlled with `RUST_LOG` (default `marquetry=info`).

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use marquetry::core::{MemoryStore, SharedStore, TomlFileStore};
use marquetry::{load_file, GraphHandle, InspectorSession, MarquetryConfig};

const DEFAULT_FILTER: &str = "marquetry=info,marquetry_compose=warn,marquetry_validator=info";

fn usage() {
    println!("Usage: marquetry_inspect <document.toml> [options]");
    println!();
    println!("Options:");
    println!("  --config <path>   Engine configuration (TOML)");
    println!("  --state <path>    Persist foldout state and toggles to this file");
    println!("  --validate        Run every validator module and print the logs");
    println!("  --quota <n>       Validator entries per frame (overrides config)");
}

fn option<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args[1].starts_with("--") {
        usage();
        return;
    }
    let document_path = &args[1];
    let validate = args.iter().any(|a| a == "--validate");

    let mut config = match option(&args, "--config") {
        Some(path) => match MarquetryConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        },
        None => MarquetryConfig::default(),
    };
    if let Some(quota) = option(&args, "--quota") {
        match quota.parse::<usize>() {
            Ok(n) if n > 0 => config.validator.batch_quota = n,
            _ => {
                println!("Error: --quota expects a positive integer, got {quota}");
                return;
            }
        }
    }

    let store: SharedStore = match option(&args, "--state") {
        Some(path) => match TomlFileStore::open(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                println!("Error: {e}");
                return;
            }
        },
        None => MemoryStore::shared(),
    };

    let loaded = match load_file(document_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            println!("Error: could not load {document_path}: {e}");
            return;
        }
    };
    tracing::info!(document = %document_path, roots = loaded.roots.len(), "document loaded");

    let mut session = InspectorSession::new(GraphHandle::new(loaded.graph), loaded.roots, &config, store);
    if let Err(e) = session.compose_all() {
        println!("Error: {e}");
        return;
    }
    print!("{}", session.render());

    if validate {
        session.validate(true);
        let frames = session.settle();
        println!();
        println!("Validation ({frames} frames):");
        for log in session.logs() {
            match log.fix() {
                Some(fix) => println!("  {log} (fix: {fix})"),
                None => println!("  {log}"),
            }
        }
        let counters = session.counters();
        println!(
            "  {} errors, {} warnings, {} comments",
            counters.errors, counters.warnings, counters.comments
        );
    }
    session.close();
}
