// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::process;

use anyhow::{Context, Result};
use rdf_stream_updater::config::{load_config, RuntimeBuilder};
use rdf_stream_updater::observability::init_logging;
use tokio::io::{AsyncBufRead, BufReader};

const USAGE: &str = "Usage: rdf-stream-updater <config.yaml|.json|.toml> [input-file]";

/// Read units from `input`, or stdin when absent, and write the updated units
/// to stdout. Logs go to stderr.
async fn run(config_path: &str, input: Option<&str>) -> Result<()> {
    let config = load_config(config_path)
        .with_context(|| format!("loading configuration from '{}'", config_path))?;
    let updater = RuntimeBuilder::from_config(&config)?;

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening input '{}'", path))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut source = RuntimeBuilder::source(&config, reader);
    let mut sink = RuntimeBuilder::sink(&config, tokio::io::stdout());
    let report = updater.run(&mut source, &mut sink).await?;
    if report.units_dropped > 0 {
        tracing::warn!(
            dropped = report.units_dropped,
            "some units did not reach the output"
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging("info");

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("{}", USAGE);
        process::exit(1);
    }

    if let Err(error) = run(&args[1], args.get(2).map(String::as_str)).await {
        tracing::error!("{:#}", error);
        process::exit(1);
    }
}
