use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vizier::{pipeline, VisualizationRequest, VisualizationResponse};

#[derive(Parser)]
#[command(name = "vizier")]
#[command(
  about = "Vizier - one-shot chart generation and data insight pipeline\nReads one JSON request, emits one JSON response, exits"
)]
#[command(version)]
struct Cli {
  /// Read the request from a file instead of stdin
  #[arg(long)]
  input: Option<PathBuf>,

  /// Pretty-print the response
  #[arg(long)]
  pretty: bool,
}

fn read_request(cli: &Cli) -> Result<VisualizationRequest> {
  let raw = match &cli.input {
    Some(path) => std::fs::read_to_string(path)
      .with_context(|| format!("could not read request file {}", path.display()))?,
    None => {
      let mut buffer = String::new();
      std::io::stdin().read_to_string(&mut buffer).context("could not read request from stdin")?;
      buffer
    }
  };
  serde_json::from_str(&raw).context("request is not valid JSON")
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let response = match read_request(&cli) {
    Ok(request) => pipeline::run(request).await,
    Err(error) => VisualizationResponse::failure(format!("{error:#}")),
  };

  // stdout carries exactly one response object and nothing else
  let encoded = if cli.pretty {
    serde_json::to_string_pretty(&response)
  } else {
    serde_json::to_string(&response)
  };
  match encoded {
    Ok(text) => println!("{text}"),
    Err(error) => println!("{{\"error\":\"response encoding failed: {error}\"}}"),
  }
}
