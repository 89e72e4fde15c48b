//! Samarth - Government Open-Data Q&A
//!
//! Normalizes the mineral production and rainfall extracts and answers
//! keyword questions against them.

use anyhow::Result;
use clap::Parser;
use samarth::app::Session;
use samarth::config::{AppConfig, SourceConfig};
use samarth::query::Response;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "samarth", version, about = "Ask questions about government open-data extracts")]
struct Args {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Raw mineral production CSV (overrides the config)
    #[arg(long)]
    production: Option<PathBuf>,

    /// Raw rainfall CSV (overrides the config)
    #[arg(long)]
    rainfall: Option<PathBuf>,

    /// Directory for the normalized CSV artifacts
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write normalized artifacts
    #[arg(long)]
    no_persist: bool,

    /// Print quick insights before answering
    #[arg(long)]
    insights: bool,

    /// Print one JSON object per answer
    #[arg(long)]
    json: bool,

    /// Questions to answer; read from stdin, one per line, when omitted
    questions: Vec<String>,
}

impl Args {
    fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(path) = &self.production {
            config.production = SourceConfig {
                path: path.clone(),
                ..config.production
            };
        }
        if let Some(path) = &self.rainfall {
            config.rainfall = SourceConfig {
                path: path.clone(),
                ..config.rainfall
            };
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.no_persist {
            config.output_dir = None;
        }
        Ok(config)
    }
}

fn print_response(out: &mut impl Write, response: &Response, json: bool) -> io::Result<()> {
    if json {
        let line = serde_json::to_string(response).map_err(io::Error::other)?;
        return writeln!(out, "{line}");
    }
    writeln!(out, "Answer: {}", response.text)?;
    match &response.source {
        Some(source) => writeln!(out, "Source: {source}"),
        None => writeln!(out, "Source: -"),
    }
}

fn run(args: Args) -> Result<bool> {
    let config = args.app_config()?;
    let session = Session::from_config(&config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.insights {
        for insight in session.insights() {
            if args.json {
                writeln!(out, "{}", serde_json::to_string(&insight)?)?;
            } else {
                writeln!(
                    out,
                    "{}: {} ({}{}) [{}]",
                    insight.label, insight.key, insight.value, insight.unit, insight.source
                )?;
            }
        }
    }

    let questions: Box<dyn Iterator<Item = io::Result<String>>> = if args.questions.is_empty() {
        Box::new(io::stdin().lines())
    } else {
        Box::new(args.questions.clone().into_iter().map(Ok))
    };

    let mut all_answered = true;
    for question in questions {
        let question = question?;
        if question.trim().is_empty() {
            continue;
        }
        match session.ask(&question) {
            Ok(response) => print_response(&mut out, &response, args.json)?,
            Err(e) => {
                error!(question = %question, error = %e, "query failed");
                all_answered = false;
            }
        }
        out.flush()?;
    }
    Ok(all_answered)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal");
            ExitCode::FAILURE
        }
    }
}
