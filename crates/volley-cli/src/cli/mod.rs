//! CLI for the volley bulk request dispatcher.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use volley_core::config::{self, DispatchConfig, ProgressSetting};

use commands::{run_completions, run_config, run_dispatch};

/// Top-level CLI for volley.
#[derive(Debug, Parser)]
#[command(name = "volley")]
#[command(about = "volley: paced bulk HTTP requests with ordered results", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Send one request per URL and print every outcome in input order.
    Run(RunArgs),

    /// Show the config file path and the effective configuration.
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Flags for `volley run`. Anything set here overrides the config file.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Endpoints to request.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Read more endpoints from a file: one per line, blank lines and `#` comments skipped.
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Stagger between launches; request i starts no earlier than i * MS.
    #[arg(long, value_name = "MS")]
    pub throttle_ms: Option<u64>,

    /// Per-request timeout.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// HTTP method for every request.
    #[arg(long, short = 'X', value_name = "METHOD")]
    pub method: Option<String>,

    /// Show a progress bar on stderr.
    #[arg(long)]
    pub progress: bool,

    /// Show a progress bar rendered from this template (implies --progress).
    #[arg(long, value_name = "TEMPLATE")]
    pub progress_template: Option<String>,

    /// Do not keep response bodies after summarizing them.
    #[arg(long)]
    pub discard_response: bool,

    /// Extra request header, e.g. "Accept: application/json". Repeatable.
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One aligned line per endpoint plus a summary.
    Text,
    /// A JSON array of records.
    Json,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME: VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in {raw:?}"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

impl RunArgs {
    /// Overlay the flags that were given onto `cfg`.
    pub fn apply_to(&self, cfg: &mut DispatchConfig) {
        if let Some(ms) = self.throttle_ms {
            cfg.throttle_ms = ms;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.request_timeout_ms = ms;
        }
        if let Some(method) = &self.method {
            cfg.http_method = method.clone();
        }
        if let Some(template) = &self.progress_template {
            cfg.progress = ProgressSetting::Template(template.clone());
        } else if self.progress {
            cfg.progress = ProgressSetting::Enabled(true);
        }
        if self.discard_response {
            cfg.discard_response = true;
        }
        for (name, value) in &self.headers {
            cfg.headers.insert(name.clone(), value.clone());
        }
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run(args) => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_dispatch(&cfg, &args).await?;
            }
            CliCommand::Config => {
                let cfg = config::load_or_init()?;
                run_config(&cfg)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
