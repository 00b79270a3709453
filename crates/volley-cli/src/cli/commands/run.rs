//! `volley run` – dispatch the given URLs and print their outcomes.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use volley_core::config::DispatchConfig;
use volley_core::transform::from_fn;
use volley_core::{CurlTransport, Dispatcher, Outcome, Response};

use crate::cli::{OutputFormat, RunArgs};

/// What is kept of each successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseSummary {
    pub status: u16,
    pub bytes: usize,
    pub content_type: Option<String>,
}

impl ResponseSummary {
    pub fn of(response: &Response) -> Self {
        Self {
            status: response.status,
            bytes: response.body.len(),
            content_type: response.header("content-type").map(str::to_string),
        }
    }
}

/// One printable line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub endpoint: String,
    pub ok: bool,
    pub status: Option<u16>,
    pub bytes: Option<usize>,
    pub content_type: Option<String>,
    pub error: Option<String>,
}

impl Record {
    pub fn from_outcome(outcome: Outcome<ResponseSummary>) -> Self {
        match outcome {
            Outcome::Success {
                endpoint, value, ..
            } => Self {
                endpoint,
                ok: true,
                status: Some(value.status),
                bytes: Some(value.bytes),
                content_type: value.content_type,
                error: None,
            },
            Outcome::Failure { endpoint, error } => Self {
                endpoint,
                ok: false,
                status: error.request().and_then(|e| e.status()),
                bytes: None,
                content_type: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Positional URLs first, then the lines of `--file`.
pub fn collect_endpoints(args: &RunArgs) -> Result<Vec<String>> {
    let mut endpoints = args.urls.clone();
    if let Some(path) = &args.file {
        endpoints.extend(read_endpoint_file(path)?);
    }
    Ok(endpoints)
}

pub fn read_endpoint_file(path: &Path) -> Result<Vec<String>> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read URL list: {}", path.display()))?;
    Ok(parse_endpoint_list(&data))
}

fn parse_endpoint_list(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub async fn run_dispatch(cfg: &DispatchConfig, args: &RunArgs) -> Result<()> {
    let endpoints = collect_endpoints(args)?;
    if endpoints.is_empty() {
        bail!("no URLs given; pass them as arguments or with --file");
    }

    let mut cfg = cfg.clone();
    args.apply_to(&mut cfg);
    let options = cfg.resolve().context("invalid dispatch settings")?;

    let dispatcher = Dispatcher::new(CurlTransport::new(), options)
        .with_response_transform(from_fn(|r: &Response| -> Result<ResponseSummary> {
            Ok(ResponseSummary::of(r))
        }))
        .with_result_transform(from_fn(
            |o: Outcome<ResponseSummary>| -> Result<Record> { Ok(Record::from_outcome(o)) },
        ));

    let report = dispatcher.dispatch_report(endpoints).await?;
    let records = report.outputs;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for r in &records {
                println!("{}", text_line(r));
            }
            let failed = records.iter().filter(|r| !r.ok).count();
            println!(
                "{} requests: {} ok, {} failed in {:.1}s",
                records.len(),
                records.len() - failed,
                failed,
                report.elapsed.as_secs_f64()
            );
        }
    }
    Ok(())
}

fn text_line(r: &Record) -> String {
    let status = r
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let bytes = r
        .bytes
        .map(|b| b.to_string())
        .unwrap_or_else(|| "-".to_string());
    let verdict = if r.ok { "ok" } else { "FAIL" };
    match &r.error {
        Some(err) => format!("{:<5} {:<4} {:>8} {}  ({})", verdict, status, bytes, r.endpoint, err),
        None => format!("{:<5} {:<4} {:>8} {}", verdict, status, bytes, r.endpoint),
    }
}
