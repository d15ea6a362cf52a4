//! minutes-cli — command-line frontend for the Minutes meeting summarizer
//!
//! Drives the same HTTP endpoints as the browser client, so transcripts can
//! be summarized from scripts or a terminal.
//!
//! # Subcommands
//! - `upload <file>`                                   — extract text from a `.txt` file
//! - `summarize <file> [--prompt <text>] [--json]`      — summarize a transcript file
//! - `share --to <emails> [--subject <s>] <file>`       — acknowledge a share (no delivery)
//! - `status`                                          — show server health

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use minutes_core::models::{
    ShareAck, ShareRequest, SummarizeRequest, SummarizeResponse, UploadResponse,
};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "minutes-cli",
    version,
    about = "Minutes meeting summarizer — command-line frontend"
)]
struct Cli {
    /// Minutes HTTP server URL (overrides MINUTES_HTTP_URL env var)
    #[arg(long, env = "MINUTES_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a .txt transcript and print the extracted text
    Upload {
        /// Transcript file (plain text)
        file: PathBuf,
    },

    /// Summarize a transcript file
    Summarize {
        /// Transcript file (plain text)
        file: PathBuf,

        /// Custom instruction for the summary
        #[arg(short, long)]
        prompt: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Share a summary (acknowledged only; nothing is delivered)
    Share {
        /// File holding the summary text
        file: PathBuf,

        /// Comma-separated recipient list
        #[arg(long = "to")]
        to: String,

        /// Subject line
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Show Minutes server status
    Status,
}

// ============================================================================
// Helpers
// ============================================================================

/// Split a comma-separated recipient list, trimming and dropping empty entries.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_text(file: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))
}

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

/// Pull the `error` field out of an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Send a request, exiting with a diagnostic on connection or HTTP failure.
fn send(url: &str, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::Response {
    let resp = match req.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("minutes-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("minutes-cli: server returned {}: {}", status, error_message(&body));
        std::process::exit(1);
    }

    resp
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn do_upload(server: &str, file: &Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcript.txt".to_string());

    let part = reqwest::blocking::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("text/plain")?;
    let form = reqwest::blocking::multipart::Form::new().part("transcript", part);

    let url = format!("{}/api/upload", server);
    let resp = send(&url, client(30)?.post(&url).multipart(form));
    let upload: UploadResponse = resp.json()?;
    println!("{}", upload.text);
    Ok(())
}

fn do_summarize(
    server: &str,
    file: &Path,
    prompt: Option<String>,
    json_output: bool,
) -> anyhow::Result<()> {
    let transcript = read_text(file)?;
    if transcript.trim().is_empty() {
        anyhow::bail!("transcript {} is empty", file.display());
    }

    let url = format!("{}/api/summarize", server);
    let body = SummarizeRequest {
        transcript_text: Some(transcript),
        prompt,
    };
    // completions can take a while on long transcripts
    let resp = send(&url, client(120)?.post(&url).json(&body));
    let summary: SummarizeResponse = resp.json()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.summary.is_empty() {
        eprintln!("No summary returned.");
    } else {
        println!("{}", summary.summary);
    }
    Ok(())
}

fn do_share(server: &str, file: &Path, to: &str, subject: Option<String>) -> anyhow::Result<()> {
    let recipients = parse_recipients(to);
    if recipients.is_empty() {
        anyhow::bail!("enter at least one recipient email, separated by commas");
    }
    let summary = read_text(file)?;
    if summary.trim().is_empty() {
        anyhow::bail!("summary {} is empty", file.display());
    }

    let url = format!("{}/api/share", server);
    let body = ShareRequest {
        recipients: Some(recipients),
        subject,
        summary: Some(summary),
    };
    let resp = send(&url, client(30)?.post(&url).json(&body));
    let ack: ShareAck = resp.json()?;

    println!("{}", ack.message);
    println!("Subject:    {}", ack.subject);
    println!("Recipients: {}", ack.recipients.join(", "));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            let ok = body["ok"].as_bool().unwrap_or(false);
            println!("Minutes server: {}", if ok { "ok" } else { "unknown" });
            println!("URL:            {}", server);
        }
        Ok(r) => {
            eprintln!("minutes-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("minutes-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Upload { file } => do_upload(&server, &file),
        Commands::Summarize { file, prompt, json } => do_summarize(&server, &file, prompt, json),
        Commands::Share { file, to, subject } => do_share(&server, &file, &to, subject),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("minutes-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
