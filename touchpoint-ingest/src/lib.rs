//! touchpoint-ingest — file I/O for sessions, spend and attribution output
//!
//! Record files are either a JSON array (`.json`) or JSON lines
//! (`.jsonl` / `.ndjson`, one object per line, blank lines skipped).
//! Output is always written as pretty-printed JSON.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use touchpoint_core::{CampaignSpend, Session, SyntheticData};

pub const SESSIONS_FILE: &str = "sessions.json";
pub const SPEND_FILE: &str = "campaign_spend.json";

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}{}: {source}", .line.map(|l| format!(" (line {})", l)).unwrap_or_default())]
    Json {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize output for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported file format: {0} (expected .json, .jsonl or .ndjson)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    JsonArray,
    JsonLines,
}

fn detect_format(path: &Path) -> Result<Format, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(Format::JsonArray),
        Some("jsonl") | Some("ndjson") => Ok(Format::JsonLines),
        _ => Err(IngestError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> IngestError + '_ {
    move |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load a record file of any supported format.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, IngestError> {
    let format = detect_format(path)?;
    let file = File::open(path).map_err(io_err(path))?;
    let reader = BufReader::new(file);

    let records: Vec<T> = match format {
        Format::JsonArray => serde_json::from_reader(reader).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            line: None,
            source,
        })?,
        Format::JsonLines => {
            let mut records = Vec::new();
            for (idx, line) in reader.lines().enumerate() {
                let line = line.map_err(io_err(path))?;
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(&line).map_err(|source| IngestError::Json {
                    path: path.to_path_buf(),
                    line: Some(idx + 1),
                    source,
                })?;
                records.push(record);
            }
            records
        }
    };

    tracing::debug!(path = %path.display(), records = records.len(), "Loaded records");
    Ok(records)
}

pub fn load_sessions(path: &Path) -> Result<Vec<Session>, IngestError> {
    let sessions: Vec<Session> = load_records(path)?;
    tracing::info!("Loaded {} sessions from {}", sessions.len(), path.display());
    Ok(sessions)
}

pub fn load_spend(path: &Path) -> Result<Vec<CampaignSpend>, IngestError> {
    let rows: Vec<CampaignSpend> = load_records(path)?;
    tracing::info!("Loaded {} spend rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Write any serializable value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IngestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let file = File::create(path).map_err(io_err(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| IngestError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err(path))?;
    writer.flush().map_err(io_err(path))?;
    Ok(())
}

/// Write a generated dataset as `sessions.json` + `campaign_spend.json` under `dir`.
///
/// Returns the two paths written.
pub fn write_dataset(dir: &Path, data: &SyntheticData) -> Result<(PathBuf, PathBuf), IngestError> {
    let sessions_path = dir.join(SESSIONS_FILE);
    let spend_path = dir.join(SPEND_FILE);

    write_json(&sessions_path, &data.sessions)?;
    write_json(&spend_path, &data.campaign_spend)?;

    tracing::info!(
        "Wrote {} sessions and {} spend rows to {}",
        data.sessions.len(),
        data.campaign_spend.len(),
        dir.display()
    );
    Ok((sessions_path, spend_path))
}
