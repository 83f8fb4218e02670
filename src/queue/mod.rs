// Queue reader: turns the input file into a sequence of leads. Bounded mode
// reads a finished .json array (or a finished .jsonl) once; streaming mode
// tails a still-growing .jsonl until the sentinel line arrives.
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{Lead, Result};

/// A line containing exactly this token ends streaming consumption.
pub const SENTINEL: &str = "__END__";

/// Loads every lead from a finished input file. `.jsonl` inputs are drained
/// line by line; anything else is parsed as one JSON array. Malformed
/// entries are skipped, never fatal.
pub async fn load_bounded(path: &str) -> Result<Vec<Lead>> {
    let content = tokio::fs::read_to_string(path).await?;

    if path.to_lowercase().ends_with(".jsonl") {
        return Ok(content.lines().filter_map(parse_line).collect());
    }

    let parsed: serde_json::Value = serde_json::from_str(&content)?;
    let items = match parsed {
        serde_json::Value::Array(items) => items,
        _ => return Err("input file is not a JSON array".into()),
    };

    Ok(items
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::Object(map) => Some(Lead(map)),
            other => {
                warn!("Skipping non-object queue entry: {}", other);
                None
            }
        })
        .collect())
}

fn parse_line(line: &str) -> Option<Lead> {
    let line = line.trim();
    if line.is_empty() || line == SENTINEL {
        return None;
    }
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(line) {
        Ok(map) => Some(Lead(map)),
        Err(_) => {
            debug!("Skipping malformed queue line");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    Init,
    Backfill,
    Follow,
    Done,
}

/// Pull-based stream over a growing JSONL queue. A background task polls the
/// file for appended lines and pushes parsed leads into a channel; the
/// consumer just awaits `recv`. The task ends only on the sentinel line or
/// when the consumer goes away.
pub struct LeadStream {
    rx: mpsc::Receiver<Lead>,
}

impl LeadStream {
    pub fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let path = path.into();
        tokio::spawn(async move {
            if let Err(e) = tail_queue(path, poll_interval, tx).await {
                warn!("Queue tail reader stopped with error: {}", e);
            }
        });
        Self { rx }
    }

    /// Next lead, or `None` once the sentinel has been consumed. Blocks
    /// (non-busy) while the queue is idle but still open.
    pub async fn recv(&mut self) -> Option<Lead> {
        self.rx.recv().await
    }
}

async fn tail_queue(
    path: PathBuf,
    poll_interval: Duration,
    tx: mpsc::Sender<Lead>,
) -> Result<()> {
    let mut state = ReaderState::Init;
    let mut offset: u64 = 0;
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let mut file = tokio::fs::File::open(&path).await?;
        file.seek(SeekFrom::Start(offset)).await?;
        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk).await?;

        if state == ReaderState::Init {
            state = ReaderState::Backfill;
            debug!("Queue reader: backfilling existing entries");
        }

        if chunk.is_empty() {
            if state == ReaderState::Backfill {
                state = ReaderState::Follow;
                debug!("Queue reader: backfill complete, following for new entries");
            }
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        offset += chunk.len() as u64;
        pending.extend_from_slice(&chunk);

        // Only newline-terminated lines are complete; a partial tail line
        // stays pending until a later write finishes it.
        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]).into_owned();
            if line.trim() == SENTINEL {
                state = ReaderState::Done;
                debug!("Queue reader: sentinel observed, state {:?}", state);
                return Ok(());
            }
            if let Some(lead) = parse_line(&line) {
                if tx.send(lead).await.is_err() {
                    // Consumer dropped the stream.
                    return Ok(());
                }
            }
        }
    }
}
