// src/ingest/log.rs
//! Append-only headline log with exact-duplicate compaction.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::types::LogRecord;

pub const LOG_HEADER: &str = "title,category,source";

#[async_trait::async_trait]
pub trait HeadlineSink: Send + Sync {
    /// Append rows to the persisted history.
    async fn append(&self, rows: Vec<LogRecord>) -> Result<()>;
    /// Collapse exact-duplicate rows across the whole history.
    /// Returns how many rows were removed.
    async fn compact(&self) -> Result<usize>;
}

/// CSV file sink (`title,category,source`).
#[derive(Debug, Clone)]
pub struct CsvHeadlineLog {
    path: PathBuf,
}

impl CsvHeadlineLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(s: &str) -> String {
    let flat = s.replace(['\r', '\n'], " ");
    if flat.contains([',', '"']) {
        format!("\"{}\"", flat.replace('"', "\"\""))
    } else {
        flat
    }
}

pub fn csv_row(r: &LogRecord) -> String {
    format!(
        "{},{},{}",
        csv_field(&r.title),
        csv_field(&r.category),
        csv_field(&r.source)
    )
}

pub fn append_rows(path: &Path, rows: &[LogRecord]) -> Result<()> {
    let is_new = !path.exists() || fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut buf = String::new();
    if is_new {
        buf.push_str(LOG_HEADER);
        buf.push('\n');
    }
    for r in rows {
        buf.push_str(&csv_row(r));
        buf.push('\n');
    }
    f.write_all(buf.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Keep the header plus the first occurrence of every data row.
/// Rewrites through a temp file + rename.
pub fn remove_duplicate_rows(path: &Path) -> Result<usize> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return Ok(0);
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique: Vec<&str> = Vec::new();
    let mut total = 0usize;
    for line in lines {
        total += 1;
        if seen.insert(line) {
            unique.push(line);
        }
    }
    let removed = total - unique.len();
    if removed == 0 {
        return Ok(0);
    }

    let mut out = String::with_capacity(content.len());
    out.push_str(header);
    out.push('\n');
    for line in unique {
        out.push_str(line);
        out.push('\n');
    }

    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, out).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(removed)
}

/// I/O errors come back as `Err`; a panic in the blocking task is re-raised
/// so the caller's task fails the same way.
async fn join_blocking<T>(handle: tokio::task::JoinHandle<Result<T>>) -> Result<T> {
    match handle.await {
        Ok(res) => res,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(e).context("blocking log task cancelled"),
    }
}

#[async_trait::async_trait]
impl HeadlineSink for CsvHeadlineLog {
    async fn append(&self, rows: Vec<LogRecord>) -> Result<()> {
        let path = self.path.clone();
        join_blocking(tokio::task::spawn_blocking(move || append_rows(&path, &rows))).await
    }

    async fn compact(&self) -> Result<usize> {
        let path = self.path.clone();
        join_blocking(tokio::task::spawn_blocking(move || remove_duplicate_rows(&path))).await
    }
}

// --- Test helper ---
#[derive(Default)]
pub struct MockSink {
    pub rows: std::sync::Mutex<Vec<LogRecord>>,
    pub compactions: std::sync::atomic::AtomicUsize,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HeadlineSink for MockSink {
    async fn append(&self, mut rows: Vec<LogRecord>) -> Result<()> {
        self.rows
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .append(&mut rows);
        Ok(())
    }

    async fn compact(&self) -> Result<usize> {
        self.compactions
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap_or_else(|p| p.into_inner());
        let before = rows.len();
        let mut seen = Vec::new();
        rows.retain(|r| {
            if seen.contains(r) {
                false
            } else {
                seen.push(r.clone());
                true
            }
        });
        Ok(before - rows.len())
    }
}
