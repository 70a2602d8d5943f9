//! Append-only store of accepted entries plus the lifetime rejection counter.
//!
//! Rows are written through a [`StorageBackend`] (JSONL file or memory) and
//! mirrored in memory for read-side aggregation. Rows are never updated or
//! deleted.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::LogError;
use crate::ring::RingBuffer;
use crate::types::*;

/// Durable medium behind the store.
pub trait StorageBackend: Send {
  fn append_row(&mut self, row: &StoredEntry) -> Result<(), LogError>;
  fn write_totals(&mut self, totals: &Totals) -> Result<(), LogError>;
}

/// Keeps nothing; the in-memory mirror is the only copy.
#[derive(Debug, Default)]
pub struct MemoryBackend;

impl StorageBackend for MemoryBackend {
  fn append_row(&mut self, _row: &StoredEntry) -> Result<(), LogError> {
    Ok(())
  }

  fn write_totals(&mut self, _totals: &Totals) -> Result<(), LogError> {
    Ok(())
  }
}

/// Byte sink behind the row log.
trait LogSink: Write {
  fn size(&self) -> io::Result<u64>;
  fn truncate(&mut self, len: u64) -> io::Result<()>;
  fn sync(&mut self) -> io::Result<()>;
}

impl LogSink for File {
  fn size(&self) -> io::Result<u64> {
    Ok(self.metadata()?.len())
  }

  fn truncate(&mut self, len: u64) -> io::Result<()> {
    self.set_len(len)
  }

  fn sync(&mut self) -> io::Result<()> {
    self.sync_data()
  }
}

/// Whole-line appender. A failed append is cut back to where it started; if
/// that also fails, the next line is preceded by a newline so the partial
/// bytes stay on a line of their own.
#[derive(Debug)]
struct LineLog<S> {
  sink: S,
  torn: bool,
}

impl<S: LogSink> LineLog<S> {
  fn new(sink: S) -> Self {
    Self { sink, torn: false }
  }

  fn append(&mut self, line: &[u8]) -> io::Result<()> {
    let start = self.sink.size()?;
    match self.write_line(line) {
      Ok(()) => {
        self.torn = false;
        Ok(())
      }
      Err(e) => {
        if let Err(rollback) = self.sink.truncate(start) {
          tracing::warn!(error = %rollback, "could not cut back partial log row");
          self.torn = true;
        }
        Err(e)
      }
    }
  }

  fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
    if self.torn {
      self.sink.write_all(b"\n")?;
    }
    self.sink.write_all(line)?;
    self.sink.sync()
  }
}

/// `logs.jsonl` (one row per line) and `totals.json` under a data directory.
#[derive(Debug)]
pub struct FileBackend {
  logs: LineLog<File>,
  totals_path: PathBuf,
}

/// State recovered from disk when a file backend is opened.
#[derive(Debug, Default)]
pub struct Replay {
  pub rows: Vec<StoredEntry>,
  pub totals: Totals,
  pub skipped_lines: usize,
}

impl FileBackend {
  /// Open (creating if needed) the data directory and replay existing rows.
  pub fn open(logs_path: &Path, totals_path: &Path) -> Result<(Self, Replay), LogError> {
    if let Some(parent) = logs_path.parent() {
      fs::create_dir_all(parent)?;
    }
    let (rows, skipped_lines) = read_rows(logs_path)?;
    let replay = Replay {
      rows,
      totals: read_totals(totals_path)?,
      skipped_lines,
    };

    let mut logs = OpenOptions::new().create(true).append(true).read(true).open(logs_path)?;
    terminate_torn_tail(&mut logs)?;

    Ok((
      Self {
        logs: LineLog::new(logs),
        totals_path: totals_path.to_path_buf(),
      },
      replay,
    ))
  }
}

impl StorageBackend for FileBackend {
  fn append_row(&mut self, row: &StoredEntry) -> Result<(), LogError> {
    let mut line = serde_json::to_vec(row)?;
    line.push(b'\n');
    self.logs.append(&line)?;
    Ok(())
  }

  fn write_totals(&mut self, totals: &Totals) -> Result<(), LogError> {
    let tmp = self.totals_path.with_extension("json.tmp");
    {
      let mut file = File::create(&tmp)?;
      file.write_all(serde_json::to_string(totals)?.as_bytes())?;
      file.sync_all()?;
    }
    fs::rename(&tmp, &self.totals_path)?;
    Ok(())
  }
}

/// Parse every row; unreadable lines are skipped and counted.
fn read_rows(path: &Path) -> Result<(Vec<StoredEntry>, usize), LogError> {
  let file = match File::open(path) {
    Ok(f) => f,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
    Err(e) => return Err(e.into()),
  };
  parse_rows(BufReader::new(file))
}

/// Lines are split on raw bytes, so a tail cut inside a multi-byte character
/// is just another unreadable line.
fn parse_rows(reader: impl BufRead) -> Result<(Vec<StoredEntry>, usize), LogError> {
  let mut rows = Vec::new();
  let mut skipped = 0;
  for (lineno, line) in reader.split(b'\n').enumerate() {
    let line = line?;
    if line.iter().all(u8::is_ascii_whitespace) {
      continue;
    }
    match serde_json::from_slice::<StoredEntry>(&line) {
      Ok(row) => rows.push(row),
      Err(e) => {
        skipped += 1;
        tracing::warn!(line = lineno + 1, error = %e, "skipping unreadable log row");
      }
    }
  }
  Ok((rows, skipped))
}

fn read_totals(path: &Path) -> Result<Totals, LogError> {
  match fs::read_to_string(path) {
    Ok(s) if s.trim().is_empty() => Ok(Totals::default()),
    Ok(s) => Ok(serde_json::from_str(&s)?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Totals::default()),
    Err(e) => Err(e.into()),
  }
}

/// A crash mid-append can leave a partial last line; start the next row on
/// a fresh line so it stays readable.
fn terminate_torn_tail(file: &mut File) -> Result<(), LogError> {
  if file.metadata()?.len() == 0 {
    return Ok(());
  }
  let mut last = [0u8; 1];
  file.seek(SeekFrom::End(-1))?;
  file.read_exact(&mut last)?;
  if last[0] != b'\n' {
    file.write_all(b"\n")?;
  }
  Ok(())
}

struct Writer {
  backend: Box<dyn StorageBackend>,
  next_id: u64,
  totals: Totals,
}

/// Shared store. Writes are serialized; reads see a best-effort snapshot.
pub struct Store {
  writer: Mutex<Writer>,
  rows: RwLock<Vec<StoredEntry>>,
  recent_batches: RingBuffer<BatchSummary>,
  recent_rejections: RingBuffer<RejectionRecord>,
}

impl Store {
  /// Open the durable JSONL store under `config.data_dir`.
  pub fn open(config: &Config) -> Result<Self, LogError> {
    let (backend, replay) = FileBackend::open(&config.logs_path(), &config.totals_path())?;
    tracing::info!(
      path = %config.logs_path().display(),
      rows = replay.rows.len(),
      total_rejected = replay.totals.total_rejected,
      skipped = replay.skipped_lines,
      "log store opened"
    );
    Ok(Self::with_backend(Box::new(backend), replay.rows, replay.totals, config))
  }

  /// Ephemeral store with no durability.
  pub fn in_memory(config: &Config) -> Self {
    Self::with_backend(Box::new(MemoryBackend), Vec::new(), Totals::default(), config)
  }

  pub fn with_backend(
    backend: Box<dyn StorageBackend>,
    mut rows: Vec<StoredEntry>,
    totals: Totals,
    config: &Config,
  ) -> Self {
    rows.sort_by_key(|r| r.id);
    let next_id = rows.last().map(|r| r.id + 1).unwrap_or(1);
    Self {
      writer: Mutex::new(Writer {
        backend,
        next_id,
        totals,
      }),
      rows: RwLock::new(rows),
      recent_batches: RingBuffer::new(config.recent_batches_capacity),
      recent_rejections: RingBuffer::new(config.recent_rejections_capacity),
    }
  }

  /// Insert a new row and return its id. Ids increase monotonically; a
  /// failed write consumes no id.
  pub fn append(
    &self,
    entry: CanonicalLogEntry,
    fingerprint: Fingerprint,
    group_id: String,
  ) -> Result<u64, LogError> {
    let mut writer = self.writer.lock();
    let row = StoredEntry {
      id: writer.next_id,
      entry,
      fingerprint,
      group_id,
      created_at: Utc::now(),
    };
    writer.backend.append_row(&row)?;
    writer.next_id += 1;
    let id = row.id;
    self.rows.write().push(row);
    Ok(id)
  }

  /// Add to the lifetime rejection counter and return the new total. The
  /// counter is unchanged if persisting it fails.
  pub fn increment_rejected(&self, count: u64) -> Result<u64, LogError> {
    let mut writer = self.writer.lock();
    let updated = Totals {
      total_rejected: writer.totals.total_rejected + count,
    };
    writer.backend.write_totals(&updated)?;
    writer.totals = updated;
    Ok(updated.total_rejected)
  }

  pub fn total_rejected(&self) -> u64 {
    self.writer.lock().totals.total_rejected
  }

  pub fn total_accepted(&self) -> u64 {
    self.rows.read().len() as u64
  }

  /// The `n` most recently appended rows, newest first.
  pub fn recent(&self, n: usize) -> Vec<StoredEntry> {
    self.rows.read().iter().rev().take(n).cloned().collect()
  }

  /// Run a read-only pass over all rows in id order.
  pub fn scan<R>(&self, f: impl FnOnce(&[StoredEntry]) -> R) -> R {
    let rows = self.rows.read();
    f(&rows)
  }

  pub fn record_batch(&self, summary: BatchSummary) {
    self.recent_batches.push(summary);
  }

  pub fn record_rejections(&self, records: Vec<RejectionRecord>) {
    self.recent_rejections.extend(records);
  }

  /// Recent batch summaries, oldest first.
  pub fn recent_batches(&self) -> Vec<BatchSummary> {
    self.recent_batches.snapshot()
  }

  /// Recent rejections, newest first.
  pub fn recent_rejections(&self, limit: usize) -> Vec<RejectionRecord> {
    self.recent_rejections.latest(limit)
  }
}
