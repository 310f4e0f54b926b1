//! Per-cycle telemetry records and the sinks that receive them.

use std::io::Write;
use std::sync::Mutex;

use aixi_common::{Action, Observation, Result, Reward};
use serde::{Deserialize, Serialize};

/// One row of the experiment log, written after the action is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    /// Index of the game within a transfer run (0 for a single game).
    pub game: usize,
    pub environment: String,
    pub global_cycle: u64,
    /// Cycle within the current episode, starting at 1.
    pub cycle: u64,
    pub observation: Observation,
    pub reward: Reward,
    pub action: Action,
    /// Training phase active.
    pub explore_on: bool,
    /// This action was a random exploration step.
    pub explored: bool,
    pub explore_rate: f64,
    pub total_reward: u64,
    pub average_reward: f64,
    /// The environment reported the end of the episode.
    pub finished: bool,
}

/// Receives cycle records as they are produced.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, record: &CycleRecord) -> Result<()>;

    /// Push buffered records to their destination.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _record: &CycleRecord) -> Result<()> {
        Ok(())
    }
}

/// JSONL writer for cycle records.
pub struct JsonlWriter<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> TelemetrySink for JsonlWriter<W> {
    fn record(&self, record: &CycleRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        writer.flush()?;
        Ok(())
    }
}

/// Keeps every record in memory; used by tests and short interactive runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CycleRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CycleRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn record(&self, record: &CycleRecord) -> Result<()> {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.push(record.clone());
        Ok(())
    }
}
