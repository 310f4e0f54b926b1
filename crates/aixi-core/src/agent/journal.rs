//! Record of model updates applied under an open checkpoint.

use serde::Serialize;

/// Which half of a cycle an update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Percept,
    Action,
}

/// One encoded block pushed into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub kind: UpdateKind,
    /// Symbols appended to the history.
    pub symbols: u32,
    /// False when the block only extended the history (priming), so undoing
    /// it must not touch tree statistics.
    pub modelled: bool,
}
