use compiler::CommandKind;
use serde::Serialize;

/// One executed statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub kind: CommandKind,
    pub entity: String,
    pub sql: String,
    /// Identity produced by an INSERT, when one was reported.
    pub last_id: Option<i64>,
}

/// Ordered log of the statements a session executed.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SqlHistory {
    entries: Vec<HistoryEntry>,
}

impl SqlHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: CommandKind, entity: impl Into<String>, sql: impl Into<String>) {
        self.entries.push(HistoryEntry {
            kind,
            entity: entity.into(),
            sql: sql.into(),
            last_id: None,
        });
    }

    /// Attach an insert identity to the most recent entry.
    pub fn set_last_id(&mut self, id: i64) {
        if let Some(entry) = self.entries.last_mut() {
            entry.last_id = Some(id);
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Entries of one command kind, oldest first.
    pub fn of_kind(&self, kind: CommandKind) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
