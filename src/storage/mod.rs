pub mod json_file;
pub mod memory;
pub mod traits;

use crate::{
    error::{Result, StudioError},
    models::HistoryEntry,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

pub const HISTORY_STORAGE_KEY: &str = "imagen-4-history";
pub const HISTORY_CAPACITY: usize = 12;

/// Most-recent-first list of past results, capped at [`HISTORY_CAPACITY`].
///
/// The whole list is written back to the store on every mutation. Entries are
/// never updated or removed individually; the oldest falls off when a new one
/// arrives at capacity.
pub struct HistoryCache {
    store: Box<dyn KeyValueStore>,
    entries: Vec<HistoryEntry>,
}

impl HistoryCache {
    /// Rehydrates from `store`. Malformed persisted data is discarded.
    pub fn load<S: KeyValueStore + 'static>(store: S) -> Self {
        let mut store: Box<dyn KeyValueStore> = Box::new(store);

        let entries = match read_entries(store.as_ref()) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                entries
            }
            Err(e) => {
                log::warn!("Failed to parse history from storage: {}", e);
                if let Err(e) = store.remove(HISTORY_STORAGE_KEY) {
                    log::warn!("Failed to clear corrupted history: {}", e);
                }
                Vec::new()
            }
        };

        log::debug!("Loaded {} history entries", entries.len());
        Self { store, entries }
    }

    pub fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAPACITY);

        let serialized = serde_json::to_string(&self.entries)?;
        self.store.set(HISTORY_STORAGE_KEY, &serialized)
    }

    /// A timestamp id strictly newer than the newest entry.
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now())
    }

    pub fn next_id_at(&self, now: DateTime<Utc>) -> String {
        let now = truncate_to_millis(now);
        let id = match self.newest_timestamp() {
            Some(newest) if now <= newest => newest + Duration::milliseconds(1),
            _ => now,
        };
        id.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries
            .first()
            .and_then(|entry| DateTime::parse_from_rfc3339(&entry.id).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }
}

fn read_entries(store: &dyn KeyValueStore) -> Result<Vec<HistoryEntry>> {
    match store.get(HISTORY_STORAGE_KEY)? {
        None => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(&raw)
            .map_err(|e| StudioError::PersistedStateCorrupt(e.to_string())),
    }
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ts.timestamp_millis()).unwrap_or(ts)
}
