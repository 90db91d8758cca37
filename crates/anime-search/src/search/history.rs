//! Navigation history seen by the search coordinator.

use std::sync::{Arc, Mutex};

/// The router's view of the current location
///
/// The coordinator reads the query string once at startup and afterwards
/// only replaces it. Replacing must not add a history entry.
pub trait History: Send {
    /// Current query string, without the leading `?`
    fn search(&self) -> String;

    /// Replace the current entry's query string in place
    fn replace_search(&mut self, search: &str);
}

#[derive(Debug, Default)]
struct Entry {
    path: String,
    search: String,
    replacements: usize,
}

/// In-process history with a single entry
///
/// Clones share the same entry, so a caller can keep one to observe what the
/// coordinator writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entry: Arc<Mutex<Entry>>,
}

impl MemoryHistory {
    /// Start at `location`, e.g. `/` or `/?q=naruto&page=3`
    pub fn new(location: &str) -> Self {
        let location = location.split('#').next().unwrap_or("");
        let (path, search) = location.split_once('?').unwrap_or((location, ""));
        let path = if path.is_empty() { "/" } else { path };

        Self {
            entry: Arc::new(Mutex::new(Entry {
                path: path.to_string(),
                search: search.to_string(),
                replacements: 0,
            })),
        }
    }

    /// Full location, `path` plus `?search` when there is one
    pub fn location(&self) -> String {
        let entry = self.lock();
        if entry.search.is_empty() {
            entry.path.clone()
        } else {
            format!("{}?{}", entry.path, entry.search)
        }
    }

    /// How many times the entry was replaced
    pub fn replacements(&self) -> usize {
        self.lock().replacements
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entry> {
        // A panic while holding the lock cannot leave Entry half-written
        self.entry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl History for MemoryHistory {
    fn search(&self) -> String {
        self.lock().search.clone()
    }

    fn replace_search(&mut self, search: &str) {
        let mut entry = self.lock();
        entry.search = search.to_string();
        entry.replacements += 1;
    }
}
