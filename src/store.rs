// TaskStore: the authoritative task collection, mirrored into a storage slot

use crate::storage::{KeyValueStorage, validate_key};
use crate::task::{DEFAULT_DATE_FORMAT, Stats, Task, TaskId, format_created_at, now, validate_date_format};
use chrono::{DateTime, Local};
use eyre::{Context, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Default name of the storage slot holding the collection
pub const DEFAULT_KEY: &str = "azure-tasks";

/// Ordered, newest-first task collection persisted under a single storage key
///
/// Every mutating operation rewrites the whole slot before returning the
/// updated collection. A failed write is logged and the in-memory state is
/// kept; call [`TaskStore::save`] to observe the error instead.
pub struct TaskStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
    last_id: TaskId,
    date_format: String,
}

impl<S: KeyValueStorage> TaskStore<S> {
    /// Open the store, loading whatever collection `key` currently holds
    pub fn open(storage: S, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let tasks = Self::load(&storage, &key);
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        info!(key = %key, count = tasks.len(), "Opened task store");

        Ok(Self {
            storage,
            key,
            tasks,
            last_id,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        })
    }

    /// Use a different chrono format string for `createdAt` on new tasks
    ///
    /// An invalid format is logged and the default is kept.
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        match validate_date_format(&format) {
            Ok(()) => self.date_format = format,
            Err(e) => warn!(error = ?e, "Keeping default date format"),
        }
        self
    }

    /// Read the collection stored under `key`
    ///
    /// An absent, unreadable or unparseable slot yields an empty collection.
    /// Records repeating an earlier id or carrying blank text are dropped.
    pub fn load(storage: &S, key: &str) -> Vec<Task> {
        let raw = match storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "No stored tasks, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key, error = ?e, "Failed to read stored tasks, starting empty");
                return Vec::new();
            }
        };

        let stored: Vec<Task> = match serde_json::from_str(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(key, error = ?e, "Failed to parse stored tasks, starting empty");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let tasks: Vec<Task> = stored
            .into_iter()
            .filter(|task| {
                if task.text.trim().is_empty() {
                    warn!(key, id = task.id, "Dropping stored task with blank text");
                    return false;
                }
                if !seen.insert(task.id) {
                    warn!(key, id = task.id, "Dropping stored task with duplicate id");
                    return false;
                }
                true
            })
            .collect();

        info!(key, count = tasks.len(), "Loaded stored tasks");
        tasks
    }

    /// Current collection, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Find a task by id
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Total and completed counts
    pub fn stats(&self) -> Stats {
        Stats::of(&self.tasks)
    }

    /// Name of the storage slot
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Give back the underlying storage
    pub fn into_storage(self) -> S {
        self.storage
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task at the front of the collection
    ///
    /// Text is trimmed; blank text is ignored and nothing is written.
    pub fn create(&mut self, text: &str) -> &[Task] {
        self.create_at(text, now())
    }

    fn create_at(&mut self, text: &str, at: DateTime<Local>) -> &[Task] {
        let text = text.trim();
        if text.is_empty() {
            debug!("create: ignoring blank text");
            return &self.tasks;
        }

        let id = self.next_id(at.timestamp_millis());
        let task = Task::new(id, text, format_created_at(&at, &self.date_format));
        debug!(id, text, "create: adding task");

        self.tasks.insert(0, task);
        self.persist();
        &self.tasks
    }

    /// Flip `completed` on the task with `id`; unknown ids change nothing
    pub fn toggle(&mut self, id: TaskId) -> &[Task] {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.completed = !task.completed;
                debug!(id, completed = task.completed, "toggle: flipped task");
            }
            None => debug!(id, "toggle: no such task"),
        }

        self.persist();
        &self.tasks
    }

    /// Remove the task with `id`; unknown ids change nothing
    pub fn delete(&mut self, id: TaskId) -> &[Task] {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        debug!(id, removed = before - self.tasks.len(), "delete: done");

        self.persist();
        &self.tasks
    }

    /// Remove every completed task
    pub fn clear_completed(&mut self) -> &[Task] {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        debug!(removed = before - self.tasks.len(), "clear_completed: done");

        self.persist();
        &self.tasks
    }

    /// Remove every task
    ///
    /// Unconditional; asking the user first is up to the caller.
    pub fn clear_all(&mut self) -> &[Task] {
        debug!(removed = self.tasks.len(), "clear_all: done");
        self.tasks.clear();

        self.persist();
        &self.tasks
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the whole collection to the storage slot
    pub fn save(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).context("Failed to serialize tasks")?;
        self.storage
            .set_item(&self.key, &json)
            .with_context(|| format!("Failed to persist tasks to '{}'", self.key))?;
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(key = %self.key, error = ?e, "Tasks not persisted; in-memory state kept");
        }
    }

    /// Millisecond timestamp id, bumped past the last issued id when needed
    ///
    /// Once ids reach `i64::MAX` the smallest free id at or after `at_ms` is
    /// used instead.
    fn next_id(&mut self, at_ms: i64) -> TaskId {
        let Some(next) = self.last_id.checked_add(1) else {
            return self.free_id_from(at_ms);
        };
        let id = at_ms.max(next);
        self.last_id = id;
        id
    }

    fn free_id_from(&self, at_ms: i64) -> TaskId {
        let used: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        (at_ms..=i64::MAX)
            .chain(i64::MIN..at_ms)
            .find(|id| !used.contains(id))
            .unwrap_or(at_ms)
    }
}
