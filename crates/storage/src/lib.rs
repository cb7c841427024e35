use anyhow::{Context, Result};
use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use shared::domain::{CounterSet, Label};

/// The fixed label set plus the historical renames applied on load.
#[derive(Debug, Clone, Default)]
pub struct CounterSchema {
    labels: Vec<Label>,
    renames: Vec<(String, Label)>,
}

impl CounterSchema {
    pub fn new<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        Self {
            labels: labels.into_iter().collect(),
            renames: Vec::new(),
        }
    }

    /// Maps a key found in older stats files onto its current label.
    pub fn with_rename(mut self, legacy: impl Into<String>, current: Label) -> Self {
        self.renames.push((legacy.into(), current));
        self
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn zeroed(&self) -> CounterSet {
        CounterSet::zeroed(self.labels.iter().cloned())
    }
}

/// File-backed interaction counters.
///
/// Clones share one in-memory set. Every mutation and every file write runs
/// under the same lock, so snapshots never see a half-applied change and
/// writes never interleave.
#[derive(Clone)]
pub struct CounterStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    counters: Mutex<CounterSet>,
}

impl CounterStore {
    /// Opens the store at `path`. Never fails: unreadable state starts from zero.
    pub fn load(path: impl Into<PathBuf>, schema: &CounterSchema) -> Self {
        let path = path.into();
        let counters = load_counter_set(&path, schema);
        Self {
            inner: Arc::new(Inner {
                path,
                counters: Mutex::new(counters),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Adds one to `label` and persists. Unknown labels are left alone.
    pub fn increment(&self, label: &str) -> Option<u64> {
        let mut counters = self.lock();
        let count = counters.increment(label)?;
        self.save_locked(&counters);
        Some(count)
    }

    pub fn reset(&self) {
        let mut counters = self.lock();
        counters.reset();
        self.save_locked(&counters);
    }

    /// Writes the current counters to disk.
    pub fn save(&self) {
        let counters = self.lock();
        self.save_locked(&counters);
    }

    pub fn snapshot(&self) -> CounterSet {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, CounterSet> {
        self.inner
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, counters: &CounterSet) {
        if let Err(error) = write_counter_set(&self.inner.path, counters) {
            error!(
                path = %self.inner.path.display(),
                error = %format!("{error:#}"),
                "failed to save interaction counters; keeping in-memory state"
            );
        }
    }
}

/// Reads the stats file, falling back to all-zero counters on any failure.
pub fn load_counter_set(path: &Path, schema: &CounterSchema) -> CounterSet {
    match read_counter_set(path, schema) {
        Ok(Some(counters)) => counters,
        Ok(None) => {
            info!(path = %path.display(), "no stats file yet; starting from zero");
            schema.zeroed()
        }
        Err(error) => {
            error!(
                path = %path.display(),
                error = %format!("{error:#}"),
                "failed to load interaction counters; starting from zero"
            );
            schema.zeroed()
        }
    }
}

fn read_counter_set(path: &Path, schema: &CounterSchema) -> Result<Option<CounterSet>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    let stored: HashMap<String, u64> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a label-to-count object", path.display()))?;

    Ok(Some(normalize(stored, schema)))
}

fn normalize(mut stored: HashMap<String, u64>, schema: &CounterSchema) -> CounterSet {
    for (legacy, current) in &schema.renames {
        let Some(legacy_count) = stored.remove(legacy) else {
            continue;
        };
        let entry = stored.entry(current.as_str().to_string()).or_insert(0);
        *entry = entry.saturating_add(legacy_count);
        info!(%legacy, %current, legacy_count, "migrated legacy stats key");
    }

    let mut counters = schema.zeroed();
    for (key, count) in stored {
        if !counters.set(&key, count) {
            warn!(label = %key, count, "dropping stats entry for unknown label");
        }
    }
    counters
}

fn write_counter_set(path: &Path, counters: &CounterSet) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory '{}'", parent.display()))?;

    let body = serde_json::to_vec_pretty(counters).context("failed to serialize counters")?;

    let mut staged = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to stage stats file in '{}'", parent.display()))?;
    staged
        .write_all(&body)
        .and_then(|()| staged.as_file().sync_all())
        .context("failed to write staged stats file")?;
    staged
        .persist(path)
        .with_context(|| format!("failed to replace '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
