//! Streak tracking and the client-local key/value state it persists to.
//!
//! Keys mirror what a device would keep locally:
//!   - `endlessHighScore`: best streak ever reached
//!   - `pendingStreak`:    a streak that just ended and has not been named yet

use std::{
  collections::BTreeMap,
  fs::{self, File},
  io::{BufReader, BufWriter, Write},
  path::{Path, PathBuf},
  sync::{Arc, Mutex, MutexGuard},
};

use tempfile::NamedTempFile;
use tracing::{info, instrument, warn};

use crate::error::LocalStoreError;

pub const BEST_STREAK_KEY: &str = "endlessHighScore";
pub const PENDING_STREAK_KEY: &str = "pendingStreak";

/// String-keyed local persistence.
pub trait LocalStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;
  fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;
  fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryLocalStore {
  values: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemoryLocalStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[cfg(test)]
impl LocalStore for MemoryLocalStore {
  fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
    Ok(lock(&self.values).get(key).cloned())
  }
  fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
    lock(&self.values).insert(key.to_string(), value.to_string());
    Ok(())
  }
  fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
    lock(&self.values).remove(key);
    Ok(())
  }
}

/// JSON object on disk, rewritten atomically (temp file + rename) on every change.
pub struct JsonFileStore {
  path: PathBuf,
  // Serializes read-modify-write cycles within this process.
  guard: Mutex<()>,
}

impl JsonFileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), guard: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn read_all(&self) -> Result<BTreeMap<String, String>, LocalStoreError> {
    let file = match File::open(&self.path) {
      Ok(f) => f,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
      Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_reader(BufReader::new(file))?)
  }

  fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), LocalStoreError> {
    let parent_dir = self
      .path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir)?;

    let temp_file = NamedTempFile::new_in(parent_dir)?;
    {
      let mut writer = BufWriter::new(&temp_file);
      serde_json::to_writer_pretty(&mut writer, values)?;
      writer.flush()?;
    }
    temp_file.persist(&self.path)?;
    Ok(())
  }

  fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), LocalStoreError> {
    let _g = lock(&self.guard);
    let mut values = self.read_all()?;
    f(&mut values);
    self.write_all(&values)
  }
}

impl LocalStore for JsonFileStore {
  fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
    let _g = lock(&self.guard);
    Ok(self.read_all()?.get(key).cloned())
  }
  fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
    self.update(|m| {
      m.insert(key.to_string(), value.to_string());
    })
  }
  fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
    self.update(|m| {
      m.remove(key);
    })
  }
}

fn read_count(store: &dyn LocalStore, key: &str) -> Result<Option<u32>, LocalStoreError> {
  Ok(store.get(key)?.and_then(|raw| match raw.trim().parse::<u32>() {
    Ok(n) => Some(n),
    Err(_) => {
      warn!(target: "session", %key, %raw, "Ignoring non-numeric local value");
      None
    }
  }))
}

/// Result of ending a streak.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreakEnd {
  pub ended: u32,
  pub new_best: bool,
}

/// Running and best streak for the single local player.
pub struct StreakTracker {
  store: Arc<dyn LocalStore>,
  current: u32,
  best: u32,
}

impl StreakTracker {
  /// Start a tracker with the persisted best streak; the running streak
  /// always starts at zero.
  pub fn load(store: Arc<dyn LocalStore>) -> Self {
    let best = match read_count(store.as_ref(), BEST_STREAK_KEY) {
      Ok(v) => v.unwrap_or(0),
      Err(e) => {
        warn!(target: "session", error = %e, "Could not read best streak; starting from 0");
        0
      }
    };
    Self { store, current: 0, best }
  }

  pub fn current(&self) -> u32 {
    self.current
  }

  pub fn best(&self) -> u32 {
    self.best
  }

  pub fn record_win(&mut self) -> u32 {
    self.current += 1;
    self.current
  }

  /// End the running streak. The persisted best is re-read and only
  /// overwritten when beaten (last writer wins); a non-zero streak is parked
  /// as pending so it can be claimed on the leaderboard. The running streak
  /// resets even when persisting fails.
  #[instrument(level = "info", skip(self), fields(current = self.current, best = self.best))]
  pub fn record_loss(&mut self) -> Result<StreakEnd, LocalStoreError> {
    let ended = std::mem::take(&mut self.current);
    let stored_best = read_count(self.store.as_ref(), BEST_STREAK_KEY)?.unwrap_or(0);
    let new_best = ended > stored_best;
    if new_best {
      self.store.set(BEST_STREAK_KEY, &ended.to_string())?;
      info!(target: "session", ended, previous = stored_best, "New best streak");
    }
    self.best = self.best.max(stored_best).max(ended);
    if ended > 0 {
      self.store.set(PENDING_STREAK_KEY, &ended.to_string())?;
    }
    Ok(StreakEnd { ended, new_best })
  }

  pub fn pending(&self) -> Result<Option<u32>, LocalStoreError> {
    read_count(self.store.as_ref(), PENDING_STREAK_KEY)
  }

  /// Take the pending streak, clearing it.
  pub fn claim_pending(&self) -> Result<Option<u32>, LocalStoreError> {
    let pending = self.pending()?;
    if pending.is_some() {
      self.store.remove(PENDING_STREAK_KEY)?;
    }
    Ok(pending)
  }
}
