//! Per-key lockable table of versioned records.
//!
//! Each key owns a slot (`Arc<Mutex<Option<Versioned<T>>>>`). Operations on
//! the same key serialize on that slot's mutex; operations on different keys
//! never touch each other's lock. The outer map is only write-locked to
//! insert a new slot, and slots are never removed, so an `Arc` handed out
//! once stays the authoritative cell for that key. Only writes insert slots:
//! reads, updates and rejected requests go through
//! [`Table::existing_slot`], which never grows the map.
//!
//! A multi-step transition locks the slot, reads the record, stages a new
//! value, validates it, and calls [`SlotGuard::commit`]. Commit cannot fail,
//! so a transition that validates everything first is all-or-nothing.

use std::{
    collections::HashMap,
    fmt::Display,
    hash::Hash,
    sync::Arc,
};

use parking_lot::{Mutex, MutexGuard, RwLock};
use vaultguard_types::{GuardError, Record, Result};

/// A record plus its commit counter.
///
/// `version` starts at 1 on first commit and increases by one on every
/// subsequent commit. Version 0 means "no record".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

type Cell<T> = Arc<Mutex<Option<Versioned<T>>>>;

/// Keyed storage for one record kind.
pub struct Table<K, T> {
    slots: RwLock<HashMap<K, Cell<T>>>,
}

impl<K, T> Table<K, T>
where
    K: Eq + Hash + Ord + Clone + Display,
    T: Record,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn existing_cell(&self, key: &K) -> Option<Cell<T>> {
        self.slots.read().get(key).cloned()
    }

    /// The lockable slot for `key`, creating an empty one if needed.
    pub fn slot(&self, key: &K) -> Slot<K, T> {
        if let Some(cell) = self.existing_cell(key) {
            return Slot {
                key: key.clone(),
                cell,
            };
        }
        let cell = self
            .slots
            .write()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone();
        Slot {
            key: key.clone(),
            cell,
        }
    }

    /// The lockable slot for `key` if one exists.
    ///
    /// # Errors
    /// Returns [`GuardError::NotFound`] if nothing was ever written under `key`.
    pub fn existing_slot(&self, key: &K) -> Result<Slot<K, T>> {
        self.existing_cell(key)
            .map(|cell| Slot {
                key: key.clone(),
                cell,
            })
            .ok_or_else(|| not_found::<K, T>(key))
    }

    /// Existing slots for `keys`, deduplicated and in ascending key order.
    ///
    /// Locking them in the returned order is the table's deadlock-free
    /// discipline for multi-key transitions.
    ///
    /// # Errors
    /// Returns [`GuardError::NotFound`] for the first key with no slot.
    pub fn existing_slots_sorted(&self, keys: &[K]) -> Result<Vec<Slot<K, T>>> {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();
        keys.iter().map(|k| self.existing_slot(k)).collect()
    }

    /// Snapshot of the record under `key`.
    ///
    /// # Errors
    /// Returns [`GuardError::NotFound`] if no record was ever committed.
    pub fn get(&self, key: &K) -> Result<Versioned<T>> {
        self.existing_cell(key)
            .and_then(|cell| {
                let guard = cell.lock();
                guard.clone()
            })
            .ok_or_else(|| not_found::<K, T>(key))
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.existing_cell(key)
            .is_some_and(|cell| {
                let guard = cell.lock();
                guard.is_some()
            })
    }

    /// Current version of `key` (0 if absent).
    #[must_use]
    pub fn version(&self, key: &K) -> u64 {
        self.existing_cell(key)
            .and_then(|cell| {
                let guard = cell.lock();
                guard.as_ref().map(|v| v.version)
            })
            .unwrap_or(0)
    }

    /// Unconditional atomic write. Returns the new version.
    pub fn put(&self, key: &K, record: T) -> u64 {
        self.slot(key).lock().commit(record)
    }

    /// Optimistic write: commits only if the record is still at
    /// `expected_version` (0 = must be absent).
    ///
    /// # Errors
    /// Returns [`GuardError::VersionConflict`] if another commit got there first.
    pub fn compare_and_put(&self, key: &K, record: T, expected_version: u64) -> Result<u64> {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        let actual = guard.version();
        if actual != expected_version {
            return Err(GuardError::VersionConflict {
                key: key.to_string(),
                expected: expected_version,
                actual,
            });
        }
        Ok(guard.commit(record))
    }

    /// Create the record under `key` unless an initialized one exists.
    ///
    /// An uninitialized placeholder may be overwritten.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyExists`] if an initialized record is present.
    pub fn create(&self, key: &K, initial: T) -> Result<u64> {
        let slot = self.slot(key);
        let mut guard = slot.lock();
        if guard.current().is_some_and(|v| v.record.is_initialized()) {
            return Err(GuardError::AlreadyExists(format!("{} {key}", T::KIND)));
        }
        Ok(guard.commit(initial))
    }

    /// Number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of allocated slots, committed or not.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.read().len()
    }

    /// Point-in-time copy of every committed record, sorted by key.
    ///
    /// Each record is read under its own lock; the snapshot is per-key
    /// consistent, not a global cut.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(K, Versioned<T>)> {
        let cells: Vec<(K, Cell<T>)> = self
            .slots
            .read()
            .iter()
            .map(|(k, c)| (k.clone(), Arc::clone(c)))
            .collect();
        let mut out: Vec<(K, Versioned<T>)> = cells
            .into_iter()
            .filter_map(|(k, cell)| {
                let guard = cell.lock();
                guard.clone().map(|v| (k, v))
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl<K, T> Default for Table<K, T>
where
    K: Eq + Hash + Ord + Clone + Display,
    T: Record,
{
    fn default() -> Self {
        Self::new()
    }
}

fn not_found<K: Display, T: Record>(key: &K) -> GuardError {
    GuardError::NotFound(format!("{} {key}", T::KIND))
}

/// Handle on one key's cell. Lock it to read or commit.
pub struct Slot<K, T> {
    key: K,
    cell: Cell<T>,
}

impl<K: Display, T: Record> Slot<K, T> {
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Enter the key's exclusive section.
    pub fn lock(&self) -> SlotGuard<'_, K, T> {
        SlotGuard {
            key: &self.key,
            inner: self.cell.lock(),
        }
    }
}

/// Exclusive access to one key for the duration of a transition.
pub struct SlotGuard<'a, K, T> {
    key: &'a K,
    inner: MutexGuard<'a, Option<Versioned<T>>>,
}

impl<K: Display, T: Record> SlotGuard<'_, K, T> {
    #[must_use]
    pub fn key(&self) -> &K {
        self.key
    }

    #[must_use]
    pub fn current(&self) -> Option<&Versioned<T>> {
        self.inner.as_ref()
    }

    /// The committed record, or [`GuardError::NotFound`].
    pub fn record(&self) -> Result<&T> {
        self.inner
            .as_ref()
            .map(|v| &v.record)
            .ok_or_else(|| not_found::<K, T>(self.key))
    }

    /// A copy of the committed record to stage changes on.
    pub fn staged(&self) -> Result<T> {
        self.record().cloned()
    }

    /// Current version (0 if absent).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.as_ref().map_or(0, |v| v.version)
    }

    /// Replace the record and bump the version. Returns the new version.
    pub fn commit(&mut self, record: T) -> u64 {
        let version = self.version() + 1;
        *self.inner = Some(Versioned { record, version });
        tracing::trace!(kind = T::KIND, key = %self.key, version, "Record committed");
        version
    }
}
