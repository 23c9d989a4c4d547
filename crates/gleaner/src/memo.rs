//! Per-request extraction memo and its pool.
//!
//! Several fields often read the same part of a request. A [`Memo`] lets an
//! extraction source parse that part once per bind call and hand the parsed
//! form to every later field. Memos are drawn from a [`MemoPool`] at the start
//! of a bind call, cleared, and returned at the end, so steady-state binding
//! reuses their allocations.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::Mutex;

/// Default number of idle memos kept by a [`MemoPool`].
pub const DEFAULT_MEMO_POOL_SIZE: usize = 32;

/// Lazily computed parse results for one bind call.
///
/// Entries are keyed by a name and the stored type, so two sources using the
/// same name for differently typed data never observe each other's entries.
///
/// # Example
///
/// ```
/// use gleaner::Memo;
///
/// let mut memo = Memo::new();
/// let mut parses = 0;
///
/// for _ in 0..3 {
///     let pairs: &Vec<(String, String)> = memo.get_or_insert_with("query", || {
///         parses += 1;
///         vec![("a".to_string(), "1".to_string())]
///     });
///     assert_eq!(pairs.len(), 1);
/// }
///
/// assert_eq!(parses, 1);
/// ```
#[derive(Debug, Default)]
pub struct Memo {
    entries: HashMap<(&'static str, TypeId), Box<dyn Any + Send>>,
}

impl Memo {
    /// Creates an empty memo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `key`, computing it with `init` on first use.
    pub fn get_or_insert_with<T, F>(&mut self, key: &'static str, init: F) -> &T
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        let entry = self
            .entries
            .entry((key, TypeId::of::<T>()))
            .or_insert_with(|| Box::new(init()));
        match entry.downcast_ref::<T>() {
            Some(value) => value,
            // entries are keyed by TypeId::of::<T>()
            None => unreachable!("memo entry type mismatch for {key}"),
        }
    }

    /// Returns the entry for `key`, if it has been computed.
    #[must_use]
    pub fn get<T: Any + Send>(&self, key: &'static str) -> Option<&T> {
        self.entries
            .get(&(key, TypeId::of::<T>()))
            .and_then(|entry| entry.downcast_ref::<T>())
    }

    /// Returns the number of computed entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, keeping the table's allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Thread-safe pool of idle [`Memo`]s.
///
/// `acquire` never waits: an empty pool hands out a fresh memo. `release`
/// clears the memo and keeps it only while the pool is below capacity.
#[derive(Debug)]
pub struct MemoPool {
    idle: Mutex<Vec<Memo>>,
    max_size: usize,
}

impl MemoPool {
    /// Creates a pool keeping at most [`DEFAULT_MEMO_POOL_SIZE`] idle memos.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMO_POOL_SIZE)
    }

    /// Creates a pool keeping at most `max_size` idle memos.
    #[must_use]
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
        }
    }

    /// Takes an idle memo, or creates one.
    pub fn acquire(&self) -> Memo {
        self.idle.lock().pop().unwrap_or_default()
    }

    /// Clears `memo` and returns it to the pool.
    pub fn release(&self, mut memo: Memo) {
        memo.clear();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_size {
            idle.push(memo);
        }
    }

    /// Pre-fills the pool with up to `count` empty memos.
    pub fn warm(&self, count: usize) {
        let mut idle = self.idle.lock();
        let to_add = self.max_size.saturating_sub(idle.len()).min(count);
        idle.extend((0..to_add).map(|_| Memo::new()));
    }

    /// Returns the number of idle memos.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idle.lock().len()
    }

    /// Returns true if no memo is idle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idle.lock().is_empty()
    }
}

impl Default for MemoPool {
    fn default() -> Self {
        Self::new()
    }
}
