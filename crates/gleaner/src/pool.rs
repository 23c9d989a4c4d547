//! Reusable record instances.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::slot::Slot;

/// Default number of idle instances kept per record type.
pub const DEFAULT_INSTANCE_POOL_SIZE: usize = 16;

/// Pool of idle destination instances of one type.
///
/// Instances are reset before they go back into the pool, so nothing bound
/// for one request is visible to the next holder.
///
/// # Example
///
/// ```
/// use gleaner::InstancePool;
///
/// let pool: InstancePool<Vec<String>> = InstancePool::new(4);
///
/// {
///     let mut names = pool.acquire();
///     names.push("first".to_string());
/// }
///
/// assert_eq!(pool.len(), 1);
/// assert!(pool.acquire().is_empty());
/// ```
#[derive(Debug)]
pub struct InstancePool<T> {
    idle: Mutex<Vec<T>>,
    max_size: usize,
}

impl<T: Slot + Default> InstancePool<T> {
    /// Creates a pool keeping at most `max_size` idle instances.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_size,
        }
    }

    /// Takes an idle instance, or creates one, wrapped in a guard that
    /// returns it on drop.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let value = self.idle.lock().pop().unwrap_or_default();
        Pooled {
            pool: self,
            value: Some(value),
        }
    }

    /// Resets `value` and keeps it if the pool is below capacity.
    pub fn release(&self, mut value: T) {
        value.reset();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_size {
            idle.push(value);
        }
    }

    /// Returns the number of idle instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.idle.lock().len()
    }

    /// Returns true if no instance is idle.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.idle.lock().is_empty()
    }
}

/// An instance on loan from an [`InstancePool`].
///
/// Dropping the guard resets the instance and returns it, including when the
/// holder unwinds.
#[derive(Debug)]
pub struct Pooled<'a, T: Slot + Default> {
    pool: &'a InstancePool<T>,
    value: Option<T>,
}

impl<T: Slot + Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value taken before drop"),
        }
    }
}

impl<T: Slot + Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value taken before drop"),
        }
    }
}

impl<T: Slot + Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.release(value);
        }
    }
}
