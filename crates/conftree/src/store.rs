//! Map storage behind transformed containers.
//!
//! [`MapStore`] is the small contract a [`TransformedMap`](crate::TransformedMap)
//! needs from its backing storage. It is implemented for the common map types
//! and for [`SharedMap`], a cloneable handle whose clones all see the same
//! entries.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::ops::ControlFlow;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::transform::SlotEntry;

/// Keyed storage with in-place entry access.
///
/// Lookups take any borrowed form of the key, like the std maps do. The
/// bounds cover both hashed and ordered maps.
pub trait MapStore {
    type Key;
    type Value;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Self::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized;

    /// Run `f` on the value stored under `key`.
    ///
    /// Returns `None` when there is no such key.
    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&Self::Value) -> R) -> Option<R>
    where
        Self::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized;

    /// Store a value and return the previous one.
    fn insert(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value>;

    fn remove<Q>(&mut self, key: &Q) -> Option<Self::Value>
    where
        Self::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized;

    /// Visit every entry by reference until `f` breaks.
    fn try_for_each_ref<B>(
        &self,
        f: impl FnMut(&Self::Key, &Self::Value) -> ControlFlow<B>,
    ) -> ControlFlow<B>;

    /// Visit every entry with a writable value slot until `f` breaks.
    fn try_for_each_entry<B>(
        &mut self,
        f: impl FnMut(SlotEntry<'_, Self::Key, Self::Value>) -> ControlFlow<B>,
    ) -> ControlFlow<B>;

    /// A snapshot of the keys, in iteration order.
    fn keys(&self) -> Vec<Self::Key>
    where
        Self::Key: Clone,
    {
        let mut keys = Vec::with_capacity(self.len());
        let _ = self.try_for_each_ref(|key, _| {
            keys.push(key.clone());
            ControlFlow::<()>::Continue(())
        });
        keys
    }
}

impl<K, V, H> MapStore for IndexMap<K, V, H>
where
    K: Hash + Eq,
    H: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        IndexMap::len(self)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        IndexMap::contains_key(self, key)
    }

    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.get(key).map(f)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        IndexMap::insert(self, key, value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.shift_remove(key)
    }

    fn try_for_each_ref<B>(&self, mut f: impl FnMut(&K, &V) -> ControlFlow<B>) -> ControlFlow<B> {
        for (key, value) in self {
            f(key, value)?;
        }
        ControlFlow::Continue(())
    }

    fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(SlotEntry<'_, K, V>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (key, value) in self.iter_mut() {
            f(SlotEntry::new(key, value))?;
        }
        ControlFlow::Continue(())
    }
}

impl<K, V, H> MapStore for HashMap<K, V, H>
where
    K: Hash + Eq,
    H: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        HashMap::contains_key(self, key)
    }

    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.get(key).map(f)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        HashMap::insert(self, key, value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        HashMap::remove(self, key)
    }

    fn try_for_each_ref<B>(&self, mut f: impl FnMut(&K, &V) -> ControlFlow<B>) -> ControlFlow<B> {
        for (key, value) in self {
            f(key, value)?;
        }
        ControlFlow::Continue(())
    }

    fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(SlotEntry<'_, K, V>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (key, value) in self.iter_mut() {
            f(SlotEntry::new(key, value))?;
        }
        ControlFlow::Continue(())
    }
}

impl<K: Ord, V> MapStore for BTreeMap<K, V> {
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        BTreeMap::contains_key(self, key)
    }

    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.get(key).map(f)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        BTreeMap::insert(self, key, value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        BTreeMap::remove(self, key)
    }

    fn try_for_each_ref<B>(&self, mut f: impl FnMut(&K, &V) -> ControlFlow<B>) -> ControlFlow<B> {
        for (key, value) in self {
            f(key, value)?;
        }
        ControlFlow::Continue(())
    }

    fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(SlotEntry<'_, K, V>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (key, value) in self.iter_mut() {
            f(SlotEntry::new(key, value))?;
        }
        ControlFlow::Continue(())
    }
}

impl<S: MapStore + ?Sized> MapStore for &mut S {
    type Key = S::Key;
    type Value = S::Value;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        (**self).contains_key(key)
    }

    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&S::Value) -> R) -> Option<R>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        (**self).with_value(key, f)
    }

    fn insert(&mut self, key: S::Key, value: S::Value) -> Option<S::Value> {
        (**self).insert(key, value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<S::Value>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        (**self).remove(key)
    }

    fn try_for_each_ref<B>(
        &self,
        f: impl FnMut(&S::Key, &S::Value) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        (**self).try_for_each_ref(f)
    }

    fn try_for_each_entry<B>(
        &mut self,
        f: impl FnMut(SlotEntry<'_, S::Key, S::Value>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        (**self).try_for_each_entry(f)
    }
}

/// A map shared between handles.
///
/// Cloning a `SharedMap` clones the handle, not the entries: every clone
/// reads and writes the same storage. Each call holds the lock only for its
/// own duration, so a wrapper over one handle sees writes made through any
/// other handle on its next call. The lock is never held while caller code
/// runs, except through the guards returned by [`read`](Self::read) and
/// [`write`](Self::write).
pub struct SharedMap<K, V> {
    inner: Arc<RwLock<IndexMap<K, V>>>,
}

impl<K, V> SharedMap<K, V> {
    pub fn new() -> Self {
        Self::from_map(IndexMap::new())
    }

    /// Take over an existing map as the shared storage.
    pub fn from_map(map: IndexMap<K, V>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Lock the storage for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, IndexMap<K, V>> {
        self.inner.read()
    }

    /// Lock the storage for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, IndexMap<K, V>> {
        self.inner.write()
    }

    /// Check whether two handles share their storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<K: Hash + Eq, V> SharedMap<K, V> {
    /// Store a value through this handle.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    /// Remove a value through this handle.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.write().shift_remove(key)
    }

    fn key_snapshot(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.read().keys().cloned().collect()
    }

    /// A copy of the value stored under `key`.
    pub fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.read().get(key).cloned()
    }
}

impl<K, V> Clone for SharedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> From<IndexMap<K, V>> for SharedMap<K, V> {
    fn from(map: IndexMap<K, V>) -> Self {
        Self::from_map(map)
    }
}

impl<K, V> Default for SharedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SharedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.read().iter()).finish()
    }
}

/// Every call locks only for its own lookup or write. Entry passes work from
/// a snapshot of the keys: each value is copied out under the lock and the
/// callback runs with the lock released, so it may use any handle of the same
/// map. Keys removed before they are reached are skipped, and a value written
/// through an entry is stored back only if its key is still present.
impl<K, V> MapStore for SharedMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    type Key = K;
    type Value = V;

    fn len(&self) -> usize {
        SharedMap::len(self)
    }

    fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.inner.read().contains_key(key)
    }

    fn with_value<Q, R>(&self, key: &Q, f: impl FnOnce(&V) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        let value = self.get_cloned(key)?;
        Some(f(&value))
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        SharedMap::insert(self, key, value)
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        SharedMap::remove(self, key)
    }

    fn try_for_each_ref<B>(&self, mut f: impl FnMut(&K, &V) -> ControlFlow<B>) -> ControlFlow<B> {
        for key in self.key_snapshot() {
            let Some(value) = self.get_cloned(&key) else {
                continue;
            };
            f(&key, &value)?;
        }
        ControlFlow::Continue(())
    }

    fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(SlotEntry<'_, K, V>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for key in self.key_snapshot() {
            let Some(mut value) = self.get_cloned(&key) else {
                continue;
            };
            let mut written = false;
            let flow = f(SlotEntry::tracked(&key, &mut value, &mut written));
            if written {
                if let Some(slot) = self.inner.write().get_mut(&key) {
                    *slot = value;
                }
            }
            flow?;
        }
        ControlFlow::Continue(())
    }

    fn keys(&self) -> Vec<K> {
        self.key_snapshot()
    }
}
