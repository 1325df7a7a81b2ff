//! Bidirectional value transforms and transformed entries.
//!
//! A [`Transform`] converts between the type a store holds (internal) and the
//! type a caller works with (external). Views built on a transform keep no
//! state of their own: every read runs [`Transform::read`] on the stored value
//! and every write stores the result of [`Transform::write`].
//!
//! Transforms are expected to be cheap, pure coercions such as numeric
//! widening or string formatting. When a value cannot be converted, the
//! transform returns a [`CoercionError`] and the view passes it on untouched.

use std::collections::{btree_map, hash_map};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::error::CoercionError;

/// A pair of conversions between an internal and an external value type.
pub trait Transform {
    /// The type held by the underlying store.
    type Internal;

    /// The type seen by callers.
    type External;

    /// Convert a stored value for a caller.
    fn read(&self, internal: &Self::Internal) -> Result<Self::External, CoercionError>;

    /// Convert a caller's value for storage.
    fn write(&self, external: Self::External) -> Result<Self::Internal, CoercionError>;
}

impl<T: Transform + ?Sized> Transform for &T {
    type Internal = T::Internal;
    type External = T::External;

    fn read(&self, internal: &Self::Internal) -> Result<Self::External, CoercionError> {
        (**self).read(internal)
    }

    fn write(&self, external: Self::External) -> Result<Self::Internal, CoercionError> {
        (**self).write(external)
    }
}

/// A transform made of two closures.
///
/// ```rust
/// use conftree::{CoercionError, FnTransform, Transform};
///
/// let as_text = FnTransform::new(
///     |n: &i64| Ok(n.to_string()),
///     |s: String| {
///         s.parse::<i64>()
///             .map_err(|e| CoercionError::with_source(format!("not an integer: {s}"), e))
///     },
/// );
/// assert_eq!(as_text.read(&5).unwrap(), "5");
/// assert_eq!(as_text.write("10".to_string()).unwrap(), 10);
/// ```
pub struct FnTransform<I, E, R, W> {
    read: R,
    write: W,
    _types: PhantomData<fn(I) -> E>,
}

impl<I, E, R, W> FnTransform<I, E, R, W>
where
    R: Fn(&I) -> Result<E, CoercionError>,
    W: Fn(E) -> Result<I, CoercionError>,
{
    pub fn new(read: R, write: W) -> Self {
        Self {
            read,
            write,
            _types: PhantomData,
        }
    }
}

impl<I, E, R, W> Transform for FnTransform<I, E, R, W>
where
    R: Fn(&I) -> Result<E, CoercionError>,
    W: Fn(E) -> Result<I, CoercionError>,
{
    type Internal = I;
    type External = E;

    fn read(&self, internal: &I) -> Result<E, CoercionError> {
        (self.read)(internal)
    }

    fn write(&self, external: E) -> Result<I, CoercionError> {
        (self.write)(external)
    }
}

impl<I, E, R, W> fmt::Debug for FnTransform<I, E, R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").finish_non_exhaustive()
    }
}

/// A transform that leaves values unchanged.
#[derive(Debug)]
pub struct Identity<V>(PhantomData<fn(V) -> V>);

impl<V> Default for Identity<V> {
    fn default() -> Self {
        Identity(PhantomData)
    }
}

impl<V: Clone> Transform for Identity<V> {
    type Internal = V;
    type External = V;

    fn read(&self, internal: &V) -> Result<V, CoercionError> {
        Ok(internal.clone())
    }

    fn write(&self, external: V) -> Result<V, CoercionError> {
        Ok(external)
    }
}

/// One key/value association of a map-like store.
pub trait EntryLike {
    type Key;
    type Value;

    fn key(&self) -> &Self::Key;

    fn value(&self) -> &Self::Value;

    /// Replace the value and return the previous one.
    fn set_value(&mut self, value: Self::Value) -> Self::Value;
}

/// An entry made of a borrowed key and a mutable value slot.
#[derive(Debug)]
pub struct SlotEntry<'a, K, V> {
    key: &'a K,
    value: &'a mut V,
    written: Option<&'a mut bool>,
}

impl<'a, K, V> SlotEntry<'a, K, V> {
    pub fn new(key: &'a K, value: &'a mut V) -> Self {
        Self {
            key,
            value,
            written: None,
        }
    }

    /// Like [`new`](Self::new), and sets `written` when a value is stored.
    pub fn tracked(key: &'a K, value: &'a mut V, written: &'a mut bool) -> Self {
        Self {
            key,
            value,
            written: Some(written),
        }
    }
}

impl<K, V> EntryLike for SlotEntry<'_, K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        self.key
    }

    fn value(&self) -> &V {
        self.value
    }

    fn set_value(&mut self, value: V) -> V {
        if let Some(written) = self.written.as_deref_mut() {
            *written = true;
        }
        std::mem::replace(self.value, value)
    }
}

impl<K, V> EntryLike for indexmap::map::OccupiedEntry<'_, K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        indexmap::map::OccupiedEntry::key(self)
    }

    fn value(&self) -> &V {
        self.get()
    }

    fn set_value(&mut self, value: V) -> V {
        self.insert(value)
    }
}

impl<K: Eq + Hash, V> EntryLike for hash_map::OccupiedEntry<'_, K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        hash_map::OccupiedEntry::key(self)
    }

    fn value(&self) -> &V {
        self.get()
    }

    fn set_value(&mut self, value: V) -> V {
        self.insert(value)
    }
}

impl<K: Ord, V> EntryLike for btree_map::OccupiedEntry<'_, K, V> {
    type Key = K;
    type Value = V;

    fn key(&self) -> &K {
        btree_map::OccupiedEntry::key(self)
    }

    fn value(&self) -> &V {
        self.get()
    }

    fn set_value(&mut self, value: V) -> V {
        self.insert(value)
    }
}

/// An entry whose value is seen through a transform.
///
/// The key is forwarded unchanged. Nothing is cached, so a value changed
/// behind the wrapper's back is picked up by the next read.
#[derive(Debug)]
pub struct TransformedEntry<En, T> {
    entry: En,
    transform: T,
}

impl<En, T> TransformedEntry<En, T>
where
    En: EntryLike,
    T: Transform<Internal = En::Value>,
{
    pub fn new(entry: En, transform: T) -> Self {
        Self { entry, transform }
    }

    pub fn key(&self) -> &En::Key {
        self.entry.key()
    }

    /// The current value, converted for the caller.
    pub fn value(&self) -> Result<T::External, CoercionError> {
        self.transform.read(self.entry.value())
    }

    /// Store a new value and return the previous one, both converted.
    ///
    /// If the write conversion fails nothing is stored. If the stored value
    /// cannot be read back, the new value stays stored and the read error is
    /// returned.
    pub fn set_value(&mut self, value: T::External) -> Result<T::External, CoercionError> {
        let internal = self.transform.write(value)?;
        let previous = self.entry.set_value(internal);
        self.transform.read(&previous)
    }

    /// The wrapped entry.
    pub fn inner(&self) -> &En {
        &self.entry
    }

    pub fn into_inner(self) -> En {
        self.entry
    }
}
