//! Maps seen through a transform.

use std::borrow::Borrow;
use std::hash::Hash;
use std::ops::ControlFlow;

use crate::error::CoercionError;
use crate::store::MapStore;
use crate::transform::{SlotEntry, Transform, TransformedEntry};

/// A map whose values are converted on every access.
///
/// The wrapper stores nothing itself. Reads go through [`Transform::read`],
/// writes through [`Transform::write`], and keys are passed on unchanged. A
/// store that is changed elsewhere (for instance another handle of a
/// [`SharedMap`](crate::SharedMap)) is seen as it is at the time of each call.
///
/// ```rust
/// use conftree::{CoercionError, FnTransform, TransformedMap};
/// use indexmap::IndexMap;
///
/// let mut backing = IndexMap::new();
/// backing.insert("x".to_string(), 5i64);
///
/// let as_text = FnTransform::new(
///     |n: &i64| Ok(n.to_string()),
///     |s: String| s.parse::<i64>().map_err(|e| CoercionError::with_source(s.clone(), e)),
/// );
/// let mut view = TransformedMap::new(&mut backing, as_text);
/// assert_eq!(view.get("x").unwrap().as_deref(), Some("5"));
/// assert_eq!(view.put("x".into(), "10".into()).unwrap().as_deref(), Some("5"));
/// assert_eq!(backing["x"], 10);
/// ```
#[derive(Debug)]
pub struct TransformedMap<S, T> {
    store: S,
    transform: T,
}

impl<S, T> TransformedMap<S, T>
where
    S: MapStore,
    T: Transform<Internal = S::Value>,
{
    pub fn new(store: S, transform: T) -> Self {
        Self { store, transform }
    }

    /// The converted value under `key`, or `None` if there is no such key.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<T::External>, CoercionError>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.store
            .with_value(key, |internal| self.transform.read(internal))
            .transpose()
    }

    /// Store a value and return the previous one, converted.
    ///
    /// Nothing is stored if the value cannot be converted.
    pub fn put(
        &mut self,
        key: S::Key,
        value: T::External,
    ) -> Result<Option<T::External>, CoercionError> {
        let internal = self.transform.write(value)?;
        self.store
            .insert(key, internal)
            .map(|previous| self.transform.read(&previous))
            .transpose()
    }

    /// Remove the value under `key` and return it, converted.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<T::External>, CoercionError>
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.store
            .remove(key)
            .map(|previous| self.transform.read(&previous))
            .transpose()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        S::Key: Borrow<Q>,
        Q: Hash + Eq + Ord + ?Sized,
    {
        self.store.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The keys of the store, unconverted.
    pub fn keys(&self) -> Vec<S::Key>
    where
        S::Key: Clone,
    {
        self.store.keys()
    }

    /// Visit every entry through a [`TransformedEntry`] until `f` breaks.
    ///
    /// Each wrapper is built when its entry is reached, and values written
    /// through it land in the store immediately. Over a
    /// [`SharedMap`](crate::SharedMap) no lock is held while `f` runs, so `f`
    /// may use other handles of the same map.
    pub fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(&mut TransformedEntry<SlotEntry<'_, S::Key, S::Value>, &T>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let transform = &self.transform;
        self.store
            .try_for_each_entry(|slot| f(&mut TransformedEntry::new(slot, transform)))
    }

    /// Visit every entry through a [`TransformedEntry`].
    pub fn for_each_entry(
        &mut self,
        mut f: impl FnMut(&mut TransformedEntry<SlotEntry<'_, S::Key, S::Value>, &T>),
    ) {
        let _ = self.try_for_each_entry(|entry| {
            f(entry);
            ControlFlow::<()>::Continue(())
        });
    }

    /// Visit every converted value until `f` breaks.
    ///
    /// Stops at the first value that cannot be converted and returns its
    /// error.
    pub fn try_for_each_value<B>(
        &self,
        mut f: impl FnMut(T::External) -> ControlFlow<B>,
    ) -> Result<ControlFlow<B>, CoercionError> {
        let flow = self
            .store
            .try_for_each_ref(|_, internal| match self.transform.read(internal) {
                Ok(value) => f(value).map_break(Ok),
                Err(err) => ControlFlow::Break(Err(err)),
            });
        match flow {
            ControlFlow::Continue(()) => Ok(ControlFlow::Continue(())),
            ControlFlow::Break(Ok(value)) => Ok(ControlFlow::Break(value)),
            ControlFlow::Break(Err(err)) => Err(err),
        }
    }

    /// Every converted value, in store order.
    pub fn values(&self) -> Result<Vec<T::External>, CoercionError> {
        let mut values = Vec::with_capacity(self.len());
        self.try_for_each_value(|value| {
            values.push(value);
            ControlFlow::<()>::Continue(())
        })?;
        Ok(values)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedMap;
    use crate::transform::FnTransform;
    use indexmap::IndexMap;
    use std::collections::BTreeMap;

    fn int_as_text() -> FnTransform<
        i64,
        String,
        impl Fn(&i64) -> Result<String, CoercionError>,
        impl Fn(String) -> Result<i64, CoercionError>,
    > {
        FnTransform::new(
            |n: &i64| Ok(n.to_string()),
            |s: String| {
                s.parse::<i64>()
                    .map_err(|e| CoercionError::with_source(format!("not an integer: {s}"), e))
            },
        )
    }

    fn backing() -> IndexMap<String, i64> {
        let mut map = IndexMap::new();
        map.insert("x".to_string(), 5);
        map
    }

    #[test]
    fn test_get_and_put_convert() {
        let mut map = backing();
        let mut view = TransformedMap::new(&mut map, int_as_text());

        assert_eq!(view.get("x").unwrap().as_deref(), Some("5"));
        let previous = view.put("x".into(), "10".into()).unwrap();
        assert_eq!(previous.as_deref(), Some("5"));
        assert_eq!(view.get("x").unwrap().as_deref(), Some("10"));

        assert_eq!(map["x"], 10);
    }

    #[test]
    fn test_missing_key_is_none() {
        let view = TransformedMap::new(backing(), int_as_text());
        assert_eq!(view.get("nope").unwrap(), None);
        assert!(!view.contains_key("nope"));
    }

    #[test]
    fn test_put_failure_stores_nothing() {
        let mut view = TransformedMap::new(backing(), int_as_text());
        let err = view.put("y".into(), "why".into()).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"not an integer: why");
        assert!(!view.contains_key("y"));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_read_failure_is_passed_through() {
        let picky = FnTransform::new(
            |n: &i64| {
                if *n < 0 {
                    Err(CoercionError::new("negative"))
                } else {
                    Ok(*n as u64)
                }
            },
            |n: u64| Ok(n as i64),
        );
        let mut map = backing();
        map.insert("neg".into(), -1);
        let view = TransformedMap::new(map, picky);

        assert_eq!(view.get("x").unwrap(), Some(5));
        assert_eq!(view.get("neg").unwrap_err().message(), "negative");
        assert_eq!(view.values().unwrap_err().message(), "negative");
    }

    #[test]
    fn test_remove_returns_converted_value() {
        let mut view = TransformedMap::new(backing(), int_as_text());
        assert_eq!(view.remove("x").unwrap().as_deref(), Some("5"));
        assert_eq!(view.remove("x").unwrap(), None);
        assert!(view.is_empty());
    }

    #[test]
    fn test_keys_are_untransformed() {
        let mut map = backing();
        map.insert("y".into(), 7);
        let view = TransformedMap::new(map, int_as_text());
        assert_eq!(view.keys(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(view.values().unwrap(), vec!["5".to_string(), "7".to_string()]);
    }

    #[test]
    fn test_entries_write_through() {
        let mut map: BTreeMap<String, i64> = BTreeMap::new();
        map.insert("a".into(), 1);
        map.insert("b".into(), 2);
        let mut view = TransformedMap::new(&mut map, int_as_text());

        view.for_each_entry(|entry| {
            let doubled = entry.value().unwrap().repeat(2);
            entry.set_value(doubled).unwrap();
        });
        assert_eq!(map["a"], 11);
        assert_eq!(map["b"], 22);
    }

    #[test]
    fn test_entry_pass_breaks_early() {
        let mut view = TransformedMap::new(backing(), int_as_text());
        view.put("y".into(), "6".into()).unwrap();

        let found = view.try_for_each_entry(|entry| {
            if entry.value().unwrap() == "6" {
                ControlFlow::Break(entry.key().clone())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(found, ControlFlow::Break("y".to_string()));
    }

    #[test]
    fn test_shared_store_is_live() {
        let shared: SharedMap<String, i64> = SharedMap::new();
        let view = TransformedMap::new(shared.clone(), int_as_text());
        assert_eq!(view.get("k").unwrap(), None);

        shared.insert("k".into(), 42);
        assert_eq!(view.get("k").unwrap().as_deref(), Some("42"));
        assert_eq!(view.len(), 1);

        shared.remove("k");
        assert!(!view.contains_key("k"));
    }
}
