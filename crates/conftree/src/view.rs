//! Read-only views over configs.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::{UnmodifiableCommentedConfig, UnmodifiableConfig};
use crate::format::ConfigFormat;
use crate::value::Value;

/// A read-only view of a commented config.
///
/// The view borrows the config, so it always reflects the config's current
/// state and offers no way to change it. Two views of the same config share
/// their storage even though the views themselves are distinct values; use
/// [`same_storage`](Self::same_storage) rather than comparing the views.
#[derive(Debug)]
pub struct Unmodifiable<'a, C: ?Sized> {
    inner: &'a C,
}

impl<'a, C> Unmodifiable<'a, C>
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    pub fn new(inner: &'a C) -> Self {
        Self { inner }
    }

    /// The config this view reads from.
    pub fn inner(&self) -> &'a C {
        self.inner
    }

    /// Check whether both views read from the same config.
    ///
    /// Views stacked on top of each other share the storage of the config at
    /// the bottom.
    pub fn same_storage<D>(&self, other: &Unmodifiable<'_, D>) -> bool
    where
        D: UnmodifiableCommentedConfig + ?Sized,
    {
        std::ptr::eq(self.inner.value_map(), other.inner.value_map())
    }
}

impl<C: ?Sized> Clone for Unmodifiable<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for Unmodifiable<'_, C> {}

impl<C> UnmodifiableConfig for Unmodifiable<'_, C>
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    fn value_map(&self) -> &IndexMap<String, Value> {
        self.inner.value_map()
    }

    fn format(&self) -> Option<&Arc<dyn ConfigFormat>> {
        self.inner.format()
    }
}

impl<C> UnmodifiableCommentedConfig for Unmodifiable<'_, C>
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    fn comment_map(&self) -> &IndexMap<String, String> {
        self.inner.comment_map()
    }
}
