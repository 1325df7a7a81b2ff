//! Commented configuration trees.
//!
//! This module defines the read-only capability traits shared by every config
//! and view ([`UnmodifiableConfig`], [`UnmodifiableCommentedConfig`]) and the
//! in-memory [`CommentedConfig`] that owns the data.
//!
//! # Ownership
//!
//! Each level owns its values in an insertion-ordered map. A nested config is
//! owned by the entry holding it, so the tree never shares an entry between two
//! parents: inserting a config moves it in, and cloning a config copies the
//! whole subtree.
//!
//! # Paths
//!
//! Read methods take explicit segment slices (`&["server", "port"]`), in the
//! same way cursors are navigated elsewhere in the workspace. Mutating methods
//! accept anything implementing [`IntoPath`], so dotted strings work too:
//!
//! ```rust
//! use conftree::{CommentedConfig, UnmodifiableCommentedConfig, UnmodifiableConfig, Value};
//!
//! let mut config = CommentedConfig::new();
//! config.set("server.port", 8080).unwrap();
//! config.set_comment("server.port", " Listening port").unwrap();
//!
//! assert_eq!(config.get(&["server", "port"]), Some(&Value::Integer(8080)));
//! assert_eq!(config.get_comment(&["server", "port"]), Some(" Listening port"));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::comments::{self, CommentTree};
use crate::error::{ConfigError, Found, PathError, Result};
use crate::format::ConfigFormat;
use crate::path::{self, IntoPath};
use crate::value::Value;
use crate::view::Unmodifiable;

/// Read access to a config's values.
pub trait UnmodifiableConfig {
    /// The values of the direct entries of this config.
    fn value_map(&self) -> &IndexMap<String, Value>;

    /// The format this config belongs to, if any.
    fn format(&self) -> Option<&Arc<dyn ConfigFormat>>;

    /// Get the value at a path.
    ///
    /// Returns `None` if any segment is missing, if an intermediate value is
    /// not a nested config, or if the path is empty.
    fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        level_values(self.value_map(), parents)?.get(last.as_ref())
    }

    /// Parse a dotted path and get the value there.
    fn lookup(&self, path: &str) -> std::result::Result<Option<&Value>, PathError> {
        let segments = path::split(path, '.')?;
        Ok(self.get(&segments))
    }

    /// Check if a value exists at a path.
    fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.get(path).is_some()
    }

    /// Number of direct entries.
    fn size(&self) -> usize {
        self.value_map().len()
    }

    fn is_empty(&self) -> bool {
        self.value_map().is_empty()
    }
}

/// Read access to a config's values and comments.
pub trait UnmodifiableCommentedConfig: UnmodifiableConfig {
    /// The comments of the direct entries of this config.
    ///
    /// Comments of nested entries live in the nested configs.
    fn comment_map(&self) -> &IndexMap<String, String>;

    /// Get the comment at a path.
    fn get_comment<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        if parents.is_empty() {
            return self.comment_map().get(last.as_ref()).map(String::as_str);
        }
        let (parent_last, grand_parents) = parents.split_last()?;
        let parent = level_values(self.value_map(), grand_parents)?
            .get(parent_last.as_ref())?
            .as_config()?;
        parent.comments.get(last.as_ref()).map(String::as_str)
    }

    /// Parse a dotted path and get the comment there.
    fn lookup_comment(&self, path: &str) -> std::result::Result<Option<&str>, PathError> {
        let segments = path::split(path, '.')?;
        Ok(self.get_comment(&segments))
    }

    /// Check if a comment exists at a path.
    fn contains_comment<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.get_comment(path).is_some()
    }

    /// Iterate over the direct entries with their comments.
    fn entries(&self) -> Entries<'_> {
        Entries {
            values: self.value_map().iter(),
            comments: self.comment_map(),
        }
    }

    /// Export every comment of this config as a tree.
    fn comments(&self) -> CommentTree {
        comments::collect(self)
    }
}

/// Walk `parents` through nested configs and return the values of the level
/// they lead to.
fn level_values<'a, S: AsRef<str>>(
    mut values: &'a IndexMap<String, Value>,
    parents: &[S],
) -> Option<&'a IndexMap<String, Value>> {
    for key in parents {
        values = &values.get(key.as_ref())?.as_config()?.values;
    }
    Some(values)
}

/// One entry of a config level, borrowed.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    key: &'a str,
    value: &'a Value,
    comment: Option<&'a str>,
}

impl<'a> EntryRef<'a> {
    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn comment(&self) -> Option<&'a str> {
        self.comment
    }
}

/// Iterator over the direct entries of a config, in insertion order.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    values: indexmap::map::Iter<'a, String, Value>,
    comments: &'a IndexMap<String, String>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = EntryRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = self.values.next()?;
        Some(EntryRef {
            key,
            value,
            comment: self.comments.get(key).map(String::as_str),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

/// Options for [`CommentedConfig::copy`].
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Copy comments along with values (default: true).
    pub copy_comments: bool,

    /// Maximum nesting depth (default: 256).
    ///
    /// Copying fails with `ConfigError::NestingTooDeep` past this depth.
    pub max_depth: usize,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            copy_comments: true,
            max_depth: 256,
        }
    }
}

/// An in-memory config with a comment per entry.
#[derive(Debug, Clone, Default)]
pub struct CommentedConfig {
    values: IndexMap<String, Value>,
    comments: IndexMap<String, String>,
    format: Option<Arc<dyn ConfigFormat>>,
}

impl CommentedConfig {
    /// Create an empty config without a format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config of the given format.
    pub fn with_format(format: Arc<dyn ConfigFormat>) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }

    /// Create a config that takes over an existing map as its storage.
    ///
    /// The map is moved in, not copied; [`value_map_mut`](Self::value_map_mut)
    /// gives direct access to it again.
    pub fn wrap(values: IndexMap<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    /// Like [`wrap`](Self::wrap), with a format.
    pub fn wrap_with_format(values: IndexMap<String, Value>, format: Arc<dyn ConfigFormat>) -> Self {
        Self {
            values,
            comments: IndexMap::new(),
            format: Some(format),
        }
    }

    /// Create an independent deep copy of another config.
    ///
    /// The copy keeps the source's format. Comments are copied only if
    /// `options.copy_comments` is set.
    pub fn copy<C>(source: &C, options: &CopyOptions) -> Result<Self>
    where
        C: UnmodifiableCommentedConfig + ?Sized,
    {
        let mut copy = Self {
            values: IndexMap::new(),
            comments: IndexMap::new(),
            format: source.format().cloned(),
        };
        let mut path = Vec::new();
        copy_level(
            &mut copy,
            source.value_map(),
            source.comment_map(),
            0,
            options,
            &mut path,
        )?;
        tracing::trace!(entries = copy.values.len(), "Copied config");
        Ok(copy)
    }

    /// A read-only view of this config.
    pub fn unmodifiable(&self) -> Unmodifiable<'_, Self> {
        Unmodifiable::new(self)
    }

    /// Mutable access to the values of the direct entries.
    ///
    /// Removing a key through this map leaves its comment in place.
    pub fn value_map_mut(&mut self) -> &mut IndexMap<String, Value> {
        &mut self.values
    }

    /// Mutable access to the comments of the direct entries.
    pub fn comment_map_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.comments
    }

    /// Give up the config and return its value storage.
    pub fn into_value_map(self) -> IndexMap<String, Value> {
        self.values
    }

    /// Get a mutable reference to the value at a path.
    pub fn get_mut<S: AsRef<str>>(&mut self, path: &[S]) -> Option<&mut Value> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.values.get_mut(key.as_ref())?.as_config_mut()?;
        }
        current.values.get_mut(last.as_ref())
    }

    /// Get the nested config at a path.
    ///
    /// The empty path is this config. Returns `Ok(None)` when a segment is
    /// missing, and a structural mismatch when a segment holds something other
    /// than a config.
    pub fn sub_config_mut<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Result<Option<&mut CommentedConfig>> {
        let mut current = self;
        for (depth, key) in path.iter().enumerate() {
            current = match current.values.get_mut(key.as_ref()) {
                None => return Ok(None),
                Some(Value::Config(nested)) => nested,
                Some(other) => return Err(mismatch(&path[..=depth], other.found())),
            };
        }
        Ok(Some(current))
    }

    /// Set the value at a path and return the previous one.
    ///
    /// Missing intermediate levels are created. An intermediate value that
    /// is not a config is a structural mismatch. The entry's comment is kept.
    pub fn set(&mut self, path: impl IntoPath, value: impl Into<Value>) -> Result<Option<Value>> {
        let segments = path.into_path()?;
        let (last, parents) = segments.split_last().ok_or(ConfigError::EmptyPath)?;
        let level = self.level_for_write(parents)?;
        Ok(level.values.insert(last.clone(), value.into()))
    }

    /// Set the value at a path only if there is none yet.
    ///
    /// Returns whether the value was added.
    pub fn add(&mut self, path: impl IntoPath, value: impl Into<Value>) -> Result<bool> {
        let segments = path.into_path()?;
        let (last, parents) = segments.split_last().ok_or(ConfigError::EmptyPath)?;
        let level = self.level_for_write(parents)?;
        if level.values.contains_key(last.as_str()) {
            return Ok(false);
        }
        level.values.insert(last.clone(), value.into());
        Ok(true)
    }

    /// Remove the value at a path, along with its comment.
    pub fn remove(&mut self, path: impl IntoPath) -> Result<Option<Value>> {
        let segments = path.into_path()?;
        let Some((last, parents)) = segments.split_last() else {
            return Ok(None);
        };
        let Some(level) = self.level_for_read_mut(parents) else {
            return Ok(None);
        };
        level.comments.shift_remove(last.as_str());
        Ok(level.values.shift_remove(last.as_str()))
    }

    /// Remove all values and comments.
    pub fn clear(&mut self) {
        self.values.clear();
        self.comments.clear();
    }

    /// Set the comment at a path and return the previous one.
    ///
    /// A value must already exist at the path; otherwise this returns
    /// `ConfigError::MissingEntry` and nothing changes.
    pub fn set_comment(
        &mut self,
        path: impl IntoPath,
        comment: impl Into<String>,
    ) -> Result<Option<String>> {
        let segments = path.into_path()?;
        let (last, parents) = segments.split_last().ok_or(ConfigError::EmptyPath)?;
        let level = match self.level_for_read_mut(parents) {
            Some(level) if level.values.contains_key(last.as_str()) => level,
            _ => return Err(ConfigError::MissingEntry { path: segments }),
        };
        Ok(level.comments.insert(last.clone(), comment.into()))
    }

    /// Remove the comment at a path and return it.
    pub fn remove_comment(&mut self, path: impl IntoPath) -> Result<Option<String>> {
        let segments = path.into_path()?;
        let Some((last, parents)) = segments.split_last() else {
            return Ok(None);
        };
        Ok(self
            .level_for_read_mut(parents)
            .and_then(|level| level.comments.shift_remove(last.as_str())))
    }

    /// Remove every comment of this config and of its nested configs.
    pub fn clear_comments(&mut self) {
        self.comments.clear();
        for value in self.values.values_mut() {
            clear_nested_comments(value);
        }
    }

    /// Navigate to the level holding the last segment, creating missing
    /// levels on the way.
    fn level_for_write(&mut self, parents: &[String]) -> Result<&mut CommentedConfig> {
        let format = self.format.clone();
        let mut current = self;
        for (depth, key) in parents.iter().enumerate() {
            let slot = current
                .values
                .entry(key.clone())
                .or_insert_with(|| Value::Config(CommentedConfig::child(format.clone())));
            current = match slot {
                Value::Config(nested) => nested,
                other => return Err(mismatch(&parents[..=depth], other.found())),
            };
        }
        Ok(current)
    }

    /// Navigate to an existing level without creating anything.
    fn level_for_read_mut(&mut self, parents: &[String]) -> Option<&mut CommentedConfig> {
        let mut current = self;
        for key in parents {
            current = current.values.get_mut(key.as_str())?.as_config_mut()?;
        }
        Some(current)
    }

    fn child(format: Option<Arc<dyn ConfigFormat>>) -> Self {
        Self {
            values: IndexMap::new(),
            comments: IndexMap::new(),
            format,
        }
    }
}

fn clear_nested_comments(value: &mut Value) {
    match value {
        Value::Config(nested) => nested.clear_comments(),
        Value::List(items) => items.iter_mut().for_each(clear_nested_comments),
        _ => {}
    }
}

pub(crate) fn mismatch<S: AsRef<str>>(path: &[S], found: Found) -> ConfigError {
    ConfigError::StructuralMismatch {
        path: path.iter().map(|s| s.as_ref().to_string()).collect(),
        found,
    }
}

/// Copy one level's values (and optionally comments) into `target`.
fn copy_level(
    target: &mut CommentedConfig,
    values: &IndexMap<String, Value>,
    comments: &IndexMap<String, String>,
    depth: usize,
    options: &CopyOptions,
    path: &mut Vec<String>,
) -> Result<()> {
    if depth > options.max_depth {
        return Err(ConfigError::NestingTooDeep {
            max_depth: options.max_depth,
            path: path.clone(),
        });
    }

    for (key, value) in values {
        path.push(key.clone());
        let copied = copy_value(value, depth, options, path)?;
        path.pop();
        target.values.insert(key.clone(), copied);
    }

    if options.copy_comments {
        for (key, comment) in comments {
            target.comments.insert(key.clone(), comment.clone());
        }
    }
    Ok(())
}

fn copy_value(
    value: &Value,
    depth: usize,
    options: &CopyOptions,
    path: &mut Vec<String>,
) -> Result<Value> {
    match value {
        Value::Config(nested) => {
            let mut child = CommentedConfig::child(nested.format.clone());
            copy_level(
                &mut child,
                &nested.values,
                &nested.comments,
                depth + 1,
                options,
                path,
            )?;
            Ok(Value::Config(child))
        }
        Value::List(items) => items
            .iter()
            .map(|item| copy_value(item, depth + 1, options, path))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        scalar => Ok(scalar.clone()),
    }
}

impl UnmodifiableConfig for CommentedConfig {
    fn value_map(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    fn format(&self) -> Option<&Arc<dyn ConfigFormat>> {
        self.format.as_ref()
    }
}

impl UnmodifiableCommentedConfig for CommentedConfig {
    fn comment_map(&self) -> &IndexMap<String, String> {
        &self.comments
    }
}

/// Two configs are equal when their values and comments are equal. The
/// format is not compared.
impl PartialEq for CommentedConfig {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values && self.comments == other.comments
    }
}

impl FromIterator<(String, Value)> for CommentedConfig {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::wrap(iter.into_iter().collect())
    }
}

/// Serializes the values only. Comments travel separately as a
/// [`CommentTree`].
impl Serialize for CommentedConfig {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        self.values.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CommentedConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        IndexMap::<String, Value>::deserialize(deserializer).map(CommentedConfig::wrap)
    }
}
