//! Bulk import and export of comments.
//!
//! A [`CommentTree`] mirrors the key structure of a config and carries only
//! comments. It is a transport structure: configs never store one.
//!
//! Merging into a live config follows one rule at every level: a comment that
//! is present overwrites the target's comment, and an absent comment leaves the
//! target untouched. Keys are independent of each other, so the order in which
//! they are visited does not affect the result.
//!
//! Neither merge is atomic. If a merge fails halfway with a structural
//! mismatch, the comments applied before the failure stay applied.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{CommentedConfig, UnmodifiableCommentedConfig, UnmodifiableConfig, mismatch};
use crate::error::{ConfigError, Found, Result};
use crate::value::Value;

/// Comments keyed by entry name, one level of a comment tree.
pub type CommentTree = IndexMap<String, CommentNode>;

/// The comment of one entry and the comments below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentNode {
    /// The entry's own comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Comments of the nested config's entries.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: CommentTree,
}

impl CommentNode {
    /// A node with a comment and no children.
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            children: IndexMap::new(),
        }
    }

    /// A node with only children.
    pub fn with_children(children: CommentTree) -> Self {
        Self {
            comment: None,
            children,
        }
    }

    /// Add a child node.
    pub fn child(mut self, key: impl Into<String>, node: CommentNode) -> Self {
        self.children.insert(key.into(), node);
        self
    }

    /// Check if the node carries nothing.
    pub fn is_empty(&self) -> bool {
        self.comment.is_none() && self.children.is_empty()
    }
}

/// Apply a comment tree to a config.
///
/// For each key, a `Some` comment is set on the entry, replacing any existing
/// comment. Children are applied to the nested config stored under the key,
/// which must exist: a missing or non-config value is a structural mismatch.
pub fn apply_comment_tree(target: &mut CommentedConfig, tree: &CommentTree) -> Result<()> {
    let mut path = Vec::new();
    apply_level(target, tree, &mut path)
}

fn apply_level(
    target: &mut CommentedConfig,
    tree: &CommentTree,
    path: &mut Vec<String>,
) -> Result<()> {
    for (key, node) in tree {
        path.push(key.clone());

        if let Some(comment) = &node.comment {
            tracing::trace!(path = ?path, "Applying comment");
            if !target.contains(&[key.as_str()]) {
                return Err(ConfigError::MissingEntry { path: path.clone() });
            }
            target.set_comment([key.as_str()], comment.as_str())?;
        }

        if !node.children.is_empty() {
            let nested = nested_config(target, key, path)?;
            apply_level(nested, &node.children, path)?;
        }

        path.pop();
    }
    Ok(())
}

/// Copy every comment of `source` onto the matching entries of `target`.
///
/// Comments present in `source` overwrite the target's; entries without a
/// comment in `source` keep the target's comment. Nested configs in `source`
/// are copied into the nested configs of `target` under the same key, which
/// must exist.
pub fn copy_comments<C>(target: &mut CommentedConfig, source: &C) -> Result<()>
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    let mut path = Vec::new();
    copy_level(target, source, &mut path)
}

fn copy_level<C>(target: &mut CommentedConfig, source: &C, path: &mut Vec<String>) -> Result<()>
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    for entry in source.entries() {
        path.push(entry.key().to_string());

        if let Some(comment) = entry.comment() {
            tracing::trace!(path = ?path, "Copying comment");
            if !target.contains(&[entry.key()]) {
                return Err(ConfigError::MissingEntry { path: path.clone() });
            }
            target.set_comment([entry.key()], comment)?;
        }

        if let Value::Config(nested_source) = entry.value() {
            let nested = nested_config(target, entry.key(), path)?;
            copy_level(nested, nested_source, path)?;
        }

        path.pop();
    }
    Ok(())
}

/// The nested config under `key`, or a structural mismatch naming `path`.
fn nested_config<'a>(
    target: &'a mut CommentedConfig,
    key: &str,
    path: &[String],
) -> Result<&'a mut CommentedConfig> {
    match target.value_map_mut().get_mut(key) {
        Some(Value::Config(nested)) => Ok(nested),
        Some(other) => Err(mismatch(path, other.found())),
        None => Err(mismatch(path, Found::Nothing)),
    }
}

/// Export the comments of a config as a tree.
///
/// A key appears in the tree if its entry has a comment or if its value is a
/// nested config with at least one comment somewhere below.
pub(crate) fn collect<C>(source: &C) -> CommentTree
where
    C: UnmodifiableCommentedConfig + ?Sized,
{
    let mut tree = CommentTree::new();
    for entry in source.entries() {
        let children = match entry.value() {
            Value::Config(nested) => collect(nested),
            _ => CommentTree::new(),
        };
        let node = CommentNode {
            comment: entry.comment().map(str::to_string),
            children,
        };
        if !node.is_empty() {
            tree.insert(entry.key().to_string(), node);
        }
    }
    tree
}
