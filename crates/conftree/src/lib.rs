//! Path-addressable configuration trees with comments.
//!
//! This crate provides an in-memory configuration tree where every entry is
//! addressed by a path of string segments and may carry a comment, plus views
//! that present the same storage read-only or through a value conversion.
//!
//! # Key Features
//!
//! - **Dotted paths**: `server."host.name".port` splits into three segments,
//!   and [`join`] quotes segments so that splitting its output gives them back
//! - **Comments per entry**: exported and re-applied as a [`CommentTree`]
//! - **Transformed views**: [`TransformedMap`] and [`TransformedConfig`]
//!   convert values on every access without keeping a copy
//! - **Read-only views**: [`Unmodifiable`] exposes the read traits only
//!
//! # Architecture
//!
//! - [`CommentedConfig`]: owns values and comments, one insertion-ordered map
//!   per level
//! - [`UnmodifiableConfig`] / [`UnmodifiableCommentedConfig`]: the read
//!   capability shared by configs and views
//! - [`Transform`]: a pair of conversions used by every transformed view
//! - [`MapStore`]: the storage contract behind [`TransformedMap`], with
//!   [`SharedMap`] for storage shared between handles
//! - [`FormatRegistry`]: file extension to [`ConfigFormat`] lookup
//!
//! # Example
//!
//! ```rust
//! use conftree::{
//!     CommentNode, CommentTree, CommentedConfig, UnmodifiableCommentedConfig, apply_comment_tree,
//! };
//!
//! let mut config = CommentedConfig::new();
//! config.set("server.port", 8080).unwrap();
//!
//! let mut tree = CommentTree::new();
//! tree.insert(
//!     "server".into(),
//!     CommentNode::new(" Server").child("port", CommentNode::new(" Port")),
//! );
//! apply_comment_tree(&mut config, &tree).unwrap();
//!
//! assert_eq!(config.get_comment(&["server", "port"]), Some(" Port"));
//! assert_eq!(config.comments(), tree);
//! ```

mod comments;
mod config;
mod container;
mod error;
mod format;
pub mod path;
mod store;
mod transform;
mod transformed_config;
mod value;
mod view;

pub use comments::{
    CommentNode,
    CommentTree,
    apply_comment_tree,
    copy_comments,
};

pub use config::{
    CommentedConfig,
    CopyOptions,
    Entries,
    EntryRef,
    UnmodifiableCommentedConfig,
    UnmodifiableConfig,
};

pub use container::TransformedMap;

pub use error::{
    CoercionError,
    ConfigError,
    Found,
    PathError,
    Result,
};

pub use format::{
    ConfigFormat,
    FormatRegistry,
    InMemoryFormat,
};

pub use path::{
    IntoPath,
    join,
    split,
};

pub use store::{
    MapStore,
    SharedMap,
};

pub use transform::{
    EntryLike,
    FnTransform,
    Identity,
    SlotEntry,
    Transform,
    TransformedEntry,
};

pub use transformed_config::TransformedConfig;

pub use value::Value;

pub use view::Unmodifiable;
