//! Config formats and detection by file extension.
//!
//! A [`ConfigFormat`] describes a family of configs (for example one file
//! syntax). Every [`CommentedConfig`] may carry the format it was created for,
//! and nested configs created under it inherit that format.
//!
//! Formats are found through a [`FormatRegistry`]. Nothing is registered
//! automatically: the application registers the formats it supports, usually
//! on the process-wide registry returned by [`FormatRegistry::global`].

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::config::CommentedConfig;

/// A family of configs.
pub trait ConfigFormat: fmt::Debug + Send + Sync {
    /// Short name of the format, for messages and logs.
    fn name(&self) -> &str;

    /// Whether configs of this format keep comments.
    fn supports_comments(&self) -> bool;

    /// Whether configs of this format exist only in memory.
    fn is_in_memory(&self) -> bool {
        false
    }

    /// Create an empty config of this format.
    fn create_config(self: Arc<Self>) -> CommentedConfig;
}

/// The format of configs that are never written anywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InMemoryFormat;

impl ConfigFormat for InMemoryFormat {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn supports_comments(&self) -> bool {
        true
    }

    fn is_in_memory(&self) -> bool {
        true
    }

    fn create_config(self: Arc<Self>) -> CommentedConfig {
        CommentedConfig::with_format(self)
    }
}

type Supplier = Arc<dyn Fn() -> Arc<dyn ConfigFormat> + Send + Sync>;

static GLOBAL: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::new);

/// Formats keyed by file extension.
#[derive(Default)]
pub struct FormatRegistry {
    by_extension: RwLock<IndexMap<String, Supplier>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static FormatRegistry {
        &GLOBAL
    }

    /// Register a format for an extension (without the leading dot).
    ///
    /// A later registration for the same extension replaces the earlier one.
    pub fn register_extension(&self, extension: impl Into<String>, format: Arc<dyn ConfigFormat>) {
        let extension = extension.into();
        tracing::debug!(extension = %extension, format = format.name(), "Registering config format");
        self.by_extension
            .write()
            .insert(extension, Arc::new(move || Arc::clone(&format)));
    }

    /// Register a function producing the format for an extension.
    ///
    /// The function runs on every successful detection.
    pub fn register_extension_with<F>(&self, extension: impl Into<String>, supplier: F)
    where
        F: Fn() -> Arc<dyn ConfigFormat> + Send + Sync + 'static,
    {
        let extension = extension.into();
        tracing::debug!(extension = %extension, "Registering config format supplier");
        self.by_extension
            .write()
            .insert(extension, Arc::new(supplier));
    }

    /// Remove the registration for an extension.
    ///
    /// Returns whether there was one.
    pub fn unregister_extension(&self, extension: &str) -> bool {
        self.by_extension.write().shift_remove(extension).is_some()
    }

    /// Find the format of a file from its name.
    ///
    /// The extension is the text after the last `.`; a name without a dot
    /// is looked up as a whole.
    pub fn detect_by_name(&self, file_name: &str) -> Option<Arc<dyn ConfigFormat>> {
        let extension = file_name.rsplit('.').next().unwrap_or(file_name);
        // Clone the supplier so it runs without the lock held
        let supplier = self.by_extension.read().get(extension).cloned();
        let format = supplier.map(|supplier| supplier());
        tracing::debug!(
            file_name,
            extension,
            format = format.as_ref().map(|f| f.name()),
            "Detected config format"
        );
        format
    }

    /// Find the format of a file from the last component of its path.
    pub fn detect(&self, path: &Path) -> Option<Arc<dyn ConfigFormat>> {
        let file_name = path.file_name()?.to_str()?;
        self.detect_by_name(file_name)
    }

    /// The registered extensions, in registration order.
    pub fn extensions(&self) -> Vec<String> {
        self.by_extension.read().keys().cloned().collect()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UnmodifiableConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestFormat(&'static str);

    impl ConfigFormat for TestFormat {
        fn name(&self) -> &str {
            self.0
        }

        fn supports_comments(&self) -> bool {
            false
        }

        fn create_config(self: Arc<Self>) -> CommentedConfig {
            CommentedConfig::with_format(self)
        }
    }

    fn registry() -> FormatRegistry {
        let registry = FormatRegistry::new();
        registry.register_extension("toml", Arc::new(TestFormat("toml")));
        registry.register_extension("json", Arc::new(TestFormat("json")));
        registry
    }

    #[test]
    fn test_detect_by_last_extension() {
        let registry = registry();
        let format = registry.detect_by_name("settings.backup.toml").unwrap();
        assert_eq!(format.name(), "toml");
        assert!(registry.detect_by_name("settings.toml.bak").is_none());
    }

    #[test]
    fn test_detect_unknown_is_none() {
        let registry = registry();
        assert!(registry.detect_by_name("notes.txt").is_none());
        assert!(registry.detect_by_name("toml.").is_none());
    }

    #[test]
    fn test_name_without_dot_is_its_own_extension() {
        let registry = registry();
        assert_eq!(registry.detect_by_name("json").map(|f| f.name().to_string()).as_deref(), Some("json"));
    }

    #[test]
    fn test_detect_uses_file_name_of_path() {
        let registry = registry();
        let format = registry.detect(Path::new("conf.d/app.json")).unwrap();
        assert_eq!(format.name(), "json");
        assert!(registry.detect(Path::new("json/")).is_some());
        assert!(registry.detect(Path::new("/")).is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = registry();
        registry.register_extension("toml", Arc::new(TestFormat("toml-v2")));
        assert_eq!(registry.detect_by_name("a.toml").unwrap().name(), "toml-v2");
        assert_eq!(registry.extensions(), vec!["toml".to_string(), "json".to_string()]);
    }

    #[test]
    fn test_supplier_runs_on_each_detection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = FormatRegistry::new();
        let counter = Arc::clone(&calls);
        registry.register_extension_with("mem", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(InMemoryFormat) as Arc<dyn ConfigFormat>
        });

        assert!(registry.detect_by_name("x.mem").is_some());
        assert!(registry.detect_by_name("y.mem").is_some());
        assert!(registry.detect_by_name("y.other").is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(registry.unregister_extension("mem"));
        assert!(registry.detect_by_name("x.mem").is_none());
    }

    #[test]
    fn test_create_config_carries_format() {
        let format: Arc<dyn ConfigFormat> = Arc::new(InMemoryFormat);
        let config = Arc::clone(&format).create_config();
        let carried = config.format().unwrap();
        assert!(Arc::ptr_eq(carried, &format));
        assert!(carried.is_in_memory());
        assert!(carried.supports_comments());
    }

    #[test]
    fn test_global_registry() {
        let global = FormatRegistry::global();
        global.register_extension("conftree-test", Arc::new(TestFormat("global")));
        assert!(std::ptr::eq(global, FormatRegistry::global()));
        assert_eq!(
            global.detect_by_name("a.conftree-test").unwrap().name(),
            "global"
        );
    }
}
