//! A config whose values are converted on every access.

use std::ops::ControlFlow;

use crate::config::{CommentedConfig, UnmodifiableCommentedConfig, UnmodifiableConfig};
use crate::error::{CoercionError, Result};
use crate::path::IntoPath;
use crate::store::MapStore;
use crate::transform::{SlotEntry, Transform, TransformedEntry};
use crate::value::Value;

/// A [`CommentedConfig`] seen through a transform.
///
/// Paths and comments are passed on unchanged; only values are converted.
/// Nested configs are reached with [`sub_config`](Self::sub_config), which
/// wraps them with the same transform.
#[derive(Debug)]
pub struct TransformedConfig<'a, T> {
    config: &'a mut CommentedConfig,
    transform: T,
}

impl<'a, T> TransformedConfig<'a, T>
where
    T: Transform<Internal = Value>,
{
    pub fn new(config: &'a mut CommentedConfig, transform: T) -> Self {
        Self { config, transform }
    }

    /// The converted value at a path, or `None` if there is none.
    pub fn get<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> std::result::Result<Option<T::External>, CoercionError> {
        self.config
            .get(path)
            .map(|internal| self.transform.read(internal))
            .transpose()
    }

    /// Set the value at a path and return the previous one, converted.
    ///
    /// Nothing is stored if the value cannot be converted.
    pub fn set(&mut self, path: impl IntoPath, value: T::External) -> Result<Option<T::External>> {
        let internal = self.transform.write(value)?;
        let previous = self.config.set(path, internal)?;
        Ok(previous
            .map(|previous| self.transform.read(&previous))
            .transpose()?)
    }

    /// Remove the value at a path, along with its comment, and return it
    /// converted.
    pub fn remove(&mut self, path: impl IntoPath) -> Result<Option<T::External>> {
        let previous = self.config.remove(path)?;
        Ok(previous
            .map(|previous| self.transform.read(&previous))
            .transpose()?)
    }

    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.config.contains(path)
    }

    /// Number of direct entries.
    pub fn size(&self) -> usize {
        self.config.size()
    }

    /// The comment at a path, unconverted.
    pub fn get_comment<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.config.get_comment(path)
    }

    /// The nested config at a path, wrapped with the same transform.
    ///
    /// Returns `Ok(None)` if a segment is missing and a structural mismatch
    /// if a segment holds something other than a config.
    pub fn sub_config<S: AsRef<str>>(
        &mut self,
        path: &[S],
    ) -> Result<Option<TransformedConfig<'_, &T>>> {
        let transform = &self.transform;
        Ok(self
            .config
            .sub_config_mut(path)?
            .map(|nested| TransformedConfig::new(nested, transform)))
    }

    /// Visit the direct entries through a [`TransformedEntry`] until `f`
    /// breaks. Comments are not visited.
    pub fn try_for_each_entry<B>(
        &mut self,
        mut f: impl FnMut(&mut TransformedEntry<SlotEntry<'_, String, Value>, &T>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let transform = &self.transform;
        self.config
            .value_map_mut()
            .try_for_each_entry(|slot| f(&mut TransformedEntry::new(slot, transform)))
    }

    /// The wrapped config.
    pub fn config(&self) -> &CommentedConfig {
        self.config
    }

    pub fn into_inner(self) -> &'a mut CommentedConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::transform::FnTransform;

    /// Integers seen as strings; anything else is rejected.
    fn int_as_text() -> FnTransform<
        Value,
        String,
        impl Fn(&Value) -> std::result::Result<String, CoercionError>,
        impl Fn(String) -> std::result::Result<Value, CoercionError>,
    > {
        FnTransform::new(
            |value: &Value| {
                value.as_i64().map(|n| n.to_string()).ok_or_else(|| {
                    CoercionError::new(format!("expected an integer, got {}", value.kind_name()))
                })
            },
            |s: String| {
                s.parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| CoercionError::with_source(format!("not an integer: {s}"), e))
            },
        )
    }

    fn sample() -> CommentedConfig {
        let mut config = CommentedConfig::new();
        config.set("x", 5).unwrap();
        config.set("server.port", 8080).unwrap();
        config.set_comment("server.port", " Port").unwrap();
        config
    }

    #[test]
    fn test_get_and_set_convert() {
        let mut config = sample();
        let mut view = TransformedConfig::new(&mut config, int_as_text());

        assert_eq!(view.get(&["x"]).unwrap().as_deref(), Some("5"));
        let previous = view.set("x", "10".to_string()).unwrap();
        assert_eq!(previous.as_deref(), Some("5"));
        assert_eq!(view.size(), 2);

        assert_eq!(config.get(&["x"]), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_comments_pass_through() {
        let mut config = sample();
        let view = TransformedConfig::new(&mut config, int_as_text());
        assert_eq!(view.get_comment(&["server", "port"]), Some(" Port"));
        assert!(view.contains(&["server", "port"]));
    }

    #[test]
    fn test_set_failure_is_coercion_error() {
        let mut config = sample();
        let mut view = TransformedConfig::new(&mut config, int_as_text());
        match view.set("x", "ten".to_string()).unwrap_err() {
            ConfigError::Coercion(err) => assert_eq!(err.message(), "not an integer: ten"),
            other => panic!("expected coercion error, got {other:?}"),
        }
        assert_eq!(view.get(&["x"]).unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_reading_a_nested_config_fails_to_convert() {
        let mut config = sample();
        let view = TransformedConfig::new(&mut config, int_as_text());
        let err = view.get(&["server"]).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"expected an integer, got config");
    }

    #[test]
    fn test_sub_config_uses_same_transform() {
        let mut config = sample();
        let mut view = TransformedConfig::new(&mut config, int_as_text());
        {
            let mut server = view.sub_config(&["server"]).unwrap().unwrap();
            assert_eq!(server.get(&["port"]).unwrap().as_deref(), Some("8080"));
            server.set("port", "9090".to_string()).unwrap();
            assert_eq!(server.get_comment(&["port"]), Some(" Port"));
        }
        assert!(view.sub_config(&["missing"]).unwrap().is_none());
        assert!(matches!(
            view.sub_config(&["x"]),
            Err(ConfigError::StructuralMismatch { .. })
        ));

        assert_eq!(config.get(&["server", "port"]), Some(&Value::Integer(9090)));
    }

    #[test]
    fn test_remove_drops_comment() {
        let mut config = sample();
        let mut view = TransformedConfig::new(&mut config, int_as_text());
        let mut server = view.sub_config(&["server"]).unwrap().unwrap();
        assert_eq!(server.remove("port").unwrap().as_deref(), Some("8080"));
        assert_eq!(server.get_comment(&["port"]), None);
        assert_eq!(server.size(), 0);
    }

    #[test]
    fn test_entries_skip_nested_configs() {
        let mut config = sample();
        config.set("y", 7).unwrap();
        let mut view = TransformedConfig::new(&mut config, int_as_text());

        let mut seen = Vec::new();
        let _ = view.try_for_each_entry(|entry| {
            if let Ok(value) = entry.value() {
                seen.push((entry.key().clone(), value));
                entry.set_value("0".to_string()).unwrap();
            }
            ControlFlow::<()>::Continue(())
        });

        assert_eq!(
            seen,
            vec![("x".to_string(), "5".to_string()), ("y".to_string(), "7".to_string())]
        );
        assert_eq!(config.get(&["y"]), Some(&Value::Integer(0)));
        assert!(config.get(&["server"]).unwrap().is_config());
    }
}
