//! Registry of named values substituted into placeholders

use std::collections::HashMap;

/// Mapping from template key to its current value
///
/// Values are stored as strings; callers stringify before registering. Every
/// mutation that changes the mapping bumps [`DataRegistry::revision`], which
/// lets the templating engine skip scans when nothing changed.
#[derive(Debug, Default, Clone)]
pub struct DataRegistry {
    values: HashMap<String, String>,
    revision: u64,
}

impl DataRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let previous = self.values.insert(key.into(), value.clone());
        if previous.as_deref() != Some(value.as_str()) {
            self.revision += 1;
        }
    }

    /// Remove a value. Missing keys are ignored.
    pub fn delete(&mut self, key: &str) -> Option<String> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }

    /// Get the current value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check if a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get all registered keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|s| s.as_str())
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Counter bumped on every effective change
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl<K, V> Extend<(K, V)> for DataRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for DataRegistry
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}
