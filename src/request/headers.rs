//! Multi-valued header maps.
//!
//! Names compare case-insensitively; insertion order is preserved and a name
//! may carry several values.

use std::collections::HashSet;
use std::fmt;

/// Ordered, case-insensitive, multi-valued header map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMultiMap {
    inner: Vec<(String, String)>,
}

impl HeaderMultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping existing values for the name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Replace every value for the name with `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.inner.push((name, value.into()));
    }

    /// First value for the name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values for the name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove every value for the name. Returns true if any were removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Remove and return every value for the name.
    pub fn take(&mut self, name: &str) -> Vec<String> {
        let mut taken = Vec::new();
        self.inner.retain(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                taken.push(v.clone());
                false
            } else {
                true
            }
        });
        taken
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Number of entries (not distinct names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMultiMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl fmt::Display for HeaderMultiMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

/// Headers contributed by one call, overlaid onto the client defaults.
///
/// A name set through [`CallHeaders::replace`] hides the defaults of that
/// name; names only ever [`CallHeaders::append`]ed accumulate with them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallHeaders {
    values: HeaderMultiMap,
    replaced: HashSet<String>,
}

impl CallHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single-valued header: overrides the client defaults for `name`.
    pub fn replace(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.replaced.insert(name.to_ascii_lowercase());
        self.values.append(name, value);
    }

    /// A multi-valued header: accumulates with the client defaults.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.append(name, value);
    }

    /// First call-level value for the name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy `defaults` and overlay the call-level values.
    pub fn merge_onto(&self, defaults: &HeaderMultiMap) -> HeaderMultiMap {
        let mut merged = defaults.clone();
        for name in &self.replaced {
            merged.remove(name);
        }
        for (name, value) in self.values.iter() {
            merged.append(name, value);
        }
        merged
    }
}
