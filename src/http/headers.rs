//! Ordered, case-preserving HTTP header map.
//!
//! Names are stored as received and compared case-insensitively. A name
//! that appears once maps to a single string; a repeated name collects its
//! values into an ordered sequence in arrival order. Serialization walks
//! entries in first-arrival order and expands multi-valued entries into one
//! line per value.

use indexmap::IndexMap;

/// One or several values for a header name, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// First value in arrival order.
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(v) => v,
            HeaderValue::Multi(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All values in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            HeaderValue::Single(v) => std::slice::from_ref(v),
            HeaderValue::Multi(vs) => vs,
        };
        values.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        match self {
            HeaderValue::Single(_) => 1,
            HeaderValue::Multi(vs) => vs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(first) => {
                *self = HeaderValue::Multi(vec![std::mem::take(first), value]);
            }
            HeaderValue::Multi(vs) => vs.push(value),
        }
    }
}

/// Header map keyed by lowercased name, preserving the casing of the first
/// occurrence for output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: IndexMap<String, (String, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, extending the entry to a sequence when the name repeats.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some((_, existing)) => existing.push(value.into()),
            None => {
                self.entries
                    .insert(key, (name, HeaderValue::Single(value.into())));
            }
        }
    }

    /// Replaces any existing values for the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let key = name.to_ascii_lowercase();
        self.entries
            .insert(key, (name, HeaderValue::Single(value.into())));
    }

    /// First value for the name, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, v)| v.first())
    }

    /// All values for the name, case-insensitive.
    pub fn get_all(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(&name.to_ascii_lowercase()).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-arrival order, names as received.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.values().map(|(name, v)| (name.as_str(), v))
    }

    /// One `(name, value)` pair per output line, duplicates expanded in order.
    pub fn lines(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .flat_map(|(name, v)| v.iter().map(move |val| (name.as_str(), val)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_name_becomes_sequence() {
        let mut map = HeaderMap::new();
        map.append("X-A", "1");
        map.append("x-a", "2");
        assert_eq!(
            map.get_all("X-A"),
            Some(&HeaderValue::Multi(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn lookup_is_case_insensitive_but_casing_is_preserved() {
        let mut map = HeaderMap::new();
        map.append("Content-Type", "text/plain");
        assert_eq!(map.get("content-type"), Some("text/plain"));
        let names: Vec<_> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Content-Type"]);
    }
}
