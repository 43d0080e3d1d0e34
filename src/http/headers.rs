//! HTTP header map with case-insensitive name lookup.

/// An order-preserving HTTP header map with case-insensitive lookup.
///
/// Backed by a plain vector: request and response header counts are small
/// enough that a linear scan beats hashing, and insertion order is what the
/// response serializer writes out. Repeated names are kept; [`get`](Self::get)
/// returns the first.
///
/// # Examples
///
/// ```
/// use routekit::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Content-Type", "text/html; charset=utf-8");
/// assert_eq!(headers.get("content-type"), Some("text/html; charset=utf-8"));
/// assert!(headers.contains("CONTENT-TYPE"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Repeated names are preserved, not replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value for `name` (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if at least one entry carries `name` (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the number of entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_name_case() {
        let mut h = Headers::new();
        h.insert("Content-Type", "text/plain");
        assert_eq!(h.get("content-type"), Some("text/plain"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(h.get("x-missing"), None);
    }

    #[test]
    fn repeated_names_keep_first_for_get() {
        let mut h = Headers::new();
        h.insert("Set-Cookie", "a=1");
        h.insert("Set-Cookie", "b=2");
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("set-cookie"), Some("a=1"));
    }

    #[test]
    fn iter_preserves_insertion_order() {
        let mut h = Headers::new();
        h.insert("B", "2");
        h.insert("A", "1");
        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(pairs, [("B", "2"), ("A", "1")]);
    }

    #[test]
    fn contains_ignores_name_case() {
        let mut h = Headers::new();
        h.insert("Authorization", "Bearer token");
        assert!(h.contains("authorization"));
        assert!(!h.contains("x-missing"));
    }
}
