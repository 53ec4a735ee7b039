//! Request keys for cacheable reads

use std::fmt;

/// Identifies a cacheable read: the endpoint path plus its query string.
///
/// Keys compare by exact text, so `api/booking/approvals?filter=all` and
/// `api/booking/approvals?filter=internal` are distinct entries while two
/// reads of the same text share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    /// Key for the caller's exact endpoint text
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self(endpoint.into())
    }

    /// Key for a path plus query parameters, kept in the given order
    pub fn with_query(path: &str, params: &[(&str, &str)]) -> Self {
        if params.is_empty() {
            return Self::new(path);
        }

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");

        Self(format!("{}?{}", path, query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without its query string
    pub fn path(&self) -> &str {
        self.0.split_once('?').map_or(&self.0, |(path, _)| path)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

/// Escape the characters that would change how a query string splits
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            '&' => out.push_str("%26"),
            '=' => out.push_str("%3D"),
            '#' => out.push_str("%23"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestKey {
    fn from(endpoint: &str) -> Self {
        Self::new(endpoint)
    }
}

impl From<String> for RequestKey {
    fn from(endpoint: String) -> Self {
        Self(endpoint)
    }
}

impl AsRef<str> for RequestKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_text_is_the_key() {
        let key1 = RequestKey::new("api/hall/all-hall");
        let key2 = RequestKey::from("api/hall/all-hall");
        assert_eq!(key1, key2);
        assert_eq!(key1.as_str(), "api/hall/all-hall");
    }

    #[test]
    fn test_different_queries_are_distinct() {
        let all = RequestKey::with_query("api/booking/approvals", &[("filter", "all")]);
        let internal = RequestKey::with_query("api/booking/approvals", &[("filter", "internal")]);

        assert_ne!(all, internal);
        assert_eq!(all.as_str(), "api/booking/approvals?filter=all");
        assert_eq!(all.path(), "api/booking/approvals");
    }

    #[test]
    fn test_param_order_is_preserved() {
        let key = RequestKey::with_query("api/booking/hall/9", &[("to", "2"), ("from", "1")]);
        assert_eq!(key.as_str(), "api/booking/hall/9?to=2&from=1");
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let key = RequestKey::with_query("api/hall/search", &[("q", "a&b=c 50%")]);
        assert_eq!(key.as_str(), "api/hall/search?q=a%26b%3Dc%2050%25");
    }

    #[test]
    fn test_no_params_means_bare_path() {
        let key = RequestKey::with_query("api/booking/conflicts", &[]);
        assert_eq!(key.as_str(), "api/booking/conflicts");
        assert_eq!(key.path(), "api/booking/conflicts");
    }
}
