//! URI composition
//!
//! [`UriBuilder`] keeps the path as an already-escaped string so that
//! segments containing `%2F` survive composition untouched. Use
//! [`encode_segment`] to escape a single segment before appending it.
//!
//! Path text is concatenated verbatim with one exception:
//! [`UriBuilder::append_path`] folds the `/` that ends the current path and
//! the `/` that starts the appended part into one, so joining `/v4/` and
//! `/user` gives `/v4/user` rather than `/v4//user`. Use
//! [`UriBuilder::set_path`] when a doubled slash is really wanted.

use crate::error::{Error, Result};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;
use url::form_urlencoded;

/// Characters left alone when escaping one path segment (RFC 3986 unreserved).
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode one path segment, including any `/` it contains.
///
/// ```
/// assert_eq!(restwire::uri::encode_segment("group/project"), "group%2Fproject");
/// ```
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

/// Builder that mutates the parts of an absolute URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriBuilder {
    scheme: String,
    user_info: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl UriBuilder {
    /// Start from an absolute URI string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if `base` is not an absolute URI with a host.
    pub fn base(base: &str) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| Error::InvalidUri(format!("{base}: {e}")))?;
        Self::from_url(&url)
    }

    /// Start from a parsed URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if the URL has no host.
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUri(format!("{url}: missing host")))?;

        let user_info = match (url.username(), url.password()) {
            ("", None) => None,
            (user, None) => Some(user.to_string()),
            (user, Some(password)) => Some(format!("{user}:{password}")),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            user_info,
            host: host.to_string(),
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        })
    }

    /// Replace the path. The value is used as-is.
    pub fn set_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Append to the path. The value is used as-is.
    ///
    /// A trailing `/` on the current path and a leading `/` on `path`
    /// collapse into one.
    pub fn append_path(mut self, path: &str) -> Self {
        if self.path.ends_with('/') && path.starts_with('/') {
            self.path.push_str(&path[1..]);
        } else {
            self.path.push_str(path);
        }
        self
    }

    /// Prefix the host with a label, turning `host` into `label.host`.
    pub fn append_sub_domain(mut self, label: &str) -> Self {
        self.host = format!("{label}.{}", self.host);
        self
    }

    /// Embed a user-info token (`user:secret`) in the authority.
    pub fn set_authentication(mut self, user_info: impl Into<String>) -> Self {
        self.user_info = Some(user_info.into());
        self
    }

    /// Replace the query string with the form-encoded pairs, in iteration order.
    ///
    /// An empty iterator removes the query entirely.
    pub fn set_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        for (key, value) in pairs {
            serializer.append_pair(key.as_ref(), value.as_ref());
            any = true;
        }
        self.query = any.then(|| serializer.finish());
        self
    }

    /// The path as currently composed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Assemble the final URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUri`] if the parts do not form a valid URL.
    pub fn build(&self) -> Result<Url> {
        if self.host.is_empty() {
            return Err(Error::InvalidUri("missing host".to_string()));
        }

        let mut assembled = format!("{}://", self.scheme);
        if let Some(user_info) = &self.user_info {
            assembled.push_str(user_info);
            assembled.push('@');
        }
        assembled.push_str(&self.host);
        if let Some(port) = self.port {
            assembled.push_str(&format!(":{port}"));
        }
        if !self.path.is_empty() && !self.path.starts_with('/') {
            assembled.push('/');
        }
        assembled.push_str(&self.path);
        if let Some(query) = &self.query {
            assembled.push('?');
            assembled.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            assembled.push('#');
            assembled.push_str(fragment);
        }

        Url::parse(&assembled).map_err(|e| Error::InvalidUri(format!("{assembled}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_append_keeps_escaped_slash() {
        let url = UriBuilder::base("https://gitlab.example.com/api/v4")
            .unwrap()
            .append_path(&format!("/projects/{}", encode_segment("group/project")))
            .build()
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fproject"
        );
    }

    #[rstest]
    #[case("https://h.example", "/items", "https://h.example/items")]
    #[case("https://h.example/", "items", "https://h.example/items")]
    #[case("https://h.example/api/", "/items", "https://h.example/api/items")]
    #[case("https://h.example/api", "/items", "https://h.example/api/items")]
    #[case("https://h.example/api", "items", "https://h.example/apiitems")]
    #[case("https://h.example/api/", "//items", "https://h.example/api//items")]
    fn test_append_path(#[case] base: &str, #[case] path: &str, #[case] expected: &str) {
        let url = UriBuilder::base(base).unwrap().append_path(path).build().unwrap();
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn test_set_path_replaces() {
        let url = UriBuilder::base("https://h.example/a/b?x=1")
            .unwrap()
            .set_path("/c")
            .build()
            .unwrap();
        assert_eq!(url.as_str(), "https://h.example/c?x=1");
    }

    #[test]
    fn test_sub_domain_and_authentication() {
        let url = UriBuilder::base("https://example.com:8443/repo.git")
            .unwrap()
            .append_sub_domain("api")
            .set_authentication("token:s3cret")
            .build()
            .unwrap();

        assert_eq!(url.host_str(), Some("api.example.com"));
        assert_eq!(url.port(), Some(8443));
        assert_eq!(url.username(), "token");
        assert_eq!(url.password(), Some("s3cret"));
        assert_eq!(url.path(), "/repo.git");
    }

    #[test]
    fn test_set_query_encodes_and_replaces() {
        let url = UriBuilder::base("https://h.example/search?old=1")
            .unwrap()
            .set_query([("q", "a b&c"), ("state", "open"), ("q", "second")])
            .build()
            .unwrap();

        assert_eq!(url.query(), Some("q=a+b%26c&state=open&q=second"));
    }

    #[test]
    fn test_empty_query_is_removed() {
        let url = UriBuilder::base("https://h.example/x?old=1")
            .unwrap()
            .set_query(Vec::<(String, String)>::new())
            .build()
            .unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_identical_inputs_give_identical_uris() {
        let build = || {
            UriBuilder::base("https://h.example")
                .unwrap()
                .append_path("/items")
                .set_query([("page", "1"), ("per_page", "100")])
                .build()
                .unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        assert!(matches!(
            UriBuilder::base("not a uri"),
            Err(Error::InvalidUri(_))
        ));
        assert!(matches!(
            UriBuilder::base("mailto:someone@example.com"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_inconsistent_parts_fail_on_build() {
        let result = UriBuilder::base("https://h.example")
            .unwrap()
            .append_sub_domain("bad label")
            .build();
        assert!(matches!(result, Err(Error::InvalidUri(_))));
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("a b/c~d"), "a%20b%2Fc~d");
        assert_eq!(encode_segment("plain-name_1.0"), "plain-name_1.0");
    }
}
