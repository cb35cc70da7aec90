//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;

use crate::method::Method;

/// Largest request body buffered when nothing else is configured: 1 MiB.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An incoming HTTP request with its body fully buffered.
///
/// Read-only to handlers. Path parameters are filled in by the router once a
/// route matches.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

/// Why a hyper request could not be turned into a [`Request`].
#[derive(Debug)]
pub(crate) enum IncomingError {
    Method,
    /// The body grew past the configured limit.
    TooLarge,
    Body(BoxError),
}

impl Request {
    /// Start building a request by hand. `target` is a path with an optional
    /// query string: `"/humans?brain_type=small"`.
    ///
    /// ```rust
    /// use brains::{Method, Request};
    ///
    /// let req = Request::builder(Method::Get, "/humans?brain_type=small")
    ///     .header("accept", "application/vnd.zombies.v1+json")
    ///     .build();
    /// assert_eq!(req.query("brain_type"), Some("small"));
    /// ```
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder {
            method,
            target: target.to_owned(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Buffers at most `limit` bytes of the hyper body and splits the URI
    /// into path and query.
    pub(crate) async fn from_incoming(
        req: hyper::Request<hyper::body::Incoming>,
        limit: usize,
    ) -> Result<Self, IncomingError> {
        let method = Method::try_from(req.method()).map_err(|_| IncomingError::Method)?;
        let (mut parts, body) = req.into_parts();
        // HTTP/2 carries the host in `:authority`, which hyper leaves in the URI.
        if !parts.headers.contains_key(http::header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                if let Ok(value) = HeaderValue::from_str(authority.as_str()) {
                    parts.headers.insert(http::header::HOST, value);
                }
            }
        }
        let body = read_body(body, limit).await?;
        Ok(Self::assemble(
            method,
            parts.uri.path(),
            parts.uri.query(),
            parts.headers,
            body,
        ))
    }

    fn assemble(
        method: Method,
        path: &str,
        query: Option<&str>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let query = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            method,
            path: path.to_owned(),
            query,
            headers,
            body,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Values that are not visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every field line of a header joined with `, `, the way RFC 9110 lets
    /// a list-valued header be split across lines. Lines that are not
    /// visible ASCII are skipped.
    pub fn header_list(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() { None } else { Some(values.join(", ")) }
    }

    /// Decoded query-string pairs in the order they were sent.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value of a query parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/humans/{id}`, `req.param("id")` on `/humans/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Collects a body, failing with [`IncomingError::TooLarge`] as soon as more
/// than `limit` bytes arrive.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, IncomingError>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(IncomingError::TooLarge),
        Err(e) => Err(IncomingError::Body(e)),
    }
}

/// Hand-built [`Request`], mostly for tests and in-process dispatch.
pub struct RequestBuilder {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    /// Appends a header. Invalid names or values are ignored.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body with a matching `content-type`.
    pub fn json(self, value: &serde_json::Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }

    pub fn build(self) -> Request {
        let (path, query) = match self.target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (self.target.as_str(), None),
        };
        Request::assemble(self.method, path, query, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_decodes_query() {
        let req = Request::builder(Method::Get, "/humans?name=John%20Doe&brain_type=small").build();
        assert_eq!(req.path(), "/humans");
        assert_eq!(req.query("name"), Some("John Doe"));
        assert_eq!(req.query("brain_type"), Some("small"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn list_headers_join_every_line() {
        let req = Request::builder(Method::Get, "/")
            .header("accept", "application/json")
            .header("Accept", "application/vnd.zombies.v1+json")
            .build();
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(
            req.header_list("accept").as_deref(),
            Some("application/json, application/vnd.zombies.v1+json"),
        );
        assert_eq!(req.header_list("accept-language"), None);
    }

    #[tokio::test]
    async fn body_within_limit_is_buffered() {
        let body = http_body_util::Full::new(Bytes::from_static(b"{\"name\":\"Ash\"}"));
        let bytes = read_body(body, 14).await.unwrap();
        assert_eq!(&bytes[..], b"{\"name\":\"Ash\"}");
    }

    #[tokio::test]
    async fn body_over_limit_is_rejected() {
        let body = http_body_util::Full::new(Bytes::from(vec![b'x'; 2048]));
        assert!(matches!(read_body(body, 1024).await, Err(IncomingError::TooLarge)));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::builder(Method::Get, "/")
            .header("Accept-Language", "pt-BR")
            .build();
        assert_eq!(req.header("accept-language"), Some("pt-BR"));
        assert_eq!(req.header("ACCEPT-LANGUAGE"), Some("pt-BR"));
    }
}
