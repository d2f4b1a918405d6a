//! Per-attempt request description and the response envelope.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

/// Header name/value pairs, kept sorted so logs and tests are stable.
pub type HeaderFields = BTreeMap<String, String>;

/// Query parameters, sorted by key.
pub type QueryParams = BTreeMap<String, String>;

/// HTTP method used for a [`FetchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET with redirects followed.
    Get,
    /// POST with an optional raw body.
    Post,
    /// HEAD; no body is read and no business retry is applied.
    Head,
}

/// Which pooled connection set carries the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Through the configured proxy, if any.
    #[default]
    Proxied,
    /// Never through a proxy.
    Direct,
}

/// A single outbound request.
///
/// Built fresh for every attempt and never shared between strategies.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    url: String,
    method: Method,
    headers: HeaderFields,
    body: Option<String>,
    route: Route,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl FetchRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderFields::new(),
            body: None,
            route: Route::default(),
            timeout: None,
            max_retries: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a POST request carrying `body`.
    #[must_use]
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        let mut request = Self::new(Method::Post, url);
        request.body = Some(body.into());
        request
    }

    /// Creates a HEAD request.
    #[must_use]
    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::Head, url)
    }

    /// Adds or replaces a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merges a header set; later values win.
    #[must_use]
    pub fn headers(mut self, headers: HeaderFields) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Selects the connection route.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.route = route;
        self
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the business retry budget.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Request headers.
    #[must_use]
    pub fn header_fields(&self) -> &HeaderFields {
        &self.headers
    }

    /// Raw request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Connection route.
    #[must_use]
    pub fn selected_route(&self) -> Route {
        self.route
    }

    /// Per-attempt timeout override.
    #[must_use]
    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout
    }

    /// Business retry budget override.
    #[must_use]
    pub fn retry_override(&self) -> Option<u32> {
        self.max_retries
    }
}

/// Status, headers, cookies and body of a completed response.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// HTTP status code.
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    /// Response headers with lowercase names; repeated headers are joined by `", "`.
    pub headers: HeaderFields,
    /// Cookies set by the response, in arrival order.
    pub cookies: Vec<(String, String)>,
    /// Raw body text.
    pub body: String,
    /// Decoded body; set by [`TransportClient::fetch_parsed`].
    ///
    /// [`TransportClient::fetch_parsed`]: super::TransportClient::fetch_parsed
    pub parsed: Option<Value>,
}

impl ResponseEnvelope {
    /// Returns the value of the first cookie named `name`.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(cookie_name, _)| cookie_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Serializes parameters as a percent-encoded query string in key order.
#[must_use]
pub fn encode_query(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Joins raw `key=value` pairs in key order, without encoding.
///
/// This is the canonical form fed to signature synthesis.
#[must_use]
pub fn join_raw_params(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let request = FetchRequest::get("https://example.com/a")
            .header("User-Agent", "ua")
            .route(Route::Direct)
            .timeout(Duration::from_millis(250))
            .max_retries(1);

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url(), "https://example.com/a");
        assert_eq!(request.header_fields().get("User-Agent").unwrap(), "ua");
        assert_eq!(request.selected_route(), Route::Direct);
        assert_eq!(request.timeout_override(), Some(Duration::from_millis(250)));
        assert_eq!(request.retry_override(), Some(1));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_post_keeps_body() {
        let request = FetchRequest::post("https://example.com", "{\"a\":1}");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.body(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_encode_query_sorted_and_escaped() {
        let mut params = QueryParams::new();
        params.insert("b".to_string(), "x y".to_string());
        params.insert("a".to_string(), "1&2".to_string());
        assert_eq!(encode_query(&params), "a=1%262&b=x%20y");
        assert_eq!(join_raw_params(&params), "a=1&2&b=x y");
    }

    #[test]
    fn test_envelope_cookie_and_header_lookup() {
        let mut headers = HeaderFields::new();
        headers.insert("content-type".to_string(), "text/html".to_string());
        let envelope = ResponseEnvelope {
            status: 200,
            final_url: "https://example.com".to_string(),
            headers,
            cookies: vec![("msToken".to_string(), "abc".to_string())],
            body: String::new(),
            parsed: None,
        };
        assert_eq!(envelope.cookie("msToken"), Some("abc"));
        assert_eq!(envelope.cookie("missing"), None);
        assert_eq!(envelope.header("Content-Type"), Some("text/html"));
    }
}
