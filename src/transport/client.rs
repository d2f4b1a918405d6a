//! Pooled HTTP client with admission control and layered retries.
//!
//! Two independent retry budgets apply to every call:
//! - connection retries: connect failures are retried up to
//!   `connect_retries` times before surfacing [`FetchError::Connection`];
//! - business retries: a response with an empty body is retried up to
//!   `max_retries` attempts, pausing one timeout between attempts, before
//!   surfacing [`FetchError::RetryExhausted`].
//!
//! Every call first takes a permit from a fixed-size admission semaphore.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, Proxy, redirect};
use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, instrument, warn};

use super::constants::{BODY_PREVIEW_CHARS, MAX_REDIRECTS, MAX_RETRY_AFTER};
use super::error::FetchError;
use super::json::{parse_json_body, preview};
use super::request::{FetchRequest, HeaderFields, Method, ResponseEnvelope, Route};
use crate::config::{ConfigError, ProxySettings, TransportConfig};

/// Shared transport for every strategy.
///
/// Holds one pooled client per [`Route`]. Clone the surrounding `Arc` to share
/// it between concurrent resolutions; the admission semaphore and pools are
/// shared with it.
#[derive(Debug)]
pub struct TransportClient {
    proxied: Client,
    direct: Client,
    admission: Semaphore,
    max_tasks: usize,
    max_retries: u32,
    connect_retries: u32,
    timeout: Duration,
}

impl TransportClient {
    /// Builds the transport from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] when a proxy address is rejected or
    /// the TLS backend cannot initialize.
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let proxied = build_client(config, Some(&config.proxy))?;
        let direct = build_client(config, None)?;
        let max_tasks = config.max_tasks.max(1);

        debug!(
            max_tasks,
            max_retries = config.max_retries,
            connect_retries = config.connect_retries,
            timeout_ms = config.timeout_ms,
            proxied = !config.proxy.is_empty(),
            "transport client built"
        );

        Ok(Self {
            proxied,
            direct,
            admission: Semaphore::new(max_tasks),
            max_tasks,
            max_retries: config.max_retries.max(1),
            connect_retries: config.connect_retries,
            timeout: config.timeout(),
        })
    }

    /// Fetches `request` and decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Everything [`Self::fetch_raw`] returns, plus
    /// [`FetchError::ResponseInvalid`] when the body holds no usable JSON.
    pub async fn fetch_json(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        let envelope = self.fetch_parsed(request).await?;
        envelope.parsed.ok_or_else(|| {
            FetchError::response_invalid(&envelope.final_url, "body was not decoded")
        })
    }

    /// Fetches `request` and returns the envelope with `parsed` filled in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_json`].
    pub async fn fetch_parsed(
        &self,
        request: &FetchRequest,
    ) -> Result<ResponseEnvelope, FetchError> {
        let mut envelope = self.fetch_raw(request).await?;
        envelope.parsed = Some(parse_json_body(&envelope.final_url, &envelope.body)?);
        Ok(envelope)
    }

    /// Fetches `request` and returns the full envelope.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Connection`] / [`FetchError::Timeout`] when no response arrives;
    /// - a status-specific error for non-2xx statuses other than 302;
    /// - [`FetchError::RetryExhausted`] when every attempt returned an empty body;
    /// - [`FetchError::Closed`] after [`Self::close`].
    #[instrument(level = "debug", skip(self, request), fields(url = %request.url()))]
    pub async fn fetch_raw(&self, request: &FetchRequest) -> Result<ResponseEnvelope, FetchError> {
        let _permit = self.admit().await?;
        let max_attempts = request.retry_override().unwrap_or(self.max_retries).max(1);
        let timeout = request.timeout_override().unwrap_or(self.timeout);

        for attempt in 1..=max_attempts {
            info!(attempt, max_attempts, url = request.url(), "issuing request");
            let response = self.send(request, timeout).await?;
            let envelope = read_envelope(request, response).await?;

            debug!(
                attempt,
                status = envelope.status,
                body_len = envelope.body.len(),
                final_url = %envelope.final_url,
                "response received"
            );

            if envelope.body.trim().is_empty() {
                warn!(
                    attempt,
                    status = envelope.status,
                    url = %envelope.final_url,
                    "empty response body"
                );
                if attempt == max_attempts {
                    return Err(FetchError::retry_exhausted(request.url(), attempt));
                }
                tokio::time::sleep(timeout).await;
                continue;
            }

            check_status(&envelope)?;
            return Ok(envelope);
        }

        Err(FetchError::retry_exhausted(request.url(), max_attempts))
    }

    /// Issues a HEAD request; one business attempt, no body read.
    ///
    /// # Errors
    ///
    /// Same classification as [`Self::fetch_raw`], minus empty-body retries.
    #[instrument(level = "debug", skip(self, request), fields(url = %request.url()))]
    pub async fn head_request(
        &self,
        request: &FetchRequest,
    ) -> Result<ResponseEnvelope, FetchError> {
        let _permit = self.admit().await?;
        let timeout = request.timeout_override().unwrap_or(self.timeout);
        let head = FetchRequest::head(request.url())
            .headers(request.header_fields().clone())
            .route(request.selected_route());

        let response = self.send(&head, timeout).await?;
        let envelope = ResponseEnvelope {
            status: response.status().as_u16(),
            final_url: response.url().to_string(),
            headers: collect_headers(response.headers()),
            cookies: collect_cookies(&response),
            body: String::new(),
            parsed: None,
        };
        check_status(&envelope)?;
        Ok(envelope)
    }

    /// Follows redirects for `request` and returns the URL they end at.
    ///
    /// One attempt. Neither status nor body is classified, so a landing page
    /// that is blocked or empty still reports where it lives.
    ///
    /// # Errors
    ///
    /// [`FetchError::Connection`] / [`FetchError::Timeout`] when no response
    /// arrives, [`FetchError::Closed`] after [`Self::close`].
    #[instrument(level = "debug", skip(self, request), fields(url = %request.url()))]
    pub async fn resolve_final_url(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let _permit = self.admit().await?;
        let timeout = request.timeout_override().unwrap_or(self.timeout);
        let response = self.send(request, timeout).await?;
        let final_url = response.url().to_string();
        debug!(
            status = response.status().as_u16(),
            final_url = %final_url,
            "redirects resolved"
        );
        Ok(final_url)
    }

    /// Closes admission. In-flight calls finish; new calls fail with
    /// [`FetchError::Closed`]. Pooled sockets are released when the last
    /// reference to the client drops.
    pub fn close(&self) {
        if !self.admission.is_closed() {
            info!("transport closed");
            self.admission.close();
        }
    }

    /// Returns true after [`Self::close`].
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.admission.is_closed()
    }

    /// Permits currently free.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.admission.available_permits()
    }

    /// Configured admission capacity.
    #[must_use]
    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }

    async fn admit(&self) -> Result<SemaphorePermit<'_>, FetchError> {
        self.admission.acquire().await.map_err(|_| FetchError::Closed)
    }

    async fn send(
        &self,
        request: &FetchRequest,
        timeout: Duration,
    ) -> Result<reqwest::Response, FetchError> {
        let client = match request.selected_route() {
            Route::Proxied => &self.proxied,
            Route::Direct => &self.direct,
        };

        let mut connect_attempt: u32 = 0;
        loop {
            match build_request(client, request, timeout).send().await {
                Ok(response) => return Ok(response),
                Err(error) if error.is_connect() && connect_attempt < self.connect_retries => {
                    connect_attempt += 1;
                    debug!(
                        connect_attempt,
                        connect_retries = self.connect_retries,
                        error = %error,
                        "connect failed, retrying"
                    );
                }
                Err(error) => return Err(classify_send_error(request.url(), &error)),
            }
        }
    }
}

fn build_client(
    config: &TransportConfig,
    proxy: Option<&ProxySettings>,
) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .timeout(config.timeout())
        .pool_max_idle_per_host(config.max_connections)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .gzip(true);

    builder = match proxy {
        Some(settings) => apply_proxy(builder, settings)?,
        None => builder.no_proxy(),
    };

    builder.build().map_err(|error| ConfigError::HttpClient {
        reason: error.to_string(),
    })
}

fn apply_proxy(
    mut builder: ClientBuilder,
    settings: &ProxySettings,
) -> Result<ClientBuilder, ConfigError> {
    if let Some(address) = settings.http.as_deref() {
        let proxy = Proxy::http(address).map_err(|error| ConfigError::HttpClient {
            reason: format!("invalid http proxy '{address}': {error}"),
        })?;
        builder = builder.proxy(proxy);
    }
    if let Some(address) = settings.https.as_deref() {
        let proxy = Proxy::https(address).map_err(|error| ConfigError::HttpClient {
            reason: format!("invalid https proxy '{address}': {error}"),
        })?;
        builder = builder.proxy(proxy);
    }
    Ok(builder)
}

fn build_request(
    client: &Client,
    request: &FetchRequest,
    timeout: Duration,
) -> reqwest::RequestBuilder {
    let mut builder = match request.method() {
        Method::Get => client.get(request.url()),
        Method::Post => client.post(request.url()),
        Method::Head => client.head(request.url()),
    };
    for (name, value) in request.header_fields() {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body() {
        builder = builder.body(body.to_string());
    }
    builder.timeout(timeout)
}

async fn read_envelope(
    request: &FetchRequest,
    response: reqwest::Response,
) -> Result<ResponseEnvelope, FetchError> {
    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let headers = collect_headers(response.headers());
    let cookies = collect_cookies(&response);
    let body = response
        .text()
        .await
        .map_err(|error| classify_send_error(request.url(), &error))?;

    Ok(ResponseEnvelope {
        status,
        final_url,
        headers,
        cookies,
        body,
        parsed: None,
    })
}

fn check_status(envelope: &ResponseEnvelope) -> Result<(), FetchError> {
    let retry_after = envelope.header(RETRY_AFTER.as_str()).and_then(parse_retry_after);
    match FetchError::from_status(&envelope.final_url, envelope.status, retry_after) {
        None => Ok(()),
        Some(error) => {
            warn!(
                status = envelope.status,
                url = %envelope.final_url,
                kind = %error.kind(),
                preview = %preview(&envelope.body, BODY_PREVIEW_CHARS),
                "request failed with HTTP status"
            );
            Err(error)
        }
    }
}

fn classify_send_error(url: &str, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::connection(url, error.to_string())
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HeaderFields {
    let mut fields = HeaderFields::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        fields
            .entry(name.as_str().to_ascii_lowercase())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    fields
}

fn collect_cookies(response: &reqwest::Response) -> Vec<(String, String)> {
    response
        .cookies()
        .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
        .collect()
}

/// Parses a `Retry-After` header: delay-seconds or HTTP-date, capped at one hour.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<u64>() {
        return Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER));
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    let delay = datetime
        .duration_since(std::time::SystemTime::now())
        .unwrap_or(Duration::ZERO);
    Some(delay.min(MAX_RETRY_AFTER))
}

/// Convenience constructor for sharing one transport between owners.
///
/// # Errors
///
/// See [`TransportClient::new`].
pub fn shared_transport(config: &TransportConfig) -> Result<Arc<TransportClient>, ConfigError> {
    TransportClient::new(config).map(Arc::new)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 "), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_parse_retry_after_caps_at_one_hour() {
        assert_eq!(parse_retry_after("999999"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_past_date_is_zero() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_retry_after_garbage() {
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-3"), None);
    }

    #[test]
    fn test_transport_reports_capacity() {
        let config = TransportConfig {
            max_tasks: 4,
            ..TransportConfig::default()
        };
        let transport = TransportClient::new(&config).unwrap();
        assert_eq!(transport.max_tasks(), 4);
        assert_eq!(transport.available_permits(), 4);
        assert!(!transport.is_closed());
    }

    #[tokio::test]
    async fn test_closed_transport_rejects_calls() {
        let transport = TransportClient::new(&TransportConfig::default()).unwrap();
        transport.close();
        assert!(transport.is_closed());
        let err = transport
            .fetch_raw(&FetchRequest::get("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Closed));
    }
}
