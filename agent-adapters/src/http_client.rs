//! Shared HTTP client with rustls-backed TLS and per-call deadlines.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{HeaderMap, HeaderValue, USER_AGENT};
use hyper::{Body, Client, Request, Response, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use tokio::time::timeout;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

fn build_https_client() -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Client::builder().build::<_, Body>(connector)
}

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns the body decoded lossily as UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Cloneable HTTP client shared by the bridge transports.
#[derive(Clone)]
pub struct HttpClient {
    inner: HyperClient,
    user_agent: HeaderValue,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Builds a client that sends the supplied `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the user agent is not a valid header value.
    pub fn new(user_agent: &str) -> AdapterResult<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|err| AdapterError::configuration(format!("invalid user agent: {err}")))?;
        Ok(Self {
            inner: build_https_client(),
            user_agent,
        })
    }

    /// Sends a request and returns the response with its body still streaming.
    ///
    /// The deadline covers connection setup and response headers only.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Timeout`] when the deadline elapses and
    /// [`AdapterError::Transport`] on connection failures.
    pub async fn send(
        &self,
        mut request: Request<Body>,
        deadline: Duration,
    ) -> AdapterResult<Response<Body>> {
        request
            .headers_mut()
            .entry(USER_AGENT)
            .or_insert_with(|| self.user_agent.clone());
        let target = request.uri().to_string();

        timeout(deadline, self.inner.request(request))
            .await
            .map_err(|_| AdapterError::timeout(format!("request to {target}")))?
            .map_err(|err| AdapterError::transport(format!("request to {target} failed: {err}")))
    }

    /// Sends a request and buffers the whole response body.
    ///
    /// The deadline covers the full exchange including the body.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::send`], plus [`AdapterError::Transport`] when the
    /// body cannot be read.
    pub async fn send_buffered(
        &self,
        request: Request<Body>,
        deadline: Duration,
    ) -> AdapterResult<HttpResponse> {
        let target = request.uri().to_string();
        let exchange = async {
            let response = self.send(request, deadline).await?;
            let (parts, body) = response.into_parts();
            let body = to_bytes(body).await.map_err(|err| {
                AdapterError::transport(format!("failed to read response from {target}: {err}"))
            })?;
            Ok(HttpResponse {
                status: parts.status,
                headers: parts.headers,
                body,
            })
        };

        timeout(deadline, exchange)
            .await
            .map_err(|_| AdapterError::timeout(format!("request to {target}")))?
    }

    /// Issues a `GET` and buffers the response.
    ///
    /// # Errors
    ///
    /// See [`HttpClient::send_buffered`].
    pub async fn get(&self, url: &str, deadline: Duration) -> AdapterResult<HttpResponse> {
        let request = Request::get(parse_uri(url)?)
            .body(Body::empty())
            .map_err(|err| AdapterError::transport(format!("failed to build request: {err}")))?;
        self.send_buffered(request, deadline).await
    }
}

/// Parses a URL into a [`Uri`].
///
/// # Errors
///
/// Returns [`AdapterError::Configuration`] when the URL is malformed.
pub fn parse_uri(url: &str) -> AdapterResult<Uri> {
    url.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid url `{url}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_urls() {
        let err = parse_uri("http://exa mple.com").unwrap_err();
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[test]
    fn rejects_invalid_user_agent() {
        assert!(HttpClient::new("bad\nagent").is_err());
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let client = HttpClient::new("test").unwrap();
        // port 9 on loopback is discard; nothing listens in test environments
        let err = client
            .get("http://127.0.0.1:9/", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
