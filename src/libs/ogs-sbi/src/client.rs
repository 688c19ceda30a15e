//! SBI HTTP Client
//!
//! hyper based client for SBI communication. HTTP/2 runs with prior
//! knowledge over a cached connection; HTTP/1.1 opens one connection per
//! request.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::{http1, http2};
use hyper::{Method, Request, Response, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::{SbiError, SbiResult};
use crate::message::{SbiRequest, SbiResponse};
use crate::types::{HttpVersion, UriScheme};

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT: u64 = 5;
/// Default request timeout in seconds
const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// SBI Client configuration
#[derive(Debug, Clone)]
pub struct SbiClientConfig {
    pub scheme: UriScheme,
    /// Target host (FQDN or IP)
    pub host: String,
    pub port: u16,
    pub http_version: HttpVersion,
    pub connect_timeout: Duration,
    /// Bound on sending the request and reading the whole response
    pub request_timeout: Duration,
}

impl Default for SbiClientConfig {
    fn default() -> Self {
        Self {
            scheme: UriScheme::Http,
            host: "localhost".to_string(),
            port: 80,
            http_version: HttpVersion::Http2,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl SbiClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Build a configuration from the scheme and authority of `uri`.
    /// The path of `uri` is ignored.
    pub fn from_uri(uri: &str) -> SbiResult<Self> {
        let parsed: Uri = uri
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{uri}: {e}")))?;

        let scheme = match parsed.scheme_str() {
            Some(s) => s.parse::<UriScheme>().map_err(SbiError::InvalidUri)?,
            None => return Err(SbiError::InvalidUri(format!("{uri}: missing scheme"))),
        };
        if scheme == UriScheme::Https {
            return Err(SbiError::InvalidUri(format!("{uri}: https is not supported")));
        }

        let host = parsed
            .host()
            .ok_or_else(|| SbiError::InvalidUri(format!("{uri}: missing host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = parsed.port_u16().unwrap_or_else(|| scheme.default_port());

        Ok(Self {
            scheme,
            host,
            port,
            ..Default::default()
        })
    }

    pub fn with_http_version(mut self, version: HttpVersion) -> Self {
        self.http_version = version;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// `host:port`, with IPv6 literals bracketed
    pub fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn base_uri(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }
}

/// SBI Client bound to one peer authority
pub struct SbiClient {
    config: SbiClientConfig,
    /// Cached HTTP/2 sender, lazily connected
    h2_sender: Mutex<Option<http2::SendRequest<Full<Bytes>>>>,
}

impl SbiClient {
    pub fn new(config: SbiClientConfig) -> Self {
        Self {
            config,
            h2_sender: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SbiClientConfig {
        &self.config
    }

    async fn tcp_connect(&self) -> SbiResult<TcpStream> {
        let addr = self.config.authority();
        tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| SbiError::Timeout)?
            .map_err(|e| SbiError::ConnectionError(format!("{addr}: {e}")))
    }

    async fn connect_http2(&self) -> SbiResult<http2::SendRequest<Full<Bytes>>> {
        let stream = self.tcp_connect().await?;
        let (sender, conn) = http2::handshake(TokioExecutor::new(), TokioIo::new(stream))
            .await
            .map_err(|e| SbiError::ConnectionError(e.to_string()))?;

        let authority = self.config.authority();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::debug!("HTTP/2 connection to {authority} closed: {e}");
            }
        });

        Ok(sender)
    }

    async fn connect_http1(&self) -> SbiResult<http1::SendRequest<Full<Bytes>>> {
        let stream = self.tcp_connect().await?;
        let (sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| SbiError::ConnectionError(e.to_string()))?;

        let authority = self.config.authority();
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::debug!("HTTP/1.1 connection to {authority} closed: {e}");
            }
        });

        Ok(sender)
    }

    /// Get the cached HTTP/2 sender or open a new connection
    async fn get_h2_sender(&self) -> SbiResult<http2::SendRequest<Full<Bytes>>> {
        let mut guard = self.h2_sender.lock().await;

        if let Some(sender) = guard.as_ref() {
            if sender.is_ready() {
                return Ok(sender.clone());
            }
        }

        let sender = self.connect_http2().await?;
        *guard = Some(sender.clone());
        Ok(sender)
    }

    /// Build the target URI: absolute for HTTP/2, origin-form for HTTP/1.1
    fn build_uri(&self, request: &SbiRequest) -> SbiResult<Uri> {
        let mut target = if request.header.uri.starts_with("http") {
            request.header.uri.clone()
        } else {
            format!("{}{}", self.config.base_uri(), request.header.uri)
        };

        if !request.http.params.is_empty() {
            let params: Vec<String> = request
                .http
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let separator = if target.contains('?') { '&' } else { '?' };
            target = format!("{target}{separator}{}", params.join("&"));
        }

        let uri: Uri = target
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{target}: {e}")))?;

        match self.config.http_version {
            HttpVersion::Http2 => Ok(uri),
            HttpVersion::Http1 => {
                let origin = uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| "/".to_string());
                origin
                    .parse()
                    .map_err(|e| SbiError::InvalidUri(format!("{origin}: {e}")))
            }
        }
    }

    fn build_request(&self, request: SbiRequest) -> SbiResult<Request<Full<Bytes>>> {
        let uri = self.build_uri(&request)?;

        let method = Method::from_bytes(request.header.method.to_uppercase().as_bytes())
            .map_err(|_| SbiError::InvalidMethod(request.header.method.clone()))?;

        let body = request
            .http
            .content
            .map(|c| Full::new(Bytes::from(c)))
            .unwrap_or_else(|| Full::new(Bytes::new()));

        let mut builder = Request::builder().method(method).uri(uri);
        if self.config.http_version == HttpVersion::Http1 {
            builder = builder.header(hyper::header::HOST, self.config.authority());
        }
        for (key, value) in &request.http.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder
            .body(body)
            .map_err(|e| SbiError::ClientError(e.to_string()))
    }

    /// Send an SBI request and receive a response.
    ///
    /// Any status code is returned as `Ok`; callers decide what a failure is.
    pub async fn send_request(&self, request: SbiRequest) -> SbiResult<SbiResponse> {
        let http_request = self.build_request(request)?;
        log::debug!(
            "SBI {} {} {}",
            self.config.http_version,
            http_request.method(),
            http_request.uri()
        );

        let exchange = async {
            let response = match self.config.http_version {
                HttpVersion::Http2 => {
                    let mut sender = self.get_h2_sender().await?;
                    sender
                        .send_request(http_request)
                        .await
                        .map_err(|e| SbiError::HyperError(e.to_string()))?
                }
                HttpVersion::Http1 => {
                    let mut sender = self.connect_http1().await?;
                    sender
                        .send_request(http_request)
                        .await
                        .map_err(|e| SbiError::HyperError(e.to_string()))?
                }
            };
            convert_response(response).await
        };

        tokio::time::timeout(self.config.request_timeout, exchange)
            .await
            .map_err(|_| SbiError::Timeout)?
    }

    /// Drop the cached connection
    pub async fn close(&self) {
        let mut guard = self.h2_sender.lock().await;
        *guard = None;
    }
}

/// Convert hyper response to SbiResponse
async fn convert_response(response: Response<Incoming>) -> SbiResult<SbiResponse> {
    let status = response.status().as_u16();

    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(key.to_string(), v.to_string());
        }
    }

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SbiError::InvalidResponse(e.to_string()))?
        .to_bytes();

    let mut sbi_response = SbiResponse::with_status(status);
    sbi_response.http.headers = headers;
    if !body_bytes.is_empty() {
        sbi_response.http.content = Some(String::from_utf8_lossy(&body_bytes).to_string());
    }

    Ok(sbi_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_from_uri() {
        let config = SbiClientConfig::from_uri("http://10.0.0.5:7777/npcf-policyauthorization/v1")
            .unwrap()
            .with_http_version(HttpVersion::Http1)
            .with_request_timeout(Duration::from_secs(2));

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 7777);
        assert_eq!(config.scheme, UriScheme::Http);
        assert_eq!(config.http_version, HttpVersion::Http1);
        assert_eq!(config.base_uri(), "http://10.0.0.5:7777");
    }

    #[test]
    fn test_client_config_default_port_and_ipv6() {
        let config = SbiClientConfig::from_uri("http://pcf.local").unwrap();
        assert_eq!(config.port, 80);

        let config = SbiClientConfig::from_uri("http://[2001:db8::1]:8000").unwrap();
        assert_eq!(config.host, "2001:db8::1");
        assert_eq!(config.authority(), "[2001:db8::1]:8000");
    }

    #[test]
    fn test_client_config_rejects_unusable_uris() {
        assert!(SbiClientConfig::from_uri("https://pcf:443").is_err());
        assert!(SbiClientConfig::from_uri("/relative/path").is_err());
        assert!(SbiClientConfig::from_uri("not a uri").is_err());
    }

    #[test]
    fn test_build_uri_per_http_version() {
        let request = SbiRequest::get("/nnrf-disc/v1/nf-instances")
            .with_param("target-nf-type", "PCF");

        let h2 = SbiClient::new(SbiClientConfig::new("127.0.0.10", 7777));
        assert_eq!(
            h2.build_uri(&request).unwrap().to_string(),
            "http://127.0.0.10:7777/nnrf-disc/v1/nf-instances?target-nf-type=PCF"
        );

        let h1 = SbiClient::new(
            SbiClientConfig::new("127.0.0.10", 7777).with_http_version(HttpVersion::Http1),
        );
        assert_eq!(
            h1.build_uri(&request).unwrap().to_string(),
            "/nnrf-disc/v1/nf-instances?target-nf-type=PCF"
        );
    }

    #[test]
    fn test_build_request_rejects_unknown_method() {
        let client = SbiClient::new(SbiClientConfig::new("127.0.0.1", 7777));
        let mut request = SbiRequest::get("/x");
        request.header.method = "NOT A METHOD".to_string();
        assert!(matches!(
            client.build_request(request),
            Err(SbiError::InvalidMethod(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_reported() {
        // Bind then drop to get a port with no listener
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = SbiClient::new(
            SbiClientConfig::new("127.0.0.1", port).with_connect_timeout(Duration::from_millis(500)),
        );
        let result = client.send_request(SbiRequest::get("/nnrf-disc/v1/nf-instances")).await;
        assert!(matches!(
            result,
            Err(SbiError::ConnectionError(_)) | Err(SbiError::Timeout)
        ));
    }
}
