use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::types::{Message, MessageCreateParams};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/";
const ANTHROPIC_API_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Environment variable consulted when no API key is supplied.
pub const API_KEY_ENV: &str = "MIMID_API_KEY";

/// Sends one chat-completion request and returns the assistant's reply.
///
/// The interview driver talks to the API only through this trait.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    /// Send the request and wait for the complete response.
    async fn send(&self, params: MessageCreateParams) -> Result<Message>;
}

/// Client for the Anthropic API.
#[derive(Clone)]
pub struct Anthropic {
    api_key: String,
    client: ReqwestClient,
    base_url: String,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Anthropic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anthropic")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl Anthropic {
    /// Create a new Anthropic client.
    ///
    /// The API key can be provided directly or read from the MIMID_API_KEY
    /// environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// The base URL must be absolute; a trailing slash is added when missing.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => env::var(API_KEY_ENV).map_err(|_| {
                Error::authentication(
                    "API key not provided and MIMID_API_KEY environment variable not set",
                )
            })?,
        };
        HeaderValue::from_str(&api_key)
            .map_err(|_| Error::authentication("API key contains invalid characters"))?;

        let base_url = match base_url {
            Some(url) => normalize_base_url(&url)?,
            None => DEFAULT_API_URL.to_string(),
        };

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request, response, and failure.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| Error::authentication("API key contains invalid characters"))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let request_id = response
            .headers()
            .get("request-id")
            .or_else(|| response.headers().get("x-request-id"))
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());
        let error_message = detail
            .and_then(|e| e.message)
            .unwrap_or_else(|| error_body.clone());

        match status_code {
            400 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message, None, None),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message, request_id),
        }
    }

    /// Send a message to the API and get a non-streaming response.
    pub async fn send(&self, params: MessageCreateParams) -> Result<Message> {
        CLIENT_REQUESTS.click();
        if let Some(logger) = &self.logger {
            logger.log_request(&params);
        }
        let start = Instant::now();
        let result = self.send_inner(&params).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        match &result {
            Ok(message) => {
                if let Some(logger) = &self.logger {
                    logger.log_response(message);
                }
            }
            Err(err) => {
                CLIENT_REQUEST_ERRORS.click();
                if let Some(logger) = &self.logger {
                    logger.log_error(err);
                }
            }
        }
        result
    }

    async fn send_inner(&self, params: &MessageCreateParams) -> Result<Message> {
        let url = format!("{}messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<Message>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait::async_trait]
impl MessageSender for Anthropic {
    async fn send(&self, params: MessageCreateParams) -> Result<Message> {
        Anthropic::send(self, params).await
    }
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)?;
    if parsed.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    let mut url = parsed.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KnownModel, MessageParam, Model};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_client_creation() {
        let client = Anthropic::new(Some("test-key".to_string())).unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, DEFAULT_API_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = Anthropic::with_options(
            Some("test-key".to_string()),
            Some("https://custom-api.example.com/v1".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://custom-api.example.com/v1/");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_base_url() {
        let err = Anthropic::with_options(Some("k".to_string()), Some("not a url".into()), None)
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = Anthropic::new(Some("sk-ant-secret".to_string())).unwrap();
        assert!(!format!("{client:?}").contains("sk-ant-secret"));
    }

    /// Serve exactly one HTTP response on a loopback port and return the
    /// base URL plus a handle yielding the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (format!("http://{addr}/v1/"), handle)
    }

    fn params() -> MessageCreateParams {
        MessageCreateParams::new(
            4096,
            vec![MessageParam::user("Please begin the coding interview.")],
            Model::Known(KnownModel::ClaudeHaiku45),
        )
        .with_system("You are an interviewer.")
    }

    #[tokio::test]
    async fn test_send_success() {
        let (base_url, handle) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"id":"msg_1","type":"message","role":"assistant","model":"claude-haiku-4-5","content":[{"type":"text","text":"Design a URL shortener."}],"stop_reason":"end_turn","stop_sequence":null,"usage":{"input_tokens":149,"output_tokens":205}}"#,
        )
        .await;
        let client =
            Anthropic::with_options(Some("sk-ant-test".to_string()), Some(base_url), None).unwrap();

        let message = client.send(params()).await.unwrap();
        assert_eq!(message.reply_text(), "Design a URL shortener.");
        assert_eq!(message.usage.input_tokens, 149);

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /v1/messages "));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("x-api-key: sk-ant-test"));
        assert!(lower.contains("anthropic-version: 2023-06-01"));
        assert!(request.contains(r#""system":"You are an interviewer.""#));
        assert!(request.contains(r#""max_tokens":4096"#));
    }

    #[tokio::test]
    async fn test_send_maps_401_to_authentication() {
        let (base_url, handle) = serve_once(
            "HTTP/1.1 401 Unauthorized",
            r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
        )
        .await;
        let client =
            Anthropic::with_options(Some("sk-ant-bad".to_string()), Some(base_url), None).unwrap();

        let err = client.send(params()).await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(err.to_string(), "Authentication error: invalid x-api-key");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_529_to_api_error() {
        let (base_url, handle) = serve_once(
            "HTTP/1.1 529 Site Overloaded",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .await;
        let client =
            Anthropic::with_options(Some("sk-ant-test".to_string()), Some(base_url), None).unwrap();

        let err = client.send(params()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(529));
        assert_eq!(err.to_string(), "overloaded_error: Overloaded");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_statuses_to_kinds() {
        let cases: [(&'static str, fn(&Error) -> bool); 7] = [
            ("HTTP/1.1 400 Bad Request", Error::is_bad_request),
            ("HTTP/1.1 403 Forbidden", Error::is_permission),
            ("HTTP/1.1 404 Not Found", Error::is_not_found),
            ("HTTP/1.1 408 Request Timeout", Error::is_timeout),
            ("HTTP/1.1 429 Too Many Requests", Error::is_rate_limit),
            ("HTTP/1.1 500 Internal Server Error", Error::is_server_error),
            ("HTTP/1.1 503 Service Unavailable", Error::is_server_error),
        ];
        for (status_line, is_kind) in cases {
            let (base_url, handle) = serve_once(
                status_line,
                r#"{"type":"error","error":{"type":"some_error","message":"nope"}}"#,
            )
            .await;
            let client =
                Anthropic::with_options(Some("sk-ant-test".to_string()), Some(base_url), None)
                    .unwrap();
            let err = client.send(params()).await.unwrap_err();
            assert!(is_kind(&err), "{status_line}: {err:?}");
            assert!(!err.is_authentication(), "{status_line}");
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_send_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = Anthropic::with_options(
            Some("sk-ant-test".to_string()),
            Some(format!("http://{addr}/v1/")),
            None,
        )
        .unwrap();
        let err = client.send(params()).await.unwrap_err();
        assert!(err.is_connection(), "{err:?}");
        assert!(!err.is_server_error());
    }
}
