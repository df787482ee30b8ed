use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUEST_TIMEOUTS, CLIENT_REQUESTS,
};
use crate::types::{
    ChatParams, ChatReply, MessageHistory, PreferencesParams, Profile, RegisterParams,
    RegisteredUser,
};

/// Base URL of the hosted Ammora service.
pub const DEFAULT_API_URL: &str = "https://ammora.onrender.com/api/";

/// Environment variable that overrides [`DEFAULT_API_URL`].
pub const API_URL_ENV: &str = "AMMORA_API_URL";

/// Requests that take longer than this are abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// The remote operations the client relies on.
///
/// [`Ammora`] implements this over HTTP; tests substitute an in-memory fake.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST user/register`
    async fn register(&self, params: RegisterParams) -> Result<RegisteredUser>;

    /// `POST user/preferences`.  Only the status matters; the body is ignored.
    async fn save_preferences(&self, params: PreferencesParams) -> Result<()>;

    /// `POST chat`
    async fn chat(&self, params: ChatParams) -> Result<ChatReply>;

    /// `GET messages/{user_id}`
    async fn history(&self, user_id: &str) -> Result<MessageHistory>;

    /// `GET user/{user_id}`
    async fn profile(&self, user_id: &str) -> Result<Profile>;
}

/// HTTP client for the Ammora API.
#[derive(Debug, Clone)]
pub struct Ammora {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Ammora {
    /// Create a new client.
    ///
    /// The base URL is read from the AMMORA_API_URL environment variable and falls back
    /// to [`DEFAULT_API_URL`].
    pub fn new() -> Result<Self> {
        Self::with_options(None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("{base_url} cannot be used as a base URL"),
                None,
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Resolves `segments` below the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("{} cannot be a base", self.base_url), None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response, resource_id: Option<&str>) -> Error {
        let status_code = response.status().as_u16();

        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
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

        // A body that is not `{error}` JSON (gateway pages and the like) is a malformed
        // response, not a server-reported message.
        let message = match serde_json::from_str::<ErrorBody>(&error_body) {
            Ok(body) => body.error.unwrap_or_default(),
            Err(e) => {
                return Error::serialization(
                    format!("Failed to parse error response (HTTP {status_code}): {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        match status_code {
            400 => Error::bad_request(message),
            404 => Error::not_found(message, resource_id.map(String::from)),
            500 => Error::internal_server(message),
            502..=504 => Error::service_unavailable(status_code, message),
            _ => Error::api(status_code, message),
        }
    }

    /// Sends `request`, returning the response only when its status is a success.
    async fn execute(&self, request: RequestBuilder, resource_id: Option<&str>) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                CLIENT_REQUEST_TIMEOUTS.click();
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
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response, resource_id).await;
            tracing::debug!(error = %err, "server rejected request");
            return Err(err);
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(format!("Reading response timed out: {}", e), None)
            } else {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            }
        })
    }
}

#[async_trait::async_trait]
impl ChatBackend for Ammora {
    async fn register(&self, params: RegisterParams) -> Result<RegisteredUser> {
        let url = self.endpoint(&["user", "register"])?;
        tracing::debug!(%url, username = %params.username, "registering user");
        let response = self.execute(self.client.post(url).json(&params), None).await?;
        Self::decode(response).await
    }

    async fn save_preferences(&self, params: PreferencesParams) -> Result<()> {
        let url = self.endpoint(&["user", "preferences"])?;
        tracing::debug!(%url, user_id = %params.user_id, "saving preferences");
        self.execute(
            self.client.post(url).json(&params),
            Some(&params.user_id),
        )
        .await?;
        Ok(())
    }

    async fn chat(&self, params: ChatParams) -> Result<ChatReply> {
        let url = self.endpoint(&["chat"])?;
        tracing::debug!(%url, user_id = %params.user_id, len = params.message.len(), "sending chat message");
        let response = self
            .execute(self.client.post(url).json(&params), Some(&params.user_id))
            .await?;
        Self::decode(response).await
    }

    async fn history(&self, user_id: &str) -> Result<MessageHistory> {
        let url = self.endpoint(&["messages", user_id])?;
        tracing::debug!(%url, "fetching message history");
        let response = self.execute(self.client.get(url), Some(user_id)).await?;
        Self::decode(response).await
    }

    async fn profile(&self, user_id: &str) -> Result<Profile> {
        let url = self.endpoint(&["user", user_id])?;
        tracing::debug!(%url, "fetching profile");
        let response = self.execute(self.client.get(url), Some(user_id)).await?;
        Self::decode(response).await
    }
}
