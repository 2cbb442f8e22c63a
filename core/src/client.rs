//! HTTP client for the speedrun.com API.
//!
//! # Design
//! `SpeedrunClient` holds the base URL, the optional API key, the retry
//! policy and a [`Transport`]; it carries no mutable state between calls and
//! is passed explicitly to every query. Each round-trip is split the same way
//! throughout: `build_*` produces an [`HttpRequest`], [`execute`] runs it
//! (retrying transient GET failures), and [`parse_envelope`] checks the
//! status and strips the `data` envelope.
//!
//! [`execute`]: SpeedrunClient::execute
//! [`parse_envelope`]: SpeedrunClient::parse_envelope

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{Query, Resource};
use crate::transport::{Transport, UreqTransport};

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Client for the speedrun.com REST API.
#[derive(Debug, Clone)]
pub struct SpeedrunClient<T = UreqTransport> {
    base_url: Url,
    api_key: Option<String>,
    user_agent: String,
    retry: RetryPolicy,
    transport: T,
}

impl SpeedrunClient<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(config, UreqTransport::new(config.timeout()))
    }

    /// Client configured from `ClientConfig::load()`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_config(&ClientConfig::load()?)
    }
}

impl<T: Transport> SpeedrunClient<T> {
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be used as a base url",
                config.base_url
            )));
        }
        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            user_agent: config.user_agent.clone(),
            retry: config.retry.clone(),
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start an empty query against resource `R`.
    pub fn query<R: Resource>(&self) -> Query<R> {
        Query::new()
    }

    pub fn build_get(
        &self,
        segments: &[String],
        query: Vec<(String, String)>,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(segments)?,
            query,
            headers: self.headers(false),
            body: None,
        })
    }

    pub fn build_post<B: Serialize + ?Sized>(
        &self,
        segments: &[String],
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(segments)?,
            query: Vec::new(),
            headers: self.headers(true),
            body: Some(body),
        })
    }

    /// Run `request` through the transport and check its status.
    ///
    /// GET requests failing with a transient error are retried up to
    /// `retry.max_retries` times with exponential backoff. POST requests are
    /// attempted exactly once.
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut retries = 0;
        loop {
            let result = self
                .transport
                .execute(request)
                .and_then(check_status);
            match result {
                Ok(response) => {
                    debug!(status = response.status, retries, "request completed");
                    return Ok(response);
                }
                Err(err)
                    if request.method == HttpMethod::Get
                        && err.is_transient()
                        && retries < self.retry.max_retries =>
                {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(error = %err, retry = retries, ?delay, "transient failure, retrying");
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Decode a successful response body, stripping the `data` envelope when
    /// `unwrap` is set. Bodies without a `data` key are returned whole.
    pub fn parse_envelope(&self, response: HttpResponse, unwrap: bool) -> Result<Value, ApiError> {
        check_status(response).and_then(|response| {
            let mut value: Value = serde_json::from_str(&response.body)
                .map_err(|e| ApiError::DeserializationError(e.to_string()))?;
            if !unwrap {
                return Ok(value);
            }
            Ok(match value.get_mut("data") {
                Some(data) => data.take(),
                None => value,
            })
        })
    }

    /// GET `segments` with `query` and return the (optionally unwrapped) JSON.
    pub fn get(
        &self,
        segments: &[String],
        query: Vec<(String, String)>,
        unwrap: bool,
    ) -> Result<Value, ApiError> {
        let request = self.build_get(segments, query)?;
        self.execute(&request)
            .and_then(|response| self.parse_envelope(response, unwrap))
            .inspect_err(|err| error!(url = %request.url, error = %err, "GET failed"))
    }

    /// POST `body` as JSON to `segments` and return the (optionally
    /// unwrapped) JSON. Mutating endpoints need an API key.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[String],
        body: &B,
        unwrap: bool,
    ) -> Result<Value, ApiError> {
        let request = self.build_post(segments, body)?;
        self.execute(&request)
            .and_then(|response| self.parse_envelope(response, unwrap))
            .inspect_err(|err| error!(url = %request.url, error = %err, "POST failed"))
    }

    fn endpoint(&self, segments: &[String]) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn headers(&self, json_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), self.user_agent.clone()),
        ];
        if json_body {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(key) = &self.api_key {
            headers.push((API_KEY_HEADER.to_string(), key.clone()));
        }
        headers
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        return Ok(response);
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Transport that replays canned results and records every request.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        pub(crate) fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
            self.responses.lock().unwrap().push_back(Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.into(),
            }));
            self
        }

        pub(crate) fn respond_json(&self, body: Value) -> &Self {
            self.respond(200, body.to_string())
        }

        pub(crate) fn fail(&self, err: ApiError) -> &Self {
            self.responses.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("no canned response".into())))
        }
    }

    pub(crate) fn config() -> ClientConfig {
        ClientConfig::default()
            .with_base_url("https://www.speedrun.com/api/v1/")
            .with_retry(RetryPolicy {
                max_retries: 3,
                backoff_factor: 0.0,
                max_backoff_secs: 0.0,
            })
    }

    pub(crate) fn client(transport: &FakeTransport) -> SpeedrunClient<&FakeTransport> {
        SpeedrunClient::with_transport(&config(), transport).unwrap()
    }

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn build_get_joins_segments_onto_base_url() {
        let transport = FakeTransport::default();
        let req = client(&transport)
            .build_get(
                &segments(&["leaderboards", "o1y9okr6", "category", "zd3xmmvd"]),
                vec![("top".into(), "3".into())],
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://www.speedrun.com/api/v1/leaderboards/o1y9okr6/category/zd3xmmvd"
        );
        assert_eq!(req.query_value("top"), Some("3"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert!(req.header(API_KEY_HEADER).is_none());
        assert!(req.body.is_none());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        assert_eq!(client.base_url().as_str(), "https://www.speedrun.com/api/v1");
        assert_eq!(client.base_url().host_str(), Some("www.speedrun.com"));
    }

    #[test]
    fn identifiers_are_percent_encoded() {
        let transport = FakeTransport::default();
        let req = client(&transport)
            .build_get(&segments(&["games", "a b/c"]), Vec::new())
            .unwrap();
        assert_eq!(req.url, "https://www.speedrun.com/api/v1/games/a%20b%2Fc");
    }

    #[test]
    fn api_key_is_sent_when_configured() {
        let transport = FakeTransport::default();
        let client =
            SpeedrunClient::with_transport(&config().with_api_key("hunter2"), &transport).unwrap();
        let req = client.build_get(&segments(&["runs"]), Vec::new()).unwrap();
        assert_eq!(req.header(API_KEY_HEADER), Some("hunter2"));
    }

    #[test]
    fn build_post_serializes_body() {
        let transport = FakeTransport::default();
        let req = client(&transport)
            .build_post(&segments(&["runs"]), &json!({"run": {"category": "zd3xmmvd"}}))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["run"]["category"], "zd3xmmvd");
    }

    #[test]
    fn get_unwraps_data_envelope_by_default() {
        let transport = FakeTransport::default();
        transport.respond_json(json!({"data": {"id": "o1y9okr6"}}));
        let value = client(&transport)
            .get(&segments(&["games", "o1y9okr6"]), Vec::new(), true)
            .unwrap();
        assert_eq!(value, json!({"id": "o1y9okr6"}));
    }

    #[test]
    fn get_keeps_envelope_when_unwrap_disabled() {
        let transport = FakeTransport::default();
        transport.respond_json(json!({"data": [], "pagination": {"links": []}}));
        let value = client(&transport)
            .get(&segments(&["runs"]), Vec::new(), false)
            .unwrap();
        assert!(value.get("pagination").is_some());
    }

    #[test]
    fn body_without_envelope_is_returned_whole() {
        let transport = FakeTransport::default();
        transport.respond_json(json!({"status": "ok"}));
        let value = client(&transport)
            .get(&segments(&["ping"]), Vec::new(), true)
            .unwrap();
        assert_eq!(value, json!({"status": "ok"}));
    }

    #[test]
    fn server_errors_are_retried_until_success() {
        let transport = FakeTransport::default();
        transport
            .respond(503, "busy")
            .fail(ApiError::Timeout("slow".into()))
            .respond_json(json!({"data": []}));
        let value = client(&transport)
            .get(&segments(&["runs"]), Vec::new(), true)
            .unwrap();
        assert_eq!(value, json!([]));
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn retries_stop_at_the_ceiling() {
        let transport = FakeTransport::default();
        for _ in 0..10 {
            transport.respond(502, "bad gateway");
        }
        let err = client(&transport)
            .get(&segments(&["runs"]), Vec::new(), true)
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 502, .. }));
        // One attempt plus three retries.
        assert_eq!(transport.requests().len(), 4);
    }

    #[test]
    fn not_found_is_not_retried() {
        let transport = FakeTransport::default();
        transport.respond(404, r#"{"status":404,"message":"not found"}"#);
        let err = client(&transport)
            .get(&segments(&["games", "nope"]), Vec::new(), true)
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn post_is_never_retried() {
        let transport = FakeTransport::default();
        transport.respond(500, "oops").respond_json(json!({"data": {}}));
        let err = client(&transport)
            .post(&segments(&["runs"]), &json!({}), true)
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let transport = FakeTransport::default();
        transport.respond(200, "not json");
        let err = client(&transport)
            .get(&segments(&["games"]), Vec::new(), true)
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn opaque_base_urls_are_rejected() {
        let transport = FakeTransport::default();
        let result = SpeedrunClient::with_transport(
            &ClientConfig::default().with_base_url("mailto:runner@example.com"),
            &transport,
        );
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }
}
