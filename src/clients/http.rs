//! HTTP transport abstraction for testability.
//!
//! Every typed client in this module talks to the network through
//! [`HttpTransport`], so tests can inject canned bodies and failures without
//! a server.

use super::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Query string pairs appended to a request.
pub type Query<'a> = &'a [(&'a str, String)];

/// Trait for HTTP operations used by the clients.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a GET and returns the response body.
    async fn get(&self, url: &str, query: Query<'_>) -> Result<Vec<u8>, TransportError>;

    /// Performs a body-less POST and returns the response body.
    async fn post(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Real transport implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    bearer: Option<String>,
}

impl ReqwestTransport {
    /// Creates a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            bearer: None,
        })
    }

    /// Attaches `Authorization: Bearer <token>` to every request.
    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token.filter(|t| !t.is_empty());
        self
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read(response: reqwest::Response, url: &str) -> Result<Vec<u8>, TransportError> {
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| TransportError::Request(format!("Failed to read response: {}", e)))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: Query<'_>) -> Result<Vec<u8>, TransportError> {
        debug!(url, "GET");
        let response = self
            .authorize(self.client.get(url).query(query))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::read(response, url).await
    }

    async fn post(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!(url, "POST");
        let response = self
            .authorize(self.client.post(url))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Self::read(response, url).await
    }
}

/// Decodes a JSON body into `T`.
pub fn decode_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, TransportError> {
    serde_json::from_slice(body).map_err(TransportError::from)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned transport: responses keyed by URL, every call recorded.
    #[derive(Default)]
    pub struct MockTransport {
        responses: Mutex<HashMap<String, Result<Vec<u8>, TransportError>>>,
        pub calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, url: &str, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
            self
        }

        pub fn fail(self, url: &str, error: TransportError) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(url.to_string(), Err(error));
            self
        }

        pub fn query_of(&self, index: usize) -> Vec<(String, String)> {
            self.calls.lock().unwrap()[index].1.clone()
        }

        fn answer(&self, url: &str, query: Query<'_>) -> Result<Vec<u8>, TransportError> {
            self.calls.lock().unwrap().push((
                url.to_string(),
                query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            ));
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_else(|| {
                    Err(TransportError::Status {
                        status: 404,
                        url: url.to_string(),
                    })
                })
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn get(&self, url: &str, query: Query<'_>) -> Result<Vec<u8>, TransportError> {
            self.answer(url, query)
        }

        async fn post(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            self.answer(url, &[])
        }
    }

    #[tokio::test]
    async fn test_mock_transport_answers_and_records() {
        let mock = MockTransport::new().respond("http://x/a", "[1,2]");
        let body = mock.get("http://x/a", &[("q", "v".to_string())]).await.unwrap();
        let values: Vec<u32> = decode_json(&body).unwrap();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(mock.query_of(0), vec![("q".to_string(), "v".to_string())]);
    }

    #[tokio::test]
    async fn test_unknown_url_is_a_status_failure() {
        let mock = MockTransport::new();
        let err = mock.post("http://x/missing").await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[test]
    fn test_decode_error_maps_to_decode_variant() {
        let err = decode_json::<Vec<u32>>(b"not json").unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
