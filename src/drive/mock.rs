use crate::drive::traits::DriveClient;
use crate::types::errors::DriveError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock Drive client for testing.
/// Queue responses per endpoint, then verify calls were made.
///
/// Responses queued for one endpoint are handed out in order; the last one
/// keeps being returned once the queue is down to a single entry. That lets
/// a test queue every page of a paginated listing under the same endpoint.
#[derive(Clone, Default)]
pub struct MockDriveClient {
    /// Queued responses for each endpoint
    responses: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    /// Record of all requests made (endpoint -> query or body)
    requests: Arc<Mutex<Vec<(String, String)>>>,
    /// Endpoints that fail with RequestFailed
    failing: Arc<Mutex<HashSet<String>>>,
    /// If true, all requests fail with NotConnected
    disconnected: Arc<Mutex<bool>>,
}

impl MockDriveClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for a specific endpoint.
    pub fn when_called(&self, endpoint: &str, response: impl serde::Serialize) {
        let json = serde_json::to_string(&response).unwrap();
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(json);
    }

    /// Make every request to `endpoint` fail.
    pub fn fail_on(&self, endpoint: &str) {
        self.failing.lock().unwrap().insert(endpoint.to_string());
    }

    /// Simulate the API being unreachable.
    pub fn set_disconnected(&self, disconnected: bool) {
        *self.disconnected.lock().unwrap() = disconnected;
    }

    /// Get all requests made to a specific endpoint.
    pub fn requests_to(&self, endpoint: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Endpoints called so far, in call order.
    pub fn endpoints_called(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.clone())
            .collect()
    }

    /// Verify a request was made to an endpoint.
    pub fn assert_called(&self, endpoint: &str) {
        let calls = self.requests_to(endpoint);
        assert!(
            !calls.is_empty(),
            "Expected call to {} but none found",
            endpoint
        );
    }

    /// Verify no requests were made.
    pub fn assert_no_calls(&self) {
        let requests = self.requests.lock().unwrap();
        assert!(
            requests.is_empty(),
            "Expected no calls but found: {:?}",
            requests
        );
    }

    fn canned<Res>(&self, endpoint: &str, payload: String) -> Result<Res, DriveError>
    where
        Res: serde::de::DeserializeOwned,
    {
        if *self.disconnected.lock().unwrap() {
            return Err(DriveError::NotConnected);
        }

        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), payload));

        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(DriveError::RequestFailed(format!(
                "HTTP 500 from {}",
                endpoint
            )));
        }

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(endpoint)
            .ok_or_else(|| DriveError::NotFound(format!("No mock response for {}", endpoint)))?;
        let response_json = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };

        serde_json::from_str(&response_json).map_err(|e| DriveError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl DriveClient for MockDriveClient {
    async fn get<Q, Res>(&self, endpoint: &str, query: &Q) -> Result<Res, DriveError>
    where
        Q: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned,
    {
        let query_json =
            serde_json::to_string(query).map_err(|e| DriveError::RequestFailed(e.to_string()))?;
        self.canned(endpoint, query_json)
    }

    async fn post<Req, Res>(&self, endpoint: &str, body: &Req) -> Result<Res, DriveError>
    where
        Req: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned,
    {
        let body_json =
            serde_json::to_string(body).map_err(|e| DriveError::RequestFailed(e.to_string()))?;
        self.canned(endpoint, body_json)
    }

    async fn health_check(&self) -> Result<(), DriveError> {
        if *self.disconnected.lock().unwrap() {
            Err(DriveError::NotConnected)
        } else {
            Ok(())
        }
    }
}
