use crate::drive::messages::{About, AboutQuery};
use crate::drive::traits::DriveClient;
use crate::types::errors::DriveError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v2";

/// Drive client over HTTPS with a bearer access token.
#[derive(Clone)]
pub struct HttpDriveClient {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpDriveClient {
    /// Create a client for `base_url` (default: the public Drive v2 endpoint).
    /// Without an access token requests go out unauthenticated and the API
    /// will answer 401.
    pub fn new(base_url: Option<String>, access_token: Option<String>) -> Self {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            base_url,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    /// Same as `new`, but every request is bounded by `timeout`.
    pub fn with_timeout(
        base_url: Option<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DriveError> {
        let mut client = Self::new(base_url, access_token);
        client.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DriveError::ConnectionFailed(e.to_string()))?;
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<Res>(&self, endpoint: &str, builder: RequestBuilder) -> Result<Res, DriveError>
    where
        Res: serde::de::DeserializeOwned,
    {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, endpoint, &body));
        }

        response
            .json::<Res>()
            .await
            .map_err(|e| DriveError::InvalidResponse(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> DriveError {
    if e.is_timeout() {
        DriveError::Timeout
    } else if e.is_connect() {
        DriveError::NotConnected
    } else {
        DriveError::ConnectionFailed(e.to_string())
    }
}

fn map_status(status: StatusCode, endpoint: &str, body: &str) -> DriveError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DriveError::Unauthorized(status.as_u16())
        }
        StatusCode::NOT_FOUND => DriveError::NotFound(endpoint.to_string()),
        _ => DriveError::RequestFailed(format!(
            "HTTP {} from {}: {}",
            status.as_u16(),
            endpoint,
            body.trim()
        )),
    }
}

#[async_trait]
impl DriveClient for HttpDriveClient {
    async fn get<Q, Res>(&self, endpoint: &str, query: &Q) -> Result<Res, DriveError>
    where
        Q: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned,
    {
        tracing::debug!("GET {}", endpoint);
        let builder = self.client.get(self.url(endpoint)).query(query);
        self.send(endpoint, builder).await
    }

    async fn post<Req, Res>(&self, endpoint: &str, body: &Req) -> Result<Res, DriveError>
    where
        Req: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned,
    {
        tracing::debug!("POST {}", endpoint);
        let builder = self.client.post(self.url(endpoint)).json(body);
        self.send(endpoint, builder).await
    }

    async fn health_check(&self) -> Result<(), DriveError> {
        let _: About = self.get("/about", &AboutQuery::default()).await?;
        Ok(())
    }
}
