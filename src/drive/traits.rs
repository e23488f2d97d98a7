use crate::types::errors::DriveError;
use async_trait::async_trait;

/// Trait for talking to the Drive comments API.
/// Implementations: HttpDriveClient (production), MockDriveClient (testing)
#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Issue a GET against `endpoint` with `query` encoded as URL parameters.
    async fn get<Q, Res>(&self, endpoint: &str, query: &Q) -> Result<Res, DriveError>
    where
        Q: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned;

    /// Issue a POST against `endpoint` with `body` encoded as JSON.
    async fn post<Req, Res>(&self, endpoint: &str, body: &Req) -> Result<Res, DriveError>
    where
        Req: serde::Serialize + Send + Sync,
        Res: serde::de::DeserializeOwned;

    /// Check if the API is reachable with the configured credentials.
    async fn health_check(&self) -> Result<(), DriveError>;
}
