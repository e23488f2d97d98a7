pub mod client;
pub mod messages;
pub mod mock;
pub mod traits;

pub use client::HttpDriveClient;
pub use mock::MockDriveClient;
pub use traits::DriveClient;

/// Percent-encode one path segment of an endpoint.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

pub fn file_endpoint(file_id: &str) -> String {
    format!("/files/{}", segment(file_id))
}

pub fn comments_endpoint(file_id: &str) -> String {
    format!("/files/{}/comments", segment(file_id))
}

pub fn replies_endpoint(file_id: &str, comment_id: &str) -> String {
    format!(
        "/files/{}/comments/{}/replies",
        segment(file_id),
        segment(comment_id)
    )
}
