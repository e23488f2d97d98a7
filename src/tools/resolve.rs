use crate::drive::file_endpoint;
use crate::drive::messages::{DriveFile, FileQuery};
use crate::drive::traits::DriveClient;
use crate::tools::{RunFailure, RunMode};
use crate::types::errors::RunError;
use regex::Regex;
use std::sync::LazyLock;

const DOCUMENT_ID_PATTERN: &str = r"[-_0-9A-Za-z]{25,}";

static DOCUMENT_ID: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(DOCUMENT_ID_PATTERN) {
    Ok(re) => Some(re),
    Err(e) => {
        tracing::error!("Document id pattern failed to compile: {}", e);
        None
    }
});

/// A reference that resolved to a supported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// The reference exactly as the user entered it.
    pub raw: String,
    pub id: String,
    pub title: String,
    pub mime_type: String,
    /// Where the document opens in a browser.
    pub link: String,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub accepted: Vec<DocumentRef>,
    /// `"<title>: <mimeType>"` for every unsupported document.
    pub rejected: Vec<String>,
    pub failures: Vec<RunFailure>,
}

/// First run of 25 or more id characters in `raw`.
pub fn extract_document_id(raw: &str) -> Option<&str> {
    DOCUMENT_ID.as_ref()?.find(raw).map(|m| m.as_str())
}

/// Native Drive formats (`application/vnd.google-apps.*`) and PDF.
pub fn is_supported_mime_type(mime_type: &str) -> bool {
    mime_type.contains("google") || mime_type.contains("pdf")
}

/// Fetch metadata for one document id.
pub async fn get_file<C: DriveClient>(client: &C, file_id: &str) -> Result<DriveFile, RunError> {
    client
        .get(&file_endpoint(file_id), &FileQuery::default())
        .await
        .map_err(|e| RunError::drive(format!("document {}", file_id), e))
}

/// Turn raw references into supported documents, in input order.
///
/// References without an id are skipped silently. Repeated ids are kept.
pub async fn resolve_references<C: DriveClient>(
    client: &C,
    raws: &[String],
    mode: RunMode,
) -> Result<Resolution, RunError> {
    let mut resolution = Resolution::default();

    for raw in raws.iter().filter(|r| !r.trim().is_empty()) {
        let Some(id) = extract_document_id(raw) else {
            tracing::debug!("No document id in reference {:?}", raw);
            continue;
        };

        let file = match get_file(client, id).await {
            Ok(file) => file,
            Err(e) if mode == RunMode::Lenient => {
                tracing::warn!("Skipping reference {:?}: {}", raw, e);
                resolution.failures.push(RunFailure::new(raw.as_str(), &e));
                continue;
            }
            Err(e) => return Err(e),
        };

        if !is_supported_mime_type(&file.mime_type) {
            tracing::info!("Unsupported document {} ({})", file.title, file.mime_type);
            resolution
                .rejected
                .push(format!("{}: {}", file.title, file.mime_type));
            continue;
        }

        let id = if file.id.is_empty() {
            id.to_string()
        } else {
            file.id
        };
        let link = file.alternate_link.unwrap_or_else(|| raw.clone());
        resolution.accepted.push(DocumentRef {
            raw: raw.clone(),
            id,
            title: file.title,
            mime_type: file.mime_type,
            link,
        });
    }

    Ok(resolution)
}
