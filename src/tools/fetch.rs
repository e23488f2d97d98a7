use crate::drive::comments_endpoint;
use crate::drive::messages::{Comment, CommentList, ListCommentsQuery, COMMENTS_PAGE_SIZE};
use crate::drive::traits::DriveClient;
use crate::types::errors::DriveError;

/// Fetch every comment on a document, draining all pages.
///
/// Comments keep the server's order across pages. Replies come embedded in
/// each comment and are not paginated separately.
pub async fn fetch_comments<C: DriveClient>(
    client: &C,
    file_id: &str,
    include_deleted: bool,
) -> Result<Vec<Comment>, DriveError> {
    let endpoint = comments_endpoint(file_id);
    let mut comments = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let query = ListCommentsQuery {
            include_deleted,
            max_results: COMMENTS_PAGE_SIZE,
            page_token: page_token.clone(),
        };
        let page: CommentList = client.get(&endpoint, &query).await?;
        pages += 1;
        tracing::debug!(
            "Fetched page {} of comments for {} ({} items)",
            pages,
            file_id,
            page.items.len()
        );
        comments.extend(page.items);

        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                return Err(DriveError::InvalidResponse(format!(
                    "comment listing for {} repeated page token {}",
                    file_id, next
                )));
            }
            Some(next) => page_token = Some(next),
            None => break,
        }
    }

    tracing::info!(
        "Fetched {} comments for {} in {} page(s)",
        comments.len(),
        file_id,
        pages
    );
    Ok(comments)
}
