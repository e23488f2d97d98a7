use serde::{Deserialize, Serialize};

// =============================================================================
// FILE METADATA
// =============================================================================

/// Query for `GET /files/{fileId}`. Only the fields the resolver needs are requested.
#[derive(Serialize, Debug)]
pub struct FileQuery {
    pub fields: String,
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            fields: "id,title,mimeType,alternateLink".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub mime_type: String,
    /// Browser link to the document.
    #[serde(default)]
    pub alternate_link: Option<String>,
}

// =============================================================================
// COMMENTS
// =============================================================================

/// Largest page the comments endpoint will return.
pub const COMMENTS_PAGE_SIZE: u32 = 100;

/// Query for `GET /files/{fileId}/comments`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ListCommentsQuery {
    pub include_deleted: bool,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentList {
    #[serde(default)]
    pub items: Vec<Comment>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The text a comment is anchored to.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentContext {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    /// `open` or `resolved`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub modified_date: String,
    #[serde(default)]
    pub context: Option<CommentContext>,
    #[serde(default)]
    pub deleted: bool,
    /// Server order, oldest first.
    #[serde(default)]
    pub replies: Vec<CommentReply>,
}

impl Comment {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.display_name.as_deref())
    }

    pub fn context_value(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.value.as_deref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    #[serde(default)]
    pub reply_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub created_date: String,
    #[serde(default)]
    pub modified_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl CommentReply {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.display_name.as_deref())
    }
}

// =============================================================================
// REPLIES
// =============================================================================

/// Body for `POST /files/{fileId}/comments/{commentId}/replies`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InsertReplyRequest {
    pub content: String,
    /// `resolve` or `reopen`; omitted for a plain reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
}

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Serialize, Debug)]
pub struct AboutQuery {
    pub fields: String,
}

impl Default for AboutQuery {
    fn default() -> Self {
        Self {
            fields: "name".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct About {
    #[serde(default)]
    pub name: Option<String>,
}
