//! Back-references: the pointer from a sheet row to its remote comment.
//!
//! Each row's Link cell carries two encodings of the same (document id,
//! comment id) pair. The URL is the user's own reference with
//! `/edit?disco=<commentId>` spliced in after the id, which opens the comment
//! in a browser and can be taken apart positionally. The link key is a
//! versioned token, `bref1:<documentId>:<commentId>` with both parts
//! percent-encoded, and is preferred when present.
//!
//! Positional decoding only understands URLs shaped like
//! `scheme://host/kind/d/<id>/edit?disco=<commentId>`; ids containing `/` or
//! `=` break it. Links written without a key fall back to it.

use crate::types::errors::BackRefError;
use crate::workbook::{Cell, Link};
use std::fmt;
use std::str::FromStr;

pub const TOKEN_VERSION: &str = "bref1";
const DISCUSSION_SEGMENT: &str = "edit?disco=";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackReference {
    pub document_id: String,
    pub comment_id: String,
}

impl BackReference {
    pub fn new(document_id: impl Into<String>, comment_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            comment_id: comment_id.into(),
        }
    }

    /// Everything in `raw` before the document id, then the id and the
    /// discussion fragment. Text after the id in `raw` is dropped.
    pub fn splice_url(&self, raw: &str) -> String {
        let prefix = raw
            .find(self.document_id.as_str())
            .map(|pos| &raw[..pos])
            .unwrap_or("");
        format!(
            "{}{}/{}{}",
            prefix, self.document_id, DISCUSSION_SEGMENT, self.comment_id
        )
    }

    pub fn label(&self) -> String {
        format!("Comment{}", self.comment_id)
    }

    pub fn token(&self) -> String {
        format!(
            "{}:{}:{}",
            TOKEN_VERSION,
            urlencoding::encode(&self.document_id),
            urlencoding::encode(&self.comment_id)
        )
    }

    /// The Link cell for a row whose document was referenced as `raw`.
    pub fn to_link(&self, raw: &str) -> Link {
        Link {
            url: self.splice_url(raw),
            label: self.label(),
            key: Some(self.token()),
        }
    }

    /// Decode a `bref1:` token.
    pub fn parse_token(token: &str) -> Result<Self, BackRefError> {
        let mut parts = token.trim().splitn(3, ':');
        let version = parts.next().unwrap_or_default();
        if version != TOKEN_VERSION {
            return Err(if version.starts_with("bref") {
                BackRefError::UnsupportedVersion(version.to_string())
            } else {
                BackRefError::Malformed(token.to_string())
            });
        }

        let (Some(document_id), Some(comment_id)) = (parts.next(), parts.next()) else {
            return Err(BackRefError::Malformed(token.to_string()));
        };
        let decode = |part: &str| {
            urlencoding::decode(part)
                .map(|s| s.into_owned())
                .map_err(|_| BackRefError::Malformed(token.to_string()))
        };

        non_empty(decode(document_id)?, decode(comment_id)?, token)
    }

    /// Positional decoding of a spliced URL: the document id is the sixth
    /// `/`-separated segment (or the one right before `edit?disco=` when the
    /// reference was a bare id), the comment id is whatever follows the last
    /// `=`.
    pub fn decode_url(url: &str) -> Result<Self, BackRefError> {
        let url = url.trim();
        let Some((_, comment_id)) = url.rsplit_once('=') else {
            return Err(BackRefError::Malformed(url.to_string()));
        };

        let segments: Vec<&str> = url.split('/').collect();
        let document_id = segments
            .iter()
            .position(|s| s.starts_with(DISCUSSION_SEGMENT))
            .and_then(|pos| pos.checked_sub(1))
            .or(Some(5))
            .and_then(|i| segments.get(i))
            .copied()
            .unwrap_or_default();

        non_empty(document_id.to_string(), comment_id.to_string(), url)
    }

    /// Decode a `=HYPERLINK("url","label")` formula by its first quoted part.
    pub fn decode_formula(formula: &str) -> Result<Self, BackRefError> {
        let url = formula
            .split('"')
            .nth(1)
            .ok_or_else(|| BackRefError::Malformed(formula.to_string()))?;
        Self::decode_url(url)
    }

    /// Decode whatever a Link cell holds.
    pub fn from_cell(cell: &Cell) -> Result<Self, BackRefError> {
        match cell {
            Cell::Link(link) => match &link.key {
                Some(key) => Self::parse_token(key),
                None => Self::decode_url(&link.url),
            },
            Cell::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(BackRefError::Missing)
                } else if text.to_ascii_uppercase().starts_with("=HYPERLINK(") {
                    Self::decode_formula(text)
                } else if text.starts_with("bref") {
                    Self::parse_token(text)
                } else {
                    Self::decode_url(text)
                }
            }
        }
    }
}

fn non_empty(
    document_id: String,
    comment_id: String,
    source: &str,
) -> Result<BackReference, BackRefError> {
    if document_id.is_empty() || comment_id.is_empty() {
        return Err(BackRefError::Malformed(source.to_string()));
    }
    Ok(BackReference {
        document_id,
        comment_id,
    })
}

impl fmt::Display for BackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for BackReference {
    type Err = BackRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_ID: &str = "abc123DEF456ghi789JKL012mno";

    #[test]
    fn test_splice_keeps_prefix_and_drops_suffix() {
        let bref = BackReference::new(DOC_ID, "AAAA1");
        let raw = format!("https://docs.google.com/document/d/{}/edit?usp=sharing", DOC_ID);

        assert_eq!(
            bref.splice_url(&raw),
            format!("https://docs.google.com/document/d/{}/edit?disco=AAAA1", DOC_ID)
        );
    }

    #[test]
    fn test_splice_bare_id() {
        let bref = BackReference::new(DOC_ID, "AAAA1");
        assert_eq!(
            bref.splice_url(DOC_ID),
            format!("{}/edit?disco=AAAA1", DOC_ID)
        );
    }

    #[test]
    fn test_positional_decode_of_spliced_url() {
        let bref = BackReference::new(DOC_ID, "xyz");
        let raw = format!("https://docs.google.com/document/d/{}/edit", DOC_ID);

        let decoded = BackReference::decode_url(&bref.splice_url(&raw)).unwrap();

        assert_eq!(decoded.document_id, DOC_ID);
        assert_eq!(decoded.comment_id, "xyz");
    }

    #[test]
    fn test_positional_decode_of_bare_id() {
        let bref = BackReference::new(DOC_ID, "xyz");
        let decoded = BackReference::decode_url(&bref.splice_url(DOC_ID)).unwrap();
        assert_eq!(decoded, bref);
    }

    #[test]
    fn test_positional_decode_uses_sixth_segment() {
        let decoded =
            BackReference::decode_url("https://docs.google.com/spreadsheets/d/SHEETID/x?disco=c9")
                .unwrap();
        assert_eq!(decoded.document_id, "SHEETID");
        assert_eq!(decoded.comment_id, "c9");
    }

    #[test]
    fn test_formula_decode() {
        let formula = format!(
            "=HYPERLINK(\"https://docs.google.com/document/d/{}/edit?disco=AAAA1\",\"CommentAAAA1\")",
            DOC_ID
        );

        let decoded = BackReference::decode_formula(&formula).unwrap();

        assert_eq!(decoded, BackReference::new(DOC_ID, "AAAA1"));
    }

    #[test]
    fn test_token_survives_separator_characters() {
        let bref = BackReference::new("doc/with=odd:chars", "c=1/2\"");

        let token = bref.token();
        assert!(token.starts_with("bref1:"));
        assert_eq!(token.matches(':').count(), 2);
        assert_eq!(BackReference::parse_token(&token).unwrap(), bref);
        assert_eq!(token.parse::<BackReference>().unwrap(), bref);
    }

    #[test]
    fn test_token_rejects_other_versions() {
        assert_eq!(
            BackReference::parse_token("bref2:a:b"),
            Err(BackRefError::UnsupportedVersion("bref2".into()))
        );
        assert!(matches!(
            BackReference::parse_token("nonsense"),
            Err(BackRefError::Malformed(_))
        ));
        assert!(matches!(
            BackReference::parse_token("bref1:onlydoc"),
            Err(BackRefError::Malformed(_))
        ));
        assert!(matches!(
            BackReference::parse_token("bref1::c1"),
            Err(BackRefError::Malformed(_))
        ));
    }

    #[test]
    fn test_from_cell_prefers_key() {
        let bref = BackReference::new(DOC_ID, "AAAA1");
        let mut link = bref.to_link(DOC_ID);
        link.url = "edited by hand".into();

        assert_eq!(BackReference::from_cell(&Cell::Link(link)).unwrap(), bref);
    }

    #[test]
    fn test_from_cell_without_key_decodes_url() {
        let bref = BackReference::new(DOC_ID, "AAAA1");
        let mut link = bref.to_link(&format!("https://docs.google.com/document/d/{}", DOC_ID));
        link.key = None;

        assert_eq!(BackReference::from_cell(&Cell::Link(link)).unwrap(), bref);
    }

    #[test]
    fn test_from_cell_text_variants() {
        let bref = BackReference::new(DOC_ID, "AAAA1");
        let link = bref.to_link(&format!("https://docs.google.com/document/d/{}", DOC_ID));

        assert_eq!(
            BackReference::from_cell(&Cell::text(link.formula())).unwrap(),
            bref
        );
        assert_eq!(
            BackReference::from_cell(&Cell::text(bref.token())).unwrap(),
            bref
        );
        assert_eq!(
            BackReference::from_cell(&Cell::text(link.url.clone())).unwrap(),
            bref
        );
        assert_eq!(
            BackReference::from_cell(&Cell::text("  ")),
            Err(BackRefError::Missing)
        );
    }

    #[test]
    fn test_malformed_urls_fail() {
        assert!(BackReference::decode_url("no equals sign here").is_err());
        assert!(BackReference::decode_url("https://docs.google.com/d?disco=").is_err());
        assert!(BackReference::decode_formula("=HYPERLINK(no quotes)").is_err());
    }
}
