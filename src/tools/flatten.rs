use crate::drive::messages::{Comment, CommentReply};
use crate::tools::backref::BackReference;
use crate::tools::resolve::DocumentRef;
use crate::workbook::{
    Cell, FilterRange, Link, Row, WorkbookZone, COLUMNS_PER_REPLY, FIXED_COLUMNS, FIXED_HEADERS,
};
use chrono::DateTime;

/// Spreadsheet date format: `MM/dd/yyyy HH:mm:ss`.
pub const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
pub const NOT_AVAILABLE: &str = "n/a";
/// Allowed Action values, as offered in the sheet.
pub const ACTION_OPTIONS: [&str; 2] = ["Resolve", "Reopen"];

/// Settings that shape every row of one run.
#[derive(Debug, Clone)]
pub struct FlattenContext<'a> {
    pub zone: WorkbookZone,
    pub external_author: &'a str,
}

/// Render an RFC 3339 timestamp in the workbook's time zone.
/// Anything unparsable is passed through unchanged.
pub fn format_timestamp(raw: &str, zone: &WorkbookZone) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => zone.format(&ts, DATE_FORMAT),
        Err(e) => {
            tracing::warn!("Unparsable timestamp {:?}: {}", raw, e);
            raw.to_string()
        }
    }
}

/// Header labels for replies 1 through `replies`.
pub fn reply_headers(replies: usize) -> Vec<String> {
    (1..=replies)
        .flat_map(|k| {
            [
                format!("Reply {}", k),
                format!("Reply {} Author", k),
                format!("Reply {} Created", k),
                format!("Reply {} Modified", k),
            ]
        })
        .collect()
}

fn reply_cells(reply: &CommentReply, ctx: &FlattenContext<'_>) -> [Cell; COLUMNS_PER_REPLY] {
    [
        Cell::text(reply.content.as_str()),
        Cell::text(reply.author_name().unwrap_or(NOT_AVAILABLE)),
        Cell::text(format_timestamp(&reply.created_date, &ctx.zone)),
        Cell::text(format_timestamp(&reply.modified_date, &ctx.zone)),
    ]
}

/// One row per comment: the fixed columns, then four per reply.
pub fn flatten_comment(doc: &DocumentRef, comment: &Comment, ctx: &FlattenContext<'_>) -> Row {
    let bref = BackReference::new(doc.id.as_str(), comment.comment_id.as_str());

    let mut row = Vec::with_capacity(FIXED_COLUMNS + COLUMNS_PER_REPLY * comment.replies.len());
    row.push(Cell::Link(Link::new(doc.link.as_str(), doc.title.as_str())));
    row.push(Cell::default());
    row.push(Cell::default());
    row.push(Cell::text(comment.status.as_deref().unwrap_or_default()));
    row.push(Cell::text(comment.content.as_str()));
    row.push(Cell::text(comment.author_name().unwrap_or(ctx.external_author)));
    row.push(Cell::text(format_timestamp(&comment.created_date, &ctx.zone)));
    row.push(Cell::text(format_timestamp(&comment.modified_date, &ctx.zone)));
    row.push(Cell::text(comment.context_value().unwrap_or(NOT_AVAILABLE)));
    row.push(Cell::Link(bref.to_link(&doc.raw)));

    for reply in &comment.replies {
        row.extend(reply_cells(reply, ctx));
    }
    row
}

/// Replies encoded in a row's suffix.
pub fn reply_count(row: &Row) -> usize {
    row.len().saturating_sub(FIXED_COLUMNS) / COLUMNS_PER_REPLY
}

/// The finished sheet contents of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentTable {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
    pub max_replies: usize,
}

impl CommentTable {
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Filter over header plus data, only when there is data.
    pub fn filter(&self) -> Option<FilterRange> {
        (!self.rows.is_empty()).then(|| FilterRange {
            rows: self.rows.len() + 1,
            columns: self.width(),
        })
    }
}

/// Collects rows for one run and tracks the widest reply thread.
///
/// The header is produced once, by `finish`, at its final width.
#[derive(Debug, Default)]
pub struct TableBuilder {
    rows: Vec<Row>,
    max_replies: usize,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row and return its 1-based row number.
    pub fn push(&mut self, row: Row) -> usize {
        self.max_replies = self.max_replies.max(reply_count(&row));
        self.rows.push(row);
        self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_replies(&self) -> usize {
        self.max_replies
    }

    pub fn finish(self) -> CommentTable {
        let mut header: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
        header.extend(reply_headers(self.max_replies));
        CommentTable {
            header,
            rows: self.rows,
            max_replies: self.max_replies,
        }
    }
}
