//! The persisted comment table.
//!
//! A workbook is a JSON file holding the input references, the run settings,
//! and the flattened comment sheet. The two runs share nothing else: the
//! aggregation run rewrites the sheet, the dispatch run reads it back.

use crate::types::errors::WorkbookError;
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const FIXED_HEADERS: [&str; 10] = [
    "Document Name",
    "Response",
    "Action",
    "Status",
    "Comment",
    "Author",
    "Created",
    "Modified",
    "Context",
    "Link",
];

pub const FIXED_COLUMNS: usize = FIXED_HEADERS.len();
pub const COLUMNS_PER_REPLY: usize = 4;

pub const COL_DOCUMENT: usize = 0;
pub const COL_RESPONSE: usize = 1;
pub const COL_ACTION: usize = 2;
pub const COL_STATUS: usize = 3;
pub const COL_CONTENT: usize = 4;
pub const COL_AUTHOR: usize = 5;
pub const COL_CREATED: usize = 6;
pub const COL_MODIFIED: usize = 7;
pub const COL_CONTEXT: usize = 8;
pub const COL_LINK: usize = 9;

/// Value of the include-deleted setting that turns it on.
pub const INCLUDE_DELETED_YES: &str = "Yes";

/// A hyperlink cell, rendered by spreadsheets as `=HYPERLINK("url","label")`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub url: String,
    pub label: String,
    /// Machine-readable back-reference token, when the link carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Link {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            key: None,
        }
    }

    pub fn formula(&self) -> String {
        format!("=HYPERLINK(\"{}\",\"{}\")", self.url, self.label)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Cell {
    Link(Link),
    Text(String),
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Text(String::new())
    }
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// What a reader sees in the cell.
    pub fn display(&self) -> &str {
        match self {
            Cell::Text(s) => s,
            Cell::Link(link) => &link.label,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.display().trim().is_empty()
    }
}

pub type Row = Vec<Cell>;

/// Rectangle covered by the sheet filter, starting at the header row.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRange {
    pub rows: usize,
    pub columns: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentSheet {
    #[serde(default)]
    pub header: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterRange>,
    /// Allowed values of the Action column.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_options: Vec<String>,
}

impl CommentSheet {
    /// Drop everything and leave only the fixed header.
    pub fn clear(&mut self) {
        self.header = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
        self.rows.clear();
        self.filter = None;
        self.action_options.clear();
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Mutable access to a data row by 1-based row number.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut Row> {
        row.checked_sub(1).and_then(|i| self.rows.get_mut(i))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    /// IANA zone name such as `America/New_York`, `UTC`, or a fixed offset such as `-04:00`.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub include_deleted: String,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub comments: CommentSheet,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for Workbook {
    fn default() -> Self {
        let mut comments = CommentSheet::default();
        comments.clear();
        Self {
            time_zone: default_time_zone(),
            include_deleted: String::new(),
            references: Vec::new(),
            comments,
        }
    }
}

impl Workbook {
    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let raw = std::fs::read_to_string(path).map_err(|source| WorkbookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| WorkbookError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the workbook, or start an empty one if the file does not exist yet.
    pub fn load_or_default(path: &Path) -> Result<Self, WorkbookError> {
        match Self::load(path) {
            Err(WorkbookError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Write the workbook, replacing the file in one rename.
    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let io_err = |source| WorkbookError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| WorkbookError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(|source| {
            std::fs::remove_file(&tmp).ok();
            io_err(source)
        })
    }

    pub fn include_deleted(&self) -> bool {
        self.include_deleted == INCLUDE_DELETED_YES
    }

    /// Non-blank references in input order.
    pub fn references(&self) -> Vec<String> {
        self.references
            .iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn zone(&self) -> Result<WorkbookZone, WorkbookError> {
        parse_time_zone(&self.time_zone)
    }
}

/// The zone dates are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookZone {
    /// IANA zone such as `America/New_York`; daylight saving applies.
    Named(Tz),
    Fixed(FixedOffset),
}

impl WorkbookZone {
    pub fn format(&self, ts: &DateTime<FixedOffset>, fmt: &str) -> String {
        match self {
            WorkbookZone::Named(tz) => ts.with_timezone(tz).format(fmt).to_string(),
            WorkbookZone::Fixed(offset) => ts.with_timezone(offset).format(fmt).to_string(),
        }
    }
}

impl Default for WorkbookZone {
    fn default() -> Self {
        WorkbookZone::Named(Tz::UTC)
    }
}

/// Parse an IANA zone name, or failing that `UTC`, `GMT`, `Z`, `+05:30`,
/// `-0400`, `UTC+2` and the like.
pub fn parse_time_zone(value: &str) -> Result<WorkbookZone, WorkbookError> {
    let trimmed = value.trim();
    if let Ok(tz) = trimmed.parse::<Tz>() {
        return Ok(WorkbookZone::Named(tz));
    }
    parse_fixed_offset(trimmed)
        .map(WorkbookZone::Fixed)
        .ok_or_else(|| WorkbookError::InvalidTimeZone(value.to_string()))
}

fn parse_fixed_offset(trimmed: &str) -> Option<FixedOffset> {
    let rest = ["UTC", "GMT", "Z"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(*prefix))
        .unwrap_or(trimmed);
    if rest.is_empty() {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.chars().next() {
        Some('+') => (1, &rest[1..]),
        Some('-') => (-1, &rest[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 && digits.is_ascii() => digits.split_at(2),
        None => (digits, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
