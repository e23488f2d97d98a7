use crate::tools::flatten::reply_count;
use crate::workbook::{
    CommentSheet, Row, COL_ACTION, COL_AUTHOR, COL_CONTENT, COL_CONTEXT, COL_DOCUMENT,
    COL_MODIFIED, COL_RESPONSE, COL_STATUS,
};

const PREVIEW_CHARS: usize = 80;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn field(row: &Row, column: usize) -> &str {
    row.get(column).map(|c| c.display()).unwrap_or_default()
}

/// Formats the comment sheet as numbered plain-text entries.
pub fn format_sheet(sheet: &CommentSheet) -> String {
    if sheet.rows.is_empty() {
        return "No comments in the workbook. Run get_comments first.".to_string();
    }

    let mut output = format!(
        "{} comment(s), {} column(s)\n\n",
        sheet.rows.len(),
        sheet.width()
    );

    for (index, row) in sheet.rows.iter().enumerate() {
        output.push_str(&format!(
            "[{}] {} | {} | {} | modified {}\n",
            index + 1,
            field(row, COL_DOCUMENT),
            field(row, COL_STATUS),
            field(row, COL_AUTHOR),
            field(row, COL_MODIFIED),
        ));
        output.push_str(&format!("    {}\n", preview(field(row, COL_CONTENT))));

        let context = field(row, COL_CONTEXT);
        if !context.is_empty() && context != "n/a" {
            output.push_str(&format!("    on: \"{}\"\n", preview(context)));
        }

        let replies = reply_count(row);
        if replies > 0 {
            let noun = if replies == 1 { "reply" } else { "replies" };
            output.push_str(&format!("    {} {}\n", replies, noun));
        }

        let response = field(row, COL_RESPONSE);
        if !response.trim().is_empty() {
            let action = field(row, COL_ACTION);
            let action = if action.trim().is_empty() {
                String::new()
            } else {
                format!(" [{}]", action.trim())
            };
            output.push_str(&format!("    response{}: {}\n", action, preview(response)));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{Cell, Link, FIXED_COLUMNS};

    fn row(replies: usize) -> Row {
        let mut row = vec![Cell::default(); FIXED_COLUMNS + 4 * replies];
        row[COL_DOCUMENT] = Cell::Link(Link::new("https://example.com", "Plan"));
        row[COL_STATUS] = Cell::text("open");
        row[COL_CONTENT] = Cell::text("Please cite\nthe source");
        row[COL_AUTHOR] = Cell::text("Dana");
        row[COL_CONTEXT] = Cell::text("n/a");
        row
    }

    #[test]
    fn test_empty_sheet() {
        let formatted = format_sheet(&CommentSheet::default());
        assert!(formatted.contains("No comments"));
    }

    #[test]
    fn test_rows_are_numbered_from_one() {
        let mut second = row(2);
        second[COL_RESPONSE] = Cell::text("Done");
        second[COL_ACTION] = Cell::text("Resolve");
        let sheet = CommentSheet {
            header: vec![String::new(); FIXED_COLUMNS + 8],
            rows: vec![row(0), second],
            ..Default::default()
        };

        let formatted = format_sheet(&sheet);

        assert!(formatted.contains("[1] Plan | open | Dana"));
        assert!(formatted.contains("[2] Plan"));
        assert!(formatted.contains("Please cite the source"));
        assert!(formatted.contains("2 replies"));
        assert!(formatted.contains("response [Resolve]: Done"));
        assert!(!formatted.contains("on: "));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "word ".repeat(40);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS);
        assert!(shown.ends_with("..."));
    }
}
