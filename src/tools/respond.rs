use crate::drive::messages::{CommentReply, InsertReplyRequest};
use crate::drive::replies_endpoint;
use crate::drive::traits::DriveClient;
use crate::tools::backref::BackReference;
use crate::tools::{format_failures, RunFailure, RunMode, RunOptions};
use crate::types::errors::{BackRefError, DriveError, RunError};
use crate::workbook::{Cell, CommentSheet, Row, COL_ACTION, COL_LINK, COL_RESPONSE};
use serde::Serialize;

pub const VALID_ACTIONS: &[&str] = &["resolve", "reopen"];

/// Validate an Action cell. Blank means a plain reply; otherwise the
/// lower-cased value becomes the reply verb.
pub fn validate_action(action: &str) -> Result<Option<String>, String> {
    let action = action.trim();
    if action.is_empty() {
        return Ok(None);
    }

    let verb = action.to_lowercase();
    if VALID_ACTIONS.contains(&verb.as_str()) {
        Ok(Some(verb))
    } else {
        Err(format!(
            "Invalid action '{}'. Must be one of: {}",
            action,
            VALID_ACTIONS.join(", ")
        ))
    }
}

/// A reply that made it to the remote comment.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SentReply {
    pub row: usize,
    pub document_id: String,
    pub comment_id: String,
    pub reply_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RespondReport {
    pub sent: Vec<SentReply>,
    /// Rows with a blank Response cell.
    pub skipped: usize,
    pub failures: Vec<RunFailure>,
}

fn cell(row: &Row, column: usize) -> Option<&Cell> {
    row.get(column)
}

/// Post a single reply.
pub async fn insert_reply<C: DriveClient>(
    client: &C,
    bref: &BackReference,
    request: &InsertReplyRequest,
) -> Result<CommentReply, DriveError> {
    let endpoint = replies_endpoint(&bref.document_id, &bref.comment_id);
    client.post(&endpoint, request).await
}

async fn dispatch_row<C: DriveClient>(
    client: &C,
    number: usize,
    row: &Row,
    response: &str,
) -> Result<SentReply, RunError> {
    let action = cell(row, COL_ACTION).map(Cell::display).unwrap_or_default();
    let verb = validate_action(action).map_err(|_| RunError::InvalidAction {
        row: number,
        action: action.trim().to_string(),
        allowed: VALID_ACTIONS.join(", "),
    })?;

    let bref = cell(row, COL_LINK)
        .ok_or(BackRefError::Missing)
        .and_then(BackReference::from_cell)
        .map_err(|source| RunError::BackReference {
            row: number,
            source,
        })?;

    let request = InsertReplyRequest {
        content: response.to_string(),
        verb: verb.clone(),
    };
    let reply = insert_reply(client, &bref, &request)
        .await
        .map_err(|e| RunError::drive(format!("row {}", number), e))?;

    tracing::info!(
        "Row {}: replied to comment {} on {}{}",
        number,
        bref.comment_id,
        bref.document_id,
        verb.as_deref().map(|v| format!(" ({})", v)).unwrap_or_default()
    );

    Ok(SentReply {
        row: number,
        document_id: bref.document_id,
        comment_id: bref.comment_id,
        reply_id: reply.reply_id,
        verb,
    })
}

/// Post every response typed into the sheet back to its comment.
///
/// Rows are handled in sheet order and numbered from 1. Nothing is written
/// back to the sheet; running it twice sends the replies twice.
pub async fn respond<C: DriveClient>(
    client: &C,
    sheet: &CommentSheet,
    options: &RunOptions,
) -> Result<RespondReport, RunError> {
    let mut report = RespondReport::default();

    for (index, row) in sheet.rows.iter().enumerate() {
        let number = index + 1;
        let response = match cell(row, COL_RESPONSE) {
            Some(c) if !c.is_blank() => c.display(),
            _ => {
                report.skipped += 1;
                continue;
            }
        };

        match dispatch_row(client, number, row, response).await {
            Ok(sent) => report.sent.push(sent),
            Err(e) if options.mode == RunMode::Lenient => {
                tracing::warn!("Row {} not sent: {}", number, e);
                report
                    .failures
                    .push(RunFailure::new(format!("row {}", number), &e));
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        "Respond finished: {} sent, {} skipped, {} failed",
        report.sent.len(),
        report.skipped,
        report.failures.len()
    );
    Ok(report)
}

/// Fill the Response and Action cells of a 1-based data row.
pub fn set_response(
    sheet: &mut CommentSheet,
    number: usize,
    response: &str,
    action: Option<&str>,
) -> Result<(), String> {
    let action = action.unwrap_or_default().trim();
    validate_action(action)?;

    let total = sheet.rows.len();
    let row = sheet
        .row_mut(number)
        .ok_or_else(|| format!("Row {} does not exist (sheet has {} rows)", number, total))?;
    if row.len() <= COL_ACTION {
        row.resize(COL_ACTION + 1, Cell::default());
    }
    row[COL_RESPONSE] = Cell::text(response);
    row[COL_ACTION] = Cell::text(action);
    Ok(())
}

/// Formats the dispatch summary for display.
pub fn format_respond_report(report: &RespondReport) -> String {
    let mut output = format!(
        "Replies sent: {}\nRows without a response: {}\n",
        report.sent.len(),
        report.skipped
    );
    for sent in &report.sent {
        output.push_str(&format!(
            "  - row {}: comment {} on {}{}\n",
            sent.row,
            sent.comment_id,
            sent.document_id,
            sent.verb
                .as_deref()
                .map(|v| format!(" [{}]", v))
                .unwrap_or_default()
        ));
    }
    output.push_str(&format_failures(&report.failures));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::mock::MockDriveClient;
    use crate::workbook::{Link, FIXED_COLUMNS};

    const DOC_ID: &str = "1AbCdEfGhIjKlMnOpQrStUvWxYz012345";

    fn row(comment_id: &str, response: &str, action: &str) -> Row {
        let mut row = vec![Cell::default(); FIXED_COLUMNS];
        row[COL_RESPONSE] = Cell::text(response);
        row[COL_ACTION] = Cell::text(action);
        row[COL_LINK] = Cell::Link(
            BackReference::new(DOC_ID, comment_id)
                .to_link(&format!("https://docs.google.com/document/d/{}/edit", DOC_ID)),
        );
        row
    }

    fn sheet(rows: Vec<Row>) -> CommentSheet {
        CommentSheet {
            rows,
            ..Default::default()
        }
    }

    fn reply(id: &str) -> CommentReply {
        CommentReply {
            reply_id: id.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_action() {
        assert_eq!(validate_action(""), Ok(None));
        assert_eq!(validate_action("  "), Ok(None));
        assert_eq!(validate_action("Resolve"), Ok(Some("resolve".into())));
        assert_eq!(validate_action("REOPEN"), Ok(Some("reopen".into())));
        assert!(validate_action("delete").is_err());
    }

    #[tokio::test]
    async fn test_blank_responses_are_skipped() {
        let mock = MockDriveClient::new();

        let report = respond(
            &mock,
            &sheet(vec![row("c1", "", "Resolve"), row("c2", "   ", "")]),
            &RunOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.skipped, 2);
        assert!(report.sent.is_empty());
        mock.assert_no_calls();
    }

    #[tokio::test]
    async fn test_reply_without_action_has_no_verb() {
        let mock = MockDriveClient::new();
        let endpoint = replies_endpoint(DOC_ID, "c1");
        mock.when_called(&endpoint, reply("r1"));

        let report = respond(
            &mock,
            &sheet(vec![row("c1", "Thanks, will do", "")]),
            &RunOptions::default(),
        )
        .await
        .unwrap();

        let requests = mock.requests_to(&endpoint);
        assert_eq!(requests, vec![r#"{"content":"Thanks, will do"}"#]);
        assert_eq!(report.sent.len(), 1);
        assert_eq!(report.sent[0].reply_id, "r1");
        assert_eq!(report.sent[0].verb, None);
    }

    #[tokio::test]
    async fn test_action_is_lower_cased_into_verb() {
        let mock = MockDriveClient::new();
        let endpoint = replies_endpoint(DOC_ID, "c1");
        mock.when_called(&endpoint, reply("r1"));

        respond(
            &mock,
            &sheet(vec![row("c1", "Fixed", "Resolve")]),
            &RunOptions::strict(),
        )
        .await
        .unwrap();

        let requests = mock.requests_to(&endpoint);
        assert_eq!(requests, vec![r#"{"content":"Fixed","verb":"resolve"}"#]);
    }

    #[tokio::test]
    async fn test_strict_aborts_remaining_rows() {
        let mock = MockDriveClient::new();
        mock.fail_on(&replies_endpoint(DOC_ID, "c1"));
        mock.when_called(&replies_endpoint(DOC_ID, "c2"), reply("r2"));

        let result = respond(
            &mock,
            &sheet(vec![row("c1", "first", ""), row("c2", "second", "")]),
            &RunOptions::strict(),
        )
        .await;

        assert!(matches!(result, Err(RunError::Drive { .. })));
        assert!(mock.requests_to(&replies_endpoint(DOC_ID, "c2")).is_empty());
    }

    #[tokio::test]
    async fn test_lenient_records_failures_and_continues() {
        let mock = MockDriveClient::new();
        mock.fail_on(&replies_endpoint(DOC_ID, "c1"));
        mock.when_called(&replies_endpoint(DOC_ID, "c3"), reply("r3"));

        let mut broken = row("c2", "lost", "");
        broken[COL_LINK] = Cell::text("not a link");

        let report = respond(
            &mock,
            &sheet(vec![
                row("c1", "first", ""),
                broken,
                row("c3", "third", "Reopen"),
            ]),
            &RunOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.sent.len(), 1);
        assert_eq!(report.sent[0].row, 3);
        assert_eq!(report.sent[0].verb.as_deref(), Some("reopen"));
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].subject, "row 1");
        assert_eq!(report.failures[1].subject, "row 2");
    }

    #[tokio::test]
    async fn test_invalid_action_is_not_sent() {
        let mock = MockDriveClient::new();

        let result = respond(
            &mock,
            &sheet(vec![row("c1", "hello", "Delete")]),
            &RunOptions::strict(),
        )
        .await;

        assert!(matches!(result, Err(RunError::InvalidAction { row: 1, .. })));
        mock.assert_no_calls();
    }

    #[tokio::test]
    async fn test_short_row_without_link_fails_decode() {
        let mock = MockDriveClient::new();
        let short = vec![Cell::default(), Cell::text("orphan")];

        let result = respond(&mock, &sheet(vec![short]), &RunOptions::strict()).await;

        assert!(matches!(
            result,
            Err(RunError::BackReference {
                row: 1,
                source: BackRefError::Missing
            })
        ));
    }

    #[tokio::test]
    async fn test_legacy_link_without_key_is_decoded() {
        let mock = MockDriveClient::new();
        let endpoint = replies_endpoint(DOC_ID, "AAAA1");
        mock.when_called(&endpoint, reply("r1"));

        let mut legacy = row("ignored", "ok", "");
        legacy[COL_LINK] = Cell::Link(Link::new(
            format!("https://docs.google.com/document/d/{}/edit?disco=AAAA1", DOC_ID),
            "CommentAAAA1",
        ));

        let report = respond(&mock, &sheet(vec![legacy]), &RunOptions::strict())
            .await
            .unwrap();

        assert_eq!(report.sent[0].comment_id, "AAAA1");
        mock.assert_called(&endpoint);
    }

    #[test]
    fn test_set_response_fills_input_cells() {
        let mut sheet = sheet(vec![row("c1", "", ""), row("c2", "", "")]);

        set_response(&mut sheet, 2, "Done", Some("Resolve")).unwrap();

        assert!(sheet.rows[0][COL_RESPONSE].is_blank());
        assert_eq!(sheet.rows[1][COL_RESPONSE].display(), "Done");
        assert_eq!(sheet.rows[1][COL_ACTION].display(), "Resolve");
    }

    #[test]
    fn test_set_response_rejects_bad_row_or_action() {
        let mut sheet = sheet(vec![row("c1", "", "")]);

        assert!(set_response(&mut sheet, 0, "x", None).is_err());
        assert!(set_response(&mut sheet, 2, "x", None).is_err());
        assert!(set_response(&mut sheet, 1, "x", Some("archive")).is_err());
        assert!(sheet.rows[0][COL_RESPONSE].is_blank());
    }

    #[test]
    fn test_format_respond_report() {
        let report = RespondReport {
            sent: vec![SentReply {
                row: 2,
                document_id: DOC_ID.into(),
                comment_id: "c1".into(),
                reply_id: "r1".into(),
                verb: Some("resolve".into()),
            }],
            skipped: 4,
            failures: vec![RunFailure {
                subject: "row 3".into(),
                message: "boom".into(),
            }],
        };

        let formatted = format_respond_report(&report);

        assert!(formatted.contains("Replies sent: 1"));
        assert!(formatted.contains("Rows without a response: 4"));
        assert!(formatted.contains("row 2: comment c1"));
        assert!(formatted.contains("[resolve]"));
        assert!(formatted.contains("row 3: boom"));
    }
}
