use crate::drive::traits::DriveClient;
use crate::tools::fetch::fetch_comments;
use crate::tools::flatten::{flatten_comment, FlattenContext, TableBuilder, ACTION_OPTIONS};
use crate::tools::resolve::resolve_references;
use crate::tools::{format_failures, RunFailure, RunMode, RunOptions};
use crate::types::errors::RunError;
use crate::workbook::Workbook;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct GetCommentsReport {
    pub documents: usize,
    pub rows: usize,
    pub max_replies: usize,
    pub columns: usize,
    /// `"<title>: <mimeType>"` for each unsupported document.
    pub rejected: Vec<String>,
    pub failures: Vec<RunFailure>,
}

impl GetCommentsReport {
    /// The end-of-run notice about unsupported documents, if any.
    pub fn alert_message(&self) -> Option<String> {
        if self.rejected.is_empty() {
            None
        } else {
            Some(format!(
                "The following files were of unsupported file types: \n\n{}",
                self.rejected.join("\n")
            ))
        }
    }
}

/// Rebuild the workbook's comment sheet from its references.
///
/// The sheet is only touched once everything has been fetched, so a strict
/// run that fails leaves the previous contents in place.
pub async fn get_comments<C: DriveClient>(
    client: &C,
    workbook: &mut Workbook,
    options: &RunOptions,
) -> Result<GetCommentsReport, RunError> {
    let references = workbook.references();
    let include_deleted = workbook.include_deleted();
    let ctx = FlattenContext {
        zone: workbook.zone()?,
        external_author: &options.external_author,
    };

    tracing::info!(
        "Get comments: {} reference(s), include deleted: {}",
        references.len(),
        include_deleted
    );

    let resolution = resolve_references(client, &references, options.mode).await?;
    let mut failures = resolution.failures;
    let mut builder = TableBuilder::new();
    let mut documents = 0;

    for doc in &resolution.accepted {
        let comments = match fetch_comments(client, &doc.id, include_deleted).await {
            Ok(comments) => comments,
            Err(e) if options.mode == RunMode::Lenient => {
                tracing::warn!("Skipping {} ({}): {}", doc.title, doc.id, e);
                failures.push(RunFailure::new(format!("{} ({})", doc.title, doc.id), &e));
                continue;
            }
            Err(e) => return Err(RunError::drive(format!("{} ({})", doc.title, doc.id), e)),
        };

        documents += 1;
        for comment in &comments {
            let row = builder.push(flatten_comment(doc, comment, &ctx));
            tracing::debug!("Row {}: comment {} on {}", row, comment.comment_id, doc.id);
        }
    }

    let table = builder.finish();
    let report = GetCommentsReport {
        documents,
        rows: table.rows.len(),
        max_replies: table.max_replies,
        columns: table.width(),
        rejected: resolution.rejected,
        failures,
    };

    let sheet = &mut workbook.comments;
    sheet.clear();
    sheet.filter = table.filter();
    if !table.rows.is_empty() {
        sheet.action_options = ACTION_OPTIONS.iter().map(|a| a.to_string()).collect();
    }
    sheet.header = table.header;
    sheet.rows = table.rows;

    tracing::info!(
        "Get comments finished: {} row(s) from {} document(s), {} rejected, {} failed",
        report.rows,
        report.documents,
        report.rejected.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Formats the run summary for display.
pub fn format_get_comments_report(report: &GetCommentsReport) -> String {
    let mut output = format!(
        "Comments written: {}\nDocuments read: {}\nColumns: {} (up to {} replies)\n",
        report.rows, report.documents, report.columns, report.max_replies
    );
    if let Some(alert) = report.alert_message() {
        output.push('\n');
        output.push_str(&alert);
        output.push('\n');
    }
    output.push_str(&format_failures(&report.failures));
    output
}
