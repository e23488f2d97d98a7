use crate::drive::traits::DriveClient;
use crate::tools::get_comments::{format_get_comments_report, get_comments};
use crate::tools::respond::{format_respond_report, respond, set_response};
use crate::tools::show::format_sheet;
use crate::tools::{RunMode, RunOptions};
use crate::types::params::{RunRequest, SetReferencesRequest, SetResponseRequest};
use crate::types::errors::WorkbookError;
use crate::workbook::{Workbook, INCLUDE_DELETED_YES};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

fn text(message: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(message.into())])
}

/// Run workbook file I/O on the blocking pool so the stdio transport keeps moving.
async fn blocking<T, F>(work: F) -> Result<T, String>
where
    F: FnOnce() -> Result<T, WorkbookError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("workbook task failed: {}", e)),
    }
}

#[derive(Clone)]
pub struct CommentsMcp<C: DriveClient> {
    tool_router: ToolRouter<Self>,
    client: Arc<C>,
    workbook_path: Arc<PathBuf>,
    options: RunOptions,
    /// Held for the whole of any tool that reads or writes the workbook.
    run_lock: Arc<Mutex<()>>,
}

#[tool_router]
impl<C: DriveClient + 'static> CommentsMcp<C> {
    pub fn new(client: C, workbook_path: PathBuf, options: RunOptions) -> Self {
        Self {
            tool_router: Self::tool_router(),
            client: Arc::new(client),
            workbook_path: Arc::new(workbook_path),
            options,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load_workbook(&self) -> Result<Workbook, String> {
        let path = Arc::clone(&self.workbook_path);
        blocking(move || Workbook::load(&path)).await
    }

    async fn load_or_default_workbook(&self) -> Result<Workbook, String> {
        let path = Arc::clone(&self.workbook_path);
        blocking(move || Workbook::load_or_default(&path)).await
    }

    async fn save_workbook(&self, workbook: Workbook) -> Result<Workbook, String> {
        let path = Arc::clone(&self.workbook_path);
        blocking(move || workbook.save(&path).map(|()| workbook)).await
    }

    fn options_for(&self, request: &RunRequest) -> RunOptions {
        let mut options = self.options.clone();
        if let Some(strict) = request.strict {
            options.mode = RunMode::from_strict(strict);
        }
        options
    }

    #[tool(description = "Test connectivity to the Drive comments API")]
    async fn ping(&self) -> Result<CallToolResult, McpError> {
        match self.client.health_check().await {
            Ok(()) => Ok(text("pong - Connected to the Drive API")),
            Err(e) => Ok(text(format!(
                "MCP running but Drive API unavailable: {}",
                e
            ))),
        }
    }

    #[tool(
        description = "Replace the list of documents whose comments are collected. \
        Accepts document URLs or bare document IDs. Optionally set whether deleted \
        comments are included and the time zone used for dates."
    )]
    async fn set_references(
        &self,
        Parameters(params): Parameters<SetReferencesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _run = self.run_lock.lock().await;
        let mut workbook = match self.load_or_default_workbook().await {
            Ok(workbook) => workbook,
            Err(e) => return Ok(text(format!("Failed to open workbook: {}", e))),
        };

        if let Some(time_zone) = params.time_zone {
            if let Err(e) = crate::workbook::parse_time_zone(&time_zone) {
                return Ok(text(format!("Invalid time zone: {}", e)));
            }
            workbook.time_zone = time_zone;
        }
        if let Some(include_deleted) = params.include_deleted {
            workbook.include_deleted = if include_deleted {
                INCLUDE_DELETED_YES.to_string()
            } else {
                "No".to_string()
            };
        }
        workbook.references = params.references;

        match self.save_workbook(workbook).await {
            Ok(workbook) => Ok(text(format!(
                "Saved {} reference(s). Include deleted comments: {}",
                workbook.references().len(),
                workbook.include_deleted()
            ))),
            Err(e) => Ok(text(format!("Failed to save workbook: {}", e))),
        }
    }

    #[tool(
        description = "Get Comments: fetch every comment and reply from the listed documents \
        and rebuild the comment table, one row per comment. Replaces the previous table. \
        Reports documents of unsupported types."
    )]
    async fn get_comments(
        &self,
        Parameters(params): Parameters<RunRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _run = self.run_lock.lock().await;
        let options = self.options_for(&params);
        let mut workbook = match self.load_workbook().await {
            Ok(workbook) => workbook,
            Err(e) => return Ok(text(format!("Failed to open workbook: {}", e))),
        };

        match get_comments(&*self.client, &mut workbook, &options).await {
            Ok(report) => match self.save_workbook(workbook).await {
                Ok(_) => Ok(text(format_get_comments_report(&report))),
                Err(e) => Ok(text(format!("Failed to save workbook: {}", e))),
            },
            Err(e) => Ok(text(format!("Failed to get comments: {}", e))),
        }
    }

    #[tool(description = "Show the comment table with 1-based row numbers")]
    async fn show_comments(&self) -> Result<CallToolResult, McpError> {
        let _run = self.run_lock.lock().await;
        match self.load_workbook().await {
            Ok(workbook) => Ok(text(format_sheet(&workbook.comments))),
            Err(e) => Ok(text(format!("Failed to open workbook: {}", e))),
        }
    }

    #[tool(
        description = "Fill the Response and Action cells of a comment row. \
        Actions: Resolve (reply and resolve the thread), Reopen (reply and reopen it), \
        or omit for a plain reply. Nothing is sent until respond is called."
    )]
    async fn set_response(
        &self,
        Parameters(params): Parameters<SetResponseRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _run = self.run_lock.lock().await;
        let mut workbook = match self.load_workbook().await {
            Ok(workbook) => workbook,
            Err(e) => return Ok(text(format!("Failed to open workbook: {}", e))),
        };

        if let Err(e) = set_response(
            &mut workbook.comments,
            params.row,
            &params.response,
            params.action.as_deref(),
        ) {
            return Ok(text(format!("Invalid response: {}", e)));
        }

        match self.save_workbook(workbook).await {
            Ok(_) => Ok(text(format!("Response set on row {}", params.row))),
            Err(e) => Ok(text(format!("Failed to save workbook: {}", e))),
        }
    }

    #[tool(
        description = "Respond: post every non-empty Response in the comment table as a reply \
        to its comment, applying the row's Action. Responses are not cleared afterwards, so \
        running it twice posts them twice."
    )]
    async fn respond(
        &self,
        Parameters(params): Parameters<RunRequest>,
    ) -> Result<CallToolResult, McpError> {
        let _run = self.run_lock.lock().await;
        let options = self.options_for(&params);
        let workbook = match self.load_workbook().await {
            Ok(workbook) => workbook,
            Err(e) => return Ok(text(format!("Failed to open workbook: {}", e))),
        };

        match respond(&*self.client, &workbook.comments, &options).await {
            Ok(report) => Ok(text(format_respond_report(&report))),
            Err(e) => Ok(text(format!("Failed to respond: {}", e))),
        }
    }
}

#[tool_handler]
impl<C: DriveClient + 'static> rmcp::ServerHandler for CommentsMcp<C> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Collects document comments into one table and posts replies back to them".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
