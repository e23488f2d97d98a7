use clap::{Parser, Subcommand};
use drive_comments::config::{log_dir, Settings, LOG_FILE};
use drive_comments::server;
use drive_comments::tools::get_comments::{format_get_comments_report, get_comments};
use drive_comments::tools::respond::{format_respond_report, respond, set_response};
use drive_comments::tools::show::format_sheet;
use drive_comments::workbook::{parse_time_zone, Workbook, INCLUDE_DELETED_YES};
use rmcp::{transport::stdio, ServiceExt};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

/// Collect document comments into one table and reply to them from it
#[derive(Parser, Debug)]
#[command(name = "drive-comments")]
#[command(about = "Aggregate Drive comments into a workbook and post replies back")]
struct Args {
    /// Workbook file. Defaults to ~/.drive-comments/workbook.json.
    #[arg(long, short = 'w', global = true)]
    workbook: Option<PathBuf>,

    /// Drive API base URL. Defaults to https://www.googleapis.com/drive/v2.
    #[arg(long, global = true, env = "DRIVE_API_BASE_URL")]
    base_url: Option<String>,

    /// OAuth access token sent as a bearer token.
    #[arg(long, global = true, env = "DRIVE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Abort a run on the first failed document or row.
    #[arg(long, global = true)]
    strict: bool,

    /// Author shown for comments that carry none.
    #[arg(long, global = true)]
    external_author: Option<String>,

    /// Per-request timeout in seconds (0 disables it).
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a workbook listing the documents to collect comments from
    Init {
        /// Document URLs or IDs
        #[arg(required = true)]
        references: Vec<String>,
        /// Include deleted comments
        #[arg(long)]
        include_deleted: bool,
        /// Time zone used for dates, e.g. America/New_York, UTC or -05:00
        #[arg(long, default_value = "UTC", allow_hyphen_values = true)]
        time_zone: String,
        /// Overwrite an existing workbook
        #[arg(long)]
        force: bool,
    },
    /// Fetch every comment and rebuild the comment table
    GetComments,
    /// Fill the Response and Action cells of a row
    SetResponse {
        /// 1-based data row
        row: usize,
        /// Reply text
        response: String,
        /// Resolve or Reopen
        #[arg(long)]
        action: Option<String>,
    },
    /// Post every typed response as a reply
    Respond,
    /// Print the comment table
    Show,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let settings = Settings::new(
        args.workbook,
        args.base_url,
        args.access_token,
        args.timeout_secs,
        args.strict,
        args.external_author,
    );

    if let Some(cmd) = args.command {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
        return handle_command(cmd, &settings).await;
    }

    // No subcommand: start the MCP server.
    // stdout carries JSON-RPC, so logs go to a file next to the workbook.
    let log_dir = log_dir(&settings.workbook_path);
    std::fs::create_dir_all(&log_dir).ok();

    let log_path = log_dir.join(LOG_FILE);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        // Fallback to stderr (never stdout)
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!("drive-comments MCP server starting");
    tracing::info!("Using workbook: {}", settings.workbook_path.display());

    let client = settings.drive_client()?;

    let service = server::CommentsMcp::new(
        client,
        settings.workbook_path.clone(),
        settings.options.clone(),
    )
    .serve(stdio())
    .await
    .inspect_err(|e| {
        eprintln!("Error starting server: {}", e);
    })?;

    service.waiting().await?;

    Ok(())
}

async fn handle_command(
    cmd: Command,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = &settings.workbook_path;

    match cmd {
        Command::Init {
            references,
            include_deleted,
            time_zone,
            force,
        } => {
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )
                .into());
            }
            parse_time_zone(&time_zone)?;

            let workbook = Workbook {
                time_zone,
                include_deleted: if include_deleted {
                    INCLUDE_DELETED_YES.to_string()
                } else {
                    "No".to_string()
                },
                references,
                ..Default::default()
            };
            workbook.save(path)?;
            println!(
                "Created {} with {} reference(s)",
                path.display(),
                workbook.references().len()
            );
            Ok(())
        }
        Command::GetComments => {
            let client = settings.drive_client()?;
            let mut workbook = Workbook::load(path)?;
            let report = get_comments(&client, &mut workbook, &settings.options).await?;
            workbook.save(path)?;

            println!("{}", format_get_comments_report(&report));
            if !report.failures.is_empty() {
                return Err(format!("{} document(s) failed", report.failures.len()).into());
            }
            Ok(())
        }
        Command::SetResponse {
            row,
            response,
            action,
        } => {
            let mut workbook = Workbook::load(path)?;
            set_response(&mut workbook.comments, row, &response, action.as_deref())?;
            workbook.save(path)?;
            println!("Response set on row {}", row);
            Ok(())
        }
        Command::Respond => {
            let client = settings.drive_client()?;
            let workbook = Workbook::load(path)?;
            let report = respond(&client, &workbook.comments, &settings.options).await?;

            println!("{}", format_respond_report(&report));
            if !report.failures.is_empty() {
                return Err(format!("{} row(s) failed", report.failures.len()).into());
            }
            Ok(())
        }
        Command::Show => {
            let workbook = Workbook::load(path)?;
            println!("{}", format_sheet(&workbook.comments));
            Ok(())
        }
    }
}
