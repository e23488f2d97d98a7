use crate::drive::HttpDriveClient;
use crate::tools::{RunMode, RunOptions, DEFAULT_EXTERNAL_AUTHOR};
use crate::types::errors::DriveError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = ".drive-comments";
pub const WORKBOOK_FILE: &str = "workbook.json";
pub const LOG_FILE: &str = "drive-comments.log";

/// `~/.drive-comments`, or `/tmp/.drive-comments` without a home directory.
pub fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(APP_DIR)
}

pub fn default_workbook_path() -> PathBuf {
    app_dir().join(WORKBOOK_FILE)
}

/// Logs live next to the workbook, in a `logs` directory.
pub fn log_dir(workbook: &Path) -> PathBuf {
    workbook
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| app_dir().join("logs"))
}

/// Everything a run needs, resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub workbook_path: PathBuf,
    pub base_url: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
    pub options: RunOptions,
}

impl Settings {
    pub fn new(
        workbook_path: Option<PathBuf>,
        base_url: Option<String>,
        access_token: Option<String>,
        timeout_secs: Option<u64>,
        strict: bool,
        external_author: Option<String>,
    ) -> Self {
        Self {
            workbook_path: workbook_path.unwrap_or_else(default_workbook_path),
            base_url,
            access_token,
            timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            options: RunOptions {
                mode: RunMode::from_strict(strict),
                external_author: external_author
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_EXTERNAL_AUTHOR.to_string()),
            },
        }
    }

    pub fn drive_client(&self) -> Result<HttpDriveClient, DriveError> {
        match self.timeout {
            Some(timeout) => HttpDriveClient::with_timeout(
                self.base_url.clone(),
                self.access_token.clone(),
                timeout,
            ),
            None => Ok(HttpDriveClient::new(
                self.base_url.clone(),
                self.access_token.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new(None, None, None, None, false, None);

        assert!(settings.workbook_path.ends_with(".drive-comments/workbook.json"));
        assert_eq!(settings.options.mode, RunMode::Lenient);
        assert_eq!(settings.options.external_author, DEFAULT_EXTERNAL_AUTHOR);
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = Settings::new(
            Some(PathBuf::from("/work/review.json")),
            Some("http://localhost:9000".into()),
            Some("token".into()),
            Some(30),
            true,
            Some("Guest".into()),
        );

        assert_eq!(settings.workbook_path, PathBuf::from("/work/review.json"));
        assert_eq!(settings.options.mode, RunMode::Strict);
        assert_eq!(settings.options.external_author, "Guest");
        assert_eq!(settings.timeout, Some(Duration::from_secs(30)));
        assert!(settings.drive_client().is_ok());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let settings = Settings::new(None, None, None, Some(0), false, Some("  ".into()));
        assert!(settings.timeout.is_none());
        assert_eq!(settings.options.external_author, DEFAULT_EXTERNAL_AUTHOR);
    }

    #[test]
    fn test_log_dir_next_to_workbook() {
        assert_eq!(
            log_dir(Path::new("/work/review.json")),
            PathBuf::from("/work/logs")
        );
        assert!(log_dir(Path::new("review.json")).ends_with(".drive-comments/logs"));
    }
}
