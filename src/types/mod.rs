pub mod errors;
pub mod params;

pub use errors::{BackRefError, DriveError, RunError, WorkbookError};
