pub mod config;
pub mod drive;
pub mod server;
pub mod tools;
pub mod types;
pub mod workbook;
