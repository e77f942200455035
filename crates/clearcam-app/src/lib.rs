//! ClearCam Application
//!
//! Headless front end: loads configuration, composes annotated frames and
//! runs the save pipeline against a directory-backed uploader.

mod app;
pub mod cli;

pub use app::{App, AppConfig, AppError, ComposeRequest, SaveReport, SaveRequest};
