//! Headless application: configuration and the compose/save commands.

use clearcam_core::collab::{DirectoryUploader, StillFrameSource, UploadError, default_upload_dir};
use clearcam_core::config::{ConfigError, EngineConfig};
use clearcam_core::export::{ExportResolution, ExportStatus};
use clearcam_core::labels::PrimaryLabel;
use clearcam_core::outcome::{Outcome, Rejection};
use clearcam_core::saved::SavedAnnotationRecord;
use clearcam_core::session::VideoSource;
use clearcam_core::shapes::Shape;
use clearcam_core::sizing::{DisplayBounds, compute_display_size};
use clearcam_core::time_sync::VideoMetadata;
use clearcam_core::workspace::Workspace;
use clearcam_render::{FrameCompositor, RasterCompositor, RenderError, encode_png, load_image, save_frame};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("{0}")]
    Rejected(#[from] Rejection),
    #[error("Invalid shapes file {path}: {source}")]
    Shapes {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Export failed: {0}")]
    Export(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where saved frames are written.
    pub upload_dir: PathBuf,
    /// Optional engine configuration file.
    pub engine_config: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir().unwrap_or_else(|_| PathBuf::from("clearcam-frames")),
            engine_config: None,
        }
    }
}

impl AppConfig {
    /// Default config file location (`<config dir>/clearcam/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clearcam").join("config.json"))
    }

    /// Load from `path`, or from the default location when `None`. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(&path).map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(ConfigError::from)?;
        log::debug!("Loaded app config from {}", path.display());
        Ok(config)
    }
}

/// Inputs of the compose command.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub frame: PathBuf,
    pub shapes: PathBuf,
    pub output: PathBuf,
    pub display: Option<Size>,
}

/// Inputs of the save command.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub frame: PathBuf,
    pub shapes: PathBuf,
    pub video: String,
    pub time: f64,
    pub label: PrimaryLabel,
    pub sublabels: Vec<String>,
    pub display: Option<Size>,
    pub upload_dir: Option<PathBuf>,
}

/// Result of a save.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub record: SavedAnnotationRecord,
    pub status: ExportStatus,
}

/// The headless application.
pub struct App {
    config: AppConfig,
    engine: EngineConfig,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let engine = match &config.engine_config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    fn load_shapes(path: &Path) -> Result<Vec<Shape>, AppError> {
        let json = fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| AppError::Shapes {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Flatten a shapes file onto a frame image and write a PNG.
    /// Returns the output size.
    pub fn compose(&self, request: &ComposeRequest) -> Result<(u32, u32), AppError> {
        let frame = load_image(&request.frame)?;
        let shapes = Self::load_shapes(&request.shapes)?;
        let native = (frame.width, frame.height);
        let display = request.display.unwrap_or_else(|| {
            compute_display_size(frame.width, frame.height, &DisplayBounds::from_config(&self.engine))
        });

        let composed = RasterCompositor::new().compose(&frame, &shapes, display, native)?;
        let png = encode_png(&composed)?;
        fs::write(&request.output, &png).map_err(|source| AppError::Io {
            path: request.output.clone(),
            source,
        })?;
        log::info!(
            "Wrote {} shapes onto {}x{} frame to {}",
            shapes.len(),
            native.0,
            native.1,
            request.output.display()
        );
        Ok(native)
    }

    /// Run the full save pipeline for one still frame.
    pub fn save(&self, request: &SaveRequest) -> Result<SaveReport, AppError> {
        let frame = load_image(&request.frame)?;
        let shapes = Self::load_shapes(&request.shapes)?;
        let (width, height) = (frame.width, frame.height);
        let duration = request.time.max(0.0) + 1.0;

        let mut ws = Workspace::new(self.engine.clone());
        let _ = ws.select_video(VideoSource::new(
            request.video.clone(),
            request.frame.display().to_string(),
        ));
        ws.on_metadata(VideoMetadata {
            duration,
            width,
            height,
        });
        if let Some(display) = request.display {
            ws.set_display_size(display);
        }
        ws.seek(request.time);

        for shape in shapes {
            if let Outcome::Rejected(reason) = ws.add_shape(shape) {
                log::warn!("Skipping shape: {}", reason);
            }
        }
        if let Outcome::Rejected(reason) = ws.set_label(request.label, request.sublabels.clone()) {
            return Err(reason.into());
        }

        let upload_dir = request
            .upload_dir
            .clone()
            .unwrap_or_else(|| self.config.upload_dir.clone());
        let uploader = DirectoryUploader::new(upload_dir)?;
        let source = StillFrameSource::new(frame, duration);
        let resolution = pollster::block_on(save_frame(
            &mut ws,
            &source,
            &RasterCompositor::new(),
            &uploader,
        ))?;

        let status = match resolution {
            ExportResolution::Applied(ExportStatus::Failed { message }) => {
                return Err(AppError::Export(message));
            }
            ExportResolution::Applied(status) => status,
            ExportResolution::Stale | ExportResolution::Unknown => {
                return Err(AppError::Export("export result was discarded".to_string()));
            }
        };
        let record = ws
            .saved()
            .records()
            .last()
            .cloned()
            .ok_or_else(|| AppError::Export("no annotation was recorded".to_string()))?;
        Ok(SaveReport { record, status })
    }
}
