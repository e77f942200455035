//! ClearCam Render Library
//!
//! Flattens annotation shapes onto native-resolution video frames and runs
//! the save/export pipeline against the video and persistence collaborators.

pub mod codec;
mod compositor;
pub mod export;
mod renderer;

pub use codec::{decode_image, encode_png, load_image};
pub use compositor::{DEFAULT_SAMPLES, RasterCompositor};
pub use export::{capture_thumbnails, run_export, save_frame};
pub use renderer::{
    CompositeScale, FrameCompositor, OverlayStyle, RenderError, RenderResult, SelectionOutline,
    fill_color,
};
