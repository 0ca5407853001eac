//! FrameStage Core - Foundation types for the video output stage
//!
//! This crate provides the fundamental types used throughout FrameStage:
//! - Error type shared by every crate
//! - Geometric primitives (float and pixel rectangles)
//! - CPU-side planar frame storage
//! - Display configuration and user video settings

pub mod config;
pub mod display;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod settings;

pub use config::{BufferCount, FrameStageConfig, RendererSettings};
pub use display::{DisplayCapabilities, DisplayConfig, DisplayResolution, ResolutionInfo};
pub use error::{FrameStageError, Result};
pub use frame::{FramePlane, PlaneKind, YuvColorimetry, YuvMatrix, YuvRange};
pub use geometry::{PixelRect, Rect, Vec2};
pub use settings::{CropInsets, FieldSync, ViewMode, VideoSettings};

/// Fixed constants of the output stage.
pub mod limits {
    /// Number of OSD/subtitle overlay slots.
    pub const NUM_OSD_BUFFERS: usize = 2;

    /// Upper bound on video buffer slots (triple buffering).
    pub const MAX_VIDEO_BUFFERS: usize = 3;

    /// Extra slots triple buffering may add while every regular slot is busy.
    pub const MAX_DYNAMIC_VIDEO_BUFFERS: usize = 3;

    /// Width overlay bitmaps are authored at (DVD subpicture width).
    pub const OSD_LOGICAL_WIDTH: f32 = 720.0;

    /// Neutral chroma value used when clearing U/V planes.
    pub const CHROMA_NEUTRAL: u8 = 128;
}
