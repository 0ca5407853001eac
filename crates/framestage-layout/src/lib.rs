//! FrameStage Layout - where and how large the video is drawn
//!
//! Pure functions over the core types:
//! - Source aspect ratio with anamorphic correction
//! - Destination rectangle inside the view window
//! - View mode pixel ratio and zoom
//! - Output resolution selection
//! - Black border detection

pub mod aspect;
pub mod autocrop;
pub mod display_rect;
pub mod resolution;
pub mod view_mode;

pub use aspect::{
    calculate_frame_aspect_ratio, cropped_aspect_ratio, AnamorphicRule, AnamorphicTable, SourceVideoFormat, TvStandard,
};
pub use autocrop::detect_crop;
pub use display_rect::{calc_normal_display_rect, source_rect};
pub use resolution::{choose_best_resolution, prefers_pal60, ResolutionQuery};
pub use view_mode::{view_params, ViewModeInput, ViewParams};
