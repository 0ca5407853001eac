//! Pixel ratio and zoom derived from the selected view mode.

use framestage_core::{CropInsets, DisplayResolution, ResolutionInfo, ViewMode};
use serde::{Deserialize, Serialize};

/// User pixel ratio and zoom applied on top of the fitted rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewParams {
    pub pixel_ratio: f32,
    pub zoom_amount: f32,
}

impl ViewParams {
    pub const NORMAL: Self = Self {
        pixel_ratio: 1.0,
        zoom_amount: 1.0,
    };
}

impl Default for ViewParams {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Everything a view mode computation depends on.
#[derive(Debug, Clone, Copy)]
pub struct ViewModeInput<'a> {
    pub mode: ViewMode,
    /// Resolution chosen for fullscreen playback
    pub resolution: DisplayResolution,
    pub info: &'a ResolutionInfo,
    /// Cropped source aspect ratio
    pub source_aspect: f32,
    pub source_height: u32,
    pub crop: CropInsets,
    pub custom_zoom_amount: f32,
    pub custom_pixel_ratio: f32,
}

/// Derive the pixel ratio and zoom amount for a view mode.
pub fn view_params(input: &ViewModeInput<'_>) -> ViewParams {
    match input.mode {
        ViewMode::Normal => return ViewParams::NORMAL,
        ViewMode::Custom => {
            return ViewParams {
                pixel_ratio: input.custom_pixel_ratio,
                zoom_amount: input.custom_zoom_amount,
            }
        }
        _ => {}
    }

    // calibrated fullscreen area
    let overscan = input.info.overscan;
    let screen_width = overscan.width() as f32;
    let screen_height = overscan.height() as f32;
    let res_pixel_ratio = input.info.pixel_ratio;
    let aspect = input.source_aspect;

    match input.mode {
        ViewMode::Zoom => {
            // zoom until no black bars remain
            let pixel_ratio = 1.0;
            let output_frame_ratio = aspect * pixel_ratio / res_pixel_ratio;
            let new_width = screen_height * output_frame_ratio;
            let zoom_amount = if new_width < screen_width {
                (screen_width / output_frame_ratio) / screen_height
            } else {
                new_width / screen_width
            };
            ViewParams {
                pixel_ratio,
                zoom_amount,
            }
        }
        ViewMode::Stretch4x3 => {
            let pixel_ratio = if input.resolution.is_4x3() {
                // fill the whole 4:3 screen
                (screen_width / screen_height) * res_pixel_ratio / aspect
            } else {
                (4.0 / 3.0) / aspect
            };
            ViewParams {
                pixel_ratio,
                zoom_amount: 1.0,
            }
        }
        ViewMode::Stretch14x9 => ViewParams {
            pixel_ratio: (14.0 / 9.0) / aspect,
            zoom_amount: 1.0,
        },
        ViewMode::Stretch16x9 => {
            let pixel_ratio = if input.resolution.is_4x3() {
                (16.0 / 9.0) / aspect
            } else {
                // fill the whole 16:9 screen
                (screen_width / screen_height) * res_pixel_ratio / aspect
            };
            ViewParams {
                pixel_ratio,
                zoom_amount: 1.0,
            }
        }
        _ => {
            // Original: source lines map one to one on output lines
            let pixel_ratio = 1.0;
            let output_frame_ratio = aspect * pixel_ratio / res_pixel_ratio;
            let new_height = (screen_width / output_frame_ratio).min(screen_height);
            let visible_lines = input.crop.cropped_height(input.source_height) as f32;
            ViewParams {
                pixel_ratio,
                zoom_amount: visible_lines / new_height,
            }
        }
    }
}
