//! Per-stream video settings chosen by the user.

use crate::display::DisplayResolution;
use serde::{Deserialize, Serialize};

/// How the frame is fitted to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViewMode {
    /// Fit inside the screen keeping aspect ratio
    #[default]
    Normal,
    /// Zoom until there are no black bars
    Zoom,
    Stretch4x3,
    Stretch14x9,
    Stretch16x9,
    /// Show source pixels one-to-one vertically
    Original,
    /// Use the stored custom zoom and pixel ratio
    Custom,
}

impl ViewMode {
    /// Map a persisted numeric mode. Out of range values become `Normal`.
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => Self::Zoom,
            2 => Self::Stretch4x3,
            3 => Self::Stretch14x9,
            4 => Self::Stretch16x9,
            5 => Self::Original,
            6 => Self::Custom,
            _ => Self::Normal,
        }
    }
}

/// Pixels removed from each edge of the source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CropInsets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropInsets {
    pub const NONE: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width left after cropping a frame `width` wide.
    pub fn cropped_width(self, width: u32) -> u32 {
        width.saturating_sub(self.left.saturating_add(self.right))
    }

    /// Height left after cropping a frame `height` tall.
    pub fn cropped_height(self, height: u32) -> u32 {
        height.saturating_sub(self.top.saturating_add(self.bottom))
    }
}

/// Interlaced output field synchronisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldSync {
    #[default]
    None,
    Even,
    Odd,
}

/// User video settings for the current stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Pinned output resolution, or `Auto`
    pub requested_resolution: DisplayResolution,
    pub view_mode: ViewMode,
    pub custom_zoom_amount: f32,
    pub custom_pixel_ratio: f32,
    pub crop: CropInsets,
    /// Allow switching a PAL display to 60Hz for 60Hz-family content
    pub pal60_switching: bool,
    /// Grey level of the bars around the picture
    pub black_bar_colour: u32,
    pub field_sync: FieldSync,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            requested_resolution: DisplayResolution::Auto,
            view_mode: ViewMode::Normal,
            custom_zoom_amount: 1.0,
            custom_pixel_ratio: 1.0,
            crop: CropInsets::NONE,
            pal60_switching: true,
            black_bar_colour: 0,
            field_sync: FieldSync::None,
        }
    }
}

impl VideoSettings {
    /// Clear colour as packed 0xRRGGBB grey.
    pub fn clear_colour(&self) -> u32 {
        (self.black_bar_colour & 0xff) * 0x010101
    }
}
