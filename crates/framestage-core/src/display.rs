//! Display modes and the capabilities of the attached output device.

use crate::geometry::PixelRect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// PAL pixel aspect ratio (ITU-R BT.601, 576-line systems).
pub const PAL_PIXEL_RATIO: f32 = 128.0 / 117.0;

/// NTSC pixel aspect ratio (ITU-R BT.601, 480-line systems).
pub const NTSC_PIXEL_RATIO: f32 = 4320.0 / 4739.0;

/// Output display modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DisplayResolution {
    #[default]
    Pal4x3,
    Pal16x9,
    Pal60_4x3,
    Pal60_16x9,
    Ntsc4x3,
    Ntsc16x9,
    Hdtv480p4x3,
    Hdtv480p16x9,
    Hdtv720p,
    Hdtv1080i,
    /// Let the resolution selector decide.
    Auto,
}

impl DisplayResolution {
    /// Every concrete (non-auto) resolution.
    pub const ALL: [DisplayResolution; 10] = [
        Self::Pal4x3,
        Self::Pal16x9,
        Self::Pal60_4x3,
        Self::Pal60_16x9,
        Self::Ntsc4x3,
        Self::Ntsc16x9,
        Self::Hdtv480p4x3,
        Self::Hdtv480p16x9,
        Self::Hdtv720p,
        Self::Hdtv1080i,
    ];

    /// True for the standard-definition 4:3 modes.
    pub fn is_4x3(self) -> bool {
        matches!(
            self,
            Self::Pal4x3 | Self::Pal60_4x3 | Self::Ntsc4x3 | Self::Hdtv480p4x3
        )
    }

    /// The PAL60 counterpart of a PAL50 mode.
    pub fn pal60_twin(self) -> Self {
        match self {
            Self::Pal4x3 => Self::Pal60_4x3,
            Self::Pal16x9 => Self::Pal60_16x9,
            other => other,
        }
    }

    /// Built-in description of this mode, used when the display config has
    /// no calibrated entry for it.
    pub fn default_info(self) -> ResolutionInfo {
        let (w, h, ratio, widescreen, name) = match self {
            Self::Pal4x3 => (720, 576, PAL_PIXEL_RATIO, false, "PAL 4:3"),
            Self::Pal16x9 => (720, 576, PAL_PIXEL_RATIO * 4.0 / 3.0, true, "PAL 16:9"),
            Self::Pal60_4x3 => (720, 480, NTSC_PIXEL_RATIO, false, "PAL60 4:3"),
            Self::Pal60_16x9 => (720, 480, NTSC_PIXEL_RATIO * 4.0 / 3.0, true, "PAL60 16:9"),
            Self::Ntsc4x3 => (720, 480, NTSC_PIXEL_RATIO, false, "NTSC 4:3"),
            Self::Ntsc16x9 => (720, 480, NTSC_PIXEL_RATIO * 4.0 / 3.0, true, "NTSC 16:9"),
            Self::Hdtv480p4x3 => (720, 480, NTSC_PIXEL_RATIO, false, "480p 4:3"),
            Self::Hdtv480p16x9 => (720, 480, NTSC_PIXEL_RATIO * 4.0 / 3.0, true, "480p 16:9"),
            Self::Hdtv720p => (1280, 720, 1.0, true, "720p 16:9"),
            Self::Hdtv1080i => (1920, 1080, 1.0, true, "1080i 16:9"),
            Self::Auto => (720, 576, PAL_PIXEL_RATIO, false, "Auto"),
        };
        ResolutionInfo {
            name: name.to_string(),
            width: w,
            height: h,
            pixel_ratio: ratio,
            overscan: PixelRect::from_size(w, h),
            subtitle_line: (0.965 * h as f32) as i32,
            widescreen,
        }
    }
}

/// Calibration data for one display mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionInfo {
    /// Human readable mode name
    pub name: String,
    pub width: i32,
    pub height: i32,
    /// Width/height of one output pixel
    pub pixel_ratio: f32,
    /// Usable area after overscan calibration
    pub overscan: PixelRect,
    /// Row the bottom of subtitles is anchored to
    pub subtitle_line: i32,
    pub widescreen: bool,
}

/// Output capabilities reported by the video hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayCapabilities {
    /// Video standard is PAL (otherwise NTSC)
    pub pal: bool,
    pub widescreen: bool,
    pub has_480p: bool,
    pub has_720p: bool,
    pub has_1080i: bool,
    pub has_pal60: bool,
}

impl Default for DisplayCapabilities {
    fn default() -> Self {
        Self {
            pal: true,
            widescreen: false,
            has_480p: false,
            has_720p: false,
            has_1080i: false,
            has_pal60: true,
        }
    }
}

/// Display configuration: capabilities plus the per-mode calibration table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub capabilities: DisplayCapabilities,
    /// Resolution the GUI runs at (used when video is not fullscreen)
    pub gui_resolution: DisplayResolution,
    /// Calibrated modes. Missing modes use their built-in defaults.
    pub resolutions: BTreeMap<DisplayResolution, ResolutionInfo>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            capabilities: DisplayCapabilities::default(),
            gui_resolution: DisplayResolution::Pal4x3,
            resolutions: BTreeMap::new(),
        }
    }
}

impl DisplayConfig {
    /// Configuration with the given capabilities and a default table.
    pub fn with_capabilities(capabilities: DisplayCapabilities) -> Self {
        let gui_resolution = if capabilities.pal {
            DisplayResolution::Pal4x3
        } else {
            DisplayResolution::Ntsc4x3
        };
        Self {
            capabilities,
            gui_resolution,
            ..Default::default()
        }
    }

    /// Calibration for `res`. `Auto` resolves to the GUI resolution.
    pub fn info(&self, res: DisplayResolution) -> ResolutionInfo {
        let res = if res == DisplayResolution::Auto {
            self.gui_resolution
        } else {
            res
        };
        self.resolutions
            .get(&res)
            .cloned()
            .unwrap_or_else(|| res.default_info())
    }

    /// Override the calibration of one mode.
    pub fn set_info(&mut self, res: DisplayResolution, info: ResolutionInfo) {
        self.resolutions.insert(res, info);
    }
}
