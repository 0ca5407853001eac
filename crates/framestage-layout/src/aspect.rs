//! Source frame aspect ratio, including the anamorphic correction for
//! frame sizes authored for non-square-pixel TV sets (VCD, SVCD, DVD).

use framestage_core::display::{NTSC_PIXEL_RATIO, PAL_PIXEL_RATIO};
use framestage_core::{CropInsets, FrameStageError, Result, YuvColorimetry};
use serde::{Deserialize, Serialize};

/// Stream geometry handed over by the decoder on `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceVideoFormat {
    /// Stored frame width
    pub width: u32,
    /// Stored frame height
    pub height: u32,
    /// Width the decoder wants the frame shown at
    pub display_width: u32,
    /// Height the decoder wants the frame shown at
    pub display_height: u32,
    pub fps: f32,
    pub colorimetry: YuvColorimetry,
}

impl SourceVideoFormat {
    /// Validate and build a source format.
    pub fn new(
        width: u32,
        height: u32,
        display_width: u32,
        display_height: u32,
        fps: f32,
    ) -> Result<Self> {
        if width == 0 || height == 0 || display_width == 0 || display_height == 0 {
            return Err(FrameStageError::InvalidParameter(format!(
                "zero frame dimension: {}x{} shown as {}x{}",
                width, height, display_width, display_height
            )));
        }
        Ok(Self {
            width,
            height,
            display_width,
            display_height,
            fps,
            colorimetry: YuvColorimetry::default(),
        })
    }

    /// Attach colorimetry decoded from the configure flags.
    pub fn with_colorimetry(mut self, colorimetry: YuvColorimetry) -> Self {
        self.colorimetry = colorimetry;
        self
    }

    /// Ratio of the stored frame.
    pub fn image_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// True when the decoder asked for a size other than the stored one.
    pub fn is_rescaled(&self) -> bool {
        self.width != self.display_width || self.height != self.display_height
    }
}

/// Television standard a frame size was authored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TvStandard {
    Pal,
    Ntsc,
}

impl TvStandard {
    pub fn pixel_ratio(self) -> f32 {
        match self {
            Self::Pal => PAL_PIXEL_RATIO,
            Self::Ntsc => NTSC_PIXEL_RATIO,
        }
    }
}

/// One known frame size with non-square pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnamorphicRule {
    pub width: u32,
    pub height: u32,
    pub standard: TvStandard,
    /// Horizontal resolution relative to a full D1 line (SVCD is 2/3)
    pub horizontal_scale: f32,
    /// Apply the correction for sources not framed at 4:3
    pub correct_non_4x3: bool,
}

/// Lookup table of frame sizes that get anamorphic correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnamorphicTable {
    pub rules: Vec<AnamorphicRule>,
}

impl Default for AnamorphicTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnamorphicTable {
    /// VCD, SVCD and DVD frame sizes for both standards.
    pub fn standard() -> Self {
        let rule = |width, height, standard, horizontal_scale, correct_non_4x3| AnamorphicRule {
            width,
            height,
            standard,
            horizontal_scale,
            correct_non_4x3,
        };
        Self {
            rules: vec![
                rule(352, 240, TvStandard::Ntsc, 1.0, false),
                rule(352, 288, TvStandard::Pal, 1.0, false),
                rule(480, 480, TvStandard::Ntsc, 1.5, true),
                rule(480, 576, TvStandard::Pal, 1.5, true),
                rule(720, 480, TvStandard::Ntsc, 1.0, true),
                rule(720, 576, TvStandard::Pal, 1.0, true),
            ],
        }
    }

    /// A table that never corrects.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn lookup(&self, width: u32, height: u32) -> Option<&AnamorphicRule> {
        self.rules
            .iter()
            .find(|r| r.width == width && r.height == height)
    }
}

/// Aspect ratio the source frame should be shown at.
///
/// When the decoder keeps the stored size the requested display size is
/// trusted as is. Otherwise known TV frame sizes are corrected with the
/// PAL/NTSC pixel ratios.
pub fn calculate_frame_aspect_ratio(format: &SourceVideoFormat, table: &AnamorphicTable) -> f32 {
    let ratio = format.display_width as f32 / format.display_height as f32;

    if !format.is_rescaled() {
        return ratio;
    }

    let Some(rule) = table.lookup(format.width, format.height) else {
        return ratio;
    };

    let non_4x3 = if rule.correct_non_4x3 {
        ratio / (4.0 / 3.0)
    } else {
        1.0
    };
    format.image_ratio() * rule.horizontal_scale * rule.standard.pixel_ratio() * non_4x3
}

/// Source frame ratio adjusted for the cropped area.
pub fn cropped_aspect_ratio(source_frame_ratio: f32, width: u32, height: u32, crop: CropInsets) -> f32 {
    if width == 0 || height == 0 {
        return source_frame_ratio;
    }
    let w = width as f32 - crop.left as f32 - crop.right as f32;
    let h = height as f32 - crop.top as f32 - crop.bottom as f32;
    if w <= 0.0 || h <= 0.0 {
        return source_frame_ratio;
    }
    source_frame_ratio * w / h * height as f32 / width as f32
}
