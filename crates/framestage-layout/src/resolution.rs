//! Choice of the output display mode for a stream.

use framestage_core::{DisplayCapabilities, DisplayResolution};
use tracing::info;

/// Inputs to the resolution cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionQuery {
    pub capabilities: DisplayCapabilities,
    /// User pinned resolution, or `Auto`
    pub requested: DisplayResolution,
    pub pal60_switching: bool,
    pub fps: f32,
    pub source_frame_ratio: f32,
}

/// True when `fps` divides 60 Hz more evenly than 50 Hz.
///
/// Non-finite or non-positive rates never prefer PAL60.
pub fn prefers_pal60(fps: f32) -> bool {
    if !fps.is_finite() || fps <= 0.0 {
        return false;
    }
    let fit = |hz: f32| {
        let periods = hz / fps;
        (periods - (periods + 0.5).floor()).abs()
    };
    fit(120.0) < fit(100.0)
}

/// Pick the display mode a stream should play at.
pub fn choose_best_resolution(query: &ResolutionQuery) -> DisplayResolution {
    let caps = &query.capabilities;
    let use_pal60 = caps.pal && query.pal60_switching && caps.has_pal60 && prefers_pal60(query.fps);

    if query.requested != DisplayResolution::Auto {
        let res = if use_pal60 {
            query.requested.pal60_twin()
        } else {
            query.requested
        };
        info!(resolution = ?res, "Using user selected resolution");
        return res;
    }

    // wider than the geometric mean of 4:3 and 16:9
    let widescreen = caps.widescreen && query.source_frame_ratio > 8.0 / (3.0 * 3.0f32.sqrt());
    let res = if caps.pal {
        match (use_pal60, widescreen) {
            (true, true) => DisplayResolution::Pal60_16x9,
            (true, false) => DisplayResolution::Pal60_4x3,
            (false, true) => DisplayResolution::Pal16x9,
            (false, false) => DisplayResolution::Pal4x3,
        }
    } else if caps.widescreen {
        if caps.has_1080i {
            DisplayResolution::Hdtv1080i
        } else if caps.has_720p {
            DisplayResolution::Hdtv720p
        } else if caps.has_480p {
            if widescreen {
                DisplayResolution::Hdtv480p16x9
            } else {
                DisplayResolution::Hdtv480p4x3
            }
        } else if widescreen {
            DisplayResolution::Ntsc16x9
        } else {
            DisplayResolution::Ntsc4x3
        }
    } else if query.source_frame_ratio >= 16.0 / 9.0 {
        // wide content on a 4:3 set: HD modes letterbox better than 480p
        if caps.has_1080i {
            DisplayResolution::Hdtv1080i
        } else if caps.has_720p {
            DisplayResolution::Hdtv720p
        } else if caps.has_480p {
            DisplayResolution::Hdtv480p4x3
        } else {
            DisplayResolution::Ntsc4x3
        }
    } else if caps.has_480p {
        DisplayResolution::Hdtv480p4x3
    } else if caps.has_1080i {
        DisplayResolution::Hdtv1080i
    } else if caps.has_720p {
        DisplayResolution::Hdtv720p
    } else {
        DisplayResolution::Ntsc4x3
    };

    info!(
        resolution = ?res,
        fps = query.fps,
        ratio = query.source_frame_ratio,
        "Chose best resolution"
    );
    res
}
