//! Integration tests for aspect ratio, resolution choice and layout.

use framestage_core::{
    CropInsets, DisplayCapabilities, DisplayConfig, DisplayResolution, FrameStageConfig, PixelRect, ViewMode,
};
use framestage_layout::{
    calculate_frame_aspect_ratio, choose_best_resolution, AnamorphicTable, ResolutionQuery, SourceVideoFormat,
    ViewParams,
};
use framestage_render::{MemoryBackend, VideoRenderer, YuvRenderer};

fn ntsc_4x3_tv() -> DisplayCapabilities {
    DisplayCapabilities {
        pal: false,
        widescreen: false,
        has_480p: true,
        has_720p: true,
        has_1080i: false,
        has_pal60: false,
    }
}

fn fullscreen(display: DisplayConfig) -> FrameStageConfig {
    let mut config = FrameStageConfig::default();
    config.display = display;
    config.renderer.fullscreen = true;
    config
}

#[test]
fn dvd_ntsc_anamorphic_ratio() {
    let format = SourceVideoFormat::new(720, 480, 854, 480, 29.97).unwrap();
    let ratio = calculate_frame_aspect_ratio(&format, &AnamorphicTable::standard());
    let expected = 1.5 * (4320.0 / 4739.0) * ((854.0 / 480.0) / (4.0 / 3.0));
    assert!((ratio - expected).abs() < 1e-4, "ratio {}", ratio);

    // unknown frame size keeps the requested ratio
    let format = SourceVideoFormat::new(640, 360, 854, 480, 29.97).unwrap();
    let ratio = calculate_frame_aspect_ratio(&format, &AnamorphicTable::standard());
    assert!((ratio - 854.0 / 480.0).abs() < 1e-5);
}

#[test]
fn ntsc_4x3_tv_prefers_480p_for_narrow_sources() {
    let query = ResolutionQuery {
        capabilities: ntsc_4x3_tv(),
        requested: DisplayResolution::Auto,
        pal60_switching: false,
        fps: 29.97,
        source_frame_ratio: 4.0 / 3.0,
    };
    assert_eq!(choose_best_resolution(&query), DisplayResolution::Hdtv480p4x3);

    let wide = ResolutionQuery {
        source_frame_ratio: 2.35,
        ..query
    };
    assert_eq!(choose_best_resolution(&wide), DisplayResolution::Hdtv720p);
}

#[test]
fn renderer_configures_480p_on_ntsc_tv() {
    let config = fullscreen(DisplayConfig::with_capabilities(ntsc_4x3_tv()));
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &config);
    renderer.configure(720, 480, 720, 480, 29.97, 0).unwrap();

    assert_eq!(renderer.resolution(), DisplayResolution::Hdtv480p4x3);
    let (src, dest) = renderer.video_rect();
    assert_eq!(src, PixelRect::from_size(720, 480));
    assert!(dest.width() > 0 && dest.height() > 0);
    assert!(dest.left >= 0 && dest.right <= 720);
    assert!(dest.top >= 0 && dest.bottom <= 480);
}

#[test]
fn pinned_pal_resolution_switches_to_pal60() {
    let mut config = fullscreen(DisplayConfig::default());
    config.video.requested_resolution = DisplayResolution::Pal4x3;
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &config);

    renderer.configure(720, 480, 720, 480, 29.97, 0).unwrap();
    assert_eq!(renderer.resolution(), DisplayResolution::Pal60_4x3);

    renderer.configure(720, 576, 720, 576, 25.0, 0).unwrap();
    assert_eq!(renderer.resolution(), DisplayResolution::Pal4x3);
}

#[test]
fn normal_view_mode_is_identity() {
    let config = fullscreen(DisplayConfig::default());
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &config);
    renderer.configure(720, 576, 720, 576, 25.0, 0).unwrap();

    renderer.set_view_mode(ViewMode::Stretch16x9);
    renderer.set_view_mode(ViewMode::Normal);
    assert_eq!(renderer.view_params(), ViewParams::NORMAL);
    assert_eq!(renderer.view_params().pixel_ratio, 1.0);
    assert_eq!(renderer.view_params().zoom_amount, 1.0);
}

#[test]
fn manual_crop_changes_source_rect_and_aspect() {
    let config = fullscreen(DisplayConfig::default());
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &config);
    renderer.configure(720, 576, 720, 576, 25.0, 0).unwrap();
    let full = renderer.aspect_ratio();

    renderer.set_crop(CropInsets::new(0, 72, 0, 72));
    let (src, _) = renderer.video_rect();
    assert_eq!(src, PixelRect::new(0, 72, 720, 504));
    assert!((renderer.aspect_ratio() - full * 576.0 / 432.0).abs() < 1e-4);

    renderer.set_crop(CropInsets::NONE);
    assert!((renderer.aspect_ratio() - full).abs() < 1e-6);
}
