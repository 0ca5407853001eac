//! Integration tests for the subtitle overlay through the renderer.

use framestage_core::{FrameStageConfig, PlaneKind};
use framestage_render::{ImageSource, MemoryBackend, RenderOutput, VideoRenderer, YuvRenderer};

fn pal_renderer() -> YuvRenderer<MemoryBackend> {
    let mut config = FrameStageConfig::default();
    config.renderer.fullscreen = true;
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &config);
    renderer.configure(720, 576, 720, 576, 25.0, 0).unwrap();
    renderer
}

fn present(renderer: &mut YuvRenderer<MemoryBackend>) -> RenderOutput {
    let index = {
        let mut image = renderer.get_image(ImageSource::Auto, false).unwrap();
        image.plane_mut(PlaneKind::Luma).fill(100);
        image.index
    };
    renderer.release_image(index, false).unwrap();
    renderer.flip_page(Some(index));
    renderer.render()
}

#[test]
fn subtitle_width_follows_picture() {
    let renderer = pal_renderer();
    assert_eq!(renderer.osd().width() as i32, renderer.normal_dest_width());
    assert!(renderer.osd().width() > 0);
}

#[test]
fn wide_bitmap_recreates_both_slots() {
    let mut renderer = pal_renderer();
    let narrow = vec![255u8; 100 * 20];
    renderer.draw_alpha(0, 0, 100, 20, &narrow, &narrow, 100).unwrap();
    present(&mut renderer);

    let width = renderer.osd().width() + 80;
    let wide = vec![255u8; width as usize * 30];
    renderer
        .draw_alpha(0, 0, width, 30, &wide, &wide, width as usize)
        .unwrap();

    assert_eq!(renderer.osd().width(), width);
    let drawn = (renderer.osd().render_index() + 1) % 2;
    assert_eq!(renderer.osd().slot_height(drawn), 30);
    assert_eq!(renderer.osd().slot_height(renderer.osd().render_index()), 0);
    assert!(renderer.osd().slot(renderer.osd().render_index()).is_none());
}

#[test]
fn overlay_shown_once_then_cleared() {
    let mut renderer = pal_renderer();
    let bitmap = vec![180u8; 300 * 24];
    renderer.draw_alpha(0, 0, 300, 24, &bitmap, &bitmap, 300).unwrap();
    assert_eq!(renderer.osd().drawn_size(), (300, 24));

    let RenderOutput::Frame(frame) = present(&mut renderer) else {
        panic!("expected a frame");
    };
    let quad = frame.osd.unwrap();
    assert_eq!((quad.source.width(), quad.source.height()), (300, 24));
    assert!(quad.dest.width > 0.0 && quad.dest.height > 0.0);

    let RenderOutput::Frame(frame) = present(&mut renderer) else {
        panic!("expected a frame");
    };
    assert!(frame.osd.is_none());
    assert_eq!(renderer.osd().drawn_size(), (0, 0));
}

#[test]
fn draw_alpha_before_configure_is_ignored() {
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &FrameStageConfig::default());
    let bitmap = vec![1u8; 16];
    renderer.draw_alpha(0, 0, 4, 4, &bitmap, &bitmap, 4).unwrap();
    assert_eq!(renderer.backend().texture_count(), 0);
}
