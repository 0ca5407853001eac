//! Integration tests for decode/present cycles through the renderer.

use crossbeam_channel::bounded;
use framestage_core::{
    BufferCount, CropInsets, DisplayCapabilities, DisplayConfig, FrameStageConfig, FrameStageError, PlaneKind,
};
use framestage_render::{ImageSource, MemoryBackend, RenderOutput, VideoRenderer, YuvRenderer};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

fn hd_config(buffers: BufferCount) -> FrameStageConfig {
    let mut config = FrameStageConfig::default();
    config.display = DisplayConfig::with_capabilities(DisplayCapabilities {
        pal: false,
        widescreen: true,
        has_480p: true,
        has_720p: true,
        has_1080i: false,
        has_pal60: false,
    });
    config.renderer.fullscreen = true;
    config.renderer.buffer_count = buffers;
    config
}

fn decode(renderer: &mut YuvRenderer<MemoryBackend>, luma: u8) -> usize {
    let index = {
        let mut image = renderer.get_image(ImageSource::Auto, false).unwrap();
        image.plane_mut(PlaneKind::Luma).fill(luma);
        image.index
    };
    renderer.release_image(index, false).unwrap();
    index
}

#[test]
fn auto_never_hands_out_displayed_slot() {
    for buffers in [BufferCount::Double, BufferCount::Triple] {
        let mut renderer = YuvRenderer::new(MemoryBackend::new(), &hd_config(buffers));
        renderer.configure(640, 360, 640, 360, 25.0, 0).unwrap();

        for frame in 0..12u8 {
            let displayed = renderer.frames().render_index();
            let index = decode(&mut renderer, frame);
            assert_ne!(index, displayed, "{:?} frame {}", buffers, frame);
            renderer.flip_page(Some(index));
        }
        assert_eq!(renderer.frames().flip_count(), 12);
    }
}

#[test]
fn triple_buffering_adds_slots_when_all_busy() {
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &hd_config(BufferCount::Triple));
    renderer.configure(640, 360, 640, 360, 25.0, 0).unwrap();
    assert_eq!(renderer.frames().active_count(), 3);
    let textures = renderer.backend().texture_count();

    let mut held = Vec::new();
    for _ in 0..5 {
        held.push(renderer.get_image(ImageSource::Auto, false).unwrap().index);
    }
    assert_eq!(held, vec![1, 2, 3, 4, 5]);
    assert_eq!(renderer.frames().active_count(), 6);
    assert_eq!(renderer.backend().texture_count(), textures + 9);
    assert!(matches!(
        renderer.get_image(ImageSource::Auto, false),
        Err(FrameStageError::BufferBusy(_))
    ));

    for index in held {
        renderer.release_image(index, false).unwrap();
    }

    // extra slots outlive the per-frame resize until a reset
    renderer.flip_page(Some(4));
    assert!(matches!(renderer.render(), RenderOutput::Frame(_)));
    assert_eq!(renderer.frames().active_count(), 6);

    renderer.reset();
    renderer.manage_textures();
    assert_eq!(renderer.frames().active_count(), 3);
    assert_eq!(renderer.frames().render_index(), 1);
    assert_eq!(renderer.backend().texture_count(), textures);
}

#[test]
fn auto_crop_on_displayed_frame_then_disable() {
    let mut renderer = YuvRenderer::new(MemoryBackend::new(), &hd_config(BufferCount::Double));
    renderer.configure(640, 360, 640, 360, 25.0, 0).unwrap();

    let index = {
        let mut image = renderer.get_image(ImageSource::Auto, false).unwrap();
        let luma = image.plane_mut(PlaneKind::Luma);
        luma.fill(16);
        for y in 40..320 {
            luma.row_mut(y)[20..620].fill(200);
        }
        image.index
    };
    renderer.release_image(index, false).unwrap();
    renderer.flip_page(Some(index));

    renderer.auto_crop(true).unwrap();
    assert_eq!(renderer.settings().crop, CropInsets::new(20, 40, 20, 40));

    renderer.auto_crop(false).unwrap();
    assert_eq!(renderer.settings().crop, CropInsets::NONE);
    let (src, _) = renderer.video_rect();
    assert_eq!((src.width(), src.height()), (640, 360));
}

#[test]
fn allocation_failure_leaves_no_usable_buffer() {
    let mut renderer = YuvRenderer::new(MemoryBackend::with_budget(1024), &hd_config(BufferCount::Double));
    renderer.configure(640, 360, 640, 360, 25.0, 0).unwrap();

    assert!(renderer.get_image(ImageSource::Auto, false).is_err());
    assert_eq!(renderer.render(), RenderOutput::NoVideoBuffer);
    assert_eq!(renderer.backend().texture_count(), 0);

    // slots are recreated once the budget allows it
    renderer.backend_mut().set_budget(None);
    renderer.uninit();
    renderer.configure(640, 360, 640, 360, 25.0, 0).unwrap();
    let index = decode(&mut renderer, 90);
    renderer.flip_page(Some(index));
    assert!(matches!(renderer.render(), RenderOutput::Frame(_)));
}

#[test]
fn threaded_decode_and_present() {
    let renderer = YuvRenderer::new(MemoryBackend::new(), &hd_config(BufferCount::Double)).shared();
    renderer.lock().configure(640, 360, 640, 360, 25.0, 0).unwrap();
    let render_index = renderer.lock().render_index_handle();

    let (decoded_tx, decoded_rx) = bounded::<usize>(1);
    let (presented_tx, presented_rx) = bounded::<()>(1);
    const FRAMES: usize = 20;

    let decoder = {
        let renderer = renderer.clone();
        thread::spawn(move || {
            for frame in 0..FRAMES {
                let slot = loop {
                    let mut guard = renderer.lock();
                    let filled = guard.get_image(ImageSource::Auto, false).map(|mut image| {
                        image.plane_mut(PlaneKind::Luma).fill(frame as u8);
                        image.index
                    });
                    match filled {
                        Ok(slot) => {
                            guard.release_image(slot, false).unwrap();
                            break slot;
                        }
                        Err(FrameStageError::BufferBusy(_)) => {
                            drop(guard);
                            thread::sleep(Duration::from_millis(1));
                        }
                        Err(e) => panic!("decode failed: {}", e),
                    }
                };
                decoded_tx.send(slot).unwrap();
                presented_rx.recv().unwrap();
            }
        })
    };

    let mut shown = 0;
    for slot in decoded_rx.iter() {
        let output = {
            let mut guard = renderer.lock();
            guard.flip_page(Some(slot));
            guard.render()
        };
        assert_eq!(render_index.load(Ordering::Acquire), slot);
        match output {
            RenderOutput::Frame(frame) => {
                assert_eq!(frame.slot, slot);
                assert_eq!(frame.flip_index, shown as u64 + 1);
            }
            other => panic!("unexpected output {:?}", other),
        }
        shown += 1;
        if presented_tx.send(()).is_err() {
            break;
        }
    }

    decoder.join().unwrap();
    assert_eq!(shown, FRAMES);
}
