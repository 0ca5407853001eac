//! FrameStage - headless playback harness
//!
//! Decodes a synthetic stream on one thread and presents it on another,
//! logging the layout the renderer computes for every frame.

mod args;
mod pattern;

use anyhow::{Context, Result};
use args::Options;
use crossbeam_channel::{bounded, Receiver, Sender};
use framestage_core::{FrameStageConfig, FrameStageError};
use framestage_gpu::{GpuContext, WgpuBackend};
use framestage_render::{
    ImageSource, MemoryBackend, RenderOutput, SharedRenderer, TextureBackend, VideoRenderer, YuvRenderer,
};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// A decoded frame waiting to be shown.
struct DecodedFrame {
    slot: usize,
    number: u32,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = Options::parse(std::env::args().skip(1))?;
    let config = match &options.config {
        Some(path) => FrameStageConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => FrameStageConfig::default(),
    };

    info!("FrameStage starting...");

    if options.gpu {
        let context = GpuContext::new_blocking()?;
        info!("Using GPU adapter: {:?}", context.adapter.get_info().name);
        run(WgpuBackend::new(&context), &config, &options)
    } else {
        run(MemoryBackend::new(), &config, &options)
    }
}

fn run<B>(backend: B, config: &FrameStageConfig, options: &Options) -> Result<()>
where
    B: TextureBackend + 'static,
{
    let renderer = YuvRenderer::new(backend, config).shared();
    let (width, height) = options.source;
    let (display_width, display_height) = options.display_size();

    renderer
        .lock()
        .configure(width, height, display_width, display_height, options.fps, 0)?;

    let (decoded_tx, decoded_rx) = bounded::<DecodedFrame>(1);
    let (presented_tx, presented_rx) = bounded::<()>(1);

    let decoder = {
        let renderer = renderer.clone();
        let frames = options.frames;
        thread::Builder::new()
            .name("decode".into())
            .spawn(move || decode_loop(renderer, frames, decoded_tx, presented_rx))?
    };

    let last = present_loop(&renderer, decoded_rx, presented_tx);

    match decoder.join() {
        Ok(result) => result?,
        Err(_) => anyhow::bail!("decode thread panicked"),
    }

    let mut renderer = renderer.lock();
    match renderer.auto_crop(true) {
        Ok(()) => info!(crop = ?renderer.settings().crop, "Auto crop on last frame"),
        Err(e) => warn!(error = %e, "Auto crop failed"),
    }
    let (src, dest) = renderer.video_rect();
    info!(?src, ?dest, aspect = renderer.aspect_ratio(), "Final layout");

    if let Some(output) = last {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    renderer.uninit();
    Ok(())
}

fn decode_loop<B: TextureBackend>(
    renderer: SharedRenderer<B>,
    frames: u32,
    decoded: Sender<DecodedFrame>,
    presented: Receiver<()>,
) -> Result<()> {
    for number in 0..frames {
        let slot = loop {
            let mut guard = renderer.lock();
            let filled = guard.get_image(ImageSource::Auto, false).map(|mut image| {
                pattern::fill_frame(&mut image, number);
                image.index
            });
            match filled {
                Ok(slot) => {
                    guard.release_image(slot, false)?;
                    break slot;
                }
                Err(FrameStageError::BufferBusy(busy)) => {
                    debug!(slot = busy, "No free slot, waiting");
                    drop(guard);
                    thread::sleep(Duration::from_millis(1));
                }
                Err(e) => return Err(e.into()),
            }
        };

        if decoded.send(DecodedFrame { slot, number }).is_err() {
            break;
        }
        if presented.recv().is_err() {
            break;
        }
    }
    Ok(())
}

fn present_loop<B: TextureBackend>(
    renderer: &SharedRenderer<B>,
    decoded: Receiver<DecodedFrame>,
    presented: Sender<()>,
) -> Option<RenderOutput> {
    let mut last = None;
    for frame in decoded {
        let mut guard = renderer.lock();

        if frame.number % 2 == 0 {
            let (w, h) = (360, 48);
            let (luma, alpha) = pattern::subtitle_bitmap(w, h);
            if let Err(e) = guard.draw_alpha(0, 0, w, h, &luma, &alpha, w as usize) {
                warn!(error = %e, "Subtitle draw failed");
            }
        }

        guard.flip_page(Some(frame.slot));
        let output = guard.render();
        drop(guard);

        match &output {
            RenderOutput::Frame(f) => debug!(
                frame = frame.number,
                slot = f.slot,
                dest = ?f.dest_rect,
                osd = f.osd.is_some(),
                "Presented frame"
            ),
            other => warn!(frame = frame.number, ?other, "Nothing presented"),
        }
        last = Some(output);

        if presented.send(()).is_err() {
            break;
        }
    }
    last
}
