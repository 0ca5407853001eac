//! The YUV video renderer: ties the buffer rings to display layout.

use crate::backend::TextureBackend;
use crate::buffer_ring::{FrameBufferRing, ImageFlags, ImageSource, YuvImage};
use crate::osd_ring::{OsdBufferRing, OsdPlacement, OsdQuad};
use framestage_core::{
    BufferCount, CropInsets, DisplayConfig, DisplayResolution, FieldSync, FrameStageConfig, FrameStageError, PixelRect,
    Rect, RendererSettings, ResolutionInfo, Result, VideoSettings, ViewMode, YuvColorimetry,
};
use framestage_layout::{
    calc_normal_display_rect, calculate_frame_aspect_ratio, choose_best_resolution, cropped_aspect_ratio, detect_crop,
    source_rect, view_params, AnamorphicTable, ResolutionQuery, SourceVideoFormat, ViewModeInput, ViewParams,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Renderer shared between the decode and render threads.
pub type SharedRenderer<B> = Arc<Mutex<YuvRenderer<B>>>;

/// Everything presentation needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFrame {
    pub slot: usize,
    pub flip_index: u64,
    pub source_rect: PixelRect,
    pub dest_rect: PixelRect,
    pub colorimetry: YuvColorimetry,
    /// Packed 0xRRGGBB colour for the bars around the picture
    pub clear_colour: u32,
    pub osd: Option<OsdQuad>,
}

/// Outcome of [`VideoRenderer::render`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RenderOutput {
    NotConfigured,
    /// The displayed slot is missing or holds no finished frame
    NoVideoBuffer,
    Frame(RenderedFrame),
}

/// Decoder and presentation facing operations of a video renderer.
pub trait VideoRenderer {
    /// Drop all state and textures ahead of a new stream.
    fn pre_init(&mut self) -> Result<()>;

    /// Set up for a stream stored at `width x height` and shown at
    /// `display_width x display_height`. `flags` carries colorimetry bits.
    fn configure(
        &mut self,
        width: u32,
        height: u32,
        display_width: u32,
        display_height: u32,
        fps: f32,
        flags: u32,
    ) -> Result<()>;

    /// Lock a slot for the decoder. Triple buffering may add a slot when
    /// every other one is locked.
    fn get_image(&mut self, source: ImageSource, readonly: bool) -> Result<YuvImage<'_>>;

    fn release_image(&mut self, index: usize, preserve: bool) -> Result<()>;

    /// Show `source`, or the next slot when `None` or out of range.
    fn flip_page(&mut self, source: Option<usize>) -> Option<usize>;

    /// Draw a subtitle/OSD bitmap. The position arguments are not used;
    /// bitmaps are anchored to the subtitle line.
    #[allow(clippy::too_many_arguments)]
    fn draw_alpha(
        &mut self,
        x0: i32,
        y0: i32,
        width: u32,
        height: u32,
        src: &[u8],
        src_alpha: &[u8],
        stride: usize,
    ) -> Result<()>;

    fn render(&mut self) -> RenderOutput;

    fn uninit(&mut self);

    /// Source crop rectangle and screen destination rectangle.
    fn video_rect(&self) -> (PixelRect, PixelRect);

    /// Aspect ratio of the cropped source.
    fn aspect_ratio(&self) -> f32;

    /// Resolution the video is shown at right now.
    fn resolution(&self) -> DisplayResolution;
}

/// Renderer for planar YUV 4:2:0 video over a [`TextureBackend`].
pub struct YuvRenderer<B: TextureBackend> {
    backend: B,
    display: DisplayConfig,
    settings: VideoSettings,
    renderer_settings: RendererSettings,
    anamorphic: AnamorphicTable,
    frames: FrameBufferRing<B::Texture>,
    osd: OsdBufferRing<B::Texture>,
    source: Option<SourceVideoFormat>,
    source_frame_ratio: f32,
    resolution: DisplayResolution,
    view: ViewParams,
    /// Explicit view window; the overscan area when `None`
    view_window: Option<Rect>,
    source_rect: PixelRect,
    dest_rect: PixelRect,
    normal_dest_width: i32,
    paused: bool,
    configured: bool,
}

impl<B: TextureBackend> YuvRenderer<B> {
    pub fn new(backend: B, config: &FrameStageConfig) -> Self {
        Self {
            backend,
            display: config.display.clone(),
            settings: config.video.clone(),
            renderer_settings: config.renderer,
            anamorphic: AnamorphicTable::standard(),
            frames: FrameBufferRing::new(),
            osd: OsdBufferRing::new(),
            source: None,
            source_frame_ratio: 1.0,
            resolution: DisplayResolution::Pal4x3,
            view: ViewParams::NORMAL,
            view_window: None,
            source_rect: PixelRect::default(),
            dest_rect: PixelRect::default(),
            normal_dest_width: 0,
            paused: false,
            configured: false,
        }
    }

    /// Wrap in a mutex for sharing between threads.
    pub fn shared(self) -> SharedRenderer<B> {
        Arc::new(Mutex::new(self))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn frames(&self) -> &FrameBufferRing<B::Texture> {
        &self.frames
    }

    pub fn osd(&self) -> &OsdBufferRing<B::Texture> {
        &self.osd
    }

    pub fn settings(&self) -> &VideoSettings {
        &self.settings
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn view_params(&self) -> ViewParams {
        self.view
    }

    pub fn source_frame_ratio(&self) -> f32 {
        self.source_frame_ratio
    }

    pub fn source_format(&self) -> Option<&SourceVideoFormat> {
        self.source.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Resolution picked for fullscreen playback of the stream.
    pub fn video_resolution(&self) -> DisplayResolution {
        self.resolution
    }

    /// Replace the anamorphic frame size table used by `configure`.
    pub fn set_anamorphic_table(&mut self, table: AnamorphicTable) {
        self.anamorphic = table;
    }

    /// Lock-free view of the displayed slot index.
    pub fn render_index_handle(&self) -> Arc<AtomicUsize> {
        self.frames.render_index_handle()
    }

    /// Fullscreen plays at the chosen resolution, windowed at the GUI's.
    pub fn effective_resolution(&self) -> DisplayResolution {
        if self.renderer_settings.fullscreen {
            self.resolution
        } else {
            self.display.gui_resolution
        }
    }

    fn resolution_info(&self) -> ResolutionInfo {
        self.display.info(self.effective_resolution())
    }

    /// The rectangle video is laid out in.
    pub fn view_window(&self) -> Rect {
        self.view_window
            .unwrap_or_else(|| Rect::from(self.resolution_info().overscan))
    }

    pub fn set_view_window(&mut self, window: Option<Rect>) {
        self.view_window = window;
        self.manage_display();
    }

    pub fn set_fullscreen(&mut self, fullscreen: bool) {
        self.renderer_settings.fullscreen = fullscreen;
        self.manage_display();
    }

    pub fn set_field_sync(&mut self, field_sync: FieldSync) {
        self.settings.field_sync = field_sync;
        self.manage_display();
    }

    /// Keep the displayed frame when new slots appear.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_buffer_count(&mut self, count: BufferCount) {
        self.renderer_settings.buffer_count = count;
        self.manage_textures();
    }

    pub fn set_crop(&mut self, crop: CropInsets) {
        self.settings.crop = crop;
        self.set_view_mode(self.settings.view_mode);
    }

    pub fn set_custom_view(&mut self, zoom_amount: f32, pixel_ratio: f32) {
        self.settings.custom_zoom_amount = zoom_amount;
        self.settings.custom_pixel_ratio = pixel_ratio;
        if self.settings.view_mode == ViewMode::Custom {
            self.set_view_mode(ViewMode::Custom);
        }
    }

    /// Switch view mode and recompute pixel ratio, zoom and layout.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.settings.view_mode = mode;
        let Some(source) = self.source else {
            self.view = ViewParams::NORMAL;
            return;
        };

        let info = self.display.info(self.resolution);
        self.view = view_params(&ViewModeInput {
            mode,
            resolution: self.resolution,
            info: &info,
            source_aspect: self.aspect_ratio(),
            source_height: source.height,
            crop: self.settings.crop,
            custom_zoom_amount: self.settings.custom_zoom_amount,
            custom_pixel_ratio: self.settings.custom_pixel_ratio,
        });
        debug!(
            ?mode,
            pixel_ratio = self.view.pixel_ratio,
            zoom = self.view.zoom_amount,
            "View mode set"
        );
        self.manage_display();
    }

    /// Persisted numeric form of [`set_view_mode`](Self::set_view_mode).
    pub fn set_view_mode_index(&mut self, index: i32) {
        self.set_view_mode(ViewMode::from_index(index));
    }

    /// Detect black borders on the displayed frame, or clear the crop.
    pub fn auto_crop(&mut self, enable: bool) -> Result<()> {
        if enable {
            let slot = self
                .frames
                .displayed()
                .ok_or_else(|| FrameStageError::NoSuchBuffer(self.frames.render_index()))?;
            let luma = slot.luma();
            self.settings.crop = detect_crop(&luma.data, luma.stride, luma.width, luma.height)?;
        } else {
            self.settings.crop = CropInsets::NONE;
        }
        self.set_view_mode(self.settings.view_mode);
        Ok(())
    }

    /// Recompute the source and destination rectangles.
    pub fn manage_display(&mut self) {
        let Some(source) = self.source else {
            return;
        };
        let view = self.view_window();
        let info = self.resolution_info();
        self.source_rect = source_rect(source.width, source.height, self.settings.crop);
        self.dest_rect = calc_normal_display_rect(
            view,
            self.aspect_ratio() * self.view.pixel_ratio,
            info.pixel_ratio,
            self.view.zoom_amount,
            self.settings.field_sync,
        );
    }

    /// Size the overlay to the unzoomed picture width.
    fn setup_subtitles(&mut self) {
        let view = self.view_window();
        let info = self.resolution_info();
        let normal = calc_normal_display_rect(
            view,
            self.aspect_ratio() * self.view.pixel_ratio,
            info.pixel_ratio,
            1.0,
            self.settings.field_sync,
        );
        self.normal_dest_width = normal.width();
        self.osd.setup_subtitles(self.normal_dest_width.max(0) as u32);
    }

    /// Width of the picture at zoom 1.
    pub fn normal_dest_width(&self) -> i32 {
        self.normal_dest_width
    }

    /// Bring the frame ring to the configured slot count.
    pub fn manage_textures(&mut self) {
        self.frames
            .manage_textures(&mut self.backend, self.renderer_settings.buffer_count, self.paused);
    }

    /// Copy planar data into the next decode slot.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_slice(
        &mut self,
        src: [&[u8]; 3],
        strides: [usize; 3],
        width: u32,
        height: u32,
        x: u32,
        y: u32,
    ) -> Result<usize> {
        self.frames
            .draw_slice(&mut self.backend, src, strides, width, height, x, y)
    }

    /// Clear every slot's lock and status flags.
    pub fn reset(&mut self) {
        self.frames.reset();
    }
}

impl<B: TextureBackend> VideoRenderer for YuvRenderer<B> {
    fn pre_init(&mut self) -> Result<()> {
        self.configured = false;
        self.uninit();
        self.resolution = DisplayResolution::Pal4x3;
        self.source = None;
        self.view = ViewParams::NORMAL;
        Ok(())
    }

    fn configure(
        &mut self,
        width: u32,
        height: u32,
        display_width: u32,
        display_height: u32,
        fps: f32,
        flags: u32,
    ) -> Result<()> {
        let format = SourceVideoFormat::new(width, height, display_width, display_height, fps)
            .map_err(|e| {
                warn!(error = %e, "Rejected stream configuration");
                e
            })?
            .with_colorimetry(YuvColorimetry::from_flags(flags));

        self.source_frame_ratio = calculate_frame_aspect_ratio(&format, &self.anamorphic);
        self.source = Some(format);
        self.resolution = choose_best_resolution(&ResolutionQuery {
            capabilities: self.display.capabilities,
            requested: self.settings.requested_resolution,
            pal60_switching: self.settings.pal60_switching,
            fps,
            source_frame_ratio: self.source_frame_ratio,
        });

        self.frames.set_frame_size(&mut self.backend, width, height);
        self.set_view_mode(self.settings.view_mode);
        self.manage_display();
        self.setup_subtitles();
        self.manage_textures();
        self.configured = true;

        info!(
            width,
            height,
            display_width,
            display_height,
            fps,
            ratio = self.source_frame_ratio,
            resolution = ?self.resolution,
            colorimetry = ?format.colorimetry,
            "Configured renderer"
        );
        Ok(())
    }

    fn get_image(&mut self, source: ImageSource, readonly: bool) -> Result<YuvImage<'_>> {
        if source == ImageSource::Auto && self.frames.wants_dynamic_slot() {
            if let Err(e) = self.frames.add_dynamic_slot(&mut self.backend) {
                debug!(error = %e, "No dynamic slot added");
            }
        }
        self.frames.get_image(source, readonly)
    }

    fn release_image(&mut self, index: usize, preserve: bool) -> Result<()> {
        self.frames.release_image(&mut self.backend, index, preserve)
    }

    fn flip_page(&mut self, source: Option<usize>) -> Option<usize> {
        let index = self.frames.flip_page(source);
        self.osd.flip();
        index
    }

    fn draw_alpha(
        &mut self,
        _x0: i32,
        _y0: i32,
        width: u32,
        height: u32,
        src: &[u8],
        src_alpha: &[u8],
        stride: usize,
    ) -> Result<()> {
        let Some(source) = self.source else {
            debug!("draw_alpha before configure, skipping");
            return Ok(());
        };
        let info = self.resolution_info();
        let placement = OsdPlacement {
            view: self.view_window(),
            pixel_ratio: info.pixel_ratio,
            overscan: info.overscan,
            subtitle_line: info.subtitle_line,
            source_frame_ratio: self.source_frame_ratio,
            source_width: source.width,
            source_height: source.height,
        };
        self.osd
            .draw_alpha(&mut self.backend, &placement, width, height, src, src_alpha, stride)
    }

    fn render(&mut self) -> RenderOutput {
        if !self.configured {
            return RenderOutput::NotConfigured;
        }
        self.manage_display();
        self.manage_textures();

        let slot_index = self.frames.render_index();
        let Some(slot) = self.frames.displayed() else {
            return RenderOutput::NoVideoBuffer;
        };
        if !slot.flags().contains(ImageFlags::READY) {
            return RenderOutput::NoVideoBuffer;
        }

        RenderOutput::Frame(RenderedFrame {
            slot: slot_index,
            flip_index: slot.flip_index(),
            source_rect: self.source_rect,
            dest_rect: self.dest_rect,
            colorimetry: self.source.map(|s| s.colorimetry).unwrap_or_default(),
            clear_colour: self.settings.clear_colour(),
            osd: self.osd.render_osd(),
        })
    }

    fn uninit(&mut self) {
        self.frames.uninit(&mut self.backend);
        self.osd.uninit(&mut self.backend);
        self.configured = false;
    }

    fn video_rect(&self) -> (PixelRect, PixelRect) {
        (self.source_rect, self.dest_rect)
    }

    fn aspect_ratio(&self) -> f32 {
        match self.source {
            Some(source) => {
                cropped_aspect_ratio(self.source_frame_ratio, source.width, source.height, self.settings.crop)
            }
            None => self.source_frame_ratio,
        }
    }

    fn resolution(&self) -> DisplayResolution {
        self.effective_resolution()
    }
}
