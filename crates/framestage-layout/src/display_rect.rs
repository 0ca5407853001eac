//! Destination rectangle for the video inside the view window.

use framestage_core::{FieldSync, PixelRect, Rect, Vec2};

/// Largest rectangle of the given output ratio inside `view`, scaled by
/// `zoom_amount` and centered.
///
/// `input_frame_ratio` is the source aspect (with the user pixel ratio
/// applied); `display_pixel_ratio` is the width/height of one output pixel.
/// Right and bottom edges round the size half up from the truncated
/// left/top so neighbouring rectangles tile without gaps.
pub fn calc_normal_display_rect(
    view: Rect,
    input_frame_ratio: f32,
    display_pixel_ratio: f32,
    zoom_amount: f32,
    field_sync: FieldSync,
) -> PixelRect {
    let output_frame_ratio = input_frame_ratio / display_pixel_ratio;
    let view_size = view.size();

    // maximize the width first
    let mut size = Vec2::new(view_size.x, view_size.x / output_frame_ratio);
    if size.y > view_size.y {
        size = Vec2::new(view_size.y * output_frame_ratio, view_size.y);
    }
    size *= zoom_amount;

    let pos = (view_size - size) / 2.0 + view.min();

    let left = pos.x as i32;
    let right = (left as f32 + size.x + 0.5) as i32;
    let mut top = pos.y as i32;
    let mut bottom = (top as f32 + size.y + 0.5) as i32;

    if field_sync != FieldSync::None {
        // both edges on even scanlines
        top &= !1;
        bottom &= !1;
    }

    PixelRect::new(left, top, right, bottom)
}

/// Crop expressed as the source rectangle to sample from.
pub fn source_rect(width: u32, height: u32, crop: framestage_core::CropInsets) -> PixelRect {
    PixelRect::new(
        crop.left as i32,
        crop.top as i32,
        width as i32 - crop.right as i32,
        height as i32 - crop.bottom as i32,
    )
}
