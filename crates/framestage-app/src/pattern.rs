//! Synthetic decoder output.

use framestage_render::YuvImage;
use framestage_core::PlaneKind;

/// Fill a frame with a moving luma ramp letterboxed to 2.35:1 and a
/// colour bar in chroma.
pub fn fill_frame(image: &mut YuvImage<'_>, frame: u32) {
    let (width, height) = (image.width, image.height);
    let picture_height = ((width as f32 / 2.35) as u32).min(height);
    let bar = (height - picture_height) / 2;

    let luma = image.plane_mut(PlaneKind::Luma);
    for y in 0..height {
        let row = luma.row_mut(y);
        if y < bar || y >= bar + picture_height {
            row.fill(16);
            continue;
        }
        for (x, sample) in row.iter_mut().enumerate() {
            *sample = 32 + ((x as u32 + frame * 4) % 192) as u8;
        }
    }

    for (kind, value) in [(PlaneKind::ChromaU, 96u8), (PlaneKind::ChromaV, 160u8)] {
        image.plane_mut(kind).fill(value);
    }
}

/// Luma and alpha planes of a solid subtitle box.
pub fn subtitle_bitmap(width: u32, height: u32) -> (Vec<u8>, Vec<u8>) {
    let size = (width * height) as usize;
    (vec![235; size], vec![255; size])
}
