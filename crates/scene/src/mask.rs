//! Colour-keyed mask classification.
//!
//! A mask is an equirectangular bitmap aligned with its panorama. Each
//! navigable region is painted in a key colour; everything else is near-black
//! or near-white background.

use foundation::math::Vec2;
use streaming::Image;
use tour::ColorRegion;

pub const DEFAULT_COLOR_TOLERANCE: u8 = 5;

/// Near-black or near-white pixels never match a region.
pub fn is_background(rgb: [u8; 3], tolerance: u8) -> bool {
    let black = rgb.iter().all(|&c| c <= tolerance);
    let white = rgb.iter().all(|&c| c >= 255 - tolerance);
    black || white
}

pub fn colors_match(a: [u8; 3], b: [u8; 3], tolerance: u8) -> bool {
    a.iter().zip(b.iter()).all(|(&x, &y)| x.abs_diff(y) <= tolerance)
}

/// First region (declaration order) whose key is within tolerance of `rgb`.
pub fn classify(rgb: [u8; 3], regions: &[ColorRegion], tolerance: u8) -> Option<&ColorRegion> {
    if is_background(rgb, tolerance) {
        return None;
    }
    regions
        .iter()
        .find(|r| colors_match(rgb, r.color_key.0, tolerance))
}

/// Pixel addressed by an equirectangular `uv`: `x = u * w`, `y = (1 - v) * h`,
/// clamped to the image.
pub fn pixel_for_uv(uv: Vec2, width: u32, height: u32) -> (u32, u32) {
    let to_index = |t: f64, n: u32| -> u32 {
        if n == 0 || !t.is_finite() {
            return 0;
        }
        let i = (t * n as f64).floor();
        i.clamp(0.0, (n - 1) as f64) as u32
    };
    (to_index(uv.x, width), to_index(1.0 - uv.y, height))
}

pub fn sample(mask: &Image, uv: Vec2) -> Option<[u8; 3]> {
    let (x, y) = pixel_for_uv(uv, mask.width(), mask.height());
    mask.rgb_at(x, y)
}

/// Translucent sky-blue tint of a mask, drawn over the panorama so authors
/// can see region boundaries.
pub fn overlay_tint(mask: &Image) -> Image {
    const TINT: [f64; 3] = [135.0, 206.0, 250.0];
    mask.map_pixels(|[r, g, b, _]| {
        let mix = |c: u8, t: f64| (c as f64 * 0.5 + t).min(255.0) as u8;
        [mix(r, TINT[0]), mix(g, TINT[1]), mix(b, TINT[2]), 128]
    })
}
