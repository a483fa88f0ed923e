//! FAST-9 corner detection with Harris ranking

use image::GrayImage;

/// Bresenham circle of radius 3, clockwise from 12 o'clock
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: u32 = 9;
const HARRIS_BLOCK_RADIUS: i32 = 3;
const HARRIS_K: f64 = 0.04;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub x: u32,
    pub y: u32,
    pub score: u32,
}

#[inline]
pub(crate) fn pixel(image: &GrayImage, x: i32, y: i32) -> i32 {
    let x = x.clamp(0, image.width() as i32 - 1) as u32;
    let y = y.clamp(0, image.height() as i32 - 1) as u32;
    image.as_raw()[(y * image.width() + x) as usize] as i32
}

/// True when `flags` holds `ARC_LENGTH` consecutive set bits around the circle
fn has_arc(flags: u32) -> bool {
    let doubled = flags | (flags << 16);
    let mut run = 0;
    for i in 0..32 {
        if (doubled >> i) & 1 == 1 {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Corner strength at (x, y), or None when it is not a FAST-9 corner
fn corner_score(image: &GrayImage, x: u32, y: u32, threshold: u8) -> Option<u32> {
    let center = pixel(image, x as i32, y as i32);
    let t = threshold as i32;

    let mut brighter = 0u32;
    let mut darker = 0u32;
    let mut bright_sum = 0u32;
    let mut dark_sum = 0u32;
    for (i, (dx, dy)) in CIRCLE.iter().enumerate() {
        let value = pixel(image, x as i32 + dx, y as i32 + dy);
        if value > center + t {
            brighter |= 1 << i;
            bright_sum += (value - center - t) as u32;
        } else if value < center - t {
            darker |= 1 << i;
            dark_sum += (center - t - value) as u32;
        }
    }

    match (has_arc(brighter), has_arc(darker)) {
        (true, _) => Some(bright_sum),
        (false, true) => Some(dark_sum),
        _ => None,
    }
}

/// FAST-9 corners at least `border` pixels from every edge, after 3x3
/// non-maximum suppression. Equal neighbours resolve to the earlier one in
/// raster order.
pub fn detect(image: &GrayImage, threshold: u8, border: u32) -> Vec<Corner> {
    let (width, height) = image.dimensions();
    let border = border.max(4);
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }

    let mut scores = vec![0u32; (width * height) as usize];
    for y in border..height - border {
        for x in border..width - border {
            if let Some(score) = corner_score(image, x, y, threshold) {
                scores[(y * width + x) as usize] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            let score = scores[(y * width + x) as usize];
            if score > 0 && is_local_max(&scores, width, x, y, score) {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners
}

fn is_local_max(scores: &[u32], width: u32, x: u32, y: u32, score: u32) -> bool {
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let nx = (x as i32 + dx) as u32;
            let ny = (y as i32 + dy) as u32;
            let other = scores[(ny * width + nx) as usize];
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if other > score || (other == score && earlier) {
                return false;
            }
        }
    }
    true
}

/// Harris corner measure over a 7x7 block of central-difference gradients
pub fn harris_response(image: &GrayImage, x: u32, y: u32) -> f32 {
    let (mut a, mut b, mut c) = (0f64, 0f64, 0f64);
    for dy in -HARRIS_BLOCK_RADIUS..=HARRIS_BLOCK_RADIUS {
        for dx in -HARRIS_BLOCK_RADIUS..=HARRIS_BLOCK_RADIUS {
            let px = x as i32 + dx;
            let py = y as i32 + dy;
            let ix = (pixel(image, px + 1, py) - pixel(image, px - 1, py)) as f64;
            let iy = (pixel(image, px, py + 1) - pixel(image, px, py - 1)) as f64;
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }
    (a * b - c * c - HARRIS_K * (a + b) * (a + b)) as f32
}
