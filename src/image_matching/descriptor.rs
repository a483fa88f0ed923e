//! Intensity-centroid orientation and steered BRIEF descriptors

use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::LazyLock;

use super::fast::pixel;

/// Sampling points lie in [-PATTERN_RADIUS, PATTERN_RADIUS]^2 before rotation
pub const PATTERN_RADIUS: i32 = 13;
pub const ORIENTATION_RADIUS: i32 = 15;
pub const DESCRIPTOR_BITS: usize = 256;
pub const BLUR_SIGMA: f32 = 2.0;

const PATTERN_SEED: u64 = 0x0005_A10C_BA2E_0001;

/// 256-bit binary descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    pub fn hamming(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    fn set(&mut self, bit: usize) {
        self.0[bit / 64] |= 1 << (bit % 64);
    }
}

/// Fixed point-pair test pattern: (x1, y1, x2, y2), never a pair with itself
static PATTERN: LazyLock<Vec<[i32; 4]>> = LazyLock::new(|| {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS);
    while pairs.len() < DESCRIPTOR_BITS {
        let pair = [
            rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
            rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
            rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
            rng.random_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
        ];
        if pair[0] != pair[2] || pair[1] != pair[3] {
            pairs.push(pair);
        }
    }
    pairs
});

/// Angle in radians from the patch centre to its intensity centroid
pub fn orientation(image: &GrayImage, x: u32, y: u32) -> f32 {
    let (mut m10, mut m01) = (0i64, 0i64);
    let r2 = ORIENTATION_RADIUS * ORIENTATION_RADIUS;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let value = pixel(image, x as i32 + dx, y as i32 + dy) as i64;
            m10 += dx as i64 * value;
            m01 += dy as i64 * value;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// BRIEF descriptor with the sampling pattern rotated by `angle`.
/// `smoothed` must be the blurred level image.
pub fn describe(smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let rotate = |px: i32, py: i32| -> (i32, i32) {
        let fx = px as f32;
        let fy = py as f32;
        (
            (fx * cos - fy * sin).round() as i32,
            (fx * sin + fy * cos).round() as i32,
        )
    };

    let (cx, cy) = (x as i32, y as i32);
    let mut descriptor = Descriptor::default();
    for (bit, [x1, y1, x2, y2]) in PATTERN.iter().enumerate() {
        let (ax, ay) = rotate(*x1, *y1);
        let (bx, by) = rotate(*x2, *y2);
        if pixel(smoothed, cx + ax, cy + ay) < pixel(smoothed, cx + bx, cy + by) {
            descriptor.set(bit);
        }
    }
    descriptor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_hamming_distance() {
        let zero = Descriptor([0; 4]);
        let ones = Descriptor([u64::MAX; 4]);
        let mixed = Descriptor([0b1011, 0, 0, 1 << 63]);

        assert_eq!(zero.hamming(&zero), 0);
        assert_eq!(zero.hamming(&ones), 256);
        assert_eq!(zero.hamming(&mixed), 4);
        assert_eq!(mixed.hamming(&zero), 4);
    }

    #[test]
    fn test_pattern_is_fixed_and_bounded() {
        assert_eq!(PATTERN.len(), DESCRIPTOR_BITS);
        assert!(PATTERN.iter().flatten().all(|v| v.abs() <= PATTERN_RADIUS));
        assert!(PATTERN.iter().all(|[x1, y1, x2, y2]| (x1, y1) != (x2, y2)));
    }

    #[test]
    fn test_orientation_points_towards_bright_side() {
        let right_bright = GrayImage::from_fn(64, 64, |x, _| Luma([if x > 32 { 255 } else { 0 }]));
        let below_bright = GrayImage::from_fn(64, 64, |_, y| Luma([if y > 32 { 255 } else { 0 }]));

        assert!(orientation(&right_bright, 32, 32).abs() < 0.1);
        let down = orientation(&below_bright, 32, 32);
        assert!((down - std::f32::consts::FRAC_PI_2).abs() < 0.1);
    }

    #[test]
    fn test_describe_is_deterministic() {
        let image = GrayImage::from_fn(64, 64, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]));
        let a = describe(&image, 32, 32, 0.4);
        let b = describe(&image, 32, 32, 0.4);
        assert_eq!(a, b);
    }
}
