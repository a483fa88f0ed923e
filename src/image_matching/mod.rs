//! Feature-based image similarity
//!
//! Oriented FAST keypoints over an image pyramid, steered BRIEF descriptors
//! and cross-checked Hamming matching. The similarity score is the number of
//! mutually nearest descriptor pairs. Everything here is deterministic for
//! bit-identical input: the sampling pattern is fixed and every ranking has
//! a total tie break.
//!
//! Matching an image against itself always scores at least as high as
//! matching it against any other image, since cross-checked pairs are
//! one-to-one and an image pairs each distinct descriptor with itself.

use image::imageops::{self, FilterType};
use image::GrayImage;
use tracing::trace;

use crate::config::ImageMatchingConfig;
use crate::errors::ImageMatchError;

pub mod descriptor;
pub mod fast;
pub mod matcher;

pub use descriptor::Descriptor;
pub use matcher::FeatureMatch;

/// Smallest edge threshold that keeps every rotated sampling point and the
/// orientation patch inside the image
pub const MIN_EDGE_THRESHOLD: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Position in full-resolution image coordinates
    pub x: f32,
    pub y: f32,
    pub level: usize,
    pub response: f32,
    /// Radians
    pub angle: f32,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ImageMatcher {
    config: ImageMatchingConfig,
}

impl Default for ImageMatcher {
    fn default() -> Self {
        Self::new(ImageMatchingConfig::default())
    }
}

impl ImageMatcher {
    pub fn new(config: ImageMatchingConfig) -> Self {
        Self { config }
    }

    /// Number of cross-checked descriptor matches between two encoded images
    pub fn similarity(&self, first: &[u8], second: &[u8]) -> Result<usize, ImageMatchError> {
        let a = self.extract(first, "first")?;
        let b = self.extract(second, "second")?;
        Ok(self.score(&a, &b))
    }

    /// Decode and extract features; `role` names the input in decode errors
    pub fn extract(&self, bytes: &[u8], role: &'static str) -> Result<FeatureSet, ImageMatchError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| ImageMatchError::DecodeFailure { role, source })?;
        Ok(self.extract_gray(&image.to_luma8()))
    }

    pub fn score(&self, a: &FeatureSet, b: &FeatureSet) -> usize {
        self.match_features(a, b).len()
    }

    /// Mutually nearest descriptor pairs, in `a` order
    pub fn match_features(&self, a: &FeatureSet, b: &FeatureSet) -> Vec<FeatureMatch> {
        matcher::cross_check(&a.descriptors, &b.descriptors)
    }

    pub fn extract_gray(&self, gray: &GrayImage) -> FeatureSet {
        let pyramid = self.pyramid(gray);
        let quotas = level_quotas(
            self.config.max_keypoints,
            self.config.pyramid_levels,
            self.config.scale_factor,
        );

        let mut features = FeatureSet::default();
        for (level, (image, quota)) in pyramid.iter().zip(quotas).enumerate() {
            let mut corners: Vec<(fast::Corner, f32)> =
                fast::detect(image, self.config.fast_threshold, self.config.edge_threshold)
                    .into_iter()
                    .map(|c| (c, fast::harris_response(image, c.x, c.y)))
                    .collect();
            corners.sort_by(|(a, ra), (b, rb)| {
                rb.total_cmp(ra)
                    .then(a.y.cmp(&b.y))
                    .then(a.x.cmp(&b.x))
            });
            corners.truncate(quota);
            if corners.is_empty() {
                continue;
            }

            let smoothed = imageops::blur(image, descriptor::BLUR_SIGMA);
            let level_scale = self.config.scale_factor.powi(level as i32);
            for (corner, response) in corners {
                let angle = descriptor::orientation(image, corner.x, corner.y);
                features.keypoints.push(Keypoint {
                    x: corner.x as f32 * level_scale,
                    y: corner.y as f32 * level_scale,
                    level,
                    response,
                    angle,
                });
                features
                    .descriptors
                    .push(descriptor::describe(&smoothed, corner.x, corner.y, angle));
            }
        }

        trace!(
            "Extracted {} keypoints from {}x{} image over {} levels",
            features.len(),
            gray.width(),
            gray.height(),
            pyramid.len()
        );
        features
    }

    /// Levels shrinking by `scale_factor`, stopping once a level is too small
    /// to hold a keypoint away from its border
    fn pyramid(&self, gray: &GrayImage) -> Vec<GrayImage> {
        let min_side = 2 * self.config.edge_threshold + 1;
        let mut levels = Vec::with_capacity(self.config.pyramid_levels);
        if gray.width() < min_side || gray.height() < min_side {
            return levels;
        }
        levels.push(gray.clone());

        for level in 1..self.config.pyramid_levels {
            let scale = self.config.scale_factor.powi(level as i32);
            let width = (gray.width() as f32 / scale).round() as u32;
            let height = (gray.height() as f32 / scale).round() as u32;
            if width < min_side || height < min_side {
                break;
            }
            levels.push(imageops::resize(gray, width, height, FilterType::Triangle));
        }
        levels
    }
}

/// Keypoint budget per level, geometric in the scale factor, summing to `total`
fn level_quotas(total: usize, levels: usize, scale_factor: f32) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let factor = 1.0 / scale_factor as f64;
    let mut per_level = total as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut quotas = Vec::with_capacity(levels);
    let mut assigned = 0usize;
    for _ in 0..levels - 1 {
        let quota = (per_level.round() as usize).min(total - assigned);
        quotas.push(quota);
        assigned += quota;
        per_level *= factor;
    }
    quotas.push(total - assigned);
    quotas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Luma};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::Cursor;

    /// 256x256 mosaic of random grey 8x8 blocks
    fn mosaic(seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let blocks: Vec<u8> = (0..32 * 32).map(|_| rng.random()).collect();
        GrayImage::from_fn(256, 256, |x, y| Luma([blocks[(y / 8 * 32 + x / 8) as usize]]))
    }

    fn png(image: &GrayImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(image.clone())
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_quotas_sum_to_total_and_shrink() {
        let quotas = level_quotas(500, 8, 1.2);
        assert_eq!(quotas.len(), 8);
        assert_eq!(quotas.iter().sum::<usize>(), 500);
        assert!(quotas[0] > quotas[6]);
        assert_eq!(level_quotas(10, 1, 1.2), vec![10]);
    }

    #[test]
    fn test_extraction_bounded_by_max_keypoints() {
        let matcher = ImageMatcher::new(ImageMatchingConfig {
            max_keypoints: 40,
            ..ImageMatchingConfig::default()
        });
        let features = matcher.extract_gray(&mosaic(1));
        assert!(!features.is_empty());
        assert!(features.len() <= 40);
        assert_eq!(features.keypoints.len(), features.descriptors.len());
    }

    #[test]
    fn test_self_similarity_beats_unrelated() {
        let matcher = ImageMatcher::default();
        let a = png(&mosaic(7));
        let b = png(&mosaic(8));

        let own = matcher.similarity(&a, &a).unwrap();
        let other = matcher.similarity(&a, &b).unwrap();
        assert!(own > 0);
        assert!(own >= other);
    }

    #[test]
    fn test_similarity_is_deterministic() {
        let matcher = ImageMatcher::default();
        let a = png(&mosaic(3));
        let b = png(&mosaic(4));
        assert_eq!(
            matcher.similarity(&a, &b).unwrap(),
            matcher.similarity(&a, &b).unwrap()
        );
    }

    #[test]
    fn test_undecodable_input_reports_role() {
        let matcher = ImageMatcher::default();
        let good = png(&mosaic(5));

        let err = matcher.similarity(b"not an image", &good).unwrap_err();
        assert!(matches!(err, ImageMatchError::DecodeFailure { role: "first", .. }));
        let err = matcher.similarity(&good, &[]).unwrap_err();
        assert!(matches!(err, ImageMatchError::DecodeFailure { role: "second", .. }));
    }

    #[test]
    fn test_tiny_image_has_no_features() {
        let matcher = ImageMatcher::default();
        let tiny = GrayImage::from_pixel(32, 32, Luma([90]));
        assert!(matcher.extract_gray(&tiny).is_empty());
        let bytes = png(&tiny);
        assert_eq!(matcher.similarity(&bytes, &bytes).unwrap(), 0);
    }
}
