//! Rotated BRIEF descriptors over a Gaussian-smoothed level image.

pub mod blur;
pub mod pattern;

use orb_core::{Descriptor, ImageLevel, Keypoint, DESCRIPTOR_BYTES};
use rayon::prelude::*;

pub use blur::gaussian_blur;
pub use pattern::{PATTERN, PATTERN_REACH};

#[derive(Debug, Clone, PartialEq)]
pub enum BriefError {
    KeypointOutOfBounds { x: f32, y: f32, reach: usize },
    LevelCountMismatch { keypoint_levels: usize, image_levels: usize },
}

impl std::fmt::Display for BriefError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BriefError::KeypointOutOfBounds { x, y, reach } => {
                write!(f, "Keypoint ({:.1}, {:.1}) closer than {} px to the image border", x, y, reach)
            }
            BriefError::LevelCountMismatch { keypoint_levels, image_levels } => {
                write!(f, "Got keypoints for {} levels but {} images", keypoint_levels, image_levels)
            }
        }
    }
}

impl std::error::Error for BriefError {}

pub type BriefResult<T> = Result<T, BriefError>;

/// Steered BRIEF encoder over the fixed sampling pattern
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorEncoder;

impl DescriptorEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Descriptor of one keypoint on an already blurred level
    pub fn compute_descriptor(&self, blurred: &ImageLevel, kp: &Keypoint) -> BriefResult<Descriptor> {
        let reach = PATTERN_REACH as i64;
        let cx = kp.x.round_ties_even() as i64;
        let cy = kp.y.round_ties_even() as i64;
        if cx < reach || cy < reach || cx + reach >= blurred.width as i64 || cy + reach >= blurred.height as i64 {
            return Err(BriefError::KeypointOutOfBounds { x: kp.x, y: kp.y, reach: PATTERN_REACH });
        }

        let (sin, cos) = kp.angle.to_radians().sin_cos();
        let sample = |x: i8, y: i8| {
            let (x, y) = (x as f32, y as f32);
            let u = (x * cos - y * sin).round_ties_even() as i64;
            let v = (x * sin + y * cos).round_ties_even() as i64;
            blurred.at((cx + u) as usize, (cy + v) as usize)
        };

        let mut d = [0u8; DESCRIPTOR_BYTES];
        for (i, &(ax, ay, bx, by)) in PATTERN.iter().enumerate() {
            let bit = (sample(ax, ay) < sample(bx, by)) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        Ok(d)
    }

    /// Blur one level, then describe its keypoints in order
    pub fn compute_level(&self, level: &ImageLevel, keypoints: &[Keypoint]) -> BriefResult<Vec<Descriptor>> {
        if keypoints.is_empty() {
            return Ok(Vec::new());
        }
        let blurred = gaussian_blur(level);
        let descriptors = keypoints
            .par_iter()
            .map(|kp| self.compute_descriptor(&blurred, kp))
            .collect::<BriefResult<Vec<_>>>()?;
        log::trace!("level {}: {} descriptors", level.level, descriptors.len());
        Ok(descriptors)
    }

    /// Descriptors for every level; `keypoints[i]` belongs to `levels[i]`
    pub fn compute(&self, keypoints: &[Vec<Keypoint>], levels: &[ImageLevel]) -> BriefResult<Vec<Vec<Descriptor>>> {
        if keypoints.len() != levels.len() {
            return Err(BriefError::LevelCountMismatch {
                keypoint_levels: keypoints.len(),
                image_levels: levels.len(),
            });
        }
        keypoints
            .par_iter()
            .zip(levels.par_iter())
            .map(|(kps, level)| self.compute_level(level, kps))
            .collect()
    }
}

/// Number of differing bits between two descriptors
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured_level(n: usize, seed: usize) -> ImageLevel {
        let data = (0..n * n)
            .map(|i| {
                let (x, y) = (i % n, i / n);
                ((x * 31 + y * 17 + (x * y + seed) % 23 * 7) % 256) as u8
            })
            .collect();
        ImageLevel::base(data, n, n).unwrap()
    }

    /// Quarter turn about the centre of a square image: rotated(a, b) = original(b, n - 1 - a)
    fn rotate_quarter(level: &ImageLevel) -> ImageLevel {
        let n = level.width;
        let mut out = vec![0u8; n * n];
        for b in 0..n {
            for a in 0..n {
                out[b * n + a] = level.at(b, n - 1 - a);
            }
        }
        ImageLevel::base(out, n, n).unwrap()
    }

    fn keypoint(x: f32, y: f32, angle: f32) -> Keypoint {
        let mut kp = Keypoint::new(x, y, 1.0);
        kp.angle = angle;
        kp
    }

    #[test]
    fn test_bits_follow_pattern_on_ramp() {
        // blur leaves a horizontal ramp unchanged, so bit k is just ax < bx
        let data = (0..64 * 64).map(|i| (20 + 2 * (i % 64)) as u8).collect();
        let level = ImageLevel::base(data, 64, 64).unwrap();
        let d = DescriptorEncoder::new()
            .compute_level(&level, &[keypoint(32.0, 32.0, 0.0)])
            .unwrap()[0];
        for (k, &(ax, _, bx, _)) in PATTERN.iter().enumerate() {
            let bit = (d[k / 8] >> (k % 8)) & 1;
            assert_eq!(bit == 1, ax < bx, "bit {}", k);
        }
    }

    #[test]
    fn test_flat_image_gives_zero_descriptor() {
        let level = ImageLevel::base(vec![90; 50 * 50], 50, 50).unwrap();
        let d = DescriptorEncoder::new().compute_level(&level, &[keypoint(25.0, 25.0, 33.0)]).unwrap();
        assert_eq!(d[0], [0u8; DESCRIPTOR_BYTES]);
    }

    #[test]
    fn test_deterministic() {
        let level = textured_level(61, 3);
        let kps = vec![keypoint(30.0, 30.0, 17.0), keypoint(25.0, 35.0, 250.0)];
        let encoder = DescriptorEncoder::new();
        let a = encoder.compute_level(&level, &kps).unwrap();
        let b = encoder.compute_level(&level, &kps).unwrap();
        assert_eq!(a, b);
        assert_ne!(a[0], a[1]);
    }

    #[test]
    fn test_quarter_turn_invariance() {
        let n = 61;
        let c = (n / 2) as f32;
        let level = textured_level(n, 5);
        let rotated = rotate_quarter(&level);
        let encoder = DescriptorEncoder::new();

        let original = encoder.compute_descriptor(&gaussian_blur(&level), &keypoint(c, c, 0.0)).unwrap();
        let turned = encoder.compute_descriptor(&gaussian_blur(&rotated), &keypoint(c, c, 90.0)).unwrap();
        assert_eq!(original, turned);
    }

    #[test]
    fn test_angle_changes_descriptor() {
        let level = gaussian_blur(&textured_level(61, 5));
        let encoder = DescriptorEncoder::new();
        let a = encoder.compute_descriptor(&level, &keypoint(30.0, 30.0, 0.0)).unwrap();
        let b = encoder.compute_descriptor(&level, &keypoint(30.0, 30.0, 90.0)).unwrap();
        assert!(hamming_distance(&a, &b) > 0);
    }

    #[test]
    fn test_keypoint_near_border_rejected() {
        let level = textured_level(40, 1);
        let encoder = DescriptorEncoder::new();
        for (x, y) in [(17.0, 20.0), (20.0, 22.0), (22.0, 20.0), (20.0, -1.0)] {
            assert!(matches!(
                encoder.compute_level(&level, &[keypoint(x, y, 0.0)]),
                Err(BriefError::KeypointOutOfBounds { reach: 18, .. })
            ));
        }
        assert!(encoder.compute_level(&level, &[keypoint(18.0, 21.0, 45.0)]).is_ok());
    }

    #[test]
    fn test_compute_per_level() {
        let levels = vec![textured_level(50, 0), textured_level(45, 1)];
        let keypoints = vec![vec![keypoint(25.0, 25.0, 0.0)], Vec::new()];
        let encoder = DescriptorEncoder::new();
        let descriptors = encoder.compute(&keypoints, &levels).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].len(), 1);
        assert!(descriptors[1].is_empty());

        assert!(matches!(
            encoder.compute(&keypoints, &levels[..1]),
            Err(BriefError::LevelCountMismatch { keypoint_levels: 2, image_levels: 1 })
        ));
    }

    #[test]
    fn test_hamming_distance() {
        let a = [0u8; DESCRIPTOR_BYTES];
        let mut b = a;
        b[0] = 0b1011;
        b[31] = 0x80;
        assert_eq!(hamming_distance(&a, &b), 4);
        assert_eq!(hamming_distance(&b, &b), 0);
    }
}
