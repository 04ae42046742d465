use orb_core::{ImageLevel, Keypoint};
use crate::types::{CellWindow, CornerType};

/// Capability the grid detector needs: strong corners above a threshold inside a window.
pub trait CornerDetector: Send + Sync {
    /// Pixels a window must keep clear on every side before a corner can be tested.
    fn margin(&self) -> usize;

    /// Detect corners in `window`, returning coordinates relative to the window origin.
    fn detect(&self, img: &ImageLevel, window: CellWindow, threshold: u8) -> Vec<Keypoint>;
}

/// FAST segment-test detector with 3x3 non-maximum suppression
#[derive(Debug, Clone, Copy)]
pub struct FastCornerDetector {
    arc_length: usize,
}

impl Default for FastCornerDetector {
    fn default() -> Self {
        Self { arc_length: 9 }
    }
}

impl FastCornerDetector {
    /// Bresenham circle of radius 3, clockwise from 12 o'clock
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    pub const RADIUS: usize = 3;

    /// FAST-N with a custom contiguous arc length (9..=12 are the usual choices)
    pub fn with_arc_length(arc_length: usize) -> Self {
        Self { arc_length: arc_length.clamp(1, 16) }
    }

    pub fn arc_length(&self) -> usize {
        self.arc_length
    }

    fn classify(center: i32, pixel: i32, threshold: i32) -> CornerType {
        if pixel > center + threshold {
            CornerType::Bright
        } else if pixel < center - threshold {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Segment-test score at `(x, y)`: summed excess over the threshold on the
    /// qualifying arc side, 0 if the pixel is not a corner.
    pub fn corner_score(&self, img: &ImageLevel, x: usize, y: usize, threshold: u8) -> u32 {
        let center = img.at(x, y) as i32;
        let threshold = threshold as i32;

        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        let mut bright_sum = 0u32;
        let mut dark_sum = 0u32;

        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let pixel = img.at(px, py) as i32;

            match Self::classify(center, pixel, threshold) {
                CornerType::Bright => {
                    bright_mask |= 1 << i;
                    bright_sum += (pixel - center - threshold) as u32;
                }
                CornerType::Dark => {
                    dark_mask |= 1 << i;
                    dark_sum += (center - pixel - threshold) as u32;
                }
                CornerType::None => {}
            }
        }

        let bright = has_consecutive_bits(bright_mask, self.arc_length);
        let dark = has_consecutive_bits(dark_mask, self.arc_length);
        match (bright, dark) {
            (true, true) => bright_sum.max(dark_sum),
            (true, false) => bright_sum,
            (false, true) => dark_sum,
            (false, false) => 0,
        }
    }

    /// Neighbours earlier in raster order must be strictly weaker, later ones weaker or equal,
    /// so a plateau of equal scores keeps exactly its first pixel.
    fn is_local_maximum(scores: &[u32], width: usize, x: usize, y: usize) -> bool {
        let score = scores[y * width + x];
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                let neighbour = scores[ny * width + nx];
                let earlier = dy < 0 || (dy == 0 && dx < 0);
                if (earlier && neighbour >= score) || (!earlier && neighbour > score) {
                    return false;
                }
            }
        }
        true
    }
}

impl CornerDetector for FastCornerDetector {
    fn margin(&self) -> usize {
        Self::RADIUS
    }

    /// Scores are also taken on a one-pixel ring around the window interior, wherever the
    /// circle still fits in the image, so suppression at a window edge sees the
    /// neighbouring window's pixels. Splitting a window therefore never adds corners.
    fn detect(&self, img: &ImageLevel, window: CellWindow, threshold: u8) -> Vec<Keypoint> {
        let m = Self::RADIUS;
        let (w, h) = (window.width(), window.height());
        if w < 2 * m + 1 || h < 2 * m + 1 {
            return Vec::new();
        }

        // score grid index (sx, sy) is window pixel (sx + m - 1, sy + m - 1)
        let (sw, sh) = (w - 2 * m + 2, h - 2 * m + 2);
        let mut scores = vec![0u32; sw * sh];
        for sy in 0..sh {
            let gy = window.y0 + m + sy - 1;
            if gy < m || gy + m >= img.height {
                continue;
            }
            for sx in 0..sw {
                let gx = window.x0 + m + sx - 1;
                if gx < m || gx + m >= img.width {
                    continue;
                }
                scores[sy * sw + sx] = self.corner_score(img, gx, gy, threshold);
            }
        }

        let mut corners = Vec::new();
        for sy in 1..sh - 1 {
            for sx in 1..sw - 1 {
                let score = scores[sy * sw + sx];
                if score > 0 && Self::is_local_maximum(&scores, sw, sx, sy) {
                    corners.push(Keypoint::new((sx + m - 1) as f32, (sy + m - 1) as f32, score as f32));
                }
            }
        }
        corners
    }
}

/// Check for at least `min_count` consecutive set bits in a circular 16-bit mask
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count == 0 || min_count > 16 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // A run of length n survives n-1 rotate-and-AND steps
    let mut test_mask = mask;
    for i in 1..min_count {
        test_mask &= mask.rotate_left(i as u32);
        if test_mask == 0 {
            return false;
        }
    }
    test_mask != 0
}
