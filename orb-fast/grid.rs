use orb_core::{ImageLevel, Keypoint, OrbConfig};
use crate::corner_detection::{CornerDetector, FastCornerDetector};
use crate::error::{FastError, FastResult};
use crate::types::GridLayout;
use rayon::prelude::*;

/// Grid-adaptive corner detector: tiles each level into near-square cells and
/// relaxes the threshold on cells that come back empty.
#[derive(Debug, Clone)]
pub struct GridCornerDetector<D: CornerDetector = FastCornerDetector> {
    detector: D,
    cell_size: f32,
    padding: usize,
    initial_threshold: u8,
    relaxed_threshold: u8,
}

impl GridCornerDetector<FastCornerDetector> {
    /// Creates a grid detector backed by FAST-9
    pub fn new(cfg: &OrbConfig) -> FastResult<Self> {
        Self::with_detector(cfg, FastCornerDetector::default())
    }
}

impl<D: CornerDetector> GridCornerDetector<D> {
    /// Creates a grid detector around any corner primitive, with validation
    pub fn with_detector(cfg: &OrbConfig, detector: D) -> FastResult<Self> {
        for threshold in [cfg.initial_threshold, cfg.relaxed_threshold] {
            // 0 would accept every pixel, >127 overflows the segment test's signed range
            if threshold == 0 || threshold > 127 {
                return Err(FastError::InvalidThreshold(threshold));
            }
        }
        if cfg.relaxed_threshold > cfg.initial_threshold {
            return Err(FastError::InvalidThresholdOrder {
                initial: cfg.initial_threshold,
                relaxed: cfg.relaxed_threshold,
            });
        }
        if !cfg.cell_size.is_finite() || cfg.cell_size < 1.0 {
            return Err(FastError::InvalidCellSize(cfg.cell_size));
        }
        if cfg.padding < detector.margin() {
            return Err(FastError::InvalidPadding {
                padding: cfg.padding,
                required: detector.margin(),
            });
        }

        Ok(Self {
            detector,
            cell_size: cfg.cell_size,
            padding: cfg.padding,
            initial_threshold: cfg.initial_threshold,
            relaxed_threshold: cfg.relaxed_threshold,
        })
    }

    /// Grid over the interior of a `width x height` level, `None` if no corner can fit
    pub fn layout(&self, width: usize, height: usize) -> Option<GridLayout> {
        let margin = self.detector.margin();
        let min_extent = 2 * margin + 1;

        let min_border = self.padding - margin;
        let max_border_x = (width + margin).checked_sub(self.padding)?;
        let max_border_y = (height + margin).checked_sub(self.padding)?;

        let region_w = max_border_x.checked_sub(min_border)?;
        let region_h = max_border_y.checked_sub(min_border)?;
        if region_w < min_extent || region_h < min_extent {
            return None;
        }

        let cols = ((region_w as f32 / self.cell_size) as usize).max(1);
        let rows = ((region_h as f32 / self.cell_size) as usize).max(1);

        Some(GridLayout {
            min_border,
            max_border_x,
            max_border_y,
            cols,
            rows,
            cell_width: (region_w as f32 / cols as f32).ceil() as usize,
            cell_height: (region_h as f32 / rows as f32).ceil() as usize,
            overlap: 2 * margin,
        })
    }

    /// Detect corners on one level, in level-local coordinates
    pub fn extract_level(&self, level: &ImageLevel) -> Vec<Keypoint> {
        let Some(layout) = self.layout(level.width, level.height) else {
            log::debug!(
                "level {}: {}x{} leaves no room inside padding {}",
                level.level, level.width, level.height, self.padding
            );
            return Vec::new();
        };

        let min_extent = 2 * self.detector.margin() + 1;
        let mut keypoints = Vec::new();

        for row in 0..layout.rows {
            for col in 0..layout.cols {
                let Some(window) = layout.cell(row, col, min_extent) else {
                    continue;
                };

                let mut corners = self.detector.detect(level, window, self.initial_threshold);
                if corners.is_empty() {
                    log::trace!("level {} cell ({}, {}): retrying at threshold {}", level.level, row, col, self.relaxed_threshold);
                    corners = self.detector.detect(level, window, self.relaxed_threshold);
                }

                // cell-local -> region-local -> level-local
                let offset_x = (col * layout.cell_width + layout.min_border) as f32;
                let offset_y = (row * layout.cell_height + layout.min_border) as f32;
                keypoints.extend(corners.into_iter().map(|mut kp| {
                    kp.x += offset_x;
                    kp.y += offset_y;
                    kp.octave = level.level;
                    kp
                }));
            }
        }

        log::debug!(
            "level {}: {} corners over a {}x{} grid",
            level.level, keypoints.len(), layout.cols, layout.rows
        );
        keypoints
    }

    /// Detect corners on every level, one task per level
    pub fn extract(&self, levels: &[ImageLevel]) -> Vec<Vec<Keypoint>> {
        levels.par_iter().map(|level| self.extract_level(level)).collect()
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn thresholds(&self) -> (u8, u8) {
        (self.initial_threshold, self.relaxed_threshold)
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellWindow;
    use proptest::prelude::*;
    use std::sync::Mutex;

    fn create_test_config() -> OrbConfig {
        OrbConfig {
            n_levels: 1,
            n_threads: 1,
            ..OrbConfig::default()
        }
    }

    fn square_level(width: usize, height: usize, cx: usize, cy: usize, half: usize, level: usize) -> ImageLevel {
        let mut data = vec![50u8; width * height];
        for y in cy - half..=cy + half {
            for x in cx - half..=cx + half {
                data[y * width + x] = 255;
            }
        }
        ImageLevel::new(data, width, height, level, 1.0).unwrap()
    }

    /// Deterministic textured image from a seed
    fn noise_level(width: usize, height: usize, seed: u64) -> ImageLevel {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (state >> 56) as u8
            })
            .collect();
        ImageLevel::base(data, width, height).unwrap()
    }

    /// Records every threshold it is asked for, finds nothing
    struct RecordingDetector {
        calls: Mutex<Vec<u8>>,
    }

    impl CornerDetector for RecordingDetector {
        fn margin(&self) -> usize {
            3
        }

        fn detect(&self, _img: &ImageLevel, _window: CellWindow, threshold: u8) -> Vec<Keypoint> {
            self.calls.lock().unwrap().push(threshold);
            Vec::new()
        }
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut cfg = create_test_config();
        cfg.initial_threshold = 0;
        assert!(matches!(GridCornerDetector::new(&cfg), Err(FastError::InvalidThreshold(0))));

        let mut cfg = create_test_config();
        cfg.relaxed_threshold = 200;
        assert!(matches!(GridCornerDetector::new(&cfg), Err(FastError::InvalidThreshold(200))));

        let mut cfg = create_test_config();
        cfg.initial_threshold = 5;
        cfg.relaxed_threshold = 9;
        assert!(matches!(
            GridCornerDetector::new(&cfg),
            Err(FastError::InvalidThresholdOrder { initial: 5, relaxed: 9 })
        ));
    }

    #[test]
    fn test_invalid_geometry() {
        let mut cfg = create_test_config();
        cfg.cell_size = 0.0;
        assert!(matches!(GridCornerDetector::new(&cfg), Err(FastError::InvalidCellSize(_))));

        let mut cfg = create_test_config();
        cfg.padding = 2;
        assert!(matches!(
            GridCornerDetector::new(&cfg),
            Err(FastError::InvalidPadding { padding: 2, required: 3 })
        ));
    }

    #[test]
    fn test_layout_default_config() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let layout = grid.layout(640, 480).unwrap();
        assert_eq!(layout.min_border, 16);
        assert_eq!(layout.max_border_x, 624);
        assert_eq!(layout.max_border_y, 464);
        assert_eq!(layout.cols, 20);
        assert_eq!(layout.rows, 14);
        assert_eq!(layout.cell_width, 31);
        assert_eq!(layout.cell_height, 32);
    }

    #[test]
    fn test_layout_small_image() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        // region narrower than one cell still gets a single column
        let layout = grid.layout(64, 64).unwrap();
        assert_eq!((layout.cols, layout.rows), (1, 1));
        assert_eq!(layout.cell_width, 32);
        // nothing fits inside the padding
        assert!(grid.layout(30, 30).is_none());
        assert!(grid.layout(10, 400).is_none());
    }

    #[test]
    fn test_flat_image_yields_empty_list() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let level = ImageLevel::base(vec![90; 100 * 100], 100, 100).unwrap();
        assert!(grid.extract_level(&level).is_empty());
    }

    #[test]
    fn test_square_detected_in_level_coordinates() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let level = square_level(64, 64, 32, 32, 2, 0);
        let keypoints = grid.extract_level(&level);
        assert!(!keypoints.is_empty());
        for kp in &keypoints {
            assert!((kp.x - 32.0).abs() <= 3.0 && (kp.y - 32.0).abs() <= 3.0, "({}, {})", kp.x, kp.y);
            assert_eq!(kp.octave, 0);
        }
    }

    #[test]
    fn test_octave_is_stamped() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let level = square_level(80, 80, 40, 40, 3, 4);
        let keypoints = grid.extract_level(&level);
        assert!(!keypoints.is_empty());
        assert!(keypoints.iter().all(|kp| kp.octave == 4));
    }

    #[test]
    fn test_relaxed_threshold_retry() {
        // contrast 30: invisible at 40, visible at 10
        let mut data = vec![100u8; 64 * 64];
        for y in 30..=34 {
            for x in 30..=34 {
                data[y * 64 + x] = 130;
            }
        }
        let level = ImageLevel::base(data, 64, 64).unwrap();

        let mut cfg = create_test_config();
        cfg.initial_threshold = 40;
        cfg.relaxed_threshold = 40;
        assert!(GridCornerDetector::new(&cfg).unwrap().extract_level(&level).is_empty());

        cfg.relaxed_threshold = 10;
        assert!(!GridCornerDetector::new(&cfg).unwrap().extract_level(&level).is_empty());
    }

    #[test]
    fn test_retry_uses_distinct_threshold() {
        let recorder = RecordingDetector { calls: Mutex::new(Vec::new()) };
        let grid = GridCornerDetector::with_detector(&create_test_config(), recorder).unwrap();
        let level = ImageLevel::base(vec![0; 64 * 64], 64, 64).unwrap();
        grid.extract_level(&level);
        let calls = grid.detector().calls.lock().unwrap().clone();
        assert_eq!(calls, vec![20, 7]);
    }

    #[test]
    fn test_extract_all_levels() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let levels = vec![
            square_level(64, 64, 32, 32, 2, 0),
            ImageLevel::new(vec![10; 40 * 40], 40, 40, 1, 1.2).unwrap(),
        ];
        let per_level = grid.extract(&levels);
        assert_eq!(per_level.len(), 2);
        assert!(!per_level[0].is_empty());
        assert!(per_level[1].is_empty());
    }

    #[test]
    fn test_no_duplicates_across_cells() {
        let grid = GridCornerDetector::new(&create_test_config()).unwrap();
        let level = noise_level(200, 150, 7);
        let keypoints = grid.extract_level(&level);
        assert!(!keypoints.is_empty());
        let mut positions: Vec<(i64, i64)> = keypoints.iter().map(|kp| (kp.x as i64, kp.y as i64)).collect();
        positions.sort_unstable();
        let before = positions.len();
        positions.dedup();
        assert_eq!(before, positions.len());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_keypoints_respect_padding(
            width in 20usize..140,
            height in 20usize..140,
            padding in 3usize..30,
            cell_size in 5.0f32..50.0,
            seed in any::<u64>(),
        ) {
            let cfg = OrbConfig { padding, cell_size, ..create_test_config() };
            let grid = GridCornerDetector::new(&cfg).unwrap();
            let level = noise_level(width, height, seed);
            for kp in grid.extract_level(&level) {
                prop_assert!(kp.x >= padding as f32 && kp.y >= padding as f32);
                prop_assert!(kp.x <= (width - padding - 1) as f32);
                prop_assert!(kp.y <= (height - padding - 1) as f32);
            }
        }
    }
}
