use orb_core::{Descriptor, Keypoint};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of unique frame ids, shared by every extractor that creates frames
pub trait FrameIdSource: Send + Sync {
    fn next_id(&self) -> u64;
}

/// Monotonic counter starting at a given id
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first: u64) -> Self {
        Self { next: AtomicU64::new(first) }
    }
}

impl FrameIdSource for SequentialIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Keypoints of one pyramid level together with their descriptors, index for index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelFeatures {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl LevelFeatures {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Features extracted from one image.
///
/// Keypoints stay in level-local coordinates; `level_zero_keypoints` maps
/// copies back onto the full-resolution image.
#[derive(Debug, Clone)]
pub struct Frame {
    id: u64,
    timestamp: Instant,
    width: usize,
    height: usize,
    scale_factors: Vec<f32>,
    levels: Vec<LevelFeatures>,
}

impl Frame {
    pub fn new(
        ids: &dyn FrameIdSource,
        width: usize,
        height: usize,
        scale_factors: Vec<f32>,
        levels: Vec<LevelFeatures>,
    ) -> Self {
        Self {
            id: ids.next_id(),
            timestamp: Instant::now(),
            width,
            height,
            scale_factors,
            levels,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Size of the level-0 image
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn scale_factors(&self) -> &[f32] {
        &self.scale_factors
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[LevelFeatures] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&LevelFeatures> {
        self.levels.get(level)
    }

    pub fn features_per_level(&self) -> Vec<usize> {
        self.levels.iter().map(LevelFeatures::len).collect()
    }

    pub fn num_features(&self) -> usize {
        self.levels.iter().map(LevelFeatures::len).sum()
    }

    /// Every keypoint scaled into level-0 coordinates, level by level
    pub fn level_zero_keypoints(&self) -> Vec<Keypoint> {
        self.levels
            .iter()
            .flat_map(|level| level.keypoints.iter())
            .map(|kp| {
                let scale = self.scale_factors.get(kp.octave).copied().unwrap_or(1.0);
                kp.scaled(scale)
            })
            .collect()
    }

    /// Every descriptor, in the same order as `level_zero_keypoints`
    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.levels
            .iter()
            .flat_map(|level| level.descriptors.iter().copied())
            .collect()
    }
}
