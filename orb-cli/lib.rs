pub mod frame;

use orb_brief::{BriefError, DescriptorEncoder};
use orb_core::{build_thread_pool, Image, ImageError};
use orb_fast::{validate_config, FastError, GridCornerDetector, OrientationEstimator};
use orb_quadtree::QuadTreeError;
use rayon::prelude::*;
use std::sync::Arc;

pub use frame::{Frame, FrameIdSource, LevelFeatures, SequentialIds};
pub use orb_core::{Descriptor, ImageLevel, Keypoint, OrbConfig};
pub use orb_fast::{ExtractorBuilder, ExtractorConfig, ImagePyramid};

#[derive(Debug)]
pub enum OrbError {
    Image(ImageError),
    Fast(FastError),
    QuadTree(QuadTreeError),
    Brief(BriefError),
    ThreadPool(rayon::ThreadPoolBuildError),
    LevelCountMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for OrbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrbError::Image(e) => write!(f, "Image error: {}", e),
            OrbError::Fast(e) => write!(f, "Detection error: {}", e),
            OrbError::QuadTree(e) => write!(f, "Distribution error: {}", e),
            OrbError::Brief(e) => write!(f, "Descriptor error: {}", e),
            OrbError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
            OrbError::LevelCountMismatch { expected, actual } => {
                write!(f, "Expected {} pyramid levels, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for OrbError {}

impl From<ImageError> for OrbError {
    fn from(err: ImageError) -> Self {
        OrbError::Image(err)
    }
}

impl From<FastError> for OrbError {
    fn from(err: FastError) -> Self {
        OrbError::Fast(err)
    }
}

impl From<QuadTreeError> for OrbError {
    fn from(err: QuadTreeError) -> Self {
        OrbError::QuadTree(err)
    }
}

impl From<BriefError> for OrbError {
    fn from(err: BriefError) -> Self {
        OrbError::Brief(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for OrbError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        OrbError::ThreadPool(err)
    }
}

pub type OrbResult<T> = Result<T, OrbError>;

/// Full ORB front end: pyramid, grid detection, quadtree distribution,
/// orientation and descriptors, one rayon task per level.
pub struct OrbExtractor {
    config: OrbConfig,
    pyramid: ImagePyramid,
    detector: GridCornerDetector,
    orientation: OrientationEstimator,
    encoder: DescriptorEncoder,
    pool: rayon::ThreadPool,
    ids: Arc<dyn FrameIdSource>,
}

impl OrbExtractor {
    /// Create an extractor numbering its frames from 0
    pub fn new(cfg: OrbConfig) -> OrbResult<Self> {
        Self::with_id_source(cfg, Arc::new(SequentialIds::new()))
    }

    pub fn from_config(config: &ExtractorConfig) -> OrbResult<Self> {
        Self::new(config.core.clone())
    }

    /// Create an extractor drawing frame ids from a shared source
    pub fn with_id_source(cfg: OrbConfig, ids: Arc<dyn FrameIdSource>) -> OrbResult<Self> {
        validate_config(&cfg)?;

        let pyramid = ImagePyramid::new(cfg.n_levels, cfg.scale_factor, cfg.n_features)?;
        let detector = GridCornerDetector::new(&cfg)?;
        let orientation = OrientationEstimator::new(cfg.orientation_radius)?;
        let pool = build_thread_pool(cfg.n_threads)?;

        log::debug!(
            "extractor: {} levels, quotas {:?}, {} threads",
            cfg.n_levels,
            pyramid.features_per_level(),
            pool.current_num_threads()
        );

        Ok(Self {
            config: cfg,
            pyramid,
            detector,
            orientation,
            encoder: DescriptorEncoder::new(),
            pool,
            ids,
        })
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    pub fn pyramid(&self) -> &ImagePyramid {
        &self.pyramid
    }

    /// Build the pyramid for a full-resolution image and extract a frame from it
    pub fn extract(&self, img: &Image, width: usize, height: usize) -> OrbResult<Frame> {
        let levels = self.pool.install(|| self.pyramid.build(img, width, height))?;
        let features = self.extract_levels(&levels)?;
        Ok(Frame::new(
            self.ids.as_ref(),
            width,
            height,
            self.pyramid.scale_factors().to_vec(),
            features,
        ))
    }

    /// Run detect, distribute, orient and describe on a prepared pyramid
    pub fn extract_levels(&self, levels: &[ImageLevel]) -> OrbResult<Vec<LevelFeatures>> {
        let quotas = self.pyramid.features_per_level();
        if levels.len() != quotas.len() {
            return Err(OrbError::LevelCountMismatch { expected: quotas.len(), actual: levels.len() });
        }

        self.pool.install(|| {
            levels
                .par_iter()
                .zip(quotas.par_iter())
                .map(|(level, &quota)| self.process_level(level, quota))
                .collect()
        })
    }

    fn process_level(&self, level: &ImageLevel, quota: usize) -> OrbResult<LevelFeatures> {
        let raw = self.detector.extract_level(level);
        let mut keypoints = orb_quadtree::distribute(&raw, quota, level.width, level.height)?;
        self.orientation.compute_level(level, &mut keypoints)?;
        let descriptors = self.encoder.compute_level(level, &keypoints)?;

        log::debug!(
            "level {}: {} raw corners -> {} keypoints (quota {})",
            level.level,
            raw.len(),
            keypoints.len(),
            quota
        );
        Ok(LevelFeatures { keypoints, descriptors })
    }
}
