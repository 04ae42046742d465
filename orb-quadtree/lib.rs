//! Quadtree distribution: thins each level's raw corners down to roughly a
//! quota of spatially spread keypoints, one per leaf region.

pub mod node;
pub mod tree;

use orb_core::{ImageLevel, Keypoint};
use rayon::prelude::*;

pub use node::{Bounds, QuadNode};
pub use tree::QuadTree;

#[derive(Debug, Clone, PartialEq)]
pub enum QuadTreeError {
    EmptyImage { width: usize, height: usize },
    LevelCountMismatch { keypoint_levels: usize, quota_levels: usize, image_levels: usize },
}

impl std::fmt::Display for QuadTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadTreeError::EmptyImage { width, height } => {
                write!(f, "Cannot distribute keypoints over a {}x{} image", width, height)
            }
            QuadTreeError::LevelCountMismatch { keypoint_levels, quota_levels, image_levels } => {
                write!(
                    f,
                    "Level count mismatch: {} keypoint lists, {} quotas, {} images",
                    keypoint_levels, quota_levels, image_levels
                )
            }
        }
    }
}

impl std::error::Error for QuadTreeError {}

pub type QuadTreeResult<T> = Result<T, QuadTreeError>;

/// Pick at most about `quota` well-spread keypoints from `raw` on a `width x height` level.
///
/// The result can overshoot `quota` by the children of the last split and undershoots it
/// when the raw keypoints run out or share positions.
pub fn distribute(raw: &[Keypoint], quota: usize, width: usize, height: usize) -> QuadTreeResult<Vec<Keypoint>> {
    if width == 0 || height == 0 {
        return Err(QuadTreeError::EmptyImage { width, height });
    }
    if quota == 0 || raw.is_empty() {
        return Ok(Vec::new());
    }

    let mut tree = QuadTree::new(raw, width, height);
    tree.grow(quota);
    let chosen = tree.representatives();

    if chosen.len() < quota && raw.len() >= quota {
        log::warn!(
            "quadtree: kept {} of {} requested keypoints from {} candidates",
            chosen.len(), quota, raw.len()
        );
    } else {
        log::debug!("quadtree: kept {} of {} candidates (quota {})", chosen.len(), raw.len(), quota);
    }
    Ok(chosen)
}

/// `distribute` for every level of a pyramid, levels in parallel
pub fn distribute_levels(
    raw_per_level: &[Vec<Keypoint>],
    quotas: &[usize],
    levels: &[ImageLevel],
) -> QuadTreeResult<Vec<Vec<Keypoint>>> {
    if raw_per_level.len() != levels.len() || quotas.len() != levels.len() {
        return Err(QuadTreeError::LevelCountMismatch {
            keypoint_levels: raw_per_level.len(),
            quota_levels: quotas.len(),
            image_levels: levels.len(),
        });
    }

    raw_per_level
        .par_iter()
        .zip(quotas.par_iter())
        .zip(levels.par_iter())
        .map(|((raw, &quota), level)| distribute(raw, quota, level.width, level.height))
        .collect()
}
