use orb_core::{Image, ImageLevel};
use crate::error::{FastError, FastResult};

/// Scale-space layout: level sizes, scale factors and the keypoint budget per level
#[derive(Debug, Clone)]
pub struct ImagePyramid {
    scale_factor: f32,
    scale_factors: Vec<f32>,
    features_per_level: Vec<usize>,
}

impl ImagePyramid {
    pub fn new(n_levels: usize, scale_factor: f32, n_features: usize) -> FastResult<Self> {
        if n_levels == 0 {
            return Err(FastError::InvalidLevelCount(n_levels));
        }
        if !scale_factor.is_finite() || scale_factor < 1.0 {
            return Err(FastError::InvalidScaleFactor(scale_factor));
        }

        let scale_factors = (0..n_levels).map(|i| scale_factor.powi(i as i32)).collect();

        Ok(Self {
            scale_factor,
            scale_factors,
            features_per_level: Self::distribute_features(n_levels, scale_factor, n_features),
        })
    }

    /// Geometric split of the budget: each level gets `1 / scale_factor` of the previous one,
    /// the last level absorbs the rounding remainder.
    fn distribute_features(n_levels: usize, scale_factor: f32, n_features: usize) -> Vec<usize> {
        if n_levels == 1 {
            return vec![n_features];
        }

        let factor = 1.0 / scale_factor as f64;
        let mut per_level = Vec::with_capacity(n_levels);

        if (1.0 - factor).abs() < f64::EPSILON {
            let share = n_features / n_levels;
            per_level.resize(n_levels - 1, share);
        } else {
            let mut desired = n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(n_levels as i32));
            for _ in 0..n_levels - 1 {
                per_level.push(desired.round() as usize);
                desired *= factor;
            }
        }

        let assigned: usize = per_level.iter().sum();
        per_level.push(n_features.saturating_sub(assigned));
        per_level
    }

    pub fn n_levels(&self) -> usize {
        self.scale_factors.len()
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// `scale_factor^i` for every level `i`
    pub fn scale_factors(&self) -> &[f32] {
        &self.scale_factors
    }

    pub fn features_per_level(&self) -> &[usize] {
        &self.features_per_level
    }

    /// Dimensions of every level for a `width x height` base image
    pub fn level_sizes(&self, width: usize, height: usize) -> Vec<(usize, usize)> {
        self.scale_factors
            .iter()
            .map(|&s| {
                // never 0 px: a level too small to detect on stays valid and yields nothing
                (
                    ((width as f32 / s).round() as usize).max(1),
                    ((height as f32 / s).round() as usize).max(1),
                )
            })
            .collect()
    }

    /// Build every level from the full-resolution image
    pub fn build(&self, img: &Image, width: usize, height: usize) -> FastResult<Vec<ImageLevel>> {
        let base = ImageLevel::base(img.clone(), width, height)?;
        let mut levels = Vec::with_capacity(self.n_levels());

        for (i, (w, h)) in self.level_sizes(width, height).into_iter().enumerate() {
            let level = if i == 0 {
                base.clone()
            } else {
                let data = Self::downsample_image(&base, w, h)?;
                ImageLevel::new(data, w, h, i, self.scale_factors[i])?
            };
            levels.push(level);
        }

        log::debug!(
            "pyramid: {} levels from {}x{} down to {}x{}",
            levels.len(),
            width,
            height,
            levels.last().map_or(0, |l| l.width),
            levels.last().map_or(0, |l| l.height)
        );
        Ok(levels)
    }

    /// Downsample image using bilinear interpolation
    fn downsample_image(src: &ImageLevel, target_width: usize, target_height: usize) -> FastResult<Image> {
        if target_width == 0 || target_height == 0 {
            return Err(FastError::InvalidImageSize { width: target_width, height: target_height });
        }

        let mut downsampled = vec![0u8; target_width * target_height];
        let x_ratio = src.width as f32 / target_width as f32;
        let y_ratio = src.height as f32 / target_height as f32;

        for y in 0..target_height {
            for x in 0..target_width {
                let value = Self::bilinear_sample(src, x as f32 * x_ratio, y as f32 * y_ratio);
                downsampled[y * target_width + x] = value.round().clamp(0.0, 255.0) as u8;
            }
        }

        Ok(downsampled)
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &ImageLevel, x: f32, y: f32) -> f32 {
        let x1 = (x.floor() as usize).min(img.width - 1);
        let y1 = (y.floor() as usize).min(img.height - 1);
        let x2 = (x1 + 1).min(img.width - 1);
        let y2 = (y1 + 1).min(img.height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let top = img.at(x1, y1) as f32 * (1.0 - fx) + img.at(x2, y1) as f32 * fx;
        let bottom = img.at(x1, y2) as f32 * (1.0 - fx) + img.at(x2, y2) as f32 * fx;

        top * (1.0 - fy) + bottom * fy
    }
}
