use orb_core::{ImageLevel, Keypoint};
use crate::error::{FastError, FastResult};
use rayon::prelude::*;

/// Intensity-centroid orientation over a circular patch.
///
/// The patch is the disk of radius `radius` around the rounded keypoint
/// position; `u_max[v]` is the half-width of the disk on row offset `v`.
#[derive(Debug, Clone)]
pub struct OrientationEstimator {
    radius: usize,
    u_max: Vec<usize>,
}

impl OrientationEstimator {
    pub fn new(radius: usize) -> FastResult<Self> {
        if radius == 0 {
            return Err(FastError::InvalidRadius(radius));
        }
        Ok(Self { radius, u_max: Self::build_u_max(radius) })
    }

    /// Half-widths of a symmetric digital disk.
    ///
    /// The lower rows come straight from the circle equation, the upper rows
    /// mirror them so the table is symmetric about the 45 degree diagonal.
    fn build_u_max(radius: usize) -> Vec<usize> {
        let r = radius as f64;
        let r2 = r * r;
        let vmax = (r * std::f64::consts::SQRT_2 / 2.0 + 1.0).floor() as usize;
        let vmin = (r * std::f64::consts::SQRT_2 / 2.0).ceil() as usize;

        let mut u_max = vec![0usize; radius + 1];
        for (v, u) in u_max.iter_mut().enumerate().take(vmax.min(radius) + 1) {
            *u = (r2 - (v * v) as f64).sqrt().round() as usize;
        }

        let mut v0 = 0usize;
        let mut v = radius;
        while v >= vmin {
            while u_max[v0] == u_max[v0 + 1] {
                v0 += 1;
            }
            u_max[v] = v0;
            v0 += 1;
            if v == 0 {
                break;
            }
            v -= 1;
        }
        u_max
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn u_max(&self) -> &[usize] {
        &self.u_max
    }

    /// Dominant orientation of `kp` in degrees, in `[0, 360)`
    pub fn orientation(&self, level: &ImageLevel, kp: &Keypoint) -> FastResult<f32> {
        let r = self.radius as i64;
        let cx = kp.x.round_ties_even() as i64;
        let cy = kp.y.round_ties_even() as i64;
        if cx < r || cy < r || cx + r >= level.width as i64 || cy + r >= level.height as i64 {
            return Err(FastError::PatchOutOfBounds { x: kp.x, y: kp.y, radius: self.radius });
        }

        let (cx, cy) = (cx as usize, cy as usize);
        let pixel = |x: usize, y: usize| level.at(x, y) as i64;

        // centre row contributes to m10 only
        let mut m10: i64 = 0;
        let mut m01: i64 = 0;
        let half = self.u_max[0];
        for x in cx - half..=cx + half {
            m10 += (x as i64 - cx as i64) * pixel(x, cy);
        }

        // rows +v and -v share u and fold into one pass
        for v in 1..=self.radius {
            let half = self.u_max[v];
            let mut v_sum: i64 = 0;
            for x in cx - half..=cx + half {
                let u = x as i64 - cx as i64;
                let below = pixel(x, cy + v);
                let above = pixel(x, cy - v);
                v_sum += below - above;
                m10 += u * (below + above);
            }
            m01 += v as i64 * v_sum;
        }

        let angle = (m01 as f64).atan2(m10 as f64).to_degrees().rem_euclid(360.0) as f32;
        // rem_euclid can round up to exactly 360 for tiny negative angles
        Ok(if angle >= 360.0 { 0.0 } else { angle })
    }

    /// Sets the angle of every keypoint on one level in place
    pub fn compute_level(&self, level: &ImageLevel, keypoints: &mut [Keypoint]) -> FastResult<()> {
        for kp in keypoints.iter_mut() {
            kp.angle = self.orientation(level, kp)?;
        }
        log::trace!("level {}: oriented {} keypoints", level.level, keypoints.len());
        Ok(())
    }

    /// Orients all levels in parallel; `keypoints[i]` belongs to `levels[i]`
    pub fn compute(&self, keypoints: &mut [Vec<Keypoint>], levels: &[ImageLevel]) -> FastResult<()> {
        if keypoints.len() != levels.len() {
            return Err(FastError::LevelCountMismatch {
                keypoint_levels: keypoints.len(),
                image_levels: levels.len(),
            });
        }
        keypoints
            .par_iter_mut()
            .zip(levels.par_iter())
            .try_for_each(|(kps, level)| self.compute_level(level, kps))
    }
}
