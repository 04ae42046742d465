use orb_core::ImageLevel;
use rayon::prelude::*;

/// 7-tap Gaussian, sigma 2, scaled to sum to 256
pub const KERNEL: [u32; 7] = [18, 33, 49, 56, 49, 33, 18];

pub const KERNEL_RADIUS: usize = 3;

/// Border index mirrored without repeating the edge pixel (`dcb|abcd|cba`)
#[inline]
pub fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let m = i.rem_euclid(period);
    (if m < n { m } else { period - m }) as usize
}

/// Separable 7x7 Gaussian blur in integer arithmetic.
///
/// Both passes accumulate exactly and the result is rounded once, so the
/// output does not depend on pass order and commutes with 90 degree rotations.
pub fn gaussian_blur(level: &ImageLevel) -> ImageLevel {
    let (w, h) = (level.width, level.height);
    let r = KERNEL_RADIUS as isize;

    let mut horizontal = vec![0u32; w * h];
    horizontal
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, out_row)| {
            let row = level.row(y);
            for (x, out) in out_row.iter_mut().enumerate() {
                *out = KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, &weight)| weight * row[reflect_101(x as isize + k as isize - r, w)] as u32)
                    .sum();
            }
        });

    let mut data = vec![0u8; w * h];
    data.par_chunks_mut(w).enumerate().for_each(|(y, out_row)| {
        for (x, out) in out_row.iter_mut().enumerate() {
            let acc: u32 = KERNEL
                .iter()
                .enumerate()
                .map(|(k, &weight)| weight * horizontal[reflect_101(y as isize + k as isize - r, h) * w + x])
                .sum();
            *out = ((acc + (1 << 15)) >> 16) as u8;
        }
    });

    ImageLevel {
        data,
        width: w,
        height: h,
        level: level.level,
        scale: level.scale,
    }
}
