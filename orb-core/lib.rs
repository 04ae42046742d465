#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

pub const DESCRIPTOR_BYTES: usize = 32;

/// Key-point ≙ detected corner + orientation (degrees) in level-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,        // Subpixel x coordinate
    pub y: f32,        // Subpixel y coordinate
    pub response: f32, // Corner strength
    pub angle: f32,    // Degrees in [0, 360)
    pub octave: usize, // Pyramid level
    pub size: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Self {
            x,
            y,
            response,
            angle: 0.0,
            octave: 0,
            size: 7.0,
        }
    }

    /// Copy of this keypoint with its position scaled into level-0 coordinates
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            x: self.x * scale,
            y: self.y * scale,
            size: self.size * scale,
            ..*self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageError {
    EmptyImage { width: usize, height: usize },
    DataLengthMismatch { expected_len: usize, actual_len: usize },
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::EmptyImage { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            ImageError::DataLengthMismatch { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
        }
    }
}

impl std::error::Error for ImageError {}

/// One layer of the image pyramid
#[derive(Debug, Clone)]
pub struct ImageLevel {
    pub data: Image,
    pub width: usize,
    pub height: usize,
    /// Pyramid index, 0 is the full-resolution image
    pub level: usize,
    /// Scale factor relative to level 0
    pub scale: f32,
}

impl ImageLevel {
    pub fn new(data: Image, width: usize, height: usize, level: usize, scale: f32) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage { width, height });
        }
        if data.len() != width * height {
            return Err(ImageError::DataLengthMismatch {
                expected_len: width * height,
                actual_len: data.len(),
            });
        }
        Ok(Self { data, width, height, level, scale })
    }

    /// Single-level pyramid around a full-resolution image
    pub fn base(data: Image, width: usize, height: usize) -> Result<Self, ImageError> {
        Self::new(data, width, height, 0, 1.0)
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Same geometry and tags, different pixels
    pub fn with_data(&self, data: Image) -> Result<Self, ImageError> {
        Self::new(data, self.width, self.height, self.level, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbConfig {
    /// Number of pyramid levels
    pub n_levels: usize,
    /// Scale ratio between consecutive levels
    pub scale_factor: f32,
    /// Total keypoint budget across all levels
    pub n_features: usize,
    /// Target edge length of a detection cell in pixels
    pub cell_size: f32,
    /// Border in pixels that no keypoint may enter
    pub padding: usize,
    /// FAST threshold for the first pass over a cell
    pub initial_threshold: u8,
    /// FAST threshold for the retry on a cell that produced nothing
    pub relaxed_threshold: u8,
    /// Radius of the intensity-centroid disk
    pub orientation_radius: usize,
    pub n_threads: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_levels: 8,
            scale_factor: 1.2,
            n_features: 1000,
            cell_size: 30.0,
            padding: 19,
            initial_threshold: 20,
            relaxed_threshold: 7,
            orientation_radius: 15,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Build a dedicated Rayon thread pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads.max(1))
        .thread_name(|i| format!("orb-level-{}", i))
        .build()
}
