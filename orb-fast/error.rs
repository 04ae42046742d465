use orb_core::ImageError;

#[derive(Debug, Clone, PartialEq)]
pub enum FastError {
    InvalidImageSize { width: usize, height: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidThreshold(u8),
    InvalidThresholdOrder { initial: u8, relaxed: u8 },
    InvalidCellSize(f32),
    InvalidPadding { padding: usize, required: usize },
    InvalidRadius(usize),
    InvalidScaleFactor(f32),
    InvalidLevelCount(usize),
    LevelCountMismatch { keypoint_levels: usize, image_levels: usize },
    PatchOutOfBounds { x: f32, y: f32, radius: usize },
}

impl std::fmt::Display for FastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FastError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            FastError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            FastError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be 1-127)", t)
            }
            FastError::InvalidThresholdOrder { initial, relaxed } => {
                write!(f, "Relaxed threshold {} must not exceed initial threshold {}", relaxed, initial)
            }
            FastError::InvalidCellSize(size) => {
                write!(f, "Invalid cell size: {} (must be finite and >= 1)", size)
            }
            FastError::InvalidPadding { padding, required } => {
                write!(f, "Padding {} too small (need at least {})", padding, required)
            }
            FastError::InvalidRadius(r) => {
                write!(f, "Invalid orientation radius: {} (must be > 0)", r)
            }
            FastError::InvalidScaleFactor(s) => {
                write!(f, "Invalid scale factor: {} (must be finite and >= 1.0)", s)
            }
            FastError::InvalidLevelCount(n) => {
                write!(f, "Invalid pyramid level count: {} (must be > 0)", n)
            }
            FastError::LevelCountMismatch { keypoint_levels, image_levels } => {
                write!(f, "Got keypoints for {} levels but {} images", keypoint_levels, image_levels)
            }
            FastError::PatchOutOfBounds { x, y, radius } => {
                write!(f, "Keypoint ({:.1}, {:.1}) closer than {} px to the image border", x, y, radius)
            }
        }
    }
}

impl std::error::Error for FastError {}

impl From<ImageError> for FastError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::EmptyImage { width, height } => FastError::InvalidImageSize { width, height },
            ImageError::DataLengthMismatch { expected_len, actual_len } => {
                FastError::InvalidImageData { expected_len, actual_len }
            }
        }
    }
}

pub type FastResult<T> = Result<T, FastError>;
