//! Detection half of the ORB front end: image pyramid, grid-adaptive FAST
//! corners and intensity-centroid orientation.

pub mod builder;
pub mod config;
pub mod corner_detection;
pub mod error;
pub mod grid;
pub mod orientation;
pub mod pyramid;
pub mod types;

pub use builder::ExtractorBuilder;
pub use config::{validate_config, ExtractorConfig, DESCRIPTOR_REACH};
pub use corner_detection::{has_consecutive_bits, CornerDetector, FastCornerDetector};
pub use error::{FastError, FastResult};
pub use grid::GridCornerDetector;
pub use orientation::OrientationEstimator;
pub use pyramid::ImagePyramid;
pub use types::{CellWindow, GridLayout};
