use orb_core::OrbConfig;
use crate::config::{validate_config, ExtractorConfig};
use crate::error::FastResult;
use crate::grid::GridCornerDetector;

/// Fluent builder over `OrbConfig`
#[derive(Debug, Clone)]
pub struct ExtractorBuilder {
    config: OrbConfig,
    name: Option<String>,
    description: Option<String>,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: OrbConfig::default(),
            name: None,
            description: None,
        }
    }

    /// Number of pyramid levels
    pub fn levels(mut self, n_levels: usize) -> Self {
        self.config.n_levels = n_levels;
        self
    }

    /// Scale ratio between consecutive pyramid levels
    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.config.scale_factor = scale_factor;
        self
    }

    /// Total keypoint budget across all levels
    pub fn features(mut self, n_features: usize) -> Self {
        self.config.n_features = n_features;
        self
    }

    /// Target edge length of a detection cell
    pub fn cell_size(mut self, cell_size: f32) -> Self {
        self.config.cell_size = cell_size;
        self
    }

    pub fn padding(mut self, padding: usize) -> Self {
        self.config.padding = padding;
        self
    }

    /// FAST thresholds for the first pass and for the retry on empty cells
    pub fn thresholds(mut self, initial: u8, relaxed: u8) -> Self {
        self.config.initial_threshold = initial;
        self.config.relaxed_threshold = relaxed;
        self
    }

    pub fn orientation_radius(mut self, radius: usize) -> Self {
        self.config.orientation_radius = radius;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Apply the dense preset
    pub fn preset_dense(self) -> Self {
        Self::from_config(ExtractorConfig::dense_preset())
    }

    /// Apply the sparse preset
    pub fn preset_sparse(self) -> Self {
        Self::from_config(ExtractorConfig::sparse_preset())
    }

    /// Validate and build the grid detector
    pub fn build(self) -> FastResult<GridCornerDetector> {
        validate_config(&self.config)?;
        GridCornerDetector::new(&self.config)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        self.clone().to_config().summary()
    }

    /// Create a builder from an existing `ExtractorConfig`
    pub fn from_config(config: ExtractorConfig) -> Self {
        Self {
            config: config.core,
            name: config.name,
            description: config.description,
        }
    }

    /// Convert the builder into an `ExtractorConfig`
    pub fn to_config(self) -> ExtractorConfig {
        let has_metadata = self.name.is_some() || self.description.is_some();
        ExtractorConfig {
            core: self.config,
            name: self.name,
            description: self.description,
            version: has_metadata.then(|| "1.0".to_string()),
        }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }
}
