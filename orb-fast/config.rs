use orb_core::OrbConfig;
use crate::builder::ExtractorBuilder;
use crate::corner_detection::FastCornerDetector;
use crate::error::{FastError, FastResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixels the descriptor pattern reaches from a keypoint after any rotation.
///
/// Mirrors `orb_brief::PATTERN_REACH`; kept here so the extractor
/// configuration can be validated without depending on the descriptor crate.
/// `orb-cli`'s `test_padding_rule_tracks_pattern_reach` fails if the two drift apart.
pub const DESCRIPTOR_REACH: usize = 18;

/// Complete extractor configuration with optional metadata
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractorConfig {
    /// Core ORB configuration
    pub core: OrbConfig,
    /// Metadata
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub description: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub version: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorConfig {
    pub fn new() -> Self {
        Self {
            core: OrbConfig::default(),
            name: None,
            description: None,
            version: None,
        }
    }

    /// Many small cells and a generous budget, for texture-poor scenes
    pub fn dense_preset() -> Self {
        Self {
            core: OrbConfig {
                n_features: 2000,
                cell_size: 20.0,
                initial_threshold: 15,
                relaxed_threshold: 5,
                ..OrbConfig::default()
            },
            name: Some("Dense".to_string()),
            description: Some("Small cells and a large budget for low-texture scenes".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Fewer levels and a small budget, for fast tracking
    pub fn sparse_preset() -> Self {
        Self {
            core: OrbConfig {
                n_levels: 4,
                n_features: 500,
                cell_size: 40.0,
                initial_threshold: 25,
                relaxed_threshold: 10,
                ..OrbConfig::default()
            },
            name: Some("Sparse".to_string()),
            description: Some("Coarse grid and small budget for fast tracking".to_string()),
            version: Some("1.0".to_string()),
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self.version = Some("1.0".to_string());
        self
    }

    /// Convert to ExtractorBuilder for further customization
    pub fn to_builder(self) -> ExtractorBuilder {
        ExtractorBuilder::from_config(self)
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        let c = &self.core;
        format!(
            "ExtractorConfig{}: levels={} x{:.2}, features={}, cell={:.0}px, padding={}, thresholds={}/{}, radius={}, threads={}",
            self.name.as_deref().map(|n| format!(" [{}]", n)).unwrap_or_default(),
            c.n_levels, c.scale_factor, c.n_features, c.cell_size, c.padding,
            c.initial_threshold, c.relaxed_threshold, c.orientation_radius, c.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> FastResult<()> {
        validate_config(&self.core)
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

/// Checks every field of an `OrbConfig` against what the pipeline stages require
pub fn validate_config(cfg: &OrbConfig) -> FastResult<()> {
    if cfg.n_levels == 0 {
        return Err(FastError::InvalidLevelCount(cfg.n_levels));
    }
    if !cfg.scale_factor.is_finite() || cfg.scale_factor < 1.0 {
        return Err(FastError::InvalidScaleFactor(cfg.scale_factor));
    }
    if !cfg.cell_size.is_finite() || cfg.cell_size < 1.0 {
        return Err(FastError::InvalidCellSize(cfg.cell_size));
    }
    for threshold in [cfg.initial_threshold, cfg.relaxed_threshold] {
        if threshold == 0 || threshold > 127 {
            return Err(FastError::InvalidThreshold(threshold));
        }
    }
    if cfg.relaxed_threshold > cfg.initial_threshold {
        return Err(FastError::InvalidThresholdOrder {
            initial: cfg.initial_threshold,
            relaxed: cfg.relaxed_threshold,
        });
    }
    if cfg.orientation_radius == 0 {
        return Err(FastError::InvalidRadius(cfg.orientation_radius));
    }

    // every detected keypoint must leave room for the orientation disk and the descriptor pattern
    let required = FastCornerDetector::RADIUS
        .max(cfg.orientation_radius)
        .max(DESCRIPTOR_REACH);
    if cfg.padding < required {
        return Err(FastError::InvalidPadding { padding: cfg.padding, required });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExtractorConfig::new().validate().is_ok());
        assert!(ExtractorConfig::dense_preset().validate().is_ok());
        assert!(ExtractorConfig::sparse_preset().validate().is_ok());
    }

    #[test]
    fn test_padding_must_cover_orientation_disk() {
        let mut config = ExtractorConfig::new();
        config.core.orientation_radius = 20;
        assert!(matches!(
            config.validate(),
            Err(FastError::InvalidPadding { padding: 19, required: 20 })
        ));
        config.core.padding = 20;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_padding_must_cover_descriptor_pattern() {
        let mut config = ExtractorConfig::new();
        config.core.padding = 17;
        assert!(matches!(
            config.validate(),
            Err(FastError::InvalidPadding { padding: 17, required: 18 })
        ));
    }

    #[test]
    fn test_invalid_fields() {
        let mut config = ExtractorConfig::new();
        config.core.n_levels = 0;
        assert!(matches!(config.validate(), Err(FastError::InvalidLevelCount(0))));

        let mut config = ExtractorConfig::new();
        config.core.scale_factor = 0.9;
        assert!(matches!(config.validate(), Err(FastError::InvalidScaleFactor(_))));

        let mut config = ExtractorConfig::new();
        config.core.relaxed_threshold = 30;
        assert!(matches!(config.validate(), Err(FastError::InvalidThresholdOrder { .. })));

        let mut config = ExtractorConfig::new();
        config.core.orientation_radius = 0;
        assert!(matches!(config.validate(), Err(FastError::InvalidRadius(0))));
    }

    #[test]
    fn test_summary_and_metadata() {
        let config = ExtractorConfig::new().with_metadata("Indoor", "Office sequences");
        let summary = config.summary();
        assert!(summary.contains("[Indoor]"));
        assert!(summary.contains("features=1000"));
        assert!(summary.contains("thresholds=20/7"));
        assert_eq!(config.version.as_deref(), Some("1.0"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let config = ExtractorConfig::sparse_preset();
        let json = config.to_json().unwrap();
        assert!(json.contains("\"n_levels\": 4"));
        assert_eq!(ExtractorConfig::from_json(&json).unwrap(), config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_rejects_invalid() {
        let mut config = ExtractorConfig::new();
        config.core.padding = 5;
        let toml_str = config.to_toml().unwrap();
        assert!(ExtractorConfig::from_toml(&toml_str).is_err());
    }
}
