use crate::core::batch::DEFAULT_BATCH_THRESHOLD;
use crate::types::{IndexType, SadarError, SadarResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where derived artifacts go and which extensions they get
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output folder; nothing is written until one is set
    pub output_dir: Option<PathBuf>,
    pub raster_extension: String,
    pub image_extension: String,
    pub report_extension: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            raster_extension: "tiff".to_string(),
            image_extension: "png".to_string(),
            report_extension: "txt".to_string(),
        }
    }
}

/// Thresholds and export settings for a processing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    pub ndsi_threshold: f64,
    pub ndwi_threshold: f64,
    pub ndvi_threshold: f64,
    /// Single threshold used for all three indices in batch mode
    pub batch_threshold: f64,
    pub export: ExportConfig,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            ndsi_threshold: IndexType::Ndsi.default_threshold(),
            ndwi_threshold: IndexType::Ndwi.default_threshold(),
            ndvi_threshold: IndexType::Ndvi.default_threshold(),
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            export: ExportConfig::default(),
        }
    }
}

impl ProcessingConfig {
    /// Threshold a single-index run starts from
    pub fn threshold_for(&self, index_type: IndexType) -> f64 {
        match index_type {
            IndexType::Ndsi => self.ndsi_threshold,
            IndexType::Ndwi => self.ndwi_threshold,
            IndexType::Ndvi => self.ndvi_threshold,
        }
    }

    pub fn from_json_str(json: &str) -> SadarResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SadarError::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> SadarResult<Self> {
        log::info!("Loading configuration: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> SadarResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SadarError::Config(format!("Failed to serialize configuration: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Thresholds must be finite; extensions must be non-empty
    pub fn validate(&self) -> SadarResult<()> {
        let thresholds = [
            ("ndsi_threshold", self.ndsi_threshold),
            ("ndwi_threshold", self.ndwi_threshold),
            ("ndvi_threshold", self.ndvi_threshold),
            ("batch_threshold", self.batch_threshold),
        ];
        if let Some((name, value)) = thresholds.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SadarError::Config(format!("{} must be finite, got {}", name, value)));
        }

        let extensions = [
            &self.export.raster_extension,
            &self.export.image_extension,
            &self.export.report_extension,
        ];
        if extensions.iter().any(|e| e.trim().is_empty()) {
            return Err(SadarError::Config("File extensions must not be empty".to_string()));
        }
        Ok(())
    }
}
