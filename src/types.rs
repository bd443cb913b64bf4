use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Single spectral band as read from a raster (rows x cols), NaN marks no-data
pub type RasterBand = Array2<f64>;

/// Normalized-difference values in [-1, 1] or NaN
pub type IndexGrid = Array2<f64>;

/// Stacked index grids (band x rows x cols)
pub type IndexCube = Array3<f64>;

/// Supported normalized-difference indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    /// Normalized Difference Snow Index: (Green - SWIR) / (Green + SWIR)
    #[serde(rename = "NDSI")]
    Ndsi,
    /// Normalized Difference Water Index: (Green - NIR) / (Green + NIR)
    #[serde(rename = "NDWI")]
    Ndwi,
    /// Normalized Difference Vegetation Index: (NIR - Red) / (NIR + Red)
    #[serde(rename = "NDVI")]
    Ndvi,
}

impl IndexType {
    /// Batch order, also the band order of the composite raster
    pub const ALL: [IndexType; 3] = [IndexType::Ndsi, IndexType::Ndwi, IndexType::Ndvi];

    /// Upper-case short name used in file names and reports
    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Ndsi => "NDSI",
            IndexType::Ndwi => "NDWI",
            IndexType::Ndvi => "NDVI",
        }
    }

    /// Band description attached to written rasters
    pub fn description(&self) -> &'static str {
        match self {
            IndexType::Ndsi => "NDSI (Snow Index)",
            IndexType::Ndwi => "NDWI (Water Index)",
            IndexType::Ndvi => "NDVI (Vegetation Index)",
        }
    }

    /// Spectral roles of the minuend and subtrahend bands
    pub fn band_roles(&self) -> (SpectralBand, SpectralBand) {
        match self {
            IndexType::Ndsi => (SpectralBand::Green, SpectralBand::Swir),
            IndexType::Ndwi => (SpectralBand::Green, SpectralBand::Nir),
            IndexType::Ndvi => (SpectralBand::Nir, SpectralBand::Red),
        }
    }

    /// Names of the positive (>= threshold) and negative classes
    pub fn class_labels(&self) -> ClassLabels {
        let (positive, negative) = match self {
            IndexType::Ndsi => ("Snow", "Non-snow"),
            IndexType::Ndwi => ("Water", "Non-water"),
            IndexType::Ndvi => ("Vegetation", "Non-vegetation"),
        };
        ClassLabels {
            positive: positive.to_string(),
            negative: negative.to_string(),
        }
    }

    /// Conventional classification threshold for this index
    pub fn default_threshold(&self) -> f64 {
        match self {
            IndexType::Ndsi => 0.4,
            IndexType::Ndwi => 0.3,
            IndexType::Ndvi => 0.2,
        }
    }

    /// Range offered to users when picking a threshold. Informational only.
    pub fn threshold_range(&self) -> (f64, f64) {
        match self {
            IndexType::Ndsi => (0.0, 1.0),
            IndexType::Ndwi | IndexType::Ndvi => (-1.0, 1.0),
        }
    }
}

impl std::fmt::Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IndexType {
    type Err = SadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NDSI" => Ok(IndexType::Ndsi),
            "NDWI" => Ok(IndexType::Ndwi),
            "NDVI" => Ok(IndexType::Ndvi),
            _ => Err(SadarError::UnknownIndex(s.to_string())),
        }
    }
}

/// Spectral role of a band in a multispectral product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralBand {
    Green,
    Red,
    Nir,
    Swir,
}

impl SpectralBand {
    /// 1-based band position in a full (>= 11 band) multispectral product
    pub fn product_band(&self) -> usize {
        match self {
            SpectralBand::Green => 3,
            SpectralBand::Red => 4,
            SpectralBand::Nir => 8,
            SpectralBand::Swir => 11,
        }
    }
}

impl std::fmt::Display for SpectralBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpectralBand::Green => write!(f, "Green"),
            SpectralBand::Red => write!(f, "Red"),
            SpectralBand::Nir => write!(f, "NIR"),
            SpectralBand::Swir => write!(f, "SWIR"),
        }
    }
}

/// Human-readable names of the two classification classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLabels {
    pub positive: String,
    pub negative: String,
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

/// Georeferencing carried from a source image to derived rasters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoProfile {
    pub geo_transform: Option<GeoTransform>,
    /// Projection as WKT, empty when the source has none
    pub projection: String,
}

/// Error types for spectral index processing
#[derive(Debug, thiserror::Error)]
pub enum SadarError {
    #[error("Insufficient bands: {band_count} (at least 2 bands are required)")]
    InsufficientBands { band_count: usize },

    #[error("Band shape mismatch: {first:?} vs {second:?}")]
    ShapeMismatch {
        first: (usize, usize),
        second: (usize, usize),
    },

    #[error("Batch computation failed: {0}")]
    BatchComputation(#[source] Box<SadarError>),

    #[error("Unknown index type: {0}")]
    UnknownIndex(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl SadarError {
    /// Wrap a failure that happened while running the batch
    pub fn batch(cause: SadarError) -> Self {
        match cause {
            already @ SadarError::BatchComputation(_) => already,
            other => SadarError::BatchComputation(Box::new(other)),
        }
    }
}

/// Result type for spectral index operations
pub type SadarResult<T> = Result<T, SadarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_type_parsing() {
        assert_eq!("ndsi".parse::<IndexType>().unwrap(), IndexType::Ndsi);
        assert_eq!(" NDWI ".parse::<IndexType>().unwrap(), IndexType::Ndwi);
        assert_eq!("NDVI".parse::<IndexType>().unwrap(), IndexType::Ndvi);
        assert!(matches!(
            "EVI".parse::<IndexType>(),
            Err(SadarError::UnknownIndex(_))
        ));
    }

    #[test]
    fn test_class_labels_follow_index_type() {
        let labels = IndexType::Ndwi.class_labels();
        assert_eq!(labels.positive, "Water");
        assert_eq!(labels.negative, "Non-water");
        assert_eq!(IndexType::Ndvi.class_labels().positive, "Vegetation");
    }

    #[test]
    fn test_batch_error_is_not_nested_twice() {
        let inner = SadarError::InsufficientBands { band_count: 1 };
        let wrapped = SadarError::batch(SadarError::batch(inner));
        match wrapped {
            SadarError::BatchComputation(cause) => {
                assert!(matches!(*cause, SadarError::InsufficientBands { band_count: 1 }))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_geo_transform_round_trip() {
        let gt = [500000.0, 10.0, 0.0, 4600000.0, 0.0, -10.0];
        assert_eq!(GeoTransform::from_gdal(gt).to_gdal(), gt);
    }
}
