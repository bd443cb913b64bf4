use crate::core::band_selector::{BandSelector, SelectionMode};
use crate::core::batch::Composite;
use crate::core::index_engine::{normalized_difference, IndexResult, SummaryStatistics};
use crate::core::source::BandSource;
use crate::types::{GeoProfile, GeoTransform, IndexType, RasterBand, SadarError, SadarResult};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::{Array2, ArrayView2, Axis};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Overview of an image shown when it is selected
#[derive(Debug, Clone, Serialize)]
pub struct ImageSummary {
    pub file_name: String,
    pub band_count: usize,
    pub width: usize,
    pub height: usize,
    pub data_type: String,
    pub crs: String,
    pub band_mode: String,
    /// Statistics of the Green band used for NDSI
    pub green: SummaryStatistics,
    /// Statistics of the SWIR band used for NDSI
    pub swir: SummaryStatistics,
    /// Statistics of an NDSI computed from the two bands
    pub ndsi_preview: SummaryStatistics,
}

/// Multi-band GeoTIFF opened through GDAL
pub struct GeoTiffReader {
    path: PathBuf,
    dataset: Dataset,
}

impl GeoTiffReader {
    pub fn open<P: AsRef<Path>>(path: P) -> SadarResult<Self> {
        log::info!("Opening raster: {}", path.as_ref().display());
        let dataset = Dataset::open(path.as_ref())?;

        let (width, height) = dataset.raster_size();
        log::debug!(
            "Raster size: {}x{}, {} bands",
            width,
            height,
            dataset.raster_count()
        );

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Georeferencing to copy onto derived rasters
    pub fn profile(&self) -> GeoProfile {
        GeoProfile {
            geo_transform: self.dataset.geo_transform().ok().map(GeoTransform::from_gdal),
            projection: self.dataset.projection(),
        }
    }

    /// Authority code of the spatial reference, or "Not specified"
    pub fn crs_name(&self) -> String {
        self.dataset
            .spatial_ref()
            .ok()
            .and_then(|srs| srs.authority().ok())
            .unwrap_or_else(|| "Not specified".to_string())
    }

    /// Describe the image and preview its NDSI band pair
    pub fn summary(&self) -> SadarResult<ImageSummary> {
        let band_count = self.band_count();
        let (width, height) = self.raster_size();
        let selection = BandSelector::select(IndexType::Ndsi, band_count)?;

        let band_mode = match selection.mode {
            SelectionMode::FullProduct => "Full image (B3 & B11)".to_string(),
            SelectionMode::TwoBandFallback if band_count == 2 => "2-band (B3 & B11)".to_string(),
            SelectionMode::TwoBandFallback => {
                format!("{}-band (using first 2: B3 & B11)", band_count)
            }
        };

        let green = self.read_band(selection.band_index1)?;
        let swir = self.read_band(selection.band_index2)?;
        let ndsi = normalized_difference(&green, &swir)?;

        let data_type = format!("{:?}", self.dataset.rasterband(1)?.band_type());
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ImageSummary {
            file_name,
            band_count,
            width,
            height,
            data_type,
            crs: self.crs_name(),
            band_mode,
            green: SummaryStatistics::from_values(&green),
            swir: SummaryStatistics::from_values(&swir),
            ndsi_preview: SummaryStatistics::from_values(&ndsi),
        })
    }
}

impl BandSource for GeoTiffReader {
    fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    /// Band values as f64. Cells equal to the band's no-data value become NaN.
    fn read_band(&self, index: usize) -> SadarResult<RasterBand> {
        let band_count = self.band_count();
        if index == 0 || index > band_count {
            return Err(SadarError::InvalidFormat(format!(
                "Band {} out of range (1..={}) in {}",
                index,
                band_count,
                self.path.display()
            )));
        }

        log::debug!("Reading band {} from {}", index, self.path.display());
        let (width, height) = self.dataset.raster_size();
        let rasterband = self.dataset.rasterband(index as isize)?;
        let buffer = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;

        let mut band = Array2::from_shape_vec((height, width), buffer.data)
            .map_err(|e| SadarError::Processing(format!("Failed to reshape band {}: {}", index, e)))?;

        if let Some(nodata) = rasterband.no_data_value().filter(|v| !v.is_nan()) {
            band.mapv_inplace(|v| if v == nodata { f64::NAN } else { v });
        }

        Ok(band)
    }
}

/// Writes index grids as float32 GeoTIFFs with NaN no-data
pub struct GeoTiffWriter {
    profile: GeoProfile,
}

impl GeoTiffWriter {
    pub fn new(profile: GeoProfile) -> Self {
        Self { profile }
    }

    /// Single-band raster of one index result
    pub fn write_single<P: AsRef<Path>>(&self, result: &IndexResult, output_path: P) -> SadarResult<()> {
        self.write_bands(
            output_path,
            &[(result.values().view(), result.index_type().description())],
        )
    }

    /// Three-band raster, NDSI/NDWI/NDVI in band order
    pub fn write_composite<P: AsRef<Path>>(&self, composite: &Composite, output_path: P) -> SadarResult<()> {
        let bands: Vec<_> = composite
            .data
            .axis_iter(Axis(0))
            .zip(composite.labels)
            .collect();
        self.write_bands(output_path, &bands)
    }

    fn write_bands<P: AsRef<Path>>(
        &self,
        output_path: P,
        bands: &[(ArrayView2<f64>, &str)],
    ) -> SadarResult<()> {
        let (height, width) = bands
            .first()
            .map(|(data, _)| data.dim())
            .ok_or_else(|| SadarError::Processing("No bands to write".to_string()))?;

        log::info!(
            "Writing {}-band GeoTIFF {}x{}: {}",
            bands.len(),
            width,
            height,
            output_path.as_ref().display()
        );

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<f32, _>(
            output_path.as_ref(),
            width as isize,
            height as isize,
            bands.len() as isize,
        )?;

        if let Some(transform) = &self.profile.geo_transform {
            dataset.set_geo_transform(&transform.to_gdal())?;
        }
        if !self.profile.projection.is_empty() {
            dataset.set_projection(&self.profile.projection)?;
        }

        for (i, (data, description)) in bands.iter().enumerate() {
            if data.dim() != (height, width) {
                return Err(SadarError::ShapeMismatch {
                    first: (height, width),
                    second: data.dim(),
                });
            }

            let mut rasterband = dataset.rasterband(i as isize + 1)?;
            let flat_data: Vec<f32> = data.iter().map(|&v| v as f32).collect();
            let buffer = Buffer::new((width, height), flat_data);
            rasterband.write((0, 0), (width, height), &buffer)?;
            rasterband.set_no_data_value(Some(f64::NAN))?;
            rasterband.set_description(description)?;
        }

        Ok(())
    }
}
