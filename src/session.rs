//! Interactive processing session.
//!
//! Holds what an interactive front end needs between user actions: the images
//! of the loaded folder, the selected image, the chosen calculation and
//! threshold, the output folder and the last single-index result. Every
//! operation either succeeds or leaves this state as it was.

use crate::config::ProcessingConfig;
use crate::core::band_selector::BandPairSelection;
use crate::core::batch::{BatchResult, BatchRunner};
use crate::core::index_engine::{IndexEngine, IndexResult};
use crate::io::export::{Exporter, OutputNaming};
use crate::io::folder::scan_folder;
use crate::io::geotiff::{GeoTiffReader, ImageSummary};
use crate::types::{GeoProfile, IndexType, SadarError, SadarResult};
use std::path::{Path, PathBuf};

/// What a run computes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calculation {
    Single(IndexType),
    /// NDSI, NDWI and NDVI with one shared threshold
    All,
}

/// Last single-index computation and where it came from
#[derive(Debug, Clone)]
pub struct LastRun {
    pub image: PathBuf,
    pub selection: BandPairSelection,
    pub profile: GeoProfile,
    pub result: IndexResult,
}

/// Outcome of [`Session::run`]
#[derive(Debug)]
pub enum RunOutcome {
    Single {
        selection: BandPairSelection,
        files: Vec<PathBuf>,
    },
    All {
        result: BatchResult,
        files: Vec<PathBuf>,
    },
}

pub struct Session {
    config: ProcessingConfig,
    images: Vec<PathBuf>,
    current: Option<usize>,
    calculation: Calculation,
    threshold: f64,
    output_dir: Option<PathBuf>,
    last_run: Option<LastRun>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ProcessingConfig::default())
    }
}

impl Session {
    pub fn new(config: ProcessingConfig) -> Self {
        let calculation = Calculation::Single(IndexType::Ndsi);
        Self {
            threshold: config.threshold_for(IndexType::Ndsi),
            output_dir: config.export.output_dir.clone(),
            config,
            images: Vec::new(),
            current: None,
            calculation,
            last_run: None,
        }
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }

    pub fn current_image(&self) -> Option<&Path> {
        self.current.map(|i| self.images[i].as_path())
    }

    pub fn calculation(&self) -> Calculation {
        self.calculation
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn last_run(&self) -> Option<&LastRun> {
        self.last_run.as_ref()
    }

    /// Replace the image list with the GeoTIFFs of `dir`.
    /// An empty folder is an error and keeps the previous list.
    pub fn load_folder<P: AsRef<Path>>(&mut self, dir: P) -> SadarResult<usize> {
        let images = scan_folder(dir.as_ref())?;
        if images.is_empty() {
            return Err(SadarError::Session(format!(
                "No GeoTIFF files found in {}",
                dir.as_ref().display()
            )));
        }

        self.images = images;
        self.current = None;
        self.last_run = None;
        Ok(self.images.len())
    }

    /// Make image `index` current. Images with fewer than 2 bands are refused.
    pub fn select_image(&mut self, index: usize) -> SadarResult<ImageSummary> {
        let path = self.images.get(index).ok_or_else(|| {
            SadarError::Session(format!(
                "Image {} out of range ({} loaded)",
                index,
                self.images.len()
            ))
        })?;

        let summary = GeoTiffReader::open(path)?.summary()?;
        log::info!(
            "Selected {} ({} bands, {}x{}, {})",
            summary.file_name,
            summary.band_count,
            summary.width,
            summary.height,
            summary.band_mode
        );

        self.current = Some(index);
        self.last_run = None;
        Ok(summary)
    }

    /// Switch calculation; the threshold resets to the configured default
    pub fn set_calculation(&mut self, calculation: Calculation) {
        self.calculation = calculation;
        self.threshold = match calculation {
            Calculation::Single(index_type) => self.config.threshold_for(index_type),
            Calculation::All => self.config.batch_threshold,
        };
    }

    pub fn set_threshold(&mut self, threshold: f64) -> SadarResult<()> {
        if !threshold.is_finite() {
            return Err(SadarError::Session(format!(
                "Threshold must be finite, got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(())
    }

    pub fn set_output_dir<P: AsRef<Path>>(&mut self, dir: P) -> SadarResult<()> {
        if !dir.as_ref().is_dir() {
            return Err(SadarError::Session(format!(
                "Output folder does not exist: {}",
                dir.as_ref().display()
            )));
        }
        self.output_dir = Some(dir.as_ref().to_path_buf());
        Ok(())
    }

    fn require_image(&self) -> SadarResult<&Path> {
        self.current_image()
            .ok_or_else(|| SadarError::Session("No image selected".to_string()))
    }

    fn exporter(&self) -> SadarResult<Exporter> {
        let dir = self
            .output_dir
            .as_ref()
            .ok_or_else(|| SadarError::Session("No output folder selected".to_string()))?;
        Ok(Exporter::new(dir, self.config.export.clone()))
    }

    /// Run the selected calculation on the current image and save its outputs
    ///
    /// A single index becomes the last result only once its outputs are
    /// written. On any failure the previous last result is kept.
    pub fn run(&mut self) -> SadarResult<RunOutcome> {
        match self.calculation {
            Calculation::Single(index_type) => {
                let exporter = self.exporter()?;
                let image = self.require_image()?.to_path_buf();
                let reader = GeoTiffReader::open(&image)?;
                let (selection, result) =
                    IndexEngine::new(index_type).compute_from_source(&reader, self.threshold)?;
                log::info!(
                    "{} calculated using {}",
                    index_type,
                    selection.source_description
                );

                let run = LastRun {
                    image,
                    selection: selection.clone(),
                    profile: reader.profile(),
                    result,
                };
                let files = export_run(&exporter, &run)?;
                self.last_run = Some(run);
                Ok(RunOutcome::Single { selection, files })
            }
            Calculation::All => {
                let exporter = self.exporter()?;
                let image = self.require_image()?;
                let naming = OutputNaming::from_image_path(image)?;

                let reader = GeoTiffReader::open(image).map_err(SadarError::batch)?;
                let result = BatchRunner::new(self.threshold).run_all(&reader)?;
                let files = exporter.export_batch(&naming, &result, &reader.profile())?;
                Ok(RunOutcome::All { result, files })
            }
        }
    }

    /// Write raster, preview and report of the last single-index result again
    pub fn save_output(&self) -> SadarResult<Vec<PathBuf>> {
        let last = self.last_run.as_ref().ok_or_else(|| {
            SadarError::Session("No result to save, run a calculation first".to_string())
        })?;
        export_run(&self.exporter()?, last)
    }
}

fn export_run(exporter: &Exporter, run: &LastRun) -> SadarResult<Vec<PathBuf>> {
    let naming = OutputNaming::from_image_path(&run.image)?;
    exporter.export_single(
        &naming,
        &run.result,
        &run.selection.source_description,
        &run.profile,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_calculation_resets_threshold() {
        let mut session = Session::default();
        assert_eq!(session.threshold(), 0.4);

        session.set_calculation(Calculation::Single(IndexType::Ndvi));
        assert_eq!(session.threshold(), 0.2);

        session.set_threshold(0.55).unwrap();
        assert_eq!(session.threshold(), 0.55);

        session.set_calculation(Calculation::All);
        assert_eq!(session.threshold(), 0.4);
    }

    #[test]
    fn test_invalid_threshold_keeps_previous() {
        let mut session = Session::default();
        assert!(session.set_threshold(f64::NAN).is_err());
        assert_eq!(session.threshold(), 0.4);
    }

    #[test]
    fn test_empty_folder_keeps_previous_state() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::default();
        assert!(matches!(
            session.load_folder(dir.path()),
            Err(SadarError::Session(_))
        ));
        assert!(session.images().is_empty());
    }

    #[test]
    fn test_run_without_image_fails() {
        let mut session = Session::default();
        assert!(matches!(session.run(), Err(SadarError::Session(_))));
        assert!(matches!(session.save_output(), Err(SadarError::Session(_))));
    }
}
