use crate::config::ExportConfig;
use crate::core::batch::BatchResult;
use crate::core::index_engine::IndexResult;
use crate::io::geotiff::GeoTiffWriter;
use crate::io::preview::{render_composite, render_index, save_png};
use crate::io::report::{render_report, write_report};
use crate::types::{GeoProfile, IndexType, SadarError, SadarResult};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// File names of derived artifacts for one source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    base_name: String,
}

impl OutputNaming {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
        }
    }

    /// Base name is the image file name without its extension
    pub fn from_image_path<P: AsRef<Path>>(path: P) -> SadarResult<Self> {
        path.as_ref()
            .file_stem()
            .map(|s| Self::new(s.to_string_lossy()))
            .ok_or_else(|| {
                SadarError::InvalidFormat(format!(
                    "No file name in {}",
                    path.as_ref().display()
                ))
            })
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn index_raster(&self, index_type: IndexType, ext: &str) -> String {
        format!("{}_{}_processed.{}", self.base_name, index_type, ext)
    }

    pub fn index_preview(&self, index_type: IndexType, ext: &str) -> String {
        format!("{}_{}_processed_preview.{}", self.base_name, index_type, ext)
    }

    pub fn index_report(&self, index_type: IndexType, ext: &str) -> String {
        format!("{}_{}_processed_report.{}", self.base_name, index_type, ext)
    }

    pub fn composite(&self, ext: &str) -> String {
        format!("{}_processed_composite.{}", self.base_name, ext)
    }
}

/// Files written so far by one export; removed again unless committed
struct PendingFiles {
    paths: Vec<PathBuf>,
}

impl PendingFiles {
    fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Run `write` for `path` and remember the file once it is written.
    ///
    /// A file created by a failed write is removed at once. A file that was
    /// already there, from an earlier export, is never touched on failure.
    fn write<F>(&mut self, path: PathBuf, write: F) -> SadarResult<PathBuf>
    where
        F: FnOnce(&Path) -> SadarResult<()>,
    {
        let existed = path.exists();
        match write(&path) {
            Ok(()) => {
                self.paths.push(path.clone());
                Ok(path)
            }
            Err(e) => {
                if !existed && path.is_file() {
                    remove_partial(&path);
                }
                Err(e)
            }
        }
    }

    fn commit(mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

impl Drop for PendingFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            remove_partial(path);
        }
    }
}

fn remove_partial(path: &Path) {
    log::warn!("Removing partial output: {}", path.display());
    if let Err(e) = std::fs::remove_file(path) {
        log::warn!("Failed to remove {}: {}", path.display(), e);
    }
}

/// Writes rasters, previews and reports into an output folder
pub struct Exporter {
    output_dir: PathBuf,
    config: ExportConfig,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(output_dir: P, config: ExportConfig) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Raster, preview and report of one index result.
    /// Returns the written paths; on error nothing is left behind.
    pub fn export_single(
        &self,
        naming: &OutputNaming,
        result: &IndexResult,
        band_description: &str,
        profile: &GeoProfile,
    ) -> SadarResult<Vec<PathBuf>> {
        let index_type = result.index_type();
        let mut pending = PendingFiles::new();

        let writer = GeoTiffWriter::new(profile.clone());
        pending.write(
            self.output_dir
                .join(naming.index_raster(index_type, &self.config.raster_extension)),
            |path| writer.write_single(result, path),
        )?;

        let preview = render_index(result.values())?;
        pending.write(
            self.output_dir
                .join(naming.index_preview(index_type, &self.config.image_extension)),
            |path| save_png(&preview, path),
        )?;

        let report = render_report(result, naming.base_name(), band_description, Utc::now());
        pending.write(
            self.output_dir
                .join(naming.index_report(index_type, &self.config.report_extension)),
            |path| write_report(&report, path),
        )?;

        log::info!(
            "Saved {} outputs for {} in {}",
            index_type,
            naming.base_name(),
            self.output_dir.display()
        );
        Ok(pending.commit())
    }

    /// Per-index rasters and previews plus the composite raster and preview.
    /// Failures are reported as [`SadarError::BatchComputation`] and leave no files.
    pub fn export_batch(
        &self,
        naming: &OutputNaming,
        batch: &BatchResult,
        profile: &GeoProfile,
    ) -> SadarResult<Vec<PathBuf>> {
        self.write_batch(naming, batch, profile)
            .map_err(SadarError::batch)
    }

    fn write_batch(
        &self,
        naming: &OutputNaming,
        batch: &BatchResult,
        profile: &GeoProfile,
    ) -> SadarResult<Vec<PathBuf>> {
        let writer = GeoTiffWriter::new(profile.clone());
        let mut pending = PendingFiles::new();

        for result in batch.iter() {
            let index_type = result.index_type();

            pending.write(
                self.output_dir
                    .join(naming.index_raster(index_type, &self.config.raster_extension)),
                |path| writer.write_single(result, path),
            )?;

            let preview = render_index(result.values())?;
            pending.write(
                self.output_dir
                    .join(naming.index_preview(index_type, &self.config.image_extension)),
                |path| save_png(&preview, path),
            )?;
        }

        let composite = batch.composite()?;
        pending.write(
            self.output_dir
                .join(naming.composite(&self.config.raster_extension)),
            |path| writer.write_composite(&composite, path),
        )?;

        let panels: Vec<_> = batch.iter().map(|r| r.values()).collect();
        let preview = render_composite(&panels)?;
        pending.write(
            self.output_dir
                .join(naming.composite(&self.config.image_extension)),
            |path| save_png(&preview, path),
        )?;

        log::info!(
            "Saved NDSI/NDWI/NDVI outputs and composite for {} in {}",
            naming.base_name(),
            self.output_dir.display()
        );
        Ok(pending.commit())
    }
}
