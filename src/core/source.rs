use crate::types::{RasterBand, SadarError, SadarResult};

/// Anything that can hand out bands of a multi-band raster by 1-based index
pub trait BandSource {
    fn band_count(&self) -> usize;

    /// Raster size as (width, height)
    fn raster_size(&self) -> (usize, usize);

    /// Read band `index` (1-based) as a (height x width) grid
    fn read_band(&self, index: usize) -> SadarResult<RasterBand>;
}

/// Bands already held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryRaster {
    bands: Vec<RasterBand>,
}

impl MemoryRaster {
    /// Build from equal-shape bands, band 1 first
    pub fn new(bands: Vec<RasterBand>) -> SadarResult<Self> {
        if let Some(first) = bands.first() {
            if let Some(other) = bands.iter().find(|b| b.dim() != first.dim()) {
                return Err(SadarError::ShapeMismatch {
                    first: first.dim(),
                    second: other.dim(),
                });
            }
        }
        Ok(Self { bands })
    }
}

impl BandSource for MemoryRaster {
    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn raster_size(&self) -> (usize, usize) {
        self.bands
            .first()
            .map(|b| (b.ncols(), b.nrows()))
            .unwrap_or((0, 0))
    }

    fn read_band(&self, index: usize) -> SadarResult<RasterBand> {
        index
            .checked_sub(1)
            .and_then(|i| self.bands.get(i))
            .cloned()
            .ok_or_else(|| {
                SadarError::InvalidFormat(format!(
                    "Band {} out of range (1..={})",
                    index,
                    self.bands.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_memory_raster_indexing() {
        let raster = MemoryRaster::new(vec![
            Array2::from_elem((2, 3), 1.0),
            Array2::from_elem((2, 3), 2.0),
        ])
        .unwrap();

        assert_eq!(raster.band_count(), 2);
        assert_eq!(raster.raster_size(), (3, 2));
        assert_eq!(raster.read_band(2).unwrap()[[0, 0]], 2.0);
        assert!(raster.read_band(0).is_err());
        assert!(raster.read_band(3).is_err());
    }

    #[test]
    fn test_memory_raster_rejects_mixed_shapes() {
        let result = MemoryRaster::new(vec![
            Array2::zeros((2, 2)),
            Array2::zeros((2, 3)),
        ]);
        assert!(matches!(result, Err(SadarError::ShapeMismatch { .. })));
    }
}
