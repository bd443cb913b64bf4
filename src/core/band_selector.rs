use crate::types::{IndexType, SadarError, SadarResult, SpectralBand};
use serde::{Deserialize, Serialize};

/// Band count from which an image is treated as a full multispectral product
pub const FULL_PRODUCT_MIN_BANDS: usize = 11;

/// How the band pair was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Fixed product positions (B3, B4, B8, B11)
    FullProduct,
    /// Bands 1 and 2, whatever the index
    TwoBandFallback,
}

impl SelectionMode {
    pub fn for_band_count(band_count: usize) -> SadarResult<Self> {
        if band_count >= FULL_PRODUCT_MIN_BANDS {
            Ok(SelectionMode::FullProduct)
        } else if band_count >= 2 {
            Ok(SelectionMode::TwoBandFallback)
        } else {
            Err(SadarError::InsufficientBands { band_count })
        }
    }
}

/// Which two bands feed an index, in subtraction order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandPairSelection {
    /// 1-based index of the minuend band
    pub band_index1: usize,
    /// 1-based index of the subtrahend band
    pub band_index2: usize,
    pub label1: SpectralBand,
    pub label2: SpectralBand,
    pub mode: SelectionMode,
    pub source_description: String,
}

/// Maps an index type and band count onto the bands to read
pub struct BandSelector;

impl BandSelector {
    /// Select the band pair for `index_type` from an image with `band_count` bands
    ///
    /// Images with 11 or more bands use the fixed product positions. Anything
    /// with 2..=10 bands uses bands 1 and 2 in that order, labelled with the
    /// roles the index expects.
    pub fn select(index_type: IndexType, band_count: usize) -> SadarResult<BandPairSelection> {
        let mode = SelectionMode::for_band_count(band_count)?;
        let (label1, label2) = index_type.band_roles();

        let selection = match mode {
            SelectionMode::FullProduct => BandPairSelection {
                band_index1: label1.product_band(),
                band_index2: label2.product_band(),
                label1,
                label2,
                mode,
                source_description: format!(
                    "B{} ({}) & B{} ({})",
                    label1.product_band(),
                    label1,
                    label2.product_band(),
                    label2
                ),
            },
            SelectionMode::TwoBandFallback => {
                let source_description = if band_count == 2 {
                    format!("Band 1 ({}) & Band 2 ({})", label1, label2)
                } else {
                    format!("first 2 bands as {} & {}", label1, label2)
                };
                BandPairSelection {
                    band_index1: 1,
                    band_index2: 2,
                    label1,
                    label2,
                    mode,
                    source_description,
                }
            }
        };

        log::debug!(
            "{} with {} bands -> bands {} & {} ({})",
            index_type,
            band_count,
            selection.band_index1,
            selection.band_index2,
            selection.source_description
        );

        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_product_positions() {
        let ndsi = BandSelector::select(IndexType::Ndsi, 11).unwrap();
        assert_eq!((ndsi.band_index1, ndsi.band_index2), (3, 11));
        assert_eq!(ndsi.source_description, "B3 (Green) & B11 (SWIR)");

        let ndwi = BandSelector::select(IndexType::Ndwi, 13).unwrap();
        assert_eq!((ndwi.band_index1, ndwi.band_index2), (3, 8));
        assert_eq!((ndwi.label1, ndwi.label2), (SpectralBand::Green, SpectralBand::Nir));

        let ndvi = BandSelector::select(IndexType::Ndvi, 12).unwrap();
        assert_eq!((ndvi.band_index1, ndvi.band_index2), (8, 4));
        assert_eq!(ndvi.source_description, "B8 (NIR) & B4 (Red)");
        assert_eq!(ndvi.mode, SelectionMode::FullProduct);
    }

    #[test]
    fn test_fallback_below_eleven_bands() {
        let ndsi = BandSelector::select(IndexType::Ndsi, 10).unwrap();
        assert_eq!((ndsi.band_index1, ndsi.band_index2), (1, 2));
        assert_eq!(ndsi.mode, SelectionMode::TwoBandFallback);
        assert_eq!(ndsi.source_description, "first 2 bands as Green & SWIR");

        let two = BandSelector::select(IndexType::Ndsi, 2).unwrap();
        assert_eq!(two.source_description, "Band 1 (Green) & Band 2 (SWIR)");
    }

    #[test]
    fn test_fallback_keeps_band_order_for_ndvi() {
        // Band 1 is labelled NIR and stays the minuend.
        let ndvi = BandSelector::select(IndexType::Ndvi, 2).unwrap();
        assert_eq!((ndvi.band_index1, ndvi.band_index2), (1, 2));
        assert_eq!((ndvi.label1, ndvi.label2), (SpectralBand::Nir, SpectralBand::Red));
    }

    #[test]
    fn test_insufficient_bands() {
        for count in [0, 1] {
            assert!(matches!(
                BandSelector::select(IndexType::Ndsi, count),
                Err(SadarError::InsufficientBands { band_count }) if band_count == count
            ));
        }
    }
}
