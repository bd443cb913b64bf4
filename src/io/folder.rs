use crate::types::SadarResult;
use std::path::{Path, PathBuf};

fn is_geotiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}

/// GeoTIFF files directly inside `dir`, sorted by path
pub fn scan_folder<P: AsRef<Path>>(dir: P) -> SadarResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_geotiff(&path) {
            images.push(path);
        }
    }
    images.sort();

    log::info!(
        "Found {} GeoTIFF images in {}",
        images.len(),
        dir.as_ref().display()
    );
    Ok(images)
}
