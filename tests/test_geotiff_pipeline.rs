use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::Array2;
use sadar::core::BandSource;
use sadar::session::{Calculation, RunOutcome, Session};
use sadar::types::{IndexType, SadarError};
use sadar::GeoTiffReader;
use std::path::Path;
use tempfile::TempDir;

const GEO_TRANSFORM: [f64; 6] = [399960.0, 10.0, 0.0, 5000040.0, 0.0, -10.0];

/// Write a float32 multi-band GeoTIFF the way a satellite product would arrive
fn write_source(path: &Path, band_count: usize, rows: usize, cols: usize) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<f32, _>(path, cols as isize, rows as isize, band_count as isize)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    for b in 1..=band_count {
        let band = Array2::from_shape_fn((rows, cols), |(i, j)| {
            if i == 0 && j == 0 {
                0.0 // zero in every band gives one no-data pixel per index
            } else {
                (b as f32) * 0.0625 + ((i * cols + j) as f32) * 0.125
            }
        });
        let mut rasterband = dataset.rasterband(b as isize).unwrap();
        let buffer = Buffer::new((cols, rows), band.iter().cloned().collect::<Vec<f32>>());
        rasterband.write((0, 0), (cols, rows), &buffer).unwrap();
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_image_summary() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scene.tif");
    write_source(&path, 12, 4, 5);

    let reader = GeoTiffReader::open(&path).unwrap();
    let summary = reader.summary().unwrap();
    println!("{:?}", summary);

    assert_eq!(summary.file_name, "scene.tif");
    assert_eq!(summary.band_count, 12);
    assert_eq!((summary.width, summary.height), (5, 4));
    assert_eq!(summary.band_mode, "Full image (B3 & B11)");
    assert_eq!(summary.crs, "Not specified");
    assert_eq!(summary.green.min, 0.0);
    assert!(summary.ndsi_preview.max <= 1.0);
    assert_eq!(reader.band_count(), 12);
}

#[test]
fn test_single_index_run_writes_three_artifacts() {
    init_logging();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_source(&input.path().join("scene.tif"), 2, 4, 5);

    let mut session = Session::default();
    assert_eq!(session.load_folder(input.path()).unwrap(), 1);
    let summary = session.select_image(0).unwrap();
    assert_eq!(summary.band_mode, "2-band (B3 & B11)");

    session.set_output_dir(output.path()).unwrap();
    session.set_calculation(Calculation::Single(IndexType::Ndwi));
    assert_eq!(session.threshold(), 0.3);

    let outcome = session.run().unwrap();
    match outcome {
        RunOutcome::Single { selection, files } => {
            assert_eq!(selection.source_description, "Band 1 (Green) & Band 2 (NIR)");
            assert_eq!(files.len(), 3);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(
        file_names(output.path()),
        vec![
            "scene_NDWI_processed.tiff",
            "scene_NDWI_processed_preview.png",
            "scene_NDWI_processed_report.txt",
        ]
    );

    let last = session.last_run().unwrap();
    assert_eq!(last.result.pixel_counts().nodata, 1);
    assert_eq!(last.result.threshold(), 0.3);

    let written = Dataset::open(output.path().join("scene_NDWI_processed.tiff")).unwrap();
    assert_eq!(written.raster_count(), 1);
    assert_eq!(written.geo_transform().unwrap(), GEO_TRANSFORM);
    let band = written.rasterband(1).unwrap();
    assert!(band.no_data_value().unwrap().is_nan());
    assert_eq!(band.description().unwrap(), "NDWI (Water Index)");

    let report =
        std::fs::read_to_string(output.path().join("scene_NDWI_processed_report.txt")).unwrap();
    assert!(report.starts_with("NDWI Analysis Report"));
    assert!(report.contains("Threshold: 0.30"));
}

#[test]
fn test_all_indices_run_writes_eight_artifacts() {
    init_logging();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_source(&input.path().join("tile.tiff"), 11, 3, 3);

    let mut session = Session::default();
    session.load_folder(input.path()).unwrap();
    session.select_image(0).unwrap();
    session.set_output_dir(output.path()).unwrap();
    session.set_calculation(Calculation::All);

    let outcome = session.run().unwrap();
    let RunOutcome::All { result, files } = outcome else {
        panic!("expected a batch outcome");
    };
    assert_eq!(files.len(), 8);
    assert_eq!(result.ndsi.threshold(), 0.4);
    assert_eq!(result.ndvi.threshold(), 0.4);
    assert!(session.last_run().is_none());

    assert_eq!(
        file_names(output.path()),
        vec![
            "tile_NDSI_processed.tiff",
            "tile_NDSI_processed_preview.png",
            "tile_NDVI_processed.tiff",
            "tile_NDVI_processed_preview.png",
            "tile_NDWI_processed.tiff",
            "tile_NDWI_processed_preview.png",
            "tile_processed_composite.png",
            "tile_processed_composite.tiff",
        ]
    );

    let composite = Dataset::open(output.path().join("tile_processed_composite.tiff")).unwrap();
    assert_eq!(composite.raster_count(), 3);
    let descriptions: Vec<String> = (1..=3)
        .map(|b| composite.rasterband(b).unwrap().description().unwrap())
        .collect();
    assert_eq!(
        descriptions,
        vec!["NDSI (Snow Index)", "NDWI (Water Index)", "NDVI (Vegetation Index)"]
    );

    let preview = image::open(output.path().join("tile_processed_composite.png")).unwrap();
    assert_eq!(preview.height(), 3);
}

#[test]
fn test_failed_batch_export_leaves_no_files() {
    init_logging();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_source(&input.path().join("tile.tif"), 2, 3, 3);
    // A directory where the last artifact should go makes the final write fail.
    std::fs::create_dir(output.path().join("tile_processed_composite.png")).unwrap();

    let mut session = Session::default();
    session.load_folder(input.path()).unwrap();
    session.select_image(0).unwrap();
    session.set_output_dir(output.path()).unwrap();
    session.set_calculation(Calculation::All);

    let err = session.run().unwrap_err();
    assert!(matches!(err, SadarError::BatchComputation(_)));
    assert_eq!(file_names(output.path()), vec!["tile_processed_composite.png"]);
}

#[test]
fn test_single_band_image_is_refused() {
    init_logging();
    let input = TempDir::new().unwrap();
    write_source(&input.path().join("a_good.tif"), 2, 2, 2);
    write_source(&input.path().join("b_mono.tif"), 1, 2, 2);

    let mut session = Session::default();
    assert_eq!(session.load_folder(input.path()).unwrap(), 2);
    session.select_image(0).unwrap();

    let err = session.select_image(1).unwrap_err();
    assert!(matches!(err, SadarError::InsufficientBands { band_count: 1 }));
    assert_eq!(
        session.current_image().unwrap().file_name().unwrap(),
        "a_good.tif"
    );
}

#[test]
fn test_save_requires_output_folder() {
    init_logging();
    let input = TempDir::new().unwrap();
    write_source(&input.path().join("scene.tif"), 2, 2, 2);

    let mut session = Session::default();
    session.load_folder(input.path()).unwrap();
    session.select_image(0).unwrap();

    assert!(matches!(session.run(), Err(SadarError::Session(_))));
    assert!(session.last_run().is_none());
}

#[test]
fn test_failed_single_save_keeps_previous_result() {
    init_logging();
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_source(&input.path().join("scene.tif"), 2, 3, 3);

    let mut session = Session::default();
    session.load_folder(input.path()).unwrap();
    session.select_image(0).unwrap();
    session.set_output_dir(output.path()).unwrap();
    session.set_calculation(Calculation::Single(IndexType::Ndsi));
    session.run().unwrap();
    assert_eq!(session.last_run().unwrap().result.index_type(), IndexType::Ndsi);

    // The NDVI report path is taken by a directory, so saving NDVI fails.
    std::fs::create_dir(output.path().join("scene_NDVI_processed_report.txt")).unwrap();
    session.set_calculation(Calculation::Single(IndexType::Ndvi));
    assert!(session.run().is_err());

    let last = session.last_run().unwrap();
    assert_eq!(last.result.index_type(), IndexType::Ndsi);
    assert_eq!(last.result.threshold(), 0.4);
    assert!(!output.path().join("scene_NDVI_processed.tiff").exists());

    // Saving again writes the kept NDSI result, not the failed NDVI one.
    let files = session.save_output().unwrap();
    assert!(files.iter().all(|f| f.to_string_lossy().contains("_NDSI_")));
}
