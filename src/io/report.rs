use crate::core::index_engine::{IndexResult, ValueHistogram};
use crate::types::SadarResult;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Plain-text analysis report for one index result
pub fn render_report(
    result: &IndexResult,
    image_name: &str,
    band_description: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let index = result.index_type();
    let stats = result.statistics();
    let counts = result.pixel_counts();
    let labels = result.class_labels();

    let mut lines = vec![
        format!("{} Analysis Report", index),
        format!("Image: {}", image_name),
        format!("Bands: {}", band_description),
        format!("Threshold: {:.2}", result.threshold()),
        String::new(),
        format!("{} Statistics", index),
        format!("Min: {:.4}", stats.min),
        format!("Max: {:.4}", stats.max),
        format!("Mean: {:.4}", stats.mean),
        format!("Std: {:.4}", stats.std),
        String::new(),
        "Classification".to_string(),
        format!("Total pixels: {}", counts.total),
        format!("Valid pixels: {}", counts.valid),
        format!(
            "{}: {} ({:.2}%)",
            labels.positive,
            counts.positive,
            counts.positive_percentage()
        ),
        format!(
            "{}: {} ({:.2}%)",
            labels.negative,
            counts.negative,
            counts.negative_percentage()
        ),
        format!(
            "No data: {} ({:.2}%)",
            counts.nodata,
            counts.nodata_percentage()
        ),
        String::new(),
        "Value Distribution".to_string(),
    ];
    lines.extend(
        ValueHistogram::labels()
            .iter()
            .zip(result.histogram().buckets)
            .map(|(label, count)| format!("{}: {}", label, count)),
    );
    lines.push(String::new());
    lines.push(format!(
        "Generated: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

pub fn write_report<P: AsRef<Path>>(report: &str, output_path: P) -> SadarResult<()> {
    log::info!("Writing report: {}", output_path.as_ref().display());
    std::fs::write(output_path, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::index_engine::IndexEngine;
    use crate::types::IndexType;
    use chrono::TimeZone;
    use ndarray::array;

    #[test]
    fn test_report_contents() {
        let result = IndexEngine::new(IndexType::Ndsi)
            .compute(&array![[0.6, 0.2], [0.0, 1.0]], &array![[0.4, 0.2], [0.0, 0.5]], 0.4)
            .unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();

        let report = render_report(&result, "scene", "B3 (Green) & B11 (SWIR)", when);

        assert!(report.starts_with("NDSI Analysis Report\n"));
        assert!(report.contains("Threshold: 0.40\n"));
        assert!(report.contains("Min: 0.0000\n"));
        assert!(report.contains("Max: 0.3333\n"));
        assert!(report.contains("Non-snow: 3 (75.00%)\n"));
        assert!(report.contains("No data: 1 (25.00%)\n"));
        assert!(report.contains("[0.0, 0.5): 3\n"));
        assert!(report.contains("Generated: 2024-03-01 12:30:00 UTC"));
    }

    #[test]
    fn test_report_section_order() {
        let result = IndexEngine::new(IndexType::Ndvi)
            .compute(&array![[0.9, 0.1]], &array![[0.1, 0.9]], 0.2)
            .unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let report = render_report(&result, "tile", "Band 1 (NIR) & Band 2 (Red)", when);
        let lines: Vec<&str> = report.lines().collect();

        assert!(report.ends_with("UTC\n"));
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[0], "NDVI Analysis Report");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "NDVI Statistics");
        assert_eq!(lines[11], "Classification");
        assert_eq!(lines[18], "Value Distribution");
        assert_eq!(lines[23], "");
        assert_eq!(lines[24], "Generated: 2024-03-01 00:00:00 UTC");
    }
}
