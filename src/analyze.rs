use crate::metadata::{Classification, ImageRecord, MetadataStore};
use anyhow::{Context, Result};
use image::imageops::FilterType;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Below this mean luma an image counts as dark
pub const DARK_THRESHOLD: f32 = 0.35;
/// Above this mean luma an image counts as light
pub const LIGHT_THRESHOLD: f32 = 0.65;

/// Downscale target before sampling; classification only needs a coarse
/// average, not the full-resolution image
const SAMPLE_SIZE: u32 = 64;

#[derive(Debug, Default)]
pub struct AnalysisSummary {
    pub analyzed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn classify(luminosity: f32) -> Classification {
    if luminosity < DARK_THRESHOLD {
        Classification::Dark
    } else if luminosity > LIGHT_THRESHOLD {
        Classification::Light
    } else {
        Classification::Medium
    }
}

/// Cheap change detector: file size plus mtime. Good enough to skip
/// re-decoding unchanged images without hashing their contents.
pub fn fingerprint(path: &Path) -> Option<String> {
    let meta = fs::metadata(path).ok()?;
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Some(format!("{}:{}", meta.len(), mtime))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Decode, downscale, and average BT.709 luma over all pixels
pub fn mean_luminosity(path: &Path) -> Result<f32> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    let small = img.resize(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle);
    let rgb = small.to_rgb8();

    let pixel_count = (rgb.width() * rgb.height()) as f64;
    if pixel_count == 0.0 {
        anyhow::bail!("Image has no pixels: {}", path.display());
    }

    let sum: f64 = rgb
        .pixels()
        .map(|p| {
            let r = p.0[0] as f64 / 255.0;
            let g = p.0[1] as f64 / 255.0;
            let b = p.0[2] as f64 / 255.0;
            0.2126 * r + 0.7152 * g + 0.0722 * b
        })
        .sum();

    Ok((sum / pixel_count) as f32)
}

/// Analyze a single image into a fresh record
pub fn analyze_image(path: &Path) -> Result<ImageRecord> {
    let luminosity = mean_luminosity(path)?;
    Ok(ImageRecord {
        classification: classify(luminosity),
        luminosity,
        manual_override: false,
        custom_tags: Vec::new(),
        fingerprint: fingerprint(path),
        analyzed_at: now_secs(),
    })
}

/// Analyze every candidate that needs it, in parallel, then commit the
/// results as one batch. Manually overridden classifications are never
/// touched; existing tags survive reanalysis.
pub fn analyze_batch(
    store: &mut MetadataStore,
    candidates: &[String],
    force: bool,
) -> AnalysisSummary {
    let pending: Vec<&String> = candidates
        .iter()
        .filter(|key| {
            if store
                .get_record(key)
                .is_some_and(|r| r.manual_override)
            {
                return false;
            }
            if force {
                return true;
            }
            match fingerprint(Path::new(key.as_str())) {
                Some(fp) => store.needs_analysis(key, &fp),
                None => true,
            }
        })
        .collect();

    let total = pending.len();
    let skipped = candidates.len() - total;
    if total == 0 {
        return AnalysisSummary {
            skipped,
            ..Default::default()
        };
    }

    let processed = AtomicUsize::new(0);
    let results: Vec<(String, Result<ImageRecord>)> = pending
        .par_iter()
        .map(|key| {
            let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 25 == 0 || count == total {
                eprint!("\rAnalyzing... {}/{}", count, total);
            }
            ((*key).clone(), analyze_image(Path::new(key.as_str())))
        })
        .collect();
    eprintln!(" done!");

    let mut summary = AnalysisSummary {
        skipped,
        ..Default::default()
    };
    let mut batch = HashMap::with_capacity(results.len());
    for (key, result) in results {
        match result {
            Ok(mut record) => {
                if let Some(existing) = store.get_record(&key) {
                    record.custom_tags = existing.custom_tags.clone();
                }
                debug!(
                    image = %key,
                    luminosity = record.luminosity,
                    classification = record.classification.name(),
                    "analyzed"
                );
                batch.insert(key, record);
                summary.analyzed += 1;
            }
            Err(e) => {
                eprintln!("⚠ Failed to analyze {}: {}", key, e);
                summary.failed += 1;
            }
        }
    }
    store.upsert_batch(batch);
    summary
}
