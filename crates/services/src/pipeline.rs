//! Batch preparation of stimulus images: format conversion, grayscale
//! downsampling, and dark padding.
//!
//! Each stage walks a directory, processes the files that qualify, and
//! skips the rest with a warning, reporting counts for both.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use image::imageops::{self, FilterType};

use crate::error::PipelineError;

/// Default edge length of a prepared stimulus, in pixels.
pub const STIMULUS_WIDTH: u32 = 50;

/// Edge length of the dark-padded canvas, in pixels.
pub const PADDED_WIDTH: u32 = 120;

/// Offset at which a stimulus is pasted onto the padded canvas.
const PAD_OFFSET: i64 = 35;

/// Per-stage counts of processed and skipped files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub processed: usize,
    pub skipped: usize,
}

/// Convert every jpg in `input_dir` to png under `output_dir`; existing
/// pngs are copied through unchanged. Other files are skipped.
///
/// # Errors
///
/// Returns `PipelineError::NotADirectory` for bad directories and wraps
/// imaging/I/O failures.
pub fn convert_to_png(input_dir: &Path, output_dir: &Path) -> Result<StageReport, PipelineError> {
    ensure_dir(input_dir)?;
    ensure_dir(output_dir)?;

    let mut report = StageReport::default();
    for path in files_in(input_dir)? {
        match extension_of(&path).as_deref() {
            Some("jpg" | "jpeg") => {
                let im = image::open(&path)?;
                let out = output_dir.join(png_name(&path));
                im.save(&out)?;
                log::info!("converted {} -> {}", path.display(), out.display());
                report.processed += 1;
            }
            Some("png") => {
                let out = output_dir.join(file_name(&path));
                fs::copy(&path, &out)?;
                report.processed += 1;
            }
            _ => {
                log::warn!("{} is not a valid picture, skipping", path.display());
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

/// Turn every png in `dir` grayscale and resize it to
/// `pixel_width x pixel_width`, saving in place.
///
/// # Errors
///
/// Returns `PipelineError::NotADirectory` for a bad directory and wraps
/// imaging/I/O failures.
pub fn grayscale_downsample(dir: &Path, pixel_width: u32) -> Result<StageReport, PipelineError> {
    ensure_dir(dir)?;

    let mut report = StageReport::default();
    for path in png_files(dir)? {
        let im = image::open(&path)?.into_luma_alpha8();
        let im = imageops::resize(&im, pixel_width, pixel_width, FilterType::Triangle);
        im.save(&path)?;
        log::info!("finished processing {}", file_name(&path));
        report.processed += 1;
    }
    Ok(report)
}

/// Paste every 50x50 png from `input_dir` onto a black 120x120 canvas and
/// write it under `output_dir`. Inputs of any other size are skipped.
///
/// # Errors
///
/// Returns `PipelineError::NotADirectory` for bad directories and wraps
/// imaging/I/O failures.
pub fn dark_pad(input_dir: &Path, output_dir: &Path) -> Result<StageReport, PipelineError> {
    ensure_dir(input_dir)?;
    ensure_dir(output_dir)?;

    let mut report = StageReport::default();
    for path in png_files(input_dir)? {
        let im = image::open(&path)?;
        if im.width() != STIMULUS_WIDTH || im.height() != STIMULUS_WIDTH {
            log::warn!(
                "input image {} is not {STIMULUS_WIDTH}x{STIMULUS_WIDTH}, skipping",
                file_name(&path)
            );
            report.skipped += 1;
            continue;
        }

        let mut canvas = RgbImage::new(PADDED_WIDTH, PADDED_WIDTH);
        imageops::overlay(&mut canvas, &im.into_rgb8(), PAD_OFFSET, PAD_OFFSET);
        canvas.save(output_dir.join(file_name(&path)))?;
        log::info!("adding dark padding to {}", file_name(&path));
        report.processed += 1;
    }
    Ok(report)
}

pub(crate) fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(PipelineError::NotADirectory {
            path: path.to_path_buf(),
        })
    }
}

fn files_in(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn png_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = files_in(dir)?;
    files.retain(|p| extension_of(p).as_deref() == Some("png"));
    Ok(files)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn png_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}.png")
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb};
    use tempfile::TempDir;

    fn write_rgb(path: &Path, width: u32, height: u32) {
        let im = RgbImage::from_pixel(width, height, Rgb([200, 60, 60]));
        im.save(path).unwrap();
    }

    #[test]
    fn convert_handles_jpg_png_and_junk() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_rgb(&input.path().join("apple_000.jpg"), 8, 8);
        write_rgb(&input.path().join("apple_001.png"), 8, 8);
        fs::write(input.path().join("notes.txt"), b"not an image").unwrap();

        let report = convert_to_png(input.path(), output.path()).unwrap();
        assert_eq!(report, StageReport { processed: 2, skipped: 1 });

        assert!(output.path().join("apple_000.png").is_file());
        assert!(output.path().join("apple_001.png").is_file());
        assert!(!output.path().join("notes.txt").exists());
    }

    #[test]
    fn downsample_grayscales_and_resizes_in_place() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apple_000.png");
        write_rgb(&path, 80, 120);

        let report = grayscale_downsample(dir.path(), 50).unwrap();
        assert_eq!(report.processed, 1);

        let im = image::open(&path).unwrap();
        assert_eq!(im.dimensions(), (50, 50));
        assert_eq!(im.color(), image::ColorType::La8);
    }

    #[test]
    fn dark_pad_pads_50x50_and_skips_others() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_rgb(&input.path().join("apple_000.png"), 50, 50);
        write_rgb(&input.path().join("apple_001.png"), 60, 60);

        let report = dark_pad(input.path(), output.path()).unwrap();
        assert_eq!(report, StageReport { processed: 1, skipped: 1 });

        let padded = image::open(output.path().join("apple_000.png")).unwrap();
        assert_eq!(padded.dimensions(), (120, 120));
        // corners stay dark, the pasted region keeps the source color
        let rgb = padded.into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(rgb.get_pixel(60, 60), &Rgb([200, 60, 60]));
        assert!(!output.path().join("apple_001.png").exists());
    }

    #[test]
    fn stages_reject_missing_directories() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            grayscale_downsample(&missing, 50),
            Err(PipelineError::NotADirectory { .. })
        ));
        assert!(matches!(
            convert_to_png(&missing, dir.path()),
            Err(PipelineError::NotADirectory { .. })
        ));
    }
}
