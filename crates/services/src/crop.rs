//! Crop-selection geometry and sequential output naming for the manual
//! annotation workflow.
//!
//! Window and mouse handling live in the presentation layer; this module
//! owns the math that turns two drag corners into a usable crop region and
//! the numbering scheme that keeps output files from colliding.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::pipeline::ensure_dir;
use image::DynamicImage;

//
// ─── CROP RECT ─────────────────────────────────────────────────────────────────
//

/// Axis-aligned crop region with positive extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    left: u32,
    top: u32,
    width: u32,
    height: u32,
}

impl CropRect {
    /// Build a rectangle from two drag corners given in any order.
    ///
    /// A drag can move up or left, producing negative extents; corners are
    /// reordered so width and height come out positive. Coordinates outside
    /// the canvas are clamped to zero.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::EmptySelection` when the corners span no
    /// area.
    pub fn from_corners(a: (i64, i64), b: (i64, i64)) -> Result<Self, PipelineError> {
        let (left, right) = if b.0 < a.0 { (b.0, a.0) } else { (a.0, b.0) };
        let (top, bottom) = if b.1 < a.1 { (b.1, a.1) } else { (a.1, b.1) };

        let left = left.max(0);
        let top = top.max(0);
        let width = (right - left).max(0);
        let height = (bottom - top).max(0);
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptySelection);
        }

        Ok(Self {
            left: u32::try_from(left).unwrap_or(u32::MAX),
            top: u32::try_from(top).unwrap_or(u32::MAX),
            width: u32::try_from(width).unwrap_or(u32::MAX),
            height: u32::try_from(height).unwrap_or(u32::MAX),
        })
    }

    #[must_use]
    pub fn left(&self) -> u32 {
        self.left
    }

    #[must_use]
    pub fn top(&self) -> u32 {
        self.top
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Apply this rectangle to an image, clamping it to the image bounds.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::EmptySelection` when the clamped region has
    /// no overlap with the image.
    pub fn apply(&self, im: &DynamicImage) -> Result<DynamicImage, PipelineError> {
        let width = self.width.min(im.width().saturating_sub(self.left));
        let height = self.height.min(im.height().saturating_sub(self.top));
        if width == 0 || height == 0 {
            return Err(PipelineError::EmptySelection);
        }
        Ok(im.crop_imm(self.left, self.top, width, height))
    }
}

//
// ─── OUTPUT NAMER ──────────────────────────────────────────────────────────────
//

/// Allocates sequential `prefix###.ext` output paths, continuing after any
/// files already present so earlier crops are never overwritten.
#[derive(Debug)]
pub struct OutputNamer {
    folder: PathBuf,
    prefix: String,
    extension: String,
    next_index: usize,
}

impl OutputNamer {
    /// Open a namer over an existing output directory.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::NotADirectory` for a bad directory and wraps
    /// I/O failures while counting existing outputs.
    pub fn open(
        folder: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let folder = folder.into();
        let prefix = prefix.into();
        ensure_dir(&folder)?;

        let mut existing = 0;
        for entry in fs::read_dir(&folder)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(prefix.as_str()) {
                existing += 1;
            }
        }

        Ok(Self {
            folder,
            prefix,
            extension: extension.into(),
            next_index: existing,
        })
    }

    /// Index the next allocated path will carry.
    #[must_use]
    pub fn pending_index(&self) -> usize {
        self.next_index
    }

    /// Allocate the next output path.
    pub fn next_path(&mut self) -> PathBuf {
        let name = format!("{}{:03}.{}", self.prefix, self.next_index, self.extension);
        self.next_index += 1;
        self.folder.join(name)
    }
}

/// Crop `input` by `rect` and write the next numbered output file.
///
/// # Errors
///
/// Wraps imaging/I/O failures; returns `PipelineError::EmptySelection` when
/// the rectangle misses the image entirely.
pub fn crop_to_next(
    input: &Path,
    rect: CropRect,
    namer: &mut OutputNamer,
) -> Result<PathBuf, PipelineError> {
    let im = image::open(input)?;
    let cropped = rect.apply(&im)?;
    let out = namer.next_path();
    cropped.save(&out)?;
    log::info!("saved crop {}", out.display());
    Ok(out)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn corners_normalize_in_any_order() {
        let forward = CropRect::from_corners((10, 20), (30, 50)).unwrap();
        let backward = CropRect::from_corners((30, 50), (10, 20)).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.left(), 10);
        assert_eq!(forward.top(), 20);
        assert_eq!(forward.width(), 20);
        assert_eq!(forward.height(), 30);
    }

    #[test]
    fn mixed_direction_drag_normalizes() {
        // dragged right but up
        let rect = CropRect::from_corners((10, 50), (30, 20)).unwrap();
        assert_eq!((rect.left(), rect.top()), (10, 20));
        assert_eq!((rect.width(), rect.height()), (20, 30));
    }

    #[test]
    fn negative_coordinates_clamp_to_zero() {
        let rect = CropRect::from_corners((-5, -5), (10, 10)).unwrap();
        assert_eq!((rect.left(), rect.top()), (0, 0));
        assert_eq!((rect.width(), rect.height()), (10, 10));
    }

    #[test]
    fn degenerate_selection_is_rejected() {
        assert!(matches!(
            CropRect::from_corners((10, 10), (10, 40)),
            Err(PipelineError::EmptySelection)
        ));
        assert!(matches!(
            CropRect::from_corners((3, 3), (3, 3)),
            Err(PipelineError::EmptySelection)
        ));
    }

    #[test]
    fn apply_clamps_to_image_bounds() {
        let im = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([1, 2, 3])));
        let rect = CropRect::from_corners((30, 30), (100, 100)).unwrap();
        let cropped = rect.apply(&im).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));

        let outside = CropRect::from_corners((50, 50), (60, 60)).unwrap();
        assert!(matches!(
            outside.apply(&im),
            Err(PipelineError::EmptySelection)
        ));
    }

    #[test]
    fn namer_continues_after_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("apple000.png"), b"").unwrap();
        fs::write(dir.path().join("apple001.png"), b"").unwrap();
        fs::write(dir.path().join("grape000.png"), b"").unwrap();

        let mut namer = OutputNamer::open(dir.path(), "apple", "png").unwrap();
        assert_eq!(namer.pending_index(), 2);
        assert_eq!(
            namer.next_path(),
            dir.path().join("apple002.png")
        );
        assert_eq!(
            namer.next_path(),
            dir.path().join("apple003.png")
        );
    }

    #[test]
    fn crop_to_next_writes_numbered_output() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("source.png");
        RgbImage::from_pixel(40, 40, Rgb([9, 9, 9]))
            .save(&input)
            .unwrap();

        let out_dir = TempDir::new().unwrap();
        let mut namer = OutputNamer::open(out_dir.path(), "crop", "png").unwrap();
        let rect = CropRect::from_corners((5, 5), (25, 35)).unwrap();
        let out = crop_to_next(&input, rect, &mut namer).unwrap();

        assert_eq!(out, out_dir.path().join("crop000.png"));
        let written = image::open(&out).unwrap();
        assert_eq!(written.dimensions(), (20, 30));
    }
}
