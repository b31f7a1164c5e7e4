//! Stimulus image lookup with bounded-retry reuse avoidance.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::error::StimulusError;

/// How many redraws to attempt before giving up and reusing an image that
/// was already shown this session.
const RETRY_LIMIT: usize = 50;

/// Whether a pick found an image not yet shown this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    /// Every candidate had been shown already; one is being repeated.
    Reused,
}

/// One resolved stimulus image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusPick {
    path: PathBuf,
    freshness: Freshness,
}

impl StimulusPick {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.freshness == Freshness::Fresh
    }
}

/// Directory of prepared stimulus images, keyed by file-name prefix.
///
/// An image belongs to an item when its file name starts with the item
/// label, matching how the prep pipeline names its outputs.
#[derive(Debug, Clone)]
pub struct StimulusStore {
    root: PathBuf,
}

impl StimulusStore {
    /// Open a store over an existing directory.
    ///
    /// # Errors
    ///
    /// Returns `StimulusError::MissingRoot` if `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StimulusError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StimulusError::MissingRoot { path: root });
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All image paths for `item`, sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns `StimulusError::Io` if the directory cannot be read.
    pub fn images_for(&self, item: &str) -> Result<Vec<PathBuf>, StimulusError> {
        let mut matches = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(item) {
                matches.push(path);
            }
        }
        matches.sort();
        Ok(matches)
    }

    /// True when `item` has at least one image available.
    ///
    /// # Errors
    ///
    /// Returns `StimulusError::Io` if the directory cannot be read.
    pub fn has_resources(&self, item: &str) -> Result<bool, StimulusError> {
        Ok(!self.images_for(item)?.is_empty())
    }

    /// Pick an image for `item`, preferring one not in `shown`.
    ///
    /// Draws uniformly at random; if the draw was already shown it redraws,
    /// up to `RETRY_LIMIT` times. When the pool is exhausted the pick
    /// degrades to `Freshness::Reused` rather than failing.
    ///
    /// # Errors
    ///
    /// Returns `StimulusError::NoImages` if `item` has no images at all.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        item: &str,
        shown: &[PathBuf],
        rng: &mut R,
    ) -> Result<StimulusPick, StimulusError> {
        let candidates = self.images_for(item)?;
        let Some(first) = candidates.choose(rng) else {
            return Err(StimulusError::NoImages {
                item: item.to_string(),
                dir: self.root.clone(),
            });
        };

        let mut choice = first.clone();
        let mut attempts = 0;
        while shown.contains(&choice) && attempts < RETRY_LIMIT {
            if let Some(redraw) = candidates.choose(rng) {
                choice = redraw.clone();
            }
            attempts += 1;
        }

        let freshness = if shown.contains(&choice) {
            log::warn!("image pool for {item} exhausted, reusing {}", choice.display());
            Freshness::Reused
        } else {
            Freshness::Fresh
        };

        Ok(StimulusPick {
            path: choice,
            freshness,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn store_with(files: &[&str]) -> (TempDir, StimulusStore) {
        let dir = TempDir::new().unwrap();
        for name in files {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let store = StimulusStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_root_is_rejected() {
        let err = StimulusStore::open("/no/such/dir").unwrap_err();
        assert!(matches!(err, StimulusError::MissingRoot { .. }));
    }

    #[test]
    fn images_match_by_prefix_and_are_sorted() {
        let (_dir, store) =
            store_with(&["apple_002.png", "apple_001.png", "grape_001.png", "notes.txt"]);

        let apples = store.images_for("apple").unwrap();
        let names: Vec<_> = apples
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["apple_001.png", "apple_002.png"]);

        assert!(store.has_resources("grape").unwrap());
        assert!(!store.has_resources("banana").unwrap());
    }

    #[test]
    fn pick_without_images_fails() {
        let (_dir, store) = store_with(&["grape_001.png"]);
        let err = store
            .pick("apple", &[], &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, StimulusError::NoImages { item, .. } if item == "apple"));
    }

    #[test]
    fn pick_avoids_shown_images_while_some_remain() {
        let (_dir, store) = store_with(&["apple_001.png", "apple_002.png", "apple_003.png"]);
        let mut rng = StdRng::seed_from_u64(5);

        let mut shown = Vec::new();
        for _ in 0..3 {
            let pick = store.pick("apple", &shown, &mut rng).unwrap();
            assert!(pick.is_fresh());
            assert!(!shown.contains(&pick.path().to_path_buf()));
            shown.push(pick.path().to_path_buf());
        }
    }

    #[test]
    fn pick_degrades_to_reuse_when_pool_is_exhausted() {
        let (_dir, store) = store_with(&["apple_001.png", "apple_002.png"]);
        let mut rng = StdRng::seed_from_u64(5);

        let shown: Vec<PathBuf> = store.images_for("apple").unwrap();
        let pick = store.pick("apple", &shown, &mut rng).unwrap();
        assert_eq!(pick.freshness(), Freshness::Reused);
        assert!(shown.contains(&pick.path().to_path_buf()));
    }
}
