use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur when resolving a category by name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unknown category: {0}")]
    InvalidCategory(String),
}

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

const FRUIT: &[&str] = &["apple", "grape", "banana", "pineapple"];

const FRUITS_VEG_NO_CONFLICT: &[&str] = &[
    "apple",
    "grape",
    "banana",
    "pineapple",
    "broccoli",
    "carrot",
    "corn",
    "mushrooms",
];

const FRUITS_VEG_CONFLICT: &[&str] = &[
    "apple",
    "grape",
    "banana",
    "pineapple",
    "broccoli",
    "carrot",
    "corn",
    "mushrooms",
    "potato",
    "onion",
];

const GESTURES: &[&str] = &[
    "thumbs_up",
    "thumbs_down",
    "OK_sign",
    "peace_sign",
    "stop_sign",
];

/// A named group of comparable item labels used to build trials.
///
/// The catalog is fixed at compile time; it maps each category to its member
/// item labels in declaration order. It holds no image data — whether an item
/// actually has stimulus images is checked against the stimulus store at
/// session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    /// Four fruits only.
    Fruit,
    /// Fruits plus vegetables with no visual conflict with the fruits.
    FruitsVegNoConflict,
    /// Fruits plus vegetables including visually conflicting ones.
    FruitsVegConflict,
    /// Hand gestures.
    Gestures,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 4] = [
        Category::Fruit,
        Category::FruitsVegNoConflict,
        Category::FruitsVegConflict,
        Category::Gestures,
    ];

    /// Resolves a category from its external name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidCategory` if the name is not in the
    /// catalog.
    pub fn from_name(name: &str) -> Result<Self, CatalogError> {
        match name {
            "fruit" => Ok(Self::Fruit),
            "fruitsVegNoConflict" => Ok(Self::FruitsVegNoConflict),
            "fruitsVegConflict" => Ok(Self::FruitsVegConflict),
            "gestures" => Ok(Self::Gestures),
            other => Err(CatalogError::InvalidCategory(other.to_string())),
        }
    }

    /// The external name of this category, as accepted by `from_name`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Fruit => "fruit",
            Self::FruitsVegNoConflict => "fruitsVegNoConflict",
            Self::FruitsVegConflict => "fruitsVegConflict",
            Self::Gestures => "gestures",
        }
    }

    /// Member item labels, in declaration order. Unique within a category.
    #[must_use]
    pub fn members(self) -> &'static [&'static str] {
        match self {
            Self::Fruit => FRUIT,
            Self::FruitsVegNoConflict => FRUITS_VEG_NO_CONFLICT,
            Self::FruitsVegConflict => FRUITS_VEG_CONFLICT,
            Self::Gestures => GESTURES,
        }
    }

    /// Returns true if `item` is a member of this category.
    #[must_use]
    pub fn contains(self, item: &str) -> bool {
        self.members().contains(&item)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
