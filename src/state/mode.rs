//! Mode selection and resolution
//!
//! A `ModeSelection` is what the user has picked for the *next* capture.
//! At capture time it is resolved exactly once into a `ResolvedMode`,
//! which is stored on the photo and never touched again.

use std::fmt;

/// Reserved id of the free-text mode
pub const CUSTOM_MODE_ID: &str = "custom";
/// Reserved id of the randomized mode
pub const RANDOM_MODE_ID: &str = "random";

/// The active mode of a session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModeSelection {
    /// A catalog entry, by id
    Catalog(String),
    /// Use the session's custom prompt text
    Custom,
    /// Pick a catalog entry per photo
    Random,
}

impl ModeSelection {
    pub fn id(&self) -> &str {
        match self {
            ModeSelection::Catalog(id) => id,
            ModeSelection::Custom => CUSTOM_MODE_ID,
            ModeSelection::Random => RANDOM_MODE_ID,
        }
    }
}

impl fmt::Display for ModeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The mode a photo was actually captured with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedMode {
    /// Concrete catalog id (also what `random` resolves to)
    Catalog(String),
    /// Literal prompt text as it was at capture time
    Custom(String),
}

impl ResolvedMode {
    pub fn catalog_id(&self) -> Option<&str> {
        match self {
            ResolvedMode::Catalog(id) => Some(id),
            ResolvedMode::Custom(_) => None,
        }
    }

    /// Short label: the catalog id, or "custom"
    pub fn label(&self) -> &str {
        match self {
            ResolvedMode::Catalog(id) => id,
            ResolvedMode::Custom(_) => CUSTOM_MODE_ID,
        }
    }
}
