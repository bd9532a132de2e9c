//! Mode catalog
//!
//! Static, read-only registry of visual styles. Each entry maps an id to a
//! display name, an icon and the instruction sent to the transformation
//! gateway. Insertion order is the display order.
//!
//! `custom` and `random` are never stored here but are accepted anywhere a
//! mode id is (see `parse_selection`).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BoothError, ConfigError};
use crate::state::mode::{ModeSelection, ResolvedMode, CUSTOM_MODE_ID, RANDOM_MODE_ID};

pub const CUSTOM_ICON: &str = "✏️";
pub const RANDOM_ICON: &str = "🎲";

const CUSTOM_EMPTY_HINT: &str = "Click to set a custom prompt";
const RANDOM_HINT: &str = "Apply a random effect!";

/// A single catalog style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDescriptor {
    pub id: String,
    pub name: String,
    pub icon: String,
    #[serde(alias = "prompt")]
    pub instruction: String,
}

impl ModeDescriptor {
    fn new(id: &str, name: &str, icon: &str, instruction: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            instruction: instruction.to_string(),
        }
    }
}

/// One button of the mode selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub id: String,
    pub name: String,
    pub icon: String,
}

/// The ordered, immutable set of catalog modes
#[derive(Debug, Clone)]
pub struct ModeCatalog {
    entries: Vec<ModeDescriptor>,
    index: HashMap<String, usize>,
}

impl ModeCatalog {
    /// Build a catalog from entries, preserving their order.
    ///
    /// Rejects an empty list, duplicate ids, the reserved ids and blank
    /// instructions.
    pub fn from_entries(entries: Vec<ModeDescriptor>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::Validation("mode catalog is empty".into()));
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if entry.id == CUSTOM_MODE_ID || entry.id == RANDOM_MODE_ID {
                return Err(ConfigError::Validation(format!(
                    "mode id '{}' is reserved",
                    entry.id
                )));
            }
            if entry.instruction.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "mode '{}' has an empty instruction",
                    entry.id
                )));
            }
            if index.insert(entry.id.clone(), position).is_some() {
                return Err(ConfigError::Validation(format!(
                    "duplicate mode id '{}'",
                    entry.id
                )));
            }
        }

        Ok(Self { entries, index })
    }

    /// The styles shipped with the booth
    pub fn builtin() -> Self {
        let entries = builtin_entries();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id.clone(), position))
            .collect();
        Self { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&ModeDescriptor> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn entries(&self) -> &[ModeDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry in display order; a catalog is never empty
    pub fn first(&self) -> &ModeDescriptor {
        &self.entries[0]
    }

    /// Map a mode id to a selection, accepting the synthetic modes
    pub fn parse_selection(&self, id: &str) -> Result<ModeSelection, BoothError> {
        match id {
            CUSTOM_MODE_ID => Ok(ModeSelection::Custom),
            RANDOM_MODE_ID => Ok(ModeSelection::Random),
            _ if self.contains(id) => Ok(ModeSelection::Catalog(id.to_string())),
            _ => Err(BoothError::UnknownMode(id.to_string())),
        }
    }

    /// Instruction text for a mode id.
    ///
    /// Catalog ids yield their fixed instruction, `custom` yields
    /// `custom_text` verbatim. `random` and unknown ids yield `None`: random
    /// has to be picked first. Blank custom text is the caller's problem.
    pub fn resolve<'a>(&'a self, mode_id: &str, custom_text: &'a str) -> Option<&'a str> {
        match mode_id {
            CUSTOM_MODE_ID => Some(custom_text),
            RANDOM_MODE_ID => None,
            _ => self.get(mode_id).map(|entry| entry.instruction.as_str()),
        }
    }

    /// Instruction text for a mode already resolved at capture time
    pub fn instruction_for<'a>(&'a self, mode: &'a ResolvedMode) -> Option<&'a str> {
        match mode {
            ResolvedMode::Catalog(id) => self.get(id).map(|entry| entry.instruction.as_str()),
            ResolvedMode::Custom(text) => Some(text),
        }
    }

    /// Uniform choice over catalog entries
    pub fn pick_random(&self) -> &ModeDescriptor {
        self.pick_random_with(&mut rand::thread_rng())
    }

    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &ModeDescriptor {
        &self.entries[rng.gen_range(0..self.entries.len())]
    }

    /// Selector buttons in display order: custom, random, then the catalog
    pub fn selector(&self) -> Vec<SelectorEntry> {
        let synthetic = [
            (CUSTOM_MODE_ID, "Custom", CUSTOM_ICON),
            (RANDOM_MODE_ID, "Random", RANDOM_ICON),
        ];

        synthetic
            .iter()
            .map(|(id, name, icon)| SelectorEntry {
                id: id.to_string(),
                name: name.to_string(),
                icon: icon.to_string(),
            })
            .chain(self.entries.iter().map(|entry| SelectorEntry {
                id: entry.id.clone(),
                name: entry.name.clone(),
                icon: entry.icon.clone(),
            }))
            .collect()
    }

    /// Hover text describing what a mode will do
    pub fn hint(&self, selection: &ModeSelection, custom_text: &str) -> String {
        match selection {
            ModeSelection::Custom if custom_text.trim().is_empty() => CUSTOM_EMPTY_HINT.to_string(),
            ModeSelection::Custom => format!("\"{custom_text}\""),
            ModeSelection::Random => RANDOM_HINT.to_string(),
            ModeSelection::Catalog(id) => self
                .get(id)
                .map(|entry| format!("\"{}\"", entry.instruction))
                .unwrap_or_default(),
        }
    }

    /// Badge shown on a captured photo
    pub fn icon_for(&self, mode: &ResolvedMode) -> &str {
        match mode {
            ResolvedMode::Custom(_) => CUSTOM_ICON,
            ResolvedMode::Catalog(id) => self.get(id).map_or("", |entry| entry.icon.as_str()),
        }
    }
}

impl Default for ModeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_entries() -> Vec<ModeDescriptor> {
    vec![
        ModeDescriptor::new(
            "renaissance",
            "Renaissance",
            "🎨",
            "Make the person in the photo look like a Renaissance painting.",
        ),
        ModeDescriptor::new(
            "cartoon",
            "Cartoon",
            "😃",
            "Transform this image into a cute simple cartoon. Use minimal lines and solid colors.",
        ),
        ModeDescriptor::new(
            "statue",
            "Statue",
            "🏛️",
            "Make the person look like a classical marble statue, including the clothes and eyes.",
        ),
        ModeDescriptor::new(
            "80s",
            "80s",
            "✨",
            "Make the person in the photo look like a 1980s yearbook photo. Feel free to change the hairstyle and clothing.",
        ),
        ModeDescriptor::new(
            "19century",
            "19th Cent.",
            "🎩",
            "Make the photo look like a 19th century daguerreotype. Feel free to change the background to make it period appropriate and add props like Victorian clothing. Try to keep the perspective the same.",
        ),
        ModeDescriptor::new(
            "anime",
            "Anime",
            "🍣",
            "Make the person in the photo look like a photorealistic anime character with exaggerated features.",
        ),
        ModeDescriptor::new(
            "psychedelic",
            "Psychedelic",
            "🌈",
            "Create a 1960s psychedelic hand-drawn poster-style illustration based on this image with bright bold solid colors and swirling shapes. Don't add any text.",
        ),
        ModeDescriptor::new(
            "8bit",
            "8-bit",
            "🎮",
            "Transform this image into a minimalist 8-bit brightly colored cute pixel art scene on a 80x80 pixel grid.",
        ),
        ModeDescriptor::new(
            "beard",
            "Big Beard",
            "🧔🏻",
            "Make the person in the photo look like they have a huge beard.",
        ),
        ModeDescriptor::new(
            "claymation",
            "Claymation",
            "👐",
            "Transform the person into a claymation character, like in stop-motion animation. Give them exaggerated features and a textured, fingerprint-like finish on the clay.",
        ),
        ModeDescriptor::new(
            "comic",
            "Comic Book",
            "💥",
            "Transform the photo into a comic book panel with bold outlines, halftone dots, and speech bubbles.",
        ),
        ModeDescriptor::new(
            "old",
            "Old",
            "👵🏻",
            "Make the person in the photo look extremely old.",
        ),
        ModeDescriptor::new(
            "noir",
            "Film Noir",
            "🕵️",
            "Make the photo look like a still from a 1940s film noir movie. Convert it to black and white with high contrast and dramatic shadows.",
        ),
        ModeDescriptor::new(
            "sketch",
            "Sketch",
            "✍️",
            "Transform the photo into a detailed pencil sketch on textured paper. Keep the likeness of the person.",
        ),
        ModeDescriptor::new(
            "sticker",
            "Sticker",
            "💌",
            "Turn the person in the photo into a die-cut sticker with a thick white border. The background should be transparent.",
        ),
        ModeDescriptor::new(
            "goth",
            "Goth",
            "🦇",
            "Give the person a goth makeover. Think dark makeup, black clothing, and a moody, atmospheric background.",
        ),
        ModeDescriptor::new(
            "cyberpunk",
            "Cyberpunk",
            "🤖",
            "Transform the photo into a cyberpunk scene. Add neon lights, futuristic clothing, and a dystopian city background.",
        ),
        ModeDescriptor::new(
            "watercolor",
            "Watercolor",
            "🖌️",
            "Make the photo look like a watercolor painting with soft, blended colors and visible brushstrokes.",
        ),
        ModeDescriptor::new(
            "gigachad",
            "Gigachad",
            "🗿",
            "Make the people in this image look like gigachad, 4k quality, perfect lighting, perfect, chiseled.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_order_and_lookup() {
        let catalog = ModeCatalog::builtin();
        assert_eq!(catalog.first().id, "renaissance");
        assert_eq!(catalog.len(), 19);
        assert_eq!(catalog.get("noir").map(|m| m.name.as_str()), Some("Film Noir"));
        assert!(!catalog.contains("custom"));
        assert!(!catalog.contains("random"));
    }

    #[test]
    fn test_resolve() {
        let catalog = ModeCatalog::builtin();
        assert_eq!(
            catalog.resolve("old", ""),
            Some("Make the person in the photo look extremely old.")
        );
        assert_eq!(catalog.resolve("custom", "  keep spaces "), Some("  keep spaces "));
        assert_eq!(catalog.resolve("random", "ignored"), None);
        assert_eq!(catalog.resolve("nope", ""), None);
    }

    #[test]
    fn test_parse_selection() {
        let catalog = ModeCatalog::builtin();
        assert_eq!(catalog.parse_selection("custom"), Ok(ModeSelection::Custom));
        assert_eq!(catalog.parse_selection("random"), Ok(ModeSelection::Random));
        assert_eq!(
            catalog.parse_selection("anime"),
            Ok(ModeSelection::Catalog("anime".into()))
        );
        assert_eq!(
            catalog.parse_selection("vaporwave"),
            Err(BoothError::UnknownMode("vaporwave".into()))
        );
    }

    #[test]
    fn test_pick_random_covers_catalog_only() {
        let catalog = ModeCatalog::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            let picked = catalog.pick_random_with(&mut rng);
            assert!(catalog.contains(&picked.id));
            seen.insert(picked.id.clone());
        }
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn test_selector_lists_synthetic_modes_first() {
        let catalog = ModeCatalog::builtin();
        let selector = catalog.selector();
        assert_eq!(selector.len(), catalog.len() + 2);
        assert_eq!(selector[0].id, "custom");
        assert_eq!(selector[1].id, "random");
        assert_eq!(selector[2].id, "renaissance");
    }

    #[test]
    fn test_hints() {
        let catalog = ModeCatalog::builtin();
        assert_eq!(catalog.hint(&ModeSelection::Custom, "   "), CUSTOM_EMPTY_HINT);
        assert_eq!(catalog.hint(&ModeSelection::Custom, "blue"), "\"blue\"");
        assert_eq!(catalog.hint(&ModeSelection::Random, ""), RANDOM_HINT);
        assert!(catalog
            .hint(&ModeSelection::Catalog("sketch".into()), "")
            .contains("pencil sketch"));
    }

    #[test]
    fn test_icon_for_custom_record() {
        let catalog = ModeCatalog::builtin();
        assert_eq!(catalog.icon_for(&ResolvedMode::Custom("x".into())), CUSTOM_ICON);
        assert_eq!(catalog.icon_for(&ResolvedMode::Catalog("8bit".into())), "🎮");
    }

    #[test]
    fn test_from_entries_validation() {
        let ok = ModeCatalog::from_entries(vec![ModeDescriptor::new("a", "A", "🅰️", "do a")]);
        assert!(ok.is_ok());

        assert!(ModeCatalog::from_entries(vec![]).is_err());
        assert!(ModeCatalog::from_entries(vec![ModeDescriptor::new("random", "R", "", "x")]).is_err());
        assert!(ModeCatalog::from_entries(vec![ModeDescriptor::new("a", "A", "", "  ")]).is_err());
        assert!(ModeCatalog::from_entries(vec![
            ModeDescriptor::new("a", "A", "", "x"),
            ModeDescriptor::new("a", "B", "", "y"),
        ])
        .is_err());
    }
}
