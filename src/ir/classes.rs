//! The set of class names a box may carry.

use std::collections::BTreeSet;

use serde::Serialize;

/// Vocabulary every session starts with.
pub const PREDEFINED_CLASSES: [&str; 5] = ["palma", "tenar", "hipotenar", "infradigital", "lateral"];

/// Trims and lower-cases a user-supplied class name.
pub fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Known class names, kept sorted.
///
/// Sorted order is also the YOLO class index order written to
/// `classes.txt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KnownClasses {
    seed: Vec<String>,
    names: BTreeSet<String>,
}

impl KnownClasses {
    /// Creates a set seeded with the given vocabulary.
    pub fn with_vocabulary<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let seed: Vec<String> = vocabulary
            .into_iter()
            .map(|name| normalize_label(name.as_ref()))
            .filter(|name| !name.is_empty())
            .collect();
        let names = seed.iter().cloned().collect();
        Self { seed, names }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.names.contains(label)
    }

    /// Adds a label. Returns true if it was not known before.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = normalize_label(label);
        if label.is_empty() {
            return false;
        }
        self.names.insert(label)
    }

    /// Drops every discovered label and restores the seed vocabulary.
    pub fn reset(&mut self) {
        self.names = self.seed.iter().cloned().collect();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Sorted class list, as used for YOLO class indices.
    pub fn sorted(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn first(&self) -> Option<&str> {
        self.names.iter().next().map(String::as_str)
    }
}

impl Default for KnownClasses {
    fn default() -> Self {
        Self::with_vocabulary(PREDEFINED_CLASSES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_seeded_and_sorted() {
        let classes = KnownClasses::default();
        assert_eq!(
            classes.sorted(),
            vec!["hipotenar", "infradigital", "lateral", "palma", "tenar"]
        );
        assert_eq!(classes.first(), Some("hipotenar"));
    }

    #[test]
    fn insert_normalizes_and_reset_restores_seed() {
        let mut classes = KnownClasses::default();
        assert!(classes.insert("  Dorso "));
        assert!(classes.contains("dorso"));
        assert!(!classes.insert("dorso"));
        assert!(!classes.insert("   "));

        classes.reset();
        assert!(!classes.contains("dorso"));
        assert_eq!(classes.len(), PREDEFINED_CLASSES.len());
    }

    #[test]
    fn normalize_label_trims_and_lowercases() {
        assert_eq!(normalize_label("  PaLmA\t"), "palma");
    }
}
