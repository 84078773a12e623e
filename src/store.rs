//! Annotation store: the per-image box lists and the known class set.
//!
//! The store is the only owner of committed boxes. Every mutation path
//! re-checks the one-label-per-image rule and the clamp-and-validate rule
//! before anything is written, so a rejected edit never leaves partial
//! state behind.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::error::BoxlabelError;
use crate::ir::{normalize_label, Annotation, BBoxXYXY, ImageSize, ImageSpace, KnownClasses};

/// A geometric edit applied to one committed box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxEdit {
    /// Replace the corners. Corners that have crossed are rejected rather
    /// than swapped.
    Resize(BBoxXYXY<ImageSpace>),
    /// Translate by an image-space offset, keeping the size.
    Translate { dx: f64, dy: f64 },
}

/// Why an incoming box was left out of a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The image already has a box with this label.
    Existing,
    /// The label appeared earlier in the same batch.
    InBatch,
    /// The geometry collapsed after clamping.
    Degenerate,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeConflict {
    pub label: String,
    pub kind: ConflictKind,
}

/// Result of [`AnnotationStore::merge`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub conflicts: Vec<MergeConflict>,
    /// Labels accepted in this merge that were not yet known classes.
    pub new_classes: Vec<String>,
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Boxes for every image, the cached image dimensions and the class set.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    images: BTreeMap<String, Vec<Annotation>>,
    dimensions: HashMap<String, ImageSize>,
    classes: KnownClasses,
}

impl AnnotationStore {
    pub fn new(classes: KnownClasses) -> Self {
        Self {
            images: BTreeMap::new(),
            dimensions: HashMap::new(),
            classes,
        }
    }

    /// Boxes of one image in insertion order (empty if none).
    pub fn boxes(&self, image: &str) -> &[Annotation] {
        self.images.get(image).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, image: &str, index: usize) -> Option<&Annotation> {
        self.boxes(image).get(index)
    }

    /// Images that carry at least one box, in name order.
    pub fn annotated_images(&self) -> impl Iterator<Item = (&str, &[Annotation])> {
        self.images
            .iter()
            .filter(|(_, boxes)| !boxes.is_empty())
            .map(|(name, boxes)| (name.as_str(), boxes.as_slice()))
    }

    pub fn total_boxes(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    pub fn classes(&self) -> &KnownClasses {
        &self.classes
    }

    pub fn register_class(&mut self, label: &str) -> bool {
        self.classes.insert(label)
    }

    pub fn set_dimensions(&mut self, image: &str, size: ImageSize) {
        self.dimensions.insert(image.to_string(), size);
    }

    pub fn dimensions(&self, image: &str) -> Option<ImageSize> {
        self.dimensions.get(image).copied()
    }

    /// Forgets all boxes and dimensions and restores the seed classes.
    pub fn clear(&mut self) {
        self.images.clear();
        self.dimensions.clear();
        self.classes.reset();
    }

    /// Adds a box and returns its index.
    ///
    /// The rect is clamped to the cached image dimensions when they are
    /// known; with unknown dimensions it is stored unclamped.
    pub fn add_box(
        &mut self,
        image: &str,
        rect: BBoxXYXY<ImageSpace>,
        label: &str,
    ) -> Result<usize, BoxlabelError> {
        let label = normalize_label(label);
        if label.is_empty() {
            return Err(BoxlabelError::EmptyLabel);
        }
        if self.has_label(image, &label, None) {
            return Err(BoxlabelError::DuplicateLabel {
                image: image.to_string(),
                label,
            });
        }

        let annotation = Annotation::new(self.clamp_for(image, rect.normalized()), label)?;
        log::info!("{image}: added box {}", annotation.summary());

        let boxes = self.images.entry(image.to_string()).or_default();
        boxes.push(annotation);
        Ok(boxes.len() - 1)
    }

    /// Relabels a box. Returns false when the label was already `new_label`.
    pub fn update_label(
        &mut self,
        image: &str,
        index: usize,
        new_label: &str,
    ) -> Result<bool, BoxlabelError> {
        let label = normalize_label(new_label);
        if label.is_empty() {
            return Err(BoxlabelError::EmptyLabel);
        }
        let current = self.require(image, index)?;
        if current.label() == label {
            return Ok(false);
        }
        if !self.classes.contains(&label) {
            return Err(BoxlabelError::InvalidClass { label });
        }
        if self.has_label(image, &label, Some(index)) {
            return Err(BoxlabelError::DuplicateLabel {
                image: image.to_string(),
                label,
            });
        }

        let annotation = self.require_mut(image, index)?;
        log::info!("{image}: relabeled box {index} '{}' -> '{label}'", annotation.label());
        annotation.set_label(label);
        Ok(true)
    }

    /// Applies a geometric edit through clamp-and-validate.
    ///
    /// On failure the committed geometry is left untouched.
    pub fn transform_box(
        &mut self,
        image: &str,
        index: usize,
        edit: BoxEdit,
    ) -> Result<&Annotation, BoxlabelError> {
        let current = *self.require(image, index)?.bbox();
        let dims = self.dimensions(image);

        let candidate = match edit {
            BoxEdit::Resize(corners) => {
                if !corners.is_ordered() {
                    return Err(BoxlabelError::DegenerateBox);
                }
                self.clamp_for(image, corners)
            }
            BoxEdit::Translate { dx, dy } => {
                let moved = current.translate(dx, dy);
                match dims {
                    Some(size) if size.is_valid() => {
                        moved.shift_inside(size.width as f64, size.height as f64)
                    }
                    _ => moved,
                }
            }
        };

        let candidate = candidate.normalized();
        if candidate.is_degenerate() {
            return Err(BoxlabelError::DegenerateBox);
        }
        let annotation = self.require_mut(image, index)?;
        annotation.set_bbox(candidate);
        log::info!("{image}: updated box {}", annotation.summary());
        Ok(annotation)
    }

    pub fn delete_box(&mut self, image: &str, index: usize) -> Result<Annotation, BoxlabelError> {
        self.require(image, index)?;
        let boxes = self.images.get_mut(image).ok_or_else(|| BoxlabelError::NotFound {
            image: image.to_string(),
            index,
        })?;
        let removed = boxes.remove(index);
        if boxes.is_empty() {
            self.images.remove(image);
        }
        log::info!("{image}: deleted box {}", removed.summary());
        Ok(removed)
    }

    /// Appends imported boxes; the first occurrence of each label wins.
    ///
    /// Accepted labels are registered as known classes.
    pub fn merge<I>(&mut self, image: &str, incoming: I) -> MergeOutcome
    where
        I: IntoIterator<Item = (String, BBoxXYXY<ImageSpace>)>,
    {
        let mut outcome = MergeOutcome::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (raw_label, rect) in incoming {
            let label = normalize_label(&raw_label);
            let conflict = if seen.contains(&label) {
                Some(ConflictKind::InBatch)
            } else if self.has_label(image, &label, None) {
                Some(ConflictKind::Existing)
            } else {
                None
            };
            if let Some(kind) = conflict {
                log::warn!("{image}: skipping imported '{label}' ({kind:?} duplicate)");
                outcome.conflicts.push(MergeConflict { label, kind });
                continue;
            }
            seen.insert(label.clone());

            let annotation = match Annotation::new(self.clamp_for(image, rect.normalized()), &label)
            {
                Ok(annotation) if !label.is_empty() => annotation,
                _ => {
                    log::warn!("{image}: skipping imported '{label}' with empty geometry or name");
                    outcome.conflicts.push(MergeConflict {
                        label,
                        kind: ConflictKind::Degenerate,
                    });
                    continue;
                }
            };

            if self.classes.insert(&label) {
                outcome.new_classes.push(label);
            }
            self.images
                .entry(image.to_string())
                .or_default()
                .push(annotation);
            outcome.added += 1;
        }
        outcome
    }

    fn has_label(&self, image: &str, label: &str, except: Option<usize>) -> bool {
        self.boxes(image)
            .iter()
            .enumerate()
            .any(|(i, ann)| Some(i) != except && ann.label() == label)
    }

    fn clamp_for(&self, image: &str, rect: BBoxXYXY<ImageSpace>) -> BBoxXYXY<ImageSpace> {
        match self.dimensions(image) {
            Some(size) if size.is_valid() => rect.clamp_to(size.width as f64, size.height as f64),
            _ => rect,
        }
    }

    fn require(&self, image: &str, index: usize) -> Result<&Annotation, BoxlabelError> {
        self.get(image, index).ok_or_else(|| BoxlabelError::NotFound {
            image: image.to_string(),
            index,
        })
    }

    fn require_mut(&mut self, image: &str, index: usize) -> Result<&mut Annotation, BoxlabelError> {
        self.images
            .get_mut(image)
            .and_then(|boxes| boxes.get_mut(index))
            .ok_or_else(|| BoxlabelError::NotFound {
                image: image.to_string(),
                index,
            })
    }
}
