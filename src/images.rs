//! Section-scoped image delivery.

use std::collections::HashSet;

use crate::block::{Block, ImageRef, Section};

/// Hands out image references by section, each at most once.
#[derive(Clone, Debug, Default)]
pub struct ImageAssociator {
    images: Vec<ImageRef>,
    consumed: HashSet<usize>,
}

impl ImageAssociator {
    /// Collect every image reference in `blocks`, in document order.
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let images = blocks
            .iter()
            .filter_map(|block| match block {
                Block::ImageRef(image) => Some(image.clone()),
                _ => None,
            })
            .collect();
        Self {
            images,
            consumed: HashSet::new(),
        }
    }

    /// Unconsumed images tagged with `section`. Returned images are consumed.
    pub fn images_for(&mut self, section: &Section) -> Vec<ImageRef> {
        self.take_where(|image| image.section.as_ref() == Some(section))
    }

    /// Unconsumed images whose section title equals `title`.
    pub fn images_for_title(&mut self, title: &str) -> Vec<ImageRef> {
        self.take_where(|image| {
            image
                .section
                .as_ref()
                .is_some_and(|section| section.title == title)
        })
    }

    /// Every image not yet delivered, for the trailing catch-all section.
    pub fn remaining_images(&mut self) -> Vec<ImageRef> {
        self.take_where(|_| true)
    }

    pub fn is_consumed(&self, id: usize) -> bool {
        self.consumed.contains(&id)
    }

    /// Mark an image as delivered without returning it.
    pub fn consume(&mut self, id: usize) -> bool {
        self.images.iter().any(|image| image.id == id) && self.consumed.insert(id)
    }

    pub fn pending_count(&self) -> usize {
        self.images.len() - self.consumed.len()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn take_where(&mut self, mut pred: impl FnMut(&ImageRef) -> bool) -> Vec<ImageRef> {
        let mut taken = Vec::new();
        for image in &self.images {
            if !self.consumed.contains(&image.id) && pred(image) {
                self.consumed.insert(image.id);
                taken.push(image.clone());
            }
        }
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::classify_lines;

    fn ids(images: &[ImageRef]) -> Vec<usize> {
        images.iter().map(|image| image.id).collect()
    }

    fn section(ordinal: usize, title: &str) -> Section {
        Section {
            ordinal,
            title: title.to_string(),
        }
    }

    #[test]
    fn images_follow_their_section() {
        let blocks = classify_lines(["## A", "![one](1.png)", "## B", "text"]);
        let mut images = ImageAssociator::from_blocks(&blocks);
        assert_eq!(ids(&images.images_for(&section(0, "A"))), vec![0]);
        assert!(images.images_for(&section(1, "B")).is_empty());
        assert!(images.remaining_images().is_empty());
    }

    #[test]
    fn delivery_is_at_most_once() {
        let blocks = classify_lines([
            "![orphan](0.png)",
            "## A",
            "![a1](1.png)",
            "![a2](2.png)",
            "## B",
            "![b1](3.png)",
        ]);
        let mut images = ImageAssociator::from_blocks(&blocks);
        let mut delivered = Vec::new();
        delivered.extend(ids(&images.images_for(&section(0, "A"))));
        delivered.extend(ids(&images.images_for(&section(0, "A"))));
        delivered.extend(ids(&images.images_for(&section(1, "B"))));
        delivered.extend(ids(&images.remaining_images()));
        delivered.extend(ids(&images.remaining_images()));
        delivered.sort_unstable();
        assert_eq!(delivered, vec![0, 1, 2, 3]);
        assert_eq!(images.pending_count(), 0);
    }

    #[test]
    fn duplicate_titles_are_distinct_sections() {
        let blocks = classify_lines(["## Notes", "![a](a.png)", "## Notes", "![b](b.png)"]);
        let mut images = ImageAssociator::from_blocks(&blocks);
        assert_eq!(ids(&images.images_for(&section(1, "Notes"))), vec![1]);
        assert_eq!(ids(&images.images_for_title("Notes")), vec![0]);
    }

    #[test]
    fn consume_marks_single_image() {
        let blocks = classify_lines(["![a](a.png)", "![b](b.png)"]);
        let mut images = ImageAssociator::from_blocks(&blocks);
        assert!(images.consume(1));
        assert!(!images.consume(1));
        assert!(!images.consume(9));
        assert!(images.is_consumed(1));
        assert_eq!(ids(&images.remaining_images()), vec![0]);
    }
}
