//! Chapter reader page: page images.

use crate::model::ImageRecord;
use crate::scraper::document::{attr_of, Document};
use crate::scraper::selectors::CompiledImages;

/// One [ImageRecord] per image in the reader container. `src` is not resolved.
pub fn extract_images(doc: &Document, rules: &CompiledImages) -> Vec<ImageRecord> {
    doc.select_all(&rules.image)
        .map(|img| ImageRecord {
            src: attr_of(img, &rules.src_attr).unwrap_or_default(),
        })
        .collect()
}
