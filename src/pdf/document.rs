use crate::error::SpliceError;
use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `/Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// A parsed, page-addressable PDF. Read-only once loaded.
pub struct SourceDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    token: u64,
}

impl SourceDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, SpliceError> {
        let doc = Document::load_mem(bytes).map_err(|e| SpliceError::Codec(e.to_string()))?;
        // get_pages is keyed by 1-based page number, so values come out in page order
        let pages = doc.get_pages().into_values().collect();

        Ok(SourceDocument {
            doc,
            pages,
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        Self::load(&bytes).with_context(|| format!("Failed to open PDF: {}", path.display()))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub(crate) fn document(&self) -> &Document {
        &self.doc
    }

    /// Identifies this document among others loaded by the process.
    pub(crate) fn token(&self) -> u64 {
        self.token
    }

    /// The page dictionary at a zero-based index, with inheritable
    /// attributes pulled down from the page tree and `/Parent` removed.
    pub(crate) fn page_dictionary(&self, index: usize) -> Result<Dictionary, SpliceError> {
        let page_id = *self.pages.get(index).ok_or_else(|| {
            SpliceError::Assembly(format!(
                "Page index {} is out of range (document has {} pages)",
                index,
                self.pages.len()
            ))
        })?;

        let mut page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| SpliceError::Assembly(format!("Invalid page object: {}", e)))?
            .clone();

        let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
        let mut depth = 0;
        while let Some(parent_id) = parent {
            if depth == MAX_TREE_DEPTH {
                break;
            }
            depth += 1;

            let Ok(node) = self.doc.get_dictionary(parent_id) else {
                break;
            };
            for key in INHERITABLE_KEYS {
                if !page.has(key) {
                    if let Ok(value) = node.get(key) {
                        page.set(key.to_vec(), value.clone());
                    }
                }
            }
            parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        page.remove(b"Parent");
        Ok(page)
    }
}

/// Page rotation in clockwise quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 270° clockwise
}

impl Rotation {
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }
}

impl TryFrom<i64> for Rotation {
    type Error = String;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        if degrees % 90 != 0 {
            return Err(format!(
                "Rotation must be a multiple of 90 degrees, got {}",
                degrees
            ));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::None,
            90 => Rotation::Right,
            180 => Rotation::Down,
            _ => Rotation::Left,
        })
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{labelled_pdf, labelled_pdf_with_tree_rotation};

    #[test]
    fn test_load_counts_pages() {
        let doc = SourceDocument::load(&labelled_pdf(4, "Doc")).unwrap();
        assert_eq!(doc.page_count(), 4);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = SourceDocument::load(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, SpliceError::Codec(_)));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let bytes = labelled_pdf(1, "Doc");
        let a = SourceDocument::load(&bytes).unwrap();
        let b = SourceDocument::load(&bytes).unwrap();
        assert_ne!(a.token(), b.token());
    }

    #[test]
    fn test_page_dictionary_inherits_from_tree() {
        let doc = SourceDocument::load(&labelled_pdf_with_tree_rotation(2, "Doc", 180)).unwrap();
        let page = doc.page_dictionary(1).unwrap();
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 180);
        assert!(page.has(b"MediaBox"));
        assert!(!page.has(b"Parent"));
    }

    #[test]
    fn test_page_dictionary_out_of_range() {
        let doc = SourceDocument::load(&labelled_pdf(2, "Doc")).unwrap();
        assert!(matches!(
            doc.page_dictionary(2),
            Err(SpliceError::Assembly(_))
        ));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::try_from(0).unwrap(), Rotation::None);
        assert_eq!(Rotation::try_from(90).unwrap(), Rotation::Right);
        assert_eq!(Rotation::try_from(180).unwrap(), Rotation::Down);
        assert_eq!(Rotation::try_from(270).unwrap(), Rotation::Left);
        assert_eq!(Rotation::try_from(-90).unwrap(), Rotation::Left);
        assert_eq!(Rotation::try_from(450).unwrap(), Rotation::Right);
        assert!(Rotation::try_from(45).is_err());
    }

    #[test]
    fn test_rotation_serde() {
        let rotation: Rotation = serde_json::from_str("90").unwrap();
        assert_eq!(rotation, Rotation::Right);
        assert_eq!(serde_json::to_string(&Rotation::Left).unwrap(), "270");
        assert!(serde_json::from_str::<Rotation>("33").is_err());
    }
}
