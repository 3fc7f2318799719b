//! Page assembly
//!
//! Builds a fresh document by copying pages out of one or more source
//! documents. Pages are copied by value: every object a page references
//! is imported into the new document under a new id, once per source.

use super::document::{Rotation, SourceDocument};
use crate::error::SpliceError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Accumulates copied pages for one output document.
///
/// The builder is consumed and returned by `append`, so a fan-out threads
/// it through its units explicitly instead of mutating shared state.
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    /// Per source document: source object id -> id in `doc`
    imported: HashMap<u64, HashMap<ObjectId, ObjectId>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        DocumentBuilder {
            doc,
            pages_id,
            kids: Vec::new(),
            imported: HashMap::new(),
        }
    }

    /// Copy the pages at `indices` (zero-based, in the given order,
    /// duplicates allowed) from `source`. A rotation, when given, replaces
    /// the `/Rotate` of every page copied by this call.
    pub fn append(
        mut self,
        source: &SourceDocument,
        indices: &[usize],
        rotation: Option<Rotation>,
    ) -> Result<Self, SpliceError> {
        let remap = self.imported.entry(source.token()).or_default();
        let mut importer = Importer {
            source: source.document(),
            dest: &mut self.doc,
            remap,
        };

        for &index in indices {
            let page = source.page_dictionary(index)?;
            let mut page = importer.dictionary(&page);
            page.set("Parent", Object::Reference(self.pages_id));
            if let Some(rotation) = rotation {
                page.set("Rotate", Object::Integer(rotation.degrees()));
            }
            let page_id = importer.dest.add_object(page);
            self.kids.push(page_id);
        }

        Ok(self)
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Close the page tree and serialize. A builder with no pages still
    /// yields a valid, empty document.
    pub fn finish(mut self) -> Result<Vec<u8>, SpliceError> {
        let kids = self
            .kids
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.kids.len() as i64)),
            ("Kids", Object::Array(kids)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        self.doc.compress();

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| SpliceError::Assembly(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Importer<'a> {
    source: &'a Document,
    dest: &'a mut Document,
    remap: &'a mut HashMap<ObjectId, ObjectId>,
}

impl Importer<'_> {
    fn object(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.reference(*id),
            Object::Array(items) => Object::Array(items.iter().map(|o| self.object(o)).collect()),
            Object::Dictionary(dict) => Object::Dictionary(self.dictionary(dict)),
            Object::Stream(stream) => {
                let mut stream = stream.clone();
                stream.dict = self.dictionary(&stream.dict);
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    fn dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            out.set(key.clone(), self.object(value));
        }
        out
    }

    fn reference(&mut self, id: ObjectId) -> Object {
        if let Some(&mapped) = self.remap.get(&id) {
            return Object::Reference(mapped);
        }

        let Ok(object) = self.source.get_object(id) else {
            return Object::Null;
        };
        // Following these would drag the whole source page tree along
        if is_page_tree_node(object) {
            return Object::Null;
        }

        // Register before recursing so cycles resolve to the new id
        let new_id = self.dest.new_object_id();
        self.remap.insert(id, new_id);
        let copied = self.object(object);
        self.dest.objects.insert(new_id, copied);
        Object::Reference(new_id)
    }
}

fn is_page_tree_node(object: &Object) -> bool {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|kind| kind.as_name().ok())
        .is_some_and(|kind| kind == b"Page" || kind == b"Pages")
}
