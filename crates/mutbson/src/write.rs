//! Serialization back to encoded bytes.
//!
//! Writing walks the element graph left to right. Any element whose
//! serialized bit is still set is copied out in a single bulk append of
//! its encoded bytes, short-circuiting its entire subtree; only regions
//! that were actually touched are re-encoded element by element. Writing
//! may materialize reps for children that were never visited, which is why
//! it takes the document mutably.

use mutbson_error::Result;
use mutbson_types::{DocBuilder, ElementType};

use crate::document::{Document, ElementId};
use crate::rep::{RepIdx, Slot, ROOT_IDX};

impl Document<'_> {
    /// Write the document's contents into `builder`.
    ///
    /// The root has no element header of its own: its children are
    /// appended directly at the builder's current frame.
    pub fn write_to(&mut self, builder: &mut DocBuilder) {
        self.write_children(ROOT_IDX, builder);
    }

    /// Write one element (header and value) into `builder`. The root is
    /// written as its children, without a wrapper.
    pub fn write_element_to(&mut self, el: ElementId, builder: &mut DocBuilder) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            self.write_children(ROOT_IDX, builder);
        } else {
            self.write_element(idx, builder, None);
        }
        Ok(())
    }

    /// Write an array element's children into `builder`, which should
    /// have an open array frame so the keys come out as running indexes.
    pub fn write_children_to(&mut self, el: ElementId, builder: &mut DocBuilder) -> Result<()> {
        let idx = self.handle(el)?;
        debug_assert_eq!(self.rep_type(idx), ElementType::Array);
        self.write_children(idx, builder);
        Ok(())
    }

    /// Serialize the whole document to a fresh encoded buffer.
    pub fn serialize(&mut self) -> Vec<u8> {
        let mut builder = DocBuilder::new();
        self.write_to(&mut builder);
        builder.finish()
    }

    pub(crate) fn write_element(
        &mut self,
        idx: RepIdx,
        builder: &mut DocBuilder,
        name_override: Option<&str>,
    ) {
        if self.rep_has_value(idx) {
            // Bulk copy: the whole subtree leaves as one append.
            let view = self.raw_view(idx);
            builder.append_raw_element(name_override, view.bytes());
            return;
        }

        // A valueless rep is a container shell; dirty leaves cannot
        // exist.
        debug_assert!(!self.rep_is_leaf(idx));
        let array = self.rep_type(idx) == ElementType::Array;
        let name = match name_override {
            Some(name) => name.to_owned(),
            None => self.rep_field_name(idx).to_owned(),
        };
        builder.begin_document(&name, array);
        self.write_children(idx, builder);
        builder.end_document();
    }

    pub(crate) fn write_children(&mut self, idx: RepIdx, builder: &mut DocBuilder) {
        let mut current = self.resolve_left_child(idx);
        while let Slot::At(child) = current {
            self.write_element(child, builder, None);
            current = self.resolve_right_sibling(child);
        }
    }
}
