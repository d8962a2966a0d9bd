//! Three-way comparison of elements.
//!
//! When both sides can produce encoded bytes the comparison is delegated
//! to the wire-level comparator. Otherwise the tree is walked: canonical
//! type ranks first, then (optionally) field names, then children
//! pairwise. Child comparisons stop considering names when either side is
//! an array, since array keys are positional.

use std::cmp::Ordering;

use mutbson_types::order::compare_elements as compare_raw;
use mutbson_types::raw::{element_starts_at, first_element_offset};
use mutbson_types::{ElementType, RawElement};

use crate::document::{Document, ElementId};
use crate::rep::RepIdx;

impl Document<'_> {
    /// Three-way compare of two elements of this document.
    ///
    /// Returns `None` if either handle belongs to another document.
    pub fn compare_elements(
        &mut self,
        a: ElementId,
        b: ElementId,
        consider_field_names: bool,
    ) -> Option<Ordering> {
        let a_idx = self.nav_handle(a)?;
        let b_idx = self.nav_handle(b)?;
        Some(self.compare_reps(a_idx, b_idx, consider_field_names))
    }

    /// Three-way compare of an element against a complete encoded
    /// element.
    pub fn compare_with_encoded_element(
        &mut self,
        el: ElementId,
        raw: &[u8],
        consider_field_names: bool,
    ) -> Option<Ordering> {
        let idx = self.nav_handle(el)?;
        Some(self.compare_rep_with_encoded(idx, raw, 0, consider_field_names))
    }

    /// Three-way compare of a container element's children against the
    /// elements of a complete encoded document.
    pub fn compare_with_encoded_document(
        &mut self,
        el: ElementId,
        doc: &[u8],
        consider_field_names: bool,
    ) -> Option<Ordering> {
        let idx = self.nav_handle(el)?;
        debug_assert!(!self.rep_is_leaf(idx));
        Some(self.compare_children_with_doc(idx, doc, 0, consider_field_names))
    }

    fn compare_reps(&mut self, a: RepIdx, b: RepIdx, consider: bool) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }

        // If either side has encoded bytes, compare through the encoded
        // form. The bytes are copied to the side so the other side can
        // keep materializing reps while we walk it.
        if self.rep_has_value(a) {
            let owned = self.raw_view(a).bytes().to_vec();
            return self
                .compare_rep_with_encoded(b, &owned, 0, consider)
                .reverse();
        }
        if self.rep_has_value(b) {
            let owned = self.raw_view(b).bytes().to_vec();
            return self.compare_rep_with_encoded(a, &owned, 0, consider);
        }

        // Only container shells remain: leaves always have a value.
        debug_assert!(!self.rep_is_leaf(a) && !self.rep_is_leaf(b));

        let rank = self
            .rep_type(a)
            .canonical_rank()
            .cmp(&self.rep_type(b).canonical_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        if consider {
            let names = self.rep_field_name(a).cmp(self.rep_field_name(b));
            if names != Ordering::Equal {
                return names;
            }
        }

        let child_consider = self.rep_type(a) != ElementType::Array
            && self.rep_type(b) != ElementType::Array;

        let mut x = self.resolve_left_child(a);
        let mut y = self.resolve_left_child(b);
        loop {
            match (x.index(), y.index()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(xi), Some(yi)) => {
                    let result = self.compare_reps(xi, yi, child_consider);
                    if result != Ordering::Equal {
                        return result;
                    }
                    x = self.resolve_right_sibling(xi);
                    y = self.resolve_right_sibling(yi);
                }
            }
        }
    }

    fn compare_rep_with_encoded(
        &mut self,
        idx: RepIdx,
        buf: &[u8],
        offset: usize,
        consider: bool,
    ) -> Ordering {
        let other = RawElement::at(buf, offset);

        if self.rep_has_value(idx) {
            let this = self.raw_view(idx);
            return compare_raw(this, other, consider);
        }

        debug_assert!(!self.rep_is_leaf(idx));

        let rank = self
            .rep_type(idx)
            .canonical_rank()
            .cmp(&other.tag().canonical_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        if consider {
            let names = self.rep_field_name(idx).cmp(other.name());
            if names != Ordering::Equal {
                return names;
            }
        }

        let child_consider =
            self.rep_type(idx) != ElementType::Array && other.tag() != ElementType::Array;
        self.compare_children_with_doc(idx, buf, other.document_value_offset(), child_consider)
    }

    fn compare_children_with_doc(
        &mut self,
        idx: RepIdx,
        buf: &[u8],
        doc_offset: usize,
        consider: bool,
    ) -> Ordering {
        let mut mine = self.resolve_left_child(idx);
        let mut theirs = first_element_offset(buf, doc_offset);
        loop {
            match (mine.index(), theirs) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(m), Some(t)) => {
                    let result = self.compare_rep_with_encoded(m, buf, t, consider);
                    if result != Ordering::Equal {
                        return result;
                    }
                    mine = self.resolve_right_sibling(m);
                    let next = RawElement::at(buf, t).next_offset();
                    theirs = element_starts_at(buf, next).then_some(next);
                }
            }
        }
    }
}
