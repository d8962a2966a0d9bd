//! The mutable document: state, lazy materialization, navigation, and
//! element factories.
//!
//! A [`Document`] owns four stores:
//!
//! - the element arena ([`crate::rep::ElementArena`]): one fixed-size rep
//!   per materialized element, addressed by stable index;
//! - the object table: slot 0 is the leaf builder's buffer, later slots
//!   are borrowed source buffers pinned for the document's lifetime;
//! - the leaf builder: a growing buffer where every synthesized value is
//!   encoded;
//! - the field-name heap: NUL-terminated names for elements that have no
//!   encoded bytes to read a name from.
//!
//! Loading a buffer does not unpack it. The root's child slots start
//! opaque, and navigation materializes reps one neighbor at a time by
//! decoding the underlying bytes. Untouched regions therefore never get
//! reps, and the serializer can copy them back out wholesale.

use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

use mutbson_error::{MutBsonError, Result};
use mutbson_types::raw::{element_starts_at, first_element_offset};
use mutbson_types::{DocBuilder, ElementType, ObjectId, RawElement};
use tracing::{debug, trace};

use crate::damage::{DamageVector, InPlaceMode};
use crate::rep::{ElementArena, ElementRep, FieldNameHeap, ObjIdx, RepIdx, Slot, LEAF_OBJ, ROOT_IDX};

static NEXT_DOCUMENT_TOKEN: AtomicU32 = AtomicU32::new(1);

/// A stable handle to one element of a [`Document`].
///
/// Handles are never invalidated: removal detaches the element but keeps
/// its record, and the arena only ever grows. A handle also remembers
/// which document minted it, so passing it to another document is caught
/// rather than silently resolving to an unrelated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId {
    pub(crate) doc: u32,
    pub(crate) idx: RepIdx,
}

/// One entry in the object table.
enum SourceObj<'a> {
    /// The leaf builder's buffer; always slot 0, read live.
    Leaf,
    /// A caller-provided encoded document, borrowed for the document's
    /// lifetime.
    Borrowed(&'a [u8]),
}

/// A mutable tree over encoded documents.
///
/// See the crate docs for the data model. All operations are synchronous;
/// a document may move between threads but must not be shared without
/// external exclusion.
pub struct Document<'a> {
    token: u32,
    pub(crate) arena: ElementArena,
    objects: Vec<SourceObj<'a>>,
    pub(crate) names: FieldNameHeap,
    pub(crate) leaf: DocBuilder,
    /// `Some` while in-place mode is live; dropped for good by the first
    /// mutation that cannot be expressed as a patch.
    damages: Option<DamageVector>,
}

impl<'a> Document<'a> {
    /// Create an empty document: a root object with no children.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self::with_state(InPlaceMode::Disabled);
        let offset = doc.names.insert("");
        let root = ElementRep {
            offset,
            ..ElementRep::default()
        };
        let idx = doc.arena.insert(root);
        debug_assert_eq!(idx, ROOT_IDX);
        doc
    }

    /// Create a document over an encoded buffer, with in-place updates
    /// disabled.
    ///
    /// The buffer must be a well-formed encoded document and must outlive
    /// the document; its contents are borrowed, not copied.
    #[must_use]
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::from_bytes_with_mode(bytes, InPlaceMode::Disabled)
    }

    /// Create a document over an encoded buffer with the given in-place
    /// mode.
    #[must_use]
    pub fn from_bytes_with_mode(bytes: &'a [u8], mode: InPlaceMode) -> Self {
        debug_assert!(bytes.len() >= 5);
        debug_assert_eq!(
            i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            bytes.len(),
        );

        let mut doc = Self::with_state(mode);
        let obj = doc.insert_object(SourceObj::Borrowed(bytes));
        let offset = doc.names.insert("");
        // The root is not literally serialized (it has no header of its
        // own), but marking it so makes "document untouched" checkable by
        // looking at one bit, and the resolver treats the whole buffer as
        // its value.
        let root = ElementRep {
            obj: Some(obj),
            serialized: true,
            offset,
            left_child: Slot::Opaque,
            right_child: Slot::Opaque,
            ..ElementRep::default()
        };
        let idx = doc.arena.insert(root);
        debug_assert_eq!(idx, ROOT_IDX);
        doc
    }

    fn with_state(mode: InPlaceMode) -> Self {
        Self {
            token: NEXT_DOCUMENT_TOKEN.fetch_add(1, AtomicOrdering::Relaxed),
            arena: ElementArena::default(),
            objects: vec![SourceObj::Leaf],
            names: FieldNameHeap::default(),
            leaf: DocBuilder::new(),
            damages: match mode {
                InPlaceMode::Enabled => Some(DamageVector::new()),
                InPlaceMode::Disabled => None,
            },
        }
    }

    fn insert_object(&mut self, obj: SourceObj<'a>) -> ObjIdx {
        let idx = self.objects.len();
        assert!(idx < usize::from(ObjIdx::MAX), "object table exhausted");
        self.objects.push(obj);
        idx as ObjIdx
    }

    /// The root element. Always valid; its parent is `None` and its name
    /// is empty.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.id(ROOT_IDX)
    }

    #[inline]
    pub(crate) fn id(&self, idx: RepIdx) -> ElementId {
        ElementId {
            doc: self.token,
            idx,
        }
    }

    /// Resolve a handle for a mutator: foreign handles are an error.
    pub(crate) fn handle(&self, el: ElementId) -> Result<RepIdx> {
        if el.doc == self.token && self.arena.contains(el.idx) {
            Ok(el.idx)
        } else {
            Err(MutBsonError::WrongDocument)
        }
    }

    /// Resolve a handle for navigation: foreign handles read as absent.
    pub(crate) fn nav_handle(&self, el: ElementId) -> Option<RepIdx> {
        (el.doc == self.token && self.arena.contains(el.idx)).then_some(el.idx)
    }

    // -- byte access -------------------------------------------------------

    pub(crate) fn object_bytes(&self, obj: ObjIdx) -> &[u8] {
        match &self.objects[usize::from(obj)] {
            SourceObj::Leaf => self.leaf.bytes(),
            SourceObj::Borrowed(bytes) => bytes,
        }
    }

    /// View the encoded bytes behind a rep. The rep must have a backing
    /// object.
    pub(crate) fn raw_view(&self, idx: RepIdx) -> RawElement<'_> {
        let rep = self.arena.get(idx);
        let Some(obj) = rep.obj else {
            unreachable!("rep has no backing object")
        };
        RawElement::at(self.object_bytes(obj), rep.offset as usize)
    }

    // -- rep interrogation -------------------------------------------------

    /// Whether the rep's value can be served as one contiguous encoded
    /// element. The root never can: it has no element header.
    pub(crate) fn rep_has_value(&self, idx: RepIdx) -> bool {
        idx != ROOT_IDX && self.arena.get(idx).serialized
    }

    pub(crate) fn rep_field_name(&self, idx: RepIdx) -> &str {
        if idx == ROOT_IDX {
            return "";
        }
        let rep = self.arena.get(idx);
        if rep.obj.is_some() {
            self.raw_view(idx).name()
        } else {
            self.names.get(rep.offset)
        }
    }

    pub(crate) fn rep_type(&self, idx: RepIdx) -> ElementType {
        if idx == ROOT_IDX {
            return ElementType::Object;
        }
        let rep = self.arena.get(idx);
        if rep.obj.is_some() {
            self.raw_view(idx).tag()
        } else if rep.array {
            ElementType::Array
        } else {
            ElementType::Object
        }
    }

    pub(crate) fn rep_is_leaf(&self, idx: RepIdx) -> bool {
        self.rep_type(idx).is_leaf()
    }

    // -- lazy resolution ---------------------------------------------------

    /// Materialize the left child of `idx` if it is still opaque, and
    /// return the (now known) left child slot.
    pub(crate) fn resolve_left_child(&mut self, idx: RepIdx) -> Slot {
        let rep = *self.arena.get(idx);
        if rep.left_child != Slot::Opaque {
            return rep.left_child;
        }

        // An opaque child can only hang off bytes we can decode.
        debug_assert!(rep.serialized);
        let Some(obj) = rep.obj else {
            unreachable!("opaque child without a backing object")
        };

        let doc_offset = if self.rep_has_value(idx) {
            self.raw_view(idx).document_value_offset()
        } else {
            // The root: the whole backing buffer is its value.
            0
        };
        let found = {
            let bytes = self.object_bytes(obj);
            first_element_offset(bytes, doc_offset)
                .map(|off| (off, RawElement::at(bytes, off).tag()))
        };

        match found {
            None => {
                let rep = self.arena.get_mut(idx);
                rep.left_child = Slot::Invalid;
                rep.right_child = Slot::Invalid;
                Slot::Invalid
            }
            Some((child_offset, tag)) => {
                trace!(parent = idx, offset = child_offset, "materialize left child");
                let mut child = ElementRep {
                    obj: Some(obj),
                    serialized: true,
                    offset: child_offset as u32,
                    parent: Slot::At(idx),
                    right_sibling: Slot::Opaque,
                    ..ElementRep::default()
                };
                if tag.is_container() {
                    child.left_child = Slot::Opaque;
                    child.right_child = Slot::Opaque;
                }
                let inserted = self.arena.insert(child);
                // Re-acquire after the insert; never hold a rep reference
                // across arena growth.
                self.arena.get_mut(idx).left_child = Slot::At(inserted);
                Slot::At(inserted)
            }
        }
    }

    /// Materialize the right sibling of `idx` if it is still opaque, and
    /// return the (now known) right sibling slot. Reaching the end of the
    /// container also pins the parent's right child.
    pub(crate) fn resolve_right_sibling(&mut self, idx: RepIdx) -> Slot {
        let rep = *self.arena.get(idx);
        if rep.right_sibling != Slot::Opaque {
            return rep.right_sibling;
        }

        let Some(obj) = rep.obj else {
            unreachable!("opaque sibling without a backing object")
        };
        let found = {
            let bytes = self.object_bytes(obj);
            let next = RawElement::at(bytes, rep.offset as usize).next_offset();
            element_starts_at(bytes, next)
                .then(|| (next, RawElement::at(bytes, next).tag()))
        };

        match found {
            Some((next_offset, tag)) => {
                trace!(after = idx, offset = next_offset, "materialize right sibling");
                let mut sibling = ElementRep {
                    obj: Some(obj),
                    serialized: true,
                    offset: next_offset as u32,
                    parent: rep.parent,
                    left_sibling: Slot::At(idx),
                    right_sibling: Slot::Opaque,
                    ..ElementRep::default()
                };
                if tag.is_container() {
                    sibling.left_child = Slot::Opaque;
                    sibling.right_child = Slot::Opaque;
                }
                let inserted = self.arena.insert(sibling);
                self.arena.get_mut(idx).right_sibling = Slot::At(inserted);
                Slot::At(inserted)
            }
            None => {
                self.arena.get_mut(idx).right_sibling = Slot::Invalid;
                // End of the container: the parent's necessarily opaque
                // right child is now known to be us.
                let Slot::At(parent_idx) = rep.parent else {
                    unreachable!("sibling walk past an unparented element")
                };
                let parent = self.arena.get_mut(parent_idx);
                debug_assert_eq!(parent.right_child, Slot::Opaque);
                parent.right_child = Slot::At(idx);
                Slot::Invalid
            }
        }
    }

    /// Materialize the right child of `idx`, which may require walking the
    /// whole child list.
    pub(crate) fn resolve_right_child(&mut self, idx: RepIdx) -> Slot {
        let current = self.arena.get(idx).right_child;
        if current != Slot::Opaque {
            return current;
        }

        let mut current = self.resolve_left_child(idx);
        while let Slot::At(child) = current {
            match self.resolve_right_sibling(child) {
                Slot::Invalid => break,
                next => current = next,
            }
        }
        debug_assert_eq!(self.arena.get(idx).right_child, current);
        current
    }

    /// Clear the serialized bit on `slot` and every still-serialized
    /// ancestor. Dirtiness bubbles to the root so the serializer knows
    /// which regions can no longer be bulk copied.
    pub(crate) fn deserialize(&mut self, mut slot: Slot) {
        while let Slot::At(idx) = slot {
            debug_assert!(!self.rep_is_leaf(idx), "leaf reps never deserialize");
            let rep = self.arena.get_mut(idx);
            if !rep.serialized {
                break;
            }
            rep.serialized = false;
            slot = rep.parent;
        }
    }

    // -- in-place protocol -------------------------------------------------

    /// Pre-size the damage queue. A no-op once in-place mode is disabled.
    pub fn reserve_damage_events(&mut self, additional: usize) {
        if let Some(damages) = &mut self.damages {
            damages.reserve(additional);
        }
    }

    /// Take the queued damage events together with the buffer their source
    /// offsets index (the synthesized-value buffer).
    ///
    /// Returns `None` once any mutation has disabled in-place mode. Taking
    /// the queue leaves the mode enabled: another round of size-preserving
    /// updates can follow.
    pub fn in_place_updates(&mut self) -> Option<(DamageVector, &[u8])> {
        let damages = self.damages.as_mut()?;
        let taken = std::mem::take(damages);
        Some((taken, self.object_bytes(LEAF_OBJ)))
    }

    /// Permanently drop in-place tracking. Idempotent.
    pub fn disable_in_place_updates(&mut self) {
        if self.damages.take().is_some() {
            debug!("in-place update mode disabled");
        }
    }

    /// The current in-place mode.
    #[must_use]
    pub fn in_place_mode(&self) -> InPlaceMode {
        if self.damages.is_some() {
            InPlaceMode::Enabled
        } else {
            InPlaceMode::Disabled
        }
    }

    pub(crate) fn record_damage(&mut self, target_offset: u32, source_offset: u32, size: u32) {
        let Some(damages) = &mut self.damages else {
            unreachable!("damage recorded while in-place mode is disabled")
        };
        damages.push(crate::damage::DamageEvent {
            target_offset,
            source_offset,
            size,
        });
    }

    pub(crate) fn in_place_enabled(&self) -> bool {
        self.damages.is_some()
    }

    // -- navigation --------------------------------------------------------

    /// The element's left (first) child, materializing it on demand.
    pub fn left_child(&mut self, el: ElementId) -> Option<ElementId> {
        let idx = self.nav_handle(el)?;
        let slot = self.resolve_left_child(idx);
        slot.index().map(|i| self.id(i))
    }

    /// The element's right (last) child. May materialize the entire child
    /// list.
    pub fn right_child(&mut self, el: ElementId) -> Option<ElementId> {
        let idx = self.nav_handle(el)?;
        let slot = self.resolve_right_child(idx);
        slot.index().map(|i| self.id(i))
    }

    /// The element's right sibling, materializing it on demand.
    pub fn right_sibling(&mut self, el: ElementId) -> Option<ElementId> {
        let idx = self.nav_handle(el)?;
        let slot = self.resolve_right_sibling(idx);
        slot.index().map(|i| self.id(i))
    }

    /// The element's left sibling. Never parses bytes: resolving a right
    /// sibling always fills in the left link of the new rep.
    pub fn left_sibling(&self, el: ElementId) -> Option<ElementId> {
        let idx = self.nav_handle(el)?;
        let slot = self.arena.get(idx).left_sibling;
        debug_assert_ne!(slot, Slot::Opaque);
        slot.index().map(|i| self.id(i))
    }

    /// The element's parent.
    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        let idx = self.nav_handle(el)?;
        let slot = self.arena.get(idx).parent;
        debug_assert_ne!(slot, Slot::Opaque);
        slot.index().map(|i| self.id(i))
    }

    /// Whether the element has at least one child.
    pub fn has_children(&mut self, el: ElementId) -> bool {
        let Some(idx) = self.nav_handle(el) else {
            return false;
        };
        !self.resolve_left_child(idx).is_invalid()
    }

    /// Whether the element's value can be read back as encoded bytes.
    pub fn has_value(&self, el: ElementId) -> bool {
        self.nav_handle(el)
            .is_some_and(|idx| self.rep_has_value(idx))
    }

    /// The element's type.
    pub fn element_type(&self, el: ElementId) -> Option<ElementType> {
        let idx = self.nav_handle(el)?;
        Some(self.rep_type(idx))
    }

    /// The element's field name. The root always reads as empty.
    pub fn field_name(&self, el: ElementId) -> Option<&str> {
        let idx = self.nav_handle(el)?;
        Some(self.rep_field_name(idx))
    }

    /// The element's encoded value, when it has one.
    pub fn value(&self, el: ElementId) -> Option<RawElement<'_>> {
        let idx = self.nav_handle(el)?;
        self.rep_has_value(idx).then(|| self.raw_view(idx))
    }

    /// Whether the element holds a number (Double, Int32, Int64).
    pub fn is_numeric(&self, el: ElementId) -> bool {
        self.element_type(el).is_some_and(ElementType::is_numeric)
    }

    /// Whether the element holds an integer (Int32, Int64).
    pub fn is_integral(&self, el: ElementId) -> bool {
        self.element_type(el).is_some_and(ElementType::is_integral)
    }

    // -- factories ---------------------------------------------------------

    pub(crate) fn insert_leaf_element(&mut self, offset: usize) -> RepIdx {
        let rep = ElementRep {
            obj: Some(LEAF_OBJ),
            serialized: true,
            offset: offset as u32,
            ..ElementRep::default()
        };
        self.arena.insert(rep)
    }

    /// Make a detached Double element.
    pub fn make_double(&mut self, name: &str, value: f64) -> ElementId {
        let offset = self.leaf.append_f64(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached String element.
    pub fn make_string(&mut self, name: &str, value: &str) -> ElementId {
        let offset = self.leaf.append_str(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Bool element.
    pub fn make_bool(&mut self, name: &str, value: bool) -> ElementId {
        let offset = self.leaf.append_bool(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Int32 element.
    pub fn make_int32(&mut self, name: &str, value: i32) -> ElementId {
        let offset = self.leaf.append_i32(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Int64 element.
    pub fn make_int64(&mut self, name: &str, value: i64) -> ElementId {
        let offset = self.leaf.append_i64(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached DateTime element (millis since the epoch).
    pub fn make_datetime(&mut self, name: &str, millis: i64) -> ElementId {
        let offset = self.leaf.append_datetime(name, millis);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Timestamp element.
    pub fn make_timestamp(&mut self, name: &str, value: u64) -> ElementId {
        let offset = self.leaf.append_timestamp(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Null element.
    pub fn make_null(&mut self, name: &str) -> ElementId {
        let offset = self.leaf.append_null(name);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Undefined element.
    pub fn make_undefined(&mut self, name: &str) -> ElementId {
        let offset = self.leaf.append_undefined(name);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached MinKey element.
    pub fn make_min_key(&mut self, name: &str) -> ElementId {
        let offset = self.leaf.append_min_key(name);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached MaxKey element.
    pub fn make_max_key(&mut self, name: &str) -> ElementId {
        let offset = self.leaf.append_max_key(name);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached ObjectId element.
    pub fn make_object_id(&mut self, name: &str, value: ObjectId) -> ElementId {
        let offset = self.leaf.append_object_id(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Binary element.
    pub fn make_binary(&mut self, name: &str, subtype: u8, data: &[u8]) -> ElementId {
        let offset = self.leaf.append_binary(name, subtype, data);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Regex element.
    pub fn make_regex(&mut self, name: &str, pattern: &str, options: &str) -> ElementId {
        let offset = self.leaf.append_regex(name, pattern, options);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached DbPointer element.
    pub fn make_db_pointer(&mut self, name: &str, namespace: &str, id: ObjectId) -> ElementId {
        let offset = self.leaf.append_db_pointer(name, namespace, id);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Code element.
    pub fn make_code(&mut self, name: &str, code: &str) -> ElementId {
        let offset = self.leaf.append_code(name, code);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached Symbol element.
    pub fn make_symbol(&mut self, name: &str, value: &str) -> ElementId {
        let offset = self.leaf.append_symbol(name, value);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached CodeWithScope element. `scope` must be a complete
    /// encoded document.
    pub fn make_code_with_scope(&mut self, name: &str, code: &str, scope: &[u8]) -> ElementId {
        let offset = self.leaf.append_code_with_scope(name, code, scope);
        let idx = self.insert_leaf_element(offset);
        self.id(idx)
    }

    /// Make a detached, empty Object element. It has no encoded bytes
    /// until serialized; its name lives in the field-name heap.
    pub fn make_object(&mut self, name: &str) -> ElementId {
        let offset = self.names.insert(name);
        let rep = ElementRep {
            offset,
            ..ElementRep::default()
        };
        let idx = self.arena.insert(rep);
        self.id(idx)
    }

    /// Make a detached Object element whose initial contents are the
    /// complete encoded document `doc`, copied into the leaf buffer.
    pub fn make_object_from_bytes(&mut self, name: &str, doc: &[u8]) -> ElementId {
        let offset = self.leaf.append_document(name, doc, false);
        let idx = self.insert_leaf_element(offset);
        let rep = self.arena.get_mut(idx);
        rep.left_child = Slot::Opaque;
        rep.right_child = Slot::Opaque;
        self.id(idx)
    }

    /// Make a detached, empty Array element.
    pub fn make_array(&mut self, name: &str) -> ElementId {
        let offset = self.names.insert(name);
        let rep = ElementRep {
            array: true,
            offset,
            ..ElementRep::default()
        };
        let idx = self.arena.insert(rep);
        self.id(idx)
    }

    /// Make a detached Array element whose initial contents are the
    /// complete encoded document `doc`, copied into the leaf buffer.
    pub fn make_array_from_bytes(&mut self, name: &str, doc: &[u8]) -> ElementId {
        let offset = self.leaf.append_document(name, doc, true);
        let idx = self.insert_leaf_element(offset);
        let rep = self.arena.get_mut(idx);
        rep.left_child = Slot::Opaque;
        rep.right_child = Slot::Opaque;
        self.id(idx)
    }

    /// Make a detached element from a complete encoded element, keeping
    /// its name. Fails with [`MutBsonError::BadType`] if the bytes start
    /// with the end-of-object tag.
    pub fn make_from_encoded(&mut self, raw: &[u8]) -> Result<ElementId> {
        let tag = raw
            .first()
            .copied()
            .and_then(ElementType::from_byte)
            .ok_or(MutBsonError::BadType)?;
        let offset = self.leaf.append_raw_element(None, raw);
        let idx = self.insert_leaf_element(offset);
        if tag.is_container() {
            let rep = self.arena.get_mut(idx);
            rep.left_child = Slot::Opaque;
            rep.right_child = Slot::Opaque;
        }
        Ok(self.id(idx))
    }

    /// Make a detached copy of `other` under a new name.
    ///
    /// The element is first written out to a side buffer: its bytes may
    /// live in the leaf buffer that the copy is about to grow.
    pub fn make_with_new_name(&mut self, name: &str, other: ElementId) -> Result<ElementId> {
        let other_idx = self.handle(other)?;
        let mut side = DocBuilder::new();
        self.write_element(other_idx, &mut side, Some(name));
        let built = side.finish();
        let Some(first) = first_element_offset(&built, 0) else {
            unreachable!("side buffer always holds exactly one element")
        };
        let raw = RawElement::at(&built, first);
        self.make_from_encoded(raw.bytes())
    }

    // -- test introspection ------------------------------------------------

    #[cfg(test)]
    pub(crate) fn rep_count(&self) -> usize {
        self.arena.len()
    }

    #[cfg(test)]
    pub(crate) fn rep_serialized(&self, el: ElementId) -> bool {
        self.arena.get(el.idx).serialized
    }

    #[cfg(test)]
    pub(crate) fn rep_detached(&self, el: ElementId) -> bool {
        self.arena.get(el.idx).is_detached()
    }
}

impl Default for Document<'_> {
    fn default() -> Self {
        Self::new()
    }
}
