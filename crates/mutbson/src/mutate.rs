//! Tree mutation: attachment, removal, rename, and value replacement.
//!
//! Every mutator validates before it writes, so a returned error means the
//! document is untouched. All of them finish by clearing the serialized
//! bit upward from the mutation point; most of them also end in-place
//! tracking, since anything that changes the document's shape cannot be
//! expressed as a byte patch. The one exception is a size-preserving
//! scalar replacement, which records damage events instead.

use mutbson_error::{MutBsonError, Result};
use mutbson_types::{DocBuilder, ElementType, ObjectId};

use crate::document::{Document, ElementId};
use crate::rep::{attach_error, ElementRep, RepIdx, Slot, LEAF_OBJ, ROOT_IDX};

impl<'a> Document<'a> {
    /// Attach the detached element `new` as the left sibling of `el`.
    pub fn add_sibling_left(&mut self, el: ElementId, new: ElementId) -> Result<()> {
        let this_idx = self.handle(el)?;
        let new_idx = self.handle(new)?;
        if let Some(link) = attach_error(new_idx, self.arena.get(new_idx)) {
            return Err(MutBsonError::illegal_attach(link));
        }

        let this_rep = *self.arena.get(this_idx);
        debug_assert_ne!(this_rep.parent, Slot::Opaque);
        let Slot::At(parent_idx) = this_rep.parent else {
            return Err(MutBsonError::NoParent);
        };
        debug_assert!(!self.rep_is_leaf(parent_idx));

        self.disable_in_place_updates();

        {
            let new_rep = self.arena.get_mut(new_idx);
            new_rep.parent = Slot::At(parent_idx);
            new_rep.right_sibling = Slot::At(this_idx);
            new_rep.left_sibling = this_rep.left_sibling;
        }
        if let Slot::At(left_idx) = this_rep.left_sibling {
            self.arena.get_mut(left_idx).right_sibling = Slot::At(new_idx);
        }
        self.arena.get_mut(this_idx).left_sibling = Slot::At(new_idx);

        // If we were the parent's first child, the new element now is.
        let parent = self.arena.get_mut(parent_idx);
        if parent.left_child == Slot::At(this_idx) {
            parent.left_child = Slot::At(new_idx);
        }

        self.deserialize(Slot::At(parent_idx));
        Ok(())
    }

    /// Attach the detached element `new` as the right sibling of `el`.
    pub fn add_sibling_right(&mut self, el: ElementId, new: ElementId) -> Result<()> {
        let this_idx = self.handle(el)?;
        let new_idx = self.handle(new)?;
        if let Some(link) = attach_error(new_idx, self.arena.get(new_idx)) {
            return Err(MutBsonError::illegal_attach(link));
        }

        let this_rep = *self.arena.get(this_idx);
        debug_assert_ne!(this_rep.parent, Slot::Opaque);
        let Slot::At(parent_idx) = this_rep.parent else {
            return Err(MutBsonError::NoParent);
        };
        debug_assert!(!self.rep_is_leaf(parent_idx));

        self.disable_in_place_updates();

        // Our successor must be a real slot before we splice in front of
        // it.
        let right = self.resolve_right_sibling(this_idx);

        {
            let new_rep = self.arena.get_mut(new_idx);
            new_rep.parent = Slot::At(parent_idx);
            new_rep.left_sibling = Slot::At(this_idx);
            new_rep.right_sibling = right;
        }
        self.arena.get_mut(this_idx).right_sibling = Slot::At(new_idx);
        if let Slot::At(right_idx) = right {
            self.arena.get_mut(right_idx).left_sibling = Slot::At(new_idx);
        }

        let parent = self.arena.get_mut(parent_idx);
        if parent.right_child == Slot::At(this_idx) {
            parent.right_child = Slot::At(new_idx);
        }

        self.deserialize(Slot::At(parent_idx));
        Ok(())
    }

    /// Attach the detached element `new` as the first child of `el`.
    pub fn push_front(&mut self, el: ElementId, new: ElementId) -> Result<()> {
        self.add_child(el, new, true)
    }

    /// Attach the detached element `new` as the last child of `el`.
    pub fn push_back(&mut self, el: ElementId, new: ElementId) -> Result<()> {
        self.add_child(el, new, false)
    }

    fn add_child(&mut self, el: ElementId, new: ElementId, front: bool) -> Result<()> {
        let this_idx = self.handle(el)?;
        let new_idx = self.handle(new)?;
        if let Some(link) = attach_error(new_idx, self.arena.get(new_idx)) {
            return Err(MutBsonError::illegal_attach(link));
        }
        if self.rep_is_leaf(this_idx) {
            return Err(MutBsonError::NotComposite);
        }

        self.disable_in_place_updates();

        let endpoint = if front {
            self.resolve_left_child(this_idx)
        } else {
            self.resolve_right_child(this_idx)
        };
        if let Slot::At(end_idx) = endpoint {
            return if front {
                self.add_sibling_left(self.id(end_idx), new)
            } else {
                self.add_sibling_right(self.id(end_idx), new)
            };
        }

        // No children: the new element becomes both endpoints.
        let this_rep = self.arena.get_mut(this_idx);
        debug_assert!(this_rep.left_child.is_invalid() && this_rep.right_child.is_invalid());
        this_rep.left_child = Slot::At(new_idx);
        this_rep.right_child = Slot::At(new_idx);
        self.arena.get_mut(new_idx).parent = Slot::At(this_idx);
        self.deserialize(Slot::At(this_idx));
        Ok(())
    }

    /// Detach `el` from its parent and siblings. The element's record is
    /// retained: the handle stays usable and the element can be
    /// re-attached elsewhere.
    pub fn remove(&mut self, el: ElementId) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            return Err(MutBsonError::RemoveRoot);
        }

        // The successor's left link is about to change, so it must exist
        // first.
        self.resolve_right_sibling(idx);

        let rep = *self.arena.get(idx);
        let Slot::At(parent_idx) = rep.parent else {
            return Err(MutBsonError::NoParent);
        };

        self.disable_in_place_updates();

        if let Slot::At(right_idx) = rep.right_sibling {
            self.arena.get_mut(right_idx).left_sibling = rep.left_sibling;
        }
        if let Slot::At(left_idx) = rep.left_sibling {
            self.arena.get_mut(left_idx).right_sibling = rep.right_sibling;
        }
        let parent = self.arena.get_mut(parent_idx);
        if parent.right_child == Slot::At(idx) {
            parent.right_child = rep.left_sibling;
        }
        if parent.left_child == Slot::At(idx) {
            parent.left_child = rep.right_sibling;
        }

        self.deserialize(Slot::At(parent_idx));

        let rep = self.arena.get_mut(idx);
        rep.parent = Slot::Invalid;
        rep.left_sibling = Slot::Invalid;
        rep.right_sibling = Slot::Invalid;
        debug_assert!(self.arena.get(idx).is_detached());
        Ok(())
    }

    /// Give `el` a new field name.
    pub fn rename(&mut self, el: ElementId, name: &str) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            return Err(MutBsonError::IllegalRoot);
        }

        self.disable_in_place_updates();

        if self.arena.get(idx).obj.is_some() && !self.rep_is_leaf(idx) {
            let array = self.rep_type(idx) == ElementType::Array;

            // Materialize the immediate structure now; once the rep loses
            // its backing bytes there is nothing left to resolve from.
            self.resolve_left_child(idx);
            self.resolve_right_sibling(idx);

            self.deserialize(Slot::At(idx));
            let rep = self.arena.get_mut(idx);
            rep.array = array;
            rep.obj = None;
        }

        if self.rep_has_value(idx) {
            // Leaf: rebuild the same value under the new name and swap it
            // in.
            let replacement = self.make_with_new_name(name, self.id(idx))?;
            let source_idx = self.handle(replacement)?;
            self.set_value_internal(idx, source_idx, false)
        } else {
            let offset = self.names.insert(name);
            let rep = self.arena.get_mut(idx);
            debug_assert!(!rep.serialized);
            rep.offset = offset;
            Ok(())
        }
    }

    // -- value replacement -------------------------------------------------

    /// Replace the value in the target slot with the freshly built source
    /// rep, preserving the target's links. The source rep is cleared; its
    /// handle effectively aliases the target from here on.
    pub(crate) fn set_value_internal(
        &mut self,
        target: RepIdx,
        source: RepIdx,
        in_place: bool,
    ) -> Result<()> {
        if target == ROOT_IDX {
            return Err(MutBsonError::IllegalRoot);
        }

        if !in_place {
            self.disable_in_place_updates();
        }

        // Materialize our right sibling while the old bytes can still be
        // walked. A no-op when it is already known.
        self.resolve_right_sibling(target);

        let source_rep = *self.arena.get(source);
        let target_rep = *self.arena.get(target);

        let mut new_rep = source_rep;
        if !target_rep.parent.is_invalid() {
            new_rep.parent = target_rep.parent;
            new_rep.left_sibling = target_rep.left_sibling;
            new_rep.right_sibling = target_rep.right_sibling;
        }
        *self.arena.get_mut(target) = new_rep;
        *self.arena.get_mut(source) = ElementRep::default();

        self.deserialize(new_rep.parent);
        Ok(())
    }

    /// Shared scalar replacement path: build the new leaf under the old
    /// name, record damage events when the replacement is size-compatible,
    /// then splice.
    fn set_leaf_value(
        &mut self,
        el: ElementId,
        build: impl FnOnce(&mut DocBuilder, &str) -> usize,
    ) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            return Err(MutBsonError::IllegalRoot);
        }

        // Copy the name out: the heap and the leaf buffer may both grow
        // below.
        let name = self.rep_field_name(idx).to_owned();
        let offset = build(&mut self.leaf, &name);
        let new_idx = self.insert_leaf_element(offset);
        let in_place = self.try_record_in_place(idx, new_idx);
        self.set_value_internal(idx, new_idx, in_place)
    }

    /// Record damage events for replacing `target`'s value with the new
    /// leaf, if the replacement qualifies: in-place mode live, the target
    /// has encoded bytes outside the leaf buffer, and the encodings are
    /// the same size. Returns whether the events were recorded.
    fn try_record_in_place(&mut self, target: RepIdx, new_leaf: RepIdx) -> bool {
        if !self.in_place_enabled() {
            return false;
        }
        let target_rep = *self.arena.get(target);
        if !self.rep_has_value(target) || target_rep.obj == Some(LEAF_OBJ) {
            return false;
        }

        let old = self.raw_view(target);
        let new = self.raw_view(new_leaf);
        if old.total_size() != new.total_size() {
            return false;
        }
        // Same name by construction, so equal totals mean equal values.
        debug_assert_eq!(old.name_len(), new.name_len());
        debug_assert_eq!(old.value_size(), new.value_size());

        let type_changed = old.tag() != new.tag();
        let target_base = old.start_offset() as u32;
        let source_base = new.start_offset() as u32;
        let target_value = old.value_offset() as u32;
        let source_value = new.value_offset() as u32;
        let value_size = old.value_size() as u32;

        if type_changed {
            self.record_damage(target_base, source_base, 1);
        }
        self.record_damage(target_value, source_value, value_size);
        true
    }

    /// Replace the element's value with a Double.
    pub fn set_value_double(&mut self, el: ElementId, value: f64) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_f64(name, value))
    }

    /// Replace the element's value with a String.
    pub fn set_value_string(&mut self, el: ElementId, value: &str) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_str(name, value))
    }

    /// Replace the element's value with a Bool.
    pub fn set_value_bool(&mut self, el: ElementId, value: bool) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_bool(name, value))
    }

    /// Replace the element's value with an Int32.
    pub fn set_value_int32(&mut self, el: ElementId, value: i32) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_i32(name, value))
    }

    /// Replace the element's value with an Int64.
    pub fn set_value_int64(&mut self, el: ElementId, value: i64) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_i64(name, value))
    }

    /// Replace the element's value with a DateTime.
    pub fn set_value_datetime(&mut self, el: ElementId, millis: i64) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_datetime(name, millis))
    }

    /// Replace the element's value with a Timestamp.
    pub fn set_value_timestamp(&mut self, el: ElementId, value: u64) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_timestamp(name, value))
    }

    /// Replace the element's value with Null.
    pub fn set_value_null(&mut self, el: ElementId) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_null(name))
    }

    /// Replace the element's value with Undefined.
    pub fn set_value_undefined(&mut self, el: ElementId) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_undefined(name))
    }

    /// Replace the element's value with MinKey.
    pub fn set_value_min_key(&mut self, el: ElementId) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_min_key(name))
    }

    /// Replace the element's value with MaxKey.
    pub fn set_value_max_key(&mut self, el: ElementId) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_max_key(name))
    }

    /// Replace the element's value with an ObjectId.
    pub fn set_value_object_id(&mut self, el: ElementId, value: ObjectId) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_object_id(name, value))
    }

    /// Replace the element's value with Binary data.
    pub fn set_value_binary(&mut self, el: ElementId, subtype: u8, data: &[u8]) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_binary(name, subtype, data))
    }

    /// Replace the element's value with a Regex.
    pub fn set_value_regex(&mut self, el: ElementId, pattern: &str, options: &str) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_regex(name, pattern, options))
    }

    /// Replace the element's value with a DbPointer.
    pub fn set_value_db_pointer(
        &mut self,
        el: ElementId,
        namespace: &str,
        id: ObjectId,
    ) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_db_pointer(name, namespace, id))
    }

    /// Replace the element's value with Code.
    pub fn set_value_code(&mut self, el: ElementId, code: &str) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_code(name, code))
    }

    /// Replace the element's value with a Symbol.
    pub fn set_value_symbol(&mut self, el: ElementId, value: &str) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_symbol(name, value))
    }

    /// Replace the element's value with CodeWithScope. `scope` must be a
    /// complete encoded document.
    pub fn set_value_code_with_scope(
        &mut self,
        el: ElementId,
        code: &str,
        scope: &[u8],
    ) -> Result<()> {
        self.set_leaf_value(el, |leaf, name| leaf.append_code_with_scope(name, code, scope))
    }

    /// Replace the element's value with an Object whose contents are the
    /// complete encoded document `doc`.
    pub fn set_value_object(&mut self, el: ElementId, doc: &[u8]) -> Result<()> {
        self.set_container_value(el, doc, false)
    }

    /// Replace the element's value with an Array whose contents are the
    /// complete encoded document `doc`.
    pub fn set_value_array(&mut self, el: ElementId, doc: &[u8]) -> Result<()> {
        self.set_container_value(el, doc, true)
    }

    fn set_container_value(&mut self, el: ElementId, doc: &[u8], array: bool) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            return Err(MutBsonError::IllegalRoot);
        }

        let name = self.rep_field_name(idx).to_owned();
        let offset = self.leaf.append_document(&name, doc, array);
        let new_idx = self.insert_leaf_element(offset);
        {
            let rep = self.arena.get_mut(new_idx);
            rep.left_child = Slot::Opaque;
            rep.right_child = Slot::Opaque;
        }
        self.set_value_internal(idx, new_idx, false)
    }

    /// Replace the element's value with that of a complete encoded
    /// element, keeping the element's current name. Fails with
    /// [`MutBsonError::BadType`] if the bytes start with the end-of-object
    /// tag.
    pub fn set_value_from_encoded(&mut self, el: ElementId, raw: &[u8]) -> Result<()> {
        let idx = self.handle(el)?;
        if idx == ROOT_IDX {
            return Err(MutBsonError::IllegalRoot);
        }
        let tag = raw
            .first()
            .copied()
            .and_then(ElementType::from_byte)
            .ok_or(MutBsonError::BadType)?;

        let name = self.rep_field_name(idx).to_owned();
        let offset = self.leaf.append_raw_element(Some(&name), raw);
        let new_idx = self.insert_leaf_element(offset);

        if tag.is_container() {
            let rep = self.arena.get_mut(new_idx);
            rep.left_child = Slot::Opaque;
            rep.right_child = Slot::Opaque;
            self.set_value_internal(idx, new_idx, false)
        } else {
            let in_place = self.try_record_in_place(idx, new_idx);
            self.set_value_internal(idx, new_idx, in_place)
        }
    }
}
