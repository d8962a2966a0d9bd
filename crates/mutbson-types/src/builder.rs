//! Growing-buffer document builder.
//!
//! [`DocBuilder`] encodes one document into a single `Vec<u8>`. Nested
//! containers are handled with a stack of open frames rather than separate
//! builder objects: `begin_document`/`end_document` bracket a child
//! container, and every append goes to the innermost open frame. When the
//! innermost frame is an array, the supplied field name is ignored and the
//! frame's running decimal index is used instead.
//!
//! Append methods return the byte offset of the element's type tag within
//! the builder's buffer. Offsets remain meaningful for the lifetime of the
//! builder: the buffer only grows, and [`DocBuilder::bytes`] exposes the
//! current snapshot without closing the root frame.

use crate::tag::{ElementType, EOO};
use crate::ObjectId;

struct Frame {
    /// Offset of this container's 4-byte length prefix.
    base: usize,
    /// Whether element keys are generated as running array indexes.
    array: bool,
    next_index: u64,
}

/// Incremental encoder for one document and its nested containers.
pub struct DocBuilder {
    buf: Vec<u8>,
    frames: Vec<Frame>,
}

impl DocBuilder {
    /// Start a new document. The root frame is an object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: vec![0u8; 4],
            frames: vec![Frame {
                base: 0,
                array: false,
                next_index: 0,
            }],
        }
    }

    /// Number of bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 4 && self.frames.len() == 1
    }

    /// Live snapshot of the buffer.
    ///
    /// Open frames (including the root) have unpatched length prefixes;
    /// elements already appended are complete and readable at their
    /// reported offsets.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Close the root frame and take the encoded document.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        debug_assert_eq!(self.frames.len(), 1, "unclosed container frame");
        self.buf.push(EOO);
        let total = self.buf.len() as i32;
        self.buf[0..4].copy_from_slice(&total.to_le_bytes());
        self.buf
    }

    fn append_key(&mut self, name: &str) {
        let Some(frame) = self.frames.last_mut() else {
            unreachable!("builder frame stack is never empty")
        };
        if frame.array {
            let index = frame.next_index;
            frame.next_index += 1;
            self.buf.extend_from_slice(index.to_string().as_bytes());
        } else {
            debug_assert!(!name.as_bytes().contains(&0));
            self.buf.extend_from_slice(name.as_bytes());
        }
        self.buf.push(0);
    }

    fn append_header(&mut self, tag: ElementType, name: &str) -> usize {
        let start = self.buf.len();
        self.buf.push(tag.as_byte());
        self.append_key(name);
        start
    }

    // -- scalar appends ----------------------------------------------------

    /// Append a Double element.
    pub fn append_f64(&mut self, name: &str, value: f64) -> usize {
        let start = self.append_header(ElementType::Double, name);
        self.buf.extend_from_slice(&value.to_bits().to_le_bytes());
        start
    }

    /// Append a String element.
    pub fn append_str(&mut self, name: &str, value: &str) -> usize {
        self.append_string_like(ElementType::String, name, value)
    }

    /// Append a Code element.
    pub fn append_code(&mut self, name: &str, value: &str) -> usize {
        self.append_string_like(ElementType::Code, name, value)
    }

    /// Append a Symbol element.
    pub fn append_symbol(&mut self, name: &str, value: &str) -> usize {
        self.append_string_like(ElementType::Symbol, name, value)
    }

    fn append_string_like(&mut self, tag: ElementType, name: &str, value: &str) -> usize {
        let start = self.append_header(tag, name);
        let len = (value.len() + 1) as i32;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        start
    }

    /// Append a Bool element.
    pub fn append_bool(&mut self, name: &str, value: bool) -> usize {
        let start = self.append_header(ElementType::Bool, name);
        self.buf.push(u8::from(value));
        start
    }

    /// Append an Int32 element.
    pub fn append_i32(&mut self, name: &str, value: i32) -> usize {
        let start = self.append_header(ElementType::Int32, name);
        self.buf.extend_from_slice(&value.to_le_bytes());
        start
    }

    /// Append an Int64 element.
    pub fn append_i64(&mut self, name: &str, value: i64) -> usize {
        let start = self.append_header(ElementType::Int64, name);
        self.buf.extend_from_slice(&value.to_le_bytes());
        start
    }

    /// Append a DateTime element (millis since the epoch).
    pub fn append_datetime(&mut self, name: &str, millis: i64) -> usize {
        let start = self.append_header(ElementType::DateTime, name);
        self.buf.extend_from_slice(&millis.to_le_bytes());
        start
    }

    /// Append a Timestamp element.
    pub fn append_timestamp(&mut self, name: &str, value: u64) -> usize {
        let start = self.append_header(ElementType::Timestamp, name);
        self.buf.extend_from_slice(&value.to_le_bytes());
        start
    }

    /// Append a Null element.
    pub fn append_null(&mut self, name: &str) -> usize {
        self.append_header(ElementType::Null, name)
    }

    /// Append an Undefined element.
    pub fn append_undefined(&mut self, name: &str) -> usize {
        self.append_header(ElementType::Undefined, name)
    }

    /// Append a MinKey element.
    pub fn append_min_key(&mut self, name: &str) -> usize {
        self.append_header(ElementType::MinKey, name)
    }

    /// Append a MaxKey element.
    pub fn append_max_key(&mut self, name: &str) -> usize {
        self.append_header(ElementType::MaxKey, name)
    }

    /// Append an ObjectId element.
    pub fn append_object_id(&mut self, name: &str, value: ObjectId) -> usize {
        let start = self.append_header(ElementType::ObjectId, name);
        self.buf.extend_from_slice(&value.0);
        start
    }

    /// Append a Binary element.
    pub fn append_binary(&mut self, name: &str, subtype: u8, data: &[u8]) -> usize {
        let start = self.append_header(ElementType::Binary, name);
        let len = data.len() as i32;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.push(subtype);
        self.buf.extend_from_slice(data);
        start
    }

    /// Append a Regex element.
    pub fn append_regex(&mut self, name: &str, pattern: &str, options: &str) -> usize {
        debug_assert!(!pattern.as_bytes().contains(&0));
        debug_assert!(!options.as_bytes().contains(&0));
        let start = self.append_header(ElementType::Regex, name);
        self.buf.extend_from_slice(pattern.as_bytes());
        self.buf.push(0);
        self.buf.extend_from_slice(options.as_bytes());
        self.buf.push(0);
        start
    }

    /// Append a DbPointer element.
    pub fn append_db_pointer(&mut self, name: &str, namespace: &str, id: ObjectId) -> usize {
        let start = self.append_header(ElementType::DbPointer, name);
        let len = (namespace.len() + 1) as i32;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(namespace.as_bytes());
        self.buf.push(0);
        self.buf.extend_from_slice(&id.0);
        start
    }

    /// Append a CodeWithScope element. `scope` must be a complete encoded
    /// document.
    pub fn append_code_with_scope(&mut self, name: &str, code: &str, scope: &[u8]) -> usize {
        let start = self.append_header(ElementType::CodeWithScope, name);
        let code_len = (code.len() + 1) as i32;
        let total = (4 + 4 + code.len() + 1 + scope.len()) as i32;
        self.buf.extend_from_slice(&total.to_le_bytes());
        self.buf.extend_from_slice(&code_len.to_le_bytes());
        self.buf.extend_from_slice(code.as_bytes());
        self.buf.push(0);
        self.buf.extend_from_slice(scope);
        start
    }

    // -- containers and raw copies -----------------------------------------

    /// Append an Object or Array element whose value is the complete
    /// encoded document `doc`, copied verbatim.
    pub fn append_document(&mut self, name: &str, doc: &[u8], array: bool) -> usize {
        let tag = if array {
            ElementType::Array
        } else {
            ElementType::Object
        };
        let start = self.append_header(tag, name);
        self.buf.extend_from_slice(doc);
        start
    }

    /// Bulk-copy a complete encoded element.
    ///
    /// With `name: Some(..)` the element is re-headed under the new name;
    /// with `None` the original name is kept. Inside an array frame the
    /// name is always replaced by the running index.
    pub fn append_raw_element(&mut self, name: Option<&str>, raw: &[u8]) -> usize {
        let in_array = match self.frames.last() {
            Some(frame) => frame.array,
            None => unreachable!("builder frame stack is never empty"),
        };
        if name.is_none() && !in_array {
            let start = self.buf.len();
            self.buf.extend_from_slice(raw);
            return start;
        }

        // Re-head: type byte, new key, then the original value bytes.
        let mut name_end = 1;
        while raw[name_end] != 0 {
            name_end += 1;
        }
        let start = self.buf.len();
        self.buf.push(raw[0]);
        self.append_key(name.unwrap_or_default());
        self.buf.extend_from_slice(&raw[name_end + 1..]);
        start
    }

    /// Open a nested container frame. Appends between this call and the
    /// matching [`DocBuilder::end_document`] land inside the child.
    pub fn begin_document(&mut self, name: &str, array: bool) -> usize {
        let tag = if array {
            ElementType::Array
        } else {
            ElementType::Object
        };
        let start = self.append_header(tag, name);
        let base = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        self.frames.push(Frame {
            base,
            array,
            next_index: 0,
        });
        start
    }

    /// Close the innermost container frame, writing its terminator and
    /// patching its length prefix.
    pub fn end_document(&mut self) {
        debug_assert!(self.frames.len() > 1, "no open child frame");
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.buf.push(EOO);
        let total = (self.buf.len() - frame.base) as i32;
        self.buf[frame.base..frame.base + 4].copy_from_slice(&total.to_le_bytes());
    }
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{first_element_offset, RawElement};

    #[test]
    fn hello_world_exact_bytes() {
        let mut builder = DocBuilder::new();
        builder.append_str("hello", "world");
        let bytes = builder.finish();
        assert_eq!(
            bytes,
            b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00"
        );
    }

    #[test]
    fn empty_document_exact_bytes() {
        let bytes = DocBuilder::new().finish();
        assert_eq!(bytes, b"\x05\x00\x00\x00\x00");
    }

    #[test]
    fn array_frame_generates_index_keys() {
        let mut builder = DocBuilder::new();
        builder.begin_document("xs", true);
        builder.append_i32("ignored", 10);
        builder.append_i32("ignored", 20);
        builder.end_document();
        let bytes = builder.finish();

        let arr = RawElement::at(&bytes, first_element_offset(&bytes, 0).unwrap());
        assert_eq!(arr.tag(), ElementType::Array);

        let first = first_element_offset(&bytes, arr.document_value_offset()).unwrap();
        let e0 = RawElement::at(&bytes, first);
        assert_eq!(e0.name(), "0");
        assert_eq!(e0.as_i32(), Some(10));
        let e1 = RawElement::at(&bytes, e0.next_offset());
        assert_eq!(e1.name(), "1");
        assert_eq!(e1.as_i32(), Some(20));
    }

    #[test]
    fn nested_lengths_are_patched() {
        let mut builder = DocBuilder::new();
        builder.begin_document("outer", false);
        builder.begin_document("inner", false);
        builder.append_bool("flag", true);
        builder.end_document();
        builder.end_document();
        let bytes = builder.finish();

        let declared = i32::from_le_bytes(bytes[0..4].try_into().unwrap()) as usize;
        assert_eq!(declared, bytes.len());

        let outer = RawElement::at(&bytes, first_element_offset(&bytes, 0).unwrap());
        let outer_doc = outer.document_value();
        let outer_declared = i32::from_le_bytes(outer_doc[0..4].try_into().unwrap()) as usize;
        assert_eq!(outer_declared, outer_doc.len());
    }

    #[test]
    fn raw_element_copy_preserves_bytes() {
        let mut source = DocBuilder::new();
        let off = source.append_str("name", "value");
        let source_bytes = source.finish();
        let elt = RawElement::at(&source_bytes, off);

        let mut builder = DocBuilder::new();
        let copied_off = builder.append_raw_element(None, elt.bytes());
        let bytes = builder.finish();
        let copied = RawElement::at(&bytes, copied_off);
        assert_eq!(copied.bytes(), elt.bytes());
    }

    #[test]
    fn raw_element_copy_with_rename() {
        let mut source = DocBuilder::new();
        let off = source.append_i64("old", -9);
        let source_bytes = source.finish();
        let elt = RawElement::at(&source_bytes, off);

        let mut builder = DocBuilder::new();
        let copied_off = builder.append_raw_element(Some("renamed"), elt.bytes());
        let bytes = builder.finish();
        let copied = RawElement::at(&bytes, copied_off);
        assert_eq!(copied.name(), "renamed");
        assert_eq!(copied.as_i64(), Some(-9));
    }

    #[test]
    fn snapshot_is_readable_before_finish() {
        let mut builder = DocBuilder::new();
        let first = builder.append_str("a", "a");
        let second = builder.append_i32("b", 2);

        let snapshot = builder.bytes();
        assert_eq!(RawElement::at(snapshot, first).as_str(), Some("a"));
        assert_eq!(RawElement::at(snapshot, second).as_i32(), Some(2));
    }

    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Scalar {
        F64(f64),
        Str(String),
        Bool(bool),
        I32(i32),
        I64(i64),
        Null,
    }

    fn arb_scalar() -> BoxedStrategy<Scalar> {
        prop_oneof![
            (-1e15_f64..1e15_f64).prop_map(Scalar::F64),
            "[a-zA-Z0-9 _]{0,40}".prop_map(Scalar::Str),
            any::<bool>().prop_map(Scalar::Bool),
            any::<i32>().prop_map(Scalar::I32),
            any::<i64>().prop_map(Scalar::I64),
            Just(Scalar::Null),
        ]
        .boxed()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        /// Every appended scalar reads back bitwise-identical at the
        /// offset the builder reported.
        #[test]
        fn prop_scalar_append_read_roundtrip(
            values in proptest::collection::vec(("[a-z]{1,8}", arb_scalar()), 1..20)
        ) {
            let mut builder = DocBuilder::new();
            let mut offsets = Vec::with_capacity(values.len());
            for (name, value) in &values {
                let offset = match value {
                    Scalar::F64(v) => builder.append_f64(name, *v),
                    Scalar::Str(v) => builder.append_str(name, v),
                    Scalar::Bool(v) => builder.append_bool(name, *v),
                    Scalar::I32(v) => builder.append_i32(name, *v),
                    Scalar::I64(v) => builder.append_i64(name, *v),
                    Scalar::Null => builder.append_null(name),
                };
                offsets.push(offset);
            }
            let bytes = builder.finish();

            for ((name, value), offset) in values.iter().zip(offsets) {
                let elt = RawElement::at(&bytes, offset);
                prop_assert_eq!(elt.name(), name.as_str());
                match value {
                    Scalar::F64(v) => {
                        prop_assert_eq!(elt.as_f64().map(f64::to_bits), Some(v.to_bits()));
                    }
                    Scalar::Str(v) => prop_assert_eq!(elt.as_str(), Some(v.as_str())),
                    Scalar::Bool(v) => prop_assert_eq!(elt.as_bool(), Some(*v)),
                    Scalar::I32(v) => prop_assert_eq!(elt.as_i32(), Some(*v)),
                    Scalar::I64(v) => prop_assert_eq!(elt.as_i64(), Some(*v)),
                    Scalar::Null => prop_assert_eq!(elt.tag(), ElementType::Null),
                }
            }

            // The sibling walk visits exactly the appended elements.
            let mut walked = 0;
            let mut offset = first_element_offset(&bytes, 0);
            while let Some(off) = offset {
                let elt = RawElement::at(&bytes, off);
                walked += 1;
                offset = (bytes[elt.next_offset()] != 0).then(|| elt.next_offset());
            }
            prop_assert_eq!(walked, values.len());
        }
    }
}
