//! Borrowed views over encoded elements.
//!
//! [`RawElement`] is a parsed reference to a single element inside a larger
//! encoded buffer, addressed by the byte offset of its type tag. All offsets
//! it reports are global to that buffer, so a view of a deeply nested
//! element can be re-created from `(buffer, offset)` alone.
//!
//! The reader is total by contract: buffers are required to be well-formed
//! encoded documents, and no validation is performed here. Handing in a
//! malformed or truncated buffer is the caller's responsibility and may
//! panic on an out-of-bounds read.

use crate::tag::{ElementType, EOO};
use crate::ObjectId;

#[inline]
fn read_i32_le(buf: &[u8], offset: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[offset..offset + 4]);
    i32::from_le_bytes(raw)
}

#[inline]
fn read_i64_le(buf: &[u8], offset: usize) -> i64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(raw)
}

#[inline]
fn read_u64_le(buf: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&buf[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

/// Length of the NUL-terminated string starting at `offset`, excluding the
/// terminator.
#[inline]
fn cstring_len(buf: &[u8], offset: usize) -> usize {
    let mut end = offset;
    while buf[end] != 0 {
        end += 1;
    }
    end - offset
}

fn cstring_str(buf: &[u8], offset: usize) -> &str {
    let bytes = &buf[offset..offset + cstring_len(buf, offset)];
    debug_assert!(std::str::from_utf8(bytes).is_ok());
    std::str::from_utf8(bytes).unwrap_or_default()
}

/// Byte offset of the first element inside the document starting at
/// `doc_offset`, or `None` when the document is empty.
pub fn first_element_offset(buf: &[u8], doc_offset: usize) -> Option<usize> {
    let first = doc_offset + 4;
    if buf[first] == EOO {
        None
    } else {
        Some(first)
    }
}

/// Whether an element (rather than the end-of-document terminator) starts
/// at `offset`.
#[inline]
#[must_use]
pub fn element_starts_at(buf: &[u8], offset: usize) -> bool {
    buf[offset] != EOO
}

/// A parsed reference to one encoded element.
///
/// Layout on the wire: `type byte` + `name cstring` + `value`. The view
/// caches the decomposition so size queries are O(1) after construction.
#[derive(Debug, Clone, Copy)]
pub struct RawElement<'a> {
    buf: &'a [u8],
    offset: usize,
    tag: ElementType,
    name_len: usize,
    value_size: usize,
}

impl<'a> RawElement<'a> {
    /// View the element starting at `offset` within `buf`.
    ///
    /// The byte at `offset` must be a valid type tag (not the document
    /// terminator).
    #[must_use]
    pub fn at(buf: &'a [u8], offset: usize) -> Self {
        let Some(tag) = ElementType::from_byte(buf[offset]) else {
            panic!("not an element start: tag byte 0x{:02x}", buf[offset]);
        };
        let name_len = cstring_len(buf, offset + 1);
        let value_offset = offset + 1 + name_len + 1;
        let value_size = Self::value_size_at(buf, tag, value_offset);
        Self {
            buf,
            offset,
            tag,
            name_len,
            value_size,
        }
    }

    fn value_size_at(buf: &[u8], tag: ElementType, value_offset: usize) -> usize {
        match tag {
            ElementType::Double
            | ElementType::DateTime
            | ElementType::Timestamp
            | ElementType::Int64 => 8,
            ElementType::Int32 => 4,
            ElementType::Bool => 1,
            ElementType::ObjectId => 12,
            ElementType::Undefined
            | ElementType::Null
            | ElementType::MinKey
            | ElementType::MaxKey => 0,
            ElementType::String | ElementType::Code | ElementType::Symbol => {
                4 + read_i32_le(buf, value_offset) as usize
            }
            ElementType::Binary => 4 + 1 + read_i32_le(buf, value_offset) as usize,
            // Embedded documents carry their own total size, which
            // includes the length prefix and the terminator.
            ElementType::Object | ElementType::Array | ElementType::CodeWithScope => {
                read_i32_le(buf, value_offset) as usize
            }
            ElementType::Regex => {
                let pattern = cstring_len(buf, value_offset) + 1;
                pattern + cstring_len(buf, value_offset + pattern) + 1
            }
            ElementType::DbPointer => 4 + read_i32_le(buf, value_offset) as usize + 12,
        }
    }

    /// The element's type tag.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> ElementType {
        self.tag
    }

    /// The buffer this view borrows.
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Offset of the type byte within the buffer.
    #[inline]
    #[must_use]
    pub const fn start_offset(&self) -> usize {
        self.offset
    }

    /// The field name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        cstring_str(self.buf, self.offset + 1)
    }

    /// Length of the field name in bytes, excluding the NUL terminator.
    #[inline]
    #[must_use]
    pub const fn name_len(&self) -> usize {
        self.name_len
    }

    /// Offset of the first value byte within the buffer.
    #[inline]
    #[must_use]
    pub const fn value_offset(&self) -> usize {
        self.offset + 1 + self.name_len + 1
    }

    /// Size of the value in bytes.
    #[inline]
    #[must_use]
    pub const fn value_size(&self) -> usize {
        self.value_size
    }

    /// Total encoded size: type byte + name cstring + value.
    #[inline]
    #[must_use]
    pub const fn total_size(&self) -> usize {
        1 + self.name_len + 1 + self.value_size
    }

    /// Offset of the byte immediately after this element.
    #[inline]
    #[must_use]
    pub const fn next_offset(&self) -> usize {
        self.offset + self.total_size()
    }

    /// The complete encoded element bytes.
    #[must_use]
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.offset..self.next_offset()]
    }

    /// The raw value bytes.
    #[must_use]
    pub fn value_bytes(&self) -> &'a [u8] {
        &self.buf[self.value_offset()..self.value_offset() + self.value_size]
    }

    /// For Object/Array elements: the embedded document bytes, including
    /// the length prefix and terminator.
    #[must_use]
    pub fn document_value(&self) -> &'a [u8] {
        debug_assert!(self.tag.is_container());
        self.value_bytes()
    }

    /// Offset of the embedded document for container elements.
    #[inline]
    #[must_use]
    pub const fn document_value_offset(&self) -> usize {
        self.value_offset()
    }

    // -- typed accessors ---------------------------------------------------

    /// The value as a double, if this element is a Double.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.tag {
            ElementType::Double => Some(f64::from_bits(read_u64_le(
                self.buf,
                self.value_offset(),
            ))),
            _ => None,
        }
    }

    /// The value as a string, for String/Code/Symbol elements.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match self.tag {
            ElementType::String | ElementType::Code | ElementType::Symbol => {
                let len = read_i32_le(self.buf, self.value_offset()) as usize;
                let start = self.value_offset() + 4;
                let bytes = &self.buf[start..start + len - 1];
                debug_assert!(std::str::from_utf8(bytes).is_ok());
                Some(std::str::from_utf8(bytes).unwrap_or_default())
            }
            _ => None,
        }
    }

    /// The value as a bool, if this element is a Bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.tag {
            ElementType::Bool => Some(self.buf[self.value_offset()] != 0),
            _ => None,
        }
    }

    /// The value as an i32, if this element is an Int32.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self.tag {
            ElementType::Int32 => Some(read_i32_le(self.buf, self.value_offset())),
            _ => None,
        }
    }

    /// The value as an i64, if this element is an Int64.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.tag {
            ElementType::Int64 => Some(read_i64_le(self.buf, self.value_offset())),
            _ => None,
        }
    }

    /// Millis since the epoch, if this element is a DateTime.
    #[must_use]
    pub fn as_datetime(&self) -> Option<i64> {
        match self.tag {
            ElementType::DateTime => Some(read_i64_le(self.buf, self.value_offset())),
            _ => None,
        }
    }

    /// The raw timestamp value, if this element is a Timestamp.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<u64> {
        match self.tag {
            ElementType::Timestamp => Some(read_u64_le(self.buf, self.value_offset())),
            _ => None,
        }
    }

    /// The object id, if this element is an ObjectId.
    #[must_use]
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self.tag {
            ElementType::ObjectId => {
                let mut raw = [0u8; 12];
                raw.copy_from_slice(
                    &self.buf[self.value_offset()..self.value_offset() + 12],
                );
                Some(ObjectId(raw))
            }
            _ => None,
        }
    }

    /// Subtype byte and payload, if this element is Binary.
    #[must_use]
    pub fn as_binary(&self) -> Option<(u8, &'a [u8])> {
        match self.tag {
            ElementType::Binary => {
                let len = read_i32_le(self.buf, self.value_offset()) as usize;
                let subtype = self.buf[self.value_offset() + 4];
                let start = self.value_offset() + 5;
                Some((subtype, &self.buf[start..start + len]))
            }
            _ => None,
        }
    }

    /// Pattern and options, if this element is a Regex.
    #[must_use]
    pub fn as_regex(&self) -> Option<(&'a str, &'a str)> {
        match self.tag {
            ElementType::Regex => {
                let pattern_off = self.value_offset();
                let pattern = cstring_str(self.buf, pattern_off);
                let options = cstring_str(self.buf, pattern_off + pattern.len() + 1);
                Some((pattern, options))
            }
            _ => None,
        }
    }

    /// Namespace and object id, if this element is a DbPointer.
    #[must_use]
    pub fn as_db_pointer(&self) -> Option<(&'a str, ObjectId)> {
        match self.tag {
            ElementType::DbPointer => {
                let len = read_i32_le(self.buf, self.value_offset()) as usize;
                let ns_start = self.value_offset() + 4;
                let ns_bytes = &self.buf[ns_start..ns_start + len - 1];
                let mut raw = [0u8; 12];
                raw.copy_from_slice(&self.buf[ns_start + len..ns_start + len + 12]);
                Some((
                    std::str::from_utf8(ns_bytes).unwrap_or_default(),
                    ObjectId(raw),
                ))
            }
            _ => None,
        }
    }

    /// Code string and scope document bytes, if this element is
    /// CodeWithScope.
    #[must_use]
    pub fn as_code_with_scope(&self) -> Option<(&'a str, &'a [u8])> {
        match self.tag {
            ElementType::CodeWithScope => {
                let total = read_i32_le(self.buf, self.value_offset()) as usize;
                let code_len = read_i32_le(self.buf, self.value_offset() + 4) as usize;
                let code_start = self.value_offset() + 8;
                let code_bytes = &self.buf[code_start..code_start + code_len - 1];
                let scope_start = code_start + code_len;
                let scope_end = self.value_offset() + total;
                Some((
                    std::str::from_utf8(code_bytes).unwrap_or_default(),
                    &self.buf[scope_start..scope_end],
                ))
            }
            _ => None,
        }
    }
}
