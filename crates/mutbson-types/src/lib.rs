//! BSON wire-format primitives.
//!
//! This crate owns everything that touches raw encoded bytes: the type tag
//! table ([`tag::ElementType`]), a borrowed element reader
//! ([`raw::RawElement`]), an incremental document encoder
//! ([`builder::DocBuilder`]), and the canonical cross-type comparator
//! ([`order::compare_elements`]). Higher layers treat elements as opaque
//! `(buffer, offset)` pairs and defer to this crate for their contents.

pub mod builder;
pub mod order;
pub mod raw;
pub mod tag;

pub use builder::DocBuilder;
pub use order::{compare_documents, compare_elements};
pub use raw::{element_starts_at, first_element_offset, RawElement};
pub use tag::{ElementType, EOO};

use std::fmt;

/// A 12-byte object id.
///
/// Treated as an opaque byte string: no timestamp or machine-id structure
/// is interpreted here.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(transparent)]
pub struct ObjectId(pub [u8; 12]);

impl ObjectId {
    /// The all-zero object id.
    pub const ZERO: Self = Self([0u8; 12]);

    /// The raw bytes.
    #[inline]
    #[must_use]
    pub const fn bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_display_is_lower_hex() {
        let id = ObjectId([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x00, 0xFF, 0x10, 0x0A,
        ]);
        assert_eq!(id.to_string(), "0123456789abcdef00ff100a");
    }

    #[test]
    fn object_id_orders_bytewise() {
        assert!(ObjectId::ZERO < ObjectId([0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]));
    }
}
