//! Mutable trees over encoded BSON documents.
//!
//! A [`Document`] wraps an immutable encoded buffer and lets you navigate
//! and mutate its tree of elements, then either serialize the result back
//! to bytes or, for size-preserving scalar replacements, collect a queue
//! of byte patches that update the original buffer in place.
//!
//! # Data model
//!
//! The document is built from four stores:
//!
//! - an **element arena**: one small record per materialized element,
//!   addressed by a stable index. Records are never removed, so an
//!   [`ElementId`] stays valid across every later mutation, including
//!   removal of the element it names.
//! - an **object table** of byte buffers: slot 0 is the document's own
//!   leaf builder, later slots are caller-provided source buffers,
//!   borrowed for the document's lifetime.
//! - a **leaf builder**: a growing buffer where every synthesized value
//!   (from the `make_*` factories and `set_value_*` mutators) is encoded.
//! - a **field-name heap** for elements that have no encoded bytes to
//!   read a name from.
//!
//! Loading a buffer materializes nothing: the root's children start out
//! opaque, and navigation decodes one neighbor at a time. Each element
//! record carries a *serialized* bit asserting that its byte range is
//! still a faithful encoding of its subtree; mutations clear the bit
//! upward to the root, and serialization bulk-copies any subtree whose
//! bit survived.
//!
//! # Example
//!
//! ```
//! use mutbson::{DocBuilder, Document};
//!
//! // {"xs": {"x": "x"}, "ys": {"y": "y"}}
//! let mut input = DocBuilder::new();
//! input.begin_document("xs", false);
//! input.append_str("x", "x");
//! input.end_document();
//! input.begin_document("ys", false);
//! input.append_str("y", "y");
//! input.end_document();
//! let bytes = input.finish();
//!
//! let mut doc = Document::from_bytes(&bytes);
//! let root = doc.root();
//! let xs = doc.left_child(root).unwrap();
//! let ys = doc.right_sibling(xs).unwrap();
//! assert_eq!(doc.field_name(ys), Some("ys"));
//!
//! let shout = doc.make_string("Y", "Y");
//! doc.push_back(ys, shout).unwrap();
//!
//! let out = doc.serialize();
//! assert_ne!(out, bytes);
//! ```
//!
//! # In-place updates
//!
//! A document opened with [`InPlaceMode::Enabled`] records qualifying
//! `set_value_*` calls as [`DamageEvent`]s: byte-range patches from the
//! synthesized-value buffer into the original. Any mutation that cannot
//! be expressed that way (attachment, removal, rename, or a size-changing
//! replacement) disables the mode permanently.

mod compare;
mod document;
mod mutate;
mod rep;
mod write;

pub mod damage;


pub use damage::{apply_damages, DamageEvent, DamageVector, InPlaceMode};
pub use document::{Document, ElementId};

pub use mutbson_error::{AttachLink, MutBsonError, Result};
pub use mutbson_types::{DocBuilder, ElementType, ObjectId, RawElement};
