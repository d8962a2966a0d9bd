//! Canonical ordering over encoded elements.
//!
//! The comparator establishes a total order across types through canonical
//! ranks, then compares values within a rank. Numeric types (Double, Int32,
//! Int64) share a rank and compare by numeric value; String and Symbol
//! share a rank and compare by contents. Container elements compare by
//! walking their children pairwise, with the shorter container sorting
//! before the longer when one is a prefix of the other.

use std::cmp::Ordering;

use crate::raw::{element_starts_at, first_element_offset, RawElement};
use crate::tag::ElementType;

/// Three-way comparison of two encoded elements.
///
/// When `consider_field_names` is false, names are skipped and only types
/// and values participate. Child comparisons inside containers consider
/// names only when neither side is an array: array keys are positional and
/// carry no meaning.
#[must_use]
pub fn compare_elements(
    a: RawElement<'_>,
    b: RawElement<'_>,
    consider_field_names: bool,
) -> Ordering {
    let rank = a.tag().canonical_rank().cmp(&b.tag().canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    if consider_field_names {
        let names = a.name().cmp(b.name());
        if names != Ordering::Equal {
            return names;
        }
    }

    compare_values(a, b)
}

/// Three-way comparison of two complete encoded documents, element by
/// element.
#[must_use]
pub fn compare_documents(a: &[u8], b: &[u8], consider_field_names: bool) -> Ordering {
    let mut a_off = first_element_offset(a, 0);
    let mut b_off = first_element_offset(b, 0);

    loop {
        match (a_off, b_off) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ao), Some(bo)) => {
                let ae = RawElement::at(a, ao);
                let be = RawElement::at(b, bo);
                let result = compare_elements(ae, be, consider_field_names);
                if result != Ordering::Equal {
                    return result;
                }
                a_off = next_sibling(a, ae);
                b_off = next_sibling(b, be);
            }
        }
    }
}

fn next_sibling(buf: &[u8], elt: RawElement<'_>) -> Option<usize> {
    let next = elt.next_offset();
    if element_starts_at(buf, next) {
        Some(next)
    } else {
        None
    }
}

fn compare_values(a: RawElement<'_>, b: RawElement<'_>) -> Ordering {
    use ElementType as T;

    match (a.tag(), b.tag()) {
        (T::Double | T::Int32 | T::Int64, T::Double | T::Int32 | T::Int64) => {
            compare_numeric(a, b)
        }
        (T::String | T::Symbol, T::String | T::Symbol) | (T::Code, T::Code) => {
            a.as_str().cmp(&b.as_str())
        }
        (T::Bool, T::Bool) => a.as_bool().cmp(&b.as_bool()),
        (T::DateTime, T::DateTime) => a.as_datetime().cmp(&b.as_datetime()),
        (T::Timestamp, T::Timestamp) => a.as_timestamp().cmp(&b.as_timestamp()),
        (T::ObjectId, T::ObjectId) => a.as_object_id().cmp(&b.as_object_id()),
        (T::Binary, T::Binary) => {
            let (a_sub, a_data) = match a.as_binary() {
                Some(v) => v,
                None => return Ordering::Equal,
            };
            let (b_sub, b_data) = match b.as_binary() {
                Some(v) => v,
                None => return Ordering::Equal,
            };
            a_data
                .len()
                .cmp(&b_data.len())
                .then(a_sub.cmp(&b_sub))
                .then_with(|| a_data.cmp(b_data))
        }
        (T::Regex, T::Regex) => a.as_regex().cmp(&b.as_regex()),
        (T::DbPointer, T::DbPointer) => a.as_db_pointer().cmp(&b.as_db_pointer()),
        (T::CodeWithScope, T::CodeWithScope) => {
            let (a_code, a_scope) = match a.as_code_with_scope() {
                Some(v) => v,
                None => return Ordering::Equal,
            };
            let (b_code, b_scope) = match b.as_code_with_scope() {
                Some(v) => v,
                None => return Ordering::Equal,
            };
            a_code.cmp(b_code).then_with(|| a_scope.cmp(b_scope))
        }
        (T::Object | T::Array, T::Object | T::Array) => {
            let consider_children = a.tag() != T::Array && b.tag() != T::Array;
            compare_documents(a.document_value(), b.document_value(), consider_children)
        }
        // Valueless types within one rank (Null, Undefined, MinKey, MaxKey).
        _ => Ordering::Equal,
    }
}

fn compare_numeric(a: RawElement<'_>, b: RawElement<'_>) -> Ordering {
    if a.tag().is_integral() && b.tag().is_integral() {
        return integral_value(a).cmp(&integral_value(b));
    }
    let left = numeric_value(a);
    let right = numeric_value(b);
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

fn integral_value(e: RawElement<'_>) -> i64 {
    match e.tag() {
        ElementType::Int32 => e.as_i32().map(i64::from).unwrap_or_default(),
        _ => e.as_i64().unwrap_or_default(),
    }
}

fn numeric_value(e: RawElement<'_>) -> f64 {
    match e.tag() {
        ElementType::Double => e.as_f64().unwrap_or_default(),
        ElementType::Int32 => f64::from(e.as_i32().unwrap_or_default()),
        _ => e.as_i64().unwrap_or_default() as f64,
    }
}
