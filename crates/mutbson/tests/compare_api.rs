//! Comparison semantics through the document API.

use std::cmp::Ordering;

use mutbson::{DocBuilder, Document};

#[test]
fn identical_subtrees_compare_equal() {
    let mut input = DocBuilder::new();
    input.begin_document("a", false);
    input.append_i32("k", 1);
    input.end_document();
    input.begin_document("b", false);
    input.append_i32("k", 1);
    input.end_document();
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let a = doc.left_child(doc.root()).unwrap();
    let b = doc.right_sibling(a).unwrap();

    // Without names the subtrees are the same; with names "a" < "b".
    assert_eq!(doc.compare_elements(a, b, false), Some(Ordering::Equal));
    assert_eq!(doc.compare_elements(a, b, true), Some(Ordering::Less));
    assert_eq!(doc.compare_elements(a, a, true), Some(Ordering::Equal));
}

#[test]
fn dirty_and_serialized_sides_compare_consistently() {
    let mut input = DocBuilder::new();
    input.begin_document("x", false);
    input.append_i32("k", 1);
    input.end_document();
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let x = doc.left_child(doc.root()).unwrap();

    // Build an equivalent subtree out of loose parts; it has no encoded
    // form until serialized.
    let y = doc.make_object("x");
    let k = doc.make_int32("k", 1);
    doc.push_back(y, k).unwrap();

    assert_eq!(doc.compare_elements(x, y, true), Some(Ordering::Equal));

    doc.set_value_int32(k, 2).unwrap();
    assert_eq!(doc.compare_elements(x, y, true), Some(Ordering::Less));
    assert_eq!(doc.compare_elements(y, x, true), Some(Ordering::Greater));
}

#[test]
fn compare_against_encoded_document() {
    let mut input = DocBuilder::new();
    input.append_i32("a", 1);
    input.append_str("s", "mid");
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let root = doc.root();

    let mut same = DocBuilder::new();
    same.append_i32("a", 1);
    same.append_str("s", "mid");
    let same_bytes = same.finish();
    assert_eq!(
        doc.compare_with_encoded_document(root, &same_bytes, true),
        Some(Ordering::Equal)
    );

    let mut bigger = DocBuilder::new();
    bigger.append_i32("a", 1);
    bigger.append_str("s", "zzz");
    let bigger_bytes = bigger.finish();
    assert_eq!(
        doc.compare_with_encoded_document(root, &bigger_bytes, true),
        Some(Ordering::Less)
    );

    // A prefix match with fewer elements sorts first.
    let mut shorter = DocBuilder::new();
    shorter.append_i32("a", 1);
    let shorter_bytes = shorter.finish();
    assert_eq!(
        doc.compare_with_encoded_document(root, &shorter_bytes, true),
        Some(Ordering::Greater)
    );
}

#[test]
fn compare_against_encoded_element() {
    let mut input = DocBuilder::new();
    input.append_i32("n", 5);
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let n = doc.left_child(doc.root()).unwrap();

    let mut donor = DocBuilder::new();
    let off = donor.append_i64("n", 6);
    let donor_bytes = donor.finish();
    let donor_elt = mutbson::RawElement::at(&donor_bytes, off);

    // Cross-width numeric comparison: 5 < 6.
    assert_eq!(
        doc.compare_with_encoded_element(n, donor_elt.bytes(), true),
        Some(Ordering::Less)
    );
}

#[test]
fn array_comparison_ignores_child_names() {
    let mut input = DocBuilder::new();
    input.begin_document("xs", true);
    input.append_i32("", 1);
    input.append_i32("", 2);
    input.end_document();
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let xs = doc.left_child(doc.root()).unwrap();

    // The same values under arbitrary keys: equal as arrays.
    let mut donor = DocBuilder::new();
    let off = donor.begin_document("other", true);
    donor.append_i32("", 1);
    donor.append_i32("", 2);
    donor.end_document();
    let donor_bytes = donor.finish();
    let donor_elt = mutbson::RawElement::at(&donor_bytes, off);

    assert_eq!(
        doc.compare_with_encoded_element(xs, donor_elt.bytes(), false),
        Some(Ordering::Equal)
    );
}
