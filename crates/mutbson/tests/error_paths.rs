//! Rejection paths: every mutator validates before it writes, so a
//! returned error leaves the document byte-identical.

use mutbson::{AttachLink, DocBuilder, Document, MutBsonError};

fn one_int_doc() -> Vec<u8> {
    let mut builder = DocBuilder::new();
    builder.append_i32("n", 1);
    builder.finish()
}

#[test]
fn root_cannot_be_removed_or_renamed() {
    let bytes = one_int_doc();
    let mut doc = Document::from_bytes(&bytes);
    let root = doc.root();

    assert_eq!(doc.remove(root), Err(MutBsonError::RemoveRoot));
    assert_eq!(doc.rename(root, "other"), Err(MutBsonError::IllegalRoot));
    assert_eq!(doc.set_value_int32(root, 1), Err(MutBsonError::IllegalRoot));
    assert_eq!(doc.serialize(), bytes);
}

#[test]
fn scalars_reject_children() {
    let bytes = one_int_doc();
    let mut doc = Document::from_bytes(&bytes);
    let n = doc.left_child(doc.root()).unwrap();
    let child = doc.make_int32("x", 2);

    assert_eq!(doc.push_back(n, child), Err(MutBsonError::NotComposite));
    assert_eq!(doc.push_front(n, child), Err(MutBsonError::NotComposite));
    // The rejected element is still detached and attachable elsewhere.
    doc.push_back(doc.root(), child).unwrap();
}

#[test]
fn attached_elements_cannot_be_attached_again() {
    let bytes = one_int_doc();
    let mut doc = Document::from_bytes(&bytes);
    let root = doc.root();
    let n = doc.left_child(root).unwrap();

    // `n` is attached: it has a parent.
    assert_eq!(
        doc.push_back(root, n),
        Err(MutBsonError::IllegalAttach {
            link: AttachLink::DanglingParent
        })
    );

    // The root is never attachable, even though it has no parent.
    assert_eq!(
        doc.add_sibling_left(n, root),
        Err(MutBsonError::IllegalAttach {
            link: AttachLink::Root
        })
    );
}

#[test]
fn sibling_insertion_needs_a_parent() {
    let bytes = one_int_doc();
    let mut doc = Document::from_bytes(&bytes);
    let detached = doc.make_int32("d", 0);
    let other = doc.make_int32("e", 0);

    assert_eq!(
        doc.add_sibling_left(detached, other),
        Err(MutBsonError::NoParent)
    );
    assert_eq!(
        doc.add_sibling_right(detached, other),
        Err(MutBsonError::NoParent)
    );
    assert_eq!(doc.remove(detached), Err(MutBsonError::NoParent));
}

#[test]
fn encoded_input_must_not_start_with_end_of_object() {
    let bytes = one_int_doc();
    let mut doc = Document::from_bytes(&bytes);
    let n = doc.left_child(doc.root()).unwrap();

    assert_eq!(
        doc.set_value_from_encoded(n, &[0x00]),
        Err(MutBsonError::BadType)
    );
    assert!(doc.make_from_encoded(&[0x00]).is_err());
    assert_eq!(doc.serialize(), bytes);
}

#[test]
fn handles_do_not_cross_documents() {
    let bytes_a = one_int_doc();
    let bytes_b = one_int_doc();
    let mut doc_a = Document::from_bytes(&bytes_a);
    let mut doc_b = Document::from_bytes(&bytes_b);

    let foreign = doc_b.make_int32("x", 9);
    assert_eq!(
        doc_a.push_back(doc_a.root(), foreign),
        Err(MutBsonError::WrongDocument)
    );
    assert_eq!(doc_a.remove(foreign), Err(MutBsonError::WrongDocument));
    assert_eq!(doc_a.serialize(), bytes_a);
}

#[test]
fn failed_mutations_leave_in_place_mode_alone() {
    use mutbson::InPlaceMode;

    let bytes = one_int_doc();
    let mut doc = Document::from_bytes_with_mode(&bytes, InPlaceMode::Enabled);
    let root = doc.root();

    // Validation precedes the mode change: a rejected mutation must not
    // burn the damage queue.
    assert_eq!(doc.remove(root), Err(MutBsonError::RemoveRoot));
    assert_eq!(doc.in_place_mode(), InPlaceMode::Enabled);

    let n = doc.left_child(root).unwrap();
    doc.set_value_int32(n, 3).unwrap();
    let (damages, _) = doc.in_place_updates().unwrap();
    assert_eq!(damages.len(), 1);
}
