//! Round-trips covering every element type the wire format defines,
//! including the ones the resolver must size correctly to walk past.

use mutbson::{DocBuilder, Document, ElementType, ObjectId};

fn every_type_doc() -> Vec<u8> {
    let mut scope = DocBuilder::new();
    scope.append_i32("x", 1);
    let scope_bytes = scope.finish();

    let mut builder = DocBuilder::new();
    builder.append_f64("double", 1.5);
    builder.append_str("string", "s");
    builder.begin_document("object", false);
    builder.append_i32("k", 1);
    builder.end_document();
    builder.begin_document("array", true);
    builder.append_i32("", 1);
    builder.end_document();
    builder.append_binary("binary", 0x80, &[1, 2, 3]);
    builder.append_undefined("undefined");
    builder.append_object_id("oid", ObjectId([9u8; 12]));
    builder.append_bool("bool", false);
    builder.append_datetime("date", 1_700_000_000_000);
    builder.append_null("null");
    builder.append_regex("regex", "^x+$", "im");
    builder.append_db_pointer("dbptr", "db.coll", ObjectId([1u8; 12]));
    builder.append_code("code", "f()");
    builder.append_symbol("symbol", "sym");
    builder.append_code_with_scope("cws", "g()", &scope_bytes);
    builder.append_i32("int32", -1);
    builder.append_timestamp("timestamp", 42);
    builder.append_i64("int64", i64::MIN);
    builder.append_min_key("min");
    builder.append_max_key("max");
    builder.finish()
}

#[test]
fn every_type_survives_load_and_serialize() {
    let bytes = every_type_doc();
    let mut doc = Document::from_bytes(&bytes);
    assert_eq!(doc.serialize(), bytes);
}

#[test]
fn resolver_walks_across_every_type() {
    let bytes = every_type_doc();
    let mut doc = Document::from_bytes(&bytes);

    // Walking the sibling chain sizes every element on the way.
    let mut names = Vec::new();
    let mut current = doc.left_child(doc.root());
    while let Some(el) = current {
        names.push(doc.field_name(el).unwrap().to_owned());
        current = doc.right_sibling(el);
    }
    assert_eq!(
        names,
        [
            "double",
            "string",
            "object",
            "array",
            "binary",
            "undefined",
            "oid",
            "bool",
            "date",
            "null",
            "regex",
            "dbptr",
            "code",
            "symbol",
            "cws",
            "int32",
            "timestamp",
            "int64",
            "min",
            "max",
        ]
    );
}

#[test]
fn code_with_scope_is_a_leaf() {
    let bytes = every_type_doc();
    let mut doc = Document::from_bytes(&bytes);

    let mut current = doc.left_child(doc.root());
    while let Some(el) = current {
        if doc.element_type(el) == Some(ElementType::CodeWithScope) {
            // Its scope document is opaque payload, not children.
            assert!(!doc.has_children(el));
            let (code, scope) = doc.value(el).unwrap().as_code_with_scope().unwrap();
            assert_eq!(code, "g()");
            let mut expected_scope = DocBuilder::new();
            expected_scope.append_i32("x", 1);
            assert_eq!(scope, expected_scope.finish());
            return;
        }
        current = doc.right_sibling(el);
    }
    panic!("CodeWithScope element not found");
}

#[test]
fn mutating_one_leaf_keeps_every_other_type_intact() {
    let bytes = every_type_doc();
    let mut doc = Document::from_bytes(&bytes);

    let mut current = doc.left_child(doc.root());
    while let Some(el) = current {
        if doc.field_name(el) == Some("bool") {
            doc.set_value_bool(el, true).unwrap();
            break;
        }
        current = doc.right_sibling(el);
    }

    let out = doc.serialize();
    assert_ne!(out, bytes);

    // Only the one value byte differs; the documents are the same length
    // and agree everywhere else.
    assert_eq!(out.len(), bytes.len());
    let diffs: Vec<usize> = (0..out.len()).filter(|&i| out[i] != bytes[i]).collect();
    assert_eq!(diffs.len(), 1);
    assert_eq!(bytes[diffs[0]], 0);
    assert_eq!(out[diffs[0]], 1);
}

#[test]
fn set_value_covers_every_scalar_type() {
    let mut input = DocBuilder::new();
    input.append_i32("v", 0);
    let bytes = input.finish();

    let mut doc = Document::from_bytes(&bytes);
    let v = doc.left_child(doc.root()).unwrap();

    doc.set_value_double(v, 0.5).unwrap();
    assert_eq!(doc.element_type(v), Some(ElementType::Double));
    doc.set_value_string(v, "s").unwrap();
    assert_eq!(doc.element_type(v), Some(ElementType::String));
    doc.set_value_bool(v, true).unwrap();
    doc.set_value_int32(v, 3).unwrap();
    doc.set_value_int64(v, 4).unwrap();
    doc.set_value_datetime(v, 5).unwrap();
    doc.set_value_timestamp(v, 6).unwrap();
    doc.set_value_null(v).unwrap();
    doc.set_value_undefined(v).unwrap();
    doc.set_value_min_key(v).unwrap();
    doc.set_value_max_key(v).unwrap();
    doc.set_value_object_id(v, ObjectId([3u8; 12])).unwrap();
    doc.set_value_binary(v, 0, &[7, 8]).unwrap();
    doc.set_value_regex(v, "a", "").unwrap();
    doc.set_value_db_pointer(v, "db.c", ObjectId::ZERO).unwrap();
    doc.set_value_code(v, "h()").unwrap();
    doc.set_value_symbol(v, "sy").unwrap();

    let mut scope = DocBuilder::new();
    scope.append_bool("b", true);
    let scope_bytes = scope.finish();
    doc.set_value_code_with_scope(v, "i()", &scope_bytes).unwrap();
    assert_eq!(doc.element_type(v), Some(ElementType::CodeWithScope));

    // Containers last: the element becomes navigable again.
    let mut sub = DocBuilder::new();
    sub.append_i32("in", 1);
    let sub_bytes = sub.finish();
    doc.set_value_object(v, &sub_bytes).unwrap();
    assert_eq!(doc.element_type(v), Some(ElementType::Object));
    let inner = doc.left_child(v).unwrap();
    assert_eq!(doc.field_name(inner), Some("in"));

    doc.set_value_array(v, &sub_bytes).unwrap();
    assert_eq!(doc.element_type(v), Some(ElementType::Array));

    // The array value was grafted verbatim, inner keys included.
    let mut expected = DocBuilder::new();
    expected.append_document("v", &sub_bytes, true);
    assert_eq!(doc.serialize(), expected.finish());
}
