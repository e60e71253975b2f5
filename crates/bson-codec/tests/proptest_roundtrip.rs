//! Property-based tests for encoding round-trips and hostile input.

use proptest::prelude::*;

use bson_codec::{
    decode, decode_document, decode_with_options, encode_document, Binary, BinarySubtype,
    CodeWithScope, DbPointer, DecodeOptions, Document, ObjectId, Regex, Timestamp, Value,
};

fn arb_key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_$.]{0,8}"
}

fn arb_cstring() -> impl Strategy<Value = String> {
    "[^\\x00]{0,12}"
}

fn arb_subtype() -> impl Strategy<Value = BinarySubtype> {
    any::<u8>().prop_map(BinarySubtype::from_u8)
}

/// Values that decode back to themselves.
///
/// Integers use the smallest variant that holds them, matching what the
/// default encoder writes.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        Just(Value::Undefined),
        Just(Value::MinKey),
        Just(Value::MaxKey),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::integer),
        any::<i32>().prop_map(Value::Int32),
        // Filter out NaN since NaN != NaN
        any::<f64>().prop_filter("not NaN", |f| !f.is_nan()).prop_map(Value::Double),
        ".*".prop_map(Value::String),
        ".*".prop_map(Value::Code),
        ".*".prop_map(Value::Symbol),
        any::<i64>().prop_map(Value::DateTime),
        any::<[u8; 12]>().prop_map(|b| Value::ObjectId(ObjectId::from_bytes(b))),
        (any::<u32>(), any::<u32>()).prop_map(|(i, s)| Value::Timestamp(Timestamp::new(i, s))),
        (arb_cstring(), "[gimsux]{0,3}").prop_map(|(p, f)| Value::Regex(Regex::new(p, f))),
        (arb_subtype(), prop::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(st, bytes)| Value::Binary(Binary::with_subtype(st, bytes))),
        (".*", any::<[u8; 12]>()).prop_map(|(namespace, id)| Value::DbPointer(DbPointer {
            namespace,
            id: ObjectId::from_bytes(id),
        })),
    ];

    leaf.prop_recursive(
        4,  // depth
        64, // size
        8,  // items per collection
        |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
                prop::collection::vec((arb_key(), inner.clone()), 0..8)
                    .prop_map(|entries| Value::Document(entries.into_iter().collect())),
                (".*", prop::collection::vec((arb_key(), inner), 0..4)).prop_map(
                    |(code, entries)| {
                        Value::CodeWithScope(CodeWithScope::new(
                            code,
                            entries.into_iter().collect::<Document>(),
                        ))
                    }
                ),
            ]
        },
    )
}

fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::vec((arb_key(), arb_value()), 0..10)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn document_roundtrip(doc in arb_document()) {
        let encoded = encode_document(&doc).expect("encoding should succeed");
        let decoded = decode_document(&encoded).expect("decoding should succeed");
        prop_assert_eq!(&doc, &decoded);

        // Encoder output is always well-formed under strict decoding.
        let strict = decode_with_options(&encoded, DecodeOptions::strict())
            .expect("strict decoding should succeed");
        prop_assert_eq!(Value::Document(doc), strict);
    }

    #[test]
    fn length_prefix_matches_output(doc in arb_document()) {
        let encoded = encode_document(&doc).expect("encoding should succeed");
        let declared = i32::from_le_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]);
        prop_assert_eq!(declared as usize, encoded.len());
        prop_assert_eq!(encoded.last().copied(), Some(0u8));
    }

    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode(&bytes);
        let _ = decode_with_options(&bytes, DecodeOptions::strict());
    }

    #[test]
    fn decode_never_panics_on_mutations(
        doc in arb_document(),
        flips in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8),
    ) {
        let mut encoded = encode_document(&doc).expect("encoding should succeed");
        for (index, byte) in flips {
            let i = index.index(encoded.len());
            encoded[i] = byte;
        }
        let _ = decode(&encoded);
        let _ = decode_with_options(&encoded, DecodeOptions::strict());
    }

    #[test]
    fn object_id_hex_roundtrip(bytes in any::<[u8; 12]>()) {
        let id = ObjectId::from_bytes(bytes);
        let parsed: ObjectId = id.to_hex().parse().expect("hex should parse");
        prop_assert_eq!(parsed, id);
    }
}
