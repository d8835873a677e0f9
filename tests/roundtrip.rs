use ordered_float::OrderedFloat;

use proplist::{Date, Dictionary, Uid, Url, Value};

/// A tree exercising every variant a version 00 document can carry.
fn v00_fixture() -> Value {
    let mut nested = Dictionary::new();
    nested.insert("flag".to_string(), Value::Boolean(false));
    nested.insert("archive".to_string(), Value::Uid(Uid::new(0x1234)));

    let mut root = Dictionary::new();
    root.insert("Name".to_string(), Value::String("Aliza".to_string()));
    root.insert("Greek".to_string(), Value::String("αβ".to_string()));
    root.insert("Count".to_string(), Value::Integer(300));
    root.insert("Negative".to_string(), Value::Integer(-7));
    root.insert(
        "Huge".to_string(),
        Value::BigInteger(i64::MAX as i128 + 99),
    );
    root.insert("Ratio".to_string(), Value::Real(OrderedFloat(2.5)));
    root.insert("Narrow".to_string(), Value::Float(OrderedFloat(-2.5)));
    root.insert(
        "Stamp".to_string(),
        Value::Date(Date::from_seconds_since_reference(731_764_855.0)),
    );
    root.insert("Payload".to_string(), Value::Data(vec![0, 1, 2, 3, 0xFF]));
    root.insert(
        "Items".to_string(),
        Value::Array(vec![
            Value::Integer(1),
            Value::String("Aliza".to_string()),
            Value::Dictionary(nested),
        ]),
    );
    Value::Dictionary(root)
}

/// A tree exercising every variant a version 15 document can carry.
fn v15_fixture() -> Value {
    let mut root = Dictionary::new();
    root.insert("Nothing".to_string(), Value::Null);
    root.insert("Truth".to_string(), Value::Boolean(true));
    root.insert("Count".to_string(), Value::Integer(70_000));
    root.insert(
        "Wide".to_string(),
        Value::BigInteger(u64::MAX as i128 + 1),
    );
    root.insert("Ratio".to_string(), Value::Real(OrderedFloat(0.1)));
    root.insert("Narrow".to_string(), Value::Float(OrderedFloat(1.5)));
    root.insert(
        "Stamp".to_string(),
        Value::Date(Date::from_seconds_since_reference(-1.25)),
    );
    root.insert("Payload".to_string(), Value::Data(vec![9; 20]));
    root.insert("Glyphs".to_string(), Value::String("κλμ".to_string()));
    root.insert(
        "Machine".to_string(),
        Value::Uuid([
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC,
            0xDD, 0xEE, 0xFF,
        ]),
    );
    root.insert(
        "Home".to_string(),
        Value::Url(Url {
            base: Some("https://example.com".to_string()),
            relative: "/a/b".to_string(),
        }),
    );
    root.insert(
        "Bare".to_string(),
        Value::Url(Url {
            base: None,
            relative: "https://example.com/".to_string(),
        }),
    );
    root.insert(
        "Tags".to_string(),
        Value::Set(vec![
            Value::String("one".to_string()),
            Value::String("two".to_string()),
        ]),
    );
    root.insert(
        "Grid".to_string(),
        Value::Array(vec![Value::Integer(1), Value::Integer(1)]),
    );
    Value::Dictionary(root)
}

#[test]
fn test_v00_round_trip() {
    let value = v00_fixture();
    let encoded = proplist::to_bytes_v00(&value).unwrap();
    assert_eq!(proplist::from_bytes(&encoded), Ok(value));
}

#[test]
fn test_v00_byte_stability() {
    let encoded = proplist::to_bytes_v00(&v00_fixture()).unwrap();
    let decoded = proplist::from_bytes(&encoded).unwrap();
    assert_eq!(proplist::to_bytes_v00(&decoded).unwrap(), encoded);
}

#[test]
fn test_v15_round_trip() {
    let value = v15_fixture();
    let encoded = proplist::to_bytes_v15(&value).unwrap();
    assert_eq!(&encoded[..8], b"bplist15");
    assert_eq!(proplist::from_bytes(&encoded), Ok(value));
}

#[test]
fn test_xml_round_trip() {
    // Everything the XML vocabulary and its convention comments can carry.
    let mut root = Dictionary::new();
    root.insert("Truth".to_string(), Value::Boolean(true));
    root.insert("Count".to_string(), Value::Integer(-12));
    root.insert(
        "Wide".to_string(),
        Value::BigInteger(i64::MAX as i128 * 3),
    );
    root.insert("Ratio".to_string(), Value::Real(OrderedFloat(0.1)));
    root.insert("Narrow".to_string(), Value::Float(OrderedFloat(0.25)));
    root.insert(
        "Stamp".to_string(),
        Value::Date(Date::from_seconds_since_reference(731_764_855.0)),
    );
    root.insert("Payload".to_string(), Value::Data(vec![1, 2, 3]));
    root.insert("Name".to_string(), Value::String("πλ < &".to_string()));
    root.insert("Archive".to_string(), Value::Uid(Uid::new(0xDEAD)));
    root.insert(
        "Machine".to_string(),
        Value::Uuid([7; 16]),
    );
    root.insert(
        "Tags".to_string(),
        Value::Set(vec![Value::Integer(1), Value::Integer(2)]),
    );
    root.insert(
        "Items".to_string(),
        Value::Array(vec![Value::String("αβ".to_string())]),
    );
    let value = Value::Dictionary(root);

    let rendered = proplist::xml::to_string(&value).unwrap();
    assert_eq!(proplist::xml::from_str(&rendered), Ok(value.clone()));
    // The sniffing front door reaches the same result.
    assert_eq!(proplist::from_bytes(rendered.as_bytes()), Ok(value));
}

#[test]
fn test_dictionary_order_preserved_across_encodings() {
    let mut dictionary = Dictionary::new();
    for index in (0..32).rev() {
        dictionary.insert(format!("key-{:02}", index), Value::Integer(index));
    }
    let value = Value::Dictionary(dictionary);
    let expected: Vec<String> = (0..32).rev().map(|i| format!("key-{:02}", i)).collect();

    for encoded in [
        proplist::to_bytes_v00(&value).unwrap(),
        proplist::to_bytes_v15(&value).unwrap(),
        proplist::xml::to_string(&value).unwrap().into_bytes(),
    ] {
        let decoded = proplist::from_bytes(&encoded).unwrap();
        let keys: Vec<String> = decoded
            .as_dictionary()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, expected);
    }
}

#[test]
fn test_cross_format_conversion() {
    // v00 → value → XML → value → v15 → value preserves the tree.
    let value = v00_fixture();
    let binary = proplist::to_bytes_v00(&value).unwrap();
    let via_binary = proplist::from_bytes(&binary).unwrap();
    let xml = proplist::xml::to_string(&via_binary).unwrap();
    let via_xml = proplist::from_bytes(xml.as_bytes()).unwrap();
    assert_eq!(via_xml, value);
    let v15 = proplist::to_bytes_v15(&via_xml).unwrap();
    assert_eq!(proplist::from_bytes(&v15), Ok(value));
}

#[test]
fn test_string_length_boundary() {
    for length in [14usize, 15, 254, 255, 256] {
        let value = Value::String("s".repeat(length));
        let encoded = proplist::to_bytes_v00(&value).unwrap();
        assert_eq!(proplist::from_bytes(&encoded), Ok(value));
    }
}

#[test]
fn test_integer_boundaries_round_trip() {
    let boundaries: Vec<i64> = vec![
        0,
        0xFF,
        0x100,
        0xFFFF,
        0x10000,
        0xFFFF_FFFF,
        0x1_0000_0000,
        i64::MAX,
        i64::MIN,
        -1,
    ];
    let value = Value::Array(boundaries.iter().map(|&n| Value::Integer(n)).collect());
    for encoded in [
        proplist::to_bytes_v00(&value).unwrap(),
        proplist::to_bytes_v15(&value).unwrap(),
    ] {
        assert_eq!(proplist::from_bytes(&encoded), Ok(value.clone()));
    }
}

#[test]
fn test_nan_round_trips() {
    let value = Value::Array(vec![
        Value::Real(OrderedFloat(f64::NAN)),
        Value::Real(OrderedFloat(f64::INFINITY)),
        Value::Real(OrderedFloat(f64::NEG_INFINITY)),
    ]);
    for encoded in [
        proplist::to_bytes_v00(&value).unwrap(),
        proplist::to_bytes_v15(&value).unwrap(),
        proplist::xml::to_string(&value).unwrap().into_bytes(),
    ] {
        assert_eq!(proplist::from_bytes(&encoded), Ok(value.clone()));
    }
}

#[test]
fn test_from_reader_spools() {
    let encoded = proplist::to_bytes_v00(&v00_fixture()).unwrap();
    let decoded = proplist::from_reader(std::io::Cursor::new(&encoded)).unwrap();
    assert_eq!(decoded, v00_fixture());
}
