use serde::Deserialize;

use proplist::Value;

#[derive(Eq, PartialEq, Deserialize, Debug)]
struct Point {
    x: u64,
    y: u64,
}

/// A hand-assembled version 00 document for {"x": 1, "y": 20}.
fn point_document() -> Vec<u8> {
    let mut document = Vec::new();
    document.extend_from_slice(b"bplist00");
    // Object bodies: the dictionary, both keys, both values.
    document.extend_from_slice(&[0xD2, 0x01, 0x02, 0x03, 0x04]); // offset 8
    document.extend_from_slice(&[0x51, 0x78]); // offset 13: "x"
    document.extend_from_slice(&[0x51, 0x79]); // offset 15: "y"
    document.extend_from_slice(&[0x10, 0x01]); // offset 17: 1
    document.extend_from_slice(&[0x10, 0x14]); // offset 19: 20
    // Offset table at 21.
    document.extend_from_slice(&[0x08, 0x0D, 0x0F, 0x11, 0x13]);
    // Trailer.
    document.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01]);
    document.extend_from_slice(&5u64.to_be_bytes());
    document.extend_from_slice(&0u64.to_be_bytes());
    document.extend_from_slice(&21u64.to_be_bytes());
    document
}

#[test]
fn test_deserialize_point() {
    let data = point_document();
    assert_eq!(
        proplist::from_slice::<Point>(&data),
        Ok(Point { x: 1, y: 20 }),
    );
}

#[test]
fn test_deserialize_point_as_value() {
    let data = point_document();
    let value = proplist::from_bytes(&data).unwrap();

    let dictionary = value.as_dictionary().unwrap();
    assert_eq!(dictionary.len(), 2);
    assert_eq!(dictionary.get("x"), Some(&Value::Integer(1)));
    assert_eq!(dictionary.get("y"), Some(&Value::Integer(20)));

    // Key order is the order the key references appear in the document.
    let keys: Vec<&str> = dictionary.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["x", "y"]);
}
