//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Encoder for version 15 binary property lists.
//!
//! A single forward pass: header, a placeholder total-length object, a
//! zero CRC object, then the root value emitted inline. The total length
//! is backpatched once emission finishes. There is no offset table, no
//! trailer, no uniquing and no references.

use crate::document::{
    HEADER_MAGIC_NUMBER, HEADER_VERSION_15, V15_CRC_MARKER, V15_LENGTH_MARKER,
};
use crate::error::{Error, ErrorKind, Result};
use crate::path::PathStack;
use crate::ser;
use crate::value::Value;

/// The byte range of the backpatched total-length field.
const LENGTH_FIELD: std::ops::Range<usize> = 9..17;

/// Encodes a value tree as a version 15 document.
pub(crate) fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(HEADER_MAGIC_NUMBER);
    out.push(HEADER_VERSION_15.0);
    out.push(HEADER_VERSION_15.1);
    out.push(V15_LENGTH_MARKER);
    out.extend_from_slice(&[0u8; 8]);
    out.push(V15_CRC_MARKER);
    out.extend_from_slice(&[0u8; 4]); // CRC placeholder, never computed

    let mut path = PathStack::new(PathStack::ROOT_V15);
    emit_value(&mut out, value, &mut path)?;

    let total_length = out.len() as u64;
    out[LENGTH_FIELD].copy_from_slice(&total_length.to_be_bytes());

    tracing::debug!(bytes = total_length, "encoded version 15 property list");
    Ok(out)
}

fn emit_value(out: &mut Vec<u8>, value: &Value, path: &mut PathStack) -> Result<()> {
    if ser::try_push_scalar(out, value) {
        return Ok(());
    }
    match value {
        Value::Null => out.push(0x00),
        Value::Uuid(bytes) => {
            out.push(0x0E);
            out.extend_from_slice(bytes);
        }
        Value::Url(url) => match &url.base {
            None => {
                out.push(0x0C);
                ser::push_string(out, &url.relative);
            }
            Some(base) => {
                out.push(0x0D);
                ser::push_string(out, base);
                ser::push_string(out, &url.relative);
            }
        },

        Value::Array(items) => {
            ser::push_sized_marker(out, 0xA0, items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index("array", index);
                let result = emit_value(out, item, path);
                path.pop();
                result?;
            }
        }
        Value::Set(members) => {
            ser::push_sized_marker(out, 0xC0, members.len());
            for (index, member) in members.iter().enumerate() {
                path.push_index("set", index);
                let result = emit_value(out, member, path);
                path.pop();
                result?;
            }
        }
        Value::Dictionary(dictionary) => {
            // Keys are emitted before values, mirroring the reference
            // order of the version 00 form.
            ser::push_sized_marker(out, 0xD0, dictionary.len());
            for (key, _) in dictionary.iter() {
                ser::push_string(out, key);
            }
            for (key, item) in dictionary.iter() {
                path.push_key(key);
                let result = emit_value(out, item, path);
                path.pop();
                result?;
            }
        }

        Value::Uid(_) => {
            return Err(Error::from(ErrorKind::EncodingRejected {
                kind: "UID",
                format: "a version 15 property list",
            })
            .or_path(|| path.render()));
        }

        _ => unreachable!("scalar kinds are emitted above"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Uid, Url};

    #[test]
    fn test_backpatched_length() {
        let encoded = encode(&Value::Null).unwrap();
        assert_eq!(encoded.len(), 23);
        assert_eq!(&encoded[..8], b"bplist15");
        assert_eq!(encoded[8], 0x13);
        assert_eq!(&encoded[9..17], &23u64.to_be_bytes());
        assert_eq!(encoded[17], 0x12);
        assert_eq!(&encoded[18..22], &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(encoded[22], 0x00);
    }

    #[test]
    fn test_uid_rejected() {
        let value = Value::Array(vec![Value::Uid(Uid::new(1))]);
        let error = encode(&value).unwrap_err();
        assert_eq!(
            error.kind(),
            &ErrorKind::EncodingRejected {
                kind: "UID",
                format: "a version 15 property list",
            },
        );
        assert_eq!(error.path(), Some("/plist[1.5]/array[0]"));
    }

    #[test]
    fn test_url_forms() {
        let plain = encode(&Value::Url(Url {
            base: None,
            relative: "a".to_string(),
        }))
        .unwrap();
        assert_eq!(&plain[22..], &[0x0C, 0x51, 0x61]);

        let based = encode(&Value::Url(Url {
            base: Some("b".to_string()),
            relative: "a".to_string(),
        }))
        .unwrap();
        assert_eq!(&based[22..], &[0x0D, 0x51, 0x62, 0x51, 0x61]);
    }

    #[test]
    fn test_set_emitted_inline() {
        let encoded = encode(&Value::Set(vec![Value::Integer(7)])).unwrap();
        assert_eq!(&encoded[22..], &[0xC1, 0x10, 0x07]);
    }
}
