//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

pub(crate) mod parser;
mod typed;
mod v00;
mod v15;

pub use typed::{from_slice, Deserializer};

use std::io::Read;

use crate::document::{HEADER_MAGIC_NUMBER, HEADER_VERSION_00, HEADER_VERSION_15};
use crate::error::{ErrorKind, Result};
use crate::value::Value;

/// Decodes a property list in any supported encoding into a value tree.
///
/// The encoding is sniffed from the leading bytes: the `bplist` magic
/// selects a binary dialect by its version marker, anything opening an XML
/// document goes to the XML decoder, and everything else is rejected.
pub fn from_bytes(input: &[u8]) -> Result<Value> {
    if input.starts_with(HEADER_MAGIC_NUMBER) {
        return match (input.get(6).copied(), input.get(7).copied()) {
            (Some(major), Some(minor)) if (major, minor) == HEADER_VERSION_00 => {
                v00::decode(input)
            }
            (Some(major), Some(minor)) if (major, minor) == HEADER_VERSION_15 => {
                v15::decode(input)
            }
            _ => Err(ErrorKind::MalformedHeader.into()),
        };
    }
    if looks_like_xml(input) {
        return crate::xml::from_bytes(input);
    }
    Err(ErrorKind::MalformedHeader.into())
}

/// Decodes a property list from a reader.
///
/// The binary decoders are fundamentally random access, so the stream is
/// spooled into memory before decoding.
pub fn from_reader<R: Read>(mut reader: R) -> Result<Value> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    from_bytes(&buffer)
}

fn looks_like_xml(input: &[u8]) -> bool {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    input
        .iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .map_or(false, |&byte| byte == b'<')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_binary_version_rejected() {
        let mut document = Vec::from(&b"bplist99"[..]);
        document.resize(42, 0);
        assert_eq!(
            from_bytes(&document).unwrap_err().kind(),
            &ErrorKind::MalformedHeader,
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(
            from_bytes(b"not a property list").unwrap_err().kind(),
            &ErrorKind::MalformedHeader,
        );
    }

    #[test]
    fn test_xml_sniffing_allows_leading_whitespace() {
        assert!(looks_like_xml(b"\n\t <?xml version=\"1.0\"?>"));
        assert!(looks_like_xml(b"\xEF\xBB\xBF<plist/>"));
        assert!(!looks_like_xml(b"bplist00"));
    }
}
