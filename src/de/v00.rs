//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Decoder for version 00 binary property lists.
//!
//! A version 00 document is a back-referenced object graph: containers hold
//! fixed-width references, the offset table maps each reference to a byte
//! offset, and the trailer describes the table. Decoding therefore starts
//! at the end of the input, validates the trailer and every table entry,
//! and only then walks the graph from the root reference.

use ordered_float::OrderedFloat;

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use crate::de::parser;
use crate::document::{ObjectFormat, OffsetTable, HEADER_SIZE, HEADER_VERSION_00, TRAILER_SIZE};
use crate::error::{ErrorKind, Position, Result};
use crate::path::PathStack;
use crate::value::{Date, Dictionary, Uid, Value};

#[derive(Clone, Eq, PartialEq, Debug)]
struct Metadata {
    /// The table of offsets from the start of the input to the location of
    /// a given object. Every entry was range-checked during validation.
    offset_table: OffsetTable,
    /// The byte length of an object reference.
    object_reference_size: usize,
    /// The index of the root object to decode.
    root_object: usize,
}

impl Metadata {
    /// Utilizes the offset table to compute the offset of the given object.
    fn offset_of(&self, object: usize) -> Result<usize> {
        if object >= self.offset_table.len() {
            Err(ErrorKind::RefOutOfRange(object as u64).into())
        } else {
            Ok(self.offset_table[object])
        }
    }
}

/// Parses and validates the metadata necessary to interpret the document.
///
/// # Notes
///
/// The smallest possible document consists of:
///   1. A fixed-sized header.
///   2. An object table with a single one-byte entry such as an empty dictionary.
///   3. An offset table with a single one-byte entry for the root object.
///   4. A fixed-sized trailer.
fn parse_metadata(input: &[u8]) -> Result<Metadata> {
    // Parse the header and verify both the magic number and the version marker.
    let (_, header) = parser::document::header(input)
        .map_err(|_| ErrorKind::MalformedHeader)?;
    if header.version != HEADER_VERSION_00 {
        return Err(ErrorKind::MalformedHeader.into());
    }

    if input.len() < HEADER_SIZE + 2 + TRAILER_SIZE {
        return Err(ErrorKind::MalformedTrailer.into());
    }

    // Parse the trailer from the end of the input.
    let trailer_slice = &input[input.len() - TRAILER_SIZE..];
    let (_, trailer) = parser::document::trailer(trailer_slice)
        .map_err(|_| ErrorKind::MalformedTrailer)?;

    // The three 8-byte trailer fields are signed on the wire.
    if trailer.number_of_objects > i64::MAX as usize
        || trailer.root_object > i64::MAX as usize
        || trailer.offset_table_offset > i64::MAX as usize
    {
        return Err(ErrorKind::MalformedTrailer.into());
    }

    if trailer.number_of_objects == 0
        || trailer.root_object >= trailer.number_of_objects
        || trailer.offset_table_entry_size == 0
        || trailer.object_reference_size == 0
    {
        return Err(ErrorKind::MalformedTrailer.into());
    }

    // Each reference must be wide enough to address every object, and each
    // offset table entry wide enough to address the whole object region.
    if trailer.object_reference_size < 8
        && (1u64 << (8 * trailer.object_reference_size)) <= trailer.number_of_objects as u64
    {
        return Err(ErrorKind::MalformedTrailer.into());
    }
    if trailer.offset_table_entry_size < 8
        && (1u64 << (8 * trailer.offset_table_entry_size))
            <= trailer.offset_table_offset as u64
    {
        return Err(ErrorKind::MalformedTrailer.into());
    }

    // The object region occupies [HEADER_SIZE, offset_table_offset) and must
    // hold at least one marker byte; the offset table and trailer account
    // for every remaining byte of the document.
    if trailer.offset_table_offset <= HEADER_SIZE {
        return Err(ErrorKind::MalformedTrailer.into());
    }
    let offset_table_length = trailer
        .number_of_objects
        .checked_mul(trailer.offset_table_entry_size)
        .ok_or(ErrorKind::MalformedTrailer)?;
    let expected_length = trailer
        .offset_table_offset
        .checked_add(offset_table_length)
        .and_then(|n| n.checked_add(TRAILER_SIZE))
        .ok_or(ErrorKind::MalformedTrailer)?;
    if expected_length != input.len() {
        return Err(ErrorKind::MalformedTrailer.into());
    }

    // Parse the offset table.
    let offset_table_slice =
        &input[trailer.offset_table_offset..trailer.offset_table_offset + offset_table_length];
    let (_, offset_table) = parser::document::offset_table(
        trailer.number_of_objects,
        trailer.offset_table_entry_size,
    )(offset_table_slice)
    .map_err(|_| ErrorKind::MalformedTrailer)?;

    // Walk the table once; every entry must point into the object region.
    let object_table_range: Range<usize> = HEADER_SIZE..trailer.offset_table_offset;
    for &offset in &offset_table {
        if !object_table_range.contains(&offset) {
            return Err(ErrorKind::OffsetOutOfRange(offset as u64).into());
        }
    }

    Ok(Metadata {
        offset_table,
        object_reference_size: trailer.object_reference_size,
        root_object: trailer.root_object,
    })
}

/// Decodes a complete version 00 document into a value tree.
pub(crate) fn decode(input: &[u8]) -> Result<Value> {
    let metadata = parse_metadata(input)?;
    tracing::debug!(
        objects = metadata.offset_table.len(),
        reference_size = metadata.object_reference_size,
        "decoding version 00 property list"
    );

    let root_object = metadata.root_object;
    let mut decoder = Decoder {
        input,
        metadata,
        cache: HashMap::new(),
        descent: BTreeSet::new(),
        path: PathStack::new(PathStack::ROOT_V00),
    };
    decoder.read_object(root_object)
}

struct Decoder<'de> {
    /// The bytes which represent the totality of the input document.
    input: &'de [u8],
    metadata: Metadata,
    /// Offset to decoded value for every scalar already read. Containers
    /// are never cached; shared scalar substructure is cloned on read.
    cache: HashMap<usize, Value>,
    /// Offsets of the containers on the current descent, to detect cycles.
    descent: BTreeSet<usize>,
    path: PathStack,
}

impl<'de> Decoder<'de> {
    fn read_object(&mut self, object: usize) -> Result<Value> {
        let result = self.read_object_inner(object);
        result.map_err(|error| error.or_path(|| self.path.render()))
    }

    fn read_object_inner(&mut self, object: usize) -> Result<Value> {
        let offset = self.metadata.offset_of(object)?;
        if let Some(value) = self.cache.get(&offset) {
            return Ok(value.clone());
        }
        self.read_object_at(offset)
            .map_err(|error| error.or_position(Position::Offset(offset as u64)))
    }

    fn read_object_at(&mut self, offset: usize) -> Result<Value> {
        let input = self.input;
        let data = &input[offset..];
        let marker_byte = data[0];
        let (_, (format, _)) = parser::object::any_marker(data)
            .map_err(|_| ErrorKind::MalformedMarker(marker_byte))?;

        let malformed = |_| ErrorKind::MalformedMarker(marker_byte);

        let value = match format {
            ObjectFormat::Boolean => {
                let (_, value) = parser::object::boolean(data).map_err(malformed)?;
                Value::Boolean(value)
            }
            ObjectFormat::Fill => Value::Fill,
            ObjectFormat::UInt8 => {
                let (_, value) = parser::object::uint8(data).map_err(malformed)?;
                Value::Integer(value as i64)
            }
            ObjectFormat::UInt16 => {
                let (_, value) = parser::object::uint16(data).map_err(malformed)?;
                Value::Integer(value as i64)
            }
            ObjectFormat::UInt32 => {
                let (_, value) = parser::object::uint32(data).map_err(malformed)?;
                Value::Integer(value as i64)
            }
            ObjectFormat::SInt64 => {
                let (_, value) = parser::object::sint64(data).map_err(malformed)?;
                Value::Integer(value)
            }
            ObjectFormat::Int128 => {
                let (_, value) = parser::object::int128(data).map_err(malformed)?;
                Value::BigInteger(value)
            }
            ObjectFormat::Float32 => {
                let (_, value) = parser::object::float32(data).map_err(malformed)?;
                Value::Float(OrderedFloat(value))
            }
            ObjectFormat::Float64 => {
                let (_, value) = parser::object::float64(data).map_err(malformed)?;
                Value::Real(OrderedFloat(value))
            }
            ObjectFormat::Date => {
                let (_, value) = parser::object::date(data).map_err(malformed)?;
                Value::Date(Date::from_seconds_since_reference(value))
            }
            ObjectFormat::Data => {
                let (_, value) = parser::object::data(data).map_err(malformed)?;
                Value::Data(value.to_vec())
            }
            ObjectFormat::AsciiString => {
                let (_, value) = parser::object::ascii_string(data).map_err(malformed)?;
                Value::String(value.to_string())
            }
            ObjectFormat::Utf16String => {
                let (_, value) = parser::object::utf16_string(data).map_err(malformed)?;
                Value::String(value)
            }
            ObjectFormat::Uid => {
                let (_, bytes) = parser::object::uid(data).map_err(malformed)?;
                let value = parser::object::uid_value(bytes).ok_or(ErrorKind::Overflow)?;
                Value::Uid(Uid::new(value))
            }

            // The remaining singletons only exist in version 15 documents.
            ObjectFormat::Null
            | ObjectFormat::Url
            | ObjectFormat::UrlWithBase
            | ObjectFormat::Uuid => {
                return Err(ErrorKind::TypeMismatch {
                    expected: "a version 00 object",
                    found: format.name(),
                }
                .into());
            }

            ObjectFormat::Array => return self.read_array(offset, data),
            ObjectFormat::OrdSet | ObjectFormat::Set => return self.read_set(offset, data),
            ObjectFormat::Dictionary => return self.read_dictionary(offset, data),
        };

        self.cache.insert(offset, value.clone());
        Ok(value)
    }

    fn read_array(&mut self, offset: usize, data: &[u8]) -> Result<Value> {
        let references = parser::object::array(self.metadata.object_reference_size)(data)
            .map(|(_, references)| references)
            .map_err(|_| ErrorKind::MalformedMarker(data[0]))?;

        self.enter(offset)?;
        let mut items = Vec::with_capacity(references.len());
        for (index, &reference) in references.iter().enumerate() {
            self.path.push_index("array", index);
            let item = self.read_object(reference);
            self.path.pop();
            items.push(item?);
        }
        self.exit(offset);
        Ok(Value::Array(items))
    }

    fn read_set(&mut self, offset: usize, data: &[u8]) -> Result<Value> {
        let references = parser::object::set(self.metadata.object_reference_size)(data)
            .map(|(_, references)| references)
            .map_err(|_| ErrorKind::MalformedMarker(data[0]))?;

        // A set may not reference the same byte offset twice.
        let mut member_offsets = BTreeSet::new();
        for &reference in &references {
            if !member_offsets.insert(self.metadata.offset_of(reference)?) {
                return Err(ErrorKind::CycleDetected.into());
            }
        }

        self.enter(offset)?;
        let mut members = Vec::with_capacity(references.len());
        for (index, &reference) in references.iter().enumerate() {
            self.path.push_index("set", index);
            let member = self.read_object(reference);
            self.path.pop();
            members.push(member?);
        }
        self.exit(offset);
        Ok(Value::Set(members))
    }

    fn read_dictionary(&mut self, offset: usize, data: &[u8]) -> Result<Value> {
        let pairs = parser::object::dictionary(self.metadata.object_reference_size)(data)
            .map(|(_, pairs)| pairs)
            .map_err(|_| ErrorKind::MalformedMarker(data[0]))?;

        self.enter(offset)?;
        let mut dictionary = Dictionary::new();
        for (index, &(key_reference, value_reference)) in pairs.iter().enumerate() {
            self.path.push_index("dict", index);
            let key_value = self.read_object(key_reference);
            self.path.pop();

            let key = match key_value? {
                Value::String(key) => key,
                other => {
                    return Err(ErrorKind::TypeMismatch {
                        expected: "a string dictionary key",
                        found: other.kind_name(),
                    }
                    .into());
                }
            };
            if dictionary.contains_key(&key) {
                return Err(ErrorKind::TypeMismatch {
                    expected: "a unique dictionary key",
                    found: "a duplicate",
                }
                .into());
            }

            self.path.push_key(&key);
            let value = self.read_object(value_reference);
            self.path.pop();
            dictionary.insert(key, value?);
        }
        self.exit(offset);
        Ok(Value::Dictionary(dictionary))
    }

    /// Tracks entering a container to detect reference cycles. Shared
    /// substructure decodes normally; only a reference back to a container
    /// still on the descent is rejected.
    fn enter(&mut self, offset: usize) -> Result<()> {
        if !self.descent.insert(offset) {
            return Err(ErrorKind::CycleDetected.into());
        }
        Ok(())
    }

    fn exit(&mut self, offset: usize) {
        let removed = self.descent.remove(&offset);
        debug_assert!(removed, "unbalanced container descent tracking");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn decode_err(input: &[u8]) -> Error {
        decode(input).unwrap_err()
    }

    #[test]
    fn test_empty_dictionary() {
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30, // header
            0xD0, // empty dictionary
            0x08, // offset table
            0x00, 0x00, 0x00, 0x00, 0x00, // trailer
            0x00, // sort version
            0x01, // offset size
            0x01, // reference size
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // one object
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // root
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09, // table offset
        ];
        assert_eq!(document.len(), 42);
        assert_eq!(decode(document), Ok(Value::Dictionary(Dictionary::new())));
    }

    #[test]
    fn test_version_15_header_is_not_version_00() {
        let mut document = vec![0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x31, 0x35];
        document.resize(42, 0);
        assert_eq!(decode_err(&document).kind(), &ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_reference_width_too_narrow_for_object_count() {
        // numObjects = 256 with one-byte references cannot address every object.
        let mut document = vec![0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30];
        document.push(0xD0);
        document.push(0x08);
        document.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        document.push(0x01); // offset size
        document.push(0x01); // reference size
        document.extend_from_slice(&256u64.to_be_bytes());
        document.extend_from_slice(&0u64.to_be_bytes());
        document.extend_from_slice(&9u64.to_be_bytes());
        assert_eq!(decode_err(&document).kind(), &ErrorKind::MalformedTrailer);
    }

    #[test]
    fn test_offset_entry_outside_object_region() {
        // The lone offset table entry points at the offset table itself.
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0xD0,
            0x09,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode_err(document).kind(),
            &ErrorKind::OffsetOutOfRange(9),
        );
    }

    #[test]
    fn test_file_length_mismatch() {
        // One trailing byte of padding between offset table and trailer.
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0xD0,
            0x08,
            0xAA, // padding not accounted for by the trailer
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09,
        ];
        assert_eq!(decode_err(document).kind(), &ErrorKind::MalformedTrailer);
    }

    #[test]
    fn test_set_cycle_is_rejected() {
        // A single set whose only member is the set itself.
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0xC1, 0x00, // set of one member: reference 0 (itself)
            0x08,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A,
        ];
        let error = decode_err(document);
        assert_eq!(error.kind(), &ErrorKind::CycleDetected);
        assert_eq!(error.path(), Some("/plist[0.0]/set[0]"));
    }

    #[test]
    fn test_null_rejected_in_version_00() {
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0x00, // null singleton
            0x08,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode_err(document).kind(),
            &ErrorKind::TypeMismatch {
                expected: "a version 00 object",
                found: "null",
            },
        );
    }

    #[test]
    fn test_reference_beyond_object_count() {
        // An array whose single reference names a nonexistent object.
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0xA1, 0x05, // array of one member: object 5
            0x08,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A,
        ];
        let error = decode_err(document);
        assert_eq!(error.kind(), &ErrorKind::RefOutOfRange(5));
        assert_eq!(error.path(), Some("/plist[0.0]/array[0]"));
    }

    #[test]
    fn test_shared_scalar_substructure() {
        // Two array slots referencing the same string object.
        let document = &[
            0x62, 0x70, 0x6C, 0x69, 0x73, 0x74, 0x30, 0x30,
            0xA2, 0x01, 0x01, // array of two references to object 1
            0x51, 0x78, // "x"
            0x08, 0x0B,
            0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
            0x01,
            0x01,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0D,
        ];
        assert_eq!(
            decode(document),
            Ok(Value::Array(vec![
                Value::String("x".to_string()),
                Value::String("x".to_string()),
            ])),
        );
    }
}
