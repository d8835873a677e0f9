//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Decoder for version 15 binary property lists.
//!
//! Version 15 documents have no offset table: the header is followed by a
//! self-describing total-length object, a CRC object (read and ignored),
//! and the root object with every child encoded inline. Decoding is a
//! single forward pass.

use nom::branch::alt;
use ordered_float::OrderedFloat;

use crate::de::parser;
use crate::document::{ObjectFormat, HEADER_VERSION_15, V15_MINIMUM_SIZE};
use crate::error::{ErrorKind, Position, Result};
use crate::path::PathStack;
use crate::value::{Date, Dictionary, Url, Value};

/// Decodes a complete version 15 document into a value tree.
pub(crate) fn decode(input: &[u8]) -> Result<Value> {
    if input.len() < V15_MINIMUM_SIZE {
        return Err(ErrorKind::MalformedHeader.into());
    }

    let (rest, header) =
        parser::document::header(input).map_err(|_| ErrorKind::MalformedHeader)?;
    if header.version != HEADER_VERSION_15 {
        return Err(ErrorKind::MalformedHeader.into());
    }

    let (rest, (total_length, crc)) =
        parser::document::v15_prelude(rest).map_err(|_| ErrorKind::MalformedHeader)?;
    if total_length != input.len() as u64 {
        return Err(ErrorKind::MalformedHeader.into());
    }
    tracing::debug!(total_length, crc, "decoding version 15 property list");

    let mut decoder = Decoder {
        full: input,
        path: PathStack::new(PathStack::ROOT_V15),
    };
    let (_, value) = decoder.read_object(rest)?;
    Ok(value)
}

struct Decoder<'de> {
    /// The bytes which represent the totality of the input document.
    full: &'de [u8],
    path: PathStack,
}

impl<'de> Decoder<'de> {
    fn offset_of(&self, input: &[u8]) -> u64 {
        (self.full.len() - input.len()) as u64
    }

    fn read_object(&mut self, input: &'de [u8]) -> Result<(&'de [u8], Value)> {
        let offset = self.offset_of(input);
        let result = self.read_object_inner(input);
        result.map_err(|error| {
            error
                .or_position(Position::Offset(offset))
                .or_path(|| self.path.render())
        })
    }

    fn read_object_inner(&mut self, input: &'de [u8]) -> Result<(&'de [u8], Value)> {
        let marker_byte = *input.first().ok_or(ErrorKind::MalformedHeader)?;
        let (_, (format, _)) = parser::object::any_marker(input)
            .map_err(|_| ErrorKind::MalformedMarker(marker_byte))?;

        let malformed = |_| ErrorKind::MalformedMarker(marker_byte);

        let (rest, value) = match format {
            ObjectFormat::Null => {
                let (rest, ()) = parser::object::null(input).map_err(malformed)?;
                (rest, Value::Null)
            }
            ObjectFormat::Boolean => {
                let (rest, value) = parser::object::boolean(input).map_err(malformed)?;
                (rest, Value::Boolean(value))
            }
            ObjectFormat::Fill => {
                let (rest, ()) = parser::object::fill(input).map_err(malformed)?;
                (rest, Value::Fill)
            }
            ObjectFormat::Uuid => {
                let (rest, value) = parser::object::uuid(input).map_err(malformed)?;
                (rest, Value::Uuid(value))
            }
            ObjectFormat::Url => {
                // A URL singleton is followed by one inline string object.
                let (rest, relative) = self.read_string_object(&input[1..])?;
                (rest, Value::Url(Url { base: None, relative }))
            }
            ObjectFormat::UrlWithBase => {
                // A based URL singleton is followed by the base string
                // object and then the relative string object.
                let (rest, base) = self.read_string_object(&input[1..])?;
                let (rest, relative) = self.read_string_object(rest)?;
                (
                    rest,
                    Value::Url(Url {
                        base: Some(base),
                        relative,
                    }),
                )
            }
            ObjectFormat::UInt8 => {
                let (rest, value) = parser::object::uint8(input).map_err(malformed)?;
                (rest, Value::Integer(value as i64))
            }
            ObjectFormat::UInt16 => {
                let (rest, value) = parser::object::uint16(input).map_err(malformed)?;
                (rest, Value::Integer(value as i64))
            }
            ObjectFormat::UInt32 => {
                let (rest, value) = parser::object::uint32(input).map_err(malformed)?;
                (rest, Value::Integer(value as i64))
            }
            ObjectFormat::SInt64 => {
                let (rest, value) = parser::object::sint64(input).map_err(malformed)?;
                (rest, Value::Integer(value))
            }
            ObjectFormat::Int128 => {
                let (rest, value) = parser::object::int128(input).map_err(malformed)?;
                (rest, Value::BigInteger(value))
            }
            ObjectFormat::Float32 => {
                let (rest, value) = parser::object::float32(input).map_err(malformed)?;
                (rest, Value::Float(OrderedFloat(value)))
            }
            ObjectFormat::Float64 => {
                let (rest, value) = parser::object::float64(input).map_err(malformed)?;
                (rest, Value::Real(OrderedFloat(value)))
            }
            ObjectFormat::Date => {
                let (rest, value) = parser::object::date(input).map_err(malformed)?;
                (rest, Value::Date(Date::from_seconds_since_reference(value)))
            }
            ObjectFormat::Data => {
                let (rest, value) = parser::object::data(input).map_err(malformed)?;
                (rest, Value::Data(value.to_vec()))
            }
            ObjectFormat::AsciiString => {
                let (rest, value) = parser::object::ascii_string(input).map_err(malformed)?;
                (rest, Value::String(value.to_string()))
            }
            ObjectFormat::Utf16String => {
                let (rest, value) = parser::object::utf16_string(input).map_err(malformed)?;
                (rest, Value::String(value))
            }

            ObjectFormat::Uid => {
                return Err(ErrorKind::TypeMismatch {
                    expected: "a version 15 object",
                    found: "UID",
                }
                .into());
            }

            ObjectFormat::Array => return self.read_array(input),
            ObjectFormat::OrdSet | ObjectFormat::Set => return self.read_set(input),
            ObjectFormat::Dictionary => return self.read_dictionary(input),
        };

        Ok((rest, value))
    }

    fn read_string_object(&self, input: &'de [u8]) -> Result<(&'de [u8], String)> {
        if let Ok((rest, value)) = parser::object::ascii_string(input) {
            return Ok((rest, value.to_string()));
        }
        if let Ok((rest, value)) = parser::object::utf16_string(input) {
            return Ok((rest, value));
        }
        let found = parser::object::any_marker(input)
            .map(|(_, (format, _))| format.name())
            .unwrap_or("an unrecognised marker");
        Err(ErrorKind::TypeMismatch {
            expected: "a string",
            found,
        }
        .into())
    }

    /// An inline container cannot hold more members than there are bytes
    /// left in the document.
    fn check_count(&self, count: usize, input: &[u8]) -> Result<()> {
        if count > input.len() {
            return Err(ErrorKind::Overflow.into());
        }
        Ok(())
    }

    fn read_array(&mut self, input: &'de [u8]) -> Result<(&'de [u8], Value)> {
        let (mut rest, count) = parser::object::counted(ObjectFormat::Array)(input)
            .map_err(|_| ErrorKind::MalformedMarker(input[0]))?;
        self.check_count(count, rest)?;

        let mut items = Vec::with_capacity(count);
        for index in 0..count {
            self.path.push_index("array", index);
            let item = self.read_object(rest);
            self.path.pop();
            let (next, item) = item?;
            rest = next;
            items.push(item);
        }
        Ok((rest, Value::Array(items)))
    }

    fn read_set(&mut self, input: &'de [u8]) -> Result<(&'de [u8], Value)> {
        let (mut rest, count) = alt((
            parser::object::counted(ObjectFormat::Set),
            parser::object::counted(ObjectFormat::OrdSet),
        ))(input)
        .map_err(|_| ErrorKind::MalformedMarker(input[0]))?;
        self.check_count(count, rest)?;

        let mut members: Vec<Value> = Vec::with_capacity(count);
        for index in 0..count {
            self.path.push_index("set", index);
            let member = self.read_object(rest);
            self.path.pop();
            let (next, member) = member?;
            rest = next;
            if members.contains(&member) {
                return Err(ErrorKind::TypeMismatch {
                    expected: "distinct set members",
                    found: "a duplicate",
                }
                .into());
            }
            members.push(member);
        }
        Ok((rest, Value::Set(members)))
    }

    fn read_dictionary(&mut self, input: &'de [u8]) -> Result<(&'de [u8], Value)> {
        let (mut rest, count) = parser::object::counted(ObjectFormat::Dictionary)(input)
            .map_err(|_| ErrorKind::MalformedMarker(input[0]))?;
        self.check_count(count.saturating_mul(2), rest)?;

        // All keys are encoded before all values, mirroring the reference
        // order of the version 00 form.
        let mut keys = Vec::with_capacity(count);
        for index in 0..count {
            self.path.push_index("dict", index);
            let key = self.read_object(rest);
            self.path.pop();
            let (next, key) = key?;
            rest = next;
            match key {
                Value::String(key) => keys.push(key),
                other => {
                    return Err(ErrorKind::TypeMismatch {
                        expected: "a string dictionary key",
                        found: other.kind_name(),
                    }
                    .into());
                }
            }
        }

        let mut dictionary = Dictionary::new();
        for key in keys {
            if dictionary.contains_key(&key) {
                return Err(ErrorKind::TypeMismatch {
                    expected: "a unique dictionary key",
                    found: "a duplicate",
                }
                .into());
            }
            self.path.push_key(&key);
            let value = self.read_object(rest);
            self.path.pop();
            let (next, value) = value?;
            rest = next;
            dictionary.insert(key, value);
        }
        Ok((rest, Value::Dictionary(dictionary)))
    }
}
