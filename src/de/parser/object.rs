//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use ascii::{AsAsciiStrError, AsciiStr};
use nom::{
    branch::alt,
    bytes::complete::take,
    combinator::{map, map_res, verify},
    multi::many_m_n,
    number::complete::{be_f32, be_f64, be_u16, be_u32, be_u8},
    sequence::tuple,
    IResult,
};

use std::convert::TryFrom;
use std::string::FromUtf16Error;

use crate::de::parser::utils::{be_i128_16, be_usize_n};
use crate::document::ObjectFormat;

/// Returns a parser which consumes a marker conforming to the specified format.
/// On success, the parser yields both the validated format and the encoded value.
/// This allows the function to be used to verify a marker byte is of the specified
/// format and to decode the value contained therein, if any.
fn marker(format: ObjectFormat) -> impl Fn(&[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    move |input: &[u8]| {
        map(
            verify(take(1usize), move |b: &[u8]| -> bool {
                (b[0] & format.tag_mask()) == format.tag_bits()
            }),
            move |b: &[u8]| -> (ObjectFormat, u8) { (format, b[0] & format.value_mask()) },
        )(input)
    }
}

/// Parses a marker byte and returns both the object format and encoded value.
///
/// Marker bytes whose high nibble is reserved (`0111`, `1001`, `1110`,
/// `1111`), unlisted singletons under `0000`, integer widths above 16 bytes
/// and real widths other than 4 and 8 all fail here; the callers surface
/// those bytes as malformed markers.
pub fn any_marker(input: &[u8]) -> IResult<&[u8], (ObjectFormat, u8)> {
    alt((
        alt((
            marker(ObjectFormat::Null),
            marker(ObjectFormat::Boolean),
            marker(ObjectFormat::Url),
            marker(ObjectFormat::UrlWithBase),
            marker(ObjectFormat::Uuid),
            marker(ObjectFormat::Fill),
            marker(ObjectFormat::UInt8),
            marker(ObjectFormat::UInt16),
            marker(ObjectFormat::UInt32),
            marker(ObjectFormat::SInt64),
            marker(ObjectFormat::Int128),
        )),
        alt((
            marker(ObjectFormat::Float32),
            marker(ObjectFormat::Float64),
            marker(ObjectFormat::Date),
            marker(ObjectFormat::Data),
            marker(ObjectFormat::AsciiString),
            marker(ObjectFormat::Utf16String),
            marker(ObjectFormat::Uid),
            marker(ObjectFormat::Array),
            marker(ObjectFormat::OrdSet),
            marker(ObjectFormat::Set),
            marker(ObjectFormat::Dictionary),
        )),
    ))(input)
}

/// Parses a null singleton object, which is represented as a unit type.
pub fn null(input: &[u8]) -> IResult<&[u8], ()> {
    map(marker(ObjectFormat::Null), |_| ())(input)
}

/// Parses a boolean object with an encoded value bit.
pub fn boolean(input: &[u8]) -> IResult<&[u8], bool> {
    map(marker(ObjectFormat::Boolean), |(_, value)| value == 1)(input)
}

/// Parses a fill object, which is represented as a unit type.
pub fn fill(input: &[u8]) -> IResult<&[u8], ()> {
    map(marker(ObjectFormat::Fill), |_| ())(input)
}

/// Parses a UUID object and returns the sixteen raw identifier bytes.
pub fn uuid(input: &[u8]) -> IResult<&[u8], [u8; 16]> {
    let (input, _) = marker(ObjectFormat::Uuid)(input)?;
    let (input, bytes) = take(16usize)(input)?;
    let mut value = [0u8; 16];
    value.copy_from_slice(bytes);
    Ok((input, value))
}

/// Parses an 8-bit unsigned integer object.
pub fn uint8(input: &[u8]) -> IResult<&[u8], u8> {
    map(tuple((marker(ObjectFormat::UInt8), be_u8)), |(_, value)| value)(input)
}

/// Parses a 16-bit unsigned integer object.
pub fn uint16(input: &[u8]) -> IResult<&[u8], u16> {
    map(tuple((marker(ObjectFormat::UInt16), be_u16)), |(_, value)| value)(input)
}

/// Parses a 32-bit unsigned integer object.
pub fn uint32(input: &[u8]) -> IResult<&[u8], u32> {
    map(tuple((marker(ObjectFormat::UInt32), be_u32)), |(_, value)| value)(input)
}

/// Parses a 64-bit signed integer object.
pub fn sint64(input: &[u8]) -> IResult<&[u8], i64> {
    map(
        tuple((marker(ObjectFormat::SInt64), nom::number::complete::be_i64)),
        |(_, value)| value,
    )(input)
}

/// Parses a 128-bit signed integer object.
pub fn int128(input: &[u8]) -> IResult<&[u8], i128> {
    map(tuple((marker(ObjectFormat::Int128), be_i128_16)), |(_, value)| value)(input)
}

/// Parses a 32-bit single-precision floating point value.
pub fn float32(input: &[u8]) -> IResult<&[u8], f32> {
    map(tuple((marker(ObjectFormat::Float32), be_f32)), |(_, value)| value)(input)
}

/// Parses a 64-bit double-precision floating point value.
pub fn float64(input: &[u8]) -> IResult<&[u8], f64> {
    map(tuple((marker(ObjectFormat::Float64), be_f64)), |(_, value)| value)(input)
}

/// Parses a 64-bit double-precision reference-epoch date value.
pub fn date(input: &[u8]) -> IResult<&[u8], f64> {
    map(tuple((marker(ObjectFormat::Date), be_f64)), |(_, value)| value)(input)
}

/// Returns a parser for the length of an object payload.
/// The parameter is the value encoded in the marker byte to which the payload corresponds.
/// If the encoded value is:
///   0b0000_0000 ..= 0b0000_1110:
///     No additional input is consumed and the encoded value represents directly
///     the payload count value.
///   0b0000_1111:
///     An integer object with a 1, 2, 4 or 8 byte payload follows.
///     This object is consumed, interpreted as a non-negative value, and returned.
fn payload_count(encoded_value: u8) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    assert!(
        (encoded_value & 0b1111_0000) == 0,
        "encoded length must be a 4-bit value"
    );
    move |input: &[u8]| {
        if encoded_value == 0b0000_1111 {
            map_res(
                alt((
                    map(uint8, |value| value as i64),
                    map(uint16, |value| value as i64),
                    map(uint32, |value| value as i64),
                    sint64,
                )),
                |value| usize::try_from(value),
            )(input)
        } else {
            Ok((input, encoded_value as usize))
        }
    }
}

/// Parses the marker and payload count of an object of the given format
/// without consuming the payload itself.
pub fn counted(format: ObjectFormat) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        let (input, (_, encoded_value)) = marker(format)(input)?;
        payload_count(encoded_value)(input)
    }
}

/// Parses a variable-length data object and returns the corresponding slice of the input.
pub fn data(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, data_length) = counted(ObjectFormat::Data)(input)?;
    take(data_length)(input)
}

/// Parses a variable-length ASCII string object and returns a corresponding borrowed string slice.
///
/// # Notes
///
/// 1. Validates that the data contained in the object is an ASCII string.
/// 2. This is a zero-copy operation.
pub fn ascii_string(input: &[u8]) -> IResult<&[u8], &str> {
    let (input, char_count) = counted(ObjectFormat::AsciiString)(input)?;
    map_res(take(char_count), |bytes| -> Result<&str, AsAsciiStrError> {
        AsciiStr::from_ascii(bytes).map(|value| value.as_str())
    })(input)
}

/// Parses a variable-length UTF-16 string object and returns an owned string.
///
/// # Notes
///
/// 1. Validates that the data contained in the object is valid UTF-16.
/// 2. This is not a zero-copy operation.
pub fn utf16_string(input: &[u8]) -> IResult<&[u8], String> {
    let (input, char_count) = counted(ObjectFormat::Utf16String)(input)?;
    map_res(
        many_m_n(char_count, char_count, be_u16),
        |code_points| -> Result<String, FromUtf16Error> { String::from_utf16(&code_points) },
    )(input)
}

/// Parses a variable-length uid object and returns the corresponding slice of the input.
/// The payload is between 1 and 16 bytes long.
pub fn uid(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, (_, encoded_value)) = marker(ObjectFormat::Uid)(input)?;
    take(encoded_value + 1)(input)
}

/// Returns a parser for a sequence of object references of the specified width.
fn references(
    count: usize,
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    move |input: &[u8]| {
        many_m_n(count, count, be_usize_n(object_reference_size))(input)
    }
}

/// Returns a parser for an array with the specified-width object references.
///
/// The value returned by the parser is a list of value object references.
pub fn array(
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, array_length) = counted(ObjectFormat::Array)(input)?;
        references(array_length, object_reference_size)(input)
    }
}

/// Returns a parser for a set with the specified-width object references.
/// Both the set and ordered-set markers are accepted.
pub fn set(
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<usize>> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, set_length) = alt((
            counted(ObjectFormat::Set),
            counted(ObjectFormat::OrdSet),
        ))(input)?;
        references(set_length, object_reference_size)(input)
    }
}

/// Returns a parser for a dictionary with the specified-width key and value references.
///
/// The value returned by the parser is a list of matched key and value object references.
/// In each tuple, the key is first and the value is second.
pub fn dictionary(
    object_reference_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<(usize, usize)>> {
    assert!(object_reference_size <= 8, "object references must be up to 8 bytes long");
    move |input: &[u8]| {
        let (input, entry_count) = counted(ObjectFormat::Dictionary)(input)?;

        map(
            tuple((
                references(entry_count, object_reference_size),
                references(entry_count, object_reference_size),
            )),
            |(mut keys, mut values)| {
                // Interleave the key and value references
                keys.drain(..)
                    .zip(values.drain(..))
                    .collect::<Vec<(usize, usize)>>()
            },
        )(input)
    }
}

/// Folds a UID payload into its unsigned 64-bit value. Payloads longer than
/// eight bytes are accepted only when the leading bytes are zero.
pub fn uid_value(bytes: &[u8]) -> Option<u64> {
    let (leading, value_bytes) = if bytes.len() > 8 {
        bytes.split_at(bytes.len() - 8)
    } else {
        (&bytes[0..0], bytes)
    };
    if leading.iter().any(|&b| b != 0) {
        return None;
    }
    Some(value_bytes.iter().fold(0u64, |acc, x| (acc << 8) + *x as u64))
}
