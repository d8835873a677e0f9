//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{
    bytes::complete::{tag, take},
    combinator::map,
    multi::many_m_n,
    number::complete::{be_u32, be_u64, be_u8},
    sequence::tuple,
    IResult,
};

use crate::de::parser::utils::be_usize_n;
use crate::document::{
    Header, OffsetTable, Trailer, HEADER_MAGIC_NUMBER, TRAILER_PREAMBLE_UNUSED_SIZE,
    V15_CRC_MARKER, V15_LENGTH_MARKER,
};

/// Parses a fixed-sized 8-byte header object from the input slice.
pub fn header(input: &[u8]) -> IResult<&[u8], Header> {
    map(
        tuple((tag(HEADER_MAGIC_NUMBER), be_u8, be_u8)),
        |(_, version_major, version_minor)| Header {
            version: (version_major, version_minor),
        },
    )(input)
}

/// Parses the two integer objects which follow a version 15 header: the
/// total byte length of the document and its CRC. Both are fixed-width.
pub fn v15_prelude(input: &[u8]) -> IResult<&[u8], (u64, u32)> {
    map(
        tuple((
            tag(&[V15_LENGTH_MARKER][..]),
            be_u64,
            tag(&[V15_CRC_MARKER][..]),
            be_u32,
        )),
        |(_, total_length, _, crc)| (total_length, crc),
    )(input)
}

/// Returns a parser for an offset table with the specified number of entries,
/// each of the specified size. Offset table entries must be between
/// 1 and 8 bytes long each, inclusive.
pub fn offset_table(
    entries: usize,
    entry_size: usize,
) -> impl Fn(&[u8]) -> IResult<&[u8], OffsetTable> {
    move |input: &[u8]| many_m_n(entries, entries, be_usize_n(entry_size))(input)
}

/// Parses a fixed-sized 32-byte trailer object from the input array.
pub fn trailer(input: &[u8]) -> IResult<&[u8], Trailer> {
    map(
        tuple((
            take(TRAILER_PREAMBLE_UNUSED_SIZE),
            be_u8,
            be_usize_n(1),
            be_usize_n(1),
            be_usize_n(8),
            be_usize_n(8),
            be_usize_n(8),
        )),
        |(
            _,
            sort_version,
            offset_table_entry_size,
            object_reference_size,
            number_of_objects,
            root_object,
            offset_table_offset,
        )| Trailer {
            sort_version,
            offset_table_entry_size,
            object_reference_size,
            number_of_objects,
            root_object,
            offset_table_offset,
        },
    )(input)
}
