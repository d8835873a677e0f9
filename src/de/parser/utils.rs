//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use nom::{bytes::complete::take, combinator::map_res, IResult};

use std::convert::TryFrom;

/// Returns a parser which recognizes a variable-length big-endian number
/// between 1 and 8 bytes long, inclusive.
///
/// # Notes
///
/// 1. A valid result will be returned for unsigned values between 1 and 8 bytes.
/// 2. A valid result will be returned for a signed value of exactly 8 bytes.
pub fn be_u64_n(n: usize) -> impl Fn(&[u8]) -> IResult<&[u8], u64> {
    assert!(n >= 1 && n <= 8, "number must be between 1 and 8 bytes, inclusive");
    move |input: &[u8]| {
        let (input, bytes) = take(n)(input)?;
        let value = bytes.iter().fold(0u64, |acc, x| (acc << 8) + *x as u64);
        Ok((input, value))
    }
}

/// Returns a parser which recognizes a variable-length unsigned big-endian number
/// between 1 and 8 bytes long, inclusive. This value is then converted safely
/// into a usize, which varies based on the pointer size of the platform.
///
/// # Notes
///
/// 1. n may be up to 8 even on platforms with smaller word sizes.
/// 2. The value is checked to confirm it is in range before it is cast to usize.
pub fn be_usize_n(n: usize) -> impl Fn(&[u8]) -> IResult<&[u8], usize> {
    move |input: &[u8]| {
        map_res(be_u64_n(n), |value| usize::try_from(value))(input)
    }
}

/// Parses a 16-byte signed big-endian number.
pub fn be_i128_16(input: &[u8]) -> IResult<&[u8], i128> {
    let (input, bytes) = take(16usize)(input)?;
    let mut buffer = [0u8; 16];
    buffer.copy_from_slice(bytes);
    Ok((input, i128::from_be_bytes(buffer)))
}

#[cfg(test)]
mod tests {
    use super::{be_i128_16, be_u64_n, be_usize_n};

    #[test]
    fn test_be_usize_n_length_1() {
        let (input, result) = be_usize_n(1)(&[0x05]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 5);
    }

    #[test]
    fn test_be_usize_n_length_3() {
        let (input, result) = be_usize_n(3)(&[0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 511);
    }

    #[test]
    fn test_be_u64_n_length_8() {
        let (input, result) =
            be_u64_n(8)(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xFF]).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, 72057594037928447);
    }

    #[test]
    fn test_be_i128_16_negative() {
        let mut bytes = [0xFFu8; 16];
        bytes[15] = 0xFE;
        let (input, result) = be_i128_16(&bytes).unwrap();
        assert_eq!(input.len(), 0);
        assert_eq!(result, -2);
    }
}
