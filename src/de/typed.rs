//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Typed decoding through serde.
//!
//! The wire decoders produce a [`Value`] tree; this deserializer walks the
//! tree and drives any `serde`-compatible type from it. Dates surface as
//! their reference-epoch seconds and UIDs as their unsigned value, since
//! serde has no native representation for either.

use serde::de::value::{MapDeserializer, SeqDeserializer};
use serde::de::{self, IntoDeserializer};

use crate::error::{Error, Result};
use crate::value::Value;

/// A deserializer driven by a decoded property list value tree.
#[derive(Debug)]
pub struct Deserializer {
    value: Value,
}

impl Deserializer {
    /// Designated initializer for a property list value deserializer.
    pub fn new(value: Value) -> Self {
        Deserializer { value }
    }
}

/// Support for deserializing any supported type from a property list
/// document in any of the three encodings.
pub fn from_slice<T>(input: &[u8]) -> Result<T>
where
    T: de::DeserializeOwned,
{
    let value = crate::de::from_bytes(input)?;
    T::deserialize(Deserializer::new(value))
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Deserializer;

    fn into_deserializer(self) -> Deserializer {
        Deserializer::new(self)
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(value) => visitor.visit_bool(value),
            Value::Integer(value) => visitor.visit_i64(value),
            Value::BigInteger(value) => visitor.visit_i128(value),
            Value::Uid(value) => visitor.visit_u64(value.get()),
            Value::Float(value) => visitor.visit_f32(value.into_inner()),
            Value::Real(value) => visitor.visit_f64(value.into_inner()),
            Value::Date(value) => visitor.visit_f64(value.seconds_since_reference()),
            Value::Data(value) => visitor.visit_byte_buf(value),
            Value::String(value) => visitor.visit_string(value),
            Value::Uuid(value) => visitor.visit_bytes(&value),
            Value::Url(value) => match value.base {
                Some(base) => visitor.visit_string(format!("{}{}", base, value.relative)),
                None => visitor.visit_string(value.relative),
            },
            Value::Array(values) | Value::Set(values) => {
                visitor.visit_seq(SeqDeserializer::new(values.into_iter()))
            }
            Value::Dictionary(dictionary) => {
                visitor.visit_map(MapDeserializer::new(dictionary.into_iter()))
            }
            Value::Fill => visitor.visit_unit(),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.value.is_null() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    serde::forward_to_deserialize_any! {
        bool
        u8 u16 u32 u64 u128
        i8 i16 i32 i64 i128
        f32 f64
        char str string
        seq map
        bytes byte_buf
        enum
        struct
        unit unit_struct
        tuple tuple_struct
        newtype_struct
        ignored_any
        identifier
    }
}

#[cfg(test)]
mod tests {
    use super::Deserializer;
    use crate::value::{Dictionary, Value};
    use serde::Deserialize;

    #[test]
    fn test_value_round_trips_through_serde() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("name".to_string(), Value::String("point".to_string()));
        dictionary.insert(
            "coords".to_string(),
            Value::Array(vec![Value::Integer(1), Value::Integer(20)]),
        );
        let value = Value::Dictionary(dictionary);

        let round_tripped = Value::deserialize(Deserializer::new(value.clone())).unwrap();
        assert_eq!(round_tripped, value);
    }

    #[test]
    fn test_sequence_of_integers() {
        let value = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        let decoded: Vec<u8> = Vec::deserialize(Deserializer::new(value)).unwrap();
        assert_eq!(decoded, vec![1, 2, 3]);
    }
}
