//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Encoder for version 00 binary property lists.
//!
//! Emission happens in two passes. A depth-first flattening pass assigns
//! every object its index in the object list, uniquing scalars by value as
//! it goes; the emission pass then writes each body while recording its
//! offset, so container references and the offset table can be written at
//! their final widths.

use indexmap::IndexMap;

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::codec;
use crate::document::{HEADER_MAGIC_NUMBER, HEADER_VERSION_00, TRAILER_PREAMBLE_UNUSED_SIZE};
use crate::error::{Error, ErrorKind, Result};
use crate::path::PathStack;
use crate::ser;
use crate::value::Value;

/// Encodes a value tree as a version 00 document.
pub(crate) fn encode(value: &Value) -> Result<Vec<u8>> {
    let mut path = PathStack::new(PathStack::ROOT_V00);
    let mut flattener = Flattener::new();
    flattener.flatten_value(value, &mut path)?;

    let number_of_objects = flattener.entries.len() as u64;
    let reference_size = codec::width_of_count(number_of_objects);

    let mut out = Vec::new();
    out.extend_from_slice(HEADER_MAGIC_NUMBER);
    out.push(HEADER_VERSION_00.0);
    out.push(HEADER_VERSION_00.1);

    // Write each object body, recording its offset as it begins.
    let mut offsets = Vec::with_capacity(flattener.entries.len());
    for entry in &flattener.entries {
        offsets.push(out.len() as u64);
        match *entry {
            FlatEntry::Key(key) => ser::push_string(&mut out, key),
            FlatEntry::Value(value) => emit_body(&mut out, value, &flattener, reference_size),
        }
    }

    // Write the offset table.
    let offset_table_offset = out.len() as u64;
    let offset_size = codec::width_of_count(offset_table_offset);
    for &offset in &offsets {
        codec::push_be(&mut out, offset, offset_size);
    }

    // Write the trailer. The root is the first flattened object.
    out.extend_from_slice(&[0; TRAILER_PREAMBLE_UNUSED_SIZE]);
    out.push(0); // sort version
    out.push(offset_size as u8);
    out.push(reference_size as u8);
    out.extend_from_slice(&number_of_objects.to_be_bytes());
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&offset_table_offset.to_be_bytes());

    tracing::debug!(
        objects = number_of_objects,
        bytes = out.len(),
        "encoded version 00 property list"
    );
    Ok(out)
}

/// One entry of the flattened object list. Dictionary keys are not values
/// in the tree, so they get their own entry kind; on the wire they are
/// ordinary string objects.
#[derive(Copy, Clone)]
enum FlatEntry<'a> {
    Value(&'a Value),
    Key(&'a str),
}

/// The uniquing key of a scalar. Reals and dates key on their bit pattern
/// so every NaN collapses to one object.
#[derive(PartialEq, Eq, Hash)]
enum ScalarKey<'a> {
    Integer(i64),
    BigInteger(i128),
    Uid(u64),
    Float(u32),
    Real(u64),
    Date(u64),
    String(&'a str),
    Data(LengthHashedData<'a>),
}

/// Data entries hash by length only; equality on the byte contents is
/// authoritative.
#[derive(PartialEq, Eq)]
struct LengthHashedData<'a>(&'a [u8]);

impl<'a> Hash for LengthHashedData<'a> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
    }
}

impl<'a> ScalarKey<'a> {
    /// The uniquing key for `value`, or `None` for the kinds that are
    /// never uniqued (containers, booleans and fill).
    fn of(value: &'a Value) -> Option<ScalarKey<'a>> {
        match value {
            Value::Integer(value) => Some(ScalarKey::Integer(*value)),
            Value::BigInteger(value) => Some(ScalarKey::BigInteger(*value)),
            Value::Uid(value) => Some(ScalarKey::Uid(value.get())),
            Value::Float(value) => Some(ScalarKey::Float(value.into_inner().to_bits())),
            Value::Real(value) => Some(ScalarKey::Real(value.into_inner().to_bits())),
            Value::Date(value) => {
                Some(ScalarKey::Date(value.seconds_since_reference().to_bits()))
            }
            Value::String(value) => Some(ScalarKey::String(value)),
            Value::Data(value) => Some(ScalarKey::Data(LengthHashedData(value))),
            _ => None,
        }
    }
}

struct Flattener<'a> {
    /// Every object of the document in emission order; the root is first.
    entries: Vec<FlatEntry<'a>>,
    /// Scalars already seen, mapped to their index in `entries`.
    scalars: IndexMap<ScalarKey<'a>, usize>,
    /// Containers, booleans and fill keyed by node identity. These are
    /// never uniqued; every occurrence is its own object.
    identities: HashMap<*const Value, usize>,
}

impl<'a> Flattener<'a> {
    fn new() -> Self {
        Flattener {
            entries: Vec::new(),
            scalars: IndexMap::new(),
            identities: HashMap::new(),
        }
    }

    fn flatten_value(&mut self, value: &'a Value, path: &mut PathStack) -> Result<()> {
        match value {
            Value::Null | Value::Uuid(_) | Value::Url(_) | Value::Set(_) => {
                return Err(Error::from(ErrorKind::EncodingRejected {
                    kind: value.kind_name(),
                    format: "a version 00 property list",
                })
                .or_path(|| path.render()));
            }

            Value::Boolean(_) | Value::Fill => {
                self.identities.insert(value as *const Value, self.entries.len());
                self.entries.push(FlatEntry::Value(value));
            }

            Value::Array(items) => {
                self.identities.insert(value as *const Value, self.entries.len());
                self.entries.push(FlatEntry::Value(value));
                for (index, item) in items.iter().enumerate() {
                    path.push_index("array", index);
                    let result = self.flatten_value(item, path);
                    path.pop();
                    result?;
                }
            }

            Value::Dictionary(dictionary) => {
                self.identities.insert(value as *const Value, self.entries.len());
                self.entries.push(FlatEntry::Value(value));
                // All keys are flattened before any value so the encoded
                // key references precede the value references.
                for (key, _) in dictionary.iter() {
                    self.flatten_key(key);
                }
                for (key, item) in dictionary.iter() {
                    path.push_key(key);
                    let result = self.flatten_value(item, path);
                    path.pop();
                    result?;
                }
            }

            _ => {
                let key = ScalarKey::of(value).expect("non-scalar kinds are handled above");
                if !self.scalars.contains_key(&key) {
                    self.scalars.insert(key, self.entries.len());
                    self.entries.push(FlatEntry::Value(value));
                }
            }
        }
        Ok(())
    }

    fn flatten_key(&mut self, key: &'a str) {
        let scalar_key = ScalarKey::String(key);
        if !self.scalars.contains_key(&scalar_key) {
            self.scalars.insert(scalar_key, self.entries.len());
            self.entries.push(FlatEntry::Key(key));
        }
    }

    /// The object list index `value` was assigned during flattening.
    fn reference_of(&self, value: &Value) -> u64 {
        let index = match ScalarKey::of(value) {
            Some(key) => self.scalars[&key],
            None => self.identities[&(value as *const Value)],
        };
        index as u64
    }

    fn reference_of_key(&self, key: &str) -> u64 {
        self.scalars[&ScalarKey::String(key)] as u64
    }
}

fn emit_body(
    out: &mut Vec<u8>,
    value: &Value,
    flattener: &Flattener,
    reference_size: usize,
) {
    if ser::try_push_scalar(out, value) {
        return;
    }
    match value {
        Value::Uid(uid) => ser::push_uid(out, uid.get()),
        Value::Array(items) => {
            ser::push_sized_marker(out, 0xA0, items.len());
            for item in items {
                codec::push_be(out, flattener.reference_of(item), reference_size);
            }
        }
        Value::Dictionary(dictionary) => {
            ser::push_sized_marker(out, 0xD0, dictionary.len());
            for (key, _) in dictionary.iter() {
                codec::push_be(out, flattener.reference_of_key(key), reference_size);
            }
            for (_, item) in dictionary.iter() {
                codec::push_be(out, flattener.reference_of(item), reference_size);
            }
        }
        _ => unreachable!("rejected variants never survive flattening"),
    }
}
