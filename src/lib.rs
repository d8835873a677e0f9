//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Reader and writer for Apple property lists.
//!
//! Three on-disk encodings are supported: the XML form
//! (`PropertyList-1.0`), binary version 00 and binary version 15. Decoding
//! sniffs the encoding and produces a [`Value`] tree; encoding is explicit
//! per dialect. [`from_slice`] layers serde on top for typed decoding.

mod codec;
mod de;
mod document;
mod error;
mod path;
mod ser;

pub mod cli;
pub mod value;
pub mod xml;

pub use value::{Date, Dictionary, Uid, Url, Value};

pub use de::{from_bytes, from_reader, from_slice, Deserializer};
pub use error::{Error, ErrorKind, Position, Result};
pub use ser::{to_bytes_v00, to_bytes_v15};
