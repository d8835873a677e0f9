//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! The XML property list encoding (`PropertyList-1.0`).
//!
//! The XML tag vocabulary has no native UID, UUID, 32-bit real or set
//! forms; those are disambiguated by convention comments (`<!-- UID -->`,
//! `<!-- UUID -->`, `<!-- Float -->` before the element, `<!-- Set -->`
//! inside an `<array>`). The writer emits them and the reader recognises
//! them; in their absence the plain interpretations apply.

mod de;
mod ser;

pub use de::{from_bytes, from_str};
pub use ser::{to_string, to_writer};
