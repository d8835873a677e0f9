//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use std::fmt::{self, Display};
use std::io;

use serde::de;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// The category of a property list read or write failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Constructed from serde deserialization errors.
    #[error("{0}")]
    Message(String),
    /// The document signature is absent or names an unknown encoding.
    #[error("missing or unrecognised property list header")]
    MalformedHeader,
    /// A version 00 trailer field is inconsistent with the document.
    #[error("invalid binary property list trailer")]
    MalformedTrailer,
    /// An unknown or reserved marker byte was encountered.
    #[error("unknown or reserved marker byte 0x{0:02X}")]
    MalformedMarker(u8),
    /// An object offset lies outside the object table.
    #[error("offset {0} is outside the object table")]
    OffsetOutOfRange(u64),
    /// An object reference is not covered by the offset table.
    #[error("object reference {0} is not in the offset table")]
    RefOutOfRange(u64),
    /// A container references one of its own ancestors.
    #[error("cycle detected in object graph")]
    CycleDetected,
    /// An integer or length field does not fit its legal width.
    #[error("integer value out of range")]
    Overflow,
    /// An object's kind is not the one the document structure requires.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The value cannot be represented in the requested encoding.
    #[error("{kind} values cannot be encoded as {format}")]
    EncodingRejected {
        kind: &'static str,
        format: &'static str,
    },
    /// The underlying byte stream failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// The location of a failure within the source document.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Position {
    /// A byte offset from the start of a binary document.
    Offset(u64),
    /// A one-based line and column in an XML document.
    LineColumn(u64, u64),
}

impl Display for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Position::Offset(offset) => write!(formatter, "offset {}", offset),
            Position::LineColumn(line, column) => {
                write!(formatter, "line {} column {}", line, column)
            }
        }
    }
}

/// Property list serialization and deserialization error.
///
/// Every error carries its [`ErrorKind`] plus, where the failing frame could
/// provide them, the position in the source document and the path of the
/// value being processed (for example `/plist[0.0]/dict[Files]/array[3]`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    path: Option<String>,
    position: Option<Position>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Attaches a diagnostic path unless an inner frame already set one.
    pub(crate) fn or_path(mut self, path: impl FnOnce() -> String) -> Self {
        if self.path.is_none() {
            self.path = Some(path());
        }
        self
    }

    /// Attaches a source position unless an inner frame already set one.
    pub(crate) fn or_position(mut self, position: Position) -> Self {
        if self.position.is_none() {
            self.position = Some(position);
        }
        self
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            path: None,
            position: None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        ErrorKind::Io(error.to_string()).into()
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        self.kind.fmt(formatter)?;
        if let Some(position) = self.position {
            write!(formatter, " at {}", position)?;
        }
        if let Some(path) = &self.path {
            write!(formatter, " ({})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl de::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        ErrorKind::Message(msg.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_frame_wins() {
        let error = Error::from(ErrorKind::CycleDetected)
            .or_position(Position::Offset(17))
            .or_path(|| String::from("/plist[0.0]/set[0]"))
            .or_position(Position::Offset(8))
            .or_path(|| String::from("/plist[0.0]"));
        assert_eq!(error.position(), Some(Position::Offset(17)));
        assert_eq!(error.path(), Some("/plist[0.0]/set[0]"));
    }

    #[test]
    fn test_display_includes_position_and_path() {
        let error = Error::from(ErrorKind::MalformedMarker(0x7A))
            .or_position(Position::Offset(42))
            .or_path(|| String::from("/plist[0.0]/dict[Name]"));
        assert_eq!(
            error.to_string(),
            "unknown or reserved marker byte 0x7A at offset 42 (/plist[0.0]/dict[Name])"
        );
    }
}
