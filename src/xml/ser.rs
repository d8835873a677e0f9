//
// Copyright 2026 proplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use std::fmt::Display;
use std::io;

use crate::codec;
use crate::error::{Error, ErrorKind, Result};
use crate::path::PathStack;
use crate::value::Value;

const DOCTYPE: &str = r#"plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

/// The date format of the XML encoding, always UTC.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Encodes a value tree as an XML property list document.
pub fn to_string(value: &Value) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    write_document(&mut writer, value)?;
    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(io_error)
}

/// Encodes a value tree as XML into the given writer.
pub fn to_writer<W: io::Write>(writer: W, value: &Value) -> Result<()> {
    let mut writer = Writer::new_with_indent(writer, b'\t', 1);
    write_document(&mut writer, value)?;
    writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn io_error<E: Display>(error: E) -> Error {
    ErrorKind::Io(error.to_string()).into()
}

fn write_document<W: io::Write>(writer: &mut Writer<W>, value: &Value) -> Result<()> {
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(io_error)?;
    writer
        .write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))
        .map_err(io_error)?;

    let mut plist = BytesStart::new("plist");
    plist.push_attribute(("version", "1.0"));
    writer.write_event(Event::Start(plist)).map_err(io_error)?;

    let mut path = PathStack::new(PathStack::ROOT_XML);
    write_value(writer, value, &mut path)?;

    writer
        .write_event(Event::End(BytesEnd::new("plist")))
        .map_err(io_error)?;
    Ok(())
}

fn write_value<W: io::Write>(
    writer: &mut Writer<W>,
    value: &Value,
    path: &mut PathStack,
) -> Result<()> {
    match value {
        Value::Boolean(true) => {
            writer
                .write_event(Event::Empty(BytesStart::new("true")))
                .map_err(io_error)?;
        }
        Value::Boolean(false) => {
            writer
                .write_event(Event::Empty(BytesStart::new("false")))
                .map_err(io_error)?;
        }
        Value::Integer(value) => {
            write_text_element(writer, "integer", &value.to_string())?;
        }
        Value::BigInteger(value) => {
            write_text_element(writer, "integer", &value.to_string())?;
        }
        Value::Real(value) => {
            write_text_element(writer, "real", &real_text(value.into_inner()))?;
        }
        Value::Float(value) => {
            write_comment(writer, " Float ")?;
            write_text_element(writer, "real", &real_text(f64::from(value.into_inner())))?;
        }
        Value::Date(value) => {
            let datetime = codec::seconds_to_datetime(value.seconds_since_reference())
                .ok_or_else(|| {
                    Error::from(ErrorKind::EncodingRejected {
                        kind: "non-finite date",
                        format: "an XML property list",
                    })
                    .or_path(|| path.render())
                })?;
            write_text_element(writer, "date", &datetime.format(DATE_FORMAT).to_string())?;
        }
        Value::Data(value) => {
            write_text_element(writer, "data", &BASE64.encode(value))?;
        }
        Value::String(value) => {
            write_text_element(writer, "string", value)?;
        }
        Value::Uid(value) => {
            write_comment(writer, " UID ")?;
            write_text_element(writer, "string", &format!("0x{:X}", value.get()))?;
        }
        Value::Uuid(bytes) => {
            write_comment(writer, " UUID ")?;
            write_text_element(writer, "string", &uuid_text(bytes))?;
        }

        Value::Array(items) => {
            writer
                .write_event(Event::Start(BytesStart::new("array")))
                .map_err(io_error)?;
            for (index, item) in items.iter().enumerate() {
                path.push_index("array", index);
                let result = write_value(writer, item, path);
                path.pop();
                result?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("array")))
                .map_err(io_error)?;
        }
        Value::Set(members) => {
            writer
                .write_event(Event::Start(BytesStart::new("array")))
                .map_err(io_error)?;
            write_comment(writer, " Set ")?;
            for (index, member) in members.iter().enumerate() {
                path.push_index("set", index);
                let result = write_value(writer, member, path);
                path.pop();
                result?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("array")))
                .map_err(io_error)?;
        }
        Value::Dictionary(dictionary) => {
            writer
                .write_event(Event::Start(BytesStart::new("dict")))
                .map_err(io_error)?;
            for (key, item) in dictionary.iter() {
                write_text_element(writer, "key", key)?;
                path.push_key(key);
                let result = write_value(writer, item, path);
                path.pop();
                result?;
            }
            writer
                .write_event(Event::End(BytesEnd::new("dict")))
                .map_err(io_error)?;
        }

        Value::Null | Value::Url(_) | Value::Fill => {
            return Err(Error::from(ErrorKind::EncodingRejected {
                kind: value.kind_name(),
                format: "an XML property list",
            })
            .or_path(|| path.render()));
        }
    }
    Ok(())
}

fn write_text_element<W: io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(io_error)?;
    if !text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(io_error)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(io_error)?;
    Ok(())
}

fn write_comment<W: io::Write>(writer: &mut Writer<W>, text: &str) -> Result<()> {
    writer
        .write_event(Event::Comment(BytesText::from_escaped(text)))
        .map_err(io_error)
}

fn real_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn uuid_text(bytes: &[u8; 16]) -> String {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        hex[0..4].join(""),
        hex[4..6].join(""),
        hex[6..8].join(""),
        hex[8..10].join(""),
        hex[10..16].join(""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Dictionary, Uid};
    use ordered_float::OrderedFloat;

    #[test]
    fn test_document_shape() {
        let mut dictionary = Dictionary::new();
        dictionary.insert("Name".to_string(), Value::String("Aliza".to_string()));
        let rendered = to_string(&Value::Dictionary(dictionary)).unwrap();

        assert!(rendered.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(rendered.contains(
            "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
             \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">"
        ));
        assert!(rendered.contains("<plist version=\"1.0\">"));
        assert!(rendered.contains("\t<dict>"));
        assert!(rendered.contains("\t\t<key>Name</key>"));
        assert!(rendered.contains("\t\t<string>Aliza</string>"));
        assert!(rendered.ends_with("</plist>\n"));
    }

    #[test]
    fn test_uid_convention_comment() {
        let rendered = to_string(&Value::Uid(Uid::new(42))).unwrap();
        assert!(rendered.contains("<!-- UID -->"));
        assert!(rendered.contains("<string>0x2A</string>"));
    }

    #[test]
    fn test_float_convention_comment() {
        let rendered = to_string(&Value::Float(OrderedFloat(1.5))).unwrap();
        assert!(rendered.contains("<!-- Float -->"));
        assert!(rendered.contains("<real>1.5</real>"));
    }

    #[test]
    fn test_set_comment_inside_array() {
        let rendered = to_string(&Value::Set(vec![Value::Integer(1)])).unwrap();
        assert!(rendered.contains("<array>"));
        assert!(rendered.contains("<!-- Set -->"));
    }

    #[test]
    fn test_uuid_text_is_dashed() {
        let bytes: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC,
            0xDD, 0xEE, 0xFF,
        ];
        assert_eq!(uuid_text(&bytes), "00112233-4455-6677-8899-AABBCCDDEEFF");
    }

    #[test]
    fn test_non_finite_reals() {
        let rendered = to_string(&Value::Real(OrderedFloat(f64::NAN))).unwrap();
        assert!(rendered.contains("<real>NaN</real>"));
        let rendered = to_string(&Value::Real(OrderedFloat(f64::NEG_INFINITY))).unwrap();
        assert!(rendered.contains("<real>-Infinity</real>"));
    }

    #[test]
    fn test_fill_rejected() {
        let error = to_string(&Value::Fill).unwrap_err();
        assert_eq!(
            error.kind(),
            &ErrorKind::EncodingRejected {
                kind: "fill",
                format: "an XML property list",
            },
        );
    }

    #[test]
    fn test_escaping() {
        let rendered = to_string(&Value::String("a < b & c".to_string())).unwrap();
        assert!(rendered.contains("<string>a &lt; b &amp; c</string>"));
    }
}
