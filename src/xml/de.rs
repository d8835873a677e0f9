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
use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

use crate::codec;
use crate::error::{Error, ErrorKind, Position, Result};
use crate::path::PathStack;
use crate::value::{Date, Dictionary, Uid, Value};
use crate::xml::ser::DATE_FORMAT;

/// Decodes an XML property list document into a value tree.
pub fn from_str(input: &str) -> Result<Value> {
    let mut decoder = XmlDecoder {
        reader: Reader::from_str(input),
        input,
        path: PathStack::new(PathStack::ROOT_XML),
    };
    decoder.read_document()
}

/// Decodes an XML property list document from raw bytes. The document must
/// be UTF-8, with or without a byte-order mark.
pub fn from_bytes(input: &[u8]) -> Result<Value> {
    const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let text = std::str::from_utf8(input).map_err(|_| ErrorKind::MalformedHeader)?;
    from_str(text)
}

/// The convention comments disambiguating scalars the XML tag vocabulary
/// cannot express on its own.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Convention {
    Uid,
    Uuid,
    Float,
    Set,
}

impl Convention {
    fn parse(comment: &BytesText) -> Option<Convention> {
        match String::from_utf8_lossy(comment).trim() {
            "UID" => Some(Convention::Uid),
            "UUID" => Some(Convention::Uuid),
            "Float" => Some(Convention::Float),
            "Set" => Some(Convention::Set),
            _ => None,
        }
    }
}

struct XmlDecoder<'a> {
    reader: Reader<&'a [u8]>,
    input: &'a str,
    path: PathStack,
}

impl<'a> XmlDecoder<'a> {
    fn position(&self) -> Position {
        let offset = (self.reader.buffer_position() as usize).min(self.input.len());
        let consumed = &self.input.as_bytes()[..offset];
        let line = consumed.iter().filter(|&&byte| byte == b'\n').count() as u64 + 1;
        let column = consumed
            .iter()
            .rev()
            .take_while(|&&byte| byte != b'\n')
            .count() as u64
            + 1;
        Position::LineColumn(line, column)
    }

    fn fail(&self, kind: ErrorKind) -> Error {
        Error::from(kind)
            .or_position(self.position())
            .or_path(|| self.path.render())
    }

    fn syntax(&self, message: impl Into<String>) -> Error {
        self.fail(ErrorKind::Message(message.into()))
    }

    /// Reads the next event, skipping the prolog and whitespace between
    /// elements. Whitespace inside text elements is read elsewhere and
    /// never passes through here.
    fn next_event(&mut self) -> Result<Event<'a>> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|error| self.syntax(error.to_string()))?;
            match event {
                Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => {
                    continue;
                }
                Event::Decl(_) | Event::DocType(_) | Event::PI(_) => continue,
                event => return Ok(event),
            }
        }
    }

    fn read_document(&mut self) -> Result<Value> {
        loop {
            match self.next_event()? {
                Event::Comment(_) => continue,
                Event::Start(element) if element.name().as_ref() == b"plist" => break,
                Event::Eof => return Err(self.fail(ErrorKind::MalformedHeader)),
                _ => return Err(self.fail(ErrorKind::MalformedHeader)),
            }
        }

        let value = match self.read_value()? {
            Some(value) => value,
            None => {
                return Err(self.fail(ErrorKind::TypeMismatch {
                    expected: "a root value",
                    found: "an empty plist element",
                }));
            }
        };

        loop {
            match self.next_event()? {
                Event::Comment(_) => continue,
                Event::End(element) if element.name().as_ref() == b"plist" => break,
                Event::Eof => return Err(self.syntax("unexpected end of document")),
                _ => {
                    return Err(self.fail(ErrorKind::TypeMismatch {
                        expected: "a single root value",
                        found: "additional content",
                    }));
                }
            }
        }
        Ok(value)
    }

    /// Reads the next value in the current container, or `None` when the
    /// container's end tag is reached instead.
    fn read_value(&mut self) -> Result<Option<Value>> {
        let mut convention = None;
        loop {
            match self.next_event()? {
                Event::Comment(comment) => {
                    convention = Convention::parse(&comment).or(convention);
                }
                Event::Start(element) => {
                    let name = element.name().as_ref().to_vec();
                    return self.read_element(&name, convention, false).map(Some);
                }
                Event::Empty(element) => {
                    let name = element.name().as_ref().to_vec();
                    return self.read_element(&name, convention, true).map(Some);
                }
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(self.syntax("unexpected end of document")),
                _ => return Err(self.syntax("unexpected content")),
            }
        }
    }

    fn read_element(
        &mut self,
        name: &[u8],
        convention: Option<Convention>,
        empty: bool,
    ) -> Result<Value> {
        match name {
            b"dict" => {
                if empty {
                    Ok(Value::Dictionary(Dictionary::new()))
                } else {
                    self.read_dictionary()
                }
            }
            b"array" => {
                if empty {
                    if convention == Some(Convention::Set) {
                        Ok(Value::Set(Vec::new()))
                    } else {
                        Ok(Value::Array(Vec::new()))
                    }
                } else {
                    self.read_array(convention == Some(Convention::Set))
                }
            }
            b"string" => {
                let text = if empty {
                    String::new()
                } else {
                    self.read_text()?
                };
                match convention {
                    Some(Convention::Uid) => self.parse_uid_literal(&text),
                    Some(Convention::Uuid) => self.parse_uuid_literal(&text),
                    _ => Ok(Value::String(text)),
                }
            }
            b"integer" => {
                let text = if empty {
                    String::new()
                } else {
                    self.read_text()?
                };
                self.parse_integer(&text)
            }
            b"real" => {
                let text = if empty {
                    String::new()
                } else {
                    self.read_text()?
                };
                let value = self.parse_real(&text)?;
                if convention == Some(Convention::Float) {
                    Ok(Value::Float(OrderedFloat(value as f32)))
                } else {
                    Ok(Value::Real(OrderedFloat(value)))
                }
            }
            b"date" => {
                let text = if empty {
                    String::new()
                } else {
                    self.read_text()?
                };
                let datetime = NaiveDateTime::parse_from_str(text.trim(), DATE_FORMAT)
                    .map_err(|_| self.syntax(format!("invalid date `{}`", text.trim())))?
                    .and_utc();
                Ok(Value::Date(Date::from_seconds_since_reference(
                    codec::datetime_to_seconds(&datetime),
                )))
            }
            b"data" => {
                let text = if empty {
                    String::new()
                } else {
                    self.read_text()?
                };
                let cleaned: String =
                    text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
                let bytes = BASE64
                    .decode(cleaned.as_bytes())
                    .map_err(|_| self.syntax("invalid base-64 data"))?;
                Ok(Value::Data(bytes))
            }
            b"true" => {
                if !empty {
                    self.expect_element_end()?;
                }
                Ok(Value::Boolean(true))
            }
            b"false" => {
                if !empty {
                    self.expect_element_end()?;
                }
                Ok(Value::Boolean(false))
            }
            other => Err(self.syntax(format!(
                "unexpected element <{}>",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    fn read_dictionary(&mut self) -> Result<Value> {
        let mut dictionary = Dictionary::new();
        loop {
            match self.next_event()? {
                Event::Comment(_) => continue,
                Event::Start(element) if element.name().as_ref() == b"key" => {
                    let key = self.read_text()?;
                    self.finish_dictionary_entry(&mut dictionary, key)?;
                }
                Event::Empty(element) if element.name().as_ref() == b"key" => {
                    self.finish_dictionary_entry(&mut dictionary, String::new())?;
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.syntax("unexpected end of document")),
                _ => return Err(self.syntax("expected <key> or </dict>")),
            }
        }
        Ok(Value::Dictionary(dictionary))
    }

    fn finish_dictionary_entry(
        &mut self,
        dictionary: &mut Dictionary,
        key: String,
    ) -> Result<()> {
        if dictionary.contains_key(&key) {
            return Err(self.fail(ErrorKind::TypeMismatch {
                expected: "a unique dictionary key",
                found: "a duplicate",
            }));
        }
        self.path.push_key(&key);
        let value = self.read_value();
        self.path.pop();
        match value? {
            Some(value) => {
                dictionary.insert(key, value);
                Ok(())
            }
            None => Err(self.fail(ErrorKind::TypeMismatch {
                expected: "a value for the preceding key",
                found: "the end of the dictionary",
            })),
        }
    }

    fn read_array(&mut self, mut is_set: bool) -> Result<Value> {
        let mut items: Vec<Value> = Vec::new();
        let mut convention = None;
        loop {
            match self.next_event()? {
                Event::Comment(comment) => match Convention::parse(&comment) {
                    // The set convention marks the surrounding array.
                    Some(Convention::Set) => is_set = true,
                    parsed => convention = parsed.or(convention),
                },
                Event::Start(element) => {
                    let name = element.name().as_ref().to_vec();
                    self.path
                        .push_index(if is_set { "set" } else { "array" }, items.len());
                    let item = self.read_element(&name, convention.take(), false);
                    self.path.pop();
                    items.push(item?);
                }
                Event::Empty(element) => {
                    let name = element.name().as_ref().to_vec();
                    self.path
                        .push_index(if is_set { "set" } else { "array" }, items.len());
                    let item = self.read_element(&name, convention.take(), true);
                    self.path.pop();
                    items.push(item?);
                }
                Event::End(_) => break,
                Event::Eof => return Err(self.syntax("unexpected end of document")),
                _ => return Err(self.syntax("unexpected content in array")),
            }
        }

        if is_set {
            for (index, member) in items.iter().enumerate() {
                if items[..index].contains(member) {
                    return Err(self.fail(ErrorKind::TypeMismatch {
                        expected: "distinct set members",
                        found: "a duplicate",
                    }));
                }
            }
            Ok(Value::Set(items))
        } else {
            Ok(Value::Array(items))
        }
    }

    /// Collects the character content of the current element up to its end
    /// tag. Whitespace is preserved; nested elements are rejected.
    fn read_text(&mut self) -> Result<String> {
        let mut text = String::new();
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|error| self.syntax(error.to_string()))?;
            match event {
                Event::Text(content) => {
                    let unescaped = content
                        .unescape()
                        .map_err(|error| self.syntax(error.to_string()))?;
                    text.push_str(&unescaped);
                }
                Event::CData(content) => {
                    text.push_str(&String::from_utf8_lossy(&content));
                }
                Event::Comment(_) => continue,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.syntax("unexpected end of document")),
                _ => return Err(self.syntax("unexpected markup inside element")),
            }
        }
    }

    fn expect_element_end(&mut self) -> Result<()> {
        match self.next_event()? {
            Event::End(_) => Ok(()),
            _ => Err(self.syntax("expected element end")),
        }
    }

    /// Accepts base-10 with an optional sign and base-16 with a `0x`
    /// prefix. Literals beyond 16 bytes two's-complement overflow.
    fn parse_integer(&self, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let magnitude = if let Some(hex) = unsigned
            .strip_prefix("0x")
            .or_else(|| unsigned.strip_prefix("0X"))
        {
            if hex.is_empty() || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
                return Err(self.syntax(format!("invalid integer `{}`", trimmed)));
            }
            u128::from_str_radix(hex, 16).map_err(|_| self.fail(ErrorKind::Overflow))?
        } else {
            if unsigned.is_empty() || !unsigned.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(self.syntax(format!("invalid integer `{}`", trimmed)));
            }
            unsigned
                .parse::<u128>()
                .map_err(|_| self.fail(ErrorKind::Overflow))?
        };

        let value = if negative {
            if magnitude > i128::MAX as u128 + 1 {
                return Err(self.fail(ErrorKind::Overflow));
            }
            (magnitude as i128).wrapping_neg()
        } else {
            if magnitude > i128::MAX as u128 {
                return Err(self.fail(ErrorKind::Overflow));
            }
            magnitude as i128
        };
        Ok(Value::from(value))
    }

    /// Recognises `NaN`, `+Infinity`, `-Infinity` and `INF` in any case in
    /// addition to ordinary decimal reals.
    fn parse_real(&self, text: &str) -> Result<f64> {
        let trimmed = text.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "nan" => Ok(f64::NAN),
            "inf" | "+inf" | "infinity" | "+infinity" => Ok(f64::INFINITY),
            "-inf" | "-infinity" => Ok(f64::NEG_INFINITY),
            _ => trimmed
                .parse::<f64>()
                .map_err(|_| self.syntax(format!("invalid real `{}`", trimmed))),
        }
    }

    fn parse_uid_literal(&self, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| self.syntax(format!("invalid UID literal `{}`", trimmed)))?;
        if hex.is_empty() || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(self.syntax(format!("invalid UID literal `{}`", trimmed)));
        }
        let value =
            u64::from_str_radix(hex, 16).map_err(|_| self.fail(ErrorKind::Overflow))?;
        Ok(Value::Uid(Uid::new(value)))
    }

    fn parse_uuid_literal(&self, text: &str) -> Result<Value> {
        let hex: String = text.trim().chars().filter(|&c| c != '-').collect();
        if hex.len() != 32 || !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(self.syntax(format!("invalid UUID literal `{}`", text.trim())));
        }
        let mut bytes = [0u8; 16];
        for (index, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).expect("hex digits are ASCII");
            bytes[index] = u8::from_str_radix(pair, 16).expect("validated above");
        }
        Ok(Value::Uuid(bytes))
    }
}
