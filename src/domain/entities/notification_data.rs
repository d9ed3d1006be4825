//! Structural handling of the `NotificationData` XML document: conversion
//! into a JSON-style tree, and insertion of extra child elements under the
//! root.

use std::io::Cursor;

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use serde_json::{Map, Value};

use crate::errors::IpnError;

fn xml_error(e: impl std::fmt::Display) -> IpnError {
    IpnError::MalformedNotificationData(format!("invalid NotificationData XML: {e}"))
}

/// Element being assembled while walking the document.
struct PendingElement {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl PendingElement {
    fn new(start: &BytesStart<'_>) -> Result<Self, IpnError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(xml_error)?;
            attributes.insert(format!("@{key}"), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }

    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            };
        }
        let mut object = self.attributes;
        if !self.text.is_empty() {
            object.insert("#text".to_owned(), Value::String(self.text));
        }
        object.extend(self.children);
        Value::Object(object)
    }
}

/// Converts an XML document into a map with the root element name as its
/// only key.
///
/// Attributes become `@name` keys, text-only elements become strings, empty
/// elements become `null`, repeated child names become arrays, and text next
/// to child elements is stored under `#text`. The XML declaration, comments
/// and processing instructions are dropped.
pub(crate) fn xml_to_map(xml: &str) -> Result<Map<String, Value>, IpnError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<PendingElement> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    let mut close = |stack: &mut Vec<PendingElement>, element: PendingElement| {
        let name = element.name.clone();
        let value = element.into_value();
        match stack.last_mut() {
            Some(parent) => {
                parent.add_child(name, value);
                Ok(())
            }
            None if root.is_none() => {
                root = Some((name, value));
                Ok(())
            }
            None => Err(xml_error("more than one root element")),
        }
    };

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(PendingElement::new(&start)?),
            Event::Empty(start) => close(&mut stack, PendingElement::new(&start)?)?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("unbalanced end tag"))?;
                close(&mut stack, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("unexpected end of document"));
    }
    let (name, value) = root.ok_or_else(|| xml_error("document has no root element"))?;
    let mut map = Map::new();
    map.insert(name, value);
    Ok(map)
}

/// Re-emits an XML document with `children` (name, text) appended as the last
/// child elements of the root, right before its end tag. Everything else,
/// including whitespace, is passed through unchanged.
pub(crate) fn append_root_children(xml: &str, children: &[(&str, &str)]) -> Result<String, IpnError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut depth = 0usize;
    let mut inserted = false;

    let write_children = |writer: &mut Writer<Cursor<Vec<u8>>>| -> Result<(), IpnError> {
        for (name, text) in children {
            writer
                .write_event(Event::Start(BytesStart::new(*name)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::Text(BytesText::new(*text)))
                .map_err(xml_error)?;
            writer
                .write_event(Event::End(BytesEnd::new(*name)))
                .map_err(xml_error)?;
        }
        Ok(())
    };

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(ref end) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| xml_error("unbalanced end tag"))?;
                if depth == 0 && !inserted {
                    write_children(&mut writer)?;
                    inserted = true;
                    writer
                        .write_event(Event::End(end.borrow()))
                        .map_err(xml_error)?;
                    continue;
                }
            }
            Event::Empty(ref start) if depth == 0 && !inserted => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                writer
                    .write_event(Event::Start(start.borrow()))
                    .map_err(xml_error)?;
                write_children(&mut writer)?;
                inserted = true;
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(xml_error)?;
                continue;
            }
            Event::Eof => break,
            _ => {}
        }
        writer.write_event(event).map_err(xml_error)?;
    }

    if !inserted {
        return Err(xml_error("document has no root element"));
    }
    String::from_utf8(writer.into_inner().into_inner()).map_err(xml_error)
}
