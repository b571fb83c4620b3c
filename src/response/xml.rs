//! XML rendering of the envelope tree.

use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

/// Root element of every XML envelope.
pub const XML_ROOT: &str = "nasse";

/// Element used for array members.
pub const XML_ARRAY_ITEM: &str = "item";

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_numeric() || c == '-' || c == '.'
}

/// Coerce a key into a valid NCName.
///
/// Invalid characters become `_`, an invalid first character gets a leading
/// `_`, and names starting with `xml` (reserved) are prefixed with `_`.
#[must_use]
pub fn ncname(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    let needs_prefix = match out.chars().next() {
        None => true,
        Some(first) => !is_name_start(first) || out.to_ascii_lowercase().starts_with("xml"),
    };
    if needs_prefix {
        out.insert(0, '_');
    }
    out
}

/// Serialize ordered top-level fields under the `<nasse>` root.
///
/// Nested objects keep the order of their map. Pretty output indents by four
/// spaces.
pub fn to_xml(fields: &[(&str, &Value)], minify: bool) -> io::Result<Vec<u8>> {
    let mut writer = if minify {
        Writer::new(Vec::new())
    } else {
        Writer::new_with_indent(Vec::new(), b' ', 4)
    };
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new(XML_ROOT)))?;
    for (name, value) in fields {
        write_element(&mut writer, &ncname(name), value)?;
    }
    writer.write_event(Event::End(BytesEnd::new(XML_ROOT)))?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                write_element(writer, &ncname(key), child)?;
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for item in items {
                write_element(writer, XML_ARRAY_ITEM, item)?;
            }
        }
        // Keeps the closing tag on the same line.
        Value::Object(_) | Value::Array(_) => write_text(writer, "")?,
        Value::Null => write_text(writer, "null")?,
        Value::Bool(b) => write_text(writer, if *b { "true" } else { "false" })?,
        Value::Number(n) => write_text(writer, &n.to_string())?,
        Value::String(s) => write_text(writer, s)?,
    }
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> io::Result<()> {
    writer.write_event(Event::Text(BytesText::new(text)))
}
