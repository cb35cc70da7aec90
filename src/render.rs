//! Body encoders for the negotiated representations.
//!
//! Handlers describe a body once as a [`Document`] (a JSON value plus the
//! element names XML needs) and the encoder for the request's
//! [`Representation`] turns it into bytes.
//!
//! XML follows the Rails `to_xml` shape:
//!
//! ```text
//! <humans type="array">
//!   <human><id type="integer">1</id><name>John</name></human>
//! </humans>
//! ```
//!
//! Field names become element names after replacing anything that is not
//! `[A-Za-z0-9_.-]` with `_`.

use std::borrow::Cow;
use std::fmt::Write;

use serde_json::Value;

use crate::negotiate::Representation;
use crate::response::ContentType;

/// A response body, independent of wire format.
#[derive(Clone, Debug)]
pub struct Document {
    root: Cow<'static, str>,
    item: Cow<'static, str>,
    value: Value,
}

impl Document {
    /// A single object rendered as `<root>…</root>`.
    pub fn object(root: impl Into<Cow<'static, str>>, value: Value) -> Self {
        let root = root.into();
        Self { item: root.clone(), root, value }
    }

    /// An array rendered as `<root type="array"><item>…</item>…</root>`.
    pub fn collection(
        root: impl Into<Cow<'static, str>>,
        item: impl Into<Cow<'static, str>>,
        value: Value,
    ) -> Self {
        Self { root: root.into(), item: item.into(), value }
    }

    pub fn encode(&self, representation: Representation) -> (ContentType, Vec<u8>) {
        match representation {
            Representation::Json => (ContentType::Json, self.value.to_string().into_bytes()),
            Representation::Xml => (ContentType::Xml, self.to_xml().into_bytes()),
        }
    }

    fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&mut out, &self.root, &self.item, &self.value);
        out.push('\n');
        out
    }
}

fn write_element(out: &mut String, name: &str, item: &str, value: &Value) {
    let name = element_name(name);
    match value {
        Value::Null => {
            let _ = write!(out, "<{name} nil=\"true\"/>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<{name} type=\"boolean\">{b}</{name}>");
        }
        Value::Number(n) => {
            let kind = if n.is_f64() { "float" } else { "integer" };
            let _ = write!(out, "<{name} type=\"{kind}\">{n}</{name}>");
        }
        Value::String(s) => {
            let _ = write!(out, "<{name}>{}</{name}>", escape(s));
        }
        Value::Array(items) => {
            let _ = write!(out, "<{name} type=\"array\">");
            for v in items {
                write_element(out, item, item, v);
            }
            let _ = write!(out, "</{name}>");
        }
        Value::Object(fields) => {
            let _ = write!(out, "<{name}>");
            for (k, v) in fields {
                write_element(out, k, "item", v);
            }
            let _ = write!(out, "</{name}>");
        }
    }
}

fn element_name(name: &str) -> Cow<'_, str> {
    let valid = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
    let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if starts_ok && name.chars().all(valid) {
        return Cow::Borrowed(name);
    }
    let mut cleaned: String = name.chars().map(|c| if valid(c) { c } else { '_' }).collect();
    if !starts_ok {
        cleaned.insert(0, '_');
    }
    Cow::Owned(cleaned)
}

/// C0 controls other than tab, newline and carriage return (and the two
/// noncharacters U+FFFE, U+FFFF) are not legal XML 1.0, not even as
/// character references. They become U+FFFD.
fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| matches!(c, '<' | '>' | '&' | '"' | '\'') || is_forbidden(c)) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if is_forbidden(c) => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '\0'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn xml(doc: &Document) -> String {
        let (ct, bytes) = doc.encode(Representation::Xml);
        assert_eq!(ct, ContentType::Xml);
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn collection_renders_rails_style_array() {
        let doc = Document::collection(
            "humans",
            "human",
            json!([{ "id": 1, "name": "John", "brain_type": "small" }]),
        );
        assert_eq!(
            xml(&doc),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <humans type=\"array\"><human><brain_type>small</brain_type>\
             <id type=\"integer\">1</id><name>John</name></human></humans>\n",
        );
    }

    #[test]
    fn escapes_text_and_names() {
        let doc = Document::object("errors", json!({ "first name": "<b>&" , "weapon": null }));
        let out = xml(&doc);
        assert!(out.contains("<first_name>&lt;b&gt;&amp;</first_name>"));
        assert!(out.contains("<weapon nil=\"true\"/>"));
    }

    #[test]
    fn control_characters_never_reach_xml() {
        let doc = Document::object("human", json!({ "name": "a\u{1}b\u{1b}c", "notes": "x\ty\nz" }));
        let out = xml(&doc);
        assert!(out.contains("<name>a\u{fffd}b\u{fffd}c</name>"));
        assert!(out.contains("<notes>x\ty\nz</notes>"));
        assert!(!out.chars().any(is_forbidden));
    }

    #[test]
    fn json_is_compact_value() {
        let doc = Document::object("human", json!({ "name": "Ash" }));
        let (ct, bytes) = doc.encode(Representation::Json);
        assert_eq!(ct, ContentType::Json);
        assert_eq!(bytes, br#"{"name":"Ash"}"#);
    }
}
