//! Start-tag lexing and re-emission.
//!
//! Rewrites splice new start tags into the original text so that everything outside the edited
//! connectors stays byte-identical. Untouched attributes are re-emitted from their source text.

use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot<'a> {
    /// `name="value"` exactly as written in the source.
    Source(&'a str),
    /// Unescaped value to be written out.
    Value(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attr<'a> {
    name: Cow<'a, str>,
    slot: Slot<'a>,
}

/// Editable view of one start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TagBuilder<'a> {
    qname: Cow<'a, str>,
    attrs: Vec<Attr<'a>>,
    self_closing: bool,
}

fn skip_ws(s: &str, mut i: usize) -> usize {
    let bytes = s.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn name_end(s: &str, mut i: usize) -> usize {
    let bytes = s.as_bytes();
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || matches!(b, b'=' | b'/' | b'>') {
            break;
        }
        i += 1;
    }
    i
}

impl<'a> TagBuilder<'a> {
    /// Lexes the start tag at the beginning of `src` (which must begin with `<`).
    ///
    /// Returns the builder and the byte length of the start tag.
    pub(crate) fn lex(src: &'a str) -> Option<(Self, usize)> {
        let bytes = src.as_bytes();
        if bytes.first() != Some(&b'<') {
            return None;
        }
        let qname_end = name_end(src, 1);
        if qname_end == 1 {
            return None;
        }
        let mut tag = TagBuilder {
            qname: Cow::Borrowed(&src[1..qname_end]),
            attrs: Vec::new(),
            self_closing: false,
        };

        let mut i = qname_end;
        loop {
            i = skip_ws(src, i);
            match bytes.get(i)? {
                b'>' => return Some((tag, i + 1)),
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return None;
                    }
                    tag.self_closing = true;
                    return Some((tag, i + 2));
                }
                _ => {}
            }

            let attr_start = i;
            let attr_name_end = name_end(src, i);
            if attr_name_end == attr_start {
                return None;
            }
            i = skip_ws(src, attr_name_end);
            if bytes.get(i) != Some(&b'=') {
                return None;
            }
            i = skip_ws(src, i + 1);
            let quote = *bytes.get(i)?;
            if quote != b'"' && quote != b'\'' {
                return None;
            }
            let value_len = src[i + 1..].find(quote as char)?;
            i = i + 1 + value_len + 1;
            tag.attrs.push(Attr {
                name: Cow::Borrowed(&src[attr_start..attr_name_end]),
                slot: Slot::Source(&src[attr_start..i]),
            });
        }
    }

    /// A fresh self-closing element named `qname`.
    pub(crate) fn new_element(qname: String) -> Self {
        TagBuilder {
            qname: Cow::Owned(qname),
            attrs: Vec::new(),
            self_closing: true,
        }
    }

    pub(crate) fn qname(&self) -> &str {
        &self.qname
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Replaces the value in place, or appends the attribute when absent.
    pub(crate) fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.slot = Slot::Value(value),
            None => self.attrs.push(Attr {
                name: Cow::Owned(name.to_string()),
                slot: Slot::Value(value),
            }),
        }
    }

    pub(crate) fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if !self.has(name) {
            self.set(name, value);
        }
    }

    pub(crate) fn finish(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push('<');
        out.push_str(&self.qname);
        for attr in &self.attrs {
            out.push(' ');
            match &attr.slot {
                Slot::Source(text) => out.push_str(text),
                Slot::Value(value) => {
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_attr_value_into(value, &mut out);
                    out.push('"');
                }
            }
        }
        out.push_str(if self.self_closing { "/>" } else { ">" });
        out
    }
}

fn escape_attr_value_into(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Namespace prefix of a qualified name including the colon, or `""`.
pub(crate) fn prefix_of(qname: &str) -> &str {
    match qname.find(':') {
        Some(i) => &qname[..=i],
        None => "",
    }
}
