//! Best-effort text repair for documents that fail to parse as they are.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn re_reference() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| {
        Regex::new(r"^&(?:amp|lt|gt|quot|apos|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap()
    })
}

fn re_verbatim() -> &'static Regex {
    static ONCE: OnceLock<Regex> = OnceLock::new();
    ONCE.get_or_init(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>|<!--.*?-->").unwrap())
}

/// Escapes every `&` that does not start a predefined entity or a character reference.
///
/// Hand-edited diagrams often carry labels like `R&D`, which XML parsers reject. CDATA sections
/// and comments are copied verbatim.
pub fn escape_bare_ampersands(text: &str) -> Cow<'_, str> {
    let verbatim: Vec<_> = re_verbatim().find_iter(text).map(|m| m.range()).collect();
    let bare: Vec<usize> = text
        .match_indices('&')
        .map(|(i, _)| i)
        .filter(|i| !verbatim.iter().any(|r| r.contains(i)))
        .filter(|&i| !re_reference().is_match(&text[i..]))
        .collect();
    if bare.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + bare.len() * 4);
    let mut last = 0usize;
    for i in bare {
        out.push_str(&text[last..i]);
        out.push_str("&amp;");
        last = i + 1;
    }
    out.push_str(&text[last..]);
    Cow::Owned(out)
}
