//! Small helpers shared by the package-document parsers.

use percent_encoding::percent_decode_str;
use quick_xml::events::BytesStart;

use bookstruct_shared::paths::{join_relative, strip_fragment};

/// Strip a UTF-8 byte order mark.
pub(crate) fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

/// Decode bytes as UTF-8 text, replacing invalid sequences.
pub(crate) fn decode_text(data: &[u8]) -> String {
    String::from_utf8_lossy(strip_bom(data)).into_owned()
}

/// Local part of a possibly prefixed name (`dc:title` -> `title`).
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

/// Value of the attribute whose local name is `key`, entities unescaped.
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        if local_name(a.key.as_ref()) != key {
            return None;
        }
        let raw = String::from_utf8_lossy(a.value.as_ref());
        Some(unescape(&raw))
    })
}

/// Resolve the predefined XML entities and numeric character references.
pub(crate) fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find(';').and_then(|end| resolve_entity(&after[..end]).map(|s| (end, s))) {
            Some((end, resolved)) => {
                out.push_str(&resolved);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve one entity name (without `&` and `;`).
pub(crate) fn resolve_entity(entity: &str) -> Option<String> {
    let named = match entity {
        "apos" => Some('\''),
        "quot" => Some('"'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        _ => None,
    };
    if let Some(c) = named {
        return Some(c.to_string());
    }

    let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        entity.strip_prefix('#')?.parse().ok()?
    };
    char::from_u32(code).map(String::from)
}

/// Make a document-relative href package-root-relative.
///
/// The path part is percent-decoded and normalized; a `#fragment` is kept.
/// Scheme-prefixed references are returned as they are.
pub(crate) fn rebase_href(base_dir: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() || href.contains("://") || href.starts_with("data:") {
        return href.to_string();
    }

    let path = strip_fragment(href);
    let suffix = &href[path.len()..];
    let fragment = suffix.find('#').map(|i| &suffix[i..]).unwrap_or_default();

    if path.is_empty() {
        return href.to_string();
    }

    let decoded = percent_decode_str(path).decode_utf8_lossy();
    format!("{}{fragment}", join_relative(base_dir, &decoded))
}
