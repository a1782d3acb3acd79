//! XML reading of content documents.
//!
//! EPUB content documents are XHTML, where `<a id="p5"/>` is a complete
//! element and `<title/>` closes itself. Well-formed input is read here with
//! `quick-xml`; anything else is handed to the HTML parser by the caller.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use bookstruct_shared::{BookStructError, Result};

use crate::tree::{Document, TreeBuilder};

/// Elements whose content is raw text in HTML.
const RAW_TEXT_TAGS: &[&[u8]] = &[b"script", b"style"];

/// Build a document from well-formed XML.
///
/// Fails on any well-formedness error, on input without a root element and
/// on content after the root element closes.
pub(crate) fn parse(markup: &str) -> Result<Document> {
    let mut reader = Reader::from_str(markup);
    // Untrimmed, so text split around entity references keeps its spaces.
    reader.config_mut().trim_text(false);

    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => open(&mut builder, &e)?,
            Ok(Event::Empty(e)) => {
                open(&mut builder, &e)?;
                builder.close();
            }
            Ok(Event::End(_)) => builder.close(),
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref());
                if text.contains('\r') {
                    builder.text(&text.replace("\r\n", "\n"));
                } else {
                    builder.text(&text);
                }
            }
            Ok(Event::CData(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::GeneralRef(e)) => {
                let name = String::from_utf8_lossy(e.as_ref());
                match resolve_entity(&name) {
                    Some(resolved) => builder.text(&resolved),
                    None => builder.text(&format!("&{name};")),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(BookStructError::parse(format!("XHTML: {e}"))),
            _ => {}
        }
    }

    if !builder.has_root() {
        return Err(BookStructError::parse("XHTML: no root element"));
    }
    if builder.depth() > 0 {
        return Err(BookStructError::parse("XHTML: unclosed elements at end of input"));
    }

    Ok(builder.finish())
}

fn open(builder: &mut TreeBuilder, e: &BytesStart<'_>) -> Result<()> {
    if builder.has_root() && builder.depth() == 0 {
        return Err(BookStructError::parse("XHTML: content after the root element"));
    }

    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| BookStructError::parse(format!("XHTML: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = unescape(&String::from_utf8_lossy(attr.value.as_ref()));
        attrs.push((key, value));
    }

    let name = e.local_name();
    builder.open(&String::from_utf8_lossy(name.as_ref()), attrs);
    Ok(())
}

/// Whether the markup contains a real `<body>` start tag.
///
/// Tokenizes leniently so markup that is not XML still scans: comments,
/// CDATA sections, and `script`/`style` content never count.
pub(crate) fn declares_body(markup: &str) -> bool {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if is_tag(&e, b"body") {
                    return true;
                }
                if RAW_TEXT_TAGS.iter().any(|tag| is_tag(&e, tag)) {
                    let end = e.to_end().into_owned();
                    if reader.read_text(end.name()).is_err() {
                        return false;
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if is_tag(&e, b"body") {
                    return true;
                }
            }
            Ok(Event::Eof) => return false,
            // Ill-formed constructs are skipped; a stalled reader is done.
            Err(_) if reader.buffer_position() == position => return false,
            _ => {}
        }
    }
}

fn is_tag(e: &BytesStart<'_>, tag: &[u8]) -> bool {
    e.local_name().as_ref().eq_ignore_ascii_case(tag)
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Resolve an entity name (without `&` and `;`).
///
/// Covers the XML predefined entities, numeric references, and the HTML
/// named entities that show up in book text.
pub(crate) fn resolve_entity(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "shy" => '\u{ad}',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "sbquo" => '\u{201a}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bdquo" => '\u{201e}',
        "hellip" => '\u{2026}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "deg" => '\u{b0}',
        "times" => '\u{d7}',
        "sect" => '\u{a7}',
        "para" => '\u{b6}',
        "dagger" => '\u{2020}',
        "Dagger" => '\u{2021}',
        "prime" => '\u{2032}',
        _ => return None,
    };
    Some(c.to_string())
}

/// Replace entity references in an attribute value; unknown ones stay as written.
fn unescape(raw: &str) -> String {
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
