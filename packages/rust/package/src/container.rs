//! `META-INF/container.xml`: where the package document lives.

use quick_xml::Reader;
use quick_xml::events::Event;

use bookstruct_shared::{BookStructError, Result};

use crate::xml::{attr, decode_text, local_name};

/// Package-relative location of the container file.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Extract the first rootfile's `full-path`.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = decode_text(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attr(&e, b"full-path").filter(|p| !p.is_empty()) {
                    return Ok(path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(BookStructError::parse(format!("container.xml: {e}"))),
            _ => {}
        }
    }

    Err(BookStructError::parse("container.xml: no rootfile found"))
}
