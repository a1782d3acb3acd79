//! EPUB 2 NCX navigation.

use quick_xml::Reader;
use quick_xml::events::Event;

use bookstruct_shared::{BookStructError, NavEntry, Result};

use crate::xml::{attr, local_name, rebase_href, resolve_entity};

#[derive(Default)]
struct NavPointState {
    label: String,
    src: String,
    children: Vec<NavEntry>,
}

/// Parse the `navMap` of an NCX file located in `ncx_dir`.
///
/// Nested `navPoint`s become nested entries; hrefs are made
/// package-root-relative.
pub fn parse_ncx(content: &str, ncx_dir: &str) -> Result<Vec<NavEntry>> {
    let mut reader = Reader::from_str(content);
    // Untrimmed, so text split around entity references keeps its spaces.
    reader.config_mut().trim_text(false);

    // Bottom of the stack collects the top-level entries.
    let mut stack: Vec<NavPointState> = vec![NavPointState::default()];
    let mut in_nav_map = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => stack.push(NavPointState::default()),
                b"text" if in_nav_map => in_text = true,
                b"content" if in_nav_map => set_src(&mut stack, attr(&e, b"src")),
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if in_nav_map && local_name(e.name().as_ref()) == b"content" {
                    set_src(&mut stack, attr(&e, b"src"));
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    push_label(&mut stack, &String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref())) {
                        push_label(&mut stack, &resolved);
                    }
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"navMap" => in_nav_map = false,
                b"text" => in_text = false,
                b"navPoint" if in_nav_map && stack.len() > 1 => {
                    if let Some(state) = stack.pop() {
                        let label = state.label.trim().to_string();
                        if label.is_empty() && state.src.is_empty() {
                            // Keep the subtree even if the point itself is blank.
                            if let Some(parent) = stack.last_mut() {
                                parent.children.extend(state.children);
                            }
                            continue;
                        }
                        let entry = NavEntry::new(label, rebase_href(ncx_dir, &state.src))
                            .with_children(state.children);
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(entry);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(BookStructError::parse(format!("NCX: {e}"))),
            _ => {}
        }
    }

    Ok(stack.into_iter().next().map(|root| root.children).unwrap_or_default())
}

fn set_src(stack: &mut [NavPointState], src: Option<String>) {
    if let (Some(state), Some(src)) = (stack.last_mut(), src) {
        if state.src.is_empty() {
            state.src = src;
        }
    }
}

fn push_label(stack: &mut [NavPointState], text: &str) {
    if let Some(state) = stack.last_mut() {
        state.label.push_str(text);
    }
}
