//! Parses the XML plugin description-file grammar:
//!
//! ```xml
//! <plugin name="NAME" version="A.B.C.D">
//!   <description>TEXT</description>
//!   <category>TEXT</category>
//!   <dependencyList>
//!     <dependency name="NAME" version="A.B.C.D"/>
//!   </dependencyList>
//! </plugin>
//! ```

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use super::dependency::PluginDependency;
use super::error::PluginSystemError;

pub struct ParsedSpec {
    pub name: String,
    pub version: String,
    pub description: String,
    pub category: String,
    pub dependencies: Vec<PluginDependency>,
}

/// `A.B`, `A.B.C`, or `A.B.C_D`, each component numeric. Versions not
/// matching this shape are treated as empty, per the spec file grammar.
fn normalize_version(raw: &str) -> String {
    // A small hand-rolled check for `\d+(\.\d+)?(\.\d+)?(_\d+)?` rather than
    // pulling in a regex engine for one call site.
    let mut component = String::new();
    let mut valid = true;
    let mut saw_digit_since_sep = false;
    let mut seen_dots = 0;
    let mut seen_underscore = false;

    let mut it = raw.chars().peekable();
    while let Some(&c) = it.peek() {
        if c.is_ascii_digit() {
            saw_digit_since_sep = true;
            component.push(c);
            it.next();
        } else if c == '.' && !seen_underscore && seen_dots < 2 && saw_digit_since_sep {
            seen_dots += 1;
            saw_digit_since_sep = false;
            component.push(c);
            it.next();
        } else if c == '_' && !seen_underscore && saw_digit_since_sep {
            seen_underscore = true;
            saw_digit_since_sep = false;
            component.push(c);
            it.next();
        } else {
            valid = false;
            break;
        }
    }

    // A trailing separator (e.g. "1." or "1_") leaves saw_digit_since_sep
    // false, since nothing reset it after the last separator was accepted.
    if valid && saw_digit_since_sep && it.peek().is_none() {
        component
    } else {
        String::new()
    }
}

pub fn parse(xml: &str, path: &Path) -> Result<ParsedSpec, PluginSystemError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut name = None;
    let mut version = String::new();
    let mut description = String::new();
    let mut category = String::new();
    let mut dependencies = Vec::new();

    let mut in_description = false;
    let mut in_category = false;
    let mut buf = Vec::new();

    loop {
        let position_before = reader.buffer_position() as usize;
        let line_before = xml[..position_before.min(xml.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"plugin" => {
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                name = Some(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                            b"version" => {
                                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                                version = normalize_version(&raw);
                            }
                            _ => {}
                        }
                    }
                }
                b"description" => in_description = true,
                b"category" => in_category = true,
                b"dependency" => {
                    let mut dep_name = None;
                    let mut dep_version = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => {
                                dep_name = Some(String::from_utf8_lossy(&attr.value).into_owned());
                            }
                            b"version" => {
                                let raw = String::from_utf8_lossy(&attr.value).into_owned();
                                dep_version = normalize_version(&raw);
                            }
                            _ => {}
                        }
                    }
                    if let Some(dep_name) = dep_name {
                        dependencies.push(PluginDependency::new(dep_name, dep_version));
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"dependency" => {
                let mut dep_name = None;
                let mut dep_version = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => {
                            dep_name = Some(String::from_utf8_lossy(&attr.value).into_owned());
                        }
                        b"version" => {
                            let raw = String::from_utf8_lossy(&attr.value).into_owned();
                            dep_version = normalize_version(&raw);
                        }
                        _ => {}
                    }
                }
                if let Some(dep_name) = dep_name {
                    dependencies.push(PluginDependency::new(dep_name, dep_version));
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map(|c| c.into_owned()).unwrap_or_default();
                if in_description {
                    description = text;
                } else if in_category {
                    category = text;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"description" => in_description = false,
                b"category" => in_category = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PluginSystemError::ParseError {
                    path: path.to_path_buf(),
                    line: line_before,
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    let name = name.ok_or_else(|| PluginSystemError::ParseError {
        path: path.to_path_buf(),
        line: 0,
        message: "<plugin> element is missing its required 'name' attribute".to_string(),
    })?;

    Ok(ParsedSpec {
        name,
        version,
        description,
        category,
        dependencies,
    })
}
