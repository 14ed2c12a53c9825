//! Project configuration file (`config.xml`) reader.
//!
//! Only the handful of elements the hooks depend on are extracted; the rest of
//! the document is ignored.
use crate::context::Platform;
use anyhow::{anyhow, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;

const UNIVERSAL_LINKS_TAG: &[u8] = b"universal-links";

/// Raw `<host>` element as declared in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHost {
    pub name: Option<String>,
    pub scheme: Option<String>,
    pub event: Option<String>,
    pub paths: Vec<RawPath>,
}

/// Raw `<path>` element nested in a `<host>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPath {
    pub url: Option<String>,
    pub event: Option<String>,
}

/// The parts of `config.xml` the hooks read.
#[derive(Debug, Clone, Default)]
pub struct ConfigXml {
    pub id: Option<String>,
    pub android_package: Option<String>,
    pub ios_bundle_id: Option<String>,
    pub name: Option<String>,
    /// `None` when the document has no `<universal-links>` element.
    pub universal_links: Option<Vec<RawHost>>,
}

impl ConfigXml {
    pub fn load(path: &Path) -> Result<Self> {
        let xml = crate::artifact::read_text(path)?;
        Self::parse(&xml).with_context(|| format!("parse {}", path.display()))
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut config = ConfigXml::default();
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut saw_root = false;

        loop {
            let event = reader.read_event().map_err(|err| {
                anyhow!(
                    "malformed XML near byte {}: {err}",
                    reader.buffer_position()
                )
            })?;
            match event {
                Event::Start(e) => {
                    config.open_element(&e, &stack, &mut saw_root)?;
                    stack.push(e.local_name().as_ref().to_vec());
                }
                Event::Empty(e) => {
                    config.open_element(&e, &stack, &mut saw_root)?;
                }
                Event::Text(text) => {
                    if is_widget_child(&stack, b"name") {
                        let value = text.unescape()?;
                        config.name = Some(value.trim().to_string());
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Eof => {
                    if let Some(open) = stack.last() {
                        return Err(anyhow!(
                            "config.xml ends inside <{}>",
                            String::from_utf8_lossy(open)
                        ));
                    }
                    break;
                }
                _ => {}
            }
        }

        if !saw_root {
            return Err(anyhow!("config.xml has no root element"));
        }
        Ok(config)
    }

    fn open_element(
        &mut self,
        e: &BytesStart<'_>,
        stack: &[Vec<u8>],
        saw_root: &mut bool,
    ) -> Result<()> {
        let local = e.local_name();
        let name = local.as_ref();
        if stack.is_empty() {
            *saw_root = true;
            if name == b"widget" {
                self.id = attr(e, "id")?;
                self.android_package = attr(e, "android-packageName")?;
                self.ios_bundle_id = attr(e, "ios-CFBundleIdentifier")?;
            }
            return Ok(());
        }

        if name == UNIVERSAL_LINKS_TAG && is_widget_child(stack, b"") {
            self.universal_links.get_or_insert_with(Vec::new);
            return Ok(());
        }

        let parent = stack.last().map(Vec::as_slice);
        match (parent, name) {
            (Some(UNIVERSAL_LINKS_TAG), b"host") => {
                let hosts = self.universal_links.get_or_insert_with(Vec::new);
                hosts.push(RawHost {
                    name: attr(e, "name")?,
                    scheme: attr(e, "scheme")?,
                    event: attr(e, "event")?,
                    paths: Vec::new(),
                });
            }
            (Some(b"host"), b"path") if in_universal_links(stack) => {
                let path = RawPath {
                    url: attr(e, "url")?,
                    event: attr(e, "event")?,
                };
                if let Some(host) = self
                    .universal_links
                    .as_mut()
                    .and_then(|hosts| hosts.last_mut())
                {
                    host.paths.push(path);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Return the declared project display name.
    pub fn project_name(&self) -> Result<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("config.xml does not declare a <name>"))
    }

    /// Return the package identifier used for `platform`.
    pub fn package_name(&self, platform: &Platform) -> Option<&str> {
        let specific = match platform {
            Platform::Android => self.android_package.as_deref(),
            Platform::Ios => self.ios_bundle_id.as_deref(),
            Platform::Other(_) => None,
        };
        specific.or(self.id.as_deref())
    }
}

/// Return whether the innermost open element is `<widget><tag>`.
///
/// An empty `tag` asks whether the innermost open element is the root itself.
fn is_widget_child(stack: &[Vec<u8>], tag: &[u8]) -> bool {
    match stack {
        [root] if tag.is_empty() => root.as_slice() == b"widget",
        [root, child] => root.as_slice() == b"widget" && child.as_slice() == tag,
        _ => false,
    }
}

fn in_universal_links(stack: &[Vec<u8>]) -> bool {
    stack.len() >= 2 && stack[stack.len() - 2].as_slice() == UNIVERSAL_LINKS_TAG
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    let Some(attribute) = e.try_get_attribute(name)? else {
        return Ok(None);
    };
    let value = attribute.unescape_value()?;
    Ok(Some(value.trim().to_string()))
}
