//! A minimal element tree with source lines, read with `quick-xml`.
//!
//! The markup decoder works top-down and searches children by tag, so the
//! whole document is materialized first. Only what the decoder needs is
//! kept: the resolved namespace, the tag as written, the starting line, the
//! character data and the child elements. Comments, processing
//! instructions and attributes other than namespace declarations are
//! dropped; whitespace between child elements is ignored.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::{Error, ErrorKind, Result};

/// The AAS 3.0 markup namespace.
pub const AAS_NAMESPACE: &str = "https://admin-shell.io/aas/3/0";

/// One element of the parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    /// In the AAS namespace.
    pub(crate) aas: bool,
    /// Qualified name as written, e.g. `aas:submodel`.
    pub(crate) name: String,
    /// Local name.
    pub(crate) local: String,
    /// Line of the start tag, 1-based.
    pub(crate) line: usize,
    /// Character data directly inside this element.
    pub(crate) text: String,
    /// Child elements in document order.
    pub(crate) children: Vec<Element>,
}

impl Element {
    /// `aas:property on line 12`
    pub(crate) fn label(&self) -> String {
        format!("{} on line {}", self.name, self.line)
    }

    /// True for an AAS element with this local name.
    pub(crate) fn is(&self, tag: &str) -> bool {
        self.aas && self.local == tag
    }

    /// The first AAS child with the given local name.
    pub(crate) fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.is(tag))
    }

    pub(crate) fn require(&self, tag: &str) -> Result<&Element> {
        self.child(tag)
            .ok_or_else(|| Error::missing_child(&self.label(), &format!("aas:{tag}")))
    }

    /// Character data, or `None` for an empty element.
    pub(crate) fn text(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    pub(crate) fn require_text(&self) -> Result<&str> {
        self.text().ok_or_else(|| {
            Error::new(
                ErrorKind::MissingRequiredChild,
                format!("{} has no text!", self.label()),
            )
        })
    }
}

/// Tracks line numbers as the reader advances through `source`.
struct Lines<'s> {
    source: &'s str,
    scanned: usize,
    line: usize,
}

impl<'s> Lines<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            scanned: 0,
            line: 1,
        }
    }

    /// Line of the tag that ends right before byte offset `end`.
    fn tag_line(&mut self, end: usize) -> usize {
        let end = end.min(self.source.len());
        let start = self.source[..end].rfind('<').unwrap_or(end).max(self.scanned);
        self.advance(start)
    }

    fn advance(&mut self, to: usize) -> usize {
        if to > self.scanned {
            self.line += self.source[self.scanned..to].matches('\n').count();
            self.scanned = to;
        }
        self.line
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::malformed(e.to_string()).with_source(e))
}

fn open(
    stack: &mut Vec<Element>,
    aas: bool,
    start: &quick_xml::events::BytesStart<'_>,
    line: usize,
    max_depth: usize,
) -> Result<()> {
    if stack.len() >= max_depth {
        return Err(Error::malformed(format!(
            "nesting depth exceeds the limit of {max_depth}"
        )));
    }
    stack.push(Element {
        aas,
        name: utf8(start.name().as_ref())?,
        local: utf8(start.local_name().as_ref())?,
        line,
        text: String::new(),
        children: Vec::new(),
    });
    Ok(())
}

/// Closes the innermost open element; returns it if it was the root.
fn close(stack: &mut Vec<Element>) -> Option<Element> {
    let mut element = stack.pop()?;
    if !element.children.is_empty() {
        // indentation between children
        element.text.clear();
    }
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

/// Parses `source` into its root element.
///
/// Fails with `MalformedDocument` on syntax errors, on elements nested
/// deeper than `max_depth` and on documents without a root element.
pub(crate) fn parse(source: &str, max_depth: usize) -> Result<Element> {
    let mut reader = NsReader::from_str(source);
    let mut lines = Lines::new(source);
    let mut stack: Vec<Element> = Vec::new();
    let position = |reader: &NsReader<&[u8]>| {
        usize::try_from(reader.buffer_position()).unwrap_or(source.len())
    };
    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok(resolved) => resolved,
            Err(err) => {
                let line = lines.advance(position(&reader));
                return Err(Error::from(err).context(format!("while reading line {line}")));
            }
        };
        let aas = matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == AAS_NAMESPACE.as_bytes());
        match event {
            Event::Start(start) => {
                let line = lines.tag_line(position(&reader));
                open(&mut stack, aas, &start, line, max_depth)?;
            }
            Event::Empty(start) => {
                let line = lines.tag_line(position(&reader));
                open(&mut stack, aas, &start, line, max_depth)?;
                if let Some(root) = close(&mut stack) {
                    return Ok(root);
                }
            }
            Event::End(_) => {
                if let Some(root) = close(&mut stack) {
                    return Ok(root);
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| Error::malformed(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                let text = utf8(&data.into_inner())?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::Eof => {
                return Err(Error::malformed(match stack.last() {
                    Some(open) => format!("unexpected end of input inside {}", open.label()),
                    None => "document has no root element".to_owned(),
                }));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(r#"<aas:environment xmlns:aas="{AAS_NAMESPACE}">{body}</aas:environment>"#)
    }

    #[test]
    fn namespaces_and_lines() {
        let source = format!(
            "<?xml version=\"1.0\"?>\n<aas:environment xmlns:aas=\"{AAS_NAMESPACE}\">\n  <aas:submodels>\n    <other/>\n  </aas:submodels>\n</aas:environment>"
        );
        let root = parse(&source, 8).ok();
        let root = root.as_ref();
        assert_eq!(root.map(Element::label).as_deref(), Some("aas:environment on line 2"));
        let submodels = root.and_then(|r| r.child("submodels"));
        assert_eq!(submodels.map(|s| s.line), Some(3));
        let other = submodels.and_then(|s| s.children.first());
        assert_eq!(other.map(|o| (o.aas, o.line)), Some((false, 4)));
    }

    #[test]
    fn default_namespace_counts() {
        let source = format!(r#"<environment xmlns="{AAS_NAMESPACE}"><submodels/></environment>"#);
        let root = parse(&source, 8).ok();
        assert!(root.as_ref().is_some_and(|r| r.aas && r.child("submodels").is_some()));
    }

    #[test]
    fn text_is_unescaped() {
        let source = doc("<aas:value>a &amp; b</aas:value><aas:x><![CDATA[<raw>]]></aas:x>");
        let root = parse(&source, 8).ok();
        let root = root.as_ref();
        assert_eq!(root.and_then(|r| r.child("value")).and_then(Element::text), Some("a & b"));
        assert_eq!(root.and_then(|r| r.child("x")).and_then(Element::text), Some("<raw>"));
    }

    #[test]
    fn depth_is_bounded() {
        let source = doc("<aas:a><aas:b><aas:c/></aas:b></aas:a>");
        assert!(parse(&source, 4).is_ok());
        let err = parse(&source, 3).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument));
    }

    #[test]
    fn truncated_input_is_malformed() {
        let err = parse(&format!(r#"<aas:environment xmlns:aas="{AAS_NAMESPACE}">"#), 8).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedDocument));
    }
}
