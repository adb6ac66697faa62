//! HTML parsing support.
//!
//! The translator never parses markup itself. It asks an [`HtmlParser`] for a
//! [`Document`]. With the `html` feature, [`ScraperParser`] is the default
//! one.

#[cfg(feature = "html")]
use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Document;
#[cfg(feature = "html")]
use crate::node::NodeId;
use crate::Result;

/// Turns an HTML string into an element tree.
pub trait HtmlParser: Send + Sync {
    fn parse(&self, html: &str) -> Result<Document>;
}

/// Fragment parser backed by `scraper` (html5ever).
#[cfg(feature = "html")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ScraperParser;

#[cfg(feature = "html")]
impl HtmlParser for ScraperParser {
    fn parse(&self, html: &str) -> Result<Document> {
        Ok(parse_html(html))
    }
}

/// Parse an HTML string into a [`Document`].
///
/// The input is parsed as a body fragment; the wrapper element html5ever puts
/// around it is dropped, so top-level nodes become children of the root.
///
/// # Example
///
/// ```rust
/// use tagdown::parse_html;
///
/// let doc = parse_html("<h1>Hello <em>World</em></h1>");
/// let h1 = doc.root().children().next().unwrap();
/// assert_eq!(h1.tag_name(), "h1");
/// ```
#[cfg(feature = "html")]
pub fn parse_html(html: &str) -> Document {
    let fragment = Html::parse_fragment(html);
    let mut doc = Document::new();
    let root = doc.root_id();
    copy_children(fragment.root_element(), &mut doc, root);
    doc
}

/// Copy the children of a scraper element under `parent`.
#[cfg(feature = "html")]
fn copy_children(element: ElementRef<'_>, doc: &mut Document, parent: NodeId) {
    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                doc.append_text(parent, &text.text);
            }
            ScraperNode::Element(el) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let id = doc.append_element_with_attrs(parent, el.name(), el.attrs().collect());
                copy_children(child_element, doc, id);
            }
            _ => {}
        }
    }
}
