//! Read-only element tree of an XML response
//!
//! [`ParsedDocument`] owns a copy of the document produced by libxml2. Child
//! order is document order. Nothing here mutates the tree after it is built;
//! callers that need converted values collect them into their own lists.

use crate::error::Result;
use crate::libxml2::LibXml2Wrapper;

/// A single XML element with its attributes, leading text and child elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub(crate) fn new(
        tag: String,
        attributes: Vec<(String, String)>,
        text: Option<String>,
        children: Vec<Element>,
    ) -> Self {
        Self {
            tag,
            attributes,
            text,
            children,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute value by name
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Character data before the first child element; `None` when empty
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Direct child elements
    pub fn children(&self) -> std::slice::Iter<'_, Element> {
        self.children.iter()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// This element and all its descendants named `tag`, in document order
    pub fn iter<'a>(&'a self, tag: &'a str) -> Iter<'a> {
        Iter {
            stack: vec![self],
            tag,
        }
    }

    /// Descendant elements with no element children, in document order
    pub fn leaves(&self) -> impl Iterator<Item = &Element> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
        .filter(|element| element.is_leaf())
    }
}

/// Pre-order traversal filtered by tag name
pub struct Iter<'a> {
    stack: Vec<&'a Element>,
    tag: &'a str,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(element) = self.stack.pop() {
            self.stack.extend(element.children.iter().rev());
            if element.tag == self.tag {
                return Some(element);
            }
        }
        None
    }
}

struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// A parsed XML response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    root: Element,
}

impl ParsedDocument {
    /// Parse raw response bytes
    ///
    /// # Errors
    ///
    /// `ConformanceError::MalformedDocument` when the bytes are not well-formed XML.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = LibXml2Wrapper::new().read_element_tree(bytes)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Element {
        &self.root
    }
}
