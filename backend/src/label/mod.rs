//! In-memory representation of the label template, plus the search-and-patch
//! logic that fills the QR code field before the template is written back out.
//!
//! The template is an XML document (a DYMO `.label`/`.dymo` file). It is
//! parsed by [`codec`] into a tree of [`Element`]s, the QR code widget is
//! located by tag name with [`find_named_field`], its two data slots are
//! overwritten with [`set_qr_slots`], and the tree is serialized back to text.
//! The tree is owned by the request that parsed it, so patching mutates a
//! private copy and the template file on disk is never touched.

pub mod codec;

use thiserror::Error;

/// Tag of the element representing the QR code widget in the template.
pub const QR_FIELD_TAG: &str = "QRCodeObject";
/// The two children of the QR field that each hold a writable `DataString`.
pub const DATA_SLOT: &str = "Data";
pub const WEB_ADDRESS_SLOT: &str = "WebAddressDataHolder";
/// Leaf element under each slot holding the actual text value.
const DATA_STRING_TAG: &str = "DataString";

#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("label template is not well-formed XML: {0}")]
    MalformedDocument(String),
    #[error("QR code field has no `{0}` slot")]
    MissingSlot(&'static str),
}

/// What an element contains: either leaf text or child elements.
///
/// Children are grouped by tag in first-occurrence order, so repeated sibling
/// tags share one entry. An empty element is a leaf with an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Leaf(String),
    Children(Vec<(String, Vec<Element>)>),
}

/// One element of the parsed template tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    pub content: Content,
}

impl Element {
    /// An element with no attributes and empty leaf text.
    pub fn empty() -> Self {
        Element {
            attributes: Vec::new(),
            content: Content::Leaf(String::new()),
        }
    }

    /// All occurrences of the child tag `name`, if the tag appears at all.
    pub fn child_group(&self, name: &str) -> Option<&[Element]> {
        match &self.content {
            Content::Leaf(_) => None,
            Content::Children(groups) => groups
                .iter()
                .find(|(tag, _)| tag == name)
                .map(|(_, els)| els.as_slice()),
        }
    }

    /// Mutable access to the first occurrence of the child tag `name`.
    pub fn first_child_mut(&mut self, name: &str) -> Option<&mut Element> {
        match &mut self.content {
            Content::Leaf(_) => None,
            Content::Children(groups) => groups
                .iter_mut()
                .find(|(tag, _)| tag == name)
                .and_then(|(_, els)| els.first_mut()),
        }
    }

    /// Mutable access to the leaf text, if this element is a leaf.
    pub fn leaf_mut(&mut self) -> Option<&mut String> {
        match &mut self.content {
            Content::Leaf(text) => Some(text),
            Content::Children(_) => None,
        }
    }

    /// The leaf text, if this element is a leaf.
    pub fn leaf(&self) -> Option<&str> {
        match &self.content {
            Content::Leaf(text) => Some(text.as_str()),
            Content::Children(_) => None,
        }
    }
}

/// Depth-first search for the first element stored under the tag `name`.
///
/// At each node the direct children are checked for the tag before recursing,
/// and both checks walk the child groups in first-occurrence order. The first
/// match along that order wins; when the tag appears at several depths, the
/// shallowest one encountered is returned and deeper ones are never visited.
/// Uniqueness is not verified. Absence is an ordinary outcome: the function
/// returns `None` and never fails.
pub fn find_named_field<'a>(element: &'a mut Element, name: &str) -> Option<&'a mut Element> {
    let groups = match &mut element.content {
        Content::Leaf(_) => return None,
        Content::Children(groups) => groups,
    };

    if let Some(i) = groups.iter().position(|(tag, _)| tag == name) {
        return groups[i].1.first_mut();
    }

    for (_, els) in groups.iter_mut() {
        for child in els.iter_mut() {
            if let Some(found) = find_named_field(child, name) {
                return Some(found);
            }
        }
    }

    None
}

/// Overwrites both `DataString` values of a QR code field with `value`.
///
/// The field must carry a `Data` child and a `WebAddressDataHolder` child,
/// each containing a leaf `DataString`. Both slot paths are resolved before
/// anything is written: if either is missing the tree is left untouched and
/// `MissingSlot` names the absent one.
pub fn set_qr_slots(field: &mut Element, value: &str) -> Result<(), LabelError> {
    for slot in [DATA_SLOT, WEB_ADDRESS_SLOT] {
        if !slot_is_writable(field, slot) {
            return Err(LabelError::MissingSlot(slot));
        }
    }
    write_slot(field, DATA_SLOT, value);
    write_slot(field, WEB_ADDRESS_SLOT, value);
    Ok(())
}

fn slot_is_writable(field: &Element, slot: &str) -> bool {
    field
        .child_group(slot)
        .and_then(|els| els.first())
        .and_then(|el| el.child_group(DATA_STRING_TAG))
        .and_then(|els| els.first())
        .map(|el| el.leaf().is_some())
        .unwrap_or(false)
}

fn write_slot(field: &mut Element, slot: &str, value: &str) {
    // Checked by slot_is_writable; an unresolvable path is left alone.
    if let Some(text) = field
        .first_child_mut(slot)
        .and_then(|el| el.first_child_mut(DATA_STRING_TAG))
        .and_then(|el| el.leaf_mut())
    {
        *text = value.to_string();
    }
}
