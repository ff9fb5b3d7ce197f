//! Parser and serializer for the XML label template.
//!
//! `parse` turns a well-formed template document into the [`Element`] tree
//! defined in the parent module; `serialize` writes a tree back out as XML.
//! The tree mirrors what the template actually uses: every element carries its
//! attributes plus either leaf text or child elements grouped by tag, so
//! repeated sibling tags land under one key in first-occurrence order. Mixed
//! text-and-element content is rejected as malformed since label templates do
//! not contain it. The round-trip guarantee is tree-level: parsing the output
//! of `serialize` yields a tree equal to the one serialized, though
//! indentation and attribute quoting may differ from the input document.
//!
//! The XML prolog, comments and a DOCTYPE are accepted and skipped; they are
//! not reproduced by `serialize` beyond a fresh `<?xml ...?>` declaration.

use super::{Content, Element, LabelError};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>";
const INDENT: &str = "  ";

fn malformed(message: impl Into<String>) -> LabelError {
    LabelError::MalformedDocument(message.into())
}

/// Parses a template document.
///
/// The returned element is a synthetic container whose single child group is
/// the document's root tag, so a search over the result considers the root
/// element itself as well as everything below it.
pub fn parse(text: &str) -> Result<Element, LabelError> {
    let mut cursor = Cursor { src: text, pos: 0 };
    cursor.skip_misc()?;
    if cursor.peek() != Some(b'<') {
        return Err(malformed("expected a root element"));
    }
    let (tag, root) = cursor.parse_element()?;
    cursor.skip_misc()?;
    if !cursor.at_end() {
        return Err(malformed("unexpected content after the root element"));
    }
    Ok(Element {
        attributes: Vec::new(),
        content: Content::Children(vec![(tag, vec![root])]),
    })
}

/// Serializes a tree produced by [`parse`] (possibly mutated) back to XML.
pub fn serialize(document: &Element) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push('\n');
    if let Content::Children(groups) = &document.content {
        for (tag, elements) in groups {
            for element in elements {
                write_element(&mut out, tag, element, 0);
            }
        }
    }
    out
}

fn write_element(out: &mut String, tag: &str, element: &Element, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push('<');
    out.push_str(tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_into(out, value, true);
        out.push('"');
    }
    match &element.content {
        Content::Leaf(text) if text.is_empty() => out.push_str(" />\n"),
        Content::Leaf(text) => {
            out.push('>');
            escape_into(out, text, false);
            out.push_str("</");
            out.push_str(tag);
            out.push_str(">\n");
        }
        Content::Children(groups) => {
            out.push_str(">\n");
            for (child_tag, elements) in groups {
                for child in elements {
                    write_element(out, child_tag, child, depth + 1);
                }
            }
            for _ in 0..depth {
                out.push_str(INDENT);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push_str(">\n");
        }
    }
}

fn escape_into(out: &mut String, raw: &str, in_attribute: bool) {
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

fn unescape(raw: &str) -> Result<String, LabelError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(i) = rest.find('&') {
        out.push_str(&rest[..i]);
        let after = &rest[i + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| malformed("unterminated entity reference"))?;
        let name = &after[..end];
        let ch = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| malformed(format!("unknown entity `&{};`", name)))?
            }
        };
        out.push(ch);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn looking_at(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    fn skip_ws(&mut self) {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Advances past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<(), LabelError> {
        match self.src[self.pos..].find(terminator) {
            Some(i) => {
                self.pos += i + terminator.len();
                Ok(())
            }
            None => Err(malformed(format!("unterminated {}", what))),
        }
    }

    /// Skips whitespace, the XML declaration, comments and a DOCTYPE.
    fn skip_misc(&mut self) -> Result<(), LabelError> {
        loop {
            self.skip_ws();
            if self.looking_at("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if self.looking_at("<!--") {
                self.skip_past("-->", "comment")?;
            } else if self.looking_at("<!") {
                self.skip_past(">", "document type declaration")?;
            } else {
                return Ok(());
            }
        }
    }

    /// Reads a tag or attribute name. The terminating characters are all
    /// ASCII, so scanning bytes is safe for multi-byte names.
    fn read_name(&mut self) -> Result<&'a str, LabelError> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len()
            && !matches!(bytes[self.pos], b' ' | b'\t' | b'\r' | b'\n' | b'>' | b'/' | b'=' | b'<' | b'"' | b'\'')
        {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(malformed("expected a name"));
        }
        Ok(&self.src[start..self.pos])
    }

    /// Parses one element, with the cursor on its opening `<`.
    fn parse_element(&mut self) -> Result<(String, Element), LabelError> {
        self.pos += 1; // consume '<'
        let tag = self.read_name()?.to_string();
        let attributes = self.parse_attributes(&tag)?;

        if self.looking_at("/>") {
            self.pos += 2;
            return Ok((
                tag,
                Element {
                    attributes,
                    content: Content::Leaf(String::new()),
                },
            ));
        }
        self.pos += 1; // consume '>'

        let mut text = String::new();
        let mut groups: Vec<(String, Vec<Element>)> = Vec::new();
        loop {
            let chunk_start = self.pos;
            while self.peek().map(|b| b != b'<').unwrap_or(false) {
                self.pos += 1;
            }
            text.push_str(&unescape(&self.src[chunk_start..self.pos])?);

            if self.at_end() {
                return Err(malformed(format!("unclosed element `<{}>`", tag)));
            }
            if self.looking_at("<!--") {
                self.skip_past("-->", "comment")?;
                continue;
            }
            if self.looking_at("</") {
                self.pos += 2;
                let closing = self.read_name()?;
                if closing != tag {
                    return Err(malformed(format!(
                        "mismatched closing tag `</{}>`, expected `</{}>`",
                        closing, tag
                    )));
                }
                self.skip_ws();
                if self.peek() != Some(b'>') {
                    return Err(malformed(format!("malformed closing tag `</{}>`", tag)));
                }
                self.pos += 1;
                break;
            }
            let (child_tag, child) = self.parse_element()?;
            push_grouped(&mut groups, child_tag, child);
        }

        let content = if groups.is_empty() {
            Content::Leaf(text.trim().to_string())
        } else if text.trim().is_empty() {
            Content::Children(groups)
        } else {
            return Err(malformed(format!(
                "element `<{}>` mixes text and child elements",
                tag
            )));
        };

        Ok((tag, Element { attributes, content }))
    }

    /// Parses attributes up to (but not past) `>` or `/>`.
    fn parse_attributes(&mut self, tag: &str) -> Result<Vec<(String, String)>, LabelError> {
        let mut attributes = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'>') => return Ok(attributes),
                Some(b'/') if self.looking_at("/>") => return Ok(attributes),
                Some(_) => {}
                None => {
                    return Err(malformed(format!("unclosed start tag `<{}`", tag)));
                }
            }
            let name = self.read_name()?.to_string();
            self.skip_ws();
            if self.peek() != Some(b'=') {
                return Err(malformed(format!(
                    "attribute `{}` of `<{}>` has no value",
                    name, tag
                )));
            }
            self.pos += 1;
            self.skip_ws();
            let quote = match self.peek() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => {
                    return Err(malformed(format!(
                        "attribute `{}` of `<{}>` has an unquoted value",
                        name, tag
                    )));
                }
            };
            self.pos += 1;
            let value_start = self.pos;
            while self.peek().map(|b| b != quote).unwrap_or(false) {
                self.pos += 1;
            }
            if self.at_end() {
                return Err(malformed(format!(
                    "unterminated value for attribute `{}` of `<{}>`",
                    name, tag
                )));
            }
            let value = unescape(&self.src[value_start..self.pos])?;
            self.pos += 1;
            attributes.push((name, value));
        }
    }
}

fn push_grouped(groups: &mut Vec<(String, Vec<Element>)>, tag: String, element: Element) {
    match groups.iter_mut().find(|(existing, _)| *existing == tag) {
        Some((_, elements)) => elements.push(element),
        None => groups.push((tag, vec![element])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<DieCutLabel Version="8.0" Units="twips">
  <PaperOrientation>Landscape</PaperOrientation>
  <Id>Address</Id>
  <ObjectInfo>
    <TextObject>
      <Name>Text</Name>
      <Text>Job details</Text>
    </TextObject>
    <Bounds X="332" Y="150" Width="4455" Height="1260" />
  </ObjectInfo>
  <ObjectInfo>
    <QRCodeObject>
      <Name>QRCode</Name>
      <Data>
        <DataString>placeholder</DataString>
      </Data>
      <WebAddressDataHolder>
        <DataString>placeholder</DataString>
      </WebAddressDataHolder>
    </QRCodeObject>
  </ObjectInfo>
</DieCutLabel>
"#;

    #[test]
    fn round_trip_is_a_tree_fixed_point() {
        let tree = parse(TEMPLATE).unwrap();
        let reparsed = parse(&serialize(&tree)).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn repeated_sibling_tags_group_under_one_key() {
        let tree = parse(TEMPLATE).unwrap();
        let root = &tree.child_group("DieCutLabel").unwrap()[0];
        let infos = root.child_group("ObjectInfo").unwrap();
        assert_eq!(infos.len(), 2);
    }

    #[test]
    fn attributes_survive_in_document_order() {
        let tree = parse(TEMPLATE).unwrap();
        let root = &tree.child_group("DieCutLabel").unwrap()[0];
        assert_eq!(
            root.attributes,
            vec![
                ("Version".to_string(), "8.0".to_string()),
                ("Units".to_string(), "twips".to_string()),
            ]
        );
    }

    #[test]
    fn leaf_text_is_trimmed_of_surrounding_whitespace() {
        let tree = parse("<A>\n   spaced out   \n</A>").unwrap();
        assert_eq!(tree.child_group("A").unwrap()[0].leaf(), Some("spaced out"));
    }

    #[test]
    fn entities_decode_on_parse_and_re_encode_on_serialize() {
        let doc = "<A>size=100x100&amp;data=x</A>";
        let tree = parse(doc).unwrap();
        assert_eq!(
            tree.child_group("A").unwrap()[0].leaf(),
            Some("size=100x100&data=x")
        );
        let out = serialize(&tree);
        assert!(out.contains("size=100x100&amp;data=x"));
        assert_eq!(tree, parse(&out).unwrap());
    }

    #[test]
    fn self_closing_and_empty_elements_are_equivalent_leaves() {
        let a = parse("<R><E /></R>").unwrap();
        let b = parse("<R><E></E></R>").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        let doc = "<?xml version=\"1.0\"?>\n<!DOCTYPE label>\n<!-- header -->\n<R><A>1</A><!-- inline --></R>\n";
        let tree = parse(doc).unwrap();
        assert_eq!(tree.child_group("R").unwrap()[0].child_group("A").unwrap()[0].leaf(), Some("1"));
    }

    #[test]
    fn mismatched_closing_tag_is_malformed() {
        let err = parse("<A><B></A></B>").unwrap_err();
        assert!(matches!(err, LabelError::MalformedDocument(_)));
    }

    #[test]
    fn unclosed_element_is_malformed() {
        assert!(matches!(
            parse("<A><B>text</B>"),
            Err(LabelError::MalformedDocument(_))
        ));
    }

    #[test]
    fn trailing_content_is_malformed() {
        assert!(matches!(
            parse("<A>1</A>stray"),
            Err(LabelError::MalformedDocument(_))
        ));
    }

    #[test]
    fn mixed_text_and_elements_are_malformed() {
        assert!(matches!(
            parse("<A>text<B>1</B></A>"),
            Err(LabelError::MalformedDocument(_))
        ));
    }

    #[test]
    fn plain_text_is_not_a_document() {
        assert!(matches!(
            parse("just some text"),
            Err(LabelError::MalformedDocument(_))
        ));
    }
}
