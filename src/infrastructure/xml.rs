//! Markup codec between text and [`Document`]
//!
//! Prolog items, comments, CDATA and whitespace text are kept as nodes, so a
//! document that is parsed and serialized unchanged keeps its content.

use std::io::Write;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::{debug, instrument};

use crate::domain::{Document, DomainError, DomainResult, Element, NodeData, NodeId};
use crate::infrastructure::{InfraError, InfraResult};

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn element(start: &BytesStart<'_>) -> DomainResult<Element> {
    let mut element = Element::new(lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DomainError::malformed(format!("attribute: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| DomainError::malformed(format!("attribute value: {e}")))?;
        element
            .attributes
            .push((lossy(attr.key.as_ref()), value.into_owned()));
    }
    Ok(element)
}

/// Parse markup text into a document.
///
/// # Errors
/// `MalformedDocument` for syntax errors, unbalanced tags, text outside the
/// root element or more than one root element.
#[instrument(level = "debug", skip(content), fields(len = content.len()))]
pub fn parse(content: &str) -> DomainResult<Document> {
    let mut reader = Reader::from_str(content);
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.document_node()];

    loop {
        let event = reader.read_event().map_err(|e| {
            DomainError::malformed(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;
        let parent = *stack.last().ok_or_else(|| DomainError::malformed("unbalanced tags"))?;
        let at_top = stack.len() == 1;

        let data = match event {
            Event::Start(start) => {
                if at_top && doc.document_element().is_some() {
                    return Err(DomainError::malformed("more than one root element"));
                }
                let node = doc.create(NodeData::Element(element(&start)?));
                doc.append_child(parent, node)?;
                stack.push(node);
                continue;
            }
            Event::Empty(start) => {
                if at_top && doc.document_element().is_some() {
                    return Err(DomainError::malformed("more than one root element"));
                }
                NodeData::Element(element(&start)?)
            }
            Event::End(_) => {
                stack.pop();
                continue;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| DomainError::malformed(format!("text: {e}")))?;
                if at_top && !text.trim().is_empty() {
                    return Err(DomainError::malformed("text outside the root element"));
                }
                NodeData::Text(text.into_owned())
            }
            Event::CData(cdata) => NodeData::CData(lossy(&cdata.into_inner())),
            Event::Comment(comment) => NodeData::Comment(lossy(&comment)),
            Event::Decl(decl) => NodeData::Declaration(lossy(&decl)),
            Event::PI(pi) => NodeData::ProcessingInstruction(lossy(&pi)),
            Event::DocType(doctype) => NodeData::DocType(lossy(&doctype)),
            Event::Eof => break,
        };
        let node = doc.create(data);
        doc.append_child(parent, node)?;
    }

    if stack.len() != 1 {
        return Err(DomainError::malformed("unexpected end of document"));
    }
    if doc.document_element().is_none() {
        return Err(DomainError::malformed("no root element"));
    }
    debug!("parsed {} nodes", doc.len());
    Ok(doc)
}

fn xml_err(e: impl std::fmt::Display) -> InfraError {
    InfraError::Xml {
        message: e.to_string(),
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, doc: &Document, id: NodeId) -> InfraResult<()> {
    let Some(data) = doc.data(id) else {
        return Ok(());
    };
    match data {
        NodeData::Document => {
            for &child in doc.children(id) {
                write_node(writer, doc, child)?;
            }
        }
        NodeData::Element(element) => {
            let start = BytesStart::new(element.tag.as_str()).with_attributes(
                element
                    .attributes
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            );
            let children = doc.children(id);
            if children.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(xml_err)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                for &child in children {
                    write_node(writer, doc, child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(element.tag.as_str())))
                    .map_err(xml_err)?;
            }
        }
        NodeData::Text(text) => {
            let escaped = partial_escape(text.as_str());
            writer
                .write_event(Event::Text(BytesText::from_escaped(escaped)))
                .map_err(xml_err)?;
        }
        NodeData::CData(text) => {
            writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(xml_err)?;
        }
        NodeData::Comment(text) => write_raw(writer, "<!--", text, "-->")?,
        NodeData::Declaration(text) | NodeData::ProcessingInstruction(text) => {
            write_raw(writer, "<?", text, "?>")?
        }
        NodeData::DocType(text) => write_raw(writer, "<!DOCTYPE ", text, ">")?,
    }
    Ok(())
}

fn write_raw<W: Write>(writer: &mut Writer<W>, open: &str, body: &str, close: &str) -> InfraResult<()> {
    let out = writer.get_mut();
    for part in [open, body, close] {
        out.write_all(part.as_bytes()).map_err(xml_err)?;
    }
    Ok(())
}

/// Serialize a document back to markup text.
pub fn serialize(doc: &Document) -> InfraResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_node(&mut writer, doc, doc.document_node())?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}
