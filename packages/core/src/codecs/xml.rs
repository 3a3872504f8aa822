//! XML codec
//!
//! Document layout:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <graph>
//!   <nodes>
//!     <node id="1" type="claim">
//!       <label>Taxes should be lowered</label>
//!     </node>
//!   </nodes>
//!   <edges>
//!     <edge source="2" target="1">
//!       <label>supports</label>
//!       <label>cites</label>
//!     </edge>
//!   </edges>
//! </graph>
//! ```
//!
//! Identity and category fields are attributes; label text lives in child
//! elements, one `<label>` per edge label. Extra node fields are dropped.

use crate::codecs::{single_document, CodecError, Document, Format, GraphCodec};
use crate::models::{EntryKind, Graph};
use async_trait::async_trait;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use std::path::Path;

const INDENT_SIZE: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

#[async_trait]
impl GraphCodec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn decode(&self, documents: &[Document]) -> Result<Value, CodecError> {
        let document = single_document(Format::Xml, documents)?;
        let syntax = |message: &dyn std::fmt::Display| {
            CodecError::syntax(Format::Xml, &document.path, message)
        };

        let mut reader = Reader::from_reader(document.contents.as_slice());
        let mut builder = GraphBuilder::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(element)) => builder.open(&element).map_err(|e| syntax(&e))?,
                Ok(Event::Empty(element)) => {
                    builder.open(&element).map_err(|e| syntax(&e))?;
                    builder.close();
                }
                Ok(Event::End(_)) => builder.close(),
                Ok(Event::Text(text)) => builder.text(&text.unescape().map_err(|e| syntax(&e))?),
                Ok(Event::CData(data)) => {
                    builder.text(std::str::from_utf8(&data).map_err(|e| syntax(&e))?)
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(syntax(&format!(
                        "{} (at byte {})",
                        e,
                        reader.error_position()
                    )))
                }
            }
        }

        builder.finish().map_err(|e| syntax(&e))
    }

    fn encode(&self, graph: &Graph, path: &Path) -> Result<Vec<Document>, CodecError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

        emit(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
        )?;
        emit(&mut writer, Event::Start(BytesStart::new("graph")))?;

        emit(&mut writer, Event::Start(BytesStart::new("nodes")))?;
        for node in graph.nodes() {
            let mut element = BytesStart::new("node");
            element.push_attribute(("id", node.id.as_str()));
            element.push_attribute(("type", node.node_type.as_str()));
            emit(&mut writer, Event::Start(element))?;
            emit_label(&mut writer, &node.label)?;
            emit(&mut writer, Event::End(BytesEnd::new("node")))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("nodes")))?;

        emit(&mut writer, Event::Start(BytesStart::new("edges")))?;
        for edge in graph.edges() {
            let mut element = BytesStart::new("edge");
            element.push_attribute(("source", edge.source.as_str()));
            element.push_attribute(("target", edge.target.as_str()));
            emit(&mut writer, Event::Start(element))?;
            for label in &edge.label {
                emit_label(&mut writer, label)?;
            }
            emit(&mut writer, Event::End(BytesEnd::new("edge")))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("edges")))?;

        emit(&mut writer, Event::End(BytesEnd::new("graph")))?;

        let mut contents = writer.into_inner();
        contents.push(b'\n');
        Ok(vec![Document::new(path, contents)])
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CodecError> {
    writer
        .write_event(event)
        .map_err(|e| CodecError::encode(Format::Xml, e))
}

fn emit_label(writer: &mut Writer<Vec<u8>>, label: &str) -> Result<(), CodecError> {
    emit(writer, Event::Start(BytesStart::new("label")))?;
    emit(writer, Event::Text(BytesText::new(label)))?;
    emit(writer, Event::End(BytesEnd::new("label")))
}

/// Node or edge element being read
struct Entry {
    kind: EntryKind,
    fields: Map<String, Value>,
    labels: Vec<String>,
}

impl Entry {
    fn into_value(mut self) -> Value {
        match (self.kind, self.labels.len()) {
            (_, 0) => {}
            (EntryKind::Node, 1) => {
                let label = self.labels.remove(0);
                self.fields.insert("label".to_string(), Value::String(label));
            }
            _ => {
                let labels = self.labels.into_iter().map(Value::String).collect();
                self.fields.insert("label".to_string(), Value::Array(labels));
            }
        }
        Value::Object(self.fields)
    }
}

/// Collects the untyped graph from reader events.
///
/// Depth 0 is the root element, depth 1 the `nodes`/`edges` containers,
/// depth 2 the entries and depth 3 their `label` children. Anything else is
/// ignored.
#[derive(Default)]
struct GraphBuilder {
    depth: usize,
    saw_root: bool,
    section: Option<EntryKind>,
    nodes: Option<Vec<Value>>,
    edges: Option<Vec<Value>>,
    entry: Option<Entry>,
    label: Option<String>,
}

impl GraphBuilder {
    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
        let name = element.name();
        match (self.depth, name.as_ref()) {
            (0, _) => self.saw_root = true,
            (1, b"nodes") => {
                self.section = Some(EntryKind::Node);
                self.nodes.get_or_insert_with(Vec::new);
            }
            (1, b"edges") => {
                self.section = Some(EntryKind::Edge);
                self.edges.get_or_insert_with(Vec::new);
            }
            (2, b"node") if self.section == Some(EntryKind::Node) => {
                self.entry = Some(read_entry(element, EntryKind::Node, &["id", "type"])?);
            }
            (2, b"edge") if self.section == Some(EntryKind::Edge) => {
                self.entry = Some(read_entry(element, EntryKind::Edge, &["source", "target"])?);
            }
            (3, b"label") if self.entry.is_some() => self.label = Some(String::new()),
            _ => {}
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        match self.depth {
            3 => {
                if let (Some(label), Some(entry)) = (self.label.take(), self.entry.as_mut()) {
                    entry.labels.push(label);
                }
            }
            2 => {
                if let Some(entry) = self.entry.take() {
                    let collection = match entry.kind {
                        EntryKind::Node => self.nodes.get_or_insert_with(Vec::new),
                        EntryKind::Edge => self.edges.get_or_insert_with(Vec::new),
                    };
                    collection.push(entry.into_value());
                }
            }
            1 => self.section = None,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(label) = self.label.as_mut() {
            label.push_str(text);
        }
    }

    fn finish(self) -> Result<Value, String> {
        if !self.saw_root {
            return Err("document has no root element".to_string());
        }
        if self.depth != 0 {
            return Err("unexpected end of document inside an open element".to_string());
        }

        let mut graph = Map::new();
        if let Some(nodes) = self.nodes {
            graph.insert("nodes".to_string(), Value::Array(nodes));
        }
        if let Some(edges) = self.edges {
            graph.insert("edges".to_string(), Value::Array(edges));
        }
        Ok(Value::Object(graph))
    }
}

fn read_entry(
    element: &BytesStart<'_>,
    kind: EntryKind,
    attributes: &[&str],
) -> Result<Entry, quick_xml::Error> {
    let mut fields = Map::new();
    for attribute in element.attributes() {
        let attribute = attribute?;
        let key = attributes
            .iter()
            .find(|name| name.as_bytes() == attribute.key.as_ref());
        if let Some(key) = key {
            let value = attribute.unescape_value()?;
            fields.insert(key.to_string(), Value::String(value.into_owned()));
        }
    }
    Ok(Entry {
        kind,
        fields,
        labels: Vec::new(),
    })
}
