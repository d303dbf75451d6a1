//! Response parsing and request body building.
//!
//! Responses are flattened into a list of [`Node`]s with parent links; the
//! parsers then match on local element/attribute names so namespace prefixes
//! never matter.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use prettysync_core::{
    ActivationMessage, ActivationResult, InactiveObject, Lock, MainProgram, ObjectDescriptor,
    TransportError,
};

#[derive(Debug)]
pub(crate) struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<usize>,
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

impl Node {
    fn is(&self, local_name: &str) -> bool {
        local(&self.name) == local_name
    }

    fn attr(&self, local_name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| local(k) == local_name)
            .map(|(_, v)| v.as_str())
    }

    fn attr_or_empty(&self, local_name: &str) -> String {
        self.attr(local_name).unwrap_or_default().to_string()
    }
}

fn xml_err(e: impl std::fmt::Display) -> TransportError {
    TransportError::Protocol(format!("invalid XML: {e}"))
}

fn push_node(
    nodes: &mut Vec<Node>,
    e: &BytesStart<'_>,
    parent: Option<usize>,
) -> Result<usize, TransportError> {
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        attrs.push((key, value));
    }
    nodes.push(Node {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attrs,
        text: String::new(),
        parent,
    });
    Ok(nodes.len() - 1)
}

pub(crate) fn parse_nodes(xml: &str) -> Result<Vec<Node>, TransportError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut nodes = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => {
                let idx = push_node(&mut nodes, &e, stack.last().copied())?;
                stack.push(idx);
            }
            Event::Empty(e) => {
                push_node(&mut nodes, &e, stack.last().copied())?;
            }
            Event::Text(t) => {
                if let Some(&idx) = stack.last() {
                    let text = t.unescape().map_err(xml_err)?;
                    nodes[idx].text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(&idx) = stack.last() {
                    nodes[idx]
                        .text
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(nodes)
}

fn is_within(nodes: &[Node], mut idx: usize, ancestor: usize) -> bool {
    while let Some(parent) = nodes[idx].parent {
        if parent == ancestor {
            return true;
        }
        idx = parent;
    }
    false
}

/// Text of the first descendant of `ancestor` named `local_name`.
fn descendant_text<'n>(nodes: &'n [Node], ancestor: usize, local_name: &str) -> Option<&'n str> {
    nodes
        .iter()
        .enumerate()
        .skip(ancestor + 1)
        .find(|(i, n)| n.is(local_name) && is_within(nodes, *i, ancestor))
        .map(|(_, n)| n.text.as_str())
}

fn first_text<'n>(nodes: &'n [Node], local_name: &str) -> Option<&'n str> {
    nodes
        .iter()
        .find(|n| n.is(local_name))
        .map(|n| n.text.trim())
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// `(category, message)` of an exception body, if it is one.
pub(crate) fn parse_exception(body: &str) -> Option<(String, String)> {
    let nodes = parse_nodes(body).ok()?;
    if !nodes.first()?.is("exception") {
        return None;
    }
    let category = nodes
        .iter()
        .find(|n| n.is("type"))
        .and_then(|n| n.attr("id"))
        .unwrap_or_default()
        .to_string();
    let message = first_text(&nodes, "localizedMessage")
        .filter(|m| !m.is_empty())
        .or_else(|| first_text(&nodes, "message"))
        .unwrap_or_default()
        .to_string();
    Some((category, message))
}

pub(crate) fn parse_lock(body: &str) -> Result<Lock, TransportError> {
    let nodes = parse_nodes(body)?;
    let non_empty = |name| first_text(&nodes, name).filter(|t| !t.is_empty());
    Ok(Lock {
        handle: non_empty("LOCK_HANDLE").map(str::to_string),
        is_local: non_empty("IS_LOCAL") == Some("X"),
        tracking_id: non_empty("CORRNR").map(str::to_string),
    })
}

pub(crate) fn parse_activation(body: &str) -> Result<ActivationResult, TransportError> {
    if body.trim().is_empty() {
        return Ok(ActivationResult::succeeded());
    }
    let nodes = parse_nodes(body)?;

    let messages: Vec<ActivationMessage> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is("msg"))
        .map(|(i, n)| ActivationMessage {
            severity: n.attr_or_empty("type"),
            text: descendant_text(&nodes, i, "txt")
                .unwrap_or_default()
                .trim()
                .to_string(),
        })
        .collect();

    let inactive = nodes
        .iter()
        .filter(|n| n.is("ref"))
        .filter(|n| n.parent.is_some_and(|p| nodes[p].is("object")))
        .map(|n| InactiveObject {
            object_type: n.attr_or_empty("type"),
            name: n.attr_or_empty("name"),
            url: n.attr_or_empty("uri"),
            parent_url: n.attr("parentUri").map(str::to_string),
        })
        .collect();

    Ok(ActivationResult {
        success: !messages.iter().any(ActivationMessage::is_error),
        messages,
        inactive,
    })
}

/// `adtcore:objectReference` entries as `(uri, type, name)`.
pub(crate) fn parse_object_references(
    body: &str,
) -> Result<Vec<(String, String, String)>, TransportError> {
    let nodes = parse_nodes(body)?;
    Ok(nodes
        .iter()
        .filter(|n| n.is("objectReference"))
        .map(|n| (n.attr_or_empty("uri"), n.attr_or_empty("type"), n.attr_or_empty("name")))
        .collect())
}

pub(crate) fn parse_main_programs(body: &str) -> Result<Vec<MainProgram>, TransportError> {
    Ok(parse_object_references(body)?
        .into_iter()
        .map(|(uri, _, name)| MainProgram { uri, name })
        .collect())
}

/// Object nodes of a node structure response.
pub(crate) fn parse_node_structure(body: &str) -> Result<Vec<ObjectDescriptor>, TransportError> {
    let nodes = parse_nodes(body)?;
    let mut objects = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if !node.is("SEU_ADT_REPOSITORY_OBJ_NODE") {
            continue;
        }
        let field = |name| {
            descendant_text(&nodes, i, name)
                .map(str::trim)
                .unwrap_or_default()
        };
        let (object_type, name, uri) = (field("OBJECT_TYPE"), field("OBJECT_NAME"), field("OBJECT_URI"));
        if object_type.is_empty() || name.is_empty() || uri.is_empty() {
            continue;
        }
        objects.push(ObjectDescriptor::new(object_type, name).with_url(uri));
    }
    Ok(objects)
}

/// Class includes as `(include kind, source uri relative to the class)`.
pub(crate) fn parse_class_includes(body: &str) -> Result<Vec<(String, String)>, TransportError> {
    let nodes = parse_nodes(body)?;
    Ok(nodes
        .iter()
        .filter(|n| n.is("include"))
        .filter_map(|n| {
            let kind = n.attr("includeType")?;
            let uri = n.attr("sourceUri")?;
            Some((kind.to_string(), uri.to_string()))
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// One entry of an activation request.
pub(crate) struct ActivationRef<'r> {
    pub uri: &'r str,
    pub name: &'r str,
    pub object_type: Option<&'r str>,
    pub parent_uri: Option<&'r str>,
}

pub(crate) fn activation_body(refs: &[ActivationRef<'_>]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><adtcore:objectReferences xmlns:adtcore="http://www.sap.com/adt/core">"#,
    );
    for r in refs {
        body.push_str(&format!(
            r#"<adtcore:objectReference adtcore:uri="{}" adtcore:name="{}""#,
            escape(r.uri),
            escape(r.name)
        ));
        if let Some(t) = r.object_type {
            body.push_str(&format!(r#" adtcore:type="{}""#, escape(t)));
        }
        if let Some(p) = r.parent_uri {
            body.push_str(&format!(r#" adtcore:parentUri="{}""#, escape(p)));
        }
        body.push_str("/>");
    }
    body.push_str("</adtcore:objectReferences>");
    body
}
