//! Comment-aware YAML node tree.
//!
//! Builds a small node tree from the `yaml-rust2` event stream. Every node
//! keeps its resolved tag and source position, and every mapping key keeps
//! the head comment written directly above it, which is what the
//! annotation parser reads.
pub mod comments;
pub mod tags;

use std::collections::HashMap;
use std::vec::IntoIter;
use std::iter::Peekable;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use comments::Preceding;

use crate::error::Error;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// 1-based source line.
    pub line: usize,
    /// 0-based source column.
    pub column: usize,
    /// Comment block directly above the node (mapping keys only).
    pub head_comment: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    pub value: String,
    /// Short tag form, e.g. `!!str`, `!!int`, or a custom `!tag`.
    pub tag: String,
}

impl Node {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.kind {
            NodeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.kind {
            NodeKind::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Scalar text, empty for collections.
    pub fn text(&self) -> &str {
        self.as_scalar().map(|s| s.value.as_str()).unwrap_or("")
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOADER
// ————————————————————————————————————————————————————————————————————————————

/// Parse the first document of `source` into a node tree.
pub fn load(source: &str) -> Result<Node, Error> {
    let mut collector = EventCollector::default();
    let mut parser = Parser::new(source.chars());
    parser.load(&mut collector, false)?;

    let lines = source.lines().collect::<Vec<_>>();
    let mut loader = Loader {
        events: collector.events.into_iter().peekable(),
        lines: &lines,
        anchors: HashMap::new(),
        preceding: Preceding::default(),
    };
    loader.document()
}

#[derive(Default)]
struct EventCollector {
    events: Vec<(Event, Marker)>,
}

impl MarkedEventReceiver for EventCollector {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        self.events.push((ev, mark));
    }
}

struct Loader<'a> {
    events: Peekable<IntoIter<(Event, Marker)>>,
    lines: &'a [&'a str],
    anchors: HashMap<usize, Node>,
    /// End of the most recently loaded scalar.
    preceding: Preceding,
}

impl Loader<'_> {
    fn document(&mut self) -> Result<Node, Error> {
        while let Some((event, _)) = self.events.peek() {
            match event {
                Event::StreamEnd => break,
                Event::Scalar(..) | Event::SequenceStart(..) | Event::MappingStart(..) | Event::Alias(_) => {
                    return self.node();
                }
                // stream/document markers
                _ => {
                    self.events.next();
                }
            }
        }
        Err(Error::Structural("document is empty, expected a mapping".to_string()))
    }

    fn next_event(&mut self) -> Result<(Event, Marker), Error> {
        self.events
            .next()
            .ok_or_else(|| Error::Structural("unexpected end of yaml event stream".to_string()))
    }

    fn at(&mut self, end: &Event) -> bool {
        matches!(self.events.peek(), Some((event, _)) if event == end)
    }

    fn node(&mut self) -> Result<Node, Error> {
        let (event, mark) = self.next_event()?;
        match event {
            Event::Scalar(value, style, anchor, tag) => {
                let tag = match tag {
                    Some(tag) => tags::normalize_explicit(&tag.handle, &tag.suffix),
                    None if style == TScalarStyle::Plain => tags::resolve_plain(&value).to_string(),
                    None => tags::STR.to_string(),
                };
                self.preceding = self.scalar_end(&value, style, &mark);
                let node = Node {
                    kind: NodeKind::Scalar(Scalar { value, tag }),
                    line: mark.line(),
                    column: mark.col(),
                    head_comment: String::new(),
                };
                Ok(self.anchor(anchor, node))
            }
            Event::SequenceStart(anchor, _) => {
                self.preceding.block_scalar = false;
                let mut items = Vec::new();
                while !self.at(&Event::SequenceEnd) {
                    items.push(self.node()?);
                }
                self.next_event()?;
                let node = Node {
                    kind: NodeKind::Sequence(items),
                    line: mark.line(),
                    column: mark.col(),
                    head_comment: String::new(),
                };
                Ok(self.anchor(anchor, node))
            }
            Event::MappingStart(anchor, _) => {
                self.preceding.block_scalar = false;
                let mut pairs = Vec::new();
                while !self.at(&Event::MappingEnd) {
                    let preceding = self.preceding;
                    let mut key = self.node()?;
                    if key.as_scalar().is_none() {
                        return Err(Error::Structural(format!(
                            "line {}: mapping keys must be scalars, found a {}",
                            key.line,
                            key.kind_name(),
                        )));
                    }
                    key.head_comment =
                        comments::head_comment(self.lines, key.line, key.column, preceding);
                    let value = self.node()?;
                    pairs.push((key, value));
                }
                self.next_event()?;
                let node = Node {
                    kind: NodeKind::Mapping(pairs),
                    line: mark.line(),
                    column: mark.col(),
                    head_comment: String::new(),
                };
                Ok(self.anchor(anchor, node))
            }
            Event::Alias(id) => {
                self.preceding = Preceding { floor: mark.line(), block_scalar: false };
                self.anchors.get(&id).cloned().ok_or_else(|| {
                    Error::Structural(format!("line {}: alias refers to an unknown anchor", mark.line()))
                })
            }
            other => Err(Error::Structural(format!(
                "line {}: unexpected yaml event {other:?}",
                mark.line()
            ))),
        }
    }

    /// Where a scalar starting at `mark` ends in the source.
    fn scalar_end(&self, value: &str, style: TScalarStyle, mark: &Marker) -> Preceding {
        let floor = match style {
            // an omitted value is reported at the next token's position
            TScalarStyle::Plain
                if value.is_empty() || (value == "~" && !self.source_at(mark).starts_with('~')) =>
            {
                return Preceding { block_scalar: false, ..self.preceding };
            }
            TScalarStyle::DoubleQuoted => comments::quoted_scalar_end(self.lines, mark.line(), mark.col(), '"'),
            TScalarStyle::SingleQuoted => comments::quoted_scalar_end(self.lines, mark.line(), mark.col(), '\''),
            _ => mark.line(),
        };
        let block_scalar = !matches!(
            style,
            TScalarStyle::Plain | TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted
        );
        Preceding { floor, block_scalar }
    }

    fn source_at(&self, mark: &Marker) -> String {
        let line = mark.line().checked_sub(1).and_then(|idx| self.lines.get(idx));
        line.map(|text| text.chars().skip(mark.col()).collect()).unwrap_or_default()
    }

    fn anchor(&mut self, anchor: usize, node: Node) -> Node {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        node
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
