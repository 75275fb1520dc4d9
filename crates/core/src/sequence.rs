//! Syntax nodes: every parsed construct keeps the tokens and sub-nodes it was
//! built from so errors and diagnostics can point back at the source.
use jel_lexer::{Span, Token};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Document,
    Null,
    Boolean,
    Number,
    String,
    Object,
    Array,
    Member,
    KeySegment,
    Key,
    Path,
    Pattern,
    Modifier,
    Parameters,
    Generator,
    Delegate,
    Reference,
    Component,
    Call,
    Tuple,
    Expansion,
    Arithmetic,
    Logical,
    Relation,
    Operator,
    Unary,
    Group,
    Interpolation,
    Conditional,
    Match,
    Branch,
    Template,
    Constant,
    Comment,
}

/// One child of a combined sequence.
#[derive(Debug, Clone)]
pub enum Element {
    Token(Token),
    Node(Rc<Sequence>),
}

impl Element {
    pub fn span(&self) -> Span {
        match self {
            Element::Token(token) => token.span(),
            Element::Node(node) => node.span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Children {
    /// Built directly from tokens.
    Primitive(Vec<Token>),
    /// Built from other sequences.
    Parent(Vec<Rc<Sequence>>),
    Combined(Vec<Element>),
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub kind: SequenceKind,
    pub span: Span,
    pub children: Children,
}

impl Sequence {
    pub fn primitive(kind: SequenceKind, tokens: Vec<Token>) -> Rc<Sequence> {
        let span = Span::covering(tokens.iter().map(Token::span)).unwrap_or_default();
        Self::build(kind, span, Children::Primitive(tokens))
    }

    pub fn parent(kind: SequenceKind, nodes: Vec<Rc<Sequence>>) -> Rc<Sequence> {
        let span = Span::covering(nodes.iter().map(|n| n.span)).unwrap_or_default();
        Self::build(kind, span, Children::Parent(nodes))
    }

    pub fn combined(kind: SequenceKind, elements: Vec<Element>) -> Rc<Sequence> {
        let span = Span::covering(elements.iter().map(Element::span)).unwrap_or_default();
        Self::build(kind, span, Children::Combined(elements))
    }

    /// A node whose extent is wider than its children, e.g. a delimited
    /// container whose braces are not kept as tokens.
    pub fn enclosed(kind: SequenceKind, span: Span, nodes: Vec<Rc<Sequence>>) -> Rc<Sequence> {
        Self::build(kind, span, Children::Parent(nodes))
    }

    /// A node without source tokens, for values produced at runtime.
    pub fn synthetic(kind: SequenceKind, span: Span) -> Rc<Sequence> {
        Self::build(kind, span, Children::Parent(Vec::new()))
    }

    fn build(kind: SequenceKind, span: Span, children: Children) -> Rc<Sequence> {
        let sequence = Sequence {
            kind,
            span,
            children,
        };
        debug_assert!(sequence.is_ordered(), "{:?} children out of source order", kind);
        Rc::new(sequence)
    }

    fn is_ordered(&self) -> bool {
        let starts: Vec<usize> = match &self.children {
            Children::Primitive(tokens) => tokens.iter().map(|t| t.span().start).collect(),
            Children::Parent(nodes) => nodes.iter().map(|n| n.span.start).collect(),
            Children::Combined(elements) => elements.iter().map(|e| e.span().start).collect(),
        };
        starts.windows(2).all(|pair| pair[0] <= pair[1])
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(&self.children, Children::Parent(nodes) if nodes.is_empty())
    }

    /// Spans of every significant token underneath this node, in source
    /// order. Nested containers contribute their whole extent.
    pub fn flatten(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        self.collect_spans(&mut spans);
        if spans.is_empty() && !self.span.is_empty() {
            spans.push(self.span);
        }
        spans
    }

    fn collect_spans(&self, spans: &mut Vec<Span>) {
        match &self.children {
            Children::Primitive(tokens) => {
                spans.extend(tokens.iter().filter(|t| !t.is_trivia()).map(Token::span))
            }
            Children::Parent(nodes) if nodes.is_empty() => spans.push(self.span),
            Children::Parent(nodes) => nodes.iter().for_each(|n| n.collect_spans(spans)),
            Children::Combined(elements) => {
                for element in elements {
                    match element {
                        Element::Token(token) if !token.is_trivia() => spans.push(token.span()),
                        Element::Token(_) => {}
                        Element::Node(node) => node.collect_spans(spans),
                    }
                }
            }
        }
    }

    /// The covered source text with whitespace between tokens normalized.
    pub fn describe(&self, source: &str) -> String {
        let mut out = String::new();
        let mut previous: Option<Span> = None;
        for span in self.flatten() {
            if previous.is_some_and(|prev| !prev.is_adjacent_to(&span)) {
                out.push(' ');
            }
            out.push_str(span.text(source));
            previous = Some(span);
        }
        out
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceKind::Document => "document",
            SequenceKind::Null => "null",
            SequenceKind::Boolean => "boolean",
            SequenceKind::Number => "number",
            SequenceKind::String => "string",
            SequenceKind::Object => "object",
            SequenceKind::Array => "array",
            SequenceKind::Member => "member",
            SequenceKind::KeySegment => "key segment",
            SequenceKind::Key => "key",
            SequenceKind::Path => "path",
            SequenceKind::Pattern => "destructuring pattern",
            SequenceKind::Modifier => "modifier",
            SequenceKind::Parameters => "parameter list",
            SequenceKind::Generator => "array generator",
            SequenceKind::Delegate => "delegate",
            SequenceKind::Reference => "reference",
            SequenceKind::Component => "path component",
            SequenceKind::Call => "call",
            SequenceKind::Tuple => "tuple",
            SequenceKind::Expansion => "expansion",
            SequenceKind::Arithmetic => "arithmetic expression",
            SequenceKind::Logical => "boolean expression",
            SequenceKind::Relation => "comparison",
            SequenceKind::Operator => "operator",
            SequenceKind::Unary => "unary operator",
            SequenceKind::Group => "group",
            SequenceKind::Interpolation => "string interpolation",
            SequenceKind::Conditional => "conditional",
            SequenceKind::Match => "match",
            SequenceKind::Branch => "branch",
            SequenceKind::Template => "template",
            SequenceKind::Constant => "constant",
            SequenceKind::Comment => "comment",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jel_lexer::tokenize;

    #[test]
    fn test_primitive_span_covers_tokens() {
        let tokens = tokenize("$a.b").unwrap();
        let sequence = Sequence::primitive(SequenceKind::Reference, tokens);
        assert_eq!((sequence.span.start, sequence.span.end), (0, 4));
        assert_eq!(sequence.flatten().len(), 4);
    }

    #[test]
    fn test_flatten_walks_nested_nodes_in_order() {
        let source = "1 + (2)";
        let tokens = tokenize(source).unwrap();
        let left = Sequence::primitive(SequenceKind::Number, vec![tokens[0].clone()]);
        let op = Sequence::primitive(SequenceKind::Operator, vec![tokens[1].clone()]);
        let group = Sequence::primitive(SequenceKind::Group, vec![tokens[2].clone()]);
        let expr = Sequence::parent(SequenceKind::Arithmetic, vec![left, op, group]);
        assert_eq!(expr.flatten().len(), 3);
        assert_eq!(expr.describe(source), "1 + (2)");
        assert_eq!((expr.span.start, expr.span.end), (0, 7));
    }

    #[test]
    fn test_synthetic_node_flattens_to_its_span() {
        let span = Span::new(3, 5, 1, 4, 1);
        let node = Sequence::synthetic(SequenceKind::Constant, span);
        assert!(node.is_synthetic());
        assert_eq!(node.flatten(), vec![span]);
    }
}
