//! Unquoted multi-token runs read as strings with embedded references.
use super::Parser;
use super::reference::reference_end;
use crate::ast::{Expression, Fragment, Interpolation};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{Token, TokenKind};
use std::rc::Rc;

impl Parser<'_> {
    /// Keeps the source spacing between tokens. Gaps spanning a line break
    /// collapse to one space; quoted strings contribute their unescaped value.
    pub(crate) fn interpolation(&self, tokens: &[Token]) -> Result<Rc<Expression>, JelError> {
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut previous_end: Option<usize> = None;
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if token.is_trivia() {
                i += 1;
                continue;
            }
            let span = token.span();
            if let Some(end) = previous_end {
                let gap = self.source.get(end..span.start).unwrap_or("");
                if gap.contains('\n') || gap.contains("//") || gap.contains("/*") || gap.contains('#') {
                    text.push(' ');
                } else {
                    text.push_str(gap);
                }
            }
            if let Some(end) = reference_end(tokens, i) {
                if !text.is_empty() {
                    parts.push(Fragment::Text(std::mem::take(&mut text)));
                }
                let path = self.reference(&tokens[i..end])?;
                previous_end = Some(path.span().end);
                parts.push(Fragment::Reference(path));
                i = end;
                continue;
            }
            match token {
                Token::Leaf(leaf) if leaf.kind == TokenKind::String => text.push_str(&leaf.value),
                Token::Leaf(leaf) => text.push_str(&leaf.text),
                Token::Container(container) => text.push_str(self.text(container.span)),
            }
            previous_end = Some(span.end);
            i += 1;
        }
        if !text.is_empty() {
            parts.push(Fragment::Text(text));
        }
        Ok(Rc::new(Expression::Interpolation(Interpolation {
            parts,
            sequence: Sequence::primitive(SequenceKind::Interpolation, tokens.to_vec()),
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, Fragment};
    use crate::parser::parse;

    fn parts(source: &str) -> Vec<String> {
        let document = parse(source).unwrap();
        let Expression::Interpolation(interpolation) = document.root.as_ref() else {
            panic!("expected interpolation, got {:?}", document.root);
        };
        interpolation
            .parts
            .iter()
            .map(|part| match part {
                Fragment::Text(text) => text.clone(),
                Fragment::Reference(path) => format!("<{}>", path.text),
            })
            .collect()
    }

    #[test]
    fn test_spacing_is_preserved() {
        assert_eq!(parts("Hello   $who.name; welcome"), vec!["Hello   ", "<$who.name>", "; welcome"]);
    }

    #[test]
    fn test_quoted_pieces_are_unescaped() {
        assert_eq!(parts("\"a\\tb\" $x"), vec!["a\tb ", "<$x>"]);
    }

    #[test]
    fn test_words_and_numbers() {
        assert_eq!(parts("5 apples"), vec!["5 apples"]);
        assert_eq!(parts("v1.2-beta"), vec!["v1.2-beta"]);
    }
}
