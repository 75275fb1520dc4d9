//! Parenthesized lists: call arguments, generator sources, template
//! parameters and generator bindings.
use super::lookahead::{is_word, significant, split_runs, span_of};
use super::{Parser, ValueMode};
use crate::ast::{Bindings, Param, Tuple};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{ContainerToken, Token};

impl Parser<'_> {
    pub(crate) fn tuple(&self, container: &ContainerToken) -> Result<Tuple, JelError> {
        let items = split_runs(&container.children)?
            .into_iter()
            .map(|run| self.value(run.tokens, ValueMode::Default, run.span()))
            .collect::<Result<Vec<_>, _>>()?;
        let sequence = Sequence::enclosed(
            SequenceKind::Tuple,
            container.span,
            items.iter().map(|item| item.sequence().clone()).collect(),
        );
        Ok(Tuple { items, sequence })
    }

    /// `(a, $b)`: names, each optionally written with its `$`.
    pub(crate) fn params(&self, container: &ContainerToken) -> Result<Vec<Param>, JelError> {
        let mut params: Vec<Param> = Vec::new();
        for run in split_runs(&container.children)? {
            let param = param(run.tokens)?;
            if let Some(previous) = params.iter().find(|p| p.name == param.name) {
                return Err(JelError::syntax(format!("duplicate parameter '{}'", param.name), param.span)
                    .with_span(previous.span));
            }
            params.push(param);
        }
        Ok(params)
    }

    /// `[value]` or `[value, index]` of an array generator.
    pub(crate) fn bindings(&self, container: &ContainerToken) -> Result<Bindings, JelError> {
        let mut params = self.params(container)?.into_iter();
        match (params.next(), params.next(), params.next()) {
            (Some(value), index, None) => Ok(Bindings { value, index }),
            _ => Err(JelError::syntax(
                "a generator binds a value and an optional index",
                container.span,
            )),
        }
    }
}

fn param(tokens: &[Token]) -> Result<Param, JelError> {
    let parts: Vec<&Token> = significant(tokens).collect();
    let name = match parts.as_slice() {
        [name] if is_word(name) => *name,
        [dollar, name] if dollar.is_symbol("$") && is_word(name) => *name,
        _ => return Err(JelError::syntax("expected a parameter name", span_of(tokens))),
    };
    Ok(Param {
        name: name.text().to_string(),
        span: span_of(tokens),
    })
}

#[cfg(test)]
mod tests {
    use crate::ast::{Expression, ModifierKind};
    use crate::parser::parse;

    fn first_modifier(source: &str) -> ModifierKind {
        match parse(source).unwrap().root.as_ref() {
            Expression::Object(object) => object.members[0].modifiers[0].kind.clone(),
            Expression::Array(array) => array.members[0].modifiers[0].kind.clone(),
            other => panic!("unexpected root {:?}", other),
        }
    }

    #[test]
    fn test_params_accept_dollar_names() {
        match first_modifier("{ f ($a, b): 1 }") {
            ModifierKind::Template { params, .. } => {
                let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected template, got {:?}", other),
        }
    }

    #[test]
    fn test_generator_sources_are_a_tuple() {
        match first_modifier("[ [v, i] ($xs.., 4, 5): $v ]") {
            ModifierKind::Generator { bindings, sources } => {
                assert_eq!(bindings.value.name, "v");
                assert_eq!(bindings.index.map(|p| p.name), Some("i".to_string()));
                assert_eq!(sources.items.len(), 3);
                assert!(sources.items[0].is_expansion());
            }
            other => panic!("expected generator, got {:?}", other),
        }
    }

    #[test]
    fn test_parameter_errors() {
        assert_eq!(
            parse("{ f (a, a): 1 }").unwrap_err().message,
            "duplicate parameter 'a'"
        );
        assert_eq!(
            parse("[ [a, b, c] ($x): 1 ]").unwrap_err().message,
            "a generator binds a value and an optional index"
        );
        assert_eq!(parse("{ f (1): 1 }").unwrap_err().message, "expected a parameter name");
    }
}
