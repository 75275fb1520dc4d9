//! Members: key segments, modifier chains and alias resolution.
use super::lookahead::{Run, adjacent, find_symbol, is_word, next_significant, span_of, split_runs, trim};
use super::reference::reference_end;
use super::{Parser, ValueMode};
use crate::ast::{Alias, Condition, Key, MatchKey, Member, Modifier, ModifierChain, ModifierKind};
use crate::error::JelError;
use crate::sequence::{Sequence, SequenceKind};
use jel_lexer::{ContainerToken, Delimiter, Span, Token, TokenKind};
use std::rc::Rc;

/// Where a member is written; decides how its key segment is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberContext {
    Object,
    Array,
    Conditional,
    Match,
}

/// One syntactic item of a key segment.
enum Item<'t> {
    /// A bare word, or several adjacent words joined by `-`.
    Word(String, &'t [Token]),
    Literal(String, &'t Token),
    Path(&'t [Token]),
    Params(&'t ContainerToken, &'t Token),
    Generator(&'t ContainerToken, &'t ContainerToken, &'t [Token]),
    ObjectPattern(&'t ContainerToken),
    ArrayPattern(&'t ContainerToken),
}

impl Item<'_> {
    fn span(&self) -> Span {
        match self {
            Item::Word(_, tokens) | Item::Path(tokens) | Item::Generator(_, _, tokens) => span_of(tokens),
            Item::Literal(_, token) | Item::Params(_, token) => token.span(),
            Item::ObjectPattern(container) | Item::ArrayPattern(container) => container.span,
        }
    }

    fn keyword(&self) -> Option<ModifierKind> {
        match self {
            Item::Word(word, tokens) if tokens.len() == 1 => ModifierKind::from_keyword(word),
            _ => None,
        }
    }
}

struct KeySegment {
    chain: ModifierChain,
    alias: Option<Alias>,
    sequence: Rc<Sequence>,
}

impl Parser<'_> {
    pub(crate) fn members(&self, tokens: &[Token], context: MemberContext) -> Result<Vec<Member>, JelError> {
        split_runs(tokens)?
            .into_iter()
            .map(|run| self.member(run, context))
            .collect()
    }

    fn member(&self, run: Run<'_>, context: MemberContext) -> Result<Member, JelError> {
        let tokens = run.tokens;
        let Some(colon) = find_symbol(tokens, ":") else {
            if context == MemberContext::Array {
                let value = self.value(tokens, ValueMode::Default, run.span())?;
                let sequence = Sequence::parent(SequenceKind::Member, vec![value.sequence().clone()]);
                return Ok(Member::new(None, Vec::new(), value, run.format, sequence));
            }
            return Err(JelError::syntax("expected ':' after the key", run.span()));
        };
        let colon_span = tokens[colon].span();
        let key_tokens = trim(&tokens[..colon]);
        if key_tokens.is_empty() {
            return Err(JelError::syntax("missing key before ':'", colon_span));
        }

        let segment = match context {
            MemberContext::Object | MemberContext::Array => self.key_segment(key_tokens, context)?,
            MemberContext::Conditional | MemberContext::Match => self.branch_key(key_tokens, context)?,
        };
        let mode = ValueMode::from(segment.chain.forced_value());
        let value_tokens = &tokens[colon + 1..];
        if trim(value_tokens).is_empty() {
            return Err(JelError::syntax("missing value after ':'", colon_span));
        }
        let value = self.value(value_tokens, mode, colon_span)?;
        let sequence = Sequence::parent(SequenceKind::Member, vec![segment.sequence, value.sequence().clone()]);
        Ok(Member::new(
            segment.alias,
            segment.chain.resolve(),
            value,
            run.format,
            sequence,
        ))
    }

    fn items<'t>(&self, tokens: &'t [Token]) -> Result<Vec<Item<'t>>, JelError> {
        let mut items = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            if token.is_trivia() {
                i += 1;
                continue;
            }
            if let Some(end) = reference_end(tokens, i) {
                items.push(Item::Path(&tokens[i..end]));
                i = end;
                continue;
            }
            match token {
                Token::Leaf(leaf) if leaf.kind == TokenKind::Word => {
                    let end = dashed_word_end(tokens, i);
                    let word: String = tokens[i..end].iter().map(Token::text).collect();
                    items.push(Item::Word(word, &tokens[i..end]));
                    i = end;
                    continue;
                }
                Token::Leaf(leaf) if matches!(leaf.kind, TokenKind::String | TokenKind::Number) => {
                    items.push(Item::Literal(leaf.value.clone(), token));
                }
                Token::Container(container) => match container.delimiter {
                    Delimiter::Paren => items.push(Item::Params(container, token)),
                    Delimiter::Brace => items.push(Item::ObjectPattern(container)),
                    Delimiter::Bracket => {
                        let next = next_significant(tokens, i + 1);
                        match tokens.get(next).and_then(Token::as_container) {
                            Some(sources) if sources.delimiter == Delimiter::Paren => {
                                items.push(Item::Generator(container, sources, &tokens[i..=next]));
                                i = next + 1;
                                continue;
                            }
                            _ => items.push(Item::ArrayPattern(container)),
                        }
                    }
                },
                other => return Err(JelError::syntax(format!("unexpected {} in key", other), other.span())),
            }
            i += 1;
        }
        Ok(items)
    }

    fn key_segment(&self, tokens: &[Token], context: MemberContext) -> Result<KeySegment, JelError> {
        let items = self.items(tokens)?;

        // The alias is the last item before any trailing parameter lists.
        let mut params_start = items.len();
        while params_start > 0 && matches!(items[params_start - 1], Item::Params(..)) {
            params_start -= 1;
        }
        let wants_path = items.iter().any(|item| {
            matches!(
                item.keyword(),
                Some(ModifierKind::Add | ModifierKind::Set | ModifierKind::Merge | ModifierKind::Defaults)
            )
        });
        let alias_index = params_start.checked_sub(1).filter(|&i| match &items[i] {
            Item::Word(..) => !items[i].keyword().is_some_and(|k| k.allows_absent_alias()),
            Item::Literal(..) | Item::ObjectPattern(_) | Item::ArrayPattern(_) => true,
            Item::Path(_) => wants_path,
            Item::Generator(..) | Item::Params(..) => false,
        });

        let mut chain = ModifierChain::new();
        let mut alias = None;
        for (index, item) in items.iter().enumerate() {
            if Some(index) == alias_index {
                alias = Some(self.alias(item)?);
            } else {
                chain.push(self.modifier(item)?)?;
            }
        }

        let alias_kind = alias.as_ref().map(Alias::kind);
        if let (MemberContext::Array, Some(alias)) = (context, &alias) {
            return Err(JelError::syntax("array elements cannot have keys", alias.span()));
        }
        for modifier in chain.uncaptured() {
            if !modifier.kind.accepts(alias_kind) {
                let message = match (modifier.kind.required_alias(), alias_kind) {
                    (Some(required), _) => {
                        format!("modifier '{}' requires {}", modifier.kind.name(), required.describe())
                    }
                    (None, None) => format!("modifier '{}' needs a key", modifier.kind.name()),
                    (None, Some(kind)) => {
                        format!("modifier '{}' cannot be used with {}", modifier.kind.name(), kind.describe())
                    }
                };
                return Err(JelError::syntax(message, modifier.span()));
            }
        }
        if alias.is_none() && context == MemberContext::Object && !chain.uncaptured().any(|m| m.kind.allows_absent_alias())
        {
            return Err(JelError::syntax("missing key", span_of(tokens)));
        }

        Ok(KeySegment {
            chain,
            alias,
            sequence: Sequence::primitive(SequenceKind::KeySegment, tokens.to_vec()),
        })
    }

    fn alias(&self, item: &Item<'_>) -> Result<Alias, JelError> {
        Ok(match item {
            Item::Word(word, _) | Item::Literal(word, _) => Alias::Key(Key {
                name: word.clone(),
                span: item.span(),
            }),
            Item::Path(tokens) => Alias::Path(self.reference(tokens)?),
            Item::ObjectPattern(container) => Alias::Pattern(self.object_pattern(container)?),
            Item::ArrayPattern(container) => Alias::Pattern(self.array_pattern(container)?),
            Item::Params(..) | Item::Generator(..) => unreachable!("never chosen as alias"),
        })
    }

    fn modifier(&self, item: &Item<'_>) -> Result<Modifier, JelError> {
        let kind = match item {
            Item::Word(word, _) => item.keyword().ok_or_else(|| {
                JelError::syntax(format!("unknown modifier '{}'", word), item.span())
                    .with_details("keys containing spaces must be quoted")
            })?,
            Item::Literal(_, token) => {
                return Err(JelError::syntax(format!("unexpected {} before the key", token), token.span()));
            }
            Item::Path(tokens) => {
                let callee = self.reference(tokens)?;
                if callee.expansion {
                    return Err(JelError::syntax("a delegate cannot be expanded", callee.span()));
                }
                ModifierKind::Delegate { callee }
            }
            Item::Params(container, _) => ModifierKind::Template {
                params: self.params(container)?,
                captured: Vec::new(),
            },
            Item::Generator(bindings, sources, _) => ModifierKind::Generator {
                bindings: self.bindings(bindings)?,
                sources: self.tuple(sources)?,
            },
            Item::ObjectPattern(container) | Item::ArrayPattern(container) => {
                return Err(JelError::syntax("a destructuring pattern must be the key", container.span));
            }
        };
        let sequence = match item {
            Item::Word(_, tokens) | Item::Path(tokens) | Item::Generator(_, _, tokens) => {
                Sequence::primitive(SequenceKind::Modifier, tokens.to_vec())
            }
            Item::Params(_, token) => Sequence::primitive(SequenceKind::Parameters, vec![(*token).clone()]),
            _ => Sequence::synthetic(SequenceKind::Modifier, item.span()),
        };
        Ok(Modifier::new(kind, sequence))
    }

    /// Keys of `if` and `match` branches: leading keywords are modifiers, the
    /// rest is the condition or the match value.
    fn branch_key(&self, tokens: &[Token], context: MemberContext) -> Result<KeySegment, JelError> {
        let mut chain = ModifierChain::new();
        let mut start = 0;
        loop {
            let rest = trim(&tokens[start..]);
            let Some(first) = rest.first() else { break };
            let keyword = first.as_leaf().filter(|_| is_word(first)).and_then(|l| ModifierKind::from_keyword(&l.text));
            let Some(kind) = keyword.filter(|_| rest.len() > 1) else { break };
            if !kind.allowed_on_branch() {
                return Err(JelError::syntax(
                    format!("modifier '{}' cannot be used on a branch", kind.name()),
                    first.span(),
                ));
            }
            chain.push(Modifier::new(kind, Sequence::primitive(SequenceKind::Modifier, vec![first.clone()])))?;
            start = tokens.len() - rest.len() + 1;
        }

        let rest = trim(&tokens[start..]);
        let span = span_of(rest);
        let alias = if context == MemberContext::Conditional {
            if rest.len() == 1 && rest[0].is_word("else") {
                Alias::Condition(Condition::Always(span))
            } else {
                Alias::Condition(Condition::Test(self.value(rest, ValueMode::Default, span)?))
            }
        } else if rest.len() == 1 && rest[0].is_word("default") {
            Alias::Expression(MatchKey::Default(span))
        } else {
            Alias::Expression(MatchKey::Value(self.value(rest, ValueMode::Default, span)?))
        };
        let alias_kind = Some(alias.kind());
        if let Some(modifier) = chain.uncaptured().find(|m| !m.kind.accepts(alias_kind)) {
            return Err(JelError::syntax(
                format!("modifier '{}' cannot be used on a branch", modifier.kind.name()),
                modifier.span(),
            ));
        }
        Ok(KeySegment {
            chain,
            alias: Some(alias),
            sequence: Sequence::primitive(SequenceKind::KeySegment, tokens.to_vec()),
        })
    }
}

/// End of a word optionally continued by adjacent `-word` or `-number`
/// pieces, as in `content-type`.
fn dashed_word_end(tokens: &[Token], start: usize) -> usize {
    let mut end = start + 1;
    while let (Some(dash), Some(next)) = (tokens.get(end), tokens.get(end + 1)) {
        let continues = dash.is_symbol("-")
            && adjacent(&tokens[end - 1], dash)
            && adjacent(dash, next)
            && (is_word(next) || next.is_kind(TokenKind::Number));
        if !continues {
            break;
        }
        end += 2;
    }
    end
}
