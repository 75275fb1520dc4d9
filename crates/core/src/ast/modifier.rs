use super::{AliasKind, Bindings, Param, Tuple};
use crate::error::JelError;
use crate::path::JsonPath;
use crate::sequence::Sequence;
use jel_lexer::Span;
use std::rc::Rc;

/// A decorator written in a key segment.
#[derive(Debug, Clone)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub sequence: Rc<Sequence>,
}

impl Modifier {
    pub fn new(kind: ModifierKind, sequence: Rc<Sequence>) -> Self {
        Self { kind, sequence }
    }

    pub fn span(&self) -> Span {
        self.sequence.span
    }
}

#[derive(Debug, Clone)]
pub enum ModifierKind {
    Private,
    Var,
    Import,
    From,
    Match,
    If,
    Add,
    Set,
    Merge,
    Defaults,
    NoInline,
    Raise,
    Yield,
    Return,
    Log,
    Math,
    /// `(a, b)`. `captured` holds the modifiers written after the list.
    Template {
        params: Vec<Param>,
        captured: Vec<Modifier>,
    },
    /// `[value, index] (sources…)`
    Generator { bindings: Bindings, sources: Tuple },
    /// `$callee`: the value is passed through the referenced template.
    Delegate { callee: JsonPath },
}

/// How a modifier forces the member value to be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedValue {
    Match,
    Conditional,
    /// Flat left-to-right numeric expression.
    Operator,
}

pub const KEYWORDS: &[&str] = &[
    "private", "var", "import", "from", "match", "if", "add", "set", "merge", "defaults", "noinline", "raise",
    "yield", "return", "log", "math",
];

impl ModifierKind {
    pub fn from_keyword(word: &str) -> Option<ModifierKind> {
        let kind = match word {
            "private" => ModifierKind::Private,
            "var" => ModifierKind::Var,
            "import" => ModifierKind::Import,
            "from" => ModifierKind::From,
            "match" => ModifierKind::Match,
            "if" => ModifierKind::If,
            "add" => ModifierKind::Add,
            "set" => ModifierKind::Set,
            "merge" => ModifierKind::Merge,
            "defaults" => ModifierKind::Defaults,
            "noinline" => ModifierKind::NoInline,
            "raise" => ModifierKind::Raise,
            "yield" => ModifierKind::Yield,
            "return" => ModifierKind::Return,
            "log" => ModifierKind::Log,
            "math" => ModifierKind::Math,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModifierKind::Private => "private",
            ModifierKind::Var => "var",
            ModifierKind::Import => "import",
            ModifierKind::From => "from",
            ModifierKind::Match => "match",
            ModifierKind::If => "if",
            ModifierKind::Add => "add",
            ModifierKind::Set => "set",
            ModifierKind::Merge => "merge",
            ModifierKind::Defaults => "defaults",
            ModifierKind::NoInline => "noinline",
            ModifierKind::Raise => "raise",
            ModifierKind::Yield => "yield",
            ModifierKind::Return => "return",
            ModifierKind::Log => "log",
            ModifierKind::Math => "math",
            ModifierKind::Template { .. } => "template parameters",
            ModifierKind::Generator { .. } => "array generator",
            ModifierKind::Delegate { .. } => "delegate",
        }
    }

    /// The one alias kind this modifier cannot work without.
    pub fn required_alias(&self) -> Option<AliasKind> {
        match self {
            ModifierKind::Add | ModifierKind::Set | ModifierKind::Defaults => Some(AliasKind::Path),
            ModifierKind::From => Some(AliasKind::Pattern),
            ModifierKind::Template { .. } => Some(AliasKind::Key),
            _ => None,
        }
    }

    /// Whether the modifier can be combined with `alias` (`None` = no alias).
    pub fn accepts(&self, alias: Option<AliasKind>) -> bool {
        use AliasKind::*;
        if let Some(required) = self.required_alias() {
            return alias == Some(required);
        }
        match self {
            ModifierKind::Private | ModifierKind::Var | ModifierKind::NoInline => {
                matches!(alias, None | Some(Key) | Some(Pattern))
            }
            ModifierKind::Import | ModifierKind::Match | ModifierKind::If | ModifierKind::Generator { .. } => {
                matches!(alias, None | Some(Key))
            }
            ModifierKind::Merge => matches!(alias, None | Some(Path)),
            ModifierKind::Raise | ModifierKind::Log | ModifierKind::Math | ModifierKind::Delegate { .. } => {
                alias != Some(Path)
            }
            ModifierKind::Yield | ModifierKind::Return => matches!(alias, None | Some(Condition) | Some(Expression)),
            _ => false,
        }
    }

    /// Whether the modifier alone makes a member without a key meaningful.
    /// A keyword for which this is false, written where the key belongs, is
    /// read as the key itself.
    pub fn allows_absent_alias(&self) -> bool {
        !matches!(
            self,
            ModifierKind::Private
                | ModifierKind::Var
                | ModifierKind::NoInline
                | ModifierKind::Math
                | ModifierKind::Add
                | ModifierKind::Set
                | ModifierKind::Defaults
                | ModifierKind::From
                | ModifierKind::Template { .. }
        )
    }

    /// Whether the modifier may decorate a conditional or match branch.
    pub fn allowed_on_branch(&self) -> bool {
        matches!(
            self,
            ModifierKind::Raise
                | ModifierKind::Yield
                | ModifierKind::Return
                | ModifierKind::Log
                | ModifierKind::Math
                | ModifierKind::Delegate { .. }
        )
    }

    pub fn forced_value(&self) -> Option<ForcedValue> {
        match self {
            ModifierKind::Match => Some(ForcedValue::Match),
            ModifierKind::If => Some(ForcedValue::Conditional),
            ModifierKind::Math => Some(ForcedValue::Operator),
            _ => None,
        }
    }

    pub fn captures_subsequent(&self) -> bool {
        matches!(self, ModifierKind::Template { .. })
    }

    /// Whether the modifier can be moved into a template body.
    pub fn capturable(&self) -> bool {
        matches!(
            self,
            ModifierKind::Raise
                | ModifierKind::Yield
                | ModifierKind::Return
                | ModifierKind::Log
                | ModifierKind::Math
                | ModifierKind::Match
                | ModifierKind::If
                | ModifierKind::Template { .. }
                | ModifierKind::Generator { .. }
                | ModifierKind::Delegate { .. }
        )
    }

    fn exclusive_group(&self) -> Option<u8> {
        match self {
            ModifierKind::Import
            | ModifierKind::From
            | ModifierKind::Add
            | ModifierKind::Set
            | ModifierKind::Merge
            | ModifierKind::Defaults => Some(0),
            ModifierKind::Raise | ModifierKind::Yield | ModifierKind::Return => Some(1),
            ModifierKind::Private | ModifierKind::Var => Some(2),
            _ => None,
        }
    }

    fn repeatable(&self) -> bool {
        matches!(
            self,
            ModifierKind::Template { .. } | ModifierKind::Generator { .. } | ModifierKind::Delegate { .. }
        )
    }

    fn conflicts_with(&self, other: &ModifierKind) -> bool {
        if self.name() == other.name() {
            return !self.repeatable();
        }
        if let (Some(a), Some(b)) = (self.forced_value(), other.forced_value()) {
            return a != b;
        }
        matches!((self.exclusive_group(), other.exclusive_group()), (Some(a), Some(b)) if a == b)
    }
}

/// Modifiers of one key segment, collected in source order.
///
/// Building is two-phase: [`ModifierChain::push`] records the flat chain and
/// which earlier template parameter list captures each modifier, checking
/// conflicts as it goes; [`ModifierChain::resolve`] then nests captured
/// modifiers into their templates.
#[derive(Debug, Clone, Default)]
pub struct ModifierChain {
    modifiers: Vec<Modifier>,
    /// `(capturer, captured)` index pairs.
    captures: Vec<(usize, usize)>,
}

impl ModifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: Modifier) -> Result<(), JelError> {
        if let Some(existing) = self.modifiers.iter().find(|m| m.kind.conflicts_with(&modifier.kind)) {
            let message = if existing.kind.name() == modifier.kind.name() {
                format!("duplicate modifier '{}'", modifier.kind.name())
            } else {
                format!(
                    "modifier '{}' cannot be combined with '{}'",
                    modifier.kind.name(),
                    existing.kind.name()
                )
            };
            return Err(JelError::syntax(message, modifier.span()).with_span(existing.span()));
        }

        let index = self.modifiers.len();
        if let Some(capturer) = self.modifiers.iter().rposition(|m| m.kind.captures_subsequent()) {
            if !modifier.kind.capturable() {
                return Err(JelError::syntax(
                    format!(
                        "modifier '{}' must be written before the template parameters",
                        modifier.kind.name()
                    ),
                    modifier.span(),
                )
                .with_span(self.modifiers[capturer].span()));
            }
            self.captures.push((capturer, index));
        }
        self.modifiers.push(modifier);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    pub fn forced_value(&self) -> Option<ForcedValue> {
        self.modifiers.iter().find_map(|m| m.kind.forced_value())
    }

    /// Modifiers that stay on the member after capturing.
    pub fn uncaptured(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.captures.iter().any(|(_, captured)| captured == i))
            .map(|(_, m)| m)
    }

    /// Nests every captured modifier into its template and returns the
    /// remaining top-level chain.
    pub fn resolve(self) -> Vec<Modifier> {
        let ModifierChain { modifiers, captures } = self;
        let mut nested: Vec<Vec<Modifier>> = vec![Vec::new(); modifiers.len()];
        let mut top = Vec::new();
        for (index, mut modifier) in modifiers.into_iter().enumerate().rev() {
            if let ModifierKind::Template { captured, .. } = &mut modifier.kind {
                *captured = std::mem::take(&mut nested[index]);
            }
            match captures.iter().find(|(_, captured)| *captured == index) {
                Some((capturer, _)) => nested[*capturer].insert(0, modifier),
                None => top.insert(0, modifier),
            }
        }
        top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::SequenceKind;

    fn modifier(kind: ModifierKind, at: usize) -> Modifier {
        Modifier::new(kind, Sequence::synthetic(SequenceKind::Modifier, Span::new(at, at + 1, 1, at + 1, 1)))
    }

    fn template(name: &str, at: usize) -> Modifier {
        let params = vec![Param {
            name: name.into(),
            span: Span::default(),
        }];
        modifier(
            ModifierKind::Template {
                params,
                captured: Vec::new(),
            },
            at,
        )
    }

    #[test]
    fn test_keywords_round_trip() {
        for keyword in KEYWORDS {
            let kind = ModifierKind::from_keyword(keyword).unwrap();
            assert_eq!(kind.name(), *keyword);
        }
        assert!(ModifierKind::from_keyword("else").is_none());
    }

    #[test]
    fn test_conflicting_forced_values_report_both_spans() {
        let mut chain = ModifierChain::new();
        chain.push(modifier(ModifierKind::Match, 0)).unwrap();
        let error = chain.push(modifier(ModifierKind::If, 6)).unwrap_err();
        assert_eq!(error.message, "modifier 'if' cannot be combined with 'match'");
        assert_eq!(error.spans.len(), 2);
        assert_eq!(error.spans[1].start, 0);
    }

    #[test]
    fn test_duplicate_flag_is_rejected() {
        let mut chain = ModifierChain::new();
        chain.push(modifier(ModifierKind::Private, 0)).unwrap();
        let error = chain.push(modifier(ModifierKind::Private, 8)).unwrap_err();
        assert_eq!(error.message, "duplicate modifier 'private'");
    }

    #[test]
    fn test_non_capturable_after_template_is_rejected() {
        let mut chain = ModifierChain::new();
        chain.push(template("x", 0)).unwrap();
        assert!(chain.push(modifier(ModifierKind::Private, 4)).is_err());
    }

    #[test]
    fn test_resolve_nests_captured_modifiers() {
        let mut chain = ModifierChain::new();
        chain.push(modifier(ModifierKind::Private, 0)).unwrap();
        chain.push(template("a", 2)).unwrap();
        chain.push(template("b", 4)).unwrap();
        chain.push(modifier(ModifierKind::Log, 6)).unwrap();
        assert_eq!(chain.uncaptured().count(), 2);

        let top = chain.resolve();
        assert_eq!(top.len(), 2);
        let ModifierKind::Template { params, captured } = &top[1].kind else {
            panic!("expected a template, got {:?}", top[1].kind);
        };
        assert_eq!(params[0].name, "a");
        assert_eq!(captured.len(), 1);
        let ModifierKind::Template { params, captured } = &captured[0].kind else {
            panic!("expected a nested template");
        };
        assert_eq!(params[0].name, "b");
        assert!(matches!(captured[0].kind, ModifierKind::Log));
    }

    #[test]
    fn test_alias_acceptance() {
        assert!(ModifierKind::Set.accepts(Some(AliasKind::Path)));
        assert!(!ModifierKind::Set.accepts(None));
        assert!(ModifierKind::Import.accepts(None));
        assert!(!ModifierKind::From.accepts(Some(AliasKind::Key)));
        assert!(ModifierKind::Return.accepts(Some(AliasKind::Condition)));
        assert!(!ModifierKind::Private.allows_absent_alias());
        assert!(ModifierKind::Import.allows_absent_alias());
    }
}
