use super::{Expression, Modifier};
use crate::path::JsonPath;
use crate::sequence::Sequence;
use jel_json::{Flags, Format};
use jel_lexer::Span;
use std::rc::Rc;

/// A bound name: template parameter, generator binding or destructuring target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub span: Span,
}

/// `[value, index]` of an array generator.
#[derive(Debug, Clone)]
pub struct Bindings {
    pub value: Param,
    pub index: Option<Param>,
}

#[derive(Debug, Clone)]
pub struct Key {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct PatternField {
    pub key: String,
    pub binding: Param,
}

#[derive(Debug, Clone)]
pub enum PatternKind {
    /// `{a, b: renamed}`
    Object(Vec<PatternField>),
    /// `[x, _, z]`; `_` slots are skipped.
    Array(Vec<Option<Param>>),
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub kind: PatternKind,
    pub sequence: Rc<Sequence>,
}

/// Key of a conditional branch.
#[derive(Debug, Clone)]
pub enum Condition {
    /// `else`
    Always(Span),
    Test(Rc<Expression>),
}

/// Key of a match branch.
#[derive(Debug, Clone)]
pub enum MatchKey {
    /// `default`
    Default(Span),
    Value(Rc<Expression>),
}

#[derive(Debug, Clone)]
pub enum Alias {
    Key(Key),
    Path(JsonPath),
    Pattern(Pattern),
    Condition(Condition),
    Expression(MatchKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Key,
    Path,
    Pattern,
    Condition,
    Expression,
}

impl AliasKind {
    pub fn describe(self) -> &'static str {
        match self {
            AliasKind::Key => "a plain key",
            AliasKind::Path => "a `$path` key",
            AliasKind::Pattern => "a destructuring pattern",
            AliasKind::Condition => "a condition",
            AliasKind::Expression => "a match key",
        }
    }
}

impl Alias {
    pub fn kind(&self) -> AliasKind {
        match self {
            Alias::Key(_) => AliasKind::Key,
            Alias::Path(_) => AliasKind::Path,
            Alias::Pattern(_) => AliasKind::Pattern,
            Alias::Condition(_) => AliasKind::Condition,
            Alias::Expression(_) => AliasKind::Expression,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Alias::Key(key) => key.span,
            Alias::Path(path) => path.sequence.span,
            Alias::Pattern(pattern) => pattern.sequence.span,
            Alias::Condition(Condition::Always(span)) => *span,
            Alias::Condition(Condition::Test(expression)) => expression.span(),
            Alias::Expression(MatchKey::Default(span)) => *span,
            Alias::Expression(MatchKey::Value(expression)) => expression.span(),
        }
    }

    /// The key name.
    ///
    /// # Panics
    /// When the alias is not [`Alias::Key`]; callers check [`Alias::kind`].
    pub fn key(&self) -> &str {
        match self {
            Alias::Key(key) => &key.name,
            other => panic!("alias is {}, not a plain key", other.kind().describe()),
        }
    }

    /// # Panics
    /// When the alias is not [`Alias::Path`].
    pub fn path(&self) -> &JsonPath {
        match self {
            Alias::Path(path) => path,
            other => panic!("alias is {}, not a path", other.kind().describe()),
        }
    }

    /// # Panics
    /// When the alias is not [`Alias::Pattern`].
    pub fn pattern(&self) -> &Pattern {
        match self {
            Alias::Pattern(pattern) => pattern,
            other => panic!("alias is {}, not a pattern", other.kind().describe()),
        }
    }

    /// # Panics
    /// When the alias is not [`Alias::Condition`].
    pub fn condition(&self) -> &Condition {
        match self {
            Alias::Condition(condition) => condition,
            other => panic!("alias is {}, not a condition", other.kind().describe()),
        }
    }

    /// # Panics
    /// When the alias is not [`Alias::Expression`].
    pub fn match_key(&self) -> &MatchKey {
        match self {
            Alias::Expression(key) => key,
            other => panic!("alias is {}, not a match key", other.kind().describe()),
        }
    }
}

/// One key/value entry of an object, array element, or branch.
///
/// Members come out of the parser unmodified. The modifier pipeline turns a
/// member into zero or more output members whose modifiers have been applied;
/// those carry `modified = true`, and the pipeline hands them back unchanged.
#[derive(Debug, Clone)]
pub struct Member {
    pub alias: Option<Alias>,
    pub modifiers: Vec<Modifier>,
    pub value: Rc<Expression>,
    pub format: Format,
    pub flags: Flags,
    /// Output is spliced into the surrounding container.
    pub spread: bool,
    pub sequence: Rc<Sequence>,
    modified: bool,
}

impl Member {
    pub fn new(
        alias: Option<Alias>,
        modifiers: Vec<Modifier>,
        value: Rc<Expression>,
        format: Format,
        sequence: Rc<Sequence>,
    ) -> Self {
        Self {
            alias,
            modifiers,
            value,
            format,
            flags: Flags::NONE,
            spread: false,
            sequence,
            modified: false,
        }
    }

    /// An output member sharing this member's flags, format and source.
    pub fn derive(&self, alias: Option<Alias>, value: Rc<Expression>) -> Member {
        Member {
            alias,
            modifiers: Vec::new(),
            value,
            format: self.format.clone(),
            flags: self.flags,
            spread: self.spread,
            sequence: self.sequence.clone(),
            modified: true,
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn span(&self) -> Span {
        self.sequence.span
    }

    /// The plain key, if the member has one.
    pub fn key(&self) -> Option<&str> {
        match &self.alias {
            Some(Alias::Key(key)) => Some(&key.name),
            _ => None,
        }
    }
}
