//! The error type shared by parsing, evaluation and imports, plus the
//! early-exit channel used by `return` and `yield`.
use jel_json::Value;
use jel_lexer::{LexError, Span};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Evaluation,
    Import,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Evaluation => "evaluation error",
            ErrorKind::Import => "import error",
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct JelError {
    pub kind: ErrorKind,
    pub message: String,
    /// Locations involved, primary location first.
    pub spans: Vec<Span>,
    pub details: Option<String>,
    pub file: Option<PathBuf>,
    #[source]
    pub cause: Option<Box<JelError>>,
}

impl JelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            spans: Vec::new(),
            details: None,
            file: None,
            cause: None,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message).with_span(span)
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Evaluation, message)
    }

    pub fn import(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Import, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    pub fn with_spans(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.spans.extend(spans);
        self
    }

    /// Attaches `span` only when no location is known yet.
    pub fn at(self, span: Span) -> Self {
        if self.spans.is_empty() {
            self.with_span(span)
        } else {
            self
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_cause(mut self, cause: JelError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Records the file the error was raised in, keeping an existing one.
    pub fn in_file(mut self, file: Option<&Path>) -> Self {
        if self.file.is_none() {
            self.file = file.map(Path::to_path_buf);
        }
        self
    }

    pub fn is_syntax(&self) -> bool {
        self.kind == ErrorKind::Syntax
    }

    /// The error and its chain of causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &JelError> {
        std::iter::successors(Some(self), |e| e.cause.as_deref())
    }

    /// Renders the error with a numbered excerpt of `source` and a caret line
    /// under every span. Causes are listed after the excerpt.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}: {}", self.kind.label(), self.message);
        if let Some(primary) = self.spans.first() {
            let file = self
                .file
                .as_ref()
                .map(|f| f.display().to_string())
                .unwrap_or_else(|| "<input>".to_string());
            let _ = writeln!(out, "  --> {}:{}:{}", file, primary.line, primary.column);
            render_excerpt(&mut out, source, &self.spans);
        }
        if let Some(details) = &self.details {
            let _ = writeln!(out, "  = note: {}", details);
        }
        for cause in self.chain().skip(1) {
            let _ = write!(out, "caused by: {}", cause.message);
            match (&cause.file, cause.spans.first()) {
                (Some(file), Some(span)) => {
                    let _ = write!(out, " ({}:{}:{})", file.display(), span.line, span.column);
                }
                (Some(file), None) => {
                    let _ = write!(out, " ({})", file.display());
                }
                (None, _) => {}
            }
            out.push('\n');
        }
        out
    }
}

fn render_excerpt(out: &mut String, source: &str, spans: &[Span]) {
    let lines: Vec<&str> = source.split('\n').collect();
    let mut shown: Vec<usize> = spans.iter().map(|s| s.line).filter(|&l| l >= 1).collect();
    shown.sort_unstable();
    shown.dedup();
    let width = shown.last().map(|l| l.to_string().len()).unwrap_or(1);
    let _ = writeln!(out, "{:width$} |", "", width = width);
    for line_number in shown {
        let Some(text) = lines.get(line_number - 1) else {
            continue;
        };
        let text = text.trim_end_matches('\r');
        let _ = writeln!(out, "{:>width$} | {}", line_number, text, width = width);
        let mut markers = vec![' '; text.chars().count() + 1];
        for span in spans.iter().filter(|s| s.line == line_number) {
            let from = span.column.saturating_sub(1);
            let length = if span.last_line > span.line {
                markers.len().saturating_sub(from).max(1)
            } else {
                source
                    .get(span.start..span.end)
                    .map(|t| t.chars().count())
                    .unwrap_or(1)
                    .max(1)
            };
            for marker in markers.iter_mut().skip(from).take(length) {
                *marker = '^';
            }
            if from >= markers.len() {
                markers.resize(from + 1, ' ');
                markers[from] = '^';
            }
        }
        let underline: String = markers.into_iter().collect();
        let _ = writeln!(out, "{:width$} | {}", "", underline.trim_end(), width = width);
    }
}

impl From<LexError> for JelError {
    fn from(error: LexError) -> Self {
        let spans = error.spans();
        JelError::new(ErrorKind::Syntax, error.to_string()).with_spans(spans)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    Yield,
    Return,
}

impl ExitKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ExitKind::Yield => "yield",
            ExitKind::Return => "return",
        }
    }
}

/// A `yield` or `return` travelling up to the boundary that consumes it.
#[derive(Debug, Clone)]
pub struct EarlyExit {
    pub kind: ExitKind,
    pub value: Value,
    pub span: Span,
}

/// Everything that can stop an evaluation step.
#[derive(Debug, Clone)]
pub enum Interrupt {
    Error(JelError),
    Exit(EarlyExit),
}

impl Interrupt {
    /// Converts an exit that escaped every boundary into a misuse error.
    pub fn into_error(self) -> JelError {
        match self {
            Interrupt::Error(error) => error,
            Interrupt::Exit(exit) => misplaced_exit(&exit),
        }
    }

    /// Adds a location to errors that have none.
    pub fn at(self, span: Span) -> Self {
        match self {
            Interrupt::Error(error) => Interrupt::Error(error.at(span)),
            exit => exit,
        }
    }
}

pub(crate) fn misplaced_exit(exit: &EarlyExit) -> JelError {
    let boundary = match exit.kind {
        ExitKind::Yield => "an array generator",
        ExitKind::Return => "a template call",
    };
    JelError::evaluation(format!(
        "'{}' used outside of {}",
        exit.kind.keyword(),
        boundary
    ))
    .with_span(exit.span)
}

impl From<JelError> for Interrupt {
    fn from(error: JelError) -> Self {
        Interrupt::Error(error)
    }
}

pub type Result<T, E = JelError> = std::result::Result<T, E>;

/// Result of a single evaluation step.
pub type Eval<T> = std::result::Result<T, Interrupt>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn span(start: usize, end: usize, line: usize, column: usize) -> Span {
        Span::new(start, end, line, column, line)
    }

    #[test]
    fn test_render_underlines_every_span() {
        let source = "a: 1\nb: $missing + 2\n";
        let error = JelError::evaluation("unresolved reference '$missing'")
            .with_span(span(8, 16, 2, 4))
            .with_span(span(19, 20, 2, 15));
        let rendered = error.render(source);
        assert!(rendered.starts_with("evaluation error: unresolved reference '$missing'"));
        assert!(rendered.contains("--> <input>:2:4"));
        assert!(rendered.contains("2 | b: $missing + 2"));
        assert!(rendered.contains("|    ^^^^^^^^   ^"));
    }

    #[test]
    fn test_cause_chain_is_exposed_as_source() {
        let inner = JelError::syntax("unexpected ','", span(0, 1, 1, 1)).in_file(Some(Path::new("b.jel")));
        let outer = JelError::import("failed to import 'b.jel'").with_cause(inner);
        assert_eq!(outer.source().map(|s| s.to_string()), Some("unexpected ','".to_string()));
        assert_eq!(outer.chain().count(), 2);
        assert!(outer.render("").contains("caused by: unexpected ',' (b.jel:1:1)"));
    }

    #[test]
    fn test_escaped_exit_becomes_misuse_error() {
        let exit = EarlyExit {
            kind: ExitKind::Return,
            value: Value::Null,
            span: span(0, 6, 1, 1),
        };
        let error = Interrupt::Exit(exit).into_error();
        assert_eq!(error.message, "'return' used outside of a template call");
        assert_eq!(error.kind, ErrorKind::Evaluation);
    }

    #[test]
    fn test_lex_error_keeps_both_delimiter_spans() {
        let error: JelError = jel_lexer::tokenize("[1, 2}").unwrap_err().into();
        assert!(error.is_syntax());
        assert_eq!(error.spans.len(), 2);
    }
}
