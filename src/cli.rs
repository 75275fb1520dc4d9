//! The `jel` command: evaluate a document and print it as JSON.
use clap::Parser;
use jel_core::{EvaluationConfig, JelContext, JelError, PrettyOptions, Privileges, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Evaluate a JEL document and print the resulting JSON")]
pub struct Options {
    /// Document to evaluate; reads standard input when absent or `-`
    pub input: Option<PathBuf>,

    /// Fail on unresolved references and unmatched conditionals
    #[arg(long)]
    pub strict: bool,

    /// Comma separated privileges to grant (files, env, all, none)
    #[arg(long, value_name = "LIST")]
    pub allow: Option<String>,

    /// JSON file with evaluation settings; flags override it
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Indent the output and keep comments
    #[arg(short, long)]
    pub pretty: bool,

    /// Print only the values selected by a path such as `items[0].name`
    #[arg(short, long, value_name = "PATH")]
    pub query: Option<String>,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{0}")]
    Privileges(String),

    /// An evaluation failure, already rendered against its source.
    #[error("{rendered}")]
    Evaluation { error: JelError, rendered: String },
}

impl Options {
    /// The evaluation settings: the config file first, then the flags.
    pub fn evaluation_config(&self) -> Result<EvaluationConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => EvaluationConfig::default(),
        };
        if self.strict {
            config.strict_pathing = true;
        }
        if let Some(list) = &self.allow {
            config.privileges = Privileges::parse_list(list).map_err(CliError::Privileges)?;
        }
        Ok(config)
    }

    fn file(&self) -> Option<&Path> {
        self.input.as_deref().filter(|p| *p != Path::new("-"))
    }
}

/// Evaluates the document named by `options` and formats the output.
pub fn run(options: &Options) -> Result<String, CliError> {
    let config = options.evaluation_config()?;
    let mut ctx = JelContext::with_config(config);
    let value = match options.file() {
        Some(path) => ctx.evaluate_file(path).map_err(|e| rendered(e, None))?,
        None => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            evaluate_source(&source, &mut ctx)?
        }
    };
    format_output(&value, options)
}

/// Evaluates `source` that has no file name; imports resolve against the
/// working directory.
pub fn evaluate_source(source: &str, ctx: &mut JelContext) -> Result<Value, CliError> {
    jel_core::parse(source)
        .and_then(|document| jel_core::evaluate(&document, ctx))
        .map_err(|e| rendered(e, Some(source)))
}

pub fn format_output(value: &Value, options: &Options) -> Result<String, CliError> {
    let Some(text) = &options.query else {
        return Ok(if options.pretty {
            jel_core::to_string_pretty(value, &PrettyOptions::default())
        } else {
            serde_json::to_string(value)?
        });
    };
    let path = jel_core::parse_path(text).map_err(|e| rendered(e, Some(text)))?;
    let document = value.to_json();
    let selected: Vec<&serde_json::Value> = path.query_all(&document).map_err(|e| rendered(e, Some(text)))?;
    let lines = selected
        .into_iter()
        .map(|v| {
            if options.pretty {
                serde_json::to_string_pretty(v)
            } else {
                serde_json::to_string(v)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

/// Renders against the file the error names, falling back to `source`.
fn rendered(error: JelError, source: Option<&str>) -> CliError {
    let from_file = error.file.as_ref().and_then(|f| std::fs::read_to_string(f).ok());
    let rendered = match from_file.as_deref().or(source) {
        Some(text) => error.render(text),
        None => error.to_string(),
    };
    CliError::Evaluation { error, rendered }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, br#"{ "strictPathing": false, "maxDepth": 8, "privileges": ["env"] }"#)
            .unwrap();
        let options = Options {
            config: Some(file.path().to_path_buf()),
            strict: true,
            ..Options::default()
        };
        let config = options.evaluation_config().unwrap();
        assert!(config.strict_pathing);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.privileges, Privileges::ENV);
    }

    #[test]
    fn test_unknown_privilege_is_rejected() {
        let options = Options {
            allow: Some("files,net".to_string()),
            ..Options::default()
        };
        let error = options.evaluation_config().unwrap_err();
        assert_eq!(error.to_string(), "unknown privilege 'net'");
    }

    #[test]
    fn test_query_selects_values() {
        let mut ctx = JelContext::new();
        let value = evaluate_source("items: [{ n: a }, { n: b }]", &mut ctx).unwrap();
        let options = Options {
            query: Some("items[0:1].n".to_string()),
            ..Options::default()
        };
        assert_eq!(format_output(&value, &options).unwrap(), "\"a\"\n\"b\"");
    }

    #[test]
    fn test_errors_are_rendered_against_the_source() {
        let mut ctx = JelContext::new();
        let Err(CliError::Evaluation { rendered, .. }) = evaluate_source("a: 1 / 0", &mut ctx) else {
            panic!("expected an evaluation error");
        };
        assert!(rendered.contains("division by zero"));
        assert!(rendered.contains("1 | a: 1 / 0"));
    }
}
