//! Evaluation settings and the privilege mask that gates side-effecting
//! built-ins and imports.
use serde::Deserialize;
use std::fmt;
use std::ops::BitOr;

/// Capabilities granted to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct Privileges(u32);

impl Privileges {
    pub const NONE: Privileges = Privileges(0);
    /// Reading files: `import`, `from` and `read()`.
    pub const FILES: Privileges = Privileges(1);
    /// Reading environment variables through `env()`.
    pub const ENV: Privileges = Privileges(1 << 1);
    pub const ALL: Privileges = Privileges(Self::FILES.0 | Self::ENV.0);

    pub fn contains(self, other: Privileges) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parses a single privilege name (`files`, `env`, `all`, `none`).
    pub fn from_name(name: &str) -> Option<Privileges> {
        match name.trim().to_ascii_lowercase().as_str() {
            "files" => Some(Self::FILES),
            "env" => Some(Self::ENV),
            "all" => Some(Self::ALL),
            "none" => Some(Self::NONE),
            _ => None,
        }
    }

    /// Parses a comma separated list such as `files,env`.
    pub fn parse_list(list: &str) -> Result<Privileges, String> {
        list.split(',')
            .filter(|name| !name.trim().is_empty())
            .try_fold(Privileges::NONE, |mask, name| {
                Privileges::from_name(name)
                    .map(|p| mask | p)
                    .ok_or_else(|| format!("unknown privilege '{}'", name.trim()))
            })
    }

    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.contains(Self::FILES) {
            names.push("files");
        }
        if self.contains(Self::ENV) {
            names.push("env");
        }
        names
    }
}

impl BitOr for Privileges {
    type Output = Privileges;

    fn bitor(self, rhs: Privileges) -> Privileges {
        Privileges(self.0 | rhs.0)
    }
}

impl TryFrom<Vec<String>> for Privileges {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Privileges::parse_list(&names.join(","))
    }
}

impl fmt::Display for Privileges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", self.names().join(","))
        }
    }
}

/// Settings for a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationConfig {
    /// Missing references and unmatched conditionals raise instead of
    /// producing `null`.
    pub strict_pathing: bool,
    pub privileges: Privileges,
    /// Maximum nesting of template calls.
    pub max_depth: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            strict_pathing: false,
            privileges: Privileges::FILES,
            max_depth: 256,
        }
    }
}

impl EvaluationConfig {
    pub fn strict(mut self, strict_pathing: bool) -> Self {
        self.strict_pathing = strict_pathing;
        self
    }

    pub fn with_privileges(mut self, privileges: Privileges) -> Self {
        self.privileges = privileges;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privilege_list() {
        assert_eq!(Privileges::parse_list("files,env").unwrap(), Privileges::ALL);
        assert_eq!(Privileges::parse_list("").unwrap(), Privileges::NONE);
        assert!(Privileges::parse_list("files,network").is_err());
        assert_eq!(Privileges::ALL.to_string(), "files,env");
    }

    #[test]
    fn test_contains_requires_every_bit() {
        assert!(Privileges::ALL.contains(Privileges::ENV));
        assert!(!Privileges::FILES.contains(Privileges::ALL));
        assert!(Privileges::FILES.contains(Privileges::NONE));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{ "strictPathing": true, "privileges": ["env"] }"#).unwrap();
        assert!(config.strict_pathing);
        assert_eq!(config.privileges, Privileges::ENV);
        assert_eq!(config.max_depth, 256);

        let empty: EvaluationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, EvaluationConfig::default());
    }
}
