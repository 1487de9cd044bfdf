//! Formatting configuration loaded from TOML.
//!
//! Discovery and layering of config files is the front end's concern; the
//! engine receives one already-merged [`FormatConfig`] value and treats it
//! as immutable for the whole run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod validation;

pub use validation::{ConfigValidationError, ConfigWarning};

/// Whitespace style used for indentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndentationType {
    Spaces,
    Tabs,
    /// Tabs for leading indentation levels, spaces for alignment.
    Mixed,
}

impl Default for IndentationType {
    fn default() -> Self {
        Self::Spaces
    }
}

/// Line terminator written by fixes that produce new lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
    /// Whatever the host platform uses.
    System,
}

impl Default for LineEnding {
    fn default() -> Self {
        Self::System
    }
}

impl LineEnding {
    /// The terminator bytes, with `System` resolved for the current host.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
            LineEnding::System => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// A byte size which supports both raw byte counts and human-friendly
/// suffixes (`"512MiB"`), for config values where TOML integer literals
/// would be unwieldy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(u64),
            Human(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bytes(value) => Ok(ByteSize(value)),
            Repr::Human(value) => javelin_memory::parse_byte_size(&value)
                .map(ByteSize)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// Optional overrides for the batch processor's memory admission pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Override the total permit pool size (in bytes of budget).
    #[serde(default)]
    pub total_bytes: Option<ByteSize>,
}

/// Global logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level for all Javelin crates.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "warn".to_owned()
    }

    fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            // Simple levels should be forgiving about casing and synonyms.
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is treated as an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    /// Create the effective `EnvFilter`.
    ///
    /// `level` may be a simple level name or a full directive string. If
    /// `RUST_LOG` is set, it is merged into the result.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config_directives = Self::normalize_level_directives(&self.level);

        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let fallback = || {
            tracing_subscriber::EnvFilter::try_new(&config_directives).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::default()
                    .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
            })
        };

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| fallback())
            }
            None => fallback(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

/// Top-level formatting configuration.
///
/// Keys accept both snake_case and the camelCase spellings used by other
/// tooling, e.g. `max_line_length` and `maxLineLength`:
/// ```toml
/// indentationType = "SPACES"
/// max_line_length = 100
///
/// [rules.line-length]
/// enabled = true
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    #[serde(default, alias = "indentationType")]
    pub indentation_type: IndentationType,

    /// Spaces per indentation level; must be 1 when `indentation_type` is
    /// `TABS`.
    #[serde(default = "default_indentation_size", alias = "indentationSize")]
    pub indentation_size: u8,

    #[serde(default = "default_max_line_length", alias = "maxLineLength")]
    pub max_line_length: u32,

    #[serde(default, alias = "lineEnding")]
    pub line_ending: LineEnding,

    /// Encoding used to read and write sources. The engine only decodes
    /// UTF-8 and its ASCII subsets.
    #[serde(default = "default_charset")]
    pub charset: String,

    #[serde(default = "default_true", alias = "insertFinalNewline")]
    pub insert_final_newline: bool,

    #[serde(default = "default_true", alias = "trimTrailingWhitespace")]
    pub trim_trailing_whitespace: bool,

    /// Display width of a tab character.
    #[serde(default = "default_tab_width", alias = "tabWidth")]
    pub tab_width: u8,

    /// Java feature release the parser targets.
    #[serde(default = "default_java_version", alias = "javaVersion")]
    pub java_version: u16,

    /// Per-rule configuration tables, keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_indentation_size() -> u8 {
    4
}

fn default_max_line_length() -> u32 {
    120
}

fn default_charset() -> String {
    "UTF-8".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_tab_width() -> u8 {
    4
}

fn default_java_version() -> u16 {
    25
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indentation_type: IndentationType::default(),
            indentation_size: default_indentation_size(),
            max_line_length: default_max_line_length(),
            line_ending: LineEnding::default(),
            charset: default_charset(),
            insert_final_newline: default_true(),
            trim_trailing_whitespace: default_true(),
            tab_width: default_tab_width(),
            java_version: default_java_version(),
            rules: BTreeMap::new(),
            logging: LoggingConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}

impl FormatConfig {
    /// Parse and validate a TOML document. Warnings are logged, not returned.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: FormatConfig =
            toml::from_str(input).map_err(|err| ConfigError::Toml(err.message().to_owned()))?;
        for warning in config.validate()? {
            tracing::warn!(%warning, "config warning");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Whether the rule is enabled; rules default to enabled unless their
    /// table sets `enabled = false`.
    pub fn rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .and_then(|value| value.get("enabled"))
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    /// The rule's raw options table, if present.
    pub fn rule_options(&self, rule_id: &str) -> Option<&toml::Value> {
        self.rules.get(rule_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = FormatConfig::default();
        assert_eq!(config.indentation_type, IndentationType::Spaces);
        assert_eq!(config.indentation_size, 4);
        assert_eq!(config.max_line_length, 120);
        assert_eq!(config.line_ending, LineEnding::System);
        assert_eq!(config.charset, "UTF-8");
        assert!(config.insert_final_newline);
        assert!(config.trim_trailing_whitespace);
        assert_eq!(config.tab_width, 4);
        assert_eq!(config.java_version, 25);
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let config = FormatConfig::from_toml_str(
            r#"
            indentationType = "TABS"
            indentationSize = 1
            maxLineLength = 100
            lineEnding = "LF"
            insertFinalNewline = false
            trimTrailingWhitespace = false
            tabWidth = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.indentation_type, IndentationType::Tabs);
        assert_eq!(config.indentation_size, 1);
        assert_eq!(config.max_line_length, 100);
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert!(!config.insert_final_newline);
        assert!(!config.trim_trailing_whitespace);
        assert_eq!(config.tab_width, 8);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = FormatConfig::from_toml_str("maxLineWidth = 100").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn per_rule_tables_round_trip() {
        let config = FormatConfig::from_toml_str(
            r#"
            [rules.line-length]
            enabled = false

            [rules.import-organization]
            project_prefixes = ["com.example"]
            "#,
        )
        .unwrap();
        assert!(!config.rule_enabled("line-length"));
        assert!(config.rule_enabled("import-organization"));
        assert!(config.rule_enabled("never-mentioned"));
        assert!(config.rule_options("import-organization").is_some());
    }

    #[test]
    fn byte_size_accepts_human_suffixes() {
        let config = FormatConfig::from_toml_str(
            r#"
            [memory]
            total_bytes = "64MiB"
            "#,
        )
        .unwrap();
        assert_eq!(config.memory.total_bytes, Some(ByteSize(64 << 20)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("javelin.toml");
        std::fs::write(&path, "max_line_length = 80\n").unwrap();
        let config = FormatConfig::load(&path).unwrap();
        assert_eq!(config.max_line_length, 80);

        let missing = FormatConfig::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
