//! Constraint checking for [`FormatConfig`](crate::FormatConfig).

use std::fmt;

use thiserror::Error;

use crate::{FormatConfig, IndentationType};

/// Fatal constraint violations: the run must not start with such a config.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("indentation_size {0} is outside [1, 16]")]
    IndentationSizeOutOfRange(u8),
    #[error("tab_width {0} is outside [1, 16]")]
    TabWidthOutOfRange(u8),
    #[error("max_line_length {0} is outside [40, 1000]")]
    MaxLineLengthOutOfRange(u32),
    #[error("indentation_type TABS requires indentation_size 1, got {0}")]
    TabsRequireSizeOne(u8),
    #[error("unsupported charset {0:?} (the engine decodes UTF-8 and ASCII)")]
    UnsupportedCharset(String),
    #[error("unsupported java version {0} (expected one of 8, 11, 14, 17, 21, 24, 25)")]
    UnsupportedJavaVersion(u16),
    #[error("rule id must be a non-empty string")]
    EmptyRuleId,
}

/// Non-fatal findings surfaced while validating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `MIXED` indentation where tab width and indent size disagree; the
    /// indentation rule then measures tabs at `tab_width` columns.
    MixedIndentWidths { indentation_size: u8, tab_width: u8 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::MixedIndentWidths {
                indentation_size,
                tab_width,
            } => write!(
                f,
                "MIXED indentation with indentation_size {indentation_size} != tab_width {tab_width}; \
                 tabs are measured at tab_width columns"
            ),
        }
    }
}

const SUPPORTED_JAVA_VERSIONS: &[u16] = &[8, 11, 14, 17, 21, 24, 25];

fn charset_is_supported(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii"
    )
}

impl FormatConfig {
    /// Check every constraint from the config surface; returns the
    /// non-fatal warnings on success.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigValidationError> {
        if !(1..=16).contains(&self.indentation_size) {
            return Err(ConfigValidationError::IndentationSizeOutOfRange(
                self.indentation_size,
            ));
        }
        if !(1..=16).contains(&self.tab_width) {
            return Err(ConfigValidationError::TabWidthOutOfRange(self.tab_width));
        }
        if !(40..=1000).contains(&self.max_line_length) {
            return Err(ConfigValidationError::MaxLineLengthOutOfRange(
                self.max_line_length,
            ));
        }
        if self.indentation_type == IndentationType::Tabs && self.indentation_size != 1 {
            return Err(ConfigValidationError::TabsRequireSizeOne(
                self.indentation_size,
            ));
        }
        if !charset_is_supported(&self.charset) {
            return Err(ConfigValidationError::UnsupportedCharset(
                self.charset.clone(),
            ));
        }
        if !SUPPORTED_JAVA_VERSIONS.contains(&self.java_version) {
            return Err(ConfigValidationError::UnsupportedJavaVersion(
                self.java_version,
            ));
        }
        if self.rules.keys().any(|id| id.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyRuleId);
        }

        let mut warnings = Vec::new();
        if self.indentation_type == IndentationType::Mixed
            && self.indentation_size != self.tab_width
        {
            warnings.push(ConfigWarning::MixedIndentWidths {
                indentation_size: self.indentation_size,
                tab_width: self.tab_width,
            });
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormatConfig {
        FormatConfig::default()
    }

    #[test]
    fn range_violations_are_fatal() {
        let mut c = config();
        c.indentation_size = 0;
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::IndentationSizeOutOfRange(0))
        ));

        let mut c = config();
        c.max_line_length = 39;
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::MaxLineLengthOutOfRange(39))
        ));

        let mut c = config();
        c.max_line_length = 1001;
        assert!(c.validate().is_err());

        let mut c = config();
        c.tab_width = 17;
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::TabWidthOutOfRange(17))
        ));
    }

    #[test]
    fn tabs_demand_unit_indentation() {
        let mut c = config();
        c.indentation_type = IndentationType::Tabs;
        c.indentation_size = 4;
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::TabsRequireSizeOne(4))
        ));

        c.indentation_size = 1;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn mixed_indentation_mismatch_is_a_warning_not_an_error() {
        let mut c = config();
        c.indentation_type = IndentationType::Mixed;
        c.indentation_size = 2;
        c.tab_width = 8;
        let warnings = c.validate().unwrap();
        assert_eq!(
            warnings,
            vec![ConfigWarning::MixedIndentWidths {
                indentation_size: 2,
                tab_width: 8
            }]
        );
    }

    #[test]
    fn charset_names_are_checked() {
        let mut c = config();
        c.charset = "utf8".into();
        assert!(c.validate().is_ok());
        c.charset = "Shift_JIS".into();
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::UnsupportedCharset(_))
        ));
    }

    #[test]
    fn java_version_must_be_supported() {
        let mut c = config();
        c.java_version = 12;
        assert!(matches!(
            c.validate(),
            Err(ConfigValidationError::UnsupportedJavaVersion(12))
        ));
    }
}
