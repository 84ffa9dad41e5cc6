//! Error types for the INI codec.
//!
//! The codec returns a single [`CodecError`] from every fallible entry point.
//! Leaf conversions (`"443"` into an `i32`, `"yes"` into a `bool`, ...) report
//! a [`ValueError`], which the decoder wraps with the section and variable it
//! was assigning to.
//!
//! # Error hierarchy
//!
//! ```text
//! CodecError
//! ├── NilConfig        marshal called without a configuration
//! ├── Encoding         input bytes are not UTF-8
//! ├── Syntax           malformed INI text (fatal)
//! ├── InvalidValue     value does not convert to the property type (fatal)
//! ├── Warnings         decoder warnings promoted by `warn_as_fatal`
//! ├── UnsupportedKind  schema contains a value kind the codec cannot judge
//! └── Format           writing the output buffer failed
//! ```

use std::fmt;

use thiserror::Error;

/// Errors returned by marshal, unmarshal and the emptiness helpers.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Marshal was handed no configuration at all.
    #[error("config is nil")]
    NilConfig,

    /// The INI data is not valid UTF-8.
    #[error("INI data is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// The INI text is malformed.
    #[error("invalid INI syntax at line {line}: {message}")]
    Syntax {
        /// One-based line number of the offending line.
        line: usize,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A value could not be converted to the type of its property.
    #[error("invalid value for section \"{section}\", variable \"{variable}\": {source}")]
    InvalidValue {
        /// Section the variable belongs to.
        section: String,
        /// Variable name as written in the input.
        variable: String,
        /// The underlying conversion failure.
        source: ValueError,
    },

    /// Non-fatal decoder warnings, surfaced because the caller asked for
    /// warnings to be treated as fatal.
    #[error("{0}")]
    Warnings(Warnings),

    /// The schema contains a value kind the emptiness evaluator or the
    /// marshaller cannot handle.
    #[error("invalid kind: {0}")]
    UnsupportedKind(&'static str),

    /// Writing to the output buffer failed.
    #[error("formatting INI output: {0}")]
    Format(#[from] fmt::Error),
}

/// A leaf value could not be parsed from its INI text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValueError {
    message: String,
}

impl ValueError {
    /// Create a conversion error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Data in the INI text that has no place to be stored in the schema.
///
/// Deprecated keys are reported this way: they are recognized by the decoder
/// but have no counterpart in the configuration model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Section name as written in the input.
    pub section: String,
    /// Subsection name, for `[Section "key"]` headers.
    pub subsection: Option<String>,
    /// Variable name, or `None` when the whole section could not be stored.
    pub variable: Option<String>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "can't store data at section \"{}\"", self.section)?;
        if let Some(subsection) = &self.subsection {
            write!(f, ", subsection \"{subsection}\"")?;
        }
        if let Some(variable) = &self.variable {
            write!(f, ", variable \"{variable}\"")?;
        }
        Ok(())
    }
}

/// The warnings collected while decoding one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings(pub Vec<Warning>);

impl Warnings {
    /// Iterate over the collected warnings in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.0.iter()
    }

    /// Number of collected warnings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no warnings were collected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Warnings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "warning:")?;
        for warning in &self.0 {
            writeln!(f, "{warning}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn deprecated(section: &str, variable: &str) -> Warning {
        Warning {
            section: section.to_string(),
            subsection: None,
            variable: Some(variable.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Display
    // -----------------------------------------------------------------------

    #[test]
    fn nil_config_display() {
        assert_eq!(CodecError::NilConfig.to_string(), "config is nil");
    }

    #[test]
    fn syntax_display() {
        let e = CodecError::Syntax {
            line: 3,
            message: "unterminated section header".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid INI syntax at line 3: unterminated section header"
        );
    }

    #[test]
    fn invalid_value_display() {
        let e = CodecError::InvalidValue {
            section: "Global".to_string(),
            variable: "insecure-flag".to_string(),
            source: ValueError::new("invalid boolean \"maybe\""),
        };
        assert_eq!(
            e.to_string(),
            "invalid value for section \"Global\", variable \"insecure-flag\": invalid boolean \"maybe\""
        );
    }

    #[test]
    fn invalid_value_has_source() {
        use std::error::Error as _;
        let e = CodecError::InvalidValue {
            section: "Global".to_string(),
            variable: "port".to_string(),
            source: ValueError::new("missing value"),
        };
        assert!(e.source().is_some());
    }

    #[test]
    fn unsupported_kind_display() {
        assert_eq!(
            CodecError::UnsupportedKind("char").to_string(),
            "invalid kind: char"
        );
    }

    #[test]
    fn single_warning_display() {
        let e = CodecError::Warnings(Warnings(vec![deprecated("Global", "server")]));
        assert_eq!(
            e.to_string(),
            "warning:\ncan't store data at section \"Global\", variable \"server\"\n"
        );
    }

    #[test]
    fn warning_list_display() {
        let warnings = Warnings(vec![
            deprecated("Global", "vm-name"),
            Warning {
                section: "VirtualCenter".to_string(),
                subsection: Some("10.0.0.1".to_string()),
                variable: Some("folder".to_string()),
            },
            Warning {
                section: "Unknown".to_string(),
                subsection: None,
                variable: None,
            },
        ]);
        assert_eq!(
            warnings.to_string(),
            "warning:\n\
             can't store data at section \"Global\", variable \"vm-name\"\n\
             can't store data at section \"VirtualCenter\", subsection \"10.0.0.1\", variable \"folder\"\n\
             can't store data at section \"Unknown\"\n"
        );
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn encoding_from_utf8_error() {
        let bytes = [0x5b_u8, 0xff, 0x5d];
        let utf8 = std::str::from_utf8(&bytes).expect_err("invalid UTF-8");
        let e: CodecError = utf8.into();
        assert!(e.to_string().starts_with("INI data is not valid UTF-8"));
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    const fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_types_are_send_sync() {
        assert_send_sync::<CodecError>();
        assert_send_sync::<ValueError>();
        assert_send_sync::<Warnings>();
    }

    #[test]
    fn codec_error_converts_to_anyhow() {
        let _anyhow_err: anyhow::Error = CodecError::NilConfig.into();
    }
}
