//! Miette-based error diagnostics for CLI error presentation.
//!
//! Configuration errors carry the file content and a labeled span so the
//! offending line is shown in context.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::error::{ConfigError as ConfigFailure, Error, TrainingError};
use crate::infrastructure::config::settings::Config;

/// Configuration error with source location context.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(armada::config))]
pub struct ConfigError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub help: Option<String>,
}

impl ConfigError {
    #[must_use]
    pub fn new(message: impl Into<String>, path: &Path, src: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            src: NamedSource::new(path.display().to_string(), src.into()),
            span: None,
            help: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Option<SourceSpan>) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Describe a failed [`Config::parse_toml`] call on `src`.
    #[must_use]
    pub fn from_load_error(path: &Path, src: &str, err: Error) -> Self {
        match err {
            Error::Config(ConfigFailure::Parse(e)) => {
                let span = e.span().map(|range| SourceSpan::from(range.start..range.end));
                Self::new(e.message().to_string(), path, src)
                    .with_span(span)
                    .with_help("check the TOML syntax near the marked location")
            }
            Error::Config(ConfigFailure::InvalidValue { field, reason }) => {
                Self::new(format!("invalid value for {field}: {reason}"), path, src)
                    .with_span(locate_field(src, field))
            }
            Error::Config(ConfigFailure::MissingField { field }) => {
                Self::new(format!("missing required field: {field}"), path, src)
                    .with_span(locate_field(src, field))
            }
            other => Self::new(other.to_string(), path, src),
        }
    }
}

/// Span of the `key = value` line assigning the last segment of `field`.
fn locate_field(src: &str, field: &str) -> Option<SourceSpan> {
    let key = field.rsplit('.').next()?;
    let mut offset = 0;
    for line in src.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        if let Some(rest) = trimmed.strip_prefix(key) {
            if rest.trim_start().starts_with('=') {
                return Some((offset + indent, trimmed.trim_end().len()).into());
            }
        }
        offset += line.len();
    }
    None
}

/// Read and validate the configuration at `path`.
///
/// # Errors
///
/// Returns a diagnostic pointing at the offending line when the file is
/// unreadable, malformed, or fails validation.
pub fn load_config(path: &Path) -> miette::Result<Config> {
    let src = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::new(
            format!("failed to read {}: {e}", path.display()),
            path,
            String::new(),
        )
        .with_help("create the file or pass --config <PATH>")
    })?;
    Config::parse_toml(&src).map_err(|e| ConfigError::from_load_error(path, &src, e).into())
}

/// Training failure with a suggestion.
#[derive(Debug, Error, Diagnostic)]
#[error("training failed: {source}")]
#[diagnostic(code(armada::training))]
pub struct TrainingFailed {
    #[source]
    pub source: TrainingError,

    #[help]
    pub help: Option<String>,
}

impl From<TrainingError> for TrainingFailed {
    fn from(source: TrainingError) -> Self {
        let help = match &source {
            TrainingError::DatasetUnavailable(_) => {
                Some("check the dataset path and that rows look like `2024.01.02,00:00,open,high,low,close`".to_string())
            }
            TrainingError::NoDatasetSource => {
                Some("set training.dataset in the config or pass --dataset".to_string())
            }
            _ => None,
        };
        Self { source, help }
    }
}

/// Critical readiness checks failed.
#[derive(Debug, Error, Diagnostic)]
#[error("{count} critical check(s) failed")]
#[diagnostic(
    code(armada::check),
    help("fix the failed checks above, then run `armada check config` again")
)]
pub struct CheckFailed {
    pub count: usize,
}
