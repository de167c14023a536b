//! Key material lookup: literal value, then environment variable, then file.

use crate::error::AuthError;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, Zeroizing};

/// Which candidate supplied the key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Value passed in code
    Literal,
    /// Environment variable
    Env,
    /// File on disk
    File,
    /// Built-in development fallback
    Fallback,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Literal => "literal",
            Self::Env => "env",
            Self::File => "file",
            Self::Fallback => "fallback",
        })
    }
}

/// Candidate locations for one piece of key material.
///
/// Resolution tries, in order, the literal value, the environment variable
/// and the file. The first non-empty candidate wins.
#[derive(Clone, Default)]
pub struct KeySource {
    literal: Option<Zeroizing<String>>,
    env: Option<String>,
    file: Option<PathBuf>,
}

impl KeySource {
    /// Source backed by a literal value only.
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::default().with_literal(value)
    }

    /// Set the literal candidate.
    #[must_use]
    pub fn with_literal(mut self, value: impl Into<String>) -> Self {
        self.literal = Some(Zeroizing::new(value.into()));
        self
    }

    /// Set the environment variable candidate.
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Set the file candidate.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Configured environment variable name.
    #[must_use]
    pub fn env_name(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Configured file path.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Resolve the first non-empty candidate.
    ///
    /// Every candidate is trimmed of surrounding whitespace, so the same
    /// secret yields the same key whichever candidate supplies it. Returns
    /// `Ok(None)` when every candidate is absent or empty.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configured file cannot be read.
    pub async fn resolve(&self) -> Result<Option<(Zeroizing<String>, SourceKind)>, AuthError> {
        if let Some(value) = &self.literal {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(Some((Zeroizing::new(trimmed.to_string()), SourceKind::Literal)));
            }
        }

        if let Some(name) = &self.env {
            if let Ok(mut value) = env::var(name) {
                let trimmed = Zeroizing::new(value.trim().to_string());
                value.zeroize();
                if !trimmed.is_empty() {
                    return Ok(Some((trimmed, SourceKind::Env)));
                }
            }
        }

        if let Some(path) = &self.file {
            let mut content = tokio::fs::read_to_string(path).await.map_err(|e| {
                AuthError::configuration(format!("Failed to read key file {}: {e}", path.display()))
            })?;
            let trimmed = Zeroizing::new(content.trim().to_string());
            content.zeroize();
            if !trimmed.is_empty() {
                return Ok(Some((trimmed, SourceKind::File)));
            }
        }

        Ok(None)
    }

    /// Resolve, failing with a configuration error when nothing is found.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming `what` if no candidate resolves.
    pub async fn resolve_required(
        &self,
        what: &str,
    ) -> Result<(Zeroizing<String>, SourceKind), AuthError> {
        self.resolve().await?.ok_or_else(|| {
            AuthError::configuration(format!("No {what} configured ({self:?})"))
        })
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySource")
            .field("literal", &self.literal.as_ref().map(|_| "<redacted>"))
            .field("env", &self.env)
            .field("file", &self.file)
            .finish()
    }
}
