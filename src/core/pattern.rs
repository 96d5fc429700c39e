//! Compiles and evaluates a single rule pattern under one of the three matching modes.

use super::error::CoreError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a rule's `pattern` string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternType {
    /// Exact string equality.
    #[default]
    Strict,
    /// Shell-glob style: `*` is any run of characters, `?` any single character,
    /// everything else literal. Anchored to the whole subject.
    Wildcard,
    /// A regular expression tested for a match anywhere in the subject.
    Regex,
}

/// A pattern ready to be tested against many subjects.
///
/// Compile once per resolution pass, then call [`Pattern::is_match`] per entry.
#[derive(Debug, Clone)]
pub struct Pattern {
    inner: Compiled,
}

#[derive(Debug, Clone)]
enum Compiled {
    Never,
    Exact(String),
    Regex(Regex),
}

impl Pattern {
    /// A pattern that matches nothing.
    pub fn never() -> Self {
        Self {
            inner: Compiled::Never,
        }
    }

    /// Compiles `pattern` under `pattern_type`.
    ///
    /// An empty pattern compiles to [`Pattern::never`]. A regex the engine
    /// rejects is reported as [`CoreError::InvalidPattern`].
    pub fn compile(pattern: &str, pattern_type: PatternType) -> Result<Self, CoreError> {
        if pattern.is_empty() {
            return Ok(Self::never());
        }

        let inner = match pattern_type {
            PatternType::Strict => Compiled::Exact(pattern.to_string()),
            PatternType::Wildcard => Compiled::Regex(build_regex(pattern, &wildcard_to_regex(pattern))?),
            PatternType::Regex => Compiled::Regex(build_regex(pattern, pattern)?),
        };

        Ok(Self { inner })
    }

    /// Like [`Pattern::compile`], but a malformed pattern fails closed: it is
    /// logged and compiled to a pattern that never matches.
    pub fn compile_or_never(pattern: &str, pattern_type: PatternType) -> Self {
        Self::compile(pattern, pattern_type).unwrap_or_else(|e| {
            tracing::warn!("Ignoring rule with invalid pattern: {}", e);
            Self::never()
        })
    }

    /// Tests `subject` against the compiled pattern.
    pub fn is_match(&self, subject: &str) -> bool {
        match &self.inner {
            Compiled::Never => false,
            Compiled::Exact(expected) => expected == subject,
            Compiled::Regex(re) => re.is_match(subject),
        }
    }

    /// `true` if this pattern can never match anything.
    pub fn is_never(&self) -> bool {
        matches!(self.inner, Compiled::Never)
    }
}

fn build_regex(original: &str, source: &str) -> Result<Regex, CoreError> {
    Regex::new(source).map_err(|source| CoreError::InvalidPattern {
        pattern: original.to_string(),
        source,
    })
}

/// Translates a wildcard expression into an anchored regular expression.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push_str("(?s)^");

    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                translated.push_str(&regex::escape(&literal));
                literal.clear();
                translated.push_str(if c == '*' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    translated.push_str(&regex::escape(&literal));
    translated.push('$');

    translated
}

/// One-shot convenience: compiles and tests in a single call, failing closed.
pub fn matches(pattern: &str, pattern_type: PatternType, subject: &str) -> bool {
    Pattern::compile_or_never(pattern, pattern_type).is_match(subject)
}
