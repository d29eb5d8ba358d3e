//! Expected-failure directives
//!
//! `@Fails(error: M)` before a `let` or `fun` asserts that checking the
//! declaration fails with message `M`. A declaration that fails as expected
//! is not registered; anything else is a harness failure.

use super::checker::TypeChecker;
use super::error::CheckError;
use crate::parser::ast::{Directive, Item};

/// Result of checking one declaration under the directive protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Checked and registered
    Checked,
    /// Failed with the message its directive names
    ExpectedFailure {
        /// The message
        message: String,
    },
}

/// Tally of a checked source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureReport {
    /// Declarations checked and registered
    pub checked: usize,
    /// Declarations that failed as their directive expected
    pub expected_failures: usize,
}

impl FixtureReport {
    /// Record one outcome.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Checked => self.checked += 1,
            Outcome::ExpectedFailure { .. } => self.expected_failures += 1,
        }
    }

    /// Total declarations seen
    pub fn total(&self) -> usize {
        self.checked + self.expected_failures
    }
}

/// The message a directive expects, without an `error:` prefix.
pub fn expected_message(directive: &Directive) -> &str {
    let text = directive.text.trim();
    text.strip_prefix("error:").map(str::trim).unwrap_or(text)
}

impl TypeChecker<'_> {
    /// Check a declaration, honouring its `@Fails` directive if it has one.
    pub fn check_directed(&mut self, item: &Item) -> Result<Outcome, CheckError> {
        let Some(directive) = &item.directive else {
            self.check_item(item)?;
            return Ok(Outcome::Checked);
        };
        let expected = expected_message(directive);

        let result = self.check_uncommitted(item);
        self.rollback();
        match result {
            Ok(()) => Err(CheckError::UnexpectedSuccess {
                expected: expected.to_string(),
                span: directive.span,
            }),
            Err(err) => {
                let found = err.to_string();
                if found == expected {
                    Ok(Outcome::ExpectedFailure { message: found })
                } else {
                    tracing::warn!(%expected, %found, "declaration failed differently than expected");
                    Err(CheckError::WrongDiagnostic {
                        expected: expected.to_string(),
                        found,
                        span: directive.span,
                    })
                }
            }
        }
    }
}
