//! Structured diagnostics produced while evaluating requests.
//!
//! The evaluator only ever records what went wrong; turning a
//! [`Diagnostic`] into text for the user is the job of whoever embeds it.

use std::{fmt, mem, slice};

use crate::loc::SourceLoc;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub loc: Option<SourceLoc>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "{}: {} ({})", self.level, self.message, loc),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// An append-only buffer of diagnostics, in the order they were reported.
///
/// Notes belong to the closest preceding error or warning.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, level: Level, loc: Option<SourceLoc>, message: impl ToString) {
        self.entries.push(Diagnostic {
            level,
            message: message.to_string(),
            loc,
        });
    }

    pub fn error(&mut self, loc: Option<SourceLoc>, message: impl ToString) {
        self.report(Level::Error, loc, message);
    }

    pub fn warning(&mut self, loc: Option<SourceLoc>, message: impl ToString) {
        self.report(Level::Warning, loc, message);
    }

    pub fn note(&mut self, loc: Option<SourceLoc>, message: impl ToString) {
        self.report(Level::Note, loc, message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|diag| diag.level == Level::Error)
    }

    pub fn iter(&self) -> slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Removes and returns everything reported so far.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.entries)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
