//! Compiler that turns a run query into a predicate over run records.

use crate::ast::{Predicate, Term};
use crate::lexer::tokenize;
use crate::parser::{classify, parse_term, Classified};
use crate::run::RunRecord;
use crate::time::TimeContext;
use std::fmt;
use tracing::debug;

/// Something the caller may want to surface about a query.
///
/// Diagnostics never change what a filter matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `tag:value` token whose tag is not recognized; it is ignored
    UnknownTag { token: String },
    /// A `since` value that is neither a date/time nor an offset; it
    /// excludes every run
    InvalidSince { value: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownTag { token } => write!(f, "ignored unknown tag in {:?}", token),
            Diagnostic::InvalidSince { value } => write!(f, "invalid since value {:?}", value),
        }
    }
}

/// A compiled query: the conjunction of its term predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFilter {
    predicates: Vec<Predicate>,
    diagnostics: Vec<Diagnostic>,
}

impl RunFilter {
    /// True if every predicate matches. An empty filter matches everything.
    pub fn matches(&self, run: &RunRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(run))
    }

    /// Filters `runs`, preserving their order.
    pub fn apply<'r>(&self, runs: &'r [RunRecord]) -> Vec<&'r RunRecord> {
        runs.iter().filter(|run| self.matches(run)).collect()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Compiles queries against a fixed time context.
pub struct FilterCompiler {
    time: TimeContext,
}

impl FilterCompiler {
    pub fn new(time: TimeContext) -> Self {
        Self { time }
    }

    pub fn time(&self) -> &TimeContext {
        &self.time
    }

    /// Compile a query string into a filter
    pub fn compile(&self, query: &str) -> RunFilter {
        let mut predicates = Vec::new();
        let mut diagnostics = Vec::new();

        for token in tokenize(query) {
            let Some(term) = parse_term(token.text) else {
                // Only tagged tokens fail to parse.
                if let Classified::Tagged { .. } = classify(token.text) {
                    diagnostics.push(Diagnostic::UnknownTag {
                        token: token.text.to_string(),
                    });
                }
                continue;
            };

            let predicate = term.predicate(&self.time);
            if let (Term::Since(since), Predicate::Never) = (&term, &predicate) {
                diagnostics.push(Diagnostic::InvalidSince {
                    value: since.value.clone(),
                });
            }
            predicates.push(predicate);
        }

        debug!(
            query,
            predicates = predicates.len(),
            diagnostics = diagnostics.len(),
            "compiled run query"
        );

        RunFilter {
            predicates,
            diagnostics,
        }
    }
}

/// Compile `query` against `time`.
pub fn compile(query: &str, time: &TimeContext) -> RunFilter {
    FilterCompiler::new(time.clone()).compile(query)
}
