//! Structured edits of a query string.
//!
//! UI controls such as the state checklist or the since picker own exactly one
//! kind of term. They read and write it through this module so the free text
//! around it is left alone: untouched tokens are re-emitted as their original
//! source text, in their original order.

use crate::ast::{RunState, SinceTerm, StateTerm, Term, TermKind};
use crate::parser::parse_query;
use tracing::trace;

/// Replaces the term of `kind` in `query` with `replacement`.
///
/// The first term of `kind` is replaced in place, or removed when
/// `replacement` is `None`. Any further terms of the same kind are removed.
/// If the query has no term of `kind`, the replacement is appended.
pub fn replace(query: &str, kind: TermKind, replacement: Option<&Term>) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut found = false;

    for parsed in parse_query(query) {
        let is_kind = parsed.term.as_ref().is_some_and(|term| term.kind() == kind);
        if !is_kind {
            parts.push(parsed.token.literal(query).to_string());
            continue;
        }
        if !found {
            if let Some(term) = replacement {
                parts.push(render_token(term));
            }
        }
        found = true;
    }

    if !found {
        if let Some(term) = replacement {
            parts.push(render_token(term));
        }
    }

    let edited = parts.join(" ");
    trace!(query, ?kind, edited = edited.as_str(), "replaced query term");
    edited
}

/// Renders a term as a single token, quoting it if it contains whitespace.
fn render_token(term: &Term) -> String {
    let text = term.to_string();
    if text.chars().any(char::is_whitespace) {
        format!("\"{}\"", text)
    } else {
        text
    }
}

/// Finds the first term of `kind` in `query`.
fn first_of_kind(query: &str, kind: TermKind) -> Option<Term> {
    parse_query(query)
        .into_iter()
        .filter_map(|parsed| parsed.term)
        .find(|term| term.kind() == kind)
}

impl StateTerm {
    /// The states selected by the first state term of `query`, or none.
    pub fn get(query: &str) -> Vec<RunState> {
        match first_of_kind(query, TermKind::State) {
            Some(Term::State(term)) => term.states,
            _ => Vec::new(),
        }
    }

    /// Sets the state term of `query`; an empty list removes it.
    pub fn set(query: &str, states: &[RunState]) -> String {
        let replacement = if states.is_empty() {
            None
        } else {
            Some(Term::State(StateTerm::new(states.to_vec())))
        };
        replace(query, TermKind::State, replacement.as_ref())
    }
}

impl SinceTerm {
    /// The raw value of the first since term of `query`, or an empty string.
    pub fn get(query: &str) -> String {
        match first_of_kind(query, TermKind::Since) {
            Some(Term::Since(term)) => term.value,
            _ => String::new(),
        }
    }

    /// Sets the since term of `query`; an empty value removes it.
    ///
    /// Double quotes are dropped from `value`: the rendered token may itself
    /// be quoted and quotes are not escaped.
    pub fn set(query: &str, value: &str) -> String {
        let value = value.replace('"', "");
        let value = value.trim();
        let replacement = if value.is_empty() {
            None
        } else {
            Some(Term::Since(SinceTerm::new(value)))
        };
        replace(query, TermKind::Since, replacement.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ArgTerm;
    use crate::lexer::tokenize;

    #[test]
    fn test_since_set_removes() {
        assert_eq!(SinceTerm::set("foo since:today bar", ""), "foo bar");
    }

    #[test]
    fn test_since_set_appends() {
        assert_eq!(SinceTerm::set("foo bar", "-1d"), "foo bar since:-1d");
        assert_eq!(SinceTerm::set("", "-1d"), "since:-1d");
    }

    #[test]
    fn test_since_set_replaces_in_place() {
        assert_eq!(
            SinceTerm::set("foo since:today bar", "yesterday"),
            "foo since:yesterday bar"
        );
    }

    #[test]
    fn test_since_with_daytime_is_quoted() {
        let query = SinceTerm::set("job", "2024-01-05 12:00");
        assert_eq!(query, r#"job "since:2024-01-05 12:00""#);
        assert_eq!(SinceTerm::get(&query), "2024-01-05 12:00");
    }

    #[test]
    fn test_since_set_drops_double_quotes() {
        let query = SinceTerm::set("job", r#"2024-01-05 "12:00""#);
        assert_eq!(query, r#"job "since:2024-01-05 12:00""#);
        assert_eq!(SinceTerm::get(&query), "2024-01-05 12:00");
        assert_eq!(tokenize(&query).len(), 2);

        assert_eq!(SinceTerm::set("job since:today", r#""""#), "job");
    }

    #[test]
    fn test_since_get() {
        assert_eq!(SinceTerm::get("a since:-2h b since:today"), "-2h");
        assert_eq!(SinceTerm::get("a b"), "");
    }

    #[test]
    fn test_state_set_twice_keeps_one_term() {
        let query = r#"nightly "x y" host=db"#;
        let once = StateTerm::set(query, &[RunState::Running]);
        assert_eq!(once, r#"nightly "x y" host=db state:running"#);

        let twice = StateTerm::set(&once, &[RunState::Success]);
        assert_eq!(twice, r#"nightly "x y" host=db state:success"#);
        assert_eq!(StateTerm::get(&twice), vec![RunState::Success]);
    }

    #[test]
    fn test_state_set_removes_duplicates() {
        let query = "state:new a states:run b state:err";
        assert_eq!(
            StateTerm::set(query, &[RunState::Failure, RunState::Error]),
            "state:failure,error a b"
        );
        assert_eq!(StateTerm::set(query, &[]), "a b");
    }

    #[test]
    fn test_state_get() {
        assert_eq!(
            StateTerm::get("x state:run,succ"),
            vec![RunState::Running, RunState::Success]
        );
        assert!(StateTerm::get("x y").is_empty());
        assert!(StateTerm::get("state:s").is_empty());
    }

    #[test]
    fn test_untouched_tokens_keep_literal_text() {
        // Unknown tags, abbreviations and quoting are not rewritten.
        let query = r#"owner:alice state:fail "nightly backup" date=2024"#;
        assert_eq!(
            SinceTerm::set(query, "today"),
            r#"owner:alice state:fail "nightly backup" date=2024 since:today"#
        );
    }

    #[test]
    fn test_replace_without_match_or_replacement() {
        assert_eq!(replace("  a   b ", TermKind::Since, None), "a b");
    }

    #[test]
    fn test_replace_generic_kind() {
        let replacement = Term::Arg(ArgTerm::new("host", "web"));
        assert_eq!(
            replace("host=db job host=x", TermKind::Arg, Some(&replacement)),
            "host=web job"
        );
    }
}
