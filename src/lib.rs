pub mod ast;
pub mod compiler;
pub mod config;
pub mod editor;
pub mod lexer;
pub mod parser;
pub mod run;
pub mod time;
pub mod token;

pub use ast::{ArgTerm, JobNameTerm, Predicate, RunState, SinceTerm, StateTerm, Term, TermKind, STATES};
pub use compiler::{compile, Diagnostic, FilterCompiler, RunFilter};
pub use editor::replace;
pub use lexer::tokenize;
pub use parser::parse_term;
pub use run::RunRecord;
pub use time::TimeContext;
