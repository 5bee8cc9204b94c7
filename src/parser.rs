//! 查询项的语法分析器
//!
//! ## 分类规则（按优先级）
//!
//! ```text
//! parse_term(token)
//!   ├─ 有 ':' 且 (没有 '=' 或 ':' 在 '=' 之前) → tag:value
//!   │     ├─ state / states → StateTerm
//!   │     ├─ since          → SinceTerm
//!   │     └─ 其他标签        → None（保留给以后的标签，静默忽略）
//!   ├─ 有 '='                → ArgTerm(arg=val)
//!   └─ 其他                   → JobNameTerm（匹配 job id 子串）
//! ```
//!
//! 解析永不失败：无法识别的 token 只是不产生查询项，用户输入到一半的查询
//! 仍然可以按已识别的部分过滤。
//!
//! ## 示例
//!
//! ```text
//! state:run,succ     → StateTerm [running, success]
//! since:-1d          → SinceTerm "-1d"
//! host=db01          → ArgTerm host / db01
//! url=http://x       → ArgTerm url / http://x （'=' 在 ':' 之前）
//! nightly            → JobNameTerm "nightly"
//! owner:alice        → None
//! ```

use crate::ast::{ArgTerm, JobNameTerm, SinceTerm, StateTerm, Term};
use crate::lexer::tokenize;
use crate::token::Token;

/// 按分隔符对 token 的语法分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// `tag:value`
    Tagged { tag: &'a str, value: &'a str },
    /// `arg=val`
    Assignment { arg: &'a str, val: &'a str },
    /// 不含 ':' 和 '=' 的关键字
    Keyword(&'a str),
}

/// 根据第一个 ':' 和第一个 '=' 的位置对 token 分类
pub fn classify(token: &str) -> Classified<'_> {
    let clx = token.find(':');
    let eqx = token.find('=');

    match (clx, eqx) {
        (Some(c), None) => tagged(token, c),
        (Some(c), Some(e)) if c < e => tagged(token, c),
        (_, Some(e)) => Classified::Assignment {
            arg: &token[..e],
            val: &token[e + 1..],
        },
        (None, None) => Classified::Keyword(token),
    }
}

fn tagged(token: &str, colon: usize) -> Classified<'_> {
    Classified::Tagged {
        tag: &token[..colon],
        value: &token[colon + 1..],
    }
}

/// 将单个 token 解析为查询项；未知标签返回 None
pub fn parse_term(token: &str) -> Option<Term> {
    match classify(token) {
        Classified::Tagged { tag, value } => parse_tagged(tag, value),
        Classified::Assignment { arg, val } => Some(Term::Arg(ArgTerm::new(arg, val))),
        Classified::Keyword(word) => Some(Term::JobName(JobNameTerm::new(word))),
    }
}

fn parse_tagged(tag: &str, value: &str) -> Option<Term> {
    match tag {
        "state" | "states" => Some(Term::State(StateTerm::parse(value))),
        "since" => Some(Term::Since(SinceTerm::new(value))),
        // 其他标签保留给以后使用
        _ => None,
    }
}

/// 一个 token 及其解析结果，与原查询中的位置一一对应
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToken<'a> {
    pub token: Token<'a>,
    pub term: Option<Term>,
}

pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self { tokens }
    }

    /// 逐个解析 token，保留未识别的 token（`term` 为 None）
    pub fn parse(&self) -> Vec<ParsedToken<'a>> {
        self.tokens
            .iter()
            .map(|token| ParsedToken {
                token: token.clone(),
                term: parse_term(token.text),
            })
            .collect()
    }
}

/// 分词并解析整个查询，结果与 token 位置对齐
pub fn parse_query(input: &str) -> Vec<ParsedToken<'_>> {
    let tokens = tokenize(input);
    Parser::new(&tokens).parse()
}

/// 分词并解析整个查询，只保留识别出的查询项
pub fn parse_terms(input: &str) -> Vec<Term> {
    tokenize(input)
        .iter()
        .filter_map(|token| parse_term(token.text))
        .collect()
}
