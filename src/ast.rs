//! 查询项（term）的类型定义
//!
//! 每个 token 最多解析为一个查询项。查询项可以渲染回文本，也可以生成针对
//! [`RunRecord`] 的谓词。

use crate::run::RunRecord;
use crate::time::{parse_time_or_offset, TimeContext};
use jiff::Timestamp;
use std::fmt;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    New,
    Scheduled,
    Running,
    Success,
    Failure,
    Error,
}

/// 固定的状态词表，顺序即界面上的显示顺序
pub const STATES: [RunState; 6] = [
    RunState::New,
    RunState::Scheduled,
    RunState::Running,
    RunState::Success,
    RunState::Failure,
    RunState::Error,
];

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::New => "new",
            RunState::Scheduled => "scheduled",
            RunState::Running => "running",
            RunState::Success => "success",
            RunState::Failure => "failure",
            RunState::Error => "error",
        }
    }

    /// 按唯一前缀匹配状态名，例如 `run` → `running`
    ///
    /// 没有匹配或匹配不唯一（如 `s`）时返回 None。
    pub fn prefix_match(abbrev: &str) -> Option<RunState> {
        let mut matches = STATES.iter().filter(|s| s.as_str().starts_with(abbrev));
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(*first),
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 查询项的种类，用于编辑器按种类查找和替换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    State,
    Since,
    Arg,
    JobName,
}

/// 一个已解析的查询项
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `state:running,success`
    State(StateTerm),
    /// `since:-1d`
    Since(SinceTerm),
    /// `name=value`
    Arg(ArgTerm),
    /// 裸关键字，匹配 job id
    JobName(JobNameTerm),
}

impl Term {
    pub fn kind(&self) -> TermKind {
        match self {
            Term::State(_) => TermKind::State,
            Term::Since(_) => TermKind::Since,
            Term::Arg(_) => TermKind::Arg,
            Term::JobName(_) => TermKind::JobName,
        }
    }

    /// 生成该查询项的谓词；`since` 在此时按 `time` 解析为具体时刻
    pub fn predicate(&self, time: &TimeContext) -> Predicate {
        match self {
            Term::State(term) => term.predicate(),
            Term::Since(term) => term.predicate(time),
            Term::Arg(term) => term.predicate(),
            Term::JobName(term) => term.predicate(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::State(term) => fmt::Display::fmt(term, f),
            Term::Since(term) => fmt::Display::fmt(term, f),
            Term::Arg(term) => fmt::Display::fmt(term, f),
            Term::JobName(term) => fmt::Display::fmt(term, f),
        }
    }
}

/// 状态过滤：运行状态属于集合中任意一个即匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTerm {
    pub states: Vec<RunState>,
}

impl StateTerm {
    pub fn new(states: Vec<RunState>) -> Self {
        Self { states }
    }

    /// 从逗号分隔的缩写列表构造，无法唯一匹配的部分直接丢弃
    pub fn parse(value: &str) -> Self {
        let states = value.split(',').filter_map(RunState::prefix_match).collect();
        Self { states }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::StateIn(self.states.clone())
    }
}

impl fmt::Display for StateTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("state:")?;
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(state.as_str())?;
        }
        Ok(())
    }
}

/// 时间过滤：运行的结束时间不早于给定时刻
///
/// 保留用户输入的原始字符串（如 `-1d`），只在生成谓词时解析。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinceTerm {
    pub value: String,
}

impl SinceTerm {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// 解析为具体时刻，失败时返回 None
    pub fn resolve(&self, time: &TimeContext) -> Option<Timestamp> {
        parse_time_or_offset(&self.value, false, time)
    }

    pub fn predicate(&self, time: &TimeContext) -> Predicate {
        match self.resolve(time) {
            Some(instant) => Predicate::EndsSince(instant),
            None => Predicate::Never,
        }
    }
}

impl fmt::Display for SinceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "since:{}", self.value)
    }
}

/// 参数过滤：`arg` 参数的值包含 `val`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgTerm {
    pub arg: String,
    pub val: String,
}

impl ArgTerm {
    pub fn new(arg: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            arg: arg.into(),
            val: val.into(),
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::ArgContains {
            arg: self.arg.clone(),
            val: self.val.clone(),
        }
    }
}

impl fmt::Display for ArgTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.arg, self.val)
    }
}

/// 关键字过滤：job id 包含该字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobNameTerm {
    pub name: String,
}

impl JobNameTerm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate::JobIdContains(self.name.clone())
    }
}

impl fmt::Display for JobNameTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 单个查询项编译后的谓词
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// 状态属于集合
    StateIn(Vec<RunState>),
    /// 时间范围的结束时刻不早于给定时刻
    EndsSince(Timestamp),
    /// `since` 无法解析时，不匹配任何运行
    Never,
    ArgContains { arg: String, val: String },
    JobIdContains(String),
}

impl Predicate {
    pub fn matches(&self, run: &RunRecord) -> bool {
        match self {
            Predicate::StateIn(states) => states.iter().any(|s| s.as_str() == run.state),
            Predicate::EndsSince(instant) => run
                .time_range
                .is_some_and(|(_, end)| end >= *instant),
            Predicate::Never => false,
            Predicate::ArgContains { arg, val } => run
                .args
                .get(arg)
                .is_some_and(|value| value.contains(val.as_str())),
            Predicate::JobIdContains(name) => run.job_id.contains(name.as_str()),
        }
    }
}
