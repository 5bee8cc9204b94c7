use anyhow::{Context, Result};
use run_query::config::QueryConfig;
use run_query::run::{load_runs, RunRecord};
use run_query::time::{format_elapsed, format_time};
use run_query::{FilterCompiler, SinceTerm, StateTerm, STATES};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "run_query.json";

const HELP: &str = "\
<查询>          设置当前查询并列出匹配的运行
:state a,b      设置状态过滤（支持唯一前缀，如 run,fail）；不带参数则清除
:since 值       设置时间过滤（如 -1d、today、\"2024-01-05 12:00\"）；不带参数则清除
:show           显示当前查询及提示
:quit           退出";

/// 加载配置；只有文件不存在时才使用默认配置
fn load_config(path: &str) -> Result<QueryConfig> {
    match QueryConfig::from_json_file_if_exists(path)? {
        Some(config) => {
            info!(path, time_zone = config.time_zone.as_str(), "已加载配置文件");
            Ok(config)
        }
        None => {
            warn!(path, "配置文件不存在，使用默认配置");
            Ok(QueryConfig::default())
        }
    }
}

/// REPL 的会话状态：配置、运行记录快照和当前查询
struct Session {
    config: QueryConfig,
    runs: Vec<RunRecord>,
    query: String,
}

impl Session {
    /// 处理一行输入，返回 false 表示退出
    fn handle(&mut self, line: &str) -> Result<bool> {
        let (command, argument) = match line.split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line, ""),
        };

        match command {
            ":quit" | ":q" => return Ok(false),
            ":help" | ":h" => println!("{}", HELP),
            ":show" => self.show()?,
            ":state" => {
                // 与状态复选框相同：只改写查询中的状态项
                let states = StateTerm::parse(argument).states;
                self.query = StateTerm::set(&self.query, &states);
                self.list()?;
            }
            ":since" => {
                self.query = SinceTerm::set(&self.query, argument);
                self.list()?;
            }
            _ if command.starts_with(':') => {
                println!("未知命令: {}（输入 :help 查看帮助）", command);
            }
            _ => {
                self.query = line.to_string();
                self.list()?;
            }
        }
        Ok(true)
    }

    fn compiler(&self) -> Result<FilterCompiler> {
        let time = self.config.time_context().context("无法创建时间上下文")?;
        Ok(FilterCompiler::new(time))
    }

    fn show(&self) -> Result<()> {
        println!("查询: {}", self.query);
        println!("状态: {:?}", StateTerm::get(&self.query));
        println!("since: {}", SinceTerm::get(&self.query));
        let filter = self.compiler()?.compile(&self.query);
        for diagnostic in filter.diagnostics() {
            println!("提示: {}", diagnostic);
        }
        Ok(())
    }

    /// 列出匹配当前查询的运行
    fn list(&self) -> Result<()> {
        let compiler = self.compiler()?;
        let filter = compiler.compile(&self.query);
        let tz = compiler.time().time_zone();

        println!("查询: {}", self.query);
        for diagnostic in filter.diagnostics() {
            println!("提示: {}", diagnostic);
        }

        let matched = filter.apply(&self.runs);
        for run in &matched {
            let (ended, elapsed) = match run.time_range {
                Some((start, end)) => (
                    format_time(end, tz, &self.config.time_format)?,
                    format_elapsed(end.duration_since(start).as_secs_f64()),
                ),
                None => (String::new(), String::new()),
            };
            println!(
                "{:<12} {:<24} {:<10} {:<20} {}",
                run.run_id, run.job_id, run.state, ended, elapsed
            );
        }
        println!("共 {} / {} 个运行", matched.len(), self.runs.len());
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("--- Run Query: 运行过滤查询 ---");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_config(&config_path)?;

    let runs = match &config.runs_file {
        Some(path) => {
            let runs = load_runs(path).with_context(|| format!("无法加载运行记录 {}", path.display()))?;
            info!(count = runs.len(), "已加载运行记录");
            runs
        }
        None => {
            warn!("配置中没有 runs_file，运行列表为空");
            Vec::new()
        }
    };

    let states: Vec<&str> = STATES.iter().map(|s| s.as_str()).collect();
    println!("可用状态: {}", states.join(", "));
    println!("{}", HELP);

    let mut session = Session {
        query: config.initial_query.clone(),
        config,
        runs,
    };
    session.list()?;

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("runs> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;
                if !session.handle(line)? {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
