//! 配置模块，负责加载JSON配置文件

use crate::time::{format_time, TimeContext, DEFAULT_TIME_FORMAT};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 配置错误
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "配置错误: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 查询配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// 解释日期和时间所用的 IANA 时区，例如 `Asia/Shanghai`
    pub time_zone: String,
    /// 运行记录快照（`/api/v1/runs` 的响应 JSON）
    pub runs_file: Option<PathBuf>,
    /// 显示时间的格式
    pub time_format: String,
    /// 启动时的查询
    pub initial_query: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            runs_file: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            initial_query: String::new(),
        }
    }
}

impl QueryConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        Self::from_json_file_if_exists(path_ref)?.ok_or_else(|| {
            ConfigError::new(format!("配置文件不存在: {}", path_ref.display()))
        })
    }

    /// 从JSON文件加载配置；文件不存在时返回 None
    ///
    /// 文件存在但无法读取、解析或校验时返回错误。
    pub fn from_json_file_if_exists<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path_ref = path.as_ref();

        // 读取文件内容
        let content = match fs::read_to_string(path_ref) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigError::new(format!(
                    "无法读取配置文件 {}: {}",
                    path_ref.display(),
                    e
                )))
            }
        };

        // 解析JSON
        let config: QueryConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::new(format!(
                "无法解析JSON配置文件 {}: {}",
                path_ref.display(),
                e
            )))?;

        config.validate()?;
        Ok(Some(config))
    }

    /// 检查时区和时间格式是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        let time = self.time_context()?;
        format_time(Timestamp::UNIX_EPOCH, time.time_zone(), &self.time_format)
            .map_err(|e| ConfigError::new(format!(
                "无效的时间格式 {:?}: {}",
                self.time_format,
                e
            )))?;
        Ok(())
    }

    /// 按配置的时区创建时间上下文，以当前时刻作为 "now"
    pub fn time_context(&self) -> Result<TimeContext, ConfigError> {
        TimeContext::from_name(&self.time_zone)
            .map_err(|e| ConfigError::new(format!("未知时区 {:?}: {}", self.time_zone, e)))
    }
}
