use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chart::Viewport;
use common::{DashError, DashResult, SymbolCatalog};
use serde::Deserialize;
use subscription::STORAGE_PREFIX;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// tick 间隔（毫秒）
    pub tick_interval_ms: u64,

    /// 每个标的保留多少条历史
    pub history_capacity: usize,

    /// 默认日志级别，RUST_LOG 会覆盖
    pub log_level: String,

    /// 订阅列表落盘文件
    pub storage_path: String,

    pub storage_prefix: String,

    /// 事件队列容量
    pub event_queue_capacity: usize,

    pub symbols: Vec<SymbolEntry>,

    pub viewport: Viewport,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    pub initial_price: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            history_capacity: 60,
            log_level: "info".to_string(),
            storage_path: "data/subscriptions.json".to_string(),
            storage_prefix: STORAGE_PREFIX.to_string(),
            event_queue_capacity: 500,
            symbols: SymbolCatalog::DEFAULT_ENTRIES
                .iter()
                .map(|(name, initial_price)| SymbolEntry {
                    name: name.to_string(),
                    initial_price: *initial_price,
                })
                .collect(),
            viewport: Viewport::default(),
        }
    }
}

/// 校验后的最终配置
#[derive(Debug, Clone)]
pub struct FinalConfig {
    pub tick_period: Duration,
    pub history_capacity: usize,
    pub log_level: String,
    pub storage_path: PathBuf,
    pub storage_prefix: String,
    pub event_queue_capacity: usize,
    pub catalog: SymbolCatalog,
    pub viewport: Viewport,
    /// None 表示没有配置文件，使用默认值
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn parse(content: &str) -> DashResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 所有启动期致命条件都在这里报出
    pub fn validate(self, source: Option<PathBuf>) -> DashResult<FinalConfig> {
        if self.tick_interval_ms == 0 {
            return Err(DashError::Config("tick_interval_ms must be > 0".to_string()));
        }
        if self.history_capacity == 0 {
            return Err(DashError::Config("history_capacity must be > 0".to_string()));
        }
        if self.event_queue_capacity == 0 {
            return Err(DashError::Config("event_queue_capacity must be > 0".to_string()));
        }
        crate::logging::build_filter(None, &self.log_level)?;
        if self.storage_path.trim().is_empty() {
            return Err(DashError::Config("storage_path must not be empty".to_string()));
        }

        let entries: Vec<(&str, f64)> = self
            .symbols
            .iter()
            .map(|e| (e.name.as_str(), e.initial_price))
            .collect();
        let catalog = SymbolCatalog::new(&entries)?;
        self.viewport.validate()?;

        Ok(FinalConfig {
            tick_period: Duration::from_millis(self.tick_interval_ms),
            history_capacity: self.history_capacity,
            log_level: self.log_level,
            storage_path: PathBuf::from(self.storage_path),
            storage_prefix: self.storage_prefix,
            event_queue_capacity: self.event_queue_capacity,
            catalog,
            viewport: self.viewport,
            source,
        })
    }
}

impl Default for FinalConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(1000),
            history_capacity: 60,
            log_level: "info".to_string(),
            storage_path: PathBuf::from("data/subscriptions.json"),
            storage_prefix: STORAGE_PREFIX.to_string(),
            event_queue_capacity: 500,
            catalog: SymbolCatalog::default_catalog(),
            viewport: Viewport::default(),
            source: None,
        }
    }
}

/// 读取配置文件；文件不存在时用默认值，存在但无效则报错
pub fn load_config(path: impl AsRef<Path>) -> DashResult<FinalConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Config::default().validate(None);
    }
    let content = fs::read_to_string(path)?;
    Config::parse(&content)?.validate(Some(path.to_path_buf()))
}
