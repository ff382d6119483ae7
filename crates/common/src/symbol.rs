// common/symbol.rs
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DashError, DashResult};

/// 交易标的代码，例如 "GOOG"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 固定标的目录：启动时给定，进程内不可变
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    entries: Vec<(Symbol, f64)>,
}

impl SymbolCatalog {
    /// 默认目录
    pub const DEFAULT_ENTRIES: [(&'static str, f64); 5] = [
        ("GOOG", 150.0),
        ("TSLA", 250.0),
        ("AMZN", 180.0),
        ("META", 500.0),
        ("NVDA", 120.0),
    ];

    /// 按给定顺序构造目录，名称与初始价必须合法
    pub fn new<S: AsRef<str>>(entries: &[(S, f64)]) -> DashResult<Self> {
        if entries.is_empty() {
            return Err(DashError::Catalog("catalog is empty".to_string()));
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(entries.len());
        for (name, initial_price) in entries {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(DashError::Catalog("blank symbol name".to_string()));
            }
            if !initial_price.is_finite() || *initial_price <= 0.0 {
                return Err(DashError::Catalog(format!(
                    "initial price of {name} must be positive, got {initial_price}"
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(DashError::Catalog(format!("duplicate symbol {name}")));
            }
            out.push((Symbol(name.to_string()), *initial_price));
        }

        Ok(Self { entries: out })
    }

    pub fn default_catalog() -> Self {
        Self {
            entries: Self::DEFAULT_ENTRIES
                .iter()
                .map(|(name, price)| (Symbol(name.to_string()), *price))
                .collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter().map(|(s, _)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 精确匹配
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries.iter().map(|(s, _)| s).find(|s| s.as_str() == name)
    }

    /// 解析用户输入，忽略大小写与首尾空白
    pub fn parse(&self, input: &str) -> Option<&Symbol> {
        let input = input.trim();
        self.entries
            .iter()
            .map(|(s, _)| s)
            .find(|s| s.as_str().eq_ignore_ascii_case(input))
    }

    pub fn initial_price(&self, symbol: &Symbol) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| *p)
    }
}
