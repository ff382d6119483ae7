use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use common::{DashError, DashResult};
use serde_json::Value;

/// 持久化键值能力：只需要按 key 读写字符串
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> DashResult<()>;
}

/// 多个 store 共用一个后端时用 Arc<Mutex<_>> 串行化读写
pub type SharedKv<K> = Arc<Mutex<K>>;

impl<K: KvStore> KvStore for Arc<Mutex<K>> {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().unwrap_or_else(PoisonError::into_inner).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> DashResult<()> {
        self.lock().unwrap_or_else(PoisonError::into_inner).set(key, value)
    }
}

/// 纯内存实现（测试 / 无需落盘时）
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    map: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> DashResult<()> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }
}

/// 以单个 JSON 对象文件落盘，每次 set 都整体重写。
///
/// 值按 key 独立保存：某个 key 的值不是字符串时原样保留，`get` 返回它的 JSON 文本，
/// 由调用方自行判定是否可用。文件存在但读不出或不是 JSON 对象时只读，拒绝覆盖。
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    map: BTreeMap<String, Value>,
    /// Some 表示文件不可信，set 只改内存不落盘
    unreadable: Option<String>,
}

impl JsonFileKv {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (map, unreadable) = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
                Ok(map) => {
                    log::info!(target: "subscription::kv", "[恢复] 已从 {} 加载 {} 条记录", path.display(), map.len());
                    (map, None)
                }
                Err(e) => {
                    log::warn!(target: "subscription::kv", "[恢复] {} JSON 解析失败，按空处理且不覆盖: {e}", path.display());
                    (BTreeMap::new(), Some(format!("unparsable file: {e}")))
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(target: "subscription::kv", "[恢复] 未发现 {}，从空开始", path.display());
                (BTreeMap::new(), None)
            }
            Err(e) => {
                log::warn!(target: "subscription::kv", "[恢复] 读取 {} 失败，按空处理且不覆盖: {e}", path.display());
                (BTreeMap::new(), Some(format!("unreadable file: {e}")))
            }
        };
        Self { path, map, unreadable }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self) -> DashResult<()> {
        if let Some(reason) = &self.unreadable {
            return Err(DashError::Storage(format!(
                "refusing to overwrite {}: {reason}",
                self.path.display()
            )));
        }
        let storage_err = |e: std::io::Error| DashError::Storage(format!("{}: {e}", self.path.display()));
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(storage_err)?;
        }
        let json = serde_json::to_string_pretty(&self.map)?;
        fs::write(&self.path, json).map_err(storage_err)?;
        log::debug!(target: "subscription::kv", "[备份] 已保存到 {}", self.path.display());
        Ok(())
    }
}

impl KvStore for JsonFileKv {
    fn get(&self, key: &str) -> Option<String> {
        match self.map.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> DashResult<()> {
        self.map.insert(key.to_string(), Value::String(value));
        self.save_to_file()
    }
}
