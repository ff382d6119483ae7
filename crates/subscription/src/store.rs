use common::{DashResult, Symbol, SymbolCatalog};
use event_engine::event::{EventPayload, SubscriptionEvent};
use event_engine::event_dispatcher::QueueEventDispatcherProducer;
use serde_json::Value;

use crate::identity::UserIdentity;
use crate::kv::KvStore;

/// 持久化 key 前缀
pub const STORAGE_PREFIX: &str = "subscriptions_";

pub fn storage_key(prefix: &str, identity: &UserIdentity) -> String {
    format!("{prefix}{identity}")
}

/// 单个用户的订阅列表 + 当前选中的标的。
///
/// 订阅按订阅顺序保存且不重复，成员都来自目录；选中的标的要么为空要么已订阅。
pub struct SubscriptionStore {
    identity: UserIdentity,
    catalog: SymbolCatalog,
    kv: Box<dyn KvStore + Send>,
    key: String,
    subscriptions: Vec<Symbol>,
    selected: Option<Symbol>,
    producer: Option<QueueEventDispatcherProducer>,
}

impl SubscriptionStore {
    pub fn open(identity: UserIdentity, catalog: SymbolCatalog, kv: Box<dyn KvStore + Send>) -> Self {
        Self::open_with_prefix(identity, catalog, kv, STORAGE_PREFIX)
    }

    /// 构造时即从持久化层加载
    pub fn open_with_prefix(
        identity: UserIdentity,
        catalog: SymbolCatalog,
        kv: Box<dyn KvStore + Send>,
        prefix: &str,
    ) -> Self {
        let key = storage_key(prefix, &identity);
        let mut store = Self {
            identity,
            catalog,
            kv,
            key,
            subscriptions: Vec::new(),
            selected: None,
            producer: None,
        };
        store.subscriptions = store.load();
        log::info!(
            target: "subscription::store",
            "[订阅] 用户 {} 已加载 {} 个订阅",
            store.identity,
            store.subscriptions.len()
        );
        store
    }

    pub fn with_producer(mut self, producer: QueueEventDispatcherProducer) -> Self {
        self.producer = Some(producer);
        self
    }

    pub fn identity(&self) -> &UserIdentity {
        &self.identity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    /// 读取持久化数据；缺失、损坏或不是数组都返回空，不在目录中的条目被丢弃
    pub fn load(&self) -> Vec<Symbol> {
        let Some(raw) = self.kv.get(&self.key) else {
            return Vec::new();
        };
        parse_persisted(&raw, &self.catalog)
    }

    pub fn subscriptions(&self) -> &[Symbol] {
        &self.subscriptions
    }

    pub fn is_subscribed(&self, symbol: &Symbol) -> bool {
        self.subscriptions.contains(symbol)
    }

    pub fn selected(&self) -> Option<&Symbol> {
        self.selected.as_ref()
    }

    /// 已订阅则取消（保持其余顺序），否则追加到末尾；取消的正好是选中项时清空选中
    pub fn toggle(&mut self, symbol: &Symbol) -> Vec<Symbol> {
        if !self.catalog.contains(symbol.as_str()) {
            log::debug!(target: "subscription::store", "[订阅] 忽略目录外标的 {symbol}");
            return self.subscriptions.clone();
        }

        if let Some(pos) = self.subscriptions.iter().position(|s| s == symbol) {
            self.subscriptions.remove(pos);
            if self.selected.as_ref() == Some(symbol) {
                self.selected = None;
            }
        } else {
            self.subscriptions.push(symbol.clone());
        }

        if let Err(e) = self.persist() {
            log::warn!(target: "subscription::store", "[订阅] 用户 {} 保存失败，仅保留内存状态: {e}", self.identity);
        }
        self.publish();
        self.subscriptions.clone()
    }

    /// 按用户输入切换，输入不在目录中时返回 None
    pub fn toggle_by_name(&mut self, name: &str) -> Option<Vec<Symbol>> {
        let symbol = self.catalog.parse(name)?.clone();
        Some(self.toggle(&symbol))
    }

    /// 全量写回当前订阅列表
    pub fn persist(&mut self) -> DashResult<()> {
        let names: Vec<&str> = self.subscriptions.iter().map(Symbol::as_str).collect();
        let json = serde_json::to_string(&names)?;
        self.kv.set(&self.key, json)
    }

    /// 只能选中已订阅的标的，否则保持不变并返回 false
    pub fn select(&mut self, symbol: &Symbol) -> bool {
        if !self.is_subscribed(symbol) {
            return false;
        }
        self.selected = Some(symbol.clone());
        self.publish();
        true
    }

    pub fn clear_selection(&mut self) {
        if self.selected.take().is_some() {
            self.publish();
        }
    }

    fn publish(&self) {
        if let Some(p) = &self.producer {
            p.fire(EventPayload::Subscription(SubscriptionEvent {
                user: self.identity.to_string(),
                subscriptions: self.subscriptions.clone(),
                selected: self.selected.clone(),
            }));
        }
    }
}

fn parse_persisted(raw: &str, catalog: &SymbolCatalog) -> Vec<Symbol> {
    let items = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            log::warn!(target: "subscription::store", "[订阅] 持久化数据不是数组，按空处理");
            return Vec::new();
        }
        Err(e) => {
            log::warn!(target: "subscription::store", "[订阅] 持久化数据解析失败，按空处理: {e}");
            return Vec::new();
        }
    };

    let mut out: Vec<Symbol> = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str().and_then(|name| catalog.get(name)) {
            Some(symbol) if !out.contains(symbol) => out.push(symbol.clone()),
            Some(_) => {}
            None => log::debug!(target: "subscription::store", "[订阅] 丢弃目录外条目 {item}"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{MemoryKv, SharedKv};
    use event_engine::event_dispatcher::QueueEventDispatcher;
    use std::sync::{Arc, Mutex};

    fn user() -> UserIdentity {
        UserIdentity::new("trader@example.com").unwrap()
    }

    fn catalog() -> SymbolCatalog {
        SymbolCatalog::default_catalog()
    }

    fn sym(name: &str) -> Symbol {
        catalog().get(name).unwrap().clone()
    }

    fn store_with(raw: Option<&str>) -> (SubscriptionStore, SharedKv<MemoryKv>) {
        let shared: SharedKv<MemoryKv> = Arc::new(Mutex::new(MemoryKv::new()));
        if let Some(raw) = raw {
            shared
                .lock()
                .unwrap()
                .set("subscriptions_trader@example.com", raw.to_string())
                .unwrap();
        }
        let store = SubscriptionStore::open(user(), catalog(), Box::new(shared.clone()));
        (store, shared)
    }

    #[test]
    fn malformed_persisted_data_loads_empty() {
        for raw in ["not json", "{}", "[1,2,3]", "\"GOOG\"", "null"] {
            let (store, _) = store_with(Some(raw));
            assert!(store.subscriptions().is_empty(), "input {raw:?} should load empty");
        }
    }

    #[test]
    fn non_catalog_and_duplicate_entries_are_dropped() {
        let (store, _) = store_with(Some(r#"["TSLA","AAPL","GOOG","TSLA",7]"#));
        assert_eq!(store.subscriptions(), &[sym("TSLA"), sym("GOOG")]);
    }

    #[test]
    fn toggle_appends_and_removes_preserving_order() {
        let (mut store, _) = store_with(None);
        store.toggle(&sym("AMZN"));
        store.toggle(&sym("GOOG"));
        store.toggle(&sym("META"));
        let after = store.toggle(&sym("GOOG"));
        assert_eq!(after, vec![sym("AMZN"), sym("META")]);
    }

    #[test]
    fn toggle_is_its_own_inverse() {
        let (mut store, _) = store_with(Some(r#"["NVDA","TSLA"]"#));
        let before = store.subscriptions().to_vec();
        for name in ["GOOG", "TSLA", "NVDA"] {
            store.toggle(&sym(name));
            store.toggle(&sym(name));
            assert_eq!(store.subscriptions(), before.as_slice(), "toggle twice on {name}");
        }
    }

    #[test]
    fn every_toggle_is_persisted() {
        let (mut store, shared) = store_with(None);
        store.toggle(&sym("GOOG"));
        store.toggle(&sym("TSLA"));
        assert_eq!(
            shared.get("subscriptions_trader@example.com").as_deref(),
            Some(r#"["GOOG","TSLA"]"#)
        );
        store.toggle(&sym("GOOG"));
        assert_eq!(
            shared.get("subscriptions_trader@example.com").as_deref(),
            Some(r#"["TSLA"]"#)
        );

        let reopened = SubscriptionStore::open(user(), catalog(), Box::new(shared.clone()));
        assert_eq!(reopened.subscriptions(), &[sym("TSLA")]);
    }

    #[test]
    fn removing_selected_symbol_clears_selection() {
        let (mut store, _) = store_with(None);
        store.toggle(&sym("GOOG"));
        store.toggle(&sym("TSLA"));
        assert!(store.select(&sym("GOOG")));

        store.toggle(&sym("GOOG"));
        assert_eq!(store.subscriptions(), &[sym("TSLA")]);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn removing_other_symbol_keeps_selection() {
        let (mut store, _) = store_with(None);
        store.toggle(&sym("GOOG"));
        store.toggle(&sym("TSLA"));
        store.select(&sym("TSLA"));
        store.toggle(&sym("GOOG"));
        assert_eq!(store.selected(), Some(&sym("TSLA")));
    }

    #[test]
    fn only_subscribed_symbols_can_be_selected() {
        let (mut store, _) = store_with(None);
        assert!(!store.select(&sym("META")));
        assert_eq!(store.selected(), None);
        store.toggle(&sym("META"));
        assert!(store.select(&sym("META")));
        store.clear_selection();
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn symbols_outside_catalog_are_ignored() {
        let small = SymbolCatalog::new(&[("GOOG", 150.0)]).unwrap();
        let mut store = SubscriptionStore::open(user(), small, Box::new(MemoryKv::new()));
        assert!(store.toggle(&sym("TSLA")).is_empty());
        assert_eq!(store.toggle_by_name("goog"), Some(vec![sym("GOOG")]));
        assert_eq!(store.toggle_by_name("AAPL"), None);
    }

    #[test]
    fn users_are_isolated_by_key() {
        let shared: SharedKv<MemoryKv> = Arc::new(Mutex::new(MemoryKv::new()));
        let mut alice = SubscriptionStore::open(
            UserIdentity::new("alice").unwrap(),
            catalog(),
            Box::new(shared.clone()),
        );
        let bob = SubscriptionStore::open(UserIdentity::new("bob").unwrap(), catalog(), Box::new(shared.clone()));
        alice.toggle(&sym("NVDA"));
        assert_eq!(alice.key(), "subscriptions_alice");
        assert!(bob.load().is_empty());
    }

    struct FailingKv;

    impl KvStore for FailingKv {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: String) -> DashResult<()> {
            Err(common::DashError::Storage("disk full".to_string()))
        }
    }

    #[test]
    fn failed_persist_keeps_memory_state() {
        let mut store = SubscriptionStore::open(user(), catalog(), Box::new(FailingKv));
        assert_eq!(store.toggle(&sym("AMZN")), vec![sym("AMZN")]);
        assert!(store.persist().is_err());
        assert!(store.is_subscribed(&sym("AMZN")));
    }

    #[test]
    fn toggles_publish_subscription_events() {
        let (producer, consumer) = QueueEventDispatcher::new(8).split();
        let (store, _) = store_with(None);
        let mut store = store.with_producer(producer);
        store.toggle(&sym("GOOG"));
        store.select(&sym("GOOG"));

        let events: Vec<_> = std::iter::from_fn(|| consumer.try_next()).collect();
        assert_eq!(events.len(), 2);
        match &events[1].data {
            EventPayload::Subscription(ev) => {
                assert_eq!(ev.user, "trader@example.com");
                assert_eq!(ev.subscriptions, vec![sym("GOOG")]);
                assert_eq!(ev.selected, Some(sym("GOOG")));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
