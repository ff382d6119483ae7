use chrono::{DateTime, Utc};
use common::{PriceState, Symbol};
use serde::{Deserialize, Serialize}; // 允许序列化和反序列化，便于落盘或转发


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Eq, Hash)]
pub enum EventType {
    Tick,
    Subscription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Tick(TickEvent),
    Subscription(SubscriptionEvent),
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::Tick(_) => EventType::Tick,
            EventPayload::Subscription(_) => EventType::Subscription,
        }
    }
}

/// 一次调度触发后整批提交的报价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// 自市场创建以来的第几个 tick，从 1 开始
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub quotes: Vec<(Symbol, PriceState)>,
}

impl TickEvent {
    pub fn quote(&self, symbol: &Symbol) -> Option<&PriceState> {
        self.quotes.iter().find(|(s, _)| s == symbol).map(|(_, q)| q)
    }
}

/// 某个用户的订阅列表发生变化（按订阅顺序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub user: String,
    pub subscriptions: Vec<Symbol>,
    pub selected: Option<Symbol>,
}
