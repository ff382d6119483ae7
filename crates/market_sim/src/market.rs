use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use common::{PriceState, Symbol, SymbolCatalog};
use event_engine::event::TickEvent;

use crate::history::HistoryBuffer;
use crate::simulator::PriceSimulator;

/// 调度器是唯一写者，读者拿读锁看到的总是完整的一批 tick
pub type SharedMarket = Arc<RwLock<MarketState>>;

/// 整个模拟市场：每个标的的当前报价 + 历史窗口
#[derive(Debug, Clone)]
pub struct MarketState {
    catalog: SymbolCatalog,
    quotes: HashMap<Symbol, PriceState>,
    history: HistoryBuffer,
    seq: u64,
    last_tick_at: Option<DateTime<Utc>>,
}

impl MarketState {
    pub fn new(catalog: SymbolCatalog, history_capacity: usize) -> Self {
        let quotes = catalog
            .symbols()
            .map(|s| {
                let initial = catalog.initial_price(s).unwrap_or(1.0);
                (s.clone(), PriceState::initial(initial))
            })
            .collect();
        Self {
            catalog,
            quotes,
            history: HistoryBuffer::new(history_capacity),
            seq: 0,
            last_tick_at: None,
        }
    }

    pub fn into_shared(self) -> SharedMarket {
        Arc::new(RwLock::new(self))
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn quote(&self, symbol: &Symbol) -> Option<PriceState> {
        self.quotes.get(symbol).copied()
    }

    pub fn history(&self, symbol: &Symbol) -> Vec<f64> {
        self.history.get(symbol)
    }

    pub fn history_buffer(&self) -> &HistoryBuffer {
        &self.history
    }

    /// 推进一个 tick：先算出所有标的的新报价，再整批提交，目录内所有标的都会推进
    pub fn apply_tick(&mut self, simulator: &mut PriceSimulator) -> TickEvent {
        let next: Vec<(Symbol, PriceState)> = self
            .catalog
            .symbols()
            .map(|s| {
                let previous = self.quotes.get(s).map_or(1.0, |q| q.price);
                (s.clone(), simulator.step(previous))
            })
            .collect();

        for (symbol, state) in &next {
            self.quotes.insert(symbol.clone(), *state);
            self.history.append(symbol, state.price);
        }

        let at = Utc::now();
        self.seq += 1;
        self.last_tick_at = Some(at);

        TickEvent {
            seq: self.seq,
            at,
            quotes: next,
        }
    }

    /// 当前报价快照（按目录顺序）
    pub fn snapshot(&self) -> TickEvent {
        TickEvent {
            seq: self.seq,
            at: self.last_tick_at.unwrap_or_else(Utc::now),
            quotes: self
                .catalog
                .symbols()
                .filter_map(|s| self.quotes.get(s).map(|q| (s.clone(), *q)))
                .collect(),
        }
    }
}

/// 读锁；写者 panic 时数据仍是上一批完整提交，直接继续读
pub fn read_market(market: &SharedMarket) -> RwLockReadGuard<'_, MarketState> {
    market.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_market(market: &SharedMarket) -> RwLockWriteGuard<'_, MarketState> {
    market.write().unwrap_or_else(PoisonError::into_inner)
}
