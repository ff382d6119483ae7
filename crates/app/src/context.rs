use chart::{project, render_svg, Projection};
use common::{DashResult, PriceState, Symbol};
use event_engine::event::{EventType, TickEvent};
use event_engine::event_dispatcher::{EventData, QueueEventDispatcher, QueueEventDispatcherConsumer};
use market_sim::market::read_market;
use market_sim::{FactorSource, MarketState, PriceSimulator, SharedMarket, SharedScheduler, TickScheduler};
use subscription::{KvStore, SubscriptionStore, UserIdentity};

use crate::config::FinalConfig;

/// 一个用户的看板会话：共享市场的调度器句柄 + 该用户的订阅
pub struct DashboardSession {
    config: FinalConfig,
    scheduler: SharedScheduler,
    active: bool,
    store: SubscriptionStore,
    consumer: QueueEventDispatcherConsumer,
}

impl DashboardSession {
    /// 没有用户标识时直接报 Unauthenticated，不会构造订阅存储
    pub fn new(
        config: FinalConfig,
        identity: Option<&str>,
        kv: Box<dyn KvStore + Send>,
        source: Box<dyn FactorSource>,
    ) -> DashResult<Self> {
        let identity = UserIdentity::from_optional(identity)?;
        let scheduler = market_scheduler(&config, source);
        Ok(Self::with_scheduler(config, identity, kv, scheduler))
    }

    /// 在已有市场上开会话；同一市场的所有会话共用这一个调度器
    pub fn with_scheduler(
        config: FinalConfig,
        identity: UserIdentity,
        kv: Box<dyn KvStore + Send>,
        scheduler: SharedScheduler,
    ) -> Self {
        let (producer, consumer) = QueueEventDispatcher::new(config.event_queue_capacity).split();
        scheduler.add_producer(producer.clone());

        let store = SubscriptionStore::open_with_prefix(
            identity,
            config.catalog.clone(),
            kv,
            &config.storage_prefix,
        )
        .with_producer(producer);

        Self {
            config,
            scheduler,
            active: false,
            store,
            consumer,
        }
    }

    pub fn config(&self) -> &FinalConfig {
        &self.config
    }

    pub fn market(&self) -> &SharedMarket {
        self.scheduler.market()
    }

    pub fn scheduler(&self) -> &SharedScheduler {
        &self.scheduler
    }

    pub fn store(&self) -> &SubscriptionStore {
        &self.store
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 视图激活：登记到共享调度器，第一个激活的会话启动定时器。重复激活返回 false
    pub fn activate(&mut self) -> DashResult<bool> {
        if self.active {
            return Ok(false);
        }
        self.scheduler.acquire()?;
        self.active = true;
        Ok(true)
    }

    /// 视图失活：注销，最后一个会话离开时取消定时器。未激活时返回 false
    pub fn deactivate(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.scheduler.release();
        true
    }

    pub fn tick_now(&self) -> TickEvent {
        self.scheduler.tick_now()
    }

    /// 注册事件回调，在 process_events 时触发
    pub fn register_callback<F>(&mut self, event_type: EventType, callback: F)
    where
        F: Fn(&EventData) + Send + Sync + 'static,
    {
        self.consumer.register(event_type, Box::new(callback));
    }

    pub fn process_events(&self) -> usize {
        self.consumer.process()
    }

    /// 取出队列里的事件但不触发回调
    pub fn drain_events(&self) -> Vec<EventData> {
        std::iter::from_fn(|| self.consumer.try_next()).collect()
    }

    pub fn toggle(&mut self, symbol: &Symbol) -> Vec<Symbol> {
        self.store.toggle(symbol)
    }

    pub fn toggle_by_name(&mut self, name: &str) -> Option<Vec<Symbol>> {
        self.store.toggle_by_name(name)
    }

    /// 按名称选中；不在目录或未订阅时返回 false
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match self.config.catalog.parse(name).cloned() {
            Some(symbol) => self.store.select(&symbol),
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.store.clear_selection();
    }

    pub fn subscriptions(&self) -> &[Symbol] {
        self.store.subscriptions()
    }

    pub fn selected(&self) -> Option<&Symbol> {
        self.store.selected()
    }

    /// 已订阅标的的当前报价，按订阅顺序
    pub fn subscribed_quotes(&self) -> Vec<(Symbol, PriceState)> {
        let market = read_market(self.market());
        self.store
            .subscriptions()
            .iter()
            .filter_map(|s| market.quote(s).map(|q| (s.clone(), q)))
            .collect()
    }

    /// 当前选中标的的走势投影；未选中时为 Empty
    pub fn trend(&self) -> Projection {
        match self.store.selected() {
            Some(symbol) => {
                let series = read_market(self.market()).history(symbol);
                project(&series, &self.config.viewport)
            }
            None => Projection::Empty,
        }
    }

    pub fn trend_svg(&self) -> String {
        let title = self.store.selected().map(|s| format!("{s} – intraday trend"));
        let window = read_market(self.market()).history_buffer().capacity();
        render_svg(&self.trend(), &self.config.viewport, title.as_deref(), window)
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// 按配置建一个市场和它唯一的调度器
pub fn market_scheduler(config: &FinalConfig, source: Box<dyn FactorSource>) -> SharedScheduler {
    let market = MarketState::new(config.catalog.clone(), config.history_capacity).into_shared();
    SharedScheduler::new(TickScheduler::new(
        market,
        PriceSimulator::new(source),
        config.tick_period,
    ))
}
