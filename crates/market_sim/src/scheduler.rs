// scheduler.rs
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use common::{DashError, DashResult};
use event_engine::event::{EventPayload, TickEvent};
use event_engine::event_dispatcher::{Fired, QueueEventDispatcherProducer};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::market::{write_market, SharedMarket};
use crate::simulator::PriceSimulator;

/// 默认 tick 周期
pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

type Producers = Arc<Mutex<Vec<QueueEventDispatcherProducer>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// 周期驱动器：Running 时每个周期推进一次整个市场，是市场唯一的写者
pub struct TickScheduler {
    market: SharedMarket,
    simulator: Arc<Mutex<PriceSimulator>>,
    period: Duration,
    producers: Producers,
    handle: Option<JoinHandle<()>>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl TickScheduler {
    pub fn new(market: SharedMarket, simulator: PriceSimulator, period: Duration) -> Self {
        Self {
            market,
            simulator: Arc::new(Mutex::new(simulator)),
            period,
            producers: Arc::new(Mutex::new(Vec::new())),
            handle: None,
            cancelled: None,
        }
    }

    /// 每次提交的 tick 会以 Tick 事件推给这个 producer
    pub fn with_producer(self, producer: QueueEventDispatcherProducer) -> Self {
        self.add_producer(producer);
        self
    }

    /// 运行中也可以追加；消费端关闭的 producer 在下一次推送时移除
    pub fn add_producer(&self, producer: QueueEventDispatcherProducer) {
        self.producers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(producer);
    }

    pub fn market(&self) -> &SharedMarket {
        &self.market
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> SchedulerState {
        match &self.handle {
            Some(h) if !h.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Idle -> Running。已在运行时返回 Ok(false)；必须在 tokio runtime 内调用
    pub fn start(&mut self) -> DashResult<bool> {
        if self.is_running() {
            return Ok(false);
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| DashError::Other(format!("tick scheduler needs a tokio runtime: {e}")))?;

        let market = self.market.clone();
        let simulator = self.simulator.clone();
        let producers = self.producers.clone();
        let period = self.period;
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        log::info!(target: "market_sim::scheduler", "[TIMER] 启动，tick 间隔 {} ms", period.as_millis());
        self.handle = Some(runtime.spawn(async move {
            // 第一次触发在启动一个周期之后
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(event) = run_tick(&market, &simulator, &flag) else {
                    break;
                };
                log::debug!(target: "market_sim::scheduler", "[TIMER] tick #{} 已提交", event.seq);
                publish(&producers, &event);
            }
        }));
        self.cancelled = Some(cancelled);
        Ok(true)
    }

    /// Running -> Idle，取消定时任务。已是 Idle 时返回 false。
    ///
    /// 返回后不会再有 tick 提交：先置取消标志，再拿一次写锁等正在提交的那批完成。
    pub fn stop(&mut self) -> bool {
        if let Some(flag) = self.cancelled.take() {
            flag.store(true, Ordering::SeqCst);
            drop(write_market(&self.market));
        }
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                if was_running {
                    log::info!(target: "market_sim::scheduler", "[TIMER] 已停止");
                }
                was_running
            }
            None => false,
        }
    }

    /// 启动并返回一个作用域守卫，守卫释放时自动停止
    pub fn activate(&mut self) -> DashResult<SchedulerGuard<'_>> {
        self.start()?;
        Ok(SchedulerGuard { scheduler: self })
    }

    /// 同步执行一次 tick（不经过定时器）
    pub fn tick_now(&self) -> TickEvent {
        let event = {
            let mut sim = self.simulator.lock().unwrap_or_else(PoisonError::into_inner);
            write_market(&self.market).apply_tick(&mut sim)
        };
        publish(&self.producers, &event);
        event
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 取消标志在写锁内检查，已取消则不提交
fn run_tick(
    market: &SharedMarket,
    simulator: &Arc<Mutex<PriceSimulator>>,
    cancelled: &AtomicBool,
) -> Option<TickEvent> {
    let mut sim = simulator.lock().unwrap_or_else(PoisonError::into_inner);
    // 整批在一次写锁内完成
    let mut guard = write_market(market);
    if cancelled.load(Ordering::SeqCst) {
        return None;
    }
    Some(guard.apply_tick(&mut sim))
}

fn publish(producers: &Producers, event: &TickEvent) {
    let mut producers = producers.lock().unwrap_or_else(PoisonError::into_inner);
    producers.retain(|p| p.send(EventPayload::Tick(event.clone())) != Fired::Closed);
}

/// 多个会话共用一个市场时的调度器句柄：第一个 acquire 启动，最后一个 release 停止
#[derive(Clone)]
pub struct SharedScheduler {
    market: SharedMarket,
    inner: Arc<Mutex<SharedInner>>,
}

struct SharedInner {
    scheduler: TickScheduler,
    active: usize,
}

impl SharedScheduler {
    pub fn new(scheduler: TickScheduler) -> Self {
        Self {
            market: scheduler.market().clone(),
            inner: Arc::new(Mutex::new(SharedInner { scheduler, active: 0 })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SharedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn market(&self) -> &SharedMarket {
        &self.market
    }

    pub fn period(&self) -> Duration {
        self.lock().scheduler.period()
    }

    pub fn is_running(&self) -> bool {
        self.lock().scheduler.is_running()
    }

    /// 当前处于激活状态的会话数
    pub fn active_sessions(&self) -> usize {
        self.lock().active
    }

    pub fn add_producer(&self, producer: QueueEventDispatcherProducer) {
        self.lock().scheduler.add_producer(producer);
    }

    /// 登记一个激活的会话；返回这次调用是否启动了定时器
    pub fn acquire(&self) -> DashResult<bool> {
        let mut inner = self.lock();
        let started = inner.scheduler.start()?;
        inner.active += 1;
        Ok(started)
    }

    /// 注销一个会话；最后一个离开时停止定时器并返回 true
    pub fn release(&self) -> bool {
        let mut inner = self.lock();
        if inner.active == 0 {
            return false;
        }
        inner.active -= 1;
        if inner.active == 0 {
            inner.scheduler.stop()
        } else {
            false
        }
    }

    pub fn tick_now(&self) -> TickEvent {
        self.lock().scheduler.tick_now()
    }
}

/// activate() 返回的守卫
pub struct SchedulerGuard<'a> {
    scheduler: &'a mut TickScheduler,
}

impl Deref for SchedulerGuard<'_> {
    type Target = TickScheduler;

    fn deref(&self) -> &TickScheduler {
        &*self.scheduler
    }
}

impl DerefMut for SchedulerGuard<'_> {
    fn deref_mut(&mut self) -> &mut TickScheduler {
        &mut *self.scheduler
    }
}

impl Drop for SchedulerGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}
