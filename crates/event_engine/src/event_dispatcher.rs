use std::collections::HashMap;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::event::{EventPayload, EventType};

#[derive(Debug, Clone)]
pub struct EventData {
    pub event_type: EventType,
    pub data: EventPayload,
}

type Callback = Box<dyn Fn(&EventData) + Send + Sync>;

pub trait EventDispatcher {
    fn register(&mut self, event_type: EventType, call_back: Callback);
    fn unregister(&mut self, event_type: EventType);
    fn clear_events(&mut self);

    fn m_trigger(&self, event: &EventData);
}

/// 事件分发器（内部使用 crossbeam_channel，有界队列）
pub struct QueueEventDispatcher {
    event_map: HashMap<EventType, Vec<Callback>>,
    sender: Sender<EventData>,
    receiver: Receiver<EventData>,
}

impl QueueEventDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            event_map: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// 分拆出 Producer 和 Consumer，Producer 可以 clone 给多个写入方
    pub fn split(self) -> (QueueEventDispatcherProducer, QueueEventDispatcherConsumer) {
        (
            QueueEventDispatcherProducer { sender: self.sender },
            QueueEventDispatcherConsumer {
                receiver: self.receiver,
                event_map: self.event_map,
            },
        )
    }
}

impl EventDispatcher for QueueEventDispatcher {
    fn register(&mut self, event_type: EventType, call_back: Callback) {
        self.event_map.entry(event_type).or_default().push(call_back);
    }

    fn unregister(&mut self, event_type: EventType) {
        self.event_map.remove(&event_type);
    }

    fn clear_events(&mut self) {
        self.event_map.clear();
    }

    fn m_trigger(&self, event: &EventData) {
        trigger(&self.event_map, event);
    }
}

fn trigger(event_map: &HashMap<EventType, Vec<Callback>>, event: &EventData) {
    if let Some(callbacks) = event_map.get(&event.event_type) {
        for cb in callbacks {
            cb(event);
        }
    }
}

/// 一次入队的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Delivered,
    /// 队列满，事件被丢弃
    Dropped,
    /// 消费端已关闭
    Closed,
}

/// Producer 对象
#[derive(Clone)]
pub struct QueueEventDispatcherProducer {
    sender: Sender<EventData>,
}

impl QueueEventDispatcherProducer {
    /// 非阻塞入队；队列满或消费端已关闭时丢弃并返回 false
    pub fn fire(&self, data: EventPayload) -> bool {
        self.send(data) == Fired::Delivered
    }

    pub fn send(&self, data: EventPayload) -> Fired {
        let event = EventData {
            event_type: data.event_type(),
            data,
        };
        match self.sender.try_send(event) {
            Ok(()) => Fired::Delivered,
            Err(TrySendError::Full(ev)) => {
                log::warn!(target: "event_engine", "事件队列已满，丢弃 {:?} 事件", ev.event_type);
                Fired::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Fired::Closed,
        }
    }
}

/// Consumer 对象
pub struct QueueEventDispatcherConsumer {
    receiver: Receiver<EventData>,
    event_map: HashMap<EventType, Vec<Callback>>,
}

impl QueueEventDispatcherConsumer {
    pub fn register(&mut self, event_type: EventType, call_back: Callback) {
        self.event_map.entry(event_type).or_default().push(call_back);
    }

    /// 处理当前队列中的所有事件，返回处理条数（不阻塞）
    pub fn process(&self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.try_recv() {
            trigger(&self.event_map, &event);
            handled += 1;
        }
        handled
    }

    /// 取出一条事件但不触发回调
    pub fn try_next(&self) -> Option<EventData> {
        self.receiver.try_recv().ok()
    }
}
