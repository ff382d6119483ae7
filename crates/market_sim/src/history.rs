use std::collections::{HashMap, VecDeque};

use common::Symbol;

/// 每个标的保留的最近样本数
pub const HISTORY_CAPACITY: usize = 60;

/// 按标的维护的定长价格窗口（超出容量时丢弃最旧的样本）
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    series: HashMap<Symbol, VecDeque<f64>>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            series: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 追加一条样本（自动维护滑动窗口）
    pub fn append(&mut self, symbol: &Symbol, price: f64) {
        let capacity = self.capacity;
        let entry = self
            .series
            .entry(symbol.clone())
            .or_insert_with(|| VecDeque::with_capacity(capacity));

        entry.push_back(price);
        while entry.len() > capacity {
            entry.pop_front();
        }
    }

    /// 最旧在前、最新在后；未知标的返回空
    pub fn get(&self, symbol: &Symbol) -> Vec<f64> {
        self.series
            .get(symbol)
            .map(|v| v.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, symbol: &Symbol) -> usize {
        self.series.get(symbol).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SymbolCatalog;

    fn goog() -> Symbol {
        SymbolCatalog::default_catalog().get("GOOG").unwrap().clone()
    }

    #[test]
    fn unknown_symbol_is_empty() {
        let buffer = HistoryBuffer::default();
        assert!(buffer.get(&goog()).is_empty());
        assert_eq!(buffer.len(&goog()), 0);
    }

    #[test]
    fn keeps_last_sixty_in_insertion_order() {
        let mut buffer = HistoryBuffer::default();
        let sym = goog();
        for i in 0..75 {
            buffer.append(&sym, i as f64);
        }
        let expected: Vec<f64> = (15..75).map(|i| i as f64).collect();
        assert_eq!(buffer.get(&sym), expected);
        assert_eq!(buffer.len(&sym), HISTORY_CAPACITY);
    }

    #[test]
    fn grows_until_capacity() {
        let mut buffer = HistoryBuffer::new(3);
        let sym = goog();
        buffer.append(&sym, 1.0);
        buffer.append(&sym, 2.0);
        assert_eq!(buffer.get(&sym), vec![1.0, 2.0]);
        buffer.append(&sym, 3.0);
        buffer.append(&sym, 4.0);
        assert_eq!(buffer.get(&sym), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn symbols_are_independent() {
        let catalog = SymbolCatalog::default_catalog();
        let a = catalog.get("GOOG").unwrap();
        let b = catalog.get("TSLA").unwrap();
        let mut buffer = HistoryBuffer::new(2);
        buffer.append(a, 1.0);
        buffer.append(b, 10.0);
        buffer.append(a, 2.0);
        buffer.append(a, 3.0);
        assert_eq!(buffer.get(a), vec![2.0, 3.0]);
        assert_eq!(buffer.get(b), vec![10.0]);
    }
}
