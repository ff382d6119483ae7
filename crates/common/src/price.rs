use serde::{Deserialize, Serialize};

/// 单个标的的当前报价，三项都已按 2 位小数取整
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
}

impl PriceState {
    /// 初始报价：无涨跌
    pub fn initial(price: f64) -> Self {
        Self {
            price,
            change: 0.0,
            change_percent: 0.0,
        }
    }
}

/// 四舍五入到 2 位小数（展示精度）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
