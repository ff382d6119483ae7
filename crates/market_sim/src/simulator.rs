// simulator.rs
use common::{round2, DashError, DashResult, PriceState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 单步最大涨跌幅 ±2%
pub const MAX_MOVE: f64 = 0.02;
/// 价格下限
pub const PRICE_FLOOR: f64 = 1.0;

/// 随机因子来源：每次返回 [-1, 1] 内的一个数
pub trait FactorSource: Send {
    fn next_factor(&mut self) -> f64;
}

/// 基于 StdRng 的均匀分布来源
pub struct RngFactors {
    rng: StdRng,
}

impl RngFactors {
    /// 从操作系统随机源取种子；取不到属于启动期致命错误
    pub fn from_os() -> DashResult<Self> {
        let rng = StdRng::try_from_os_rng().map_err(|e| DashError::RandomSource(e.to_string()))?;
        Ok(Self { rng })
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FactorSource for RngFactors {
    fn next_factor(&mut self) -> f64 {
        self.rng.random_range(-1.0..=1.0)
    }
}

/// 固定因子，测试用
pub struct FixedFactors(pub f64);

impl FactorSource for FixedFactors {
    fn next_factor(&mut self) -> f64 {
        self.0
    }
}

/// 依次循环给出的因子序列
pub struct SequenceFactors {
    values: Vec<f64>,
    pos: usize,
}

impl SequenceFactors {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, pos: 0 }
    }
}

impl FactorSource for SequenceFactors {
    fn next_factor(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v
    }
}

/// 随机游走价格模拟器
pub struct PriceSimulator {
    source: Box<dyn FactorSource>,
}

impl PriceSimulator {
    pub fn new(source: Box<dyn FactorSource>) -> Self {
        Self { source }
    }

    /// 由上一价格生成下一个报价
    pub fn step(&mut self, previous_price: f64) -> PriceState {
        let unit = self.source.next_factor();
        step_with_factor(previous_price, unit)
    }
}

/// 纯函数版本：`unit` 会被截断到 [-1, 1] 再乘以 MAX_MOVE
pub fn step_with_factor(previous_price: f64, unit: f64) -> PriceState {
    let factor = unit.clamp(-1.0, 1.0) * MAX_MOVE;
    let candidate = (previous_price * (1.0 + factor)).max(PRICE_FLOOR);

    let price = round2(candidate);
    // change 取自已取整的价格，changePercent 取自已取整的 change
    let change = round2(price - previous_price);
    let change_percent = round2(change / previous_price * 100.0);

    PriceState {
        price,
        change,
        change_percent,
    }
}
