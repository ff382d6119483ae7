pub mod simulator;
pub mod history;
pub mod market;
pub mod scheduler;

pub use history::{HistoryBuffer, HISTORY_CAPACITY};
pub use market::{MarketState, SharedMarket};
pub use scheduler::{SchedulerGuard, SchedulerState, SharedScheduler, TickScheduler, TICK_PERIOD};
pub use simulator::{FactorSource, FixedFactors, PriceSimulator, RngFactors, SequenceFactors};
