pub mod error;
pub mod price;
pub mod symbol;

pub use error::{DashError, DashResult};
pub use price::{round2, PriceState};
pub use symbol::{Symbol, SymbolCatalog};
