pub mod binance_futures;
pub mod mocks;
pub mod traits;

pub use binance_futures::BinanceFuturesClient;
pub use mocks::MockExchange;
pub use traits::{is_clock_drift, Exchange, CLOCK_DRIFT_CODE};
