use async_trait::async_trait;

use crate::error::TradingError;
use crate::models::filters::SymbolFilters;
use crate::models::order::{OrderAck, ValidatedOrder};

/// Binance error code for a request timestamp outside the recvWindow
pub const CLOCK_DRIFT_CODE: i64 = -1021;

/// Detect the exchange's clock-drift rejection, by code or by message
pub fn is_clock_drift(error: &TradingError) -> bool {
    match error {
        TradingError::ExchangeError { code, message } => {
            *code == CLOCK_DRIFT_CODE
                || message.to_lowercase().contains("outside of the recvwindow")
        }
        _ => false,
    }
}

/// The `Exchange` trait defines the order-submission contract the executors
/// and the TWAP engine depend on. It is implemented by the real Binance
/// Futures connector and by the mock used for tests and dry runs.
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Submit a validated order. Exactly one request, no retry.
    async fn submit_order(&self, order: &ValidatedOrder) -> Result<OrderAck, TradingError>;

    /// Current exchange server time in milliseconds
    async fn server_time(&self) -> Result<i64, TradingError>;

    /// Fetch server time, cache the local clock offset and return it
    async fn resync_time(&self) -> Result<i64, TradingError>;

    /// Trading rules for a symbol, cached after the first fetch
    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, TradingError>;

    /// Submit with clock-drift recovery: on a recvWindow rejection, resync
    /// the clock once and retransmit once. A second rejection surfaces
    /// `ClockDriftUnrecoverable`; every other error is surfaced unmodified.
    async fn place_order(&self, order: &ValidatedOrder) -> Result<OrderAck, TradingError> {
        let first_error = match self.submit_order(order).await {
            Ok(ack) => return Ok(ack),
            Err(e) => e,
        };
        if !is_clock_drift(&first_error) {
            return Err(first_error);
        }

        log::warn!(
            "Order hit timestamp error ({}). Resyncing client clock and retrying once.",
            CLOCK_DRIFT_CODE
        );
        self.resync_time().await?;

        match self.submit_order(order).await {
            Ok(ack) => Ok(ack),
            Err(e) if is_clock_drift(&e) => Err(TradingError::ClockDriftUnrecoverable),
            Err(e) => Err(e),
        }
    }
}
