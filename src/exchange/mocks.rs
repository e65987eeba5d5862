use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

use async_trait::async_trait;

use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::filters::SymbolFilters;
use crate::models::order::{OrderAck, OrderIntent, ValidatedOrder};
use crate::utils;

/// A mock implementation of the Exchange trait for testing and dry runs.
/// Responses can be scripted per call; unscripted submissions succeed with a
/// generated order id.
pub struct MockExchange {
    filters: HashMap<String, SymbolFilters>,
    scripted: Mutex<VecDeque<Result<OrderAck, TradingError>>>,
    submitted: Mutex<Vec<OrderIntent>>,
    /// Simulated serverTime - localTime
    drift_ms: Mutex<i64>,
    time_offset: Mutex<i64>,
    resync_calls: Mutex<u64>,
    order_counter: Mutex<u64>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::with_filters(vec![
            SymbolFilters::new("BTCUSDT", 0.001, 0.001, 0.1),
            SymbolFilters::new("ETHUSDT", 0.001, 0.001, 0.01),
        ])
    }

    pub fn with_filters(filters: Vec<SymbolFilters>) -> Self {
        let filters = filters
            .into_iter()
            .map(|f| (f.symbol.clone(), f))
            .collect();
        MockExchange {
            filters,
            scripted: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            drift_ms: Mutex::new(0),
            time_offset: Mutex::new(0),
            resync_calls: Mutex::new(0),
            order_counter: Mutex::new(0),
        }
    }

    /// Queue the outcome of the next order submission
    pub async fn script_response(&self, response: Result<OrderAck, TradingError>) {
        self.scripted.lock().await.push_back(response);
    }

    /// Queue an exchange-reported failure for the next order submission
    pub async fn script_failure(&self, code: i64, message: &str) {
        self.script_response(Err(TradingError::ExchangeError {
            code,
            message: message.to_string(),
        }))
        .await;
    }

    /// Simulate a fixed clock drift between exchange and local time
    pub async fn set_clock_drift(&self, drift_ms: i64) {
        *self.drift_ms.lock().await = drift_ms;
    }

    pub async fn submitted_orders(&self) -> Vec<OrderIntent> {
        self.submitted.lock().await.clone()
    }

    pub async fn resync_calls(&self) -> u64 {
        *self.resync_calls.lock().await
    }

    pub async fn cached_offset(&self) -> i64 {
        *self.time_offset.lock().await
    }

    pub fn ack(order_id: impl Into<String>) -> OrderAck {
        OrderAck {
            order_id: order_id.into(),
            client_order_id: None,
            status: "NEW".to_string(),
            executed_quantity: 0.0,
            acknowledged_at: utils::current_timestamp_ms(),
        }
    }
}

impl Default for MockExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Exchange for MockExchange {
    async fn submit_order(&self, order: &ValidatedOrder) -> Result<OrderAck, TradingError> {
        self.submitted.lock().await.push(order.intent().clone());

        if let Some(response) = self.scripted.lock().await.pop_front() {
            return response;
        }

        let mut counter = self.order_counter.lock().await;
        *counter += 1;
        Ok(Self::ack(format!("mock-{}", *counter)))
    }

    async fn server_time(&self) -> Result<i64, TradingError> {
        Ok(utils::current_timestamp_ms() + *self.drift_ms.lock().await)
    }

    async fn resync_time(&self) -> Result<i64, TradingError> {
        let mut offset = self.time_offset.lock().await;
        *offset = *self.drift_ms.lock().await;
        *self.resync_calls.lock().await += 1;
        Ok(*offset)
    }

    async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, TradingError> {
        self.filters
            .get(symbol)
            .cloned()
            .ok_or_else(|| TradingError::UnsupportedSymbol(symbol.to_string()))
    }
}
