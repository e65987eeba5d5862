use serde::Serialize;

use crate::models::order::{OrderIntent, OrderResult, OrderSide};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum SliceStatus {
    Filled,
    Failed,
    Skipped,
}

/// Outcome of one TWAP slice, in submission order
#[derive(Debug, Clone, Serialize)]
pub struct SliceResult {
    pub index: usize,
    pub intent: OrderIntent,
    pub order_id: Option<String>,
    pub status: SliceStatus,
    pub error: Option<String>,
    pub requested_at: Option<i64>,
    pub acknowledged_at: Option<i64>,
}

impl SliceResult {
    /// Record a submitted slice from the executor's canonical result
    pub fn from_order(index: usize, result: OrderResult) -> Self {
        let status = if result.is_success() {
            SliceStatus::Filled
        } else {
            SliceStatus::Failed
        };
        SliceResult {
            index,
            order_id: result.ack.as_ref().map(|ack| ack.order_id.clone()),
            acknowledged_at: result.ack.as_ref().map(|ack| ack.acknowledged_at),
            requested_at: Some(result.requested_at),
            error: result.error,
            intent: result.intent,
            status,
        }
    }

    /// Record a slice that was never submitted because the run was cancelled
    pub fn skipped(index: usize, intent: OrderIntent) -> Self {
        SliceResult {
            index,
            intent,
            order_id: None,
            status: SliceStatus::Skipped,
            error: None,
            requested_at: None,
            acknowledged_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TwapSummary {
    pub requested_quantity: f64,
    pub filled_quantity: f64,
    pub filled_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
}

/// Full record of a TWAP run: one SliceResult per planned slice plus totals
#[derive(Debug, Clone, Serialize)]
pub struct TwapReport {
    pub symbol: String,
    pub side: OrderSide,
    pub slices: Vec<SliceResult>,
    pub summary: TwapSummary,
}

impl TwapReport {
    pub fn new(symbol: impl Into<String>, side: OrderSide, requested_quantity: f64, slices: Vec<SliceResult>) -> Self {
        let mut filled_quantity = 0.0;
        let mut filled_count = 0;
        let mut failed_count = 0;
        let mut skipped_count = 0;
        for slice in &slices {
            match slice.status {
                SliceStatus::Filled => {
                    filled_quantity += slice.intent.quantity;
                    filled_count += 1;
                }
                SliceStatus::Failed => failed_count += 1,
                SliceStatus::Skipped => skipped_count += 1,
            }
        }
        TwapReport {
            symbol: symbol.into(),
            side,
            slices,
            summary: TwapSummary {
                requested_quantity,
                filled_quantity,
                filled_count,
                failed_count,
                skipped_count,
            },
        }
    }

    /// true only when every planned slice was submitted and filled
    pub fn is_success(&self) -> bool {
        self.summary.failed_count == 0 && self.summary.skipped_count == 0
    }
}
