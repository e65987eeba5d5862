//! TWAP 전략
//!
//! 시간 가중 평균 가격 기반 주문 실행 전략. 총 수량을 균등 분할하여
//! 일정 간격으로 제출하고, 분할 단위 실패는 기록 후 계속 진행한다.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::filters::SymbolFilters;
use crate::models::order::{OrderIntent, OrderSide, OrderType, TimeInForce, ValidatedOrder};
use crate::models::report::{SliceResult, TwapReport};
use crate::order_core::executor::OrderExecutor;
use crate::utils::math;

/// TWAP 실행 계획 (생성 후 불변)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwapPlan {
    /// 거래 심볼
    pub symbol: String,
    /// 매매 방향
    pub side: OrderSide,
    /// 목표 총 수량
    pub total_quantity: f64,
    /// 분할 수
    pub slice_count: usize,
    /// 분할 간 간격 (초)
    pub interval_seconds: f64,
    /// 분할 주문 타입
    pub order_type: OrderType,
    /// 지정가 (LIMIT 분할 전용)
    pub price: Option<f64>,
    /// 유효 기간 (LIMIT 분할 전용)
    pub time_in_force: TimeInForce,
}

impl TwapPlan {
    /// 시장가 분할 계획 생성
    pub fn market(
        symbol: impl Into<String>,
        side: OrderSide,
        total_quantity: f64,
        slice_count: usize,
        interval_seconds: f64,
    ) -> Self {
        TwapPlan {
            symbol: symbol.into(),
            side,
            total_quantity,
            slice_count,
            interval_seconds,
            order_type: OrderType::Market,
            price: None,
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// 지정가 분할 계획 생성
    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        total_quantity: f64,
        slice_count: usize,
        interval_seconds: f64,
        price: f64,
        time_in_force: TimeInForce,
    ) -> Self {
        TwapPlan {
            symbol: symbol.into(),
            side,
            total_quantity,
            slice_count,
            interval_seconds,
            order_type: OrderType::Limit,
            price: Some(price),
            time_in_force,
        }
    }

    /// 계획 자체 검증 - 주문이 나가기 전에 실패해야 하는 조건들
    pub fn validate(&self) -> Result<(), TradingError> {
        if self.slice_count < 1 {
            return Err(TradingError::InvalidPlan(
                "Slice count must be at least 1".to_string(),
            ));
        }
        if !(self.interval_seconds > 0.0) || !self.interval_seconds.is_finite() {
            return Err(TradingError::InvalidPlan(
                "Interval must be greater than zero seconds".to_string(),
            ));
        }
        if !self.total_quantity.is_finite() || self.total_quantity <= 0.0 {
            return Err(TradingError::InvalidPlan(
                "Total quantity must be greater than zero".to_string(),
            ));
        }
        if self.order_type == OrderType::Limit {
            match self.price {
                Some(price) if price.is_finite() && price > 0.0 => {}
                _ => {
                    return Err(TradingError::InvalidPlan(
                        "Limit TWAP plans require a positive price".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// 분할 수량 계산
///
/// 분할 수량은 총수량/분할수를 스텝 단위로 내림한 값이고, 내림으로 남는
/// 잔량은 전부 마지막 분할에 더해 합계가 총수량과 정확히 일치하게 한다.
/// 잔량을 마지막에 몰아주는 것은 재현 가능한 정책이다.
pub fn slice_quantities(plan: &TwapPlan, filters: &SymbolFilters) -> Result<Vec<f64>, TradingError> {
    plan.validate()?;

    let base = math::round_quantity(
        plan.total_quantity / plan.slice_count as f64,
        filters.quantity_step,
    );
    if base <= 0.0 {
        return Err(TradingError::InvalidPlan(format!(
            "Total quantity {} split into {} slices rounds to zero at step {}",
            plan.total_quantity, plan.slice_count, filters.quantity_step
        )));
    }
    if base < filters.min_quantity {
        return Err(TradingError::InvalidPlan(format!(
            "Slice quantity {} is below the minimum {} for {}",
            base, filters.min_quantity, plan.symbol
        )));
    }

    let mut sizes = vec![base; plan.slice_count];
    let remainder = plan.total_quantity - base * plan.slice_count as f64;
    if let Some(last) = sizes.last_mut() {
        *last = math::round_to_decimals(base + remainder, 8);
    }
    Ok(sizes)
}

/// 취소 핸들
///
/// 복제해서 다른 태스크에 넘기면 실행 중인 TWAP을 협조적으로 중단할 수
/// 있다. 취소 시점 이전에 제출된 분할은 그대로 유지된다.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<RwLock<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        CancelHandle {
            flag: Arc::new(RwLock::new(false)),
        }
    }

    /// 더 이상 분할을 제출하지 않도록 요청
    pub async fn cancel(&self) {
        *self.flag.write().await = true;
    }

    pub async fn is_cancelled(&self) -> bool {
        *self.flag.read().await
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// TWAP 실행 엔진
///
/// 계획 1건을 PLANNING -> EXECUTING -> COMPLETED 순서로 구동한다.
/// 분할은 엄격히 순차 실행되며 (i+1 번째 분할은 i 번째 결과가 기록된
/// 후에만 제출), 분할 사이 대기는 tokio 타이머로 양보한다.
pub struct TwapEngine {
    exchange: Arc<dyn Exchange>,
    executor: OrderExecutor,
    cancel: CancelHandle,
}

impl TwapEngine {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        Self::with_cancel_handle(exchange, CancelHandle::new())
    }

    pub fn with_cancel_handle(exchange: Arc<dyn Exchange>, cancel: CancelHandle) -> Self {
        TwapEngine {
            executor: OrderExecutor::new(exchange.clone()),
            exchange,
            cancel,
        }
    }

    /// 실행 중 취소에 사용할 핸들
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// 계획 실행
    ///
    /// 계획 오류만 Err로 끝나며, 분할 단위 실패는 보고서에 기록하고
    /// 다음 분할로 계속 진행한다.
    pub async fn run(&self, plan: &TwapPlan) -> Result<TwapReport, TradingError> {
        let filters = self.exchange.symbol_filters(&plan.symbol).await?;
        let sizes = slice_quantities(plan, &filters)?;

        log::info!(
            "Submitting TWAP order: {} slices of ~{} {} at {}s intervals",
            plan.slice_count, sizes[0], plan.symbol, plan.interval_seconds
        );

        let mut slices: Vec<SliceResult> = Vec::with_capacity(sizes.len());
        let last_index = sizes.len() - 1;

        for (index, quantity) in sizes.iter().copied().enumerate() {
            // 취소 확인은 매 분할 제출 직전에 수행
            if self.cancel.is_cancelled().await {
                log::warn!(
                    "TWAP run cancelled before slice {}/{}; remaining slices skipped",
                    index + 1,
                    sizes.len()
                );
                for (skip_index, skip_quantity) in sizes.iter().copied().enumerate().skip(index) {
                    slices.push(SliceResult::skipped(
                        skip_index,
                        self.slice_intent(plan, skip_quantity),
                    ));
                }
                break;
            }

            let extra = plan
                .price
                .map(|p| format!(" @ {}", p))
                .unwrap_or_default();
            log::info!(
                "TWAP slice {}/{}: quantity={}{}",
                index + 1,
                sizes.len(),
                quantity,
                extra
            );

            let order = ValidatedOrder::new(self.slice_intent(plan, quantity));
            let result = self.executor.execute(&order).await;
            slices.push(SliceResult::from_order(index, result));

            if index < last_index {
                sleep(Duration::from_secs_f64(plan.interval_seconds)).await;
            }
        }

        let report = TwapReport::new(plan.symbol.clone(), plan.side, plan.total_quantity, slices);
        log::info!(
            "TWAP run complete: filled {}/{} {} ({} failed, {} skipped)",
            report.summary.filled_quantity,
            report.summary.requested_quantity,
            report.symbol,
            report.summary.failed_count,
            report.summary.skipped_count
        );
        Ok(report)
    }

    fn slice_intent(&self, plan: &TwapPlan, quantity: f64) -> OrderIntent {
        OrderIntent {
            symbol: plan.symbol.clone(),
            side: plan.side,
            quantity,
            order_type: plan.order_type,
            price: plan.price,
            time_in_force: plan.time_in_force,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc_filters() -> SymbolFilters {
        SymbolFilters::new("BTCUSDT", 0.001, 0.001, 0.1)
    }

    #[test]
    fn test_even_split() {
        // 0.25 / 5 = 0.05, 스텝 0.001로 나누어 떨어짐
        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 5, 10.0);
        let sizes = slice_quantities(&plan, &btc_filters()).unwrap();

        assert_eq!(sizes.len(), 5);
        for size in &sizes {
            assert!((size - 0.05).abs() < 1e-9);
        }
        let sum: f64 = sizes.iter().sum();
        assert!((sum - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_remainder_goes_to_last_slice() {
        // 0.10 / 3 -> [0.033, 0.033, 0.034]
        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.10, 3, 10.0);
        let sizes = slice_quantities(&plan, &btc_filters()).unwrap();

        assert_eq!(sizes.len(), 3);
        assert!((sizes[0] - 0.033).abs() < 1e-9);
        assert!((sizes[1] - 0.033).abs() < 1e-9);
        assert!((sizes[2] - 0.034).abs() < 1e-9);
        let sum: f64 = sizes.iter().sum();
        assert!((sum - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_single_slice_degenerates_to_total() {
        let plan = TwapPlan::market("BTCUSDT", OrderSide::Sell, 0.123, 1, 5.0);
        let sizes = slice_quantities(&plan, &btc_filters()).unwrap();
        assert_eq!(sizes.len(), 1);
        assert!((sizes[0] - 0.123).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_plans_rejected() {
        let filters = btc_filters();

        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 0, 10.0);
        assert!(matches!(
            slice_quantities(&plan, &filters),
            Err(TradingError::InvalidPlan(_))
        ));

        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 5, 0.0);
        assert!(matches!(
            slice_quantities(&plan, &filters),
            Err(TradingError::InvalidPlan(_))
        ));

        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, -1.0, 5, 10.0);
        assert!(matches!(
            slice_quantities(&plan, &filters),
            Err(TradingError::InvalidPlan(_))
        ));

        // 분할 수량이 최소 수량 밑으로 내려가면 계획 단계에서 거부
        let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.002, 5, 10.0);
        assert!(matches!(
            slice_quantities(&plan, &filters),
            Err(TradingError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_limit_plan_requires_price() {
        let mut plan = TwapPlan::limit(
            "BTCUSDT", OrderSide::Buy, 0.25, 5, 10.0, 65000.0, TimeInForce::Gtc,
        );
        assert!(plan.validate().is_ok());

        plan.price = None;
        assert!(matches!(
            plan.validate(),
            Err(TradingError::InvalidPlan(_))
        ));
    }
}
