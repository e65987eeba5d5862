/**
* filename : manager
* author : HAMA
* date: 2025. 5. 8.
* description:
**/

use std::sync::Arc;

use crate::config::Config;
use crate::error::TradingError;
use crate::exchange::binance_futures::BinanceFuturesClient;
use crate::exchange::mocks::MockExchange;
use crate::exchange::traits::Exchange;
use crate::models::order::{OrderIntent, OrderResult, OrderSide, TimeInForce};
use crate::models::report::TwapReport;
use crate::order_core::executor::OrderExecutor;
use crate::order_core::validator::OrderValidator;
use crate::strategies::twap::{CancelHandle, TwapEngine, TwapPlan};

/// 주문 관리자 - 검증기/실행기/TWAP 엔진을 묶는 파사드
///
/// CLI, 대화형 콘솔, 대시보드 API가 모두 이 타입을 통해 동일한
/// 검증/실행 경로를 사용한다.
pub struct OrderManager {
    exchange: Arc<dyn Exchange>,
    validator: OrderValidator,
    executor: OrderExecutor,
}

impl OrderManager {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        OrderManager {
            validator: OrderValidator::new(exchange.clone()),
            executor: OrderExecutor::new(exchange.clone()),
            exchange,
        }
    }

    /// 설정에 따라 실거래소 또는 모의 거래소로 연결
    pub async fn connect(config: &Config) -> Result<Self, TradingError> {
        let exchange: Arc<dyn Exchange> = if config.exchange.use_mock {
            log::info!("모의 거래소 초기화 완료");
            Arc::new(MockExchange::new())
        } else {
            Arc::new(BinanceFuturesClient::new(&config.exchange)?)
        };

        // 시작 시 1회 시계 동기화 - 실패해도 계속 (드리프트 발생 시 재동기화됨)
        if let Err(e) = exchange.resync_time().await {
            log::warn!("Could not sync server time: {}", e);
        }

        Ok(Self::new(exchange))
    }

    pub fn exchange(&self) -> Arc<dyn Exchange> {
        self.exchange.clone()
    }

    /// 시장가 주문 제출
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
    ) -> Result<OrderResult, TradingError> {
        let intent = OrderIntent::market(symbol, side, quantity);
        let order = self.validator.validate(intent).await?;
        Ok(self.executor.execute(&order).await)
    }

    /// 지정가 주문 제출
    pub async fn place_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: f64,
        price: f64,
        time_in_force: TimeInForce,
    ) -> Result<OrderResult, TradingError> {
        let intent = OrderIntent::limit(symbol, side, quantity, price, time_in_force);
        let order = self.validator.validate(intent).await?;
        Ok(self.executor.execute(&order).await)
    }

    /// TWAP 계획 실행
    pub async fn run_twap(&self, plan: TwapPlan) -> Result<TwapReport, TradingError> {
        self.run_twap_with_cancel(plan, CancelHandle::new()).await
    }

    /// 취소 핸들을 지정한 TWAP 계획 실행
    pub async fn run_twap_with_cancel(
        &self,
        mut plan: TwapPlan,
        cancel: CancelHandle,
    ) -> Result<TwapReport, TradingError> {
        plan.symbol = plan.symbol.trim().to_uppercase();
        let engine = TwapEngine::with_cancel_handle(self.exchange.clone(), cancel);
        engine.run(&plan).await
    }
}
