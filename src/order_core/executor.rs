use std::sync::Arc;

use crate::exchange::traits::Exchange;
use crate::models::order::{OrderResult, ValidatedOrder};
use crate::utils;

/// 주문 실행기
///
/// 검증된 주문을 주문 타입에 따라 거래소 어댑터로 1회 전달하고
/// 성공/실패를 정규화된 OrderResult로 기록한다. 어댑터 내부의
/// 시계 재동기화 재시도는 여기서 보이지 않는다.
pub struct OrderExecutor {
    exchange: Arc<dyn Exchange>,
}

impl OrderExecutor {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        OrderExecutor { exchange }
    }

    /// 주문 제출 - 실패는 전파하지 않고 결과에 담는다
    pub async fn execute(&self, order: &ValidatedOrder) -> OrderResult {
        let requested_at = utils::current_timestamp_ms();
        let intent = order.intent().clone();

        match self.exchange.place_order(order).await {
            Ok(ack) => {
                log::info!(
                    "{} order accepted: {} {} quantity={} id={}",
                    intent.order_type, intent.symbol, intent.side, intent.quantity, ack.order_id
                );
                OrderResult {
                    intent,
                    ack: Some(ack),
                    error: None,
                    requested_at,
                }
            }
            Err(e) => {
                log::error!(
                    "{} order failed: {} {} quantity={}: {}",
                    intent.order_type, intent.symbol, intent.side, intent.quantity, e
                );
                OrderResult {
                    intent,
                    ack: None,
                    error: Some(e.to_string()),
                    requested_at,
                }
            }
        }
    }
}
