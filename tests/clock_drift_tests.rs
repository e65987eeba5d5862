//! 시계 드리프트 복구 테스트
//!
//! recvWindow 오류(-1021) 발생 시 1회 재동기화 후 1회 재전송하는
//! 프로토콜 검증

use std::sync::Arc;

use rstest::rstest;

use xOrderBot::error::TradingError;
use xOrderBot::exchange::mocks::MockExchange;
use xOrderBot::exchange::traits::{is_clock_drift, Exchange};
use xOrderBot::models::order::{OrderIntent, OrderSide, ValidatedOrder};
use xOrderBot::order_core::validator::OrderValidator;

const DRIFT_MESSAGE: &str = "Timestamp for this request is outside of the recvWindow.";

#[rstest]
#[case(TradingError::ExchangeError { code: -1021, message: "rejected".to_string() }, true)]
#[case(TradingError::ExchangeError { code: 0, message: DRIFT_MESSAGE.to_string() }, true)]
#[case(TradingError::ExchangeError { code: -2019, message: "Margin is insufficient.".to_string() }, false)]
#[case(TradingError::ExchangeError { code: 400, message: "Bad request".to_string() }, false)]
#[case(TradingError::ClockDriftUnrecoverable, false)]
#[case(TradingError::InvalidQuantity("0".to_string()), false)]
fn test_is_clock_drift(#[case] error: TradingError, #[case] expected: bool) {
  assert_eq!(is_clock_drift(&error), expected);
}

async fn validated_order(exchange: &Arc<MockExchange>) -> ValidatedOrder {
  let validator = OrderValidator::new(exchange.clone());
  validator
    .validate(OrderIntent::market("BTCUSDT", OrderSide::Buy, 0.05))
    .await
    .unwrap()
}

#[tokio::test]
async fn test_drift_failure_then_success_resyncs_once() {
  let exchange = Arc::new(MockExchange::new());
  exchange.set_clock_drift(750).await;
  exchange.script_failure(-1021, DRIFT_MESSAGE).await;
  // 재전송은 기본 성공 응답 사용

  let order = validated_order(&exchange).await;
  let ack = exchange.place_order(&order).await.unwrap();
  assert!(!ack.order_id.is_empty());

  // 정확히 1회 재동기화, 2회 제출, 오프셋 캐시 갱신
  assert_eq!(exchange.resync_calls().await, 1);
  assert_eq!(exchange.submitted_orders().await.len(), 2);
  assert_eq!(exchange.cached_offset().await, 750);
}

#[tokio::test]
async fn test_second_drift_failure_is_unrecoverable() {
  let exchange = Arc::new(MockExchange::new());
  exchange.script_failure(-1021, DRIFT_MESSAGE).await;
  exchange.script_failure(-1021, DRIFT_MESSAGE).await;

  let order = validated_order(&exchange).await;
  let result = exchange.place_order(&order).await;
  assert!(matches!(result, Err(TradingError::ClockDriftUnrecoverable)));

  // 재시도는 1회뿐 - 3번째 제출은 없어야 함
  assert_eq!(exchange.submitted_orders().await.len(), 2);
  assert_eq!(exchange.resync_calls().await, 1);
}

#[tokio::test]
async fn test_other_exchange_errors_are_not_retried() {
  let exchange = Arc::new(MockExchange::new());
  exchange.script_failure(-2019, "Margin is insufficient.").await;

  let order = validated_order(&exchange).await;
  let result = exchange.place_order(&order).await;
  match result {
    Err(TradingError::ExchangeError { code, message }) => {
      assert_eq!(code, -2019);
      assert!(message.contains("Margin"));
    }
    other => panic!("expected ExchangeError, got {:?}", other.map(|a| a.order_id)),
  }

  assert_eq!(exchange.submitted_orders().await.len(), 1);
  assert_eq!(exchange.resync_calls().await, 0);
}

#[tokio::test]
async fn test_drift_recovery_is_per_call_not_per_run() {
  let exchange = Arc::new(MockExchange::new());
  let order = validated_order(&exchange).await;

  // 첫 호출에서 드리프트 복구
  exchange.script_failure(-1021, DRIFT_MESSAGE).await;
  exchange.place_order(&order).await.unwrap();
  assert_eq!(exchange.resync_calls().await, 1);

  // 이후 호출에서 드리프트가 다시 발생하면 다시 복구
  exchange.script_failure(-1021, DRIFT_MESSAGE).await;
  exchange.place_order(&order).await.unwrap();
  assert_eq!(exchange.resync_calls().await, 2);
}
