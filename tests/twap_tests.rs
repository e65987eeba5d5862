//! TWAP 실행 테스트
//!
//! 분할 계산, 순차 실행, 부분 실패/취소 동작 검증

use std::sync::Arc;
use std::time::Duration;

use xOrderBot::exchange::mocks::MockExchange;
use xOrderBot::models::order::{OrderSide, OrderType, TimeInForce};
use xOrderBot::models::report::SliceStatus;
use xOrderBot::strategies::twap::{CancelHandle, TwapEngine, TwapPlan};

#[tokio::test]
async fn test_even_plan_executes_all_slices() {
  let exchange = Arc::new(MockExchange::new());
  let engine = TwapEngine::new(exchange.clone());

  // 0.25를 5분할 - 분할당 0.05
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 5, 0.01);
  let report = engine.run(&plan).await.unwrap();

  assert_eq!(report.slices.len(), 5);
  assert!(report.is_success());
  assert!((report.summary.filled_quantity - 0.25).abs() < 1e-9);
  assert_eq!(report.summary.failed_count, 0);

  let submitted = exchange.submitted_orders().await;
  assert_eq!(submitted.len(), 5);
  for intent in &submitted {
    assert!((intent.quantity - 0.05).abs() < 1e-9);
    assert_eq!(intent.order_type, OrderType::Market);
    assert!(intent.price.is_none());
  }
}

#[tokio::test]
async fn test_failed_slice_does_not_abort_run() {
  let exchange = Arc::new(MockExchange::new());
  // 1번째 성공, 2번째 실패, 3번째는 기본 성공
  exchange.script_response(Ok(MockExchange::ack("ord-1"))).await;
  exchange.script_failure(-2019, "Margin is insufficient.").await;

  let engine = TwapEngine::new(exchange.clone());
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.10, 3, 0.01);
  let report = engine.run(&plan).await.unwrap();

  assert_eq!(report.slices.len(), 3);
  assert_eq!(report.slices[0].status, SliceStatus::Filled);
  assert_eq!(report.slices[1].status, SliceStatus::Failed);
  assert_eq!(report.slices[2].status, SliceStatus::Filled);
  assert!(report.slices[1].error.as_deref().unwrap().contains("Margin"));
  assert_eq!(report.summary.failed_count, 1);
  assert!(!report.is_success());

  // 실패한 분할 이후에도 계속 제출
  assert_eq!(exchange.submitted_orders().await.len(), 3);

  // 잔량은 마지막 분할에 몰림 (0.033 / 0.033 / 0.034)
  assert!((report.slices[2].intent.quantity - 0.034).abs() < 1e-9);

  // 실패 분할은 채움 합계에서 제외
  assert!((report.summary.filled_quantity - 0.067).abs() < 1e-9);
}

#[tokio::test]
async fn test_single_slice_has_no_delay() {
  let exchange = Arc::new(MockExchange::new());
  let engine = TwapEngine::new(exchange.clone());

  // 간격이 아무리 길어도 분할 1개면 대기 없이 종료해야 함
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Sell, 0.123, 1, 3600.0);
  let report = tokio::time::timeout(Duration::from_secs(5), engine.run(&plan))
    .await
    .expect("single-slice run must not wait for the interval")
    .unwrap();

  assert_eq!(report.slices.len(), 1);
  assert!((report.summary.filled_quantity - 0.123).abs() < 1e-9);
  assert!(report.is_success());
}

#[tokio::test]
async fn test_invalid_plan_places_no_orders() {
  let exchange = Arc::new(MockExchange::new());
  let engine = TwapEngine::new(exchange.clone());

  // 간격 0은 계획 단계에서 거부
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 5, 0.0);
  assert!(engine.run(&plan).await.is_err());
  assert!(exchange.submitted_orders().await.is_empty());

  // 미지원 심볼도 주문 전에 거부
  let plan = TwapPlan::market("DOGEUSDT", OrderSide::Buy, 0.25, 5, 1.0);
  assert!(engine.run(&plan).await.is_err());
  assert!(exchange.submitted_orders().await.is_empty());
}

#[tokio::test]
async fn test_cancel_before_start_skips_all_slices() {
  let exchange = Arc::new(MockExchange::new());
  let cancel = CancelHandle::new();
  cancel.cancel().await;

  let engine = TwapEngine::with_cancel_handle(exchange.clone(), cancel);
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.25, 5, 0.01);
  let report = engine.run(&plan).await.unwrap();

  assert_eq!(report.slices.len(), 5);
  assert!(report.slices.iter().all(|s| s.status == SliceStatus::Skipped));
  assert_eq!(report.summary.skipped_count, 5);
  assert!(!report.is_success());
  assert!(exchange.submitted_orders().await.is_empty());
}

#[tokio::test]
async fn test_cancel_mid_run_keeps_earlier_fills() {
  let exchange = Arc::new(MockExchange::new());
  let engine = TwapEngine::new(exchange.clone());
  let cancel = engine.cancel_handle();

  // 분할 간 0.5초 간격, 0.1초 뒤 취소 - 첫 분할만 제출됨
  let plan = TwapPlan::market("BTCUSDT", OrderSide::Buy, 0.30, 3, 0.5);
  let canceller = tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel().await;
  });

  let report = engine.run(&plan).await.unwrap();
  canceller.await.unwrap();

  assert_eq!(report.slices.len(), 3);
  assert_eq!(report.slices[0].status, SliceStatus::Filled);
  assert_eq!(report.summary.skipped_count, 2);
  assert_eq!(exchange.submitted_orders().await.len(), 1);
}

#[tokio::test]
async fn test_limit_slices_carry_price_and_time_in_force() {
  let exchange = Arc::new(MockExchange::new());
  let engine = TwapEngine::new(exchange.clone());

  let plan = TwapPlan::limit(
    "BTCUSDT", OrderSide::Sell, 0.25, 5, 0.01, 65000.0, TimeInForce::Ioc,
  );
  let report = engine.run(&plan).await.unwrap();

  assert!(report.is_success());
  for intent in exchange.submitted_orders().await {
    assert_eq!(intent.order_type, OrderType::Limit);
    assert_eq!(intent.price, Some(65000.0));
    assert_eq!(intent.time_in_force, TimeInForce::Ioc);
  }
}
