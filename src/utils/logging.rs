//! 로깅 유틸리티
//!
//! 로그 초기화 및 유틸리티 함수 제공

use env_logger::Builder;
use log::LevelFilter;
use std::env;

use crate::error::TradingError;

/// 로깅 시스템 초기화
pub fn init() -> Result<(), TradingError> {
    let mut builder = Builder::from_default_env();

    // RUST_LOG 환경변수 확인
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    // 로그 레벨 파싱
    let level_filter = match log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    builder
      .filter_level(level_filter)
      .format_timestamp_millis()
      .init();

    log::info!("로깅 시스템 초기화 완료: 레벨 = {}", log_level);

    Ok(())
}

/// 주문 제출 로그
pub fn log_order_submitted(symbol: &str, side: &str, quantity: f64) {
    log::info!("주문 제출: 심볼: {} - 방향: {} - 수량: {}", symbol, side, quantity);
}

/// 주문 체결 로그
pub fn log_order_filled(order_id: &str, symbol: &str, quantity: f64) {
    log::info!("주문 체결: {} - 심볼: {} - 수량: {}", order_id, symbol, quantity);
}

/// 오류 로그
pub fn log_error(context: &str, error: &TradingError) {
    log::error!("오류 발생 - {}: {}", context, error);
}
