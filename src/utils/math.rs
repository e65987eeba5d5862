//! 수학 관련 유틸리티
//!
//! 거래소 수량/가격 규칙에 맞춘 반올림 함수 제공

// f64 나눗셈 오차 허용치 (예: 0.3 / 0.1 = 2.9999999999999996)
const STEP_EPSILON: f64 = 1e-9;

/// 수량 단위 내림 (거래소 LOT_SIZE 규칙에 맞춰)
pub fn round_quantity(quantity: f64, step_size: f64) -> f64 {
  if step_size <= 0.0 {
    return quantity;
  }
  ((quantity / step_size) + STEP_EPSILON).floor() * step_size
}

/// 가격 단위 내림 (거래소 PRICE_FILTER 규칙에 맞춰)
pub fn round_price(price: f64, tick_size: f64) -> f64 {
  if tick_size <= 0.0 {
    return price;
  }
  ((price / tick_size) + STEP_EPSILON).floor() * tick_size
}

/// 소수 자릿수 반올림 (Binance Futures 수량 정밀도는 8자리)
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
  let factor = 10f64.powi(decimals as i32);
  (value * factor).round() / factor
}

/// 수량이 스텝의 배수인지 확인 (부동소수점 허용 오차 내)
pub fn is_step_multiple(quantity: f64, step_size: f64) -> bool {
  if step_size <= 0.0 {
    return true;
  }
  let ratio = quantity / step_size;
  (ratio - ratio.round()).abs() < 1e-6
}
