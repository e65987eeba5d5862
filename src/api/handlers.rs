// 주문/TWAP/심리 신호 핸들러들

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use warp::http::StatusCode;
use warp::reply::{json, with_status, Reply};

use crate::config::DataConfig;
use crate::data::feeds;
use crate::error::TradingError;
use crate::models::order::{OrderSide, OrderType, TimeInForce};
use crate::order_core::manager::OrderManager;
use crate::signals::advisor::SentimentAdvisor;
use crate::strategies::twap::TwapPlan;

/// 헬스체크 핸들러
pub async fn health_handler() -> Result<impl Reply, warp::Rejection> {
  Ok(with_status(json(&serde_json::json!({"status": "ok"})), StatusCode::OK))
}

/// 주문 생성 요청 모델 (시장가/지정가 공용)
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
  pub symbol: String,
  pub side: String,
  pub quantity: f64,
  #[serde(default = "default_order_type")]
  pub order_type: String,
  pub price: Option<f64>,
  #[serde(default = "default_time_in_force")]
  pub time_in_force: String,
}

fn default_order_type() -> String {
  "MARKET".to_string()
}

fn default_time_in_force() -> String {
  "GTC".to_string()
}

fn error_reply(status: StatusCode, error: &TradingError) -> warp::reply::WithStatus<warp::reply::Json> {
  with_status(json(&serde_json::json!({"error": error.to_string()})), status)
}

/// 주문 생성 핸들러
pub async fn create_order(
  req: CreateOrderRequest,
  manager: Arc<OrderManager>,
) -> Result<impl Reply, warp::Rejection> {
  let parsed = (|| -> Result<(OrderSide, OrderType, TimeInForce), TradingError> {
    Ok((
      req.side.parse::<OrderSide>()?,
      req.order_type.parse::<OrderType>()?,
      req.time_in_force.parse::<TimeInForce>()?,
    ))
  })();
  let (side, order_type, time_in_force) = match parsed {
    Ok(values) => values,
    Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &e)),
  };

  let result = match order_type {
    OrderType::Market => {
      manager.place_market_order(&req.symbol, side, req.quantity).await
    }
    OrderType::Limit => {
      let price = match req.price {
        Some(price) => price,
        None => {
          return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            &TradingError::InvalidPrice("Limit orders require a price".to_string()),
          ));
        }
      };
      manager.place_limit_order(&req.symbol, side, req.quantity, price, time_in_force).await
    }
  };

  match result {
    Ok(order_result) => {
      let status = if order_result.is_success() { StatusCode::CREATED } else { StatusCode::BAD_GATEWAY };
      Ok(with_status(json(&order_result), status))
    }
    Err(e) => Ok(error_reply(StatusCode::BAD_REQUEST, &e)),
  }
}

/// TWAP 실행 요청 모델
#[derive(Debug, Deserialize)]
pub struct TwapRequest {
  pub symbol: String,
  pub side: String,
  pub total_quantity: f64,
  pub slices: usize,
  #[serde(default = "default_interval")]
  pub interval_seconds: f64,
  #[serde(default = "default_order_type")]
  pub order_type: String,
  pub price: Option<f64>,
  #[serde(default = "default_time_in_force")]
  pub time_in_force: String,
}

fn default_interval() -> f64 {
  10.0
}

/// TWAP 실행 핸들러 - 실행이 끝난 뒤 전체 보고서를 반환
pub async fn run_twap(
  req: TwapRequest,
  manager: Arc<OrderManager>,
) -> Result<impl Reply, warp::Rejection> {
  let parsed = (|| -> Result<TwapPlan, TradingError> {
    let side = req.side.parse::<OrderSide>()?;
    let order_type = req.order_type.parse::<OrderType>()?;
    let time_in_force = req.time_in_force.parse::<TimeInForce>()?;
    Ok(TwapPlan {
      symbol: req.symbol.clone(),
      side,
      total_quantity: req.total_quantity,
      slice_count: req.slices,
      interval_seconds: req.interval_seconds,
      order_type,
      price: req.price,
      time_in_force,
    })
  })();
  let plan = match parsed {
    Ok(plan) => plan,
    Err(e) => return Ok(error_reply(StatusCode::BAD_REQUEST, &e)),
  };

  match manager.run_twap(plan).await {
    Ok(report) => {
      let status = if report.is_success() { StatusCode::CREATED } else { StatusCode::BAD_GATEWAY };
      Ok(with_status(json(&report), status))
    }
    Err(e) => Ok(error_reply(StatusCode::BAD_REQUEST, &e)),
  }
}

/// 심리 신호 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct SentimentQuery {
  pub symbol: Option<String>,
}

/// 심리 신호 핸들러 - CSV 피드를 읽어 추천 신호를 반환
pub async fn get_sentiment(
  query: SentimentQuery,
  data_config: DataConfig,
) -> Result<impl Reply, warp::Rejection> {
  let symbol = query.symbol.unwrap_or_else(|| "BTCUSDT".to_string());

  let fear = feeds::latest_fear_greed(data_config.fear_greed_csv.as_deref().map(Path::new))
    .map_err(|e| log::warn!("Failed to load fear & greed index: {}", e))
    .ok();
  let history = feeds::summarize_historical_trades(
    data_config.historical_csv.as_deref().map(Path::new),
    5,
  )
  .map_err(|e| log::warn!("Failed to load historical data: {}", e))
  .ok();

  if fear.is_none() && history.is_none() {
    return Ok(with_status(
      json(&serde_json::json!({"error": "No sentiment data available"})),
      StatusCode::NOT_FOUND,
    ));
  }

  let signal = SentimentAdvisor::new(symbol, fear, history).build_signal();
  Ok(with_status(json(&signal), StatusCode::OK))
}
