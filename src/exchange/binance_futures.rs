use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::ExchangeConfig;
use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::filters::SymbolFilters;
use crate::models::order::{OrderAck, OrderType, ValidatedOrder};

type HmacSha256 = Hmac<Sha256>;

pub const TESTNET_FUTURES_URL: &str = "https://testnet.binancefuture.com";
pub const MAINNET_FUTURES_URL: &str = "https://fapi.binance.com";

/// Binance USDT-M Futures REST connector (order placement subset)
pub struct BinanceFuturesClient {
  base_url: String,
  api_key: String,
  api_secret: String,
  recv_window: u64,
  http: reqwest::Client,
  /// serverTime - localTime, written only inside resync_time's lock
  time_offset: Mutex<i64>,
  /// exchangeInfo trading rules, loaded once per process
  filters: RwLock<Option<HashMap<String, SymbolFilters>>>,
}

impl BinanceFuturesClient {
  pub fn new(config: &ExchangeConfig) -> Result<Self, TradingError> {
    let (api_key, api_secret) = config.credentials()?;
    let base_url = config.base_url.clone().unwrap_or_else(|| {
      if config.testnet { TESTNET_FUTURES_URL } else { MAINNET_FUTURES_URL }.to_string()
    });
    let base_url = base_url.trim_end_matches('/').to_string();
    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(config.http_timeout_ms))
      .build()?;

    if config.testnet && config.base_url.is_none() {
      log::info!("Using Binance Futures testnet endpoint at {}", base_url);
    }

    Ok(BinanceFuturesClient {
      base_url,
      api_key,
      api_secret,
      recv_window: config.recv_window,
      http,
      time_offset: Mutex::new(0),
      filters: RwLock::new(None),
    })
  }

  fn local_timestamp_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
  }

  fn sign(&self, query: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes()).unwrap();
    mac.update(query.as_bytes());
    let result = mac.finalize().into_bytes();
    hex::encode(result)
  }

  async fn signed_timestamp(&self) -> i64 {
    Self::local_timestamp_ms() + *self.time_offset.lock().await
  }

  /// Decode a response body, turning non-2xx {code, msg} payloads into
  /// ExchangeError so callers see the exchange's own error codes
  async fn decode_response(res: reqwest::Response) -> Result<serde_json::Value, TradingError> {
    let status = res.status();
    let body = res.text().await?;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    if status.is_success() {
      return Ok(json);
    }
    let code = json.get("code").and_then(|c| c.as_i64()).unwrap_or(status.as_u16() as i64);
    let message = json
      .get("msg")
      .and_then(|m| m.as_str())
      .map(str::to_string)
      .unwrap_or(body);
    Err(TradingError::ExchangeError { code, message })
  }

  async fn signed_post(&self, path: &str, mut params: Vec<String>) -> Result<serde_json::Value, TradingError> {
    params.push(format!("recvWindow={}", self.recv_window));
    params.push(format!("timestamp={}", self.signed_timestamp().await));
    let query = params.join("&");
    let signature = self.sign(&query);
    let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);
    let res = self.http
      .post(url)
      .header("X-MBX-APIKEY", &self.api_key)
      .send().await?;
    Self::decode_response(res).await
  }

  fn order_params(order: &ValidatedOrder) -> Vec<String> {
    let intent = order.intent();
    let mut params = vec![
      format!("symbol={}", intent.symbol),
      format!("side={}", intent.side.as_wire()),
      format!("type={}", intent.order_type.as_wire()),
      format!("quantity={}", intent.quantity),
      format!("newClientOrderId={}", Uuid::new_v4()),
    ];
    if let OrderType::Limit = intent.order_type {
      if let Some(price) = intent.price {
        params.push(format!("price={}", price));
      }
      params.push(format!("timeInForce={}", intent.time_in_force.as_wire()));
    }
    params
  }

  fn parse_ack(json: &serde_json::Value) -> Result<OrderAck, TradingError> {
    let order_id = json
      .get("orderId")
      .and_then(|v| v.as_i64())
      .map(|v| v.to_string())
      .ok_or_else(|| TradingError::ParseError("Order ack missing orderId".to_string()))?;
    Ok(OrderAck {
      order_id,
      client_order_id: json.get("clientOrderId").and_then(|v| v.as_str()).map(str::to_string),
      status: json.get("status").and_then(|v| v.as_str()).unwrap_or("NEW").to_string(),
      executed_quantity: json
        .get("executedQty")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0),
      acknowledged_at: json
        .get("updateTime")
        .and_then(|v| v.as_i64())
        .unwrap_or_else(Self::local_timestamp_ms),
    })
  }

  fn parse_filters(info: &serde_json::Value) -> HashMap<String, SymbolFilters> {
    fn decimal_field(filter: &serde_json::Value, key: &str) -> f64 {
      filter.get(key).and_then(|v| v.as_str()).and_then(|s| s.parse().ok()).unwrap_or(0.0)
    }

    let mut out = HashMap::new();
    if let Some(symbols) = info.get("symbols").and_then(|s| s.as_array()) {
      for entry in symbols {
        let symbol = match entry.get("symbol").and_then(|s| s.as_str()) {
          Some(s) => s.to_string(),
          None => continue,
        };
        let mut quantity_step = 0.0;
        let mut min_quantity = 0.0;
        let mut price_tick = 0.0;
        if let Some(filters) = entry.get("filters").and_then(|f| f.as_array()) {
          for filter in filters {
            match filter.get("filterType").and_then(|t| t.as_str()) {
              Some("LOT_SIZE") => {
                quantity_step = decimal_field(filter, "stepSize");
                min_quantity = decimal_field(filter, "minQty");
              }
              Some("PRICE_FILTER") => {
                price_tick = decimal_field(filter, "tickSize");
              }
              _ => {}
            }
          }
        }
        out.insert(symbol.clone(), SymbolFilters::new(symbol, quantity_step, min_quantity, price_tick));
      }
    }
    out
  }

  async fn load_filters(&self) -> Result<(), TradingError> {
    let mut guard = self.filters.write().await;
    if guard.is_some() {
      return Ok(());
    }
    let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
    let res = self.http.get(url).send().await?;
    let json = Self::decode_response(res).await?;
    let parsed = Self::parse_filters(&json);
    log::info!("Loaded trading rules for {} futures symbols", parsed.len());
    *guard = Some(parsed);
    Ok(())
  }
}

#[async_trait]
impl Exchange for BinanceFuturesClient {
  async fn submit_order(&self, order: &ValidatedOrder) -> Result<OrderAck, TradingError> {
    let intent = order.intent();
    log::info!(
      "Submitting {} order: {} {} quantity={}",
      intent.order_type, intent.symbol, intent.side, intent.quantity
    );
    let json = self.signed_post("/fapi/v1/order", Self::order_params(order)).await?;
    let ack = Self::parse_ack(&json)?;
    log::info!("Order accepted: id={} status={}", ack.order_id, ack.status);
    Ok(ack)
  }

  async fn server_time(&self) -> Result<i64, TradingError> {
    let url = format!("{}/fapi/v1/time", self.base_url);
    let res = self.http.get(url).send().await?;
    let json = Self::decode_response(res).await?;
    json
      .get("serverTime")
      .and_then(|v| v.as_i64())
      .ok_or_else(|| TradingError::ParseError("serverTime missing from response".to_string()))
  }

  async fn resync_time(&self) -> Result<i64, TradingError> {
    // single mutual-exclusion region: read, recompute, write
    let mut offset = self.time_offset.lock().await;
    let server = self.server_time().await?;
    let local = Self::local_timestamp_ms();
    *offset = server - local;
    log::info!("Applied time offset {}ms", *offset);
    Ok(*offset)
  }

  async fn symbol_filters(&self, symbol: &str) -> Result<SymbolFilters, TradingError> {
    {
      let guard = self.filters.read().await;
      if let Some(map) = guard.as_ref() {
        return map
          .get(symbol)
          .cloned()
          .ok_or_else(|| TradingError::UnsupportedSymbol(symbol.to_string()));
      }
    }
    self.load_filters().await?;
    let guard = self.filters.read().await;
    guard
      .as_ref()
      .and_then(|map| map.get(symbol))
      .cloned()
      .ok_or_else(|| TradingError::UnsupportedSymbol(symbol.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::order::{OrderIntent, OrderSide, TimeInForce};

  #[test]
  fn test_parse_filters() {
    let info = serde_json::json!({
      "symbols": [
        {
          "symbol": "BTCUSDT",
          "filters": [
            { "filterType": "PRICE_FILTER", "tickSize": "0.10", "minPrice": "556.80" },
            { "filterType": "LOT_SIZE", "stepSize": "0.001", "minQty": "0.001", "maxQty": "1000" }
          ]
        },
        { "symbol": "ETHUSDT", "filters": [] }
      ]
    });

    let filters = BinanceFuturesClient::parse_filters(&info);
    assert_eq!(filters.len(), 2);
    let btc = &filters["BTCUSDT"];
    assert_eq!(btc.quantity_step, 0.001);
    assert_eq!(btc.min_quantity, 0.001);
    assert_eq!(btc.price_tick, 0.1);
  }

  #[test]
  fn test_market_order_params_omit_price() {
    let order = ValidatedOrder::new(OrderIntent::market("BTCUSDT", OrderSide::Buy, 0.05));
    let params = BinanceFuturesClient::order_params(&order);
    assert!(params.iter().any(|p| p == "type=MARKET"));
    assert!(!params.iter().any(|p| p.starts_with("price=")));
    assert!(!params.iter().any(|p| p.starts_with("timeInForce=")));
  }

  #[test]
  fn test_limit_order_params_carry_price_and_tif() {
    let order = ValidatedOrder::new(OrderIntent::limit(
      "BTCUSDT", OrderSide::Sell, 0.05, 65000.0, TimeInForce::Ioc,
    ));
    let params = BinanceFuturesClient::order_params(&order);
    assert!(params.iter().any(|p| p == "type=LIMIT"));
    assert!(params.iter().any(|p| p == "price=65000"));
    assert!(params.iter().any(|p| p == "timeInForce=IOC"));
  }

  #[test]
  fn test_parse_ack() {
    let json = serde_json::json!({
      "orderId": 4_567_890,
      "clientOrderId": "abc-123",
      "status": "NEW",
      "executedQty": "0.000",
      "updateTime": 1_700_000_000_123i64
    });
    let ack = BinanceFuturesClient::parse_ack(&json).unwrap();
    assert_eq!(ack.order_id, "4567890");
    assert_eq!(ack.client_order_id.as_deref(), Some("abc-123"));
    assert_eq!(ack.status, "NEW");
    assert_eq!(ack.acknowledged_at, 1_700_000_000_123);
  }
}
