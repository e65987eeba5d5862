/**
* filename : advisor
* author : HAMA
* date: 2025. 5. 11.
* description: 로컬 CSV 데이터 기반 매매 심리 신호
**/

use serde::Serialize;

use crate::data::feeds::{FearGreedSnapshot, HistoricalSummary};
use crate::utils::math;

/// 공포/탐욕 지수와 과거 거래 내역을 합친 추천 신호
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSignal {
  pub symbol: String,
  pub bias: String,
  pub confidence: f64,
  pub rationale: String,
  pub reference_price: Option<f64>,
  pub suggested_quantity: Option<f64>,
}

pub struct SentimentAdvisor {
  symbol: String,
  fear: Option<FearGreedSnapshot>,
  history: Option<HistoricalSummary>,
}

impl SentimentAdvisor {
  pub fn new(
    symbol: impl Into<String>,
    fear: Option<FearGreedSnapshot>,
    history: Option<HistoricalSummary>,
  ) -> Self {
    SentimentAdvisor {
      symbol: symbol.into(),
      fear,
      history,
    }
  }

  pub fn build_signal(&self) -> SentimentSignal {
    let (bias, confidence) = self.compute_bias();
    let rationale = self.build_rationale(&bias, confidence);

    let mut reference_price = None;
    let mut suggested_quantity = None;

    if let Some(history) = &self.history {
      // 심볼과 끝이 일치하는 최근 거래로 기준 가격/수량 산출
      let symbol_upper = self.symbol.to_uppercase();
      let recent: Vec<_> = history
        .latest_trades
        .iter()
        .filter(|t| {
          let trade_symbol = t.symbol.to_uppercase();
          !trade_symbol.is_empty()
            && (trade_symbol.ends_with(&symbol_upper) || symbol_upper.starts_with(&trade_symbol))
        })
        .collect();
      if !recent.is_empty() {
        let avg_price =
          recent.iter().map(|t| t.execution_price).sum::<f64>() / recent.len() as f64;
        if avg_price > 0.0 {
          let quantity = recent.iter().map(|t| t.size_usd).sum::<f64>()
            / (recent.len() as f64 * avg_price);
          reference_price = Some(avg_price);
          suggested_quantity = Some(math::round_to_decimals(quantity, 4));
        }
      }
    }

    SentimentSignal {
      symbol: self.symbol.clone(),
      bias,
      confidence,
      rationale,
      reference_price,
      suggested_quantity,
    }
  }

  /// 공포/탐욕 지수 구간별 바이어스
  fn compute_bias(&self) -> (String, f64) {
    let fear = match &self.fear {
      Some(fear) => fear,
      None => return ("HOLD".to_string(), 0.0),
    };
    let value = fear.value;
    if value <= 25 {
      ("BUY".to_string(), 0.8)
    } else if value <= 45 {
      ("BUY".to_string(), 0.6)
    } else if value < 55 {
      ("HOLD".to_string(), 0.5)
    } else if value < 75 {
      ("SELL".to_string(), 0.6)
    } else {
      ("SELL".to_string(), 0.85)
    }
  }

  fn build_rationale(&self, bias: &str, confidence: f64) -> String {
    let mut parts = Vec::new();
    if let Some(fear) = &self.fear {
      parts.push(format!(
        "Fear & Greed index {} ({})",
        fear.value, fear.classification
      ));
    }
    if let Some(history) = &self.history {
      parts.push(format!(
        "Historical trades: {} events, net PnL ${:.2}",
        history.total_trades, history.net_closed_pnl
      ));
    }
    parts.push(format!(
      "Suggested bias: {} ({}% confidence)",
      bias,
      (confidence * 100.0) as i64
    ));
    parts.join(" | ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data::feeds::HistoricalTrade;

  fn fear(value: i64) -> FearGreedSnapshot {
    FearGreedSnapshot {
      value,
      classification: "Test".to_string(),
      date: "2024-03-01".to_string(),
    }
  }

  #[test]
  fn test_bias_thresholds() {
    let cases = [
      (10, "BUY", 0.8),
      (40, "BUY", 0.6),
      (50, "HOLD", 0.5),
      (60, "SELL", 0.6),
      (90, "SELL", 0.85),
    ];
    for (value, bias, confidence) in cases {
      let signal = SentimentAdvisor::new("BTCUSDT", Some(fear(value)), None).build_signal();
      assert_eq!(signal.bias, bias, "value {}", value);
      assert!((signal.confidence - confidence).abs() < 1e-9);
    }
  }

  #[test]
  fn test_no_data_is_hold() {
    let signal = SentimentAdvisor::new("BTCUSDT", None, None).build_signal();
    assert_eq!(signal.bias, "HOLD");
    assert_eq!(signal.confidence, 0.0);
    assert!(signal.reference_price.is_none());
  }

  #[test]
  fn test_reference_price_from_matching_trades() {
    let history = HistoricalSummary {
      total_trades: 2,
      gross_volume_usd: 1950.0,
      net_closed_pnl: 5.0,
      latest_trades: vec![
        HistoricalTrade {
          timestamp: "2024-03-01 10:00:00".to_string(),
          symbol: "BTCUSDT".to_string(),
          side: "BUY".to_string(),
          execution_price: 60000.0,
          size_usd: 1200.0,
          closed_pnl: 5.0,
        },
        HistoricalTrade {
          timestamp: "2024-03-02 10:00:00".to_string(),
          symbol: "BTCUSDT".to_string(),
          side: "SELL".to_string(),
          execution_price: 70000.0,
          size_usd: 750.0,
          closed_pnl: 0.0,
        },
      ],
    };

    let signal = SentimentAdvisor::new("BTCUSDT", Some(fear(20)), Some(history)).build_signal();
    let reference = signal.reference_price.unwrap();
    assert!((reference - 65000.0).abs() < 1e-9);
    // (1200 + 750) / (2 * 65000) = 0.015
    assert!((signal.suggested_quantity.unwrap() - 0.015).abs() < 1e-9);
  }
}
