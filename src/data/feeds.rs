use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TradingError;

pub const DEFAULT_FEAR_GREED_PATH: &str = "fear_greed_index.csv";
pub const DEFAULT_HISTORICAL_DATA_PATH: &str = "historical_data.csv";

/// Latest fear & greed index reading from the local CSV data set
#[derive(Debug, Clone, Serialize)]
pub struct FearGreedSnapshot {
    pub value: i64,
    pub classification: String,
    pub date: String,
}

impl FearGreedSnapshot {
    pub fn label(&self) -> String {
        format!("{} ({}) on {}", self.value, self.classification, self.date)
    }
}

#[derive(Debug, Deserialize)]
struct FearGreedRow {
    value: i64,
    classification: String,
    date: String,
}

/// Latest fear & greed row, picked by date
pub fn latest_fear_greed(path: Option<&Path>) -> Result<FearGreedSnapshot, TradingError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_FEAR_GREED_PATH));
    if !path.exists() {
        return Err(TradingError::DataError(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| TradingError::DataError(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut latest: Option<(NaiveDate, FearGreedRow)> = None;
    for record in reader.deserialize() {
        let row: FearGreedRow =
            record.map_err(|e| TradingError::ParseError(e.to_string()))?;
        // unparsable dates sort last so a single bad row does not win
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d")
            .unwrap_or(NaiveDate::MIN);
        match &latest {
            Some((best, _)) if *best >= date => {}
            _ => latest = Some((date, row)),
        }
    }

    let (_, row) = latest.ok_or_else(|| {
        TradingError::DataError(format!("No rows in {}", path.display()))
    })?;
    Ok(FearGreedSnapshot {
        value: row.value,
        classification: row.classification,
        date: row.date,
    })
}

/// One historical trade event from the local CSV data set
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalTrade {
    pub timestamp: String,
    pub symbol: String,
    pub side: String,
    pub execution_price: f64,
    pub size_usd: f64,
    pub closed_pnl: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSummary {
    pub total_trades: usize,
    pub gross_volume_usd: f64,
    pub net_closed_pnl: f64,
    pub latest_trades: Vec<HistoricalTrade>,
}

/// Summarize the historical trade CSV.
///
/// Column headers are normalized (trimmed, lowercased, spaces to
/// underscores) so exports with headers like "Execution Price" work.
pub fn summarize_historical_trades(
    path: Option<&Path>,
    latest: usize,
) -> Result<HistoricalSummary, TradingError> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_HISTORICAL_DATA_PATH));
    if !path.exists() {
        return Err(TradingError::DataError(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| TradingError::DataError(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TradingError::ParseError(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_lowercase().replace(' ', "_"))
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let timestamp_col = column("timestamp");
    let symbol_col = column("coin").or_else(|| column("symbol"));
    let side_col = column("side");
    let price_col = column("execution_price");
    let size_col = column("size_usd").ok_or_else(|| {
        TradingError::ParseError("historical data CSV is missing a size_usd column".to_string())
    })?;
    let pnl_col = column("closed_pnl");

    let field = |record: &csv::StringRecord, col: Option<usize>| -> String {
        col.and_then(|i| record.get(i)).unwrap_or("").to_string()
    };
    let numeric = |record: &csv::StringRecord, col: Option<usize>| -> f64 {
        col.and_then(|i| record.get(i))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0.0)
    };

    let mut trades: Vec<HistoricalTrade> = Vec::new();
    let mut gross_volume_usd = 0.0;
    let mut net_closed_pnl = 0.0;

    for record in reader.records() {
        let record = record.map_err(|e| TradingError::ParseError(e.to_string()))?;
        let trade = HistoricalTrade {
            timestamp: field(&record, timestamp_col),
            symbol: field(&record, symbol_col),
            side: field(&record, side_col),
            execution_price: numeric(&record, price_col),
            size_usd: numeric(&record, Some(size_col)),
            closed_pnl: numeric(&record, pnl_col),
        };
        gross_volume_usd += trade.size_usd;
        net_closed_pnl += trade.closed_pnl;
        trades.push(trade);
    }

    let total_trades = trades.len();
    trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    trades.truncate(latest);

    Ok(HistoricalSummary {
        total_trades,
        gross_volume_usd,
        net_closed_pnl,
        latest_trades: trades,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_latest_fear_greed_picks_newest_date() {
        let path = write_temp(
            "xorderbot_fear_greed_test.csv",
            "date,value,classification\n\
             2024-01-01,20,Extreme Fear\n\
             2024-03-01,72,Greed\n\
             2024-02-01,50,Neutral\n",
        );

        let snapshot = latest_fear_greed(Some(&path)).unwrap();
        assert_eq!(snapshot.value, 72);
        assert_eq!(snapshot.classification, "Greed");
        assert_eq!(snapshot.date, "2024-03-01");

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_summarize_historical_trades() {
        let path = write_temp(
            "xorderbot_historical_test.csv",
            "Timestamp,Coin,Side,Execution Price,Size USD,Closed PnL\n\
             2024-03-01 10:00:00,BTCUSDT,BUY,65000.0,1300.0,10.5\n\
             2024-03-02 11:00:00,ETHUSDT,SELL,3500.0,700.0,-2.5\n\
             2024-03-03 12:00:00,BTCUSDT,SELL,66000.0,660.0,8.0\n",
        );

        let summary = summarize_historical_trades(Some(&path), 2).unwrap();
        assert_eq!(summary.total_trades, 3);
        assert!((summary.gross_volume_usd - 2660.0).abs() < 1e-9);
        assert!((summary.net_closed_pnl - 16.0).abs() < 1e-9);
        assert_eq!(summary.latest_trades.len(), 2);
        assert_eq!(summary.latest_trades[0].timestamp, "2024-03-03 12:00:00");
        assert_eq!(summary.latest_trades[0].symbol, "BTCUSDT");

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let missing = Path::new("definitely_not_here_12345.csv");
        assert!(matches!(
            latest_fear_greed(Some(missing)),
            Err(TradingError::DataError(_))
        ));
    }
}
