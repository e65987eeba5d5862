use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TradingError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire representation expected by the Binance Futures API
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl FromStr for OrderSide {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(TradingError::ParseError(format!(
                "Side must be BUY or SELL. Got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl FromStr for OrderType {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            other => Err(TradingError::ParseError(format!(
                "Order type must be MARKET or LIMIT. Got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

impl TimeInForce {
    pub fn as_wire(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
        }
    }
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::Gtc
    }
}

impl FromStr for TimeInForce {
    type Err = TradingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::Gtc),
            "IOC" => Ok(TimeInForce::Ioc),
            "FOK" => Ok(TimeInForce::Fok),
            other => Err(TradingError::ParseError(format!(
                "Time in force must be GTC, IOC or FOK. Got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A caller-supplied order request, not yet checked against exchange rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderIntent {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    pub order_type: OrderType,
    pub price: Option<f64>,
    pub time_in_force: TimeInForce,
}

impl OrderIntent {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        OrderIntent {
            symbol: symbol.into(),
            side,
            quantity,
            order_type: OrderType::Market,
            price: None,
            time_in_force: TimeInForce::Gtc,
        }
    }

    pub fn limit(
        symbol: impl Into<String>,
        side: OrderSide,
        quantity: f64,
        price: f64,
        time_in_force: TimeInForce,
    ) -> Self {
        OrderIntent {
            symbol: symbol.into(),
            side,
            quantity,
            order_type: OrderType::Limit,
            price: Some(price),
            time_in_force,
        }
    }
}

/// An order intent that passed validation. Only the validator (and the TWAP
/// engine, for slices derived from a validated plan) construct this.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ValidatedOrder {
    intent: OrderIntent,
}

impl ValidatedOrder {
    pub(crate) fn new(intent: OrderIntent) -> Self {
        ValidatedOrder { intent }
    }

    pub fn intent(&self) -> &OrderIntent {
        &self.intent
    }

    pub fn into_intent(self) -> OrderIntent {
        self.intent
    }
}

/// Exchange acknowledgement for an accepted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderAck {
    pub order_id: String,
    pub client_order_id: Option<String>,
    pub status: String,
    pub executed_quantity: f64,
    pub acknowledged_at: i64,
}

/// Canonical outcome of a single order submission
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderResult {
    pub intent: OrderIntent,
    pub ack: Option<OrderAck>,
    pub error: Option<String>,
    pub requested_at: i64,
}

impl OrderResult {
    pub fn is_success(&self) -> bool {
        self.ack.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_parsing() {
        assert_eq!("buy".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!(" SELL ".parse::<OrderSide>().unwrap(), OrderSide::Sell);
        assert!("HOLD".parse::<OrderSide>().is_err());
    }

    #[test]
    fn test_order_type_parsing() {
        assert_eq!("market".parse::<OrderType>().unwrap(), OrderType::Market);
        assert_eq!("Limit".parse::<OrderType>().unwrap(), OrderType::Limit);
        assert!("STOP".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_time_in_force_parsing() {
        assert_eq!("gtc".parse::<TimeInForce>().unwrap(), TimeInForce::Gtc);
        assert_eq!("IOC".parse::<TimeInForce>().unwrap(), TimeInForce::Ioc);
        assert_eq!(TimeInForce::default(), TimeInForce::Gtc);
        assert!("DAY".parse::<TimeInForce>().is_err());
    }

    #[test]
    fn test_market_intent_has_no_price() {
        let intent = OrderIntent::market("BTCUSDT", OrderSide::Buy, 0.01);
        assert_eq!(intent.order_type, OrderType::Market);
        assert!(intent.price.is_none());
    }
}
