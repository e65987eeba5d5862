//! Binance Futures 주문 봇 라이브러리
//!
//! 시장가/지정가 주문과 TWAP 분할 실행을 지원하는 주문 실행 시스템입니다.

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod exchange;
pub mod models;
pub mod order_core;
pub mod signals;
pub mod strategies;
pub mod utils;

// 핵심 타입 재노출
pub use crate::error::TradingError;
pub use crate::exchange::traits::Exchange;
pub use crate::models::filters::SymbolFilters;
pub use crate::models::order::{
    OrderAck, OrderIntent, OrderResult, OrderSide, OrderType, TimeInForce, ValidatedOrder,
};
pub use crate::models::report::{SliceResult, SliceStatus, TwapReport};
pub use crate::order_core::manager::OrderManager;
pub use crate::strategies::twap::{CancelHandle, TwapEngine, TwapPlan};

/// 버전 정보
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 결과 타입 별칭
pub type Result<T> = std::result::Result<T, TradingError>;
