use std::sync::Arc;

use crate::error::TradingError;
use crate::exchange::traits::Exchange;
use crate::models::order::{OrderIntent, OrderType, ValidatedOrder};
use crate::utils::math;

/// 주문 사전 검증기
///
/// 네트워크로 주문이 나가기 전에 심볼/수량/가격을 거래소 규칙과 대조한다.
pub struct OrderValidator {
    exchange: Arc<dyn Exchange>,
}

impl OrderValidator {
    pub fn new(exchange: Arc<dyn Exchange>) -> Self {
        OrderValidator { exchange }
    }

    /// 주문 의도 검증
    ///
    /// 거래소 규칙 조회가 유일한 네트워크 호출이며 어댑터가 캐시한다.
    pub async fn validate(&self, intent: OrderIntent) -> Result<ValidatedOrder, TradingError> {
        let symbol = intent.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TradingError::UnsupportedSymbol("<empty>".to_string()));
        }

        // 미지원 심볼이면 여기서 UnsupportedSymbol로 끝남
        let filters = self.exchange.symbol_filters(&symbol).await?;

        if !intent.quantity.is_finite() || intent.quantity <= 0.0 {
            return Err(TradingError::InvalidQuantity(format!(
                "Quantity must be greater than zero. Got {}",
                intent.quantity
            )));
        }
        if intent.quantity < filters.min_quantity {
            return Err(TradingError::InvalidQuantity(format!(
                "Quantity {} is below the minimum {} for {}",
                intent.quantity, filters.min_quantity, symbol
            )));
        }
        if !math::is_step_multiple(intent.quantity, filters.quantity_step) {
            return Err(TradingError::InvalidQuantity(format!(
                "Quantity {} is not a multiple of the {} step {}",
                intent.quantity, symbol, filters.quantity_step
            )));
        }

        if let OrderType::Limit = intent.order_type {
            match intent.price {
                Some(price) if price.is_finite() && price > 0.0 => {}
                Some(price) => {
                    return Err(TradingError::InvalidPrice(format!(
                        "Price must be greater than zero. Got {}",
                        price
                    )));
                }
                None => {
                    return Err(TradingError::InvalidPrice(
                        "Limit orders require a price".to_string(),
                    ));
                }
            }
        }

        let mut intent = intent;
        intent.symbol = symbol;
        Ok(ValidatedOrder::new(intent))
    }
}
