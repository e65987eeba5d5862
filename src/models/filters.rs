use serde::{Deserialize, Serialize};

/// Trading rules for one futures symbol, as reported by exchangeInfo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolFilters {
    pub symbol: String,
    /// LOT_SIZE stepSize
    pub quantity_step: f64,
    /// LOT_SIZE minQty
    pub min_quantity: f64,
    /// PRICE_FILTER tickSize
    pub price_tick: f64,
}

impl SymbolFilters {
    pub fn new(
        symbol: impl Into<String>,
        quantity_step: f64,
        min_quantity: f64,
        price_tick: f64,
    ) -> Self {
        SymbolFilters {
            symbol: symbol.into(),
            quantity_step,
            min_quantity,
            price_tick,
        }
    }
}
